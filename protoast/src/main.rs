use std::path::PathBuf;

use clap::Parser;
use indexmap::IndexSet;
use miette::{Report, Result};
use protoast::Builder;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
pub struct Args {
    /// The import path(s) of the files to build, relative to an include directory.
    #[clap(value_name = "PROTO_FILES", required = true, value_parser)]
    files: Vec<String>,
    /// The directory in which to search for imports.
    #[clap(
        short = 'I',
        long = "include",
        visible_alias = "proto_path",
        value_name = "PATH",
        default_value = ".",
        value_parser
    )]
    includes: Vec<PathBuf>,
    /// Also build every other file in the directory of each input file.
    #[clap(long)]
    same_dir: bool,
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,protoast=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn main() -> Result<()> {
    miette::set_panic_hook();
    init_logging();

    let args = Args::parse();
    let mut builder = Builder::new(&args.includes);
    builder.on_error(|err| eprintln!("{:?}", Report::new(err)));

    let mut files = IndexSet::new();
    for name in &args.files {
        let file = builder.build_file(name)?;
        if args.same_dir {
            files.extend(builder.same_dir_protos(file)?);
        } else {
            files.insert(file);
        }
    }

    let ast = builder.ast();
    for file in files {
        let file = &ast[file];
        println!("{} (package '{}')", file.name, file.package);
        for &ty in &file.types {
            ast.scan_types(ty, &mut |ty| {
                println!("  {} {}", ty.kind(), ast.full_name(ty));
                true
            });
        }
        for &service in &file.services {
            let service = &ast[service];
            println!("  service {}", service.name);
            for &method in &service.methods {
                let method = &ast[method];
                println!(
                    "    rpc {}({}) returns ({})",
                    method.name,
                    method.input.display(ast),
                    method.output.display(ast)
                );
            }
        }
    }
    Ok(())
}
