//! Builds a typed, cross-referenced syntax tree from protobuf source files.
//!
//! Files are parsed with [`protoast_parse`], then every type reference, `extend` block and option
//! is resolved against the declarations of the file and its imports. The result is an
//! [`Ast`](ast::Ast) store indexed by typed ids, together with source positions and comments for
//! each node.
//!
//! See [`Builder`] for the entry point.
//!
//! # Examples
//!
//! ```
//! # use std::fs;
//! # let dir = tempfile::tempdir().unwrap();
//! fs::write(dir.path().join("api.proto"), "
//!     syntax = 'proto3';
//!     package api;
//!     message GetRequest { string id = 1; }
//!     message GetResponse { bytes data = 1; }
//!     service Store { rpc Get(GetRequest) returns (GetResponse); }
//! ").unwrap();
//!
//! let mut builder = protoast::Builder::new([dir.path()]);
//! let file = builder.build_file("api.proto").unwrap();
//!
//! let ast = builder.ast();
//! let service = ast[file].service(ast, "Store").unwrap();
//! let get = ast[service].method(ast, "Get").unwrap();
//! assert_eq!(ast[get].uri(ast), "/api/Get");
//! ```
//!
//! ### Error messages
//!
//! Problems which leave a file usable, such as an unknown field type, are passed to the
//! callback set with [`Builder::on_error`] and the offending declaration is skipped. Both
//! [`Error`] and [`BuildError`] implement [`miette::Diagnostic`]; enable the `fancy` feature of
//! `miette` for rich reports.
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/protoast/0.1.0/")]

pub mod ast;
mod builder;
mod construct;
mod error;
pub mod file;
mod lines;
mod namespace;
mod options;
mod prefetch;

pub use self::builder::{Builder, NamespaceView};
pub use self::error::{BuildError, Error};

const MAX_FILE_LEN: u64 = i32::MAX as u64;
