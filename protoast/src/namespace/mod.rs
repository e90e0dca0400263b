//! Name binding and lookup.
//!
//! There is one namespace per file, and one per message body nested inside it. File namespaces
//! carry the declared package and the namespaces of imported files. Nested scopes only point
//! at their enclosing namespace.


use std::collections::HashMap;

use la_arena::{Arena, Idx};
use tracing::trace;

use crate::ast::{Ast, MethodId, NamedType, Position, ServiceId};

pub(crate) type NamespaceId = Idx<Namespace>;

/// Builds the memoization key of a nested scope from its parent's key and its own name.
pub(crate) type ScopeNaming = fn(&str, &str) -> String;

pub(crate) fn default_scope_naming(parent: &str, child: &str) -> String {
    format!("{}::{}", parent, child)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    Type(NamedType),
    Service(ServiceId),
    Method(MethodId),
}

#[derive(Debug)]
pub(crate) struct Namespace {
    name: String,
    kind: NamespaceKind,
    bindings: HashMap<String, (Binding, Position)>,
}

#[derive(Debug)]
enum NamespaceKind {
    File {
        package: Option<(String, Position)>,
        imports: Vec<NamespaceId>,
        finalized: bool,
    },
    Scope {
        outer: NamespaceId,
        root: NamespaceId,
    },
}

/// A name clash found when binding a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Conflict {
    /// The name is already bound in the same namespace.
    Local(Position),
    /// The name is bound by an imported file of the same package.
    Imported(Position),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PackageConflict {
    NestedScope,
    Conflicting { previous: String },
}

#[derive(Debug)]
pub(crate) struct Namespaces {
    arena: Arena<Namespace>,
    by_name: HashMap<String, NamespaceId>,
    naming: ScopeNaming,
}

impl Default for Namespaces {
    fn default() -> Self {
        Namespaces {
            arena: Arena::default(),
            by_name: HashMap::new(),
            naming: default_scope_naming,
        }
    }
}

impl Namespaces {
    pub fn set_naming(&mut self, naming: ScopeNaming) {
        self.naming = naming;
    }

    /// Gets the namespace of a file, creating it if needed.
    pub fn file(&mut self, name: &str) -> NamespaceId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }

        let id = self.arena.alloc(Namespace {
            name: name.to_owned(),
            kind: NamespaceKind::File {
                package: None,
                imports: Vec::new(),
                finalized: false,
            },
            bindings: HashMap::new(),
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Gets a nested scope of `outer`, creating it if needed.
    pub fn scope(&mut self, outer: NamespaceId, name: &str) -> NamespaceId {
        let key = (self.naming)(&self.arena[outer].name, name);
        if let Some(&id) = self.by_name.get(&key) {
            return id;
        }

        let root = self.root(outer);
        let id = self.arena.alloc(Namespace {
            name: key.clone(),
            kind: NamespaceKind::Scope { outer, root },
            bindings: HashMap::new(),
        });
        self.by_name.insert(key, id);
        id
    }

    pub fn get(&self, name: &str) -> Option<NamespaceId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, ns: NamespaceId) -> &str {
        &self.arena[ns].name
    }

    /// The file namespace containing `ns`.
    pub fn root(&self, ns: NamespaceId) -> NamespaceId {
        match self.arena[ns].kind {
            NamespaceKind::File { .. } => ns,
            NamespaceKind::Scope { root, .. } => root,
        }
    }

    /// The package declared by the file containing `ns`, or the empty string.
    pub fn package(&self, ns: NamespaceId) -> &str {
        match &self.arena[self.root(ns)].kind {
            NamespaceKind::File {
                package: Some((package, _)),
                ..
            } => package,
            _ => "",
        }
    }

    pub fn set_package(
        &mut self,
        ns: NamespaceId,
        name: &str,
        position: Position,
    ) -> Result<(), PackageConflict> {
        match &mut self.arena[ns].kind {
            NamespaceKind::Scope { .. } => Err(PackageConflict::NestedScope),
            NamespaceKind::File { package, .. } => {
                if let Some((previous, _)) = package {
                    if previous.as_str() != name {
                        return Err(PackageConflict::Conflicting {
                            previous: previous.clone(),
                        });
                    }
                    return Ok(());
                }
                *package = Some((name.to_owned(), position));
                Ok(())
            }
        }
    }

    /// Makes the bindings of the file namespace `import` visible from `ns`.
    ///
    /// Returns `false` if `ns` is a nested scope.
    pub fn with_import(&mut self, ns: NamespaceId, import: NamespaceId) -> bool {
        match &mut self.arena[ns].kind {
            NamespaceKind::Scope { .. } => false,
            NamespaceKind::File { imports, .. } => {
                if !imports.contains(&import) {
                    imports.push(import);
                }
                true
            }
        }
    }

    /// Binds `name` in `ns` only.
    pub fn set_node(
        &mut self,
        ns: NamespaceId,
        name: &str,
        binding: Binding,
        position: Position,
    ) -> Result<(), Conflict> {
        if let Some((_, previous)) = self.arena[ns].bindings.get(name) {
            return Err(Conflict::Local(previous.clone()));
        }

        if let NamespaceKind::File { imports, .. } = &self.arena[ns].kind {
            let package = self.package(ns);
            for &import in imports {
                if self.package(import) != package {
                    continue;
                }
                if let Some((_, previous)) = self.arena[import].bindings.get(name) {
                    return Err(Conflict::Imported(previous.clone()));
                }
            }
        }

        trace!(namespace = %self.arena[ns].name, symbol = name, "bound name");
        self.arena[ns]
            .bindings
            .insert(name.to_owned(), (binding, position));
        Ok(())
    }

    /// Looks up an unqualified or partially-qualified name through the scope chain and imports.
    pub fn find(&self, ns: NamespaceId, name: &str) -> Option<Binding> {
        let namespace = &self.arena[ns];
        if let Some((binding, _)) = namespace.bindings.get(name) {
            return Some(*binding);
        }

        match &namespace.kind {
            NamespaceKind::Scope { outer, .. } => self.find(*outer, name),
            NamespaceKind::File { imports, .. } => {
                let package = self.package(ns);
                for &import in imports {
                    let import_package = self.package(import);
                    if import_package == package {
                        if let Some(binding) = self.find_local(import, name) {
                            return Some(binding);
                        }
                    } else if let Some(rest) = strip_package(name, import_package) {
                        if let Some(binding) = self.find_local(import, rest) {
                            return Some(binding);
                        }
                    }
                }
                None
            }
        }
    }

    /// Looks up a name in a file namespace and its same-package imports, without following
    /// imports of other packages.
    fn find_local(&self, ns: NamespaceId, name: &str) -> Option<Binding> {
        let namespace = &self.arena[ns];
        if let Some((binding, _)) = namespace.bindings.get(name) {
            return Some(*binding);
        }

        if let NamespaceKind::File { imports, .. } = &namespace.kind {
            let package = self.package(ns);
            for &import in imports {
                if self.package(import) == package {
                    if let Some(binding) = self.find_local(import, name) {
                        return Some(binding);
                    }
                }
            }
        }
        None
    }

    fn find_type(&self, ns: NamespaceId, name: &str) -> Option<NamedType> {
        match self.find(ns, name) {
            Some(Binding::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Resolves a dotted name by its longest bound prefix, then walks nested types for the rest.
    fn find_nested(&self, ast: &Ast, ns: NamespaceId, name: &str) -> Option<NamedType> {
        let parts: Vec<&str> = name.split('.').collect();
        (1..=parts.len()).rev().find_map(|len| {
            let head = self.find_type(ns, &parts[..len].join("."))?;
            parts[len..].iter().try_fold(head, |ty, part| match ty {
                NamedType::Message(id) => ast[id].ty(ast, part),
                NamedType::Enum(_) => None,
            })
        })
    }

    fn resolve(&self, ast: &Ast, ns: NamespaceId, name: &str) -> Option<NamedType> {
        if let Some(ty) = self.find_nested(ast, ns, name) {
            return Some(ty);
        }

        let rest = strip_package(name, self.package(ns))?;
        self.find_nested(ast, ns, rest)
    }

    /// Resolves a type name as written in a field or method declaration.
    ///
    /// The name is tried as written, then with the current package stripped. A dotted name is
    /// finally tried below each enclosing package, longest first.
    pub fn lookup_type(&self, ast: &Ast, ns: NamespaceId, name: &str) -> Option<NamedType> {
        let name = name.strip_prefix('.').unwrap_or(name);
        if name.is_empty() {
            return None;
        }

        if let Some(ty) = self.resolve(ast, ns, name) {
            return Some(ty);
        }

        let package = self.package(ns);
        if name.contains('.') && !package.is_empty() {
            let parts: Vec<&str> = package.split('.').collect();
            for len in (1..=parts.len()).rev() {
                let qualified = format!("{}.{}", parts[..len].join("."), name);
                if let Some(ty) = self.resolve(ast, ns, &qualified) {
                    return Some(ty);
                }
            }
        }

        trace!(namespace = %self.arena[ns].name, symbol = name, "type not found");
        None
    }

    /// Resolves a service name.
    pub fn lookup_service(&self, ns: NamespaceId, name: &str) -> Option<ServiceId> {
        let name = name.strip_prefix('.').unwrap_or(name);
        let package = self.package(ns);
        let candidates = [Some(name), strip_package(name, package)];
        candidates
            .iter()
            .flatten()
            .find_map(|name| match self.find(ns, name) {
                Some(Binding::Service(id)) => Some(id),
                _ => None,
            })
    }

    pub fn finalize(&mut self, ns: NamespaceId) {
        if let NamespaceKind::File { finalized, .. } = &mut self.arena[ns].kind {
            *finalized = true;
        }
    }

    pub fn is_finalized(&self, ns: NamespaceId) -> bool {
        match self.arena[self.root(ns)].kind {
            NamespaceKind::File { finalized, .. } => finalized,
            NamespaceKind::Scope { .. } => false,
        }
    }

    /// Forgets a file namespace and all of its scopes, so that the file can be processed again.
    pub fn reset(&mut self, root: NamespaceId) {
        let arena = &self.arena;
        self.by_name.retain(|_, &mut id| match arena[id].kind {
            NamespaceKind::File { .. } => id != root,
            NamespaceKind::Scope { root: scope_root, .. } => scope_root != root,
        });
    }
}

/// Strips `package.` from the front of `name`.
fn strip_package<'a>(name: &'a str, package: &str) -> Option<&'a str> {
    if package.is_empty() {
        return None;
    }
    name.strip_prefix(package)?.strip_prefix('.')
}
