//! Name binding for variables and globals.
//!
//! The [`Environment`] owns the lexical scope stack of one planning pass and
//! the manifest of catalog objects the pass has referenced. Local names are
//! searched innermost scope first; names not bound locally are looked up in
//! the catalogs through the query's [`Session`].

pub mod scope;

pub use scope::{Scope, ScopeKind};

use crate::binding::BindingPath;
use crate::catalog::{Catalog, Catalogs, ObjectHandle, Session};
use crate::plan::{Binding, Global, VarRef};
use crate::types::StaticType;
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which side is searched first for a name found in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    LocalsFirst,
    GlobalsFirst,
}

/// A successfully resolved variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariable {
    pub var: VarRef,
    /// Type of the variable itself.
    pub ty: StaticType,
    /// Number of leading path steps that named the variable.
    pub consumed: usize,
    /// Set when the name matched a field of a closed-struct binding rather
    /// than a binding; holds the field's declared name and type.
    pub field: Option<(SmolStr, StaticType)>,
}

/// Scope stack and global manifest of one planning pass.
pub struct Environment<'a> {
    session: &'a Session,
    catalogs: &'a Catalogs,
    scopes: Vec<Scope>,
    globals: IndexMap<(SmolStr, Vec<SmolStr>), StaticType>,
}

impl<'a> Environment<'a> {
    /// Creates an environment with an empty scope stack.
    pub fn new(session: &'a Session, catalogs: &'a Catalogs) -> Self {
        Self {
            session,
            catalogs,
            scopes: Vec::new(),
            globals: IndexMap::new(),
        }
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    /// Pushes a scope and returns the names it binds more than once.
    pub fn push_scope(&mut self, kind: ScopeKind, bindings: Vec<Binding>) -> Vec<SmolStr> {
        trace!(?kind, bindings = bindings.len(), depth = self.scopes.len(), "push scope");
        let scope = Scope::new(kind, bindings);
        let duplicates = scope.duplicates();
        self.scopes.push(scope);
        duplicates
    }

    /// Pops the innermost scope.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        let scope = self.scopes.pop();
        trace!(kind = ?scope.as_ref().map(|s| s.kind), depth = self.scopes.len(), "pop scope");
        scope
    }

    /// Returns the number of scopes on the stack.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Returns the scope stack, outermost first.
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Returns every local name, innermost scope first.
    pub fn names_in_scope(&self) -> Vec<SmolStr> {
        let mut names: Vec<SmolStr> = Vec::new();
        for scope in self.scopes.iter().rev() {
            for binding in scope.bindings() {
                if !names.contains(&binding.name) {
                    names.push(binding.name.clone());
                }
            }
        }
        names
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolves the variable named by the first steps of `path`.
    pub fn resolve(
        &mut self,
        path: &BindingPath,
        strategy: ResolutionStrategy,
    ) -> Option<ResolvedVariable> {
        match strategy {
            ResolutionStrategy::LocalsFirst => self
                .resolve_local(path)
                .or_else(|| self.resolve_global(path)),
            ResolutionStrategy::GlobalsFirst => self
                .resolve_global(path)
                .or_else(|| self.resolve_local(path)),
        }
    }

    /// Resolves the first step of `path` against the scope stack.
    pub fn resolve_local(&self, path: &BindingPath) -> Option<ResolvedVariable> {
        let name = path.steps.first()?;
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if let Some(offset) = scope.lookup(name) {
                return Some(ResolvedVariable {
                    var: VarRef::Local { depth, offset },
                    ty: scope.bindings()[offset].ty.clone(),
                    consumed: 1,
                    field: None,
                });
            }
            if let Some((offset, field, field_ty)) = scope.lookup_field(name) {
                return Some(ResolvedVariable {
                    var: VarRef::Local { depth, offset },
                    ty: scope.bindings()[offset].ty.clone(),
                    consumed: 1,
                    field: Some((field, field_ty)),
                });
            }
        }
        None
    }

    /// Resolves the longest catalog object named by a prefix of `path`.
    ///
    /// The current catalog is searched under the session namespace, then at
    /// its root; failing both, the first step may name another catalog.
    pub fn resolve_global(&mut self, path: &BindingPath) -> Option<ResolvedVariable> {
        if path.is_empty() {
            return None;
        }
        if let Some(catalog) = self.catalogs.get(&self.session.catalog).cloned() {
            let namespace = &self.session.namespace;
            if !namespace.is_empty() {
                let qualified = path.prefixed(namespace.iter());
                if let Some(handle) = catalog.lookup_object(self.session, &qualified) {
                    if handle.matched > namespace.len() {
                        let consumed = handle.matched - namespace.len();
                        return Some(self.register(&catalog, handle, consumed));
                    }
                }
            }
            if let Some(handle) = catalog.lookup_object(self.session, path) {
                let consumed = handle.matched;
                return Some(self.register(&catalog, handle, consumed));
            }
        }
        let (_, catalog) = self.catalogs.find(&path.steps[0])?;
        let catalog = Arc::clone(catalog);
        let handle = catalog.lookup_object(self.session, &path.skip(1))?;
        let consumed = handle.matched + 1;
        Some(self.register(&catalog, handle, consumed))
    }

    fn register(
        &mut self,
        catalog: &Arc<dyn Catalog>,
        handle: ObjectHandle,
        consumed: usize,
    ) -> ResolvedVariable {
        let key = (SmolStr::new(catalog.name()), handle.path.clone());
        let index = match self.globals.get_index_of(&key) {
            Some(index) => index,
            None => {
                let ty = catalog.describe(self.session, &handle);
                debug!(
                    catalog = %key.0,
                    path = ?key.1,
                    ty = %ty,
                    "registered global"
                );
                self.globals.insert_full(key, ty).0
            }
        };
        let ty = self
            .globals
            .get_index(index)
            .map(|(_, ty)| ty.clone())
            .unwrap_or(StaticType::Dynamic);
        ResolvedVariable {
            var: VarRef::Global { index },
            ty,
            consumed,
            field: None,
        }
    }

    // ========================================================================
    // Globals
    // ========================================================================

    /// Returns the referenced globals in first-reference order.
    pub fn globals(&self) -> Vec<Global> {
        self.globals
            .iter()
            .map(|((catalog, path), ty)| Global {
                catalog: catalog.clone(),
                path: path.clone(),
                ty: ty.clone(),
            })
            .collect()
    }

    /// Consumes the environment, returning the global manifest.
    pub fn into_globals(self) -> Vec<Global> {
        self.globals
            .into_iter()
            .map(|((catalog, path), ty)| Global { catalog, path, ty })
            .collect()
    }
}
