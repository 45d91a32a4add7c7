//! Namespaced function registry.

use super::builtins;
use super::signature::{FnSignature, FunctionKind};
use crate::binding::{BindingName, fold_case};
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::sync::Arc;

/// Overloads of one name, in declaration order.
pub type Overloads = Vec<Arc<FnSignature>>;

/// The functions of one namespace, kept in three disjoint lists.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    name: SmolStr,
    scalars: IndexMap<SmolStr, Overloads>,
    operators: IndexMap<SmolStr, Overloads>,
    aggregates: IndexMap<SmolStr, Overloads>,
}

impl Namespace {
    /// Creates an empty namespace.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends an overload to the list for `kind`.
    pub fn add(&mut self, kind: FunctionKind, signature: FnSignature) {
        self.list_mut(kind)
            .entry(signature.name.clone())
            .or_default()
            .push(Arc::new(signature));
    }

    /// Returns every function of `kind`, keyed by lowercase name.
    pub fn functions(&self, kind: FunctionKind) -> &IndexMap<SmolStr, Overloads> {
        match kind {
            FunctionKind::Scalar => &self.scalars,
            FunctionKind::Operator => &self.operators,
            FunctionKind::Aggregate => &self.aggregates,
        }
    }

    fn list_mut(&mut self, kind: FunctionKind) -> &mut IndexMap<SmolStr, Overloads> {
        match kind {
            FunctionKind::Scalar => &mut self.scalars,
            FunctionKind::Operator => &mut self.operators,
            FunctionKind::Aggregate => &mut self.aggregates,
        }
    }

    /// Returns the overloads named `name`.
    ///
    /// Stored names are lowercase, so a quoted name only matches when written
    /// in lowercase.
    pub fn lookup(&self, kind: FunctionKind, name: &BindingName) -> Option<&[Arc<FnSignature>]> {
        self.functions(kind)
            .get(name.normalized().as_str())
            .map(Vec::as_slice)
    }
}

/// All functions visible to a planner.
///
/// Built once and shared read-only between planning passes.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    namespaces: IndexMap<SmolStr, Namespace>,
    default_namespace: SmolStr,
}

impl FunctionRegistry {
    /// Name of the namespace holding the builtins.
    pub const DEFAULT_NAMESPACE: &'static str = "builtins";

    /// Creates a registry with an empty default namespace.
    pub fn empty() -> Self {
        let mut namespaces = IndexMap::new();
        namespaces.insert(
            SmolStr::new(Self::DEFAULT_NAMESPACE),
            Namespace::new(Self::DEFAULT_NAMESPACE),
        );
        Self {
            namespaces,
            default_namespace: SmolStr::new(Self::DEFAULT_NAMESPACE),
        }
    }

    /// Creates a registry holding the builtin functions.
    pub fn builtins() -> Self {
        let mut registry = Self::empty();
        if let Some(ns) = registry.namespaces.get_mut(Self::DEFAULT_NAMESPACE) {
            builtins::declare(ns);
        }
        registry
    }

    /// Adds a function to the default namespace, after everything declared
    /// before it.
    pub fn with_function(mut self, kind: FunctionKind, signature: FnSignature) -> Self {
        self.add(kind, signature);
        self
    }

    /// Adds a function to the default namespace.
    pub fn add(&mut self, kind: FunctionKind, signature: FnSignature) {
        let default = self.default_namespace.clone();
        self.add_to(&default, kind, signature);
    }

    /// Adds a function to `namespace`, creating the namespace if needed.
    pub fn add_to(&mut self, namespace: &str, kind: FunctionKind, signature: FnSignature) {
        self.namespaces
            .entry(fold_case(namespace))
            .or_insert_with(|| Namespace::new(fold_case(namespace)))
            .add(kind, signature);
    }

    /// Returns the default namespace.
    pub fn default_namespace(&self) -> Option<&Namespace> {
        self.namespaces.get(&self.default_namespace)
    }

    /// Returns the namespace matching `name`.
    pub fn namespace(&self, name: &BindingName) -> Option<&Namespace> {
        self.namespaces.get(name.normalized().as_str())
    }

    /// Returns the overloads of `name` in `namespace`, or in the default
    /// namespace when unqualified.
    pub fn lookup(
        &self,
        namespace: Option<&BindingName>,
        kind: FunctionKind,
        name: &BindingName,
    ) -> Option<&[Arc<FnSignature>]> {
        let ns = match namespace {
            Some(ns) => self.namespace(ns)?,
            None => self.default_namespace()?,
        };
        ns.lookup(kind, name)
    }

    /// Returns true if an aggregate named `name` exists.
    pub fn is_aggregate(&self, namespace: Option<&BindingName>, name: &BindingName) -> bool {
        self.lookup(namespace, FunctionKind::Aggregate, name).is_some()
    }

    /// Returns the namespaces in declaration order.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FnParameter;
    use crate::types::StaticType;

    #[test]
    fn builtin_lists_are_disjoint() {
        let registry = FunctionRegistry::builtins();
        let ns = registry.default_namespace().unwrap();
        for name in ns.functions(FunctionKind::Operator).keys() {
            assert!(
                !ns.functions(FunctionKind::Aggregate).contains_key(name),
                "{} is both an operator and an aggregate",
                name
            );
        }
        assert!(ns.lookup(FunctionKind::Operator, &BindingName::insensitive("plus")).is_some());
        assert!(ns.lookup(FunctionKind::Scalar, &BindingName::insensitive("plus")).is_none());
    }

    #[test]
    fn lookup_case_rules() {
        let registry = FunctionRegistry::builtins();
        assert!(registry
            .lookup(None, FunctionKind::Scalar, &BindingName::insensitive("UPPER"))
            .is_some());
        assert!(registry
            .lookup(None, FunctionKind::Scalar, &BindingName::sensitive("UPPER"))
            .is_none());
        assert!(registry
            .lookup(None, FunctionKind::Scalar, &BindingName::sensitive("upper"))
            .is_some());
    }

    #[test]
    fn user_functions_follow_builtins() {
        let sig = FnSignature::new(
            "upper",
            vec![FnParameter::new("value", StaticType::Int4)],
            StaticType::String,
        );
        let registry =
            FunctionRegistry::builtins().with_function(FunctionKind::Scalar, sig.clone());
        let overloads = registry
            .lookup(None, FunctionKind::Scalar, &BindingName::insensitive("upper"))
            .unwrap();
        assert_eq!(overloads.last().map(|s| s.as_ref()), Some(&sig));
    }

    #[test]
    fn qualified_lookup() {
        let mut registry = FunctionRegistry::empty();
        registry.add_to(
            "Geo",
            FunctionKind::Scalar,
            FnSignature::new("area", vec![], StaticType::Float64),
        );
        let geo = BindingName::insensitive("geo");
        assert!(registry
            .lookup(Some(&geo), FunctionKind::Scalar, &BindingName::insensitive("area"))
            .is_some());
        assert!(registry
            .lookup(None, FunctionKind::Scalar, &BindingName::insensitive("area"))
            .is_none());
        assert_eq!(registry.namespaces().count(), 2);
    }
}
