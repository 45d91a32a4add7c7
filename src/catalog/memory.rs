//! In-memory catalog for tests, benchmarks and embedding.

use super::{Catalog, CatalogProvider, ObjectHandle, Session};
use crate::binding::BindingPath;
use crate::error::PlanningError;
use crate::types::StaticType;
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Namespace(IndexMap<SmolStr, Entry>),
    Object(StaticType),
}

/// A catalog holding a tree of namespaces and typed objects.
///
/// Entries keep their declaration order, so a case-insensitive lookup that
/// matches several names picks the one declared first.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryCatalog {
    name: SmolStr,
    root: IndexMap<SmolStr, Entry>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            root: IndexMap::new(),
        }
    }

    /// Declares an object, creating intermediate namespaces.
    pub fn with_object<I, S>(mut self, path: I, ty: StaticType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.define(path, ty);
        self
    }

    /// Declares an object, creating intermediate namespaces.
    ///
    /// Redeclaring a path replaces the previous entry.
    pub fn define<I, S>(&mut self, path: I, ty: StaticType)
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let path: Vec<SmolStr> = path.into_iter().map(Into::into).collect();
        insert(&mut self.root, &path, ty);
    }

    /// Returns a copy of this catalog under another name.
    pub fn renamed(&self, name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            root: self.root.clone(),
        }
    }
}

fn insert(entries: &mut IndexMap<SmolStr, Entry>, path: &[SmolStr], ty: StaticType) {
    match path {
        [] => {}
        [last] => {
            entries.insert(last.clone(), Entry::Object(ty));
        }
        [first, rest @ ..] => {
            let entry = entries
                .entry(first.clone())
                .or_insert_with(|| Entry::Namespace(IndexMap::new()));
            if matches!(entry, Entry::Object(_)) {
                *entry = Entry::Namespace(IndexMap::new());
            }
            if let Entry::Namespace(children) = entry {
                insert(children, rest, ty);
            }
        }
    }
}

impl Catalog for InMemoryCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup_object(&self, _session: &Session, path: &BindingPath) -> Option<ObjectHandle> {
        let mut entries = &self.root;
        let mut resolved = Vec::new();
        for (idx, step) in path.steps.iter().enumerate() {
            let (key, entry) = entries.iter().find(|(key, _)| step.matches(key))?;
            resolved.push(key.clone());
            match entry {
                Entry::Object(_) => {
                    return Some(ObjectHandle {
                        path: resolved,
                        matched: idx + 1,
                    });
                }
                Entry::Namespace(children) => entries = children,
            }
        }
        None
    }

    fn describe(&self, _session: &Session, handle: &ObjectHandle) -> StaticType {
        let mut entries = &self.root;
        for (idx, key) in handle.path.iter().enumerate() {
            match entries.get(key) {
                Some(Entry::Object(ty)) if idx + 1 == handle.path.len() => return ty.clone(),
                Some(Entry::Namespace(children)) => entries = children,
                _ => break,
            }
        }
        StaticType::Dynamic
    }
}

/// Provider for the `memory` connector.
///
/// Catalogs are created from templates registered by name; a configured name
/// without a template yields an empty catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogProvider {
    templates: IndexMap<SmolStr, InMemoryCatalog>,
}

impl InMemoryCatalogProvider {
    /// Connector name of this provider.
    pub const CONNECTOR: &'static str = "memory";

    /// Creates a provider without templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template under the template catalog's own name.
    pub fn with_template(mut self, catalog: InMemoryCatalog) -> Self {
        self.templates.insert(catalog.name.clone(), catalog);
        self
    }
}

impl CatalogProvider for InMemoryCatalogProvider {
    fn name(&self) -> &str {
        Self::CONNECTOR
    }

    fn create(
        &self,
        catalog_name: &str,
        options: &IndexMap<SmolStr, SmolStr>,
    ) -> Result<Arc<dyn Catalog>, PlanningError> {
        let template = match options.get("template") {
            Some(template) => Some(self.templates.get(template).ok_or_else(|| {
                PlanningError::InvalidCatalogConfig {
                    catalog: catalog_name.into(),
                    reason: format!("unknown template '{}'", template).into(),
                }
            })?),
            None => self.templates.get(catalog_name),
        };
        let catalog = match template {
            Some(template) => template.renamed(catalog_name),
            None => InMemoryCatalog::new(catalog_name),
        };
        Ok(Arc::new(catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingName;

    fn session() -> Session {
        Session::new("test", "db")
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new("db")
            .with_object(["sales", "orders"], StaticType::bag(StaticType::Int4))
            .with_object(["sales", "Orders"], StaticType::bag(StaticType::String))
            .with_object(["users"], StaticType::Dynamic)
    }

    #[test]
    fn longest_prefix_lookup() {
        let db = catalog();
        let handle = db
            .lookup_object(&session(), &BindingPath::insensitive(["sales", "orders", "x", "y"]))
            .unwrap();
        assert_eq!(handle.matched, 2);
        assert_eq!(handle.path, vec![SmolStr::new("sales"), SmolStr::new("orders")]);
        assert_eq!(
            db.describe(&session(), &handle),
            StaticType::bag(StaticType::Int4)
        );
    }

    #[test]
    fn insensitive_lookup_picks_first_declared() {
        let db = catalog();
        let path = BindingPath::new(vec![
            BindingName::insensitive("SALES"),
            BindingName::insensitive("ORDERS"),
        ]);
        let handle = db.lookup_object(&session(), &path).unwrap();
        assert_eq!(handle.path[1], "orders");

        let exact = BindingPath::sensitive(["sales", "Orders"]);
        let handle = db.lookup_object(&session(), &exact).unwrap();
        assert_eq!(
            db.describe(&session(), &handle),
            StaticType::bag(StaticType::String)
        );
    }

    #[test]
    fn namespace_alone_is_not_an_object() {
        let db = catalog();
        assert!(db
            .lookup_object(&session(), &BindingPath::insensitive(["sales"]))
            .is_none());
        assert!(db
            .lookup_object(&session(), &BindingPath::insensitive(["nope"]))
            .is_none());
    }

    #[test]
    fn provider_uses_named_template() {
        let provider = InMemoryCatalogProvider::new().with_template(catalog());
        let mut options = IndexMap::new();
        options.insert(SmolStr::new("template"), SmolStr::new("db"));
        let copy = provider.create("copy", &options).unwrap();
        assert_eq!(copy.name(), "copy");
        assert!(copy
            .lookup_object(&session(), &BindingPath::insensitive(["users"]))
            .is_some());

        options.insert(SmolStr::new("template"), SmolStr::new("missing"));
        assert!(provider.create("copy", &options).is_err());
    }
}
