//! Catalog access layer.
//!
//! The planner resolves global names through the narrow [`Catalog`] trait.
//! Catalog instances are created once, at planner construction, from
//! [`CatalogProvider`] factories matched by connector name; a planning pass
//! only ever reads them.
//!
//! # Example
//!
//! ```
//! use partiql_planner::catalog::{Catalogs, InMemoryCatalog, Session};
//! use partiql_planner::binding::BindingPath;
//! use partiql_planner::types::StaticType;
//! use std::sync::Arc;
//!
//! let catalog = InMemoryCatalog::new("main")
//!     .with_object(["sales", "orders"], StaticType::bag(StaticType::Dynamic));
//! let catalogs = Catalogs::new().with_catalog(Arc::new(catalog)).unwrap();
//!
//! let session = Session::new("q1", "main");
//! let main = catalogs.get("main").unwrap();
//! let handle = main
//!     .lookup_object(&session, &BindingPath::insensitive(["SALES", "orders", "id"]))
//!     .unwrap();
//! assert_eq!(handle.matched, 2);
//! ```

mod memory;

pub use memory::{InMemoryCatalog, InMemoryCatalogProvider};

use crate::binding::{BindingName, BindingPath};
use crate::error::PlanningError;
use crate::types::StaticType;
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Session
// ============================================================================

/// Query-scoped context passed to every catalog call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Identifier of the query being planned.
    pub query_id: SmolStr,
    /// Identity of the user, for multi-tenant catalogs.
    pub user_id: Option<SmolStr>,
    /// Name of the current catalog.
    pub catalog: SmolStr,
    /// Current namespace inside the current catalog (search path prefix).
    pub namespace: Vec<SmolStr>,
}

impl Session {
    /// Creates a session on the root namespace of `catalog`.
    pub fn new(query_id: impl Into<SmolStr>, catalog: impl Into<SmolStr>) -> Self {
        Self {
            query_id: query_id.into(),
            user_id: None,
            catalog: catalog.into(),
            namespace: Vec::new(),
        }
    }

    /// Sets the user id.
    pub fn with_user(mut self, user_id: impl Into<SmolStr>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the current namespace.
    pub fn with_namespace<I, S>(mut self, namespace: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.namespace = namespace.into_iter().map(Into::into).collect();
        self
    }
}

// ============================================================================
// Catalog trait
// ============================================================================

/// An opaque reference to a catalog object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    /// The object's path as stored by the catalog.
    pub path: Vec<SmolStr>,
    /// How many leading steps of the looked-up path named the object.
    pub matched: usize,
}

/// Read-only access to the objects of one catalog.
///
/// Implementations may be backed by remote services; retries and timeouts
/// are theirs to handle behind this synchronous interface.
pub trait Catalog: Send + Sync {
    /// Returns the catalog name.
    fn name(&self) -> &str;

    /// Finds the object named by the longest matching prefix of `path`.
    ///
    /// Steps after the matched prefix are navigation into the object and are
    /// left to the caller.
    fn lookup_object(&self, session: &Session, path: &BindingPath) -> Option<ObjectHandle>;

    /// Returns the static type of an object found by [`Catalog::lookup_object`].
    fn describe(&self, session: &Session, handle: &ObjectHandle) -> StaticType;
}

impl fmt::Debug for dyn Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Catalog({})", self.name())
    }
}

// ============================================================================
// Providers and configuration
// ============================================================================

/// Configuration of one catalog instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Name the catalog is registered under.
    pub name: SmolStr,
    /// Name of the provider that creates it.
    pub connector: SmolStr,
    /// Provider-specific options.
    pub options: IndexMap<SmolStr, SmolStr>,
}

impl CatalogConfig {
    /// Creates a configuration without options.
    pub fn new(name: impl Into<SmolStr>, connector: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            connector: connector.into(),
            options: IndexMap::new(),
        }
    }

    /// Adds an option.
    pub fn with_option(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// A factory for catalogs of one kind.
pub trait CatalogProvider: Send + Sync {
    /// Returns the connector name configurations refer to.
    fn name(&self) -> &str;

    /// Creates the catalog `catalog_name` from its options.
    fn create(
        &self,
        catalog_name: &str,
        options: &IndexMap<SmolStr, SmolStr>,
    ) -> Result<Arc<dyn Catalog>, PlanningError>;
}

// ============================================================================
// Catalogs
// ============================================================================

/// The catalogs visible to a planner, keyed by name in registration order.
#[derive(Clone, Default)]
pub struct Catalogs {
    catalogs: IndexMap<SmolStr, Arc<dyn Catalog>>,
}

impl Catalogs {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates every configured catalog through the provider named by
    /// its connector.
    pub fn from_providers(
        providers: &[Arc<dyn CatalogProvider>],
        configs: &[CatalogConfig],
    ) -> Result<Self, PlanningError> {
        let mut catalogs = Self::new();
        for config in configs {
            let provider = providers
                .iter()
                .find(|p| p.name() == config.connector)
                .ok_or_else(|| PlanningError::UnknownProvider {
                    catalog: config.name.clone(),
                    connector: config.connector.clone(),
                })?;
            let catalog = provider.create(&config.name, &config.options)?;
            catalogs.register_as(config.name.clone(), catalog)?;
        }
        Ok(catalogs)
    }

    /// Adds a catalog under its own name.
    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Result<Self, PlanningError> {
        self.register(catalog)?;
        Ok(self)
    }

    /// Adds a catalog under its own name.
    pub fn register(&mut self, catalog: Arc<dyn Catalog>) -> Result<(), PlanningError> {
        let name = SmolStr::new(catalog.name());
        self.register_as(name, catalog)
    }

    fn register_as(
        &mut self,
        name: SmolStr,
        catalog: Arc<dyn Catalog>,
    ) -> Result<(), PlanningError> {
        if self.catalogs.contains_key(&name) {
            return Err(PlanningError::DuplicateCatalog { catalog: name });
        }
        debug!(catalog = %name, "registered catalog");
        self.catalogs.insert(name, catalog);
        Ok(())
    }

    /// Returns the catalog registered under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Catalog>> {
        self.catalogs.get(name)
    }

    /// Returns the first catalog whose name matches `name`.
    pub fn find(&self, name: &BindingName) -> Option<(&SmolStr, &Arc<dyn Catalog>)> {
        self.catalogs.iter().find(|(key, _)| name.matches(key))
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.catalogs.keys()
    }

    /// Returns the number of catalogs.
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    /// Returns true if no catalog is registered.
    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

impl fmt::Debug for Catalogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.catalogs.keys()).finish()
    }
}
