// Integration tests for catalog providers, configuration and custom catalogs.

mod common;

use common::*;
use partiql_planner::ast::Statement;
use partiql_planner::catalog::{
    Catalog, CatalogConfig, CatalogProvider, Catalogs, InMemoryCatalog, InMemoryCatalogProvider,
    ObjectHandle, Session,
};
use partiql_planner::{BindingPath, Planner, PlanningError, ProblemMode, StaticType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ==================== Providers ====================

fn providers() -> Vec<Arc<dyn CatalogProvider>> {
    let template = InMemoryCatalog::new("warehouse")
        .with_object(["stock"], StaticType::bag(StaticType::Int4));
    vec![Arc::new(InMemoryCatalogProvider::new().with_template(template))]
}

#[test]
fn test_catalogs_from_provider_configuration() {
    let configs = vec![
        CatalogConfig::new("warehouse", "memory"),
        CatalogConfig::new("copy", "memory").with_option("template", "warehouse"),
        CatalogConfig::new("scratch", "memory"),
    ];
    let catalogs = Catalogs::from_providers(&providers(), &configs).expect("valid configuration");

    let names: Vec<&str> = catalogs.names().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["warehouse", "copy", "scratch"]);

    let planner = Planner::new(catalogs);
    let outcome = planner
        .plan(&Session::new("q", "copy"), &Statement::Query(var("stock")))
        .expect("planning succeeds");
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));
    assert_eq!(outcome.plan.globals[0].catalog, "copy");
    assert_eq!(outcome.plan.root_type(), Some(&StaticType::bag(StaticType::Int4)));
}

#[test]
fn test_unknown_connector_is_rejected() {
    let configs = vec![CatalogConfig::new("db", "jdbc")];
    let result = Catalogs::from_providers(&providers(), &configs);
    assert!(matches!(
        result,
        Err(PlanningError::UnknownProvider { ref connector, .. }) if connector == "jdbc"
    ));
}

#[test]
fn test_unknown_template_is_rejected() {
    let configs = vec![CatalogConfig::new("db", "memory").with_option("template", "nope")];
    let result = Catalogs::from_providers(&providers(), &configs);
    assert!(matches!(result, Err(PlanningError::InvalidCatalogConfig { .. })));
}

#[test]
fn test_duplicate_catalog_names_are_rejected() {
    let configs = vec![
        CatalogConfig::new("db", "memory"),
        CatalogConfig::new("db", "memory"),
    ];
    let result = Catalogs::from_providers(&providers(), &configs);
    assert!(matches!(
        result,
        Err(PlanningError::DuplicateCatalog { ref catalog }) if catalog == "db"
    ));
}

// ==================== Custom catalogs ====================

/// A catalog where every single-step name is a bag of strings, counting
/// how often it is described.
struct EverythingCatalog {
    describes: AtomicUsize,
}

impl Catalog for EverythingCatalog {
    fn name(&self) -> &str {
        "everything"
    }

    fn lookup_object(&self, _session: &Session, path: &BindingPath) -> Option<ObjectHandle> {
        let first = path.steps.first()?;
        Some(ObjectHandle {
            path: vec![first.name.to_lowercase().into()],
            matched: 1,
        })
    }

    fn describe(&self, _session: &Session, _handle: &ObjectHandle) -> StaticType {
        self.describes.fetch_add(1, Ordering::SeqCst);
        StaticType::bag(StaticType::String)
    }
}

#[test]
fn test_custom_catalog_is_described_once_per_object() {
    let catalog = Arc::new(EverythingCatalog {
        describes: AtomicUsize::new(0),
    });
    let catalogs = Catalogs::new()
        .with_catalog(catalog.clone())
        .expect("registers");
    let planner = Planner::new(catalogs);

    let expr = binary(
        partiql_planner::ast::BinaryOp::Eq,
        var("Foo"),
        var("foo"),
    );
    let outcome = planner
        .plan(&Session::new("q", "everything"), &Statement::Query(expr))
        .expect("planning succeeds");

    assert_eq!(outcome.plan.globals.len(), 1);
    assert_eq!(catalog.describes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_planner_is_shareable_across_threads() {
    let planner = Arc::new(planner(ProblemMode::Quiet));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let planner = Arc::clone(&planner);
            std::thread::spawn(move || {
                let session = Session::new(format!("q{i}"), "default");
                planner
                    .plan(&session, &Statement::Query(var("orders")))
                    .map(|outcome| outcome.plan.globals.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("thread completes"), Ok(1));
    }
}

#[test]
fn test_empty_catalog_set_accepts_any_session_catalog() {
    let planner = Planner::new(Catalogs::new());
    let outcome = planner
        .plan(&Session::new("q", "whatever"), &Statement::Query(var("t")))
        .expect("planning succeeds");
    assert_problem_counts(&outcome, 1, 0);
}
