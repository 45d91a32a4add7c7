//! Common test utilities
//!
//! Shared fixtures, AST builders and assertion helpers for the planner
//! integration tests. There is no parser in this crate, so tests build the
//! input tree directly with the helpers below.
//!
//! # Fixtures
//! - [`test_catalogs`] - The `default` catalog used by most tests
//! - [`planner`] - A planner over [`test_catalogs`] in a given mode
//!
//! # AST Builders
//! - [`lit_int`], [`lit_str`], [`missing`], [`null`] - Literals
//! - [`var`], [`path`], [`index`] - Variables and paths
//! - [`binary`], [`call`], [`select_from`] - Operators, calls and queries
//!
//! # Planning Helpers
//! - [`plan_query`] - Plan an expression and return the outcome
//! - [`assert_problem_counts`] - Assert the number of errors and warnings

#![allow(dead_code)]

use partiql_planner::ast::{
    BinaryOp, CallExpr, Expr, FromClause, FromSource, FunctionName, Literal, PathExpr, PathStep,
    ProjectItem, Projection, Select, Statement, VarQualifier, VarRef,
};
use partiql_planner::catalog::{Catalogs, InMemoryCatalog, Session};
use partiql_planner::types::{StructField, StructType};
use partiql_planner::{
    BindingName, PlanOutcome, Planner, PlannerConfig, ProblemMode, StaticType,
};
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

/// Closed struct `{f1: INT4}`; `f2` does not exist on it.
pub fn struct_no_missing_row() -> StaticType {
    StaticType::Struct(StructType::closed(vec![StructField::new(
        "f1",
        StaticType::Int4,
    )]))
}

/// Closed struct `{name: STRING, price: DECIMAL, qty: INT4}`.
pub fn order_row() -> StaticType {
    StaticType::Struct(StructType::closed(vec![
        StructField::new("name", StaticType::String),
        StructField::new("price", StaticType::Decimal),
        StructField::new("qty", StaticType::Int4),
    ]))
}

/// The `default` catalog:
///
/// - `struct_no_missing`: bag of `{f1: INT4}`
/// - `orders`: bag of [`order_row`]
/// - `sales.orders`: bag of `STRING`
/// - `open_rows`: bag of open structs
/// - `numbers`: array of `INT8`
/// - `anything`: `DYNAMIC`
///
/// and an `archive` catalog holding `orders` as a bag of `BOOL`.
pub fn test_catalogs() -> Catalogs {
    let default = InMemoryCatalog::new("default")
        .with_object(
            ["struct_no_missing"],
            StaticType::bag(struct_no_missing_row()),
        )
        .with_object(["orders"], StaticType::bag(order_row()))
        .with_object(["sales", "orders"], StaticType::bag(StaticType::String))
        .with_object(
            ["open_rows"],
            StaticType::bag(StaticType::Struct(StructType::open(vec![]))),
        )
        .with_object(["numbers"], StaticType::array(StaticType::Int8))
        .with_object(["anything"], StaticType::Dynamic);
    let archive =
        InMemoryCatalog::new("archive").with_object(["orders"], StaticType::bag(StaticType::Bool));

    let mut catalogs = Catalogs::new();
    catalogs
        .register(Arc::new(default))
        .expect("default catalog registers");
    catalogs
        .register(Arc::new(archive))
        .expect("archive catalog registers");
    catalogs
}

/// Session on the root namespace of the `default` catalog.
pub fn session() -> Session {
    Session::new("test", "default")
}

/// A planner over [`test_catalogs`] reporting problems in `mode`.
pub fn planner(mode: ProblemMode) -> Planner {
    Planner::new(test_catalogs()).with_config(PlannerConfig::default().with_mode(mode))
}

// ============================================================================
// AST Builders
// ============================================================================
//
// Spans are synthetic: each builder takes or derives a range so tests can
// check where problems point.

pub fn lit(value: Literal) -> Expr {
    Expr::Lit(value, 0..1)
}

pub fn lit_int(value: i64) -> Expr {
    lit(Literal::Int(value))
}

pub fn lit_str(value: &str) -> Expr {
    lit(Literal::String(value.into()))
}

pub fn lit_bool(value: bool) -> Expr {
    lit(Literal::Bool(value))
}

pub fn missing() -> Expr {
    lit(Literal::Missing)
}

pub fn null() -> Expr {
    lit(Literal::Null)
}

/// An unqualified, case-insensitive variable reference.
pub fn var(name: &str) -> Expr {
    Expr::Var(VarRef {
        name: BindingName::insensitive(name),
        qualifier: VarQualifier::Unqualified,
        span: 0..name.len(),
    })
}

/// `@name`
pub fn local_var(name: &str) -> Expr {
    Expr::Var(VarRef {
        name: BindingName::insensitive(name),
        qualifier: VarQualifier::Local,
        span: 0..name.len() + 1,
    })
}

/// `root.a.b...` with case-insensitive symbol steps.
pub fn path(root: Expr, fields: &[&str]) -> Expr {
    let steps = fields
        .iter()
        .map(|field| PathStep::Symbol(BindingName::insensitive(*field), 0..field.len()))
        .collect();
    Expr::Path(PathExpr {
        root: Box::new(root),
        steps,
        span: 0..1,
    })
}

/// `root[key]`
pub fn index(root: Expr, key: Expr) -> Expr {
    Expr::Path(PathExpr {
        root: Box::new(root),
        steps: vec![PathStep::Index(key)],
        span: 0..1,
    })
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(op, Box::new(lhs), Box::new(rhs), 0..1)
}

/// `name(args...)` without a set quantifier.
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(CallExpr {
        name: FunctionName::unqualified(BindingName::insensitive(name)),
        args,
        quantifier: None,
        span: 0..name.len(),
    })
}

/// A FROM source `expr [AS alias]`.
pub fn scan(expr: Expr, alias: Option<&str>) -> FromClause {
    FromClause::Scan(FromSource {
        expr,
        as_alias: alias.map(BindingName::insensitive),
        at_alias: None,
        span: 0..1,
    })
}

/// `expr [AS alias]` as a select-list item.
pub fn item(expr: Expr, alias: Option<&str>) -> ProjectItem {
    ProjectItem::Expr {
        expr,
        alias: alias.map(BindingName::insensitive),
    }
}

/// `SELECT items FROM from`
pub fn select_from(items: Vec<ProjectItem>, from: FromClause) -> Select {
    Select::new(Projection::Items(items), Some(from), 0..1)
}

/// `SELECT VALUE value FROM from`
pub fn select_value(value: Expr, from: FromClause) -> Select {
    Select::new(Projection::Value(value), Some(from), 0..1)
}

pub fn query(select: Select) -> Expr {
    Expr::Select(Box::new(select))
}

// ============================================================================
// Planning Helpers
// ============================================================================

/// Plan `expr` as a query statement over [`test_catalogs`].
///
/// # Panics
/// Panics if planning fails with a fatal error; problems are returned in the
/// outcome.
///
/// # Example
/// ```no_run
/// let outcome = plan_query(ProblemMode::Quiet, var("orders"));
/// assert!(outcome.is_clean());
/// ```
pub fn plan_query(mode: ProblemMode, expr: Expr) -> PlanOutcome {
    plan_statement(mode, &Statement::Query(expr))
}

/// Plan any statement over [`test_catalogs`].
///
/// # Panics
/// Panics if planning fails with a fatal error.
pub fn plan_statement(mode: ProblemMode, statement: &Statement) -> PlanOutcome {
    planner(mode)
        .plan(&session(), statement)
        .unwrap_or_else(|err| panic!("planning failed: {err}"))
}

/// Format problems for display in assertion messages.
pub fn format_problems(outcome: &PlanOutcome) -> String {
    outcome
        .problems
        .iter()
        .map(|p| format!("{:?} {} ({})", p.severity, p.message(), p.details.code()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assert the number of error and warning problems.
///
/// # Panics
/// Panics with the formatted problem list if either count differs.
pub fn assert_problem_counts(outcome: &PlanOutcome, errors: usize, warnings: usize) {
    assert_eq!(
        (outcome.errors().count(), outcome.warnings().count()),
        (errors, warnings),
        "unexpected problems:\n{}",
        format_problems(outcome)
    );
}

/// Assert that some problem carries the diagnostic `code`.
///
/// # Panics
/// Panics if no problem has the code.
pub fn assert_has_problem(outcome: &PlanOutcome, code: &str) {
    assert!(
        outcome.problems.iter().any(|p| p.details.code() == code),
        "expected a `{code}` problem, got:\n{}",
        format_problems(outcome)
    );
}

/// Returns the field type of a closed struct, or `None`.
pub fn field_type<'a>(ty: &'a StaticType, name: &str) -> Option<&'a StaticType> {
    match ty {
        StaticType::Struct(row) => row
            .fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.ty),
        _ => None,
    }
}

/// Returns the element type of the query result.
///
/// # Panics
/// Panics if the plan is not a query over a collection.
pub fn row_type(outcome: &PlanOutcome) -> StaticType {
    outcome
        .plan
        .root_type()
        .and_then(StaticType::element_type)
        .cloned()
        .unwrap_or_else(|| {
            panic!(
                "expected a collection result, got {:?}",
                outcome.plan.root_type()
            )
        })
}
