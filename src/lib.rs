//! Semantic planner for PartiQL.
//!
//! This library turns a parsed PartiQL statement into a typed logical plan.
//! Every variable is bound to a scope or a catalog object, every expression
//! is typed, and every function call is resolved to an overload, statically
//! when the argument types allow it and as a runtime dispatch otherwise.
//! Planning never stops at the first problem: it reports everything it finds
//! and still returns a plan.
//!
//! # Example
//!
//! ```
//! use partiql_planner::ast::{BinaryOp, Expr, Literal, Statement};
//! use partiql_planner::catalog::{Catalogs, Session};
//! use partiql_planner::{Planner, StaticType};
//!
//! // 1 + MISSING
//! let expr = Expr::Binary(
//!     BinaryOp::Plus,
//!     Box::new(Expr::Lit(Literal::Int(1), 0..1)),
//!     Box::new(Expr::Lit(Literal::Missing, 4..11)),
//!     0..11,
//! );
//!
//! let planner = Planner::new(Catalogs::new());
//! let outcome = planner
//!     .plan(&Session::new("q1", "default"), &Statement::Query(expr))
//!     .unwrap();
//!
//! assert_eq!(
//!     outcome.plan.root_type(),
//!     Some(&StaticType::union([StaticType::Int4, StaticType::Missing]))
//! );
//! assert_eq!(outcome.warnings().count(), 1);
//! assert!(!outcome.has_errors());
//! ```

pub mod ast;
pub mod binding;
pub mod catalog;
pub mod diag;
pub mod env;
pub mod error;
pub mod functions;
pub mod plan;
pub mod planner;
pub mod types;

pub use binding::{BindingCase, BindingName, BindingPath};
pub use diag::{Problem, ProblemDetails, ProblemMode, ProblemSeverity, SourceFile};
pub use error::PlanningError;
pub use functions::{FnSignature, FunctionKind, FunctionRegistry};
pub use plan::{Plan, PlanStatement, Rel, Rex};
pub use planner::{FnPass, PlanOutcome, PlanPass, Planner, PlannerConfig};
pub use types::StaticType;
