//! Typed logical plans.
//!
//! A plan is an immutable tree of relational ([`Rel`]) and scalar ([`Rex`])
//! operators, every node carrying its inferred type, plus the manifest of
//! catalog objects it reads or writes. Transformations build new trees.

pub mod rel;
pub mod rex;
pub mod visit;

pub use rel::{AggCall, Binding, Rel, RelOp, RelType, SortSpec};
pub use rex::{CaseBranch, CastKind, DynamicCandidate, PathStep, Rex, RexOp, StructField, VarRef};
pub use visit::{walk_plan, walk_rel, walk_rex, PlanVisitor};

use crate::types::StaticType;
use smol_str::SmolStr;
use std::fmt;

/// A catalog object referenced by a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Global {
    /// Name of the owning catalog.
    pub catalog: SmolStr,
    /// Object path as stored by the catalog.
    pub path: Vec<SmolStr>,
    pub ty: StaticType,
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.catalog)?;
        for step in &self.path {
            write!(f, ".{}", step)?;
        }
        Ok(())
    }
}

/// The root operation of a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanStatement {
    Query(Rex),
    Insert {
        /// Index into [`Plan::globals`], `None` if the target did not resolve.
        target: Option<usize>,
        value: Rex,
    },
    Delete {
        target: Option<usize>,
        /// The rows to delete.
        rows: Rel,
    },
}

/// A complete plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub statement: PlanStatement,
    /// Referenced catalog objects, deduplicated, in first-reference order.
    pub globals: Vec<Global>,
}

impl Plan {
    /// Returns the root expression of a query plan.
    pub fn query(&self) -> Option<&Rex> {
        match &self.statement {
            PlanStatement::Query(rex) => Some(rex),
            _ => None,
        }
    }

    /// Returns the result type of a query plan.
    pub fn root_type(&self) -> Option<&StaticType> {
        self.query().map(|rex| &rex.ty)
    }
}
