//! Input AST consumed by the planner.
//!
//! The tree is produced by an external parser and is never mutated here.
//! Every node carries the [`Span`] of its source text so planning problems can
//! point at it.

pub mod expression;
pub mod query;
pub mod statement;

use std::ops::Range;

/// A byte range in the query text.
pub type Span = Range<usize>;

pub use expression::{
    BetweenExpr, BinaryOp, CallExpr, CaseBranch, CaseExpr, CastExpr, CollectionKind, Expr,
    FunctionName, InExpr, IsExpr, IsTest, LikeExpr, Literal, PathExpr, PathStep, StructEntry,
    UnaryOp, VarQualifier, VarRef,
};
pub use query::{
    FromClause, FromSource, GroupBy, GroupKey, Join, JoinKind, LetBinding, OrderItem,
    ProjectItem, Projection, Select, SetOpQuery, SetOperator, SetQuantifier,
};
pub use statement::{DeleteStatement, InsertStatement, Statement};
