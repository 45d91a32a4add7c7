//! Query AST nodes: SELECT blocks and set operations.
//!
//! # Clause order
//!
//! A SELECT block is planned in the order
//!
//! ```text
//! FROM -> LET -> WHERE -> GROUP BY -> HAVING -> ORDER BY -> SELECT -> DISTINCT -> LIMIT / OFFSET
//! ```
//!
//! which is also the order in which the names each clause introduces become
//! visible to later clauses.

use crate::ast::expression::Expr;
use crate::ast::Span;
use crate::binding::BindingName;

// ============================================================================
// SELECT
// ============================================================================

/// A SELECT block.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub quantifier: SetQuantifier,
    pub projection: Projection,
    pub from: Option<FromClause>,
    pub lets: Vec<LetBinding>,
    pub where_clause: Option<Expr>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
    pub span: Span,
}

impl Select {
    /// Creates a block with only a projection and a FROM clause.
    pub fn new(projection: Projection, from: Option<FromClause>, span: Span) -> Self {
        Self {
            quantifier: SetQuantifier::All,
            projection,
            from,
            lets: Vec::new(),
            where_clause: None,
            group_by: None,
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            span,
        }
    }
}

/// Duplicate handling of SELECT, set operations and aggregate arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetQuantifier {
    /// Keep duplicates (default when omitted).
    #[default]
    All,
    Distinct,
}

/// The SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT *`
    Star(Span),
    /// `SELECT a, b AS c, t.*`
    Items(Vec<ProjectItem>),
    /// `SELECT VALUE expr`
    Value(Expr),
}

/// One item of a SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectItem {
    /// `expr [AS alias]`
    Expr { expr: Expr, alias: Option<BindingName> },
    /// `expr.*`
    AllFields(Expr, Span),
}

// ============================================================================
// FROM
// ============================================================================

/// A FROM source.
#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    /// `expr [AS a] [AT i]`
    Scan(FromSource),
    /// `UNPIVOT expr [AS v] [AT k]`
    Unpivot(FromSource),
    /// Explicit or comma join.
    Join(Box<Join>),
}

impl FromClause {
    /// Returns the span of this source.
    pub fn span(&self) -> Span {
        match self {
            FromClause::Scan(s) | FromClause::Unpivot(s) => s.span.clone(),
            FromClause::Join(j) => j.span.clone(),
        }
    }
}

/// The expression and aliases of a scan or unpivot.
#[derive(Debug, Clone, PartialEq)]
pub struct FromSource {
    pub expr: Expr,
    pub as_alias: Option<BindingName>,
    pub at_alias: Option<BindingName>,
    pub span: Span,
}

/// Join kinds. A comma join is an inner join without a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub left: FromClause,
    pub right: FromClause,
    pub on: Option<Expr>,
    pub span: Span,
}

// ============================================================================
// LET, GROUP BY, ORDER BY
// ============================================================================

/// `LET expr AS name`
#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    pub expr: Expr,
    pub alias: BindingName,
    pub span: Span,
}

/// `GROUP BY k1 [AS a1], ... [GROUP AS g]`
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    pub keys: Vec<GroupKey>,
    pub group_as: Option<BindingName>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupKey {
    pub expr: Expr,
    pub alias: Option<BindingName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub descending: bool,
    /// `NULLS FIRST` / `NULLS LAST`, if written.
    pub nulls_first: Option<bool>,
}

// ============================================================================
// Set operations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

/// `left UNION|INTERSECT|EXCEPT [ALL|DISTINCT] right`
#[derive(Debug, Clone, PartialEq)]
pub struct SetOpQuery {
    pub op: SetOperator,
    pub quantifier: SetQuantifier,
    pub left: Expr,
    pub right: Expr,
    pub span: Span,
}
