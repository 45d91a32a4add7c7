//! Top-level statements.

use crate::ast::expression::Expr;
use crate::ast::Span;
use crate::binding::{BindingName, BindingPath};

/// A statement handed to the planner.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Any expression, including SELECT queries.
    Query(Expr),
    /// `INSERT INTO target VALUE expr` or `INSERT INTO target <query>`.
    Insert(InsertStatement),
    /// `DELETE FROM target [AS alias] [WHERE condition]`.
    Delete(DeleteStatement),
}

impl Statement {
    /// Returns the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Statement::Query(expr) => expr.span(),
            Statement::Insert(i) => i.span.clone(),
            Statement::Delete(d) => d.span.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub target: BindingPath,
    pub target_span: Span,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub target: BindingPath,
    pub target_span: Span,
    pub alias: Option<BindingName>,
    pub where_clause: Option<Expr>,
    pub span: Span,
}
