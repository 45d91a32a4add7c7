//! Expression AST nodes.
//!
//! The planner consumes these as an already-built tree. Operators are kept as
//! dedicated variants so their spans survive, and each one maps onto a hidden
//! function of the registry by name (see [`BinaryOp::function_name`]).

use crate::ast::query::{Select, SetOpQuery, SetQuantifier};
use crate::ast::Span;
use crate::binding::BindingName;
use crate::types::StaticType;
use smol_str::SmolStr;

// ============================================================================
// Expression
// ============================================================================

/// Any scalar or query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value.
    Lit(Literal, Span),

    /// Variable reference, `x` or `@x`.
    Var(VarRef),

    /// Path navigation, `x.a[0]['b']`.
    Path(PathExpr),

    /// Function call, `upper(x)` or `sum(DISTINCT x)`.
    Call(CallExpr),

    /// `COUNT(*)`.
    CountStar(Span),

    /// Infix arithmetic, comparison, concatenation and logical operators.
    Binary(BinaryOp, Box<Expr>, Box<Expr>, Span),

    /// Prefix `-`, `+` and `NOT`.
    Unary(UnaryOp, Box<Expr>, Span),

    /// `value [NOT] LIKE pattern [ESCAPE escape]`.
    Like(LikeExpr),

    /// `value [NOT] BETWEEN low AND high`.
    Between(BetweenExpr),

    /// `value [NOT] IN collection`.
    In(InExpr),

    /// `value IS [NOT] NULL` and `value IS [NOT] MISSING`.
    Is(IsExpr),

    /// Simple or searched CASE.
    Case(CaseExpr),

    /// `CAST(value AS type)`.
    Cast(CastExpr),

    /// `COALESCE(a, b, ...)`.
    Coalesce(Vec<Expr>, Span),

    /// `NULLIF(a, b)`.
    NullIf(Box<Expr>, Box<Expr>, Span),

    /// Array, bag or s-expression constructor.
    Collection(CollectionKind, Vec<Expr>, Span),

    /// Struct constructor `{k: v, ...}`.
    Struct(Vec<StructEntry>, Span),

    /// Positional query parameter `?`.
    Parameter(usize, Span),

    /// SELECT query.
    Select(Box<Select>),

    /// UNION / INTERSECT / EXCEPT of two queries.
    SetOp(Box<SetOpQuery>),
}

impl Expr {
    /// Returns the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Lit(_, span)
            | Expr::CountStar(span)
            | Expr::Binary(_, _, _, span)
            | Expr::Unary(_, _, span)
            | Expr::Coalesce(_, span)
            | Expr::NullIf(_, _, span)
            | Expr::Collection(_, _, span)
            | Expr::Struct(_, span)
            | Expr::Parameter(_, span) => span.clone(),
            Expr::Var(v) => v.span.clone(),
            Expr::Path(p) => p.span.clone(),
            Expr::Call(c) => c.span.clone(),
            Expr::Like(l) => l.span.clone(),
            Expr::Between(b) => b.span.clone(),
            Expr::In(i) => i.span.clone(),
            Expr::Is(i) => i.span.clone(),
            Expr::Case(c) => c.span.clone(),
            Expr::Cast(c) => c.span.clone(),
            Expr::Select(s) => s.span.clone(),
            Expr::SetOp(s) => s.span.clone(),
        }
    }

    /// Returns true for query expressions (SELECT and set operations).
    pub fn is_query(&self) -> bool {
        matches!(self, Expr::Select(_) | Expr::SetOp(_))
    }

    /// Returns the direct scalar sub-expressions, in source order.
    ///
    /// Queries are leaves: the clauses of a nested SELECT are not children
    /// of the expression containing it.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Lit(..)
            | Expr::Var(_)
            | Expr::CountStar(_)
            | Expr::Parameter(..)
            | Expr::Select(_)
            | Expr::SetOp(_) => Vec::new(),
            Expr::Path(path) => std::iter::once(path.root.as_ref())
                .chain(path.steps.iter().filter_map(|step| match step {
                    PathStep::Index(index) => Some(index),
                    PathStep::Symbol(..) => None,
                }))
                .collect(),
            Expr::Call(call) => call.args.iter().collect(),
            Expr::Binary(_, lhs, rhs, _) | Expr::NullIf(lhs, rhs, _) => {
                vec![lhs.as_ref(), rhs.as_ref()]
            }
            Expr::Unary(_, operand, _) => vec![operand.as_ref()],
            Expr::Like(like) => {
                let mut children = vec![like.value.as_ref(), like.pattern.as_ref()];
                children.extend(like.escape.as_deref());
                children
            }
            Expr::Between(between) => vec![
                between.value.as_ref(),
                between.low.as_ref(),
                between.high.as_ref(),
            ],
            Expr::In(in_expr) => vec![in_expr.value.as_ref(), in_expr.collection.as_ref()],
            Expr::Is(is) => vec![is.value.as_ref()],
            Expr::Case(case) => {
                let mut children: Vec<&Expr> = case.operand.as_deref().into_iter().collect();
                for branch in &case.branches {
                    children.push(&branch.when);
                    children.push(&branch.then);
                }
                children.extend(case.default.as_deref());
                children
            }
            Expr::Cast(cast) => vec![cast.value.as_ref()],
            Expr::Coalesce(args, _) | Expr::Collection(_, args, _) => args.iter().collect(),
            Expr::Struct(entries, _) => entries
                .iter()
                .flat_map(|entry| [&entry.key, &entry.value])
                .collect(),
        }
    }
}

// ============================================================================
// Literals
// ============================================================================

/// Literal values.
///
/// Decimal and datetime literals keep their source text; the planner only
/// needs their type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Missing,
    Bool(bool),
    Int(i64),
    Decimal(SmolStr),
    Float(f64),
    String(SmolStr),
    Date(SmolStr),
    Time(SmolStr),
    Timestamp(SmolStr),
}

impl Literal {
    /// Returns the intrinsic type of the literal.
    ///
    /// Integers that fit in 32 bits are `INT4`, larger ones `INT8`.
    pub fn static_type(&self) -> StaticType {
        match self {
            Literal::Null => StaticType::Null,
            Literal::Missing => StaticType::Missing,
            Literal::Bool(_) => StaticType::Bool,
            Literal::Int(v) if i32::try_from(*v).is_ok() => StaticType::Int4,
            Literal::Int(_) => StaticType::Int8,
            Literal::Decimal(_) => StaticType::Decimal,
            Literal::Float(_) => StaticType::Float64,
            Literal::String(_) => StaticType::String,
            Literal::Date(_) => StaticType::Date,
            Literal::Time(_) => StaticType::Time,
            Literal::Timestamp(_) => StaticType::Timestamp,
        }
    }

    /// Returns the text of a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

// ============================================================================
// Variables and paths
// ============================================================================

/// How a variable reference was qualified in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarQualifier {
    /// Plain `x`.
    #[default]
    Unqualified,
    /// `@x`: lexical scopes are searched before catalogs.
    Local,
}

/// A variable reference.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: BindingName,
    pub qualifier: VarQualifier,
    pub span: Span,
}

/// A path expression over a root expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub root: Box<Expr>,
    pub steps: Vec<PathStep>,
    pub span: Span,
}

/// One navigation step of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// `.name`
    Symbol(BindingName, Span),
    /// `[expr]`: an integer index, or a string key when `expr` is a string.
    Index(Expr),
}

impl PathStep {
    /// Returns the span of this step.
    pub fn span(&self) -> Span {
        match self {
            PathStep::Symbol(_, span) => span.clone(),
            PathStep::Index(expr) => expr.span(),
        }
    }
}

// ============================================================================
// Calls and operators
// ============================================================================

/// A possibly namespace-qualified function name.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionName {
    pub namespace: Option<BindingName>,
    pub name: BindingName,
}

impl FunctionName {
    /// An unqualified function name.
    pub fn unqualified(name: BindingName) -> Self {
        Self {
            namespace: None,
            name,
        }
    }
}

/// A function call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: FunctionName,
    pub args: Vec<Expr>,
    /// `DISTINCT` or `ALL` inside the parentheses, aggregates only.
    pub quantifier: Option<SetQuantifier>,
    pub span: Span,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Concat,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

impl BinaryOp {
    /// Returns the name of the operator function implementing this operator.
    pub fn function_name(self) -> &'static str {
        match self {
            BinaryOp::Plus => "plus",
            BinaryOp::Minus => "minus",
            BinaryOp::Times => "times",
            BinaryOp::Divide => "divide",
            BinaryOp::Modulo => "modulo",
            BinaryOp::Concat => "concat",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Lte => "lte",
            BinaryOp::Gt => "gt",
            BinaryOp::Gte => "gte",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

impl UnaryOp {
    /// Returns the name of the operator function implementing this operator.
    pub fn function_name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Pos => "pos",
            UnaryOp::Not => "not",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LikeExpr {
    pub value: Box<Expr>,
    pub pattern: Box<Expr>,
    pub escape: Option<Box<Expr>>,
    pub negated: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetweenExpr {
    pub value: Box<Expr>,
    pub low: Box<Expr>,
    pub high: Box<Expr>,
    pub negated: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InExpr {
    pub value: Box<Expr>,
    /// A collection constructor or a query.
    pub collection: Box<Expr>,
    pub negated: bool,
    pub span: Span,
}

/// The predicate tested by `IS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsTest {
    Null,
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsExpr {
    pub value: Box<Expr>,
    pub test: IsTest,
    pub negated: bool,
    pub span: Span,
}

// ============================================================================
// CASE, CAST and constructors
// ============================================================================

/// A `WHEN .. THEN ..` branch.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub when: Expr,
    pub then: Expr,
}

/// CASE expression.
///
/// With an `operand` this is a simple CASE whose `when` expressions are
/// compared to the operand; without it, a searched CASE whose `when`
/// expressions are conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    pub operand: Option<Box<Expr>>,
    pub branches: Vec<CaseBranch>,
    pub default: Option<Box<Expr>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub value: Box<Expr>,
    pub target: StaticType,
    pub span: Span,
}

/// Collection constructor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// `[a, b]`
    Array,
    /// `<<a, b>>`
    Bag,
    /// `(a b)` in s-expression syntax
    Sexp,
}

/// One `key: value` entry of a struct constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct StructEntry {
    pub key: Expr,
    pub value: Expr,
}
