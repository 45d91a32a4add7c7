//! Scalar plan operators.

use super::rel::Rel;
use crate::ast::{CollectionKind, Literal};
use crate::binding::BindingName;
use crate::functions::{Coercion, FnSignature};
use crate::types::StaticType;
use smol_str::SmolStr;
use std::sync::Arc;

/// A typed scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Rex {
    pub ty: StaticType,
    pub op: RexOp,
}

impl Rex {
    /// Creates a node.
    pub fn new(ty: StaticType, op: RexOp) -> Self {
        Self { ty, op }
    }

    /// Creates a literal node typed with the literal's intrinsic type.
    pub fn lit(value: Literal) -> Self {
        Self::new(value.static_type(), RexOp::Lit(value))
    }

    /// Creates an error continuation typed `ty`.
    pub fn err(ty: StaticType, message: impl Into<SmolStr>, args: Vec<Rex>) -> Self {
        Self::new(
            ty,
            RexOp::Err {
                message: message.into(),
                args,
            },
        )
    }

    /// Returns true for error continuations.
    pub fn is_err(&self) -> bool {
        matches!(self.op, RexOp::Err { .. })
    }
}

/// Where a variable's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarRef {
    /// A binding of an enclosing scope: `depth` scopes out from the innermost
    /// one, at position `offset` in that scope's schema.
    Local { depth: usize, offset: usize },
    /// An entry of [`super::Plan::globals`].
    Global { index: usize },
}

/// One navigation step.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// `.name`
    Symbol(BindingName),
    /// `['key']`, always case-sensitive.
    Key(Box<Rex>),
    /// `[i]`
    Index(Box<Rex>),
}

/// How a cast was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    /// Written by the user with `CAST`.
    Explicit,
    /// Inserted by overload resolution; always succeeds.
    Implicit,
    /// Inserted for a dynamically typed argument; checked at evaluation time.
    Checked,
}

impl From<&Coercion> for CastKind {
    fn from(coercion: &Coercion) -> Self {
        if coercion.checked {
            CastKind::Checked
        } else {
            CastKind::Implicit
        }
    }
}

/// One runtime-dispatch candidate of a dynamic call.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicCandidate {
    pub signature: Arc<FnSignature>,
    /// Casts applied to the arguments when this candidate is selected.
    pub coercions: Vec<Option<Coercion>>,
}

/// `WHEN condition THEN result`
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub condition: Rex,
    pub result: Rex,
}

/// `key: value`
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub key: Rex,
    pub value: Rex,
}

/// Scalar operators.
#[derive(Debug, Clone, PartialEq)]
pub enum RexOp {
    Lit(Literal),
    Var(VarRef),
    Path {
        root: Box<Rex>,
        step: PathStep,
    },
    /// Call of a statically resolved overload.
    CallStatic {
        signature: Arc<FnSignature>,
        args: Vec<Rex>,
    },
    /// Call whose overload is picked at evaluation time.
    CallDynamic {
        name: SmolStr,
        candidates: Vec<DynamicCandidate>,
        args: Vec<Rex>,
    },
    Cast {
        value: Box<Rex>,
        target: StaticType,
        kind: CastKind,
    },
    /// Searched CASE; `default` is NULL when the query had no ELSE.
    Case {
        branches: Vec<CaseBranch>,
        default: Box<Rex>,
    },
    Coalesce(Vec<Rex>),
    NullIf(Box<Rex>, Box<Rex>),
    Collection {
        kind: CollectionKind,
        values: Vec<Rex>,
    },
    Struct(Vec<StructField>),
    /// A SELECT block: `constructor` is evaluated once per row of `rel`.
    Select {
        constructor: Box<Rex>,
        rel: Box<Rel>,
    },
    /// A query coerced to the single value of its single column.
    Subquery(Box<Rex>),
    /// Merge of struct values, used for `SELECT *` and `t.*`.
    TupleUnion(Vec<Rex>),
    /// Continuation for an expression that failed to resolve.
    Err {
        message: SmolStr,
        args: Vec<Rex>,
    },
}
