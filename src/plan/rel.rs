//! Relational plan operators.

use super::rex::{DynamicCandidate, Rex};
use crate::ast::{JoinKind, SetOperator, SetQuantifier};
use crate::functions::FnSignature;
use crate::types::{StaticType, StructField, StructType};
use smol_str::SmolStr;
use std::sync::Arc;

/// A named column of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub name: SmolStr,
    pub ty: StaticType,
}

impl Binding {
    pub fn new(name: impl Into<SmolStr>, ty: StaticType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The schema of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelType {
    pub schema: Vec<Binding>,
    /// True once the rows have a defined order (after ORDER BY).
    pub ordered: bool,
}

impl RelType {
    /// An unordered relation.
    pub fn unordered(schema: Vec<Binding>) -> Self {
        Self {
            schema,
            ordered: false,
        }
    }

    /// Returns the schema as a closed struct type.
    pub fn row_type(&self) -> StaticType {
        StaticType::Struct(StructType::closed(
            self.schema
                .iter()
                .map(|b| StructField::new(b.name.clone(), b.ty.clone()))
                .collect(),
        ))
    }
}

/// A typed relational operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Rel {
    pub ty: RelType,
    pub op: RelOp,
}

impl Rel {
    pub fn new(ty: RelType, op: RelOp) -> Self {
        Self { ty, op }
    }
}

/// Sort direction and null placement of one ORDER BY key.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub rex: Rex,
    pub descending: bool,
    pub nulls_first: bool,
}

/// One aggregate computed by [`RelOp::Aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub enum AggCall {
    Static {
        signature: Arc<FnSignature>,
        args: Vec<Rex>,
        distinct: bool,
    },
    /// Overload chosen at evaluation time among `candidates`.
    Dynamic {
        name: SmolStr,
        candidates: Vec<DynamicCandidate>,
        args: Vec<Rex>,
        distinct: bool,
    },
    /// No overload applies; a problem has been reported.
    Unresolved { name: SmolStr, args: Vec<Rex> },
}

impl AggCall {
    /// Returns the argument expressions.
    pub fn args(&self) -> &[Rex] {
        match self {
            AggCall::Static { args, .. }
            | AggCall::Dynamic { args, .. }
            | AggCall::Unresolved { args, .. } => args,
        }
    }
}

/// Relational operators.
#[derive(Debug, Clone, PartialEq)]
pub enum RelOp {
    /// One row per element of a collection.
    Scan { rex: Rex },
    /// Like [`RelOp::Scan`], with the element position as a second column.
    ScanIndexed { rex: Rex },
    /// One row per (value, name) field of a struct.
    Unpivot { rex: Rex },
    Filter {
        input: Box<Rel>,
        predicate: Rex,
    },
    /// Appends one column per projection to the input row.
    Project {
        input: Box<Rel>,
        projections: Vec<Rex>,
    },
    Join {
        left: Box<Rel>,
        right: Box<Rel>,
        condition: Rex,
        kind: JoinKind,
    },
    /// Output columns are the aggregates followed by the group keys, then
    /// the GROUP AS column when `group_as` is set.
    Aggregate {
        input: Box<Rel>,
        calls: Vec<AggCall>,
        groups: Vec<Rex>,
        group_as: Option<SmolStr>,
    },
    Sort {
        input: Box<Rel>,
        specs: Vec<SortSpec>,
    },
    Distinct { input: Box<Rel> },
    Limit { input: Box<Rel>, limit: Rex },
    Offset { input: Box<Rel>, offset: Rex },
    SetOp {
        op: SetOperator,
        quantifier: SetQuantifier,
        left: Box<Rel>,
        right: Box<Rel>,
    },
}
