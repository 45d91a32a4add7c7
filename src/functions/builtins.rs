//! Builtin function declarations.
//!
//! Polymorphic functions are declared over a type group: one overload per
//! member type, then one `Dynamic` fallback. The fallback is missable since
//! the runtime type may turn out to be outside the group.

use super::registry::Namespace;
use super::signature::{FnParameter, FnSignature, FunctionKind};
use crate::types::groups::{self, INTEGER, NUMERIC, TEXT};
use crate::types::StaticType;

pub(crate) fn declare(ns: &mut Namespace) {
    declare_operators(ns);
    declare_scalars(ns);
    declare_aggregates(ns);
}

// ============================================================================
// Declaration helpers
// ============================================================================

/// Declares overloads of one function over a type group.
struct GroupDecl<'a> {
    kind: FunctionKind,
    name: &'a str,
    params: &'a [&'a str],
    nullable: bool,
    null_call: bool,
    missable_fallback: bool,
}

impl<'a> GroupDecl<'a> {
    fn new(kind: FunctionKind, name: &'a str, params: &'a [&'a str]) -> Self {
        Self {
            kind,
            name,
            params,
            nullable: false,
            null_call: true,
            missable_fallback: true,
        }
    }

    fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    fn not_null_call(mut self) -> Self {
        self.null_call = false;
        self
    }

    fn total_fallback(mut self) -> Self {
        self.missable_fallback = false;
        self
    }

    /// Declares `name(t, ..., t) -> returns(t)` for each `t`, then the fallback.
    fn over<F>(self, ns: &mut Namespace, group: &[StaticType], returns: F)
    where
        F: Fn(&StaticType) -> StaticType,
    {
        self.over_with(ns, group, |t| vec![t.clone(); self.params.len()], returns);
    }

    /// Declares one overload per group member with custom parameter types.
    fn over_with<P, F>(&self, ns: &mut Namespace, group: &[StaticType], params: P, returns: F)
    where
        P: Fn(&StaticType) -> Vec<StaticType>,
        F: Fn(&StaticType) -> StaticType,
    {
        for t in group {
            ns.add(self.kind, self.signature(params(t), returns(t)));
        }
        let fallback_returns = group
            .first()
            .map(|t| fallback_return(&returns(t)))
            .unwrap_or(StaticType::Dynamic);
        let fallback = self
            .signature(vec![StaticType::Dynamic; self.params.len()], fallback_returns)
            .with_missable(self.missable_fallback)
            .with_fallback(true);
        ns.add(self.kind, fallback);
    }

    fn signature(&self, types: Vec<StaticType>, returns: StaticType) -> FnSignature {
        let parameters = self
            .params
            .iter()
            .zip(types)
            .map(|(name, ty)| FnParameter::new(*name, ty))
            .collect();
        FnSignature::new(self.name, parameters, returns)
            .with_null_call(self.null_call)
            .with_nullable(self.nullable)
    }
}

/// The fallback keeps fixed result types (BOOL, INT4) and is dynamic otherwise.
fn fallback_return(member_return: &StaticType) -> StaticType {
    match member_return {
        StaticType::Bool | StaticType::Int4 | StaticType::Int8 => member_return.clone(),
        _ => StaticType::Dynamic,
    }
}

fn same(t: &StaticType) -> StaticType {
    t.clone()
}

fn boolean(_: &StaticType) -> StaticType {
    StaticType::Bool
}

fn int4(_: &StaticType) -> StaticType {
    StaticType::Int4
}

/// Declares a function with exactly one overload and no fallback.
fn single(ns: &mut Namespace, kind: FunctionKind, signature: FnSignature) {
    ns.add(kind, signature);
}

// ============================================================================
// Operators
// ============================================================================

fn declare_operators(ns: &mut Namespace) {
    use FunctionKind::Operator;

    for name in ["plus", "minus", "times", "divide", "modulo"] {
        GroupDecl::new(Operator, name, &["lhs", "rhs"]).over(ns, &NUMERIC, same);
    }
    GroupDecl::new(Operator, "concat", &["lhs", "rhs"]).over(ns, &TEXT, |t| match t {
        StaticType::Char => StaticType::String,
        other => other.clone(),
    });
    for name in ["neg", "pos"] {
        GroupDecl::new(Operator, name, &["value"]).over(ns, &NUMERIC, same);
    }

    let comparable = groups::comparable();
    // Values of unrelated types compare unequal rather than MISSING.
    for name in ["eq", "ne"] {
        GroupDecl::new(Operator, name, &["lhs", "rhs"])
            .total_fallback()
            .over(ns, &comparable, boolean);
    }
    for name in ["lt", "lte", "gt", "gte"] {
        GroupDecl::new(Operator, name, &["lhs", "rhs"]).over(ns, &comparable, boolean);
    }

    // Three-valued logic: FALSE AND NULL is FALSE, so these are not null-call.
    for name in ["and", "or"] {
        GroupDecl::new(Operator, name, &["lhs", "rhs"])
            .not_null_call()
            .nullable()
            .over(ns, &[StaticType::Bool], boolean);
    }
    GroupDecl::new(Operator, "not", &["value"]).over(ns, &[StaticType::Bool], boolean);

    GroupDecl::new(Operator, "like", &["value", "pattern"]).over(ns, &TEXT, boolean);
    GroupDecl::new(Operator, "like_escape", &["value", "pattern", "escape"])
        .over(ns, &TEXT, boolean);
    GroupDecl::new(Operator, "between", &["value", "low", "high"]).over(ns, &comparable, boolean);

    GroupDecl::new(Operator, "in_collection", &["value", "collection"])
        .nullable()
        .over_with(
            ns,
            &groups::collections(),
            |c| vec![StaticType::Dynamic, c.clone()],
            boolean,
        );

    for name in ["is_null", "is_missing"] {
        single(
            ns,
            Operator,
            FnSignature::new(
                name,
                vec![FnParameter::new("value", StaticType::Dynamic)],
                StaticType::Bool,
            )
            .with_null_call(false),
        );
    }
}

// ============================================================================
// Scalar functions
// ============================================================================

fn declare_scalars(ns: &mut Namespace) {
    use FunctionKind::Scalar;

    for name in ["upper", "lower", "trim"] {
        GroupDecl::new(Scalar, name, &["value"]).over(ns, &TEXT, same);
    }
    for name in ["char_length", "octet_length"] {
        GroupDecl::new(Scalar, name, &["value"]).over(ns, &TEXT, int4);
    }
    GroupDecl::new(Scalar, "substring", &["value", "start"]).over_with(
        ns,
        &TEXT,
        |t| vec![t.clone(), StaticType::Int4],
        same,
    );
    GroupDecl::new(Scalar, "substring", &["value", "start", "length"]).over_with(
        ns,
        &TEXT,
        |t| vec![t.clone(), StaticType::Int4, StaticType::Int4],
        same,
    );
    GroupDecl::new(Scalar, "position", &["probe", "value"]).over(ns, &TEXT, int4);

    for name in ["abs", "ceil", "floor"] {
        GroupDecl::new(Scalar, name, &["value"]).over(ns, &NUMERIC, same);
    }
    let real = [StaticType::Decimal, StaticType::Float64];
    for name in ["sqrt", "exp", "ln"] {
        GroupDecl::new(Scalar, name, &["value"]).over(ns, &real, same);
    }
    GroupDecl::new(Scalar, "power", &["base", "exponent"]).over(ns, &real, same);
    GroupDecl::new(Scalar, "mod", &["lhs", "rhs"]).over(ns, &INTEGER, same);

    GroupDecl::new(Scalar, "cardinality", &["collection"]).over(ns, &groups::collections(), int4);

    let dates = [StaticType::Date, StaticType::Timestamp];
    let times = [StaticType::Time, StaticType::Timestamp];
    for name in ["extract_year", "extract_month", "extract_day"] {
        GroupDecl::new(Scalar, name, &["value"]).over(ns, &dates, int4);
    }
    for name in ["extract_hour", "extract_minute"] {
        GroupDecl::new(Scalar, name, &["value"]).over(ns, &times, int4);
    }
    GroupDecl::new(Scalar, "extract_second", &["value"]).over(ns, &times, |_| StaticType::Decimal);

    single(
        ns,
        Scalar,
        FnSignature::new("utcnow", vec![], StaticType::Timestamp).with_null_call(false),
    );
    single(
        ns,
        Scalar,
        FnSignature::new("current_user", vec![], StaticType::String)
            .with_null_call(false)
            .with_nullable(true),
    );
}

// ============================================================================
// Aggregates
// ============================================================================

fn declare_aggregates(ns: &mut Namespace) {
    use FunctionKind::Aggregate;

    single(
        ns,
        Aggregate,
        FnSignature::new(
            "count",
            vec![FnParameter::new("value", StaticType::Dynamic)],
            StaticType::Int8,
        )
        .with_null_call(false),
    );
    single(
        ns,
        Aggregate,
        FnSignature::new("count_star", vec![], StaticType::Int8).with_null_call(false),
    );

    GroupDecl::new(Aggregate, "sum", &["value"])
        .not_null_call()
        .nullable()
        .over(ns, &NUMERIC, same);
    GroupDecl::new(Aggregate, "avg", &["value"])
        .not_null_call()
        .nullable()
        .over(ns, &NUMERIC, |t| match t {
            StaticType::Float32 | StaticType::Float64 => StaticType::Float64,
            _ => StaticType::Decimal,
        });
    let comparable = groups::comparable();
    for name in ["min", "max"] {
        GroupDecl::new(Aggregate, name, &["value"])
            .not_null_call()
            .nullable()
            .over(ns, &comparable, same);
    }
    for name in ["any", "every"] {
        GroupDecl::new(Aggregate, name, &["value"])
            .not_null_call()
            .nullable()
            .over(ns, &[StaticType::Bool], boolean);
    }
}
