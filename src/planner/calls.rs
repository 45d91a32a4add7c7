//! Function calls, operators and aggregates.

use super::context::PlanContext;
use crate::ast::{CallExpr, Expr, Projection, SetQuantifier, Span};
use crate::binding::BindingName;
use crate::diag::ProblemDetails;
use crate::error::PlanningError;
use crate::functions::{resolve, Coercion, FnResolution, FnSignature, FunctionKind};
use crate::plan::{AggCall, CastKind, DynamicCandidate, Rex, RexOp};
use crate::types::StaticType;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

impl PlanContext<'_> {
    /// Plans an operand of a call. A SELECT used directly as an operand is
    /// coerced to the value of its single column.
    pub(super) fn plan_operand(&mut self, expr: &Expr) -> Result<Rex, PlanningError> {
        let rex = self.plan_expr(expr)?;
        let coerce = match expr {
            Expr::Select(select) => !matches!(select.projection, Projection::Value(_)),
            Expr::SetOp(_) => true,
            _ => false,
        };
        Ok(if coerce { scalar_subquery(rex) } else { rex })
    }

    /// Plans a call of a builtin operator over planned arguments.
    pub(super) fn call_operator(&mut self, name: &str, args: Vec<Rex>, span: Span) -> Rex {
        let registry = self.registry;
        let name = BindingName::insensitive(name);
        let overloads = registry.lookup(None, FunctionKind::Operator, &name);
        self.resolve_call(name.name, overloads, args, span)
    }

    /// Plans a named scalar function call.
    pub(super) fn plan_call(&mut self, call: &CallExpr) -> Result<Rex, PlanningError> {
        let registry = self.registry;
        let namespace = call.name.namespace.as_ref();
        let name = &call.name.name;
        let display = match namespace {
            Some(ns) => SmolStr::new(format!("{}.{}", ns.normalized(), name.normalized())),
            None => name.normalized(),
        };

        let args = call
            .args
            .iter()
            .map(|arg| self.plan_operand(arg))
            .collect::<Result<Vec<_>, _>>()?;

        let overloads = registry.lookup(namespace, FunctionKind::Scalar, name);
        if overloads.is_none() && registry.is_aggregate(namespace, name) {
            self.report(
                ProblemDetails::UnsupportedFeature {
                    feature: format!("Aggregate '{}' outside SELECT, HAVING or ORDER BY", display)
                        .into(),
                },
                call.span.clone(),
            );
            return Ok(Rex::err(
                StaticType::Dynamic,
                format!("misplaced aggregate {}", display),
                args,
            ));
        }
        if call.quantifier.is_some() {
            return Err(PlanningError::malformed(format!(
                "set quantifier on scalar function {}",
                display
            )));
        }
        Ok(self.resolve_call(display, overloads, args, call.span.clone()))
    }

    /// Resolves a call against `overloads` and builds the call node.
    fn resolve_call(
        &mut self,
        name: SmolStr,
        overloads: Option<&[Arc<FnSignature>]>,
        args: Vec<Rex>,
        span: Span,
    ) -> Rex {
        let types: Vec<StaticType> = args.iter().map(|arg| arg.ty.clone()).collect();
        let candidates = overloads.map_or(0, <[_]>::len);
        let resolution = match overloads {
            Some(overloads) => resolve(overloads, &types),
            None => FnResolution::NoMatch,
        };
        debug!(
            function = %name,
            outcome = resolution.kind(),
            candidates,
            "resolved call"
        );

        match resolution {
            FnResolution::Static(matched) => {
                let ty = self.static_call_type(
                    &name,
                    &matched.signature,
                    &types,
                    candidates > 1,
                    span,
                );
                Rex::new(
                    ty,
                    RexOp::CallStatic {
                        signature: matched.signature,
                        args: coerce_args(args, &matched.coercions),
                    },
                )
            }
            FnResolution::Dynamic(matches) => {
                if types.iter().any(StaticType::is_absent)
                    && matches.iter().all(|m| m.signature.is_null_call)
                {
                    self.report(
                        ProblemDetails::AlwaysNullOrMissing {
                            function: name.clone(),
                        },
                        span,
                    );
                }
                let ty = StaticType::union(matches.iter().map(|m| call_type(&m.signature, &types)));
                let candidates = matches
                    .into_iter()
                    .map(|m| DynamicCandidate {
                        signature: m.signature,
                        coercions: m.coercions,
                    })
                    .collect();
                Rex::new(
                    ty,
                    RexOp::CallDynamic {
                        name,
                        candidates,
                        args,
                    },
                )
            }
            FnResolution::NoMatch => {
                let ty = if types.iter().any(StaticType::is_missing_only) {
                    StaticType::Missing
                } else {
                    StaticType::Dynamic
                };
                self.report(
                    ProblemDetails::UnknownFunction {
                        name: name.clone(),
                        args: types,
                    },
                    span,
                );
                Rex::err(ty, format!("unknown function {}", name), args)
            }
        }
    }

    /// Types a statically resolved call, reporting calls that can never
    /// produce a value.
    fn static_call_type(
        &mut self,
        name: &SmolStr,
        signature: &FnSignature,
        args: &[StaticType],
        has_alternatives: bool,
        span: Span,
    ) -> StaticType {
        if signature.is_null_call && args.iter().any(StaticType::is_absent) {
            self.report(
                ProblemDetails::AlwaysNullOrMissing {
                    function: name.clone(),
                },
                span,
            );
        } else if has_alternatives
            && signature.is_missable
            && signature.is_dynamic_fallback()
            && !args.iter().any(|a| a.dispatch_type().is_dynamic())
            && !args.iter().any(StaticType::is_absent)
        {
            self.report(
                ProblemDetails::IncompatibleTypesForOp {
                    op: name.clone(),
                    args: args.to_vec(),
                },
                span,
            );
            return StaticType::Missing;
        }
        call_type(signature, args)
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// Plans an aggregate call collected from the select list, HAVING or
    /// ORDER BY, returning the call and the type of its column.
    pub(super) fn plan_aggregate(
        &mut self,
        expr: &Expr,
    ) -> Result<(AggCall, StaticType), PlanningError> {
        let registry = self.registry;
        let (namespace, name, args, distinct, span) = match expr {
            Expr::CountStar(span) => (
                None,
                BindingName::insensitive("count_star"),
                Vec::new(),
                false,
                span.clone(),
            ),
            Expr::Call(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.plan_operand(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                (
                    call.name.namespace.as_ref(),
                    call.name.name.clone(),
                    args,
                    call.quantifier == Some(SetQuantifier::Distinct),
                    call.span.clone(),
                )
            }
            _ => return Err(PlanningError::malformed("aggregate is not a call")),
        };

        let types: Vec<StaticType> = args.iter().map(|arg| arg.ty.clone()).collect();
        let overloads = registry.lookup(namespace, FunctionKind::Aggregate, &name);
        let candidates = overloads.map_or(0, <[_]>::len);
        let resolution = match overloads {
            Some(overloads) => resolve(overloads, &types),
            None => FnResolution::NoMatch,
        };
        let name = name.normalized();
        debug!(
            aggregate = %name,
            outcome = resolution.kind(),
            candidates,
            "resolved aggregate"
        );

        Ok(match resolution {
            FnResolution::Static(matched) => {
                let ty = self.static_call_type(
                    &name,
                    &matched.signature,
                    &types,
                    candidates > 1,
                    span,
                );
                let call = AggCall::Static {
                    signature: matched.signature,
                    args: coerce_args(args, &matched.coercions),
                    distinct,
                };
                (call, ty)
            }
            FnResolution::Dynamic(matches) => {
                let ty = StaticType::union(matches.iter().map(|m| call_type(&m.signature, &types)));
                let call = AggCall::Dynamic {
                    name,
                    candidates: matches
                        .into_iter()
                        .map(|m| DynamicCandidate {
                            signature: m.signature,
                            coercions: m.coercions,
                        })
                        .collect(),
                    args,
                    distinct,
                };
                (call, ty)
            }
            FnResolution::NoMatch => {
                self.report(
                    ProblemDetails::UnknownAggregateFunction {
                        name: name.clone(),
                        args: types,
                    },
                    span,
                );
                (AggCall::Unresolved { name, args }, StaticType::Dynamic)
            }
        })
    }
}

/// Result type of `signature` applied to arguments of the given types.
///
/// A null-call function returns NULL (MISSING) when an argument is NULL
/// (MISSING); a nullable (missable) one may do so for any argument.
fn call_type(signature: &FnSignature, args: &[StaticType]) -> StaticType {
    let mut ty = signature.returns.clone();
    if signature.is_nullable
        || (signature.is_null_call && args.iter().any(StaticType::may_be_null))
    {
        ty = ty.with(StaticType::Null);
    }
    if signature.is_missable
        || (signature.is_null_call && args.iter().any(StaticType::may_be_missing))
    {
        ty = ty.with(StaticType::Missing);
    }
    ty
}

fn coerce_args(args: Vec<Rex>, coercions: &[Option<Coercion>]) -> Vec<Rex> {
    args.into_iter()
        .zip(coercions)
        .map(|(arg, coercion)| match coercion {
            Some(coercion) => coerce(arg, coercion),
            None => arg,
        })
        .collect()
}

/// Wraps `arg` in the cast an overload requires.
fn coerce(arg: Rex, coercion: &Coercion) -> Rex {
    let mut ty = coercion.target.clone();
    if coercion.checked || arg.ty.may_be_null() {
        ty = ty.with(StaticType::Null);
    }
    if arg.ty.may_be_missing() {
        ty = ty.with(StaticType::Missing);
    }
    Rex::new(
        ty,
        RexOp::Cast {
            value: Box::new(arg),
            target: coercion.target.clone(),
            kind: CastKind::from(coercion),
        },
    )
}

/// Coerces a query to the value of its single column, NULL when empty.
fn scalar_subquery(query: Rex) -> Rex {
    let ty = match query.ty.element_type() {
        Some(StaticType::Struct(row)) if row.closed && row.fields.len() == 1 => {
            row.fields[0].ty.with(StaticType::Null)
        }
        _ => StaticType::Dynamic,
    };
    Rex::new(ty, RexOp::Subquery(Box::new(query)))
}
