//! Scalar expressions.

use super::context::PlanContext;
use crate::ast::{self, CaseExpr, CastExpr, CollectionKind, Expr, IsTest, Literal, Span};
use crate::diag::ProblemDetails;
use crate::env::ResolutionStrategy;
use crate::error::PlanningError;
use crate::plan::{CaseBranch, CastKind, Rex, RexOp, StructField};
use crate::types::{self, StaticType, StructType};

impl PlanContext<'_> {
    /// Plans and types an expression.
    pub(super) fn plan_expr(&mut self, expr: &Expr) -> Result<Rex, PlanningError> {
        if let Some(column) = self.group_column(expr) {
            return Ok(column);
        }
        match expr {
            Expr::Lit(literal, _) => Ok(Rex::lit(literal.clone())),
            Expr::Var(var) => self.plan_var_path(var, &[], ResolutionStrategy::LocalsFirst),
            Expr::Path(path) => self.plan_path(path, ResolutionStrategy::LocalsFirst),
            Expr::Call(call) => self.plan_call(call),
            Expr::CountStar(span) => {
                self.report(
                    ProblemDetails::UnsupportedFeature {
                        feature: "COUNT(*) outside SELECT, HAVING or ORDER BY".into(),
                    },
                    span.clone(),
                );
                Ok(Rex::err(StaticType::Int8, "misplaced COUNT(*)", vec![]))
            }
            Expr::Binary(op, lhs, rhs, span) => {
                let args = vec![self.plan_operand(lhs)?, self.plan_operand(rhs)?];
                Ok(self.call_operator(op.function_name(), args, span.clone()))
            }
            Expr::Unary(op, operand, span) => {
                let args = vec![self.plan_operand(operand)?];
                Ok(self.call_operator(op.function_name(), args, span.clone()))
            }
            Expr::Like(like) => {
                let mut args = vec![
                    self.plan_operand(&like.value)?,
                    self.plan_operand(&like.pattern)?,
                ];
                let name = match &like.escape {
                    Some(escape) => {
                        args.push(self.plan_operand(escape)?);
                        "like_escape"
                    }
                    None => "like",
                };
                let rex = self.call_operator(name, args, like.span.clone());
                Ok(self.negate_if(rex, like.negated, &like.span))
            }
            Expr::Between(between) => {
                let args = vec![
                    self.plan_operand(&between.value)?,
                    self.plan_operand(&between.low)?,
                    self.plan_operand(&between.high)?,
                ];
                let rex = self.call_operator("between", args, between.span.clone());
                Ok(self.negate_if(rex, between.negated, &between.span))
            }
            Expr::In(in_expr) => {
                let args = vec![
                    self.plan_operand(&in_expr.value)?,
                    self.plan_expr(&in_expr.collection)?,
                ];
                let rex = self.call_operator("in_collection", args, in_expr.span.clone());
                Ok(self.negate_if(rex, in_expr.negated, &in_expr.span))
            }
            Expr::Is(is) => {
                let name = match is.test {
                    IsTest::Null => "is_null",
                    IsTest::Missing => "is_missing",
                };
                let args = vec![self.plan_operand(&is.value)?];
                let rex = self.call_operator(name, args, is.span.clone());
                Ok(self.negate_if(rex, is.negated, &is.span))
            }
            Expr::Case(case) => self.plan_case(case),
            Expr::Cast(cast) => self.plan_cast(cast),
            Expr::Coalesce(args, _) => self.plan_coalesce(args),
            Expr::NullIf(lhs, rhs, _) => {
                let lhs = self.plan_operand(lhs)?;
                let rhs = self.plan_operand(rhs)?;
                Ok(Rex::new(
                    lhs.ty.with(StaticType::Null),
                    RexOp::NullIf(Box::new(lhs), Box::new(rhs)),
                ))
            }
            Expr::Collection(kind, values, _) => self.plan_collection(*kind, values),
            Expr::Struct(entries, _) => self.plan_struct(entries),
            Expr::Parameter(index, span) => {
                self.report(
                    ProblemDetails::UnsupportedFeature {
                        feature: "Query parameters".into(),
                    },
                    span.clone(),
                );
                Ok(Rex::err(
                    StaticType::Dynamic,
                    format!("parameter {}", index),
                    vec![],
                ))
            }
            Expr::Select(select) => self.plan_select(select),
            Expr::SetOp(query) => self.plan_set_op(query),
        }
    }

    fn negate_if(&mut self, rex: Rex, negated: bool, span: &Span) -> Rex {
        if negated {
            self.call_operator("not", vec![rex], span.clone())
        } else {
            rex
        }
    }

    // ========================================================================
    // CASE
    // ========================================================================

    fn plan_case(&mut self, case: &CaseExpr) -> Result<Rex, PlanningError> {
        if case.branches.is_empty() {
            return Err(PlanningError::malformed("CASE without WHEN branches"));
        }
        let operand = case
            .operand
            .as_deref()
            .map(|operand| self.plan_operand(operand))
            .transpose()?;

        let mut branches = Vec::with_capacity(case.branches.len());
        for branch in &case.branches {
            let span = branch.when.span();
            let when = self.plan_operand(&branch.when)?;
            let condition = match &operand {
                Some(operand) => self.call_operator("eq", vec![operand.clone(), when], span),
                None => {
                    self.expect_condition(&when, "CASE condition", span);
                    when
                }
            };
            let result = self.plan_expr(&branch.then)?;
            branches.push(CaseBranch { condition, result });
        }
        let default = match &case.default {
            Some(default) => Some(self.plan_expr(default)?),
            None => None,
        };

        let explicit_missing = branches.iter().all(|b| b.result.ty.is_missing_only())
            && default.as_ref().is_none_or(|d| d.ty.is_missing_only());
        if explicit_missing {
            self.report(ProblemDetails::CaseAlwaysMissing, case.span.clone());
        }

        let default = default.unwrap_or_else(|| Rex::lit(Literal::Null));
        let ty = StaticType::union(
            branches
                .iter()
                .map(|b| b.result.ty.clone())
                .chain(std::iter::once(default.ty.clone())),
        );
        Ok(Rex::new(
            ty,
            RexOp::Case {
                branches,
                default: Box::new(default),
            },
        ))
    }

    // ========================================================================
    // Other scalar forms
    // ========================================================================

    fn plan_cast(&mut self, cast: &CastExpr) -> Result<Rex, PlanningError> {
        let value = self.plan_operand(&cast.value)?;
        let ty = if value.ty.is_absent() {
            value.ty.clone()
        } else {
            let mut ty = cast.target.clone();
            if value.ty.may_be_null() {
                ty = ty.with(StaticType::Null);
            }
            if value.ty.may_be_missing() {
                ty = ty.with(StaticType::Missing);
            }
            ty
        };
        Ok(Rex::new(
            ty,
            RexOp::Cast {
                value: Box::new(value),
                target: cast.target.clone(),
                kind: CastKind::Explicit,
            },
        ))
    }

    fn plan_coalesce(&mut self, args: &[Expr]) -> Result<Rex, PlanningError> {
        if args.is_empty() {
            return Err(PlanningError::malformed("COALESCE without arguments"));
        }
        let args = args
            .iter()
            .map(|arg| self.plan_operand(arg))
            .collect::<Result<Vec<_>, _>>()?;
        // NULL only when no argument is sure to be present.
        let ty = if args.iter().all(|arg| arg.ty.is_absent()) {
            StaticType::Null
        } else {
            let ty = StaticType::union(
                args.iter()
                    .filter(|arg| !arg.ty.is_absent())
                    .map(|arg| arg.ty.without_absent()),
            );
            if args
                .iter()
                .all(|arg| arg.ty.may_be_null() || arg.ty.may_be_missing())
            {
                ty.with(StaticType::Null)
            } else {
                ty
            }
        };
        Ok(Rex::new(ty, RexOp::Coalesce(args)))
    }

    fn plan_collection(
        &mut self,
        kind: CollectionKind,
        values: &[Expr],
    ) -> Result<Rex, PlanningError> {
        let values = values
            .iter()
            .map(|value| self.plan_expr(value))
            .collect::<Result<Vec<_>, _>>()?;
        let element = if values.is_empty() {
            StaticType::Dynamic
        } else {
            StaticType::union(values.iter().map(|v| v.ty.clone()))
        };
        let ty = match kind {
            CollectionKind::Array => StaticType::array(element),
            CollectionKind::Bag => StaticType::bag(element),
            CollectionKind::Sexp => StaticType::sexp(element),
        };
        Ok(Rex::new(ty, RexOp::Collection { kind, values }))
    }

    /// Plans a struct constructor. Its type is closed when every key is a
    /// string literal; fields that are always MISSING are left out of it.
    fn plan_struct(&mut self, entries: &[ast::StructEntry]) -> Result<Rex, PlanningError> {
        let mut fields = Vec::with_capacity(entries.len());
        let mut declared = Vec::new();
        let mut closed = true;
        for entry in entries {
            let key = self.plan_expr(&entry.key)?;
            let value = self.plan_expr(&entry.value)?;
            self.expect_type(
                &key,
                "struct key",
                "STRING",
                StaticType::is_text,
                entry.key.span(),
            );
            match &entry.key {
                Expr::Lit(Literal::String(name), _) => {
                    if !value.ty.is_missing_only() {
                        declared.push(types::StructField::new(name.clone(), value.ty.clone()));
                    }
                }
                _ => closed = false,
            }
            fields.push(StructField { key, value });
        }
        let shape = if closed {
            StructType::closed(declared)
        } else {
            StructType::open(declared)
        };
        Ok(Rex::new(StaticType::Struct(shape), RexOp::Struct(fields)))
    }
}
