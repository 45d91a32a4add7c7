//! Statements: queries and DML.

use super::context::PlanContext;
use crate::ast::{DeleteStatement, InsertStatement, Span, Statement};
use crate::binding::BindingPath;
use crate::diag::ProblemDetails;
use crate::env::ScopeKind;
use crate::error::PlanningError;
use crate::plan::{Binding, PlanStatement, Rel, RelOp, RelType, Rex, RexOp, VarRef};
use crate::types::StaticType;

impl PlanContext<'_> {
    pub(super) fn plan_statement(
        &mut self,
        statement: &Statement,
    ) -> Result<PlanStatement, PlanningError> {
        match statement {
            Statement::Query(expr) => Ok(PlanStatement::Query(self.plan_expr(expr)?)),
            Statement::Insert(insert) => self.plan_insert(insert),
            Statement::Delete(delete) => self.plan_delete(delete),
        }
    }

    fn plan_insert(&mut self, insert: &InsertStatement) -> Result<PlanStatement, PlanningError> {
        let target = self.resolve_target(&insert.target, &insert.target_span)?;
        let value = self.plan_expr(&insert.value)?;
        Ok(PlanStatement::Insert {
            target: target.map(|(index, _)| index),
            value,
        })
    }

    fn plan_delete(&mut self, delete: &DeleteStatement) -> Result<PlanStatement, PlanningError> {
        let target = self.resolve_target(&delete.target, &delete.target_span)?;
        let alias = match (&delete.alias, delete.target.steps.last()) {
            (Some(alias), _) => alias.name.clone(),
            (None, Some(last)) => last.name.clone(),
            (None, None) => return Err(PlanningError::malformed("DELETE without a target")),
        };

        let rex = match &target {
            Some((index, ty)) => Rex::new(ty.clone(), RexOp::Var(VarRef::Global { index: *index })),
            None => Rex::err(
                StaticType::Dynamic,
                format!("undefined target {}", delete.target),
                vec![],
            ),
        };
        let element = match rex.ty.element_type() {
            Some(element) => element.clone(),
            None if rex.ty.is_dynamic() => StaticType::Dynamic,
            None => rex.ty.clone(),
        };
        let mut rows = Rel::new(
            RelType::unordered(vec![Binding::new(alias, element)]),
            RelOp::Scan { rex },
        );

        if let Some(predicate) = &delete.where_clause {
            self.push_scope(ScopeKind::From, rows.ty.schema.clone(), &delete.target_span);
            let rex = self.plan_expr(predicate);
            self.pop_scopes(1);
            let rex = rex?;
            self.expect_condition(&rex, "WHERE", predicate.span());
            rows = Rel::new(
                rows.ty.clone(),
                RelOp::Filter {
                    input: Box::new(rows),
                    predicate: rex,
                },
            );
        }

        Ok(PlanStatement::Delete {
            target: target.map(|(index, _)| index),
            rows,
        })
    }

    /// Resolves a DML target, which must name a catalog object exactly.
    fn resolve_target(
        &mut self,
        path: &BindingPath,
        span: &Span,
    ) -> Result<Option<(usize, StaticType)>, PlanningError> {
        if path.is_empty() {
            return Err(PlanningError::malformed("DML statement without a target"));
        }
        let resolved = self
            .env
            .resolve_global(path)
            .filter(|resolved| resolved.consumed == path.len());
        match resolved {
            Some(resolved) => match resolved.var {
                VarRef::Global { index } => Ok(Some((index, resolved.ty))),
                VarRef::Local { .. } => Ok(None),
            },
            None => {
                self.report(
                    ProblemDetails::UndefinedDmlTarget {
                        target: path.to_string(),
                    },
                    span.clone(),
                );
                Ok(None)
            }
        }
    }
}
