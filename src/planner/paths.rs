//! Variables and path navigation.

use super::context::PlanContext;
use crate::ast::{self, Expr, Literal, Span, VarQualifier};
use crate::binding::{BindingName, BindingPath};
use crate::diag::ProblemDetails;
use crate::env::ResolutionStrategy;
use crate::error::PlanningError;
use crate::plan::{PathStep, Rex, RexOp};
use crate::types::{FieldLookup, StaticType};

/// What a path step asks of the value it is applied to.
enum Access<'n> {
    /// A named field, `.a` or `['a']`.
    Field(&'n BindingName),
    /// A field whose name is computed.
    AnyField,
    /// An element position, `[0]`.
    Position,
    /// A field or a position, decided at evaluation time.
    Any,
}

impl PlanContext<'_> {
    /// Plans a variable optionally followed by path steps.
    ///
    /// Leading symbol steps may be part of a global's name (`catalog.t`); the
    /// longest catalog match absorbs them.
    pub(super) fn plan_var_path(
        &mut self,
        var: &ast::VarRef,
        steps: &[ast::PathStep],
        strategy: ResolutionStrategy,
    ) -> Result<Rex, PlanningError> {
        let strategy = match var.qualifier {
            VarQualifier::Local => ResolutionStrategy::LocalsFirst,
            VarQualifier::Unqualified => strategy,
        };
        let mut names = vec![var.name.clone()];
        names.extend(steps.iter().map_while(|step| match step {
            ast::PathStep::Symbol(name, _) => Some(name.clone()),
            ast::PathStep::Index(_) => None,
        }));
        let path = BindingPath::new(names);

        let (root, rest) = match self.env.resolve(&path, strategy) {
            Some(resolved) => {
                let mut rex = Rex::new(resolved.ty, RexOp::Var(resolved.var));
                if let Some((field, ty)) = resolved.field {
                    rex = Rex::new(
                        ty,
                        RexOp::Path {
                            root: Box::new(rex),
                            step: PathStep::Symbol(BindingName::sensitive(field)),
                        },
                    );
                }
                let consumed = resolved.consumed.clamp(1, steps.len() + 1);
                (rex, &steps[consumed - 1..])
            }
            None => {
                self.report(
                    ProblemDetails::UndefinedVariable {
                        name: var.name.to_string(),
                        in_scope: self.env.names_in_scope(),
                    },
                    var.span.clone(),
                );
                let rex = Rex::err(
                    StaticType::Dynamic,
                    format!("undefined variable {}", var.name),
                    vec![],
                );
                (rex, steps)
            }
        };
        self.plan_steps(root, rest)
    }

    /// Plans a path expression.
    pub(super) fn plan_path(
        &mut self,
        path: &ast::PathExpr,
        strategy: ResolutionStrategy,
    ) -> Result<Rex, PlanningError> {
        if path.steps.is_empty() {
            return Err(PlanningError::malformed("path expression without steps"));
        }
        match path.root.as_ref() {
            Expr::Var(var) => self.plan_var_path(var, &path.steps, strategy),
            root => {
                let root = self.plan_expr(root)?;
                self.plan_steps(root, &path.steps)
            }
        }
    }

    fn plan_steps(&mut self, mut rex: Rex, steps: &[ast::PathStep]) -> Result<Rex, PlanningError> {
        for step in steps {
            rex = self.plan_step(rex, step)?;
        }
        Ok(rex)
    }

    fn plan_step(&mut self, base: Rex, step: &ast::PathStep) -> Result<Rex, PlanningError> {
        let (ty, step) = match step {
            ast::PathStep::Symbol(name, span) => {
                let ty = self.type_step(
                    &base.ty,
                    Access::Field(name),
                    format!(".{}", name),
                    span.clone(),
                );
                (ty, PathStep::Symbol(name.clone()))
            }
            ast::PathStep::Index(index) => {
                let key = self.plan_expr(index)?;
                let span = index.span();
                if let Expr::Lit(Literal::String(text), _) = index {
                    let name = BindingName::sensitive(text.clone());
                    let ty = self.type_step(
                        &base.ty,
                        Access::Field(&name),
                        format!("['{}']", text),
                        span,
                    );
                    (ty, PathStep::Key(Box::new(key)))
                } else {
                    let dispatch = key.ty.dispatch_type();
                    let access = if dispatch.is_integer() {
                        Access::Position
                    } else if dispatch.is_text() {
                        Access::AnyField
                    } else if dispatch.is_dynamic() || key.ty.is_absent() {
                        Access::Any
                    } else {
                        self.report(
                            ProblemDetails::UnexpectedType {
                                context: "path index".into(),
                                expected: "INT or STRING".to_string(),
                                actual: key.ty.clone(),
                            },
                            span.clone(),
                        );
                        Access::Any
                    };
                    let keyed = matches!(access, Access::AnyField);
                    let ty = self.type_step(&base.ty, access, "[...]".to_string(), span);
                    let step = if keyed {
                        PathStep::Key(Box::new(key))
                    } else {
                        PathStep::Index(Box::new(key))
                    };
                    (ty, step)
                }
            }
        };
        Ok(Rex::new(
            ty,
            RexOp::Path {
                root: Box::new(base),
                step,
            },
        ))
    }

    /// Types one navigation step over every member of `base`.
    fn type_step(
        &mut self,
        base: &StaticType,
        access: Access<'_>,
        text: String,
        span: Span,
    ) -> StaticType {
        if base.is_absent() {
            self.report(
                ProblemDetails::AlwaysMissingPath {
                    step: text,
                    base: base.clone(),
                },
                span,
            );
            return StaticType::Missing;
        }

        let mut results = Vec::new();
        let mut navigable = false;
        let mut found = false;
        for member in base.members() {
            match (member, &access) {
                (StaticType::Dynamic, _) => {
                    navigable = true;
                    found = true;
                    results.push(StaticType::Dynamic);
                }
                (StaticType::Struct(row), Access::Field(name)) => {
                    navigable = true;
                    match row.field(name) {
                        FieldLookup::Found(ty) => {
                            found = true;
                            results.push(ty.clone());
                        }
                        FieldLookup::Unknown => {
                            found = true;
                            results.push(StaticType::Dynamic);
                        }
                        FieldLookup::Absent => results.push(StaticType::Missing),
                    }
                }
                (StaticType::Struct(_), Access::AnyField | Access::Any) => {
                    navigable = true;
                    found = true;
                    results.push(StaticType::Dynamic);
                }
                (
                    StaticType::Array(element) | StaticType::Sexp(element),
                    Access::Position | Access::Any,
                ) => {
                    navigable = true;
                    found = true;
                    results.push(element.as_ref().clone());
                }
                _ => results.push(StaticType::Missing),
            }
        }

        if !navigable {
            self.report(
                ProblemDetails::AlwaysMissingPath {
                    step: text,
                    base: base.clone(),
                },
                span,
            );
            return StaticType::Missing;
        }
        if !found {
            let field = match access {
                Access::Field(name) => name.name.to_string(),
                _ => text,
            };
            self.report(
                ProblemDetails::UnresolvedField {
                    field,
                    on: base.clone(),
                },
                span,
            );
            return StaticType::Dynamic;
        }
        StaticType::union(results)
    }
}
