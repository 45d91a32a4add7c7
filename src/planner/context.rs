//! State of one planning pass.

use crate::ast::{Expr, PathStep, Span};
use crate::catalog::{Catalogs, Session};
use crate::diag::{Problem, ProblemDetails, ProblemList, ProblemMode};
use crate::env::{Environment, ScopeKind};
use crate::functions::FunctionRegistry;
use crate::plan::{Binding, Global, Rex, RexOp, VarRef};
use crate::types::StaticType;

/// Columns of an Aggregate rel that replace AST expressions above it.
///
/// After GROUP BY, aggregate calls and group key expressions in HAVING,
/// ORDER BY and the select list are not re-evaluated; they read the column
/// the Aggregate rel computed for them.
pub(super) struct GroupFrame {
    /// Scope depth at which the group scope sits.
    depth: usize,
    /// Aggregate call nodes, by identity, in column order.
    aggregates: Vec<*const Expr>,
    /// Path text of each group key and its column offset.
    keys: Vec<(String, usize)>,
    /// Column types, matching the group scope.
    types: Vec<StaticType>,
}

impl GroupFrame {
    pub(super) fn new(
        depth: usize,
        aggregates: Vec<*const Expr>,
        keys: Vec<(String, usize)>,
        types: Vec<StaticType>,
    ) -> Self {
        Self {
            depth,
            aggregates,
            keys,
            types,
        }
    }
}

pub(super) struct PlanContext<'a> {
    pub(super) env: Environment<'a>,
    pub(super) registry: &'a FunctionRegistry,
    problems: ProblemList,
    groups: Vec<GroupFrame>,
}

impl<'a> PlanContext<'a> {
    pub(super) fn new(
        session: &'a Session,
        catalogs: &'a Catalogs,
        registry: &'a FunctionRegistry,
        mode: ProblemMode,
    ) -> Self {
        Self {
            env: Environment::new(session, catalogs),
            registry,
            problems: ProblemList::new(mode),
            groups: Vec::new(),
        }
    }

    /// Ends the pass, returning the global manifest and the problems.
    pub(super) fn finish(self) -> (Vec<Global>, Vec<Problem>) {
        (self.env.into_globals(), self.problems.into_problems())
    }

    pub(super) fn report(&mut self, details: ProblemDetails, span: Span) {
        self.problems.report(details, span);
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    /// Pushes a scope, reporting names it binds twice.
    pub(super) fn push_scope(&mut self, kind: ScopeKind, bindings: Vec<Binding>, span: &Span) {
        for name in self.env.push_scope(kind, bindings) {
            self.report(ProblemDetails::VariableAlreadyDefined { name }, span.clone());
        }
    }

    pub(super) fn pop_scopes(&mut self, count: usize) {
        for _ in 0..count {
            self.env.pop_scope();
        }
    }

    pub(super) fn push_group(&mut self, frame: GroupFrame) {
        self.groups.push(frame);
    }

    pub(super) fn pop_group(&mut self) {
        self.groups.pop();
    }

    /// Returns the Aggregate column computed for `expr`, if any.
    ///
    /// Only applies directly inside the group scope; a nested query sees the
    /// columns through ordinary variable resolution.
    pub(super) fn group_column(&self, expr: &Expr) -> Option<Rex> {
        let frame = self.groups.last()?;
        if frame.depth != self.env.depth() {
            return None;
        }
        let offset = match frame
            .aggregates
            .iter()
            .position(|agg| std::ptr::eq(*agg, expr))
        {
            Some(offset) => offset,
            None => {
                let key = path_key(expr)?;
                frame
                    .keys
                    .iter()
                    .find(|(text, _)| *text == key)
                    .map(|(_, offset)| *offset)?
            }
        };
        let ty = frame.types.get(offset)?.clone();
        Some(Rex::new(ty, RexOp::Var(VarRef::Local { depth: 0, offset })))
    }

    // ========================================================================
    // Checks
    // ========================================================================

    /// Reports `UnexpectedType` unless every present member of `rex.ty`
    /// satisfies `accepts`.
    pub(super) fn expect_type(
        &mut self,
        rex: &Rex,
        context: &str,
        expected: &str,
        accepts: impl Fn(&StaticType) -> bool,
        span: Span,
    ) {
        if !rex.ty.all_present(accepts) {
            self.report(
                ProblemDetails::UnexpectedType {
                    context: context.into(),
                    expected: expected.to_string(),
                    actual: rex.ty.clone(),
                },
                span,
            );
        }
    }

    /// Checks a WHERE, HAVING, ON or CASE condition.
    pub(super) fn expect_condition(&mut self, rex: &Rex, context: &str, span: Span) {
        self.expect_type(rex, context, "BOOL", |t| *t == StaticType::Bool, span);
    }
}

/// Returns the normalized text of a variable or symbol path, used to match
/// group keys against the expressions that repeat them.
pub(super) fn path_key(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Var(var) => Some(var.name.normalized().to_string()),
        Expr::Path(path) => {
            let mut key = path_key(&path.root)?;
            for step in &path.steps {
                match step {
                    PathStep::Symbol(name, _) => {
                        key.push('.');
                        key.push_str(&name.normalized());
                    }
                    PathStep::Index(Expr::Lit(lit, _)) => {
                        key.push('[');
                        key.push_str(lit.as_str()?);
                        key.push(']');
                    }
                    PathStep::Index(_) => return None,
                }
            }
            Some(key)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, PathExpr, VarQualifier, VarRef as AstVar};
    use crate::binding::BindingName;

    fn var(name: BindingName) -> Expr {
        Expr::Var(AstVar {
            name,
            qualifier: VarQualifier::Unqualified,
            span: 0..1,
        })
    }

    #[test]
    fn path_keys_ignore_case_of_insensitive_names() {
        let a = Expr::Path(PathExpr {
            root: Box::new(var(BindingName::insensitive("T"))),
            steps: vec![PathStep::Symbol(BindingName::insensitive("Price"), 1..7)],
            span: 0..7,
        });
        let b = Expr::Path(PathExpr {
            root: Box::new(var(BindingName::insensitive("t"))),
            steps: vec![PathStep::Symbol(BindingName::insensitive("price"), 10..16)],
            span: 9..16,
        });
        assert_eq!(path_key(&a), Some("t.price".to_string()));
        assert_eq!(path_key(&a), path_key(&b));
        assert_eq!(path_key(&Expr::Lit(Literal::Int(1), 0..1)), None);
    }
}
