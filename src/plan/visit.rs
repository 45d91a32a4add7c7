//! Immutable plan visitor.
//!
//! Implementors override the `visit_*` methods they care about and call the
//! matching `walk_*` function to continue into children. Returning
//! `ControlFlow::Break` stops the traversal.

use std::ops::ControlFlow;

use super::rel::{Rel, RelOp};
use super::rex::{PathStep, Rex, RexOp};
use super::{Plan, PlanStatement};

macro_rules! try_visit {
    ($expr:expr) => {
        match $expr {
            ControlFlow::Continue(()) => {}
            ControlFlow::Break(b) => return ControlFlow::Break(b),
        }
    };
}

/// Shared type alias for visitor traversal methods.
pub type VisitResult<B> = ControlFlow<B>;

/// Visitor over every scalar and relational node of a plan.
pub trait PlanVisitor {
    /// Early-exit payload produced when traversal stops.
    type Break;

    fn visit_plan(&mut self, plan: &Plan) -> VisitResult<Self::Break> {
        walk_plan(self, plan)
    }

    fn visit_rex(&mut self, rex: &Rex) -> VisitResult<Self::Break> {
        walk_rex(self, rex)
    }

    fn visit_rel(&mut self, rel: &Rel) -> VisitResult<Self::Break> {
        walk_rel(self, rel)
    }
}

pub fn walk_plan<V: PlanVisitor + ?Sized>(visitor: &mut V, plan: &Plan) -> VisitResult<V::Break> {
    match &plan.statement {
        PlanStatement::Query(rex) => visitor.visit_rex(rex),
        PlanStatement::Insert { value, .. } => visitor.visit_rex(value),
        PlanStatement::Delete { rows, .. } => visitor.visit_rel(rows),
    }
}

fn walk_all<V: PlanVisitor + ?Sized>(visitor: &mut V, rexes: &[Rex]) -> VisitResult<V::Break> {
    for rex in rexes {
        try_visit!(visitor.visit_rex(rex));
    }
    ControlFlow::Continue(())
}

pub fn walk_rex<V: PlanVisitor + ?Sized>(visitor: &mut V, rex: &Rex) -> VisitResult<V::Break> {
    match &rex.op {
        RexOp::Lit(_) | RexOp::Var(_) => ControlFlow::Continue(()),
        RexOp::Path { root, step } => {
            try_visit!(visitor.visit_rex(root));
            match step {
                PathStep::Symbol(_) => ControlFlow::Continue(()),
                PathStep::Key(key) | PathStep::Index(key) => visitor.visit_rex(key),
            }
        }
        RexOp::CallStatic { args, .. }
        | RexOp::CallDynamic { args, .. }
        | RexOp::Coalesce(args)
        | RexOp::TupleUnion(args)
        | RexOp::Err { args, .. }
        | RexOp::Collection { values: args, .. } => walk_all(visitor, args),
        RexOp::Cast { value, .. } | RexOp::Subquery(value) => visitor.visit_rex(value),
        RexOp::Case { branches, default } => {
            for branch in branches {
                try_visit!(visitor.visit_rex(&branch.condition));
                try_visit!(visitor.visit_rex(&branch.result));
            }
            visitor.visit_rex(default)
        }
        RexOp::NullIf(lhs, rhs) => {
            try_visit!(visitor.visit_rex(lhs));
            visitor.visit_rex(rhs)
        }
        RexOp::Struct(fields) => {
            for field in fields {
                try_visit!(visitor.visit_rex(&field.key));
                try_visit!(visitor.visit_rex(&field.value));
            }
            ControlFlow::Continue(())
        }
        RexOp::Select { constructor, rel } => {
            try_visit!(visitor.visit_rel(rel));
            visitor.visit_rex(constructor)
        }
    }
}

pub fn walk_rel<V: PlanVisitor + ?Sized>(visitor: &mut V, rel: &Rel) -> VisitResult<V::Break> {
    match &rel.op {
        RelOp::Scan { rex } | RelOp::ScanIndexed { rex } | RelOp::Unpivot { rex } => {
            visitor.visit_rex(rex)
        }
        RelOp::Filter { input, predicate } => {
            try_visit!(visitor.visit_rel(input));
            visitor.visit_rex(predicate)
        }
        RelOp::Project { input, projections } => {
            try_visit!(visitor.visit_rel(input));
            walk_all(visitor, projections)
        }
        RelOp::Join {
            left,
            right,
            condition,
            ..
        } => {
            try_visit!(visitor.visit_rel(left));
            try_visit!(visitor.visit_rel(right));
            visitor.visit_rex(condition)
        }
        RelOp::Aggregate {
            input,
            calls,
            groups,
            ..
        } => {
            try_visit!(visitor.visit_rel(input));
            for call in calls {
                try_visit!(walk_all(visitor, call.args()));
            }
            walk_all(visitor, groups)
        }
        RelOp::Sort { input, specs } => {
            try_visit!(visitor.visit_rel(input));
            for spec in specs {
                try_visit!(visitor.visit_rex(&spec.rex));
            }
            ControlFlow::Continue(())
        }
        RelOp::Distinct { input } => visitor.visit_rel(input),
        RelOp::Limit { input, limit: bound } | RelOp::Offset { input, offset: bound } => {
            try_visit!(visitor.visit_rel(input));
            visitor.visit_rex(bound)
        }
        RelOp::SetOp { left, right, .. } => {
            try_visit!(visitor.visit_rel(left));
            visitor.visit_rel(right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::plan::rel::{Binding, RelType};
    use crate::plan::rex::VarRef;
    use crate::types::StaticType;

    #[derive(Default)]
    struct Counter {
        rex: usize,
        rel: usize,
    }

    impl PlanVisitor for Counter {
        type Break = ();

        fn visit_rex(&mut self, rex: &Rex) -> ControlFlow<()> {
            self.rex += 1;
            walk_rex(self, rex)
        }

        fn visit_rel(&mut self, rel: &Rel) -> ControlFlow<()> {
            self.rel += 1;
            walk_rel(self, rel)
        }
    }

    fn scan_filter() -> Plan {
        let scan = Rel::new(
            RelType::unordered(vec![Binding::new("t", StaticType::Dynamic)]),
            RelOp::Scan {
                rex: Rex::lit(Literal::Null),
            },
        );
        let filter = Rel::new(
            scan.ty.clone(),
            RelOp::Filter {
                input: Box::new(scan),
                predicate: Rex::lit(Literal::Bool(true)),
            },
        );
        let select = Rex::new(
            StaticType::bag(StaticType::Dynamic),
            RexOp::Select {
                constructor: Box::new(Rex::new(
                    StaticType::Dynamic,
                    RexOp::Var(VarRef::Local { depth: 0, offset: 0 }),
                )),
                rel: Box::new(filter),
            },
        );
        Plan {
            statement: PlanStatement::Query(select),
            globals: vec![],
        }
    }

    #[test]
    fn visitor_reaches_every_node() {
        let mut counter = Counter::default();
        let flow = counter.visit_plan(&scan_filter());
        assert!(matches!(flow, ControlFlow::Continue(())));
        assert_eq!(counter.rel, 2);
        assert_eq!(counter.rex, 4);
    }

    struct FindLiteral;

    impl PlanVisitor for FindLiteral {
        type Break = Literal;

        fn visit_rex(&mut self, rex: &Rex) -> ControlFlow<Literal> {
            if let RexOp::Lit(lit) = &rex.op {
                return ControlFlow::Break(lit.clone());
            }
            walk_rex(self, rex)
        }
    }

    #[test]
    fn visitor_stops_on_break() {
        let flow = FindLiteral.visit_plan(&scan_filter());
        assert_eq!(flow, ControlFlow::Break(Literal::Null));
    }
}
