// Integration tests for function and operator resolution during planning.

mod common;

use common::*;
use partiql_planner::ast::{BinaryOp, CallExpr, CastExpr, Expr, FunctionName};
use partiql_planner::functions::FnParameter;
use partiql_planner::plan::{CastKind, RexOp};
use partiql_planner::{
    BindingName, FnSignature, FunctionKind, Planner, PlannerConfig, ProblemMode, StaticType,
};

// ==================== Static resolution ====================

#[test]
fn test_exact_operator_match_is_static() {
    let outcome = plan_query(
        ProblemMode::Quiet,
        binary(BinaryOp::Plus, lit_int(1), lit_int(2)),
    );
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));

    let root = outcome.plan.query().expect("query plan");
    assert_eq!(root.ty, StaticType::Int4);
    match &root.op {
        RexOp::CallStatic { signature, args } => {
            assert_eq!(signature.name, "plus");
            assert!(args.iter().all(|arg| !matches!(arg.op, RexOp::Cast { .. })));
        }
        other => panic!("expected a static call, got {other:?}"),
    }
}

#[test]
fn test_widening_inserts_implicit_cast() {
    // INT4 + INT8 widens the left operand.
    let outcome = plan_query(
        ProblemMode::Quiet,
        binary(BinaryOp::Plus, lit_int(1), lit_int(5_000_000_000)),
    );
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));

    let root = outcome.plan.query().expect("query plan");
    assert_eq!(root.ty, StaticType::Int8);
    let RexOp::CallStatic { args, .. } = &root.op else {
        panic!("expected a static call, got {:?}", root.op);
    };
    match &args[0].op {
        RexOp::Cast { target, kind, .. } => {
            assert_eq!(target, &StaticType::Int8);
            assert_eq!(*kind, CastKind::Implicit);
        }
        other => panic!("expected an implicit cast, got {other:?}"),
    }
}

#[test]
fn test_scalar_function_over_text() {
    let outcome = plan_query(ProblemMode::Quiet, call("upper", vec![lit_str("abc")]));
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));
    assert_eq!(outcome.plan.root_type(), Some(&StaticType::String));
}

#[test]
fn test_function_names_are_case_insensitive() {
    let outcome = plan_query(ProblemMode::Quiet, call("UPPER", vec![lit_str("abc")]));
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));
}

#[test]
fn test_null_argument_makes_result_nullable() {
    let outcome = plan_query(ProblemMode::Quiet, call("upper", vec![null()]));
    // Always NULL: reported, but typed.
    assert_problem_counts(&outcome, 0, 1);
    assert_has_problem(&outcome, "plan::always_null_or_missing");
    assert!(outcome.plan.root_type().expect("typed").may_be_null());
}

// ==================== Dynamic dispatch ====================

#[test]
fn test_dynamic_argument_dispatches_at_runtime() {
    let outcome = plan_query(
        ProblemMode::Quiet,
        binary(BinaryOp::Plus, var("anything"), lit_int(1)),
    );
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));

    let root = outcome.plan.query().expect("query plan");
    match &root.op {
        RexOp::CallDynamic {
            name, candidates, ..
        } => {
            assert_eq!(name, "plus");
            assert!(candidates.len() > 1);
            // Candidates keep declaration order, fallback last.
            let last = candidates.last().expect("candidates");
            assert!(last.signature.is_dynamic_fallback());
        }
        other => panic!("expected a dynamic call, got {other:?}"),
    }
    assert!(root.ty.may_be_missing());
}

// ==================== Incompatible operands ====================

#[test]
fn test_incompatible_operands_type_as_missing() {
    let outcome = plan_query(
        ProblemMode::Quiet,
        binary(BinaryOp::Plus, lit_int(1), lit_str("a")),
    );
    assert_problem_counts(&outcome, 0, 1);
    assert_has_problem(&outcome, "plan::incompatible_types");
    assert_eq!(outcome.plan.root_type(), Some(&StaticType::Missing));
}

#[test]
fn test_equality_of_unrelated_types_is_not_a_problem() {
    let outcome = plan_query(
        ProblemMode::Signal,
        binary(BinaryOp::Eq, lit_int(1), lit_str("a")),
    );
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));
    assert_eq!(outcome.plan.root_type(), Some(&StaticType::Bool));
}

// ==================== Unknown functions ====================

#[test]
fn test_unknown_function_is_error_with_continuation() {
    let outcome = plan_query(
        ProblemMode::Quiet,
        call("no_such_function", vec![lit_int(1)]),
    );
    assert_problem_counts(&outcome, 1, 0);
    assert_has_problem(&outcome, "plan::unknown_function");

    let root = outcome.plan.query().expect("query plan");
    assert!(root.is_err());
    assert_eq!(root.ty, StaticType::Dynamic);
}

#[test]
fn test_wrong_arity_is_unknown_function() {
    let outcome = plan_query(ProblemMode::Quiet, call("upper", vec![]));
    assert_has_problem(&outcome, "plan::unknown_function");
}

#[test]
fn test_unknown_namespace_is_unknown_function() {
    let expr = Expr::Call(CallExpr {
        name: FunctionName {
            namespace: Some(BindingName::insensitive("nowhere")),
            name: BindingName::insensitive("upper"),
        },
        args: vec![lit_str("a")],
        quantifier: None,
        span: 0..13,
    });
    let outcome = plan_query(ProblemMode::Quiet, expr);
    assert_problem_counts(&outcome, 1, 0);
}

// ==================== Aggregates outside SELECT ====================

#[test]
fn test_aggregate_outside_select_is_unsupported() {
    let outcome = plan_query(ProblemMode::Quiet, call("sum", vec![lit_int(1)]));
    assert_problem_counts(&outcome, 1, 0);
    assert_has_problem(&outcome, "plan::unsupported_feature");
}

#[test]
fn test_count_star_outside_select_is_unsupported() {
    let outcome = plan_query(ProblemMode::Quiet, Expr::CountStar(0..8));
    assert_has_problem(&outcome, "plan::unsupported_feature");
    assert_eq!(outcome.plan.root_type(), Some(&StaticType::Int8));
}

// ==================== CAST ====================

#[test]
fn test_cast_keeps_nullability_of_input() {
    let cast = Expr::Cast(CastExpr {
        value: Box::new(var("anything")),
        target: StaticType::Int8,
        span: 0..20,
    });
    let outcome = plan_query(ProblemMode::Quiet, cast);
    let ty = outcome.plan.root_type().expect("typed");
    assert!(ty.may_be_null());
    assert!(ty.may_be_missing());
    assert!(ty.members().contains(&StaticType::Int8));
}

// ==================== User functions ====================

#[test]
fn test_user_function_is_resolved() {
    let double = FnSignature::new(
        "double_it",
        vec![FnParameter::new("value", StaticType::Int4)],
        StaticType::Int8,
    );
    let config = PlannerConfig::default().with_function(FunctionKind::Scalar, double);
    let planner = Planner::new(test_catalogs()).with_config(config);

    let outcome = planner
        .plan(
            &session(),
            &partiql_planner::ast::Statement::Query(call("double_it", vec![lit_int(2)])),
        )
        .expect("planning succeeds");
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));
    assert_eq!(outcome.plan.root_type(), Some(&StaticType::Int8));

    // The builtins are still there.
    assert!(planner
        .registry()
        .lookup(None, FunctionKind::Scalar, &BindingName::insensitive("upper"))
        .is_some());
}

#[test]
fn test_user_any_overload_is_not_treated_as_fallback() {
    let typed = FnSignature::new(
        "describe_it",
        vec![FnParameter::new("value", StaticType::Int4)],
        StaticType::Int4,
    );
    let any = FnSignature::new(
        "describe_it",
        vec![FnParameter::new("value", StaticType::Dynamic)],
        StaticType::Int4,
    )
    .with_missable(true);
    let config = PlannerConfig::default()
        .with_function(FunctionKind::Scalar, typed)
        .with_function(FunctionKind::Scalar, any);
    let planner = Planner::new(test_catalogs()).with_config(config);

    let outcome = planner
        .plan(
            &session(),
            &partiql_planner::ast::Statement::Query(call("describe_it", vec![lit_str("a")])),
        )
        .expect("planning succeeds");
    assert!(outcome.is_clean(), "{}", format_problems(&outcome));
    assert_eq!(
        outcome.plan.root_type(),
        Some(&StaticType::union([StaticType::Int4, StaticType::Missing]))
    );
}
