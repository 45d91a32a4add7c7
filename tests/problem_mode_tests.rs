// Problem reporting in quiet and signal mode: counts stay the same, only the
// severity of type-level problems changes.

mod common;

use common::*;
use partiql_planner::ast::{BinaryOp, CaseBranch, CaseExpr, Expr};
use partiql_planner::{ProblemMode, ProblemSeverity, StaticType};

fn case_when_true(then: Expr, default: Expr) -> Expr {
    Expr::Case(CaseExpr {
        operand: None,
        branches: vec![CaseBranch {
            when: lit_bool(true),
            then,
        }],
        default: Some(Box::new(default)),
        span: 0..30,
    })
}

// ==================== Arithmetic with MISSING ====================

#[test]
fn test_plus_missing_quiet_is_one_warning() {
    let outcome = plan_query(
        ProblemMode::Quiet,
        binary(BinaryOp::Plus, lit_int(1), missing()),
    );

    assert_problem_counts(&outcome, 0, 1);
    assert_has_problem(&outcome, "plan::always_null_or_missing");
    let ty = outcome.plan.root_type().expect("query plan");
    assert!(ty.may_be_missing(), "type should include MISSING: {ty}");
    assert!(ty.members().contains(&StaticType::Int4), "type should include INT4: {ty}");
}

#[test]
fn test_plus_missing_signal_is_one_error() {
    let outcome = plan_query(
        ProblemMode::Signal,
        binary(BinaryOp::Plus, lit_int(1), missing()),
    );

    assert_problem_counts(&outcome, 1, 0);
    // The plan is still produced.
    assert_eq!(
        outcome.plan.root_type(),
        Some(&StaticType::union([StaticType::Int4, StaticType::Missing]))
    );
}

// ==================== Undefined variables ====================

#[test]
fn test_undefined_variable_is_error_in_both_modes() {
    for mode in [ProblemMode::Quiet, ProblemMode::Signal] {
        let outcome = plan_query(mode, var("var_not_exist"));
        assert_problem_counts(&outcome, 1, 0);
        assert_has_problem(&outcome, "plan::undefined_variable");
        assert_eq!(outcome.plan.root_type(), Some(&StaticType::Dynamic));
    }
}

// ==================== Bare literals ====================

#[test]
fn test_bare_missing_has_no_problems() {
    for mode in [ProblemMode::Quiet, ProblemMode::Signal] {
        let outcome = plan_query(mode, missing());
        assert!(outcome.is_clean(), "{}", format_problems(&outcome));
        assert_eq!(outcome.plan.root_type(), Some(&StaticType::Missing));
    }
}

// ==================== CASE ====================

#[test]
fn test_case_with_one_missing_branch_is_clean() {
    for mode in [ProblemMode::Quiet, ProblemMode::Signal] {
        let outcome = plan_query(mode, case_when_true(missing(), lit_int(1)));
        assert!(outcome.is_clean(), "{}", format_problems(&outcome));
        assert_eq!(
            outcome.plan.root_type(),
            Some(&StaticType::union([StaticType::Int4, StaticType::Missing]))
        );
    }
}

#[test]
fn test_case_with_only_missing_branches_reports_once() {
    let quiet = plan_query(ProblemMode::Quiet, case_when_true(missing(), missing()));
    assert_problem_counts(&quiet, 0, 1);
    assert_has_problem(&quiet, "plan::case_always_missing");

    let signal = plan_query(ProblemMode::Signal, case_when_true(missing(), missing()));
    assert_problem_counts(&signal, 1, 0);
}

// ==================== Unknown struct fields ====================

fn select_f1_f2() -> Expr {
    query(select_from(
        vec![
            item(path(var("t"), &["f1"]), None),
            item(path(var("t"), &["f2"]), None),
        ],
        scan(var("struct_no_missing"), Some("t")),
    ))
}

#[test]
fn test_unknown_field_on_closed_struct_quiet() {
    let outcome = plan_query(ProblemMode::Quiet, select_f1_f2());

    assert_problem_counts(&outcome, 0, 1);
    assert_has_problem(&outcome, "plan::unresolved_field");

    let row = row_type(&outcome);
    assert_eq!(field_type(&row, "f1"), Some(&StaticType::Int4));
    assert_eq!(field_type(&row, "f2"), Some(&StaticType::Dynamic));
}

#[test]
fn test_unknown_field_on_closed_struct_signal() {
    let outcome = plan_query(ProblemMode::Signal, select_f1_f2());

    assert_problem_counts(&outcome, 1, 0);
    assert_eq!(field_type(&row_type(&outcome), "f2"), Some(&StaticType::Dynamic));
}

// ==================== Paths over MISSING ====================

#[test]
fn test_path_on_missing_reports_once() {
    for mode in [ProblemMode::Quiet, ProblemMode::Signal] {
        let outcome = plan_query(mode, path(missing(), &["a"]));
        assert_eq!(outcome.problems.len(), 1, "{}", format_problems(&outcome));
        assert_has_problem(&outcome, "plan::always_missing_path");
        assert_eq!(outcome.plan.root_type(), Some(&StaticType::Missing));
    }
}

#[test]
fn test_chained_paths_on_missing_report_each_step() {
    for mode in [ProblemMode::Quiet, ProblemMode::Signal] {
        let keyed = index(missing(), lit_str("a"));
        let outcome = plan_query(mode, path(keyed, &["a"]));
        assert_eq!(outcome.problems.len(), 2, "{}", format_problems(&outcome));
    }
}

// ==================== Mode equivalence ====================

#[test]
fn test_modes_agree_on_problem_counts() {
    let inputs = vec![
        binary(BinaryOp::Plus, lit_int(1), missing()),
        binary(BinaryOp::Plus, lit_int(1), lit_str("a")),
        call("upper", vec![lit_int(1)]),
        path(missing(), &["a"]),
        case_when_true(missing(), missing()),
        select_f1_f2(),
        var("var_not_exist"),
        call("no_such_function", vec![lit_int(1)]),
    ];

    for input in inputs {
        let quiet = plan_query(ProblemMode::Quiet, input.clone());
        let signal = plan_query(ProblemMode::Signal, input);

        assert_eq!(quiet.problems.len(), signal.problems.len());
        for (q, s) in quiet.problems.iter().zip(&signal.problems) {
            assert_eq!(q.details, s.details);
            assert_eq!(q.span, s.span);
            if q.details.is_mode_dependent() {
                assert_eq!(q.severity, ProblemSeverity::Warning);
                assert_eq!(s.severity, ProblemSeverity::Error);
            } else {
                assert_eq!(q.severity, ProblemSeverity::Error);
                assert_eq!(s.severity, ProblemSeverity::Error);
            }
        }
    }
}

#[test]
fn test_every_node_is_typed_after_problems() {
    // Problems never leave a node without a type; the continuation is at
    // worst DYNAMIC.
    let outcome = plan_query(
        ProblemMode::Signal,
        binary(
            BinaryOp::Plus,
            call("no_such_function", vec![var("var_not_exist")]),
            lit_int(1),
        ),
    );
    assert_eq!(outcome.errors().count(), 2, "{}", format_problems(&outcome));
    assert!(outcome.plan.root_type().is_some());
}
