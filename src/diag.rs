//! Planning problems: the non-fatal diagnostics reported while typing a plan.
//!
//! A [`Problem`] is plain data: a severity, a [`ProblemDetails`] variant and
//! the span of the offending AST node. Messages, help text and codes are pure
//! functions over the variant. Problems are rendered through miette with
//! [`Problem::to_report`].

use crate::ast::Span;
use crate::types::StaticType;
use miette::{Diagnostic, LabeledSpan, Report, Severity};
use smol_str::SmolStr;
use std::fmt;
use tracing::trace;

/// Severity level for a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemSeverity {
    /// The plan must not be executed.
    Error,
    /// The plan is executable but probably not what the author meant.
    Warning,
}

impl fmt::Display for ProblemSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemSeverity::Error => write!(f, "error"),
            ProblemSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// How strictly suspicious-but-typable constructs are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProblemMode {
    /// Mode-dependent problems are warnings.
    #[default]
    Quiet,
    /// Mode-dependent problems are errors.
    Signal,
}

/// The structured detail of a problem, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemDetails {
    /// A variable reference resolved neither locally nor in any catalog.
    UndefinedVariable {
        name: String,
        in_scope: Vec<SmolStr>,
    },

    /// The target of an INSERT or DELETE does not exist.
    UndefinedDmlTarget { target: String },

    /// No function overload accepts the argument types.
    UnknownFunction {
        name: SmolStr,
        args: Vec<StaticType>,
    },

    /// No aggregate overload accepts the argument types.
    UnknownAggregateFunction {
        name: SmolStr,
        args: Vec<StaticType>,
    },

    /// A name is bound twice in the same scope.
    VariableAlreadyDefined { name: SmolStr },

    /// A syntactically valid construct the planner does not support.
    UnsupportedFeature { feature: SmolStr },

    /// A path step on a value that is always NULL or MISSING, or on a type
    /// that cannot be navigated this way.
    AlwaysMissingPath {
        step: String,
        base: StaticType,
    },

    /// A field that does not exist on a closed struct.
    UnresolvedField {
        field: String,
        on: StaticType,
    },

    /// A call whose argument is always NULL or MISSING.
    AlwaysNullOrMissing { function: SmolStr },

    /// Operand types for which the operator always returns MISSING.
    IncompatibleTypesForOp {
        op: SmolStr,
        args: Vec<StaticType>,
    },

    /// An expression of the wrong type in a typed context (WHERE, LIMIT, ...).
    UnexpectedType {
        context: SmolStr,
        expected: String,
        actual: StaticType,
    },

    /// Every branch of a CASE expression is MISSING.
    CaseAlwaysMissing,
}

impl ProblemDetails {
    /// Returns true if severity follows the [`ProblemMode`].
    ///
    /// Resolution failures are always errors; type-level problems are
    /// warnings in quiet mode and errors in signal mode.
    pub fn is_mode_dependent(&self) -> bool {
        match self {
            ProblemDetails::UndefinedVariable { .. }
            | ProblemDetails::UndefinedDmlTarget { .. }
            | ProblemDetails::UnknownFunction { .. }
            | ProblemDetails::UnknownAggregateFunction { .. }
            | ProblemDetails::VariableAlreadyDefined { .. }
            | ProblemDetails::UnsupportedFeature { .. } => false,
            ProblemDetails::AlwaysMissingPath { .. }
            | ProblemDetails::UnresolvedField { .. }
            | ProblemDetails::AlwaysNullOrMissing { .. }
            | ProblemDetails::IncompatibleTypesForOp { .. }
            | ProblemDetails::UnexpectedType { .. }
            | ProblemDetails::CaseAlwaysMissing => true,
        }
    }

    /// Returns the severity of this problem under `mode`.
    pub fn severity(&self, mode: ProblemMode) -> ProblemSeverity {
        match (self.is_mode_dependent(), mode) {
            (false, _) | (true, ProblemMode::Signal) => ProblemSeverity::Error,
            (true, ProblemMode::Quiet) => ProblemSeverity::Warning,
        }
    }

    /// Returns the stable diagnostic code of this problem kind.
    pub fn code(&self) -> &'static str {
        match self {
            ProblemDetails::UndefinedVariable { .. } => "plan::undefined_variable",
            ProblemDetails::UndefinedDmlTarget { .. } => "plan::undefined_dml_target",
            ProblemDetails::UnknownFunction { .. } => "plan::unknown_function",
            ProblemDetails::UnknownAggregateFunction { .. } => "plan::unknown_aggregate",
            ProblemDetails::VariableAlreadyDefined { .. } => "plan::variable_already_defined",
            ProblemDetails::UnsupportedFeature { .. } => "plan::unsupported_feature",
            ProblemDetails::AlwaysMissingPath { .. } => "plan::always_missing_path",
            ProblemDetails::UnresolvedField { .. } => "plan::unresolved_field",
            ProblemDetails::AlwaysNullOrMissing { .. } => "plan::always_null_or_missing",
            ProblemDetails::IncompatibleTypesForOp { .. } => "plan::incompatible_types",
            ProblemDetails::UnexpectedType { .. } => "plan::unexpected_type",
            ProblemDetails::CaseAlwaysMissing => "plan::case_always_missing",
        }
    }

    /// Formats the problem message.
    pub fn message(&self) -> String {
        match self {
            ProblemDetails::UndefinedVariable { name, .. } => {
                format!("Undefined variable '{}'", name)
            }
            ProblemDetails::UndefinedDmlTarget { target } => {
                format!("Data manipulation target '{}' does not exist", target)
            }
            ProblemDetails::UnknownFunction { name, args } => format!(
                "Unknown function '{}' for argument types ({})",
                name,
                type_list(args)
            ),
            ProblemDetails::UnknownAggregateFunction { name, args } => format!(
                "Unknown aggregate function '{}' for argument types ({})",
                name,
                type_list(args)
            ),
            ProblemDetails::VariableAlreadyDefined { name } => {
                format!("Variable '{}' is already defined in this scope", name)
            }
            ProblemDetails::UnsupportedFeature { feature } => {
                format!("{} is not supported yet", feature)
            }
            ProblemDetails::AlwaysMissingPath { step, base } => format!(
                "Path step '{}' on a value of type {} always returns MISSING",
                step, base
            ),
            ProblemDetails::UnresolvedField { field, on } => {
                format!("Field '{}' does not exist on {}", field, on)
            }
            ProblemDetails::AlwaysNullOrMissing { function } => format!(
                "Expression always returns null or missing: '{}' receives an argument \
                 that is always null or missing",
                function
            ),
            ProblemDetails::IncompatibleTypesForOp { op, args } => format!(
                "Incompatible argument types ({}) for '{}'",
                type_list(args),
                op
            ),
            ProblemDetails::UnexpectedType {
                context,
                expected,
                actual,
            } => format!(
                "Expected {} in {}, found {}",
                expected, context, actual
            ),
            ProblemDetails::CaseAlwaysMissing => {
                "Every branch of this CASE expression returns MISSING".to_string()
            }
        }
    }

    /// Returns help text suggesting a fix, if any.
    pub fn help(&self) -> Option<String> {
        match self {
            ProblemDetails::UndefinedVariable { in_scope, .. } if !in_scope.is_empty() => {
                Some(format!("Variables in scope: {}", in_scope.join(", ")))
            }
            ProblemDetails::UndefinedVariable { .. } => {
                Some("Check the spelling, or quote the name to match it exactly".to_string())
            }
            ProblemDetails::UnknownFunction { .. } => {
                Some("Check the argument count and types, or add an explicit CAST".to_string())
            }
            ProblemDetails::VariableAlreadyDefined { .. } => {
                Some("Give each binding in the clause a distinct alias".to_string())
            }
            ProblemDetails::UnresolvedField { .. } => {
                Some("The struct type is closed; only declared fields exist".to_string())
            }
            _ => None,
        }
    }

    /// Returns the label text for the primary span.
    fn label(&self) -> &'static str {
        match self {
            ProblemDetails::UndefinedVariable { .. } => "not found in any scope or catalog",
            ProblemDetails::UndefinedDmlTarget { .. } => "unknown target",
            ProblemDetails::UnknownFunction { .. } => "no matching overload",
            ProblemDetails::UnknownAggregateFunction { .. } => "no matching aggregate",
            ProblemDetails::VariableAlreadyDefined { .. } => "redefined here",
            ProblemDetails::UnsupportedFeature { .. } => "unsupported",
            ProblemDetails::AlwaysMissingPath { .. } => "always MISSING",
            ProblemDetails::UnresolvedField { .. } => "unknown field",
            ProblemDetails::AlwaysNullOrMissing { .. } => "always null or missing",
            ProblemDetails::IncompatibleTypesForOp { .. } => "incompatible operands",
            ProblemDetails::UnexpectedType { .. } => "unexpected type",
            ProblemDetails::CaseAlwaysMissing => "all branches MISSING",
        }
    }
}

fn type_list(types: &[StaticType]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A problem reported during planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Severity under the planning mode in effect.
    pub severity: ProblemSeverity,
    /// What went wrong.
    pub details: ProblemDetails,
    /// Span of the offending AST node.
    pub span: Span,
}

impl Problem {
    /// Creates a problem with the severity `details` has under `mode`.
    pub fn new(details: ProblemDetails, span: Span, mode: ProblemMode) -> Self {
        Self {
            severity: details.severity(mode),
            details,
            span,
        }
    }

    /// Returns true for error-severity problems.
    pub fn is_error(&self) -> bool {
        self.severity == ProblemSeverity::Error
    }

    /// Returns true for warning-severity problems.
    pub fn is_warning(&self) -> bool {
        self.severity == ProblemSeverity::Warning
    }

    /// Formats the problem message.
    pub fn message(&self) -> String {
        self.details.message()
    }

    /// Converts this problem to a miette report with source context.
    pub fn to_report(&self, source: &SourceFile) -> Report {
        let diagnostic = build_diagnostic(self, source);
        let report = Report::new(diagnostic);
        match source.name() {
            Some(name) => report.with_source_code(miette::NamedSource::new(
                name,
                source.content().to_string(),
            )),
            None => report.with_source_code(source.content().to_string()),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.details.message())
    }
}

/// Append-only problem accumulator for one planning pass.
///
/// Severity is decided here, from the problem kind and the mode, so every
/// emission site treats the mode identically.
#[derive(Debug, Clone)]
pub struct ProblemList {
    mode: ProblemMode,
    problems: Vec<Problem>,
}

impl ProblemList {
    /// Creates an empty list for `mode`.
    pub fn new(mode: ProblemMode) -> Self {
        Self {
            mode,
            problems: Vec::new(),
        }
    }

    /// Returns the mode problems are reported under.
    pub fn mode(&self) -> ProblemMode {
        self.mode
    }

    /// Records a problem.
    pub fn report(&mut self, details: ProblemDetails, span: Span) {
        let problem = Problem::new(details, span, self.mode);
        trace!(
            severity = %problem.severity,
            code = problem.details.code(),
            "planning problem"
        );
        self.problems.push(problem);
    }

    /// Returns the problems recorded so far.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Returns true if any error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(Problem::is_error)
    }

    /// Consumes the list, returning the problems in report order.
    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }
}

/// A wrapper around query text for problem rendering.
#[derive(Debug, Clone)]
pub struct SourceFile {
    content: String,
    name: Option<String>,
}

impl SourceFile {
    /// Creates a source from the given query text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: None,
        }
    }

    /// Creates a named source.
    pub fn with_name(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: Some(name.into()),
        }
    }

    /// Returns the query text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the source name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Clamps a span to valid bounds within this source.
    pub fn clamp_span(&self, span: &Span) -> Span {
        let len = self.content.len();
        let start = span.start.min(len);
        let end = span.end.min(len).max(start);
        start..end
    }
}

/// Converts problems to miette reports against the same source.
pub fn problems_to_reports(problems: &[Problem], source: &SourceFile) -> Vec<Report> {
    problems.iter().map(|p| p.to_report(source)).collect()
}

fn build_diagnostic(problem: &Problem, source: &SourceFile) -> BuiltDiagnostic {
    let clamped = source.clamp_span(&problem.span);
    let label = LabeledSpan::new_primary_with_span(
        Some(problem.details.label().to_string()),
        (clamped.start, clamped.end - clamped.start),
    );

    BuiltDiagnostic {
        message: problem.details.message(),
        severity: match problem.severity {
            ProblemSeverity::Error => Severity::Error,
            ProblemSeverity::Warning => Severity::Warning,
        },
        code: problem.details.code(),
        help: problem.details.help(),
        labels: vec![label],
    }
}

/// The rendered form of a problem, implementing miette's Diagnostic trait.
#[derive(Debug)]
struct BuiltDiagnostic {
    message: String,
    severity: Severity,
    code: &'static str,
    help: Option<String>,
    labels: Vec<LabeledSpan>,
}

impl fmt::Display for BuiltDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BuiltDiagnostic {}

impl Diagnostic for BuiltDiagnostic {
    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.labels.clone().into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn undefined(name: &str) -> ProblemDetails {
        ProblemDetails::UndefinedVariable {
            name: name.to_string(),
            in_scope: vec![],
        }
    }

    #[test]
    fn severity_display() {
        assert_eq!(ProblemSeverity::Error.to_string(), "error");
        assert_eq!(ProblemSeverity::Warning.to_string(), "warning");
    }

    #[test]
    fn resolution_failures_are_always_errors() {
        let details = undefined("x");
        assert_eq!(details.severity(ProblemMode::Quiet), ProblemSeverity::Error);
        assert_eq!(details.severity(ProblemMode::Signal), ProblemSeverity::Error);
    }

    #[test]
    fn type_problems_follow_mode() {
        let details = ProblemDetails::CaseAlwaysMissing;
        assert_eq!(details.severity(ProblemMode::Quiet), ProblemSeverity::Warning);
        assert_eq!(details.severity(ProblemMode::Signal), ProblemSeverity::Error);
    }

    #[test]
    fn problem_list_applies_mode() {
        let mut quiet = ProblemList::new(ProblemMode::Quiet);
        quiet.report(ProblemDetails::CaseAlwaysMissing, 0..4);
        assert!(!quiet.has_errors());

        let mut signal = ProblemList::new(ProblemMode::Signal);
        signal.report(ProblemDetails::CaseAlwaysMissing, 0..4);
        assert!(signal.has_errors());
        assert_eq!(signal.into_problems().len(), 1);
    }

    #[test]
    fn message_mentions_argument_types() {
        let details = ProblemDetails::UnknownFunction {
            name: "upper".into(),
            args: vec![StaticType::Int4, StaticType::Bool],
        };
        assert_eq!(
            details.message(),
            "Unknown function 'upper' for argument types (INT4, BOOL)"
        );
    }

    #[test]
    fn undefined_variable_help_lists_scope() {
        let details = ProblemDetails::UndefinedVariable {
            name: "y".to_string(),
            in_scope: vec!["a".into(), "b".into()],
        };
        assert_eq!(details.help().as_deref(), Some("Variables in scope: a, b"));
    }

    #[test]
    fn source_file_clamp_span() {
        let src = SourceFile::new("hello");
        assert_eq!(src.clamp_span(&(0..10)), 0..5);
        let inverted = std::ops::Range { start: 3, end: 2 };
        assert_eq!(src.clamp_span(&inverted), 3..3);
        assert_eq!(src.clamp_span(&(10..20)), 5..5);
    }

    #[test]
    fn convert_problem_to_report() {
        let source = SourceFile::with_name("SELECT x FROM t", "query.sql");
        let problem = Problem::new(undefined("x"), 7..8, ProblemMode::Quiet);
        let report = problem.to_report(&source);
        assert_eq!(report.to_string(), "Undefined variable 'x'");

        let built = build_diagnostic(&problem, &source);
        assert_eq!(built.severity, Severity::Error);
        assert_eq!(built.code, "plan::undefined_variable");
        assert_eq!(built.labels.len(), 1);
        assert!(built.labels[0].primary());
    }

    #[test]
    fn convert_warning_with_out_of_bounds_span() {
        let source = SourceFile::new("MISSING.a");
        let problem = Problem::new(
            ProblemDetails::AlwaysMissingPath {
                step: "a".to_string(),
                base: StaticType::Missing,
            },
            0..100,
            ProblemMode::Quiet,
        );
        let built = build_diagnostic(&problem, &source);
        assert_eq!(built.severity, Severity::Warning);
        assert_eq!(built.labels[0].offset(), 0);
        assert_eq!(built.labels[0].len(), 9);
    }

    #[test]
    fn convert_multiple_problems() {
        let source = SourceFile::new("x + y");
        let problems = vec![
            Problem::new(undefined("x"), 0..1, ProblemMode::Quiet),
            Problem::new(undefined("y"), 4..5, ProblemMode::Quiet),
        ];
        let reports = problems_to_reports(&problems, &source);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].to_string(), "Undefined variable 'y'");
    }
}
