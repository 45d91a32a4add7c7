//! Semantic planning: AST in, typed plan and problems out.
//!
//! [`Planner::plan`] binds every name of a statement, types every expression,
//! resolves every function call against the [`FunctionRegistry`] and builds a
//! [`Plan`]. Semantic failures do not abort planning: each is recorded as a
//! [`Problem`] and the offending expression is given a continuation type so
//! the rest of the statement is still checked. Only a malformed AST or an
//! unusable session is fatal.

mod calls;
mod context;
mod passes;
mod paths;
mod rex;
mod select;
mod statement;

pub use passes::{FnPass, PlanPass};

use crate::ast::Statement;
use crate::catalog::{Catalogs, Session};
use crate::diag::{Problem, ProblemMode};
use crate::error::PlanningError;
use crate::functions::{FnSignature, FunctionKind, FunctionRegistry};
use crate::plan::Plan;
use context::PlanContext;
use std::sync::Arc;
use tracing::debug;

/// Configuration for a [`Planner`].
#[derive(Clone, Default)]
pub struct PlannerConfig {
    /// Severity policy for type-level problems.
    pub mode: ProblemMode,

    /// User-defined functions added to the default namespace.
    pub functions: Vec<(FunctionKind, FnSignature)>,

    /// Passes run over every finished plan, in order.
    pub passes: Vec<Arc<dyn PlanPass>>,
}

impl PlannerConfig {
    /// Sets the problem mode.
    pub fn with_mode(mut self, mode: ProblemMode) -> Self {
        self.mode = mode;
        self
    }

    /// Adds a user-defined function.
    pub fn with_function(mut self, kind: FunctionKind, signature: FnSignature) -> Self {
        self.functions.push((kind, signature));
        self
    }

    /// Appends a post-planning pass.
    pub fn with_pass(mut self, pass: Arc<dyn PlanPass>) -> Self {
        self.passes.push(pass);
        self
    }
}

impl std::fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("mode", &self.mode)
            .field("functions", &self.functions)
            .field(
                "passes",
                &self.passes.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Outcome of planning one statement, always carrying the problems found.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The plan. Parts that failed to resolve are error continuations.
    pub plan: Plan,

    /// Every problem reported while planning, in discovery order.
    pub problems: Vec<Problem>,
}

impl PlanOutcome {
    /// Returns true if some problem is an error.
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(Problem::is_error)
    }

    /// Returns the error problems.
    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.is_error())
    }

    /// Returns the warning problems.
    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.is_warning())
    }

    /// Returns true if planning reported no problems at all.
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// The semantic planner.
///
/// A planner is immutable once built and may be shared between threads;
/// every call to [`Planner::plan`] owns its own environment and problem list.
#[derive(Debug)]
pub struct Planner {
    catalogs: Catalogs,
    registry: Arc<FunctionRegistry>,
    config: PlannerConfig,
}

impl Planner {
    /// Creates a planner over `catalogs` with the builtin functions.
    pub fn new(catalogs: Catalogs) -> Self {
        Self {
            catalogs,
            registry: Arc::new(FunctionRegistry::builtins()),
            config: PlannerConfig::default(),
        }
    }

    /// Replaces the function registry. User functions already configured are
    /// added to it.
    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = Arc::new(registry);
        self.merge_functions();
        self
    }

    /// Applies `config`, adding its user functions to the registry.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self.merge_functions();
        self
    }

    fn merge_functions(&mut self) {
        if self.config.functions.is_empty() {
            return;
        }
        let mut registry = FunctionRegistry::clone(&self.registry);
        for (kind, signature) in &self.config.functions {
            debug!(function = %signature, ?kind, "registered user function");
            registry.add(*kind, signature.clone());
        }
        self.registry = Arc::new(registry);
    }

    /// Returns the function registry.
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Returns the catalogs.
    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans one statement.
    ///
    /// Returns an error only when the input cannot be planned at all: a
    /// structurally invalid AST, or a session whose current catalog is not
    /// registered.
    pub fn plan(
        &self,
        session: &Session,
        statement: &Statement,
    ) -> Result<PlanOutcome, PlanningError> {
        debug!(
            query_id = %session.query_id,
            catalog = %session.catalog,
            mode = ?self.config.mode,
            "planning statement"
        );
        if !self.catalogs.is_empty() && self.catalogs.get(&session.catalog).is_none() {
            return Err(PlanningError::UnknownCatalog {
                catalog: session.catalog.clone(),
            });
        }

        let mut cx = PlanContext::new(session, &self.catalogs, &self.registry, self.config.mode);
        let statement = cx.plan_statement(statement)?;
        let (globals, problems) = cx.finish();
        let mut plan = Plan { statement, globals };

        for pass in &self.config.passes {
            debug!(pass = pass.name(), "running plan pass");
            plan = pass.apply(plan);
        }

        let outcome = PlanOutcome { plan, problems };
        debug!(
            query_id = %session.query_id,
            errors = outcome.errors().count(),
            warnings = outcome.warnings().count(),
            globals = outcome.plan.globals.len(),
            "planned statement"
        );
        Ok(outcome)
    }
}
