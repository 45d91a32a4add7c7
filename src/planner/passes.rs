//! Post-planning passes.

use crate::plan::Plan;
use smol_str::SmolStr;

/// A transformation applied to every finished plan.
///
/// Passes run in the order they were configured; each receives the output of
/// the previous one.
pub trait PlanPass: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn apply(&self, plan: Plan) -> Plan;
}

/// A pass built from a closure.
pub struct FnPass<F> {
    name: SmolStr,
    f: F,
}

impl<F> FnPass<F>
where
    F: Fn(Plan) -> Plan + Send + Sync,
{
    pub fn new(name: impl Into<SmolStr>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> PlanPass for FnPass<F>
where
    F: Fn(Plan) -> Plan + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, plan: Plan) -> Plan {
        (self.f)(plan)
    }
}
