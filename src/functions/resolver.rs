//! Overload resolution.
//!
//! [`resolve`] picks the overloads of one function name that accept a list of
//! argument types. It is a pure function: the same inputs always yield the
//! same result, and failure is the ordinary [`FnResolution::NoMatch`] value.
//!
//! Resolution runs on argument *dispatch* types: NULL and MISSING members are
//! stripped (the typer accounts for them separately) and a union that still
//! has several members is treated as `Dynamic`. `Dynamic` itself never counts
//! as an exact match, so a catch-all overload cannot hide the runtime
//! candidates of a dynamic argument.

use super::signature::FnSignature;
use crate::types::lattice::precedence;
use crate::types::{implicit_coercion, is_assignable, StaticType};
use std::sync::Arc;

/// A cast inserted in front of one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coercion {
    /// Type the argument is cast to.
    pub target: StaticType,
    /// True when the cast is checked at evaluation time, because the
    /// argument's type is only known then. A failed check yields NULL.
    pub checked: bool,
}

/// A candidate that accepts the arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct FnMatch {
    pub signature: Arc<FnSignature>,
    /// Position of the signature in the overload list.
    pub index: usize,
    /// Per-argument cast, `None` where the argument is passed as is.
    pub coercions: Vec<Option<Coercion>>,
    /// Number of arguments whose type equals the parameter type.
    pub exact: usize,
}

impl FnMatch {
    /// Returns true if no argument needs a cast.
    pub fn is_uncoerced(&self) -> bool {
        self.coercions.iter().all(Option::is_none)
    }
}

/// Outcome of overload resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum FnResolution {
    /// Exactly one overload applies.
    Static(FnMatch),
    /// The overload is chosen at evaluation time among these, in declaration
    /// order.
    Dynamic(Vec<FnMatch>),
    /// No overload applies.
    NoMatch,
}

impl FnResolution {
    /// Returns a short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            FnResolution::Static(_) => "static",
            FnResolution::Dynamic(_) => "dynamic",
            FnResolution::NoMatch => "no_match",
        }
    }
}

/// Resolves `args` against `signatures`.
///
/// 1. Overloads of a different arity are discarded.
/// 2. An overload whose parameter types equal the argument types wins
///    outright; the first declared wins a tie.
/// 3. Every other overload is matched parameter by parameter (see
///    [`match_parameter`]); one rejected parameter eliminates the overload.
/// 4. A single survivor is the static match.
/// 5. With a `Dynamic` argument all survivors are returned for runtime
///    dispatch.
/// 6. Otherwise the survivors with the most exact parameters are kept, and
///    the one with the narrowest parameter types (then the first declared)
///    wins.
pub fn resolve(signatures: &[Arc<FnSignature>], args: &[StaticType]) -> FnResolution {
    let dispatch: Vec<StaticType> = args.iter().map(StaticType::dispatch_type).collect();

    let candidates: Vec<(usize, &Arc<FnSignature>)> = signatures
        .iter()
        .enumerate()
        .filter(|(_, sig)| sig.arity() == dispatch.len())
        .collect();
    if candidates.is_empty() {
        return FnResolution::NoMatch;
    }

    if let Some((index, sig)) = candidates.iter().find(|(_, sig)| is_exact(sig, &dispatch)) {
        return FnResolution::Static(FnMatch {
            signature: Arc::clone(sig),
            index: *index,
            coercions: vec![None; dispatch.len()],
            exact: dispatch.len(),
        });
    }

    let mut invocable: Vec<FnMatch> = candidates
        .iter()
        .filter_map(|(index, sig)| match_signature(*index, sig, &dispatch))
        .collect();

    if invocable.len() <= 1 {
        return invocable
            .pop()
            .map(FnResolution::Static)
            .unwrap_or(FnResolution::NoMatch);
    }

    if dispatch.iter().any(StaticType::is_dynamic) {
        return FnResolution::Dynamic(invocable);
    }

    let best_exact = invocable.iter().map(|m| m.exact).max().unwrap_or(0);
    invocable.retain(|m| m.exact == best_exact);
    invocable
        .into_iter()
        .min_by_key(|m| {
            let ranks: Vec<u8> = m.signature.parameter_types().map(precedence).collect();
            (ranks, m.index)
        })
        .map(FnResolution::Static)
        .unwrap_or(FnResolution::NoMatch)
}

fn is_exact(sig: &FnSignature, args: &[StaticType]) -> bool {
    sig.parameter_types()
        .zip(args)
        .all(|(param, arg)| param == arg && !arg.is_dynamic())
}

fn match_signature(index: usize, sig: &Arc<FnSignature>, args: &[StaticType]) -> Option<FnMatch> {
    let mut coercions = Vec::with_capacity(args.len());
    let mut exact = 0;
    for (param, arg) in sig.parameter_types().zip(args) {
        match match_parameter(arg, param)? {
            ParamMatch::Exact => {
                exact += 1;
                coercions.push(None);
            }
            ParamMatch::Accept => coercions.push(None),
            ParamMatch::Cast(coercion) => coercions.push(Some(coercion)),
        }
    }
    Some(FnMatch {
        signature: Arc::clone(sig),
        index,
        coercions,
        exact,
    })
}

enum ParamMatch {
    Exact,
    Accept,
    Cast(Coercion),
}

/// Matches one argument against one parameter, first applicable rule wins.
fn match_parameter(arg: &StaticType, param: &StaticType) -> Option<ParamMatch> {
    if arg == param && !arg.is_dynamic() {
        return Some(ParamMatch::Exact);
    }
    if param.is_dynamic() || arg.is_absent() {
        return Some(ParamMatch::Accept);
    }
    if arg.is_dynamic() {
        return Some(ParamMatch::Cast(Coercion {
            target: param.clone(),
            checked: true,
        }));
    }
    if is_assignable(arg, param) {
        return Some(ParamMatch::Accept);
    }
    implicit_coercion(arg, param).map(|target| {
        ParamMatch::Cast(Coercion {
            target,
            checked: false,
        })
    })
}
