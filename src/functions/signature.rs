//! Function signatures.

use crate::binding::fold_case;
use crate::types::StaticType;
use smol_str::SmolStr;
use std::fmt;

/// Which of a namespace's three function lists a signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Called with function syntax, `upper(x)`.
    Scalar,
    /// Hidden function behind operator or special-form syntax (`+`, `LIKE`,
    /// `BETWEEN`, `IN`, `IS NULL`).
    Operator,
    /// Aggregate function.
    Aggregate,
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::Scalar => write!(f, "function"),
            FunctionKind::Operator => write!(f, "operator"),
            FunctionKind::Aggregate => write!(f, "aggregate"),
        }
    }
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FnParameter {
    pub name: SmolStr,
    pub ty: StaticType,
}

impl FnParameter {
    /// Creates a parameter.
    pub fn new(name: impl Into<SmolStr>, ty: StaticType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One overload of a function.
///
/// Arity and parameter types together form the overload key. The three flags
/// are independent:
///
/// - `is_null_call`: a NULL (or MISSING) argument produces NULL (or MISSING)
///   without invoking the function.
/// - `is_nullable`: the function itself may return NULL.
/// - `is_missable`: the function itself may return MISSING.
///
/// `is_fallback` marks the catch-all overload generated after a type group;
/// matching it on statically known arguments means no typed overload applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FnSignature {
    pub name: SmolStr,
    pub parameters: Vec<FnParameter>,
    pub returns: StaticType,
    pub is_null_call: bool,
    pub is_nullable: bool,
    pub is_missable: bool,
    pub is_fallback: bool,
}

impl FnSignature {
    /// Creates a null-call signature that never returns NULL or MISSING on
    /// its own. The name is lowercased.
    pub fn new(name: &str, parameters: Vec<FnParameter>, returns: StaticType) -> Self {
        Self {
            name: fold_case(name),
            parameters,
            returns,
            is_null_call: true,
            is_nullable: false,
            is_missable: false,
            is_fallback: false,
        }
    }

    pub fn with_null_call(mut self, is_null_call: bool) -> Self {
        self.is_null_call = is_null_call;
        self
    }

    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn with_missable(mut self, is_missable: bool) -> Self {
        self.is_missable = is_missable;
        self
    }

    pub fn with_fallback(mut self, is_fallback: bool) -> Self {
        self.is_fallback = is_fallback;
        self
    }

    /// Returns the number of parameters.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Returns the parameter types in order.
    pub fn parameter_types(&self) -> impl Iterator<Item = &StaticType> {
        self.parameters.iter().map(|p| &p.ty)
    }

    /// Returns true for a generated catch-all overload.
    pub fn is_dynamic_fallback(&self) -> bool {
        self.is_fallback
    }

    /// Returns the overload key as text, e.g. `plus(INT4, INT4)`.
    pub fn specific(&self) -> String {
        let params: Vec<_> = self.parameters.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Display for FnSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<_> = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        write!(f, "{}({}) -> {}", self.name, params.join(", "), self.returns)
    }
}
