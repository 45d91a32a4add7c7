//! SQL identifiers with case-sensitivity semantics.
//!
//! Unquoted identifiers are case-insensitive and match case-folded; quoted
//! identifiers must match exactly. Every lookup in the planner (scopes, struct
//! fields, catalogs, function names) goes through [`BindingName::matches`].

use smol_str::SmolStr;
use std::fmt;

/// Case-folds an identifier. Every insensitive comparison in the crate
/// folds through here.
pub fn fold_case(name: &str) -> SmolStr {
    SmolStr::new(name.to_lowercase())
}

/// Returns true if `a` and `b` are equal after case folding.
pub fn eq_folded(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Whether a binding name is matched exactly or case-folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingCase {
    /// Quoted identifier, matched exactly.
    Sensitive,
    /// Unquoted identifier, matched case-folded.
    Insensitive,
}

/// An identifier together with its matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingName {
    /// The identifier text as written.
    pub name: SmolStr,
    /// The matching rule.
    pub case: BindingCase,
}

impl BindingName {
    /// Creates a binding name with an explicit matching rule.
    pub fn new(name: impl Into<SmolStr>, case: BindingCase) -> Self {
        Self {
            name: name.into(),
            case,
        }
    }

    /// Creates a quoted (case-sensitive) name.
    pub fn sensitive(name: impl Into<SmolStr>) -> Self {
        Self::new(name, BindingCase::Sensitive)
    }

    /// Creates an unquoted (case-insensitive) name.
    pub fn insensitive(name: impl Into<SmolStr>) -> Self {
        Self::new(name, BindingCase::Insensitive)
    }

    /// Returns true if `candidate` satisfies this name.
    pub fn matches(&self, candidate: &str) -> bool {
        match self.case {
            BindingCase::Sensitive => self.name == candidate,
            BindingCase::Insensitive => eq_folded(&self.name, candidate),
        }
    }

    /// Returns the name normalized for storage in case-folded registries.
    pub fn normalized(&self) -> SmolStr {
        match self.case {
            BindingCase::Sensitive => self.name.clone(),
            BindingCase::Insensitive => fold_case(&self.name),
        }
    }

    /// Returns the index of the first entry in `candidates` matched by this name.
    ///
    /// Insensitive lookups that match several entries resolve to the first
    /// declared one rather than failing.
    pub fn first_match<'a, I>(&self, candidates: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates.into_iter().position(|c| self.matches(c))
    }
}

impl fmt::Display for BindingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.case {
            BindingCase::Sensitive => write!(f, "\"{}\"", self.name),
            BindingCase::Insensitive => write!(f, "{}", self.name),
        }
    }
}

/// A dotted sequence of binding names, e.g. `catalog.schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BindingPath {
    /// The path steps, outermost first.
    pub steps: Vec<BindingName>,
}

impl BindingPath {
    /// Creates a path from its steps.
    pub fn new(steps: Vec<BindingName>) -> Self {
        Self { steps }
    }

    /// Creates a path of case-insensitive steps.
    pub fn insensitive<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self::new(steps.into_iter().map(BindingName::insensitive).collect())
    }

    /// Creates a path of case-sensitive steps.
    pub fn sensitive<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self::new(steps.into_iter().map(BindingName::sensitive).collect())
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the path has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns a new path with `prefix` prepended as case-sensitive steps.
    pub fn prefixed<'a, I>(&self, prefix: I) -> Self
    where
        I: IntoIterator<Item = &'a SmolStr>,
    {
        let mut steps: Vec<BindingName> = prefix
            .into_iter()
            .map(|s| BindingName::sensitive(s.clone()))
            .collect();
        steps.extend(self.steps.iter().cloned());
        Self::new(steps)
    }

    /// Returns the path without its first `n` steps.
    pub fn skip(&self, n: usize) -> Self {
        Self::new(self.steps.iter().skip(n).cloned().collect())
    }
}

impl fmt::Display for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl From<BindingName> for BindingPath {
    fn from(name: BindingName) -> Self {
        Self::new(vec![name])
    }
}
