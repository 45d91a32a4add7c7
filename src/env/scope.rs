//! Lexical scopes.

use crate::binding::{BindingName, eq_folded};
use crate::plan::Binding;
use crate::types::{FieldLookup, StaticType};
use smol_str::SmolStr;

/// Kind of scope boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Variables bound by FROM sources (and UPDATE/DELETE targets).
    From,
    /// Variables bound by LET.
    Let,
    /// Group keys and the GROUP AS variable, replacing the FROM scope.
    Group,
}

/// One level of the scope stack: an ordered list of bindings.
///
/// Offsets into the list match the columns of the relation the scope was
/// built from, so duplicates are kept; lookups see the first one.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    bindings: Vec<Binding>,
}

impl Scope {
    /// Creates a scope from its bindings.
    pub fn new(kind: ScopeKind, bindings: Vec<Binding>) -> Self {
        Self { kind, bindings }
    }

    /// Returns the bindings in declaration order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Returns the offset of the binding matching `name`.
    pub fn lookup(&self, name: &BindingName) -> Option<usize> {
        name.first_match(self.bindings.iter().map(|b| b.name.as_str()))
    }

    /// Finds `name` as a field of a binding whose type is a closed struct.
    ///
    /// Returns the binding offset and the field's declared name and type.
    pub fn lookup_field(&self, name: &BindingName) -> Option<(usize, SmolStr, StaticType)> {
        self.bindings.iter().enumerate().find_map(|(offset, binding)| {
            let StaticType::Struct(row) = &binding.ty else {
                return None;
            };
            if !row.closed {
                return None;
            }
            match row.field(name) {
                FieldLookup::Found(ty) => {
                    let declared = row
                        .fields
                        .iter()
                        .find(|f| name.matches(&f.name))
                        .map(|f| f.name.clone())
                        .unwrap_or_else(|| name.name.clone());
                    Some((offset, declared, ty.clone()))
                }
                FieldLookup::Absent | FieldLookup::Unknown => None,
            }
        })
    }

    /// Returns names bound more than once, compared case-insensitively.
    pub fn duplicates(&self) -> Vec<SmolStr> {
        let mut duplicates: Vec<SmolStr> = Vec::new();
        for (idx, binding) in self.bindings.iter().enumerate() {
            let repeated = self.bindings[..idx]
                .iter()
                .any(|earlier| eq_folded(&earlier.name, &binding.name));
            if repeated && !duplicates.iter().any(|d| eq_folded(d, &binding.name)) {
                duplicates.push(binding.name.clone());
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StructField, StructType};

    fn row() -> StaticType {
        StaticType::Struct(StructType::closed(vec![
            StructField::new("id", StaticType::Int4),
            StructField::new("Name", StaticType::String),
        ]))
    }

    #[test]
    fn lookup_first_declared() {
        let scope = Scope::new(
            ScopeKind::From,
            vec![
                Binding::new("a", StaticType::Int4),
                Binding::new("A", StaticType::String),
            ],
        );
        assert_eq!(scope.lookup(&BindingName::insensitive("a")), Some(0));
        assert_eq!(scope.lookup(&BindingName::sensitive("A")), Some(1));
        assert_eq!(scope.duplicates(), vec![SmolStr::new("A")]);
    }

    #[test]
    fn duplicates_fold_non_ascii_names() {
        let scope = Scope::new(
            ScopeKind::From,
            vec![
                Binding::new("äb", StaticType::Int4),
                Binding::new("ÄB", StaticType::String),
            ],
        );
        assert_eq!(scope.lookup(&BindingName::insensitive("Äb")), Some(0));
        assert_eq!(scope.duplicates(), vec![SmolStr::new("ÄB")]);
    }

    #[test]
    fn implicit_field_of_closed_struct() {
        let scope = Scope::new(ScopeKind::From, vec![Binding::new("t", row())]);
        let (offset, name, ty) = scope.lookup_field(&BindingName::insensitive("name")).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(name, "Name");
        assert_eq!(ty, StaticType::String);
        assert!(scope.lookup_field(&BindingName::insensitive("missing")).is_none());
    }

    #[test]
    fn open_struct_fields_are_not_implicit() {
        let open = StaticType::Struct(StructType::open(vec![StructField::new(
            "id",
            StaticType::Int4,
        )]));
        let scope = Scope::new(ScopeKind::From, vec![Binding::new("t", open)]);
        assert!(scope.lookup_field(&BindingName::insensitive("id")).is_none());
    }
}
