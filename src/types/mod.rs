//! Static type system for planning.
//!
//! [`StaticType`] is the closed set of scalar and container kinds the typer
//! assigns to every plan node. Types are immutable values compared
//! structurally; widening always produces a new union.

pub mod groups;
pub mod lattice;

use crate::binding::BindingName;
use smol_str::SmolStr;
use std::fmt;

pub use lattice::{implicit_coercion, is_assignable};

/// A statically inferred type.
///
/// Variants are declared in precedence order: narrower types first, `Dynamic`
/// last. The derived ordering is what normalized unions are sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StaticType {
    /// The SQL NULL value.
    Null,
    /// The absent-value marker.
    Missing,
    Bool,
    Int2,
    Int4,
    Int8,
    /// Arbitrary precision integer.
    Int,
    Decimal,
    Float32,
    Float64,
    Char,
    String,
    Symbol,
    Clob,
    Blob,
    Date,
    Time,
    Timestamp,
    Array(Box<StaticType>),
    Sexp(Box<StaticType>),
    Bag(Box<StaticType>),
    Struct(StructType),
    /// One of several types; always normalized, see [`StaticType::union`].
    Union(Vec<StaticType>),
    /// Statically unknown, resolved at evaluation time.
    Dynamic,
}

impl StaticType {
    /// An array of `element`.
    pub fn array(element: StaticType) -> Self {
        StaticType::Array(Box::new(element))
    }

    /// A bag of `element`.
    pub fn bag(element: StaticType) -> Self {
        StaticType::Bag(Box::new(element))
    }

    /// An s-expression of `element`.
    pub fn sexp(element: StaticType) -> Self {
        StaticType::Sexp(Box::new(element))
    }

    /// Builds a normalized union of `types`.
    ///
    /// Nested unions are flattened, members are sorted and deduplicated,
    /// `Dynamic` absorbs every other member, and a single member collapses to
    /// itself. The empty union is `Missing`.
    pub fn union<I>(types: I) -> StaticType
    where
        I: IntoIterator<Item = StaticType>,
    {
        let mut members = Vec::new();
        for ty in types {
            match ty {
                StaticType::Dynamic => return StaticType::Dynamic,
                StaticType::Union(inner) => members.extend(inner),
                other => members.push(other),
            }
        }
        members.sort();
        members.dedup();
        match members.len() {
            0 => StaticType::Missing,
            1 => members.pop().unwrap_or(StaticType::Missing),
            _ => StaticType::Union(members),
        }
    }

    /// Returns `self ∪ other`.
    pub fn with(&self, other: StaticType) -> StaticType {
        StaticType::union([self.clone(), other])
    }

    /// Returns the members of this type (itself unless it is a union).
    pub fn members(&self) -> &[StaticType] {
        match self {
            StaticType::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    /// Returns true for the catch-all dynamic type.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, StaticType::Dynamic)
    }

    /// Returns true if a value of this type may be NULL.
    pub fn may_be_null(&self) -> bool {
        self.members()
            .iter()
            .any(|t| matches!(t, StaticType::Null | StaticType::Dynamic))
    }

    /// Returns true if a value of this type may be MISSING.
    pub fn may_be_missing(&self) -> bool {
        self.members()
            .iter()
            .any(|t| matches!(t, StaticType::Missing | StaticType::Dynamic))
    }

    /// Returns true if every value of this type is NULL or MISSING.
    ///
    /// This is the type of the NULL and MISSING literals; it never blocks an
    /// overload match.
    pub fn is_absent(&self) -> bool {
        self.members()
            .iter()
            .all(|t| matches!(t, StaticType::Null | StaticType::Missing))
    }

    /// Returns true if every value of this type is MISSING.
    pub fn is_missing_only(&self) -> bool {
        matches!(self, StaticType::Missing)
    }

    /// Returns this type without its NULL and MISSING members.
    ///
    /// Absent-only types are returned unchanged.
    pub fn without_absent(&self) -> StaticType {
        if self.is_absent() {
            return self.clone();
        }
        StaticType::union(
            self.members()
                .iter()
                .filter(|t| !matches!(t, StaticType::Null | StaticType::Missing))
                .cloned(),
        )
    }

    /// Returns the type used to pick an overload for an argument of this type.
    ///
    /// NULL and MISSING members are tracked separately by the typer, so they
    /// are stripped here; a union that still has several members can only be
    /// dispatched at evaluation time.
    pub fn dispatch_type(&self) -> StaticType {
        match self.without_absent() {
            StaticType::Union(_) => StaticType::Dynamic,
            other => other,
        }
    }

    /// Returns true for integer, decimal and float types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            StaticType::Int2
                | StaticType::Int4
                | StaticType::Int8
                | StaticType::Int
                | StaticType::Decimal
                | StaticType::Float32
                | StaticType::Float64
        )
    }

    /// Returns true for integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            StaticType::Int2 | StaticType::Int4 | StaticType::Int8 | StaticType::Int
        )
    }

    /// Returns true for character types.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            StaticType::Char | StaticType::String | StaticType::Symbol | StaticType::Clob
        )
    }

    /// Returns the element type of a collection.
    pub fn element_type(&self) -> Option<&StaticType> {
        match self {
            StaticType::Array(e) | StaticType::Sexp(e) | StaticType::Bag(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if every non-absent member satisfies `pred`, with `Dynamic`
    /// always satisfying it.
    pub fn all_present(&self, pred: impl Fn(&StaticType) -> bool) -> bool {
        self.members().iter().all(|t| {
            t.is_dynamic() || matches!(t, StaticType::Null | StaticType::Missing) || pred(t)
        })
    }

    /// Returns the upper-case display name of this type's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StaticType::Null => "NULL",
            StaticType::Missing => "MISSING",
            StaticType::Bool => "BOOL",
            StaticType::Int2 => "INT2",
            StaticType::Int4 => "INT4",
            StaticType::Int8 => "INT8",
            StaticType::Int => "INT",
            StaticType::Decimal => "DECIMAL",
            StaticType::Float32 => "FLOAT32",
            StaticType::Float64 => "FLOAT64",
            StaticType::Char => "CHAR",
            StaticType::String => "STRING",
            StaticType::Symbol => "SYMBOL",
            StaticType::Clob => "CLOB",
            StaticType::Blob => "BLOB",
            StaticType::Date => "DATE",
            StaticType::Time => "TIME",
            StaticType::Timestamp => "TIMESTAMP",
            StaticType::Array(_) => "ARRAY",
            StaticType::Sexp(_) => "SEXP",
            StaticType::Bag(_) => "BAG",
            StaticType::Struct(_) => "STRUCT",
            StaticType::Union(_) => "UNION",
            StaticType::Dynamic => "ANY",
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::Array(e) | StaticType::Sexp(e) | StaticType::Bag(e) => {
                write!(f, "{}<{}>", self.kind_name(), e)
            }
            StaticType::Struct(s) => write!(f, "{s}"),
            StaticType::Union(members) => {
                let names: Vec<_> = members.iter().map(|t| t.to_string()).collect();
                write!(f, "UNION<{}>", names.join(", "))
            }
            other => write!(f, "{}", other.kind_name()),
        }
    }
}

/// A named, typed struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructField {
    /// Field name as declared.
    pub name: SmolStr,
    /// Field type.
    pub ty: StaticType,
}

impl StructField {
    /// Creates a field.
    pub fn new(name: impl Into<SmolStr>, ty: StaticType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Struct type with ordered fields.
///
/// A closed struct has exactly the declared fields; an open struct may carry
/// more fields than declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructType {
    /// Declared fields, in declaration order.
    pub fields: Vec<StructField>,
    /// Whether undeclared fields are known not to exist.
    pub closed: bool,
}

/// Outcome of looking up a field on a struct type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldLookup<'a> {
    /// The field is declared with this type.
    Found(&'a StaticType),
    /// The struct is closed and has no such field.
    Absent,
    /// The struct is open; the field may or may not exist.
    Unknown,
}

impl StructType {
    /// Creates a closed struct.
    pub fn closed(fields: Vec<StructField>) -> Self {
        Self {
            fields,
            closed: true,
        }
    }

    /// Creates an open struct.
    pub fn open(fields: Vec<StructField>) -> Self {
        Self {
            fields,
            closed: false,
        }
    }

    /// Looks up a field by binding name.
    pub fn field(&self, name: &BindingName) -> FieldLookup<'_> {
        match name.first_match(self.fields.iter().map(|f| f.name.as_str())) {
            Some(idx) => FieldLookup::Found(&self.fields[idx].ty),
            None if self.closed => FieldLookup::Absent,
            None => FieldLookup::Unknown,
        }
    }
}

impl From<StructType> for StaticType {
    fn from(s: StructType) -> Self {
        StaticType::Struct(s)
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<_> = self
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.name, field.ty))
            .collect();
        let open = if self.closed { "" } else { ", ..." };
        write!(f, "STRUCT{{{}{}}}", fields.join(", "), open)
    }
}
