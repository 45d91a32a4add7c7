//! Type groups used to declare polymorphic function signatures.
//!
//! A declaration over a group expands to one signature per member type plus a
//! `Dynamic` fallback.

use super::{StaticType, StructType};

/// Numeric types, narrowest first.
pub const NUMERIC: [StaticType; 7] = [
    StaticType::Int2,
    StaticType::Int4,
    StaticType::Int8,
    StaticType::Int,
    StaticType::Decimal,
    StaticType::Float32,
    StaticType::Float64,
];

/// Integer types, narrowest first.
pub const INTEGER: [StaticType; 4] = [
    StaticType::Int2,
    StaticType::Int4,
    StaticType::Int8,
    StaticType::Int,
];

/// Character types.
pub const TEXT: [StaticType; 4] = [
    StaticType::Char,
    StaticType::String,
    StaticType::Symbol,
    StaticType::Clob,
];

/// Date and time types.
pub const DATETIME: [StaticType; 3] = [StaticType::Date, StaticType::Time, StaticType::Timestamp];

/// Returns the collection types with a dynamic element type.
pub fn collections() -> [StaticType; 3] {
    [
        StaticType::array(StaticType::Dynamic),
        StaticType::sexp(StaticType::Dynamic),
        StaticType::bag(StaticType::Dynamic),
    ]
}

/// Returns the "any struct" type.
pub fn any_struct() -> StaticType {
    StaticType::Struct(StructType::open(vec![]))
}

/// Returns every type that supports ordering comparisons.
pub fn comparable() -> Vec<StaticType> {
    let mut types = vec![StaticType::Bool];
    types.extend(NUMERIC);
    types.extend(TEXT);
    types.push(StaticType::Blob);
    types.extend(DATETIME);
    types
}
