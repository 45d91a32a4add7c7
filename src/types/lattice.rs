//! Subtyping and implicit coercion between static types.

use super::StaticType;

/// Returns the precedence rank of a type.
///
/// Lower ranks are narrower types. Overload resolution uses this as the
/// deterministic tie-break between equally good candidates.
pub fn precedence(ty: &StaticType) -> u8 {
    match ty {
        StaticType::Null => 0,
        StaticType::Missing => 1,
        StaticType::Bool => 2,
        StaticType::Int2 => 3,
        StaticType::Int4 => 4,
        StaticType::Int8 => 5,
        StaticType::Int => 6,
        StaticType::Decimal => 7,
        StaticType::Float32 => 8,
        StaticType::Float64 => 9,
        StaticType::Char => 10,
        StaticType::String => 11,
        StaticType::Symbol => 12,
        StaticType::Clob => 13,
        StaticType::Blob => 14,
        StaticType::Date => 15,
        StaticType::Time => 16,
        StaticType::Timestamp => 17,
        StaticType::Array(_) => 18,
        StaticType::Sexp(_) => 19,
        StaticType::Bag(_) => 20,
        StaticType::Struct(_) => 21,
        StaticType::Union(_) => 22,
        StaticType::Dynamic => 23,
    }
}

/// Returns true if a value of type `arg` can be passed where `param` is
/// declared without any conversion.
pub fn is_assignable(arg: &StaticType, param: &StaticType) -> bool {
    if param.is_dynamic() || arg == param {
        return true;
    }
    match (arg, param) {
        (StaticType::Union(members), _) => members
            .iter()
            .all(|m| m.is_absent() || is_assignable(m, param)),
        (StaticType::Array(a), StaticType::Array(p))
        | (StaticType::Sexp(a), StaticType::Sexp(p))
        | (StaticType::Bag(a), StaticType::Bag(p)) => is_assignable(a, p),
        // An open struct with no declared fields stands for "any struct".
        (StaticType::Struct(_), StaticType::Struct(p)) => !p.closed && p.fields.is_empty(),
        _ => false,
    }
}

/// Returns the coercion target if `arg` implicitly coerces to `param`.
///
/// Coercions only ever widen: integers to wider integers, decimals and
/// doubles; fixed characters and symbols to strings; dates to timestamps.
/// Containers coerce when their element types do.
pub fn implicit_coercion(arg: &StaticType, param: &StaticType) -> Option<StaticType> {
    if arg.is_absent() {
        return Some(param.clone());
    }
    let allowed = match arg {
        StaticType::Int2 => matches!(
            param,
            StaticType::Int4
                | StaticType::Int8
                | StaticType::Int
                | StaticType::Decimal
                | StaticType::Float32
                | StaticType::Float64
        ),
        StaticType::Int4 => matches!(
            param,
            StaticType::Int8 | StaticType::Int | StaticType::Decimal | StaticType::Float64
        ),
        StaticType::Int8 => matches!(
            param,
            StaticType::Int | StaticType::Decimal | StaticType::Float64
        ),
        StaticType::Int => matches!(param, StaticType::Decimal | StaticType::Float64),
        StaticType::Decimal => matches!(param, StaticType::Float64),
        StaticType::Float32 => matches!(param, StaticType::Float64),
        StaticType::Char | StaticType::Symbol => {
            matches!(param, StaticType::String | StaticType::Clob)
        }
        StaticType::String => matches!(param, StaticType::Clob),
        StaticType::Date => matches!(param, StaticType::Timestamp),
        StaticType::Array(a) => match param {
            StaticType::Array(p) => element_coerces(a, p),
            _ => false,
        },
        StaticType::Sexp(a) => match param {
            StaticType::Sexp(p) => element_coerces(a, p),
            _ => false,
        },
        StaticType::Bag(a) => match param {
            StaticType::Bag(p) => element_coerces(a, p),
            _ => false,
        },
        _ => false,
    };
    allowed.then(|| param.clone())
}

fn element_coerces(arg: &StaticType, param: &StaticType) -> bool {
    is_assignable(arg, param) || implicit_coercion(arg, param).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StructField, StructType};

    #[test]
    fn integers_widen() {
        assert_eq!(
            implicit_coercion(&StaticType::Int2, &StaticType::Int4),
            Some(StaticType::Int4)
        );
        assert_eq!(
            implicit_coercion(&StaticType::Int4, &StaticType::Decimal),
            Some(StaticType::Decimal)
        );
        assert_eq!(implicit_coercion(&StaticType::Int8, &StaticType::Int4), None);
        assert_eq!(implicit_coercion(&StaticType::Float64, &StaticType::Decimal), None);
    }

    #[test]
    fn text_and_time_coercions() {
        assert!(implicit_coercion(&StaticType::Symbol, &StaticType::String).is_some());
        assert!(implicit_coercion(&StaticType::String, &StaticType::Symbol).is_none());
        assert!(implicit_coercion(&StaticType::Date, &StaticType::Timestamp).is_some());
        assert!(implicit_coercion(&StaticType::String, &StaticType::Int4).is_none());
    }

    #[test]
    fn absent_coerces_to_anything() {
        assert_eq!(
            implicit_coercion(&StaticType::Null, &StaticType::Bool),
            Some(StaticType::Bool)
        );
    }

    #[test]
    fn containers_coerce_by_element() {
        let have = StaticType::array(StaticType::Int4);
        let want = StaticType::array(StaticType::Int8);
        assert_eq!(implicit_coercion(&have, &want), Some(want.clone()));
        assert!(implicit_coercion(&have, &StaticType::bag(StaticType::Int8)).is_none());
    }

    #[test]
    fn assignability() {
        assert!(is_assignable(&StaticType::Int4, &StaticType::Dynamic));
        assert!(is_assignable(
            &StaticType::array(StaticType::Int4),
            &StaticType::array(StaticType::Dynamic)
        ));
        assert!(!is_assignable(&StaticType::Int4, &StaticType::Int8));

        let any_struct = StaticType::Struct(StructType::open(vec![]));
        let row = StaticType::Struct(StructType::closed(vec![StructField::new(
            "a",
            StaticType::Int4,
        )]));
        assert!(is_assignable(&row, &any_struct));
        assert!(!is_assignable(&any_struct, &row));
    }

    #[test]
    fn precedence_is_total_over_kinds() {
        assert!(precedence(&StaticType::Int4) < precedence(&StaticType::Int8));
        assert!(precedence(&StaticType::Decimal) < precedence(&StaticType::Float64));
        let open = StaticType::Struct(StructType::open(vec![]));
        assert!(precedence(&open) < precedence(&StaticType::Dynamic));
    }
}
