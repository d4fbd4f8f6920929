//! Safe type widenings
//!
//! A change is a widening when every value the source type can hold is also
//! representable in the target type. Everything else that differs after
//! normalization is a plain type change.

use crate::normalize::NormalizedType;

/// Character-like storage domains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    Char,
    NationalChar,
    Binary,
}

/// Storage class within a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Fixed,
    Varying,
    /// Unbounded large-object types, ranked by capacity
    Large(u8),
}

fn string_kind(base: &str) -> Option<(Domain, Class)> {
    let kind = match base {
        "CHAR" => (Domain::Char, Class::Fixed),
        "VARCHAR" => (Domain::Char, Class::Varying),
        "TINYTEXT" => (Domain::Char, Class::Large(0)),
        "TEXT" => (Domain::Char, Class::Large(1)),
        "MEDIUMTEXT" => (Domain::Char, Class::Large(2)),
        "LONGTEXT" => (Domain::Char, Class::Large(3)),
        "NCHAR" => (Domain::NationalChar, Class::Fixed),
        "NVARCHAR" => (Domain::NationalChar, Class::Varying),
        "NTEXT" => (Domain::NationalChar, Class::Large(1)),
        "BINARY" => (Domain::Binary, Class::Fixed),
        "VARBINARY" => (Domain::Binary, Class::Varying),
        "TINYBLOB" => (Domain::Binary, Class::Large(0)),
        "BLOB" => (Domain::Binary, Class::Large(1)),
        "MEDIUMBLOB" => (Domain::Binary, Class::Large(2)),
        "LONGBLOB" => (Domain::Binary, Class::Large(3)),
        _ => return None,
    };
    Some(kind)
}

/// Integer ladder rank and the decimal digits needed to hold its range
fn integer_rank(base: &str) -> Option<(u8, u64)> {
    match base {
        "TINYINT" => Some((1, 3)),
        "SMALLINT" => Some((2, 5)),
        "MEDIUMINT" => Some((3, 8)),
        "INTEGER" => Some((4, 10)),
        "BIGINT" => Some((5, 19)),
        _ => None,
    }
}

fn float_rank(base: &str) -> Option<u8> {
    match base {
        "REAL" | "FLOAT" => Some(1),
        "DOUBLE" => Some(2),
        _ => None,
    }
}

fn temporal_rank(base: &str) -> Option<u8> {
    match base {
        "DATE" => Some(0),
        "TIMESTAMP" | "DATETIME" => Some(1),
        _ => None,
    }
}

/// Whether `target` can hold every value of `source`
///
/// Returns false for identical types; callers only ask about types that
/// already differ.
pub fn is_widening(source: &NormalizedType, target: &NormalizedType) -> bool {
    if source == target || source.array_depth() != target.array_depth() {
        return false;
    }

    if source.array_depth() > 0 {
        return is_widening(&source.element(), &target.element());
    }

    // signed to unsigned loses negative values
    if target.is_unsigned() && !source.is_unsigned() {
        return false;
    }

    let (s, t) = (source.base(), target.base());

    if let (Some(sk), Some(tk)) = (string_kind(s), string_kind(t)) {
        return string_widening(sk, source, tk, target);
    }

    if let (Some((sr, _)), Some((tr, _))) = (integer_rank(s), integer_rank(t)) {
        return tr > sr;
    }

    if let (Some((_, digits)), "DECIMAL") = (integer_rank(s), t) {
        let digits = if source.is_unsigned() && s == "BIGINT" { 20 } else { digits };
        return match decimal_shape(target) {
            Some(Some((precision, scale))) => precision.saturating_sub(scale) >= digits,
            Some(None) => true,
            None => false,
        };
    }

    if s == "DECIMAL" && t == "DECIMAL" {
        return match (decimal_shape(source), decimal_shape(target)) {
            (Some(Some((sp, ss))), Some(Some((tp, ts)))) => {
                ts >= ss && tp.saturating_sub(ts) >= sp.saturating_sub(ss)
            }
            (Some(_), Some(None)) => true,
            _ => false,
        };
    }

    if let (Some(sr), Some(tr)) = (float_rank(s), float_rank(t)) {
        return tr > sr && source.params().is_none() && target.params().is_none();
    }

    if s == t && matches!(s, "TIME" | "TIMETZ" | "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME") {
        return length_fits(single_param(source), single_param(target));
    }

    if let (Some(0), Some(1)) = (temporal_rank(s), temporal_rank(t)) {
        return true;
    }

    false
}

fn string_widening(
    (source_domain, source_class): (Domain, Class),
    source: &NormalizedType,
    (target_domain, target_class): (Domain, Class),
    target: &NormalizedType,
) -> bool {
    let domain_ok = match (source_domain, target_domain) {
        (a, b) if a == b => true,
        (Domain::Char, Domain::NationalChar) => true,
        _ => false,
    };
    if !domain_ok {
        return false;
    }

    match (source_class, target_class) {
        (Class::Fixed | Class::Varying, Class::Large(_)) => true,
        (Class::Large(a), Class::Large(b)) => b > a || (b == a && source_domain != target_domain),
        (Class::Large(_), _) => false,
        (Class::Varying, Class::Fixed) => false,
        (Class::Fixed, Class::Fixed) => length_fits(
            single_param(source).or(Some(Some(1))),
            single_param(target).or(Some(Some(1))),
        ),
        (Class::Fixed, Class::Varying) => {
            length_fits(single_param(source).or(Some(Some(1))), single_param(target))
        }
        (Class::Varying, Class::Varying) => length_fits(single_param(source), single_param(target)),
    }
}

/// Single numeric parameter
///
/// `None` means the parameter is absent, `Some(None)` that it is present but
/// not a single number.
fn single_param(ty: &NormalizedType) -> Option<Option<u64>> {
    ty.params()?;
    Some(match ty.numeric_params().as_deref() {
        Some([n]) => Some(*n),
        _ => None,
    })
}

fn length_fits(source: Option<Option<u64>>, target: Option<Option<u64>>) -> bool {
    match (source, target) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(Some(s)), Some(Some(t))) => t >= s,
        _ => false,
    }
}

/// `(precision, scale)` of a decimal
///
/// `Some(None)` is an unconstrained decimal, `None` an unparseable one.
fn decimal_shape(ty: &NormalizedType) -> Option<Option<(u64, u64)>> {
    if ty.params().is_none() {
        return Some(None);
    }
    match ty.numeric_params()?.as_slice() {
        [precision] => Some(Some((*precision, 0))),
        [precision, scale] => Some(Some((*precision, *scale))),
        _ => None,
    }
}
