//! Dialect-aware type normalization
//!
//! Maps a raw type spelling to a canonical token so that `CHARACTER
//! VARYING(255)` and `VARCHAR(255)`, or `SERIAL` and `INT AUTO_INCREMENT`,
//! compare equal. Normalization never fails: spellings it does not know pass
//! through uppercased, and the comparison degrades to a literal one.

use sqlmeta_core::{Column, Dialect};
use std::fmt;

/// Canonical token for auto-incrementing integer key sugar in any dialect
pub const IDENTITY_INTEGER: &str = "IDENTITY_INTEGER";

/// ANSI synonyms shared by every dialect
const COMMON_ALIASES: &[(&str, &str)] = &[
    ("CHARACTER VARYING", "VARCHAR"),
    ("CHAR VARYING", "VARCHAR"),
    ("CHARACTER", "CHAR"),
    ("NATIONAL CHARACTER VARYING", "NVARCHAR"),
    ("NATIONAL CHAR VARYING", "NVARCHAR"),
    ("NCHAR VARYING", "NVARCHAR"),
    ("NATIONAL CHARACTER", "NCHAR"),
    ("NATIONAL CHAR", "NCHAR"),
    ("CHARACTER LARGE OBJECT", "TEXT"),
    ("CLOB", "TEXT"),
    ("BINARY LARGE OBJECT", "BLOB"),
    ("INT", "INTEGER"),
    ("BOOL", "BOOLEAN"),
    ("DEC", "DECIMAL"),
    ("NUMERIC", "DECIMAL"),
    ("DOUBLE PRECISION", "DOUBLE"),
    ("TIMESTAMP WITHOUT TIME ZONE", "TIMESTAMP"),
    ("TIMESTAMP WITH TIME ZONE", "TIMESTAMPTZ"),
    ("TIME WITHOUT TIME ZONE", "TIME"),
    ("TIME WITH TIME ZONE", "TIMETZ"),
];

const POSTGRES_ALIASES: &[(&str, &str)] = &[
    ("INT2", "SMALLINT"),
    ("INT4", "INTEGER"),
    ("INT8", "BIGINT"),
    ("FLOAT4", "REAL"),
    ("FLOAT8", "DOUBLE"),
    ("FLOAT", "DOUBLE"),
    ("BPCHAR", "CHAR"),
    ("VARBIT", "BIT VARYING"),
    ("BYTEA", "BLOB"),
];

const MYSQL_ALIASES: &[(&str, &str)] = &[
    ("INT1", "TINYINT"),
    ("INT2", "SMALLINT"),
    ("INT3", "MEDIUMINT"),
    ("MIDDLEINT", "MEDIUMINT"),
    ("INT4", "INTEGER"),
    ("INT8", "BIGINT"),
    ("FIXED", "DECIMAL"),
    ("REAL", "DOUBLE"),
    ("FLOAT4", "FLOAT"),
    ("FLOAT8", "DOUBLE"),
    ("LONG VARCHAR", "MEDIUMTEXT"),
    ("LONG", "MEDIUMTEXT"),
];

const ORACLE_ALIASES: &[(&str, &str)] = &[
    ("VARCHAR2", "VARCHAR"),
    ("NVARCHAR2", "NVARCHAR"),
    ("NUMBER", "DECIMAL"),
    ("BINARY_FLOAT", "REAL"),
    ("BINARY_DOUBLE", "DOUBLE"),
    ("NCLOB", "NTEXT"),
    ("RAW", "VARBINARY"),
    ("LONG RAW", "BLOB"),
];

const MSSQL_ALIASES: &[(&str, &str)] = &[
    ("BIT", "BOOLEAN"),
    ("DATETIME2", "DATETIME"),
    ("SMALLDATETIME", "DATETIME"),
    ("DATETIMEOFFSET", "TIMESTAMPTZ"),
    ("FLOAT", "DOUBLE"),
    ("UNIQUEIDENTIFIER", "UUID"),
    ("IMAGE", "BLOB"),
];

/// Serial pseudo-types; the spelling alone implies an identity column
const SERIAL_TYPES: &[&str] = &[
    "SERIAL",
    "SERIAL2",
    "SERIAL4",
    "SERIAL8",
    "SMALLSERIAL",
    "BIGSERIAL",
    IDENTITY_INTEGER,
];

/// Words that turn any integer spelling into an identity column
const IDENTITY_MARKERS: &[&str] = &["AUTO_INCREMENT", "AUTOINCREMENT", "IDENTITY"];

/// MySQL integer types whose parameter is a display width, not a size
const MYSQL_INTEGER_TYPES: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "INTEGER", "BIGINT"];

/// Trailing words MySQL accepts after a numeric type
const NUMERIC_MODIFIERS: &[&str] = &["UNSIGNED", "SIGNED", "ZEROFILL"];

/// Canonical bases the normalizer understands; anything else is compared literally
const KNOWN_BASES: &[&str] = &[
    "VARCHAR", "CHAR", "NVARCHAR", "NCHAR", "TEXT", "NTEXT", "TINYTEXT", "MEDIUMTEXT",
    "LONGTEXT", "TINYINT", "SMALLINT", "MEDIUMINT", "INTEGER", "BIGINT", "DECIMAL", "REAL",
    "FLOAT", "DOUBLE", "BOOLEAN", "DATE", "TIME", "TIMETZ", "TIMESTAMP", "TIMESTAMPTZ",
    "DATETIME", "INTERVAL", "JSON", "JSONB", "UUID", "BLOB", "VARBINARY", "BINARY", "BIT",
    "BIT VARYING", "XML", "MONEY", "YEAR", "ENUM", "SET",
];

/// Canonical type token
///
/// Two columns have the "same type" exactly when their normalized types are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedType {
    base: String,
    params: Option<String>,
    unsigned: bool,
    array_depth: usize,
}

impl NormalizedType {
    /// Canonical base name, e.g. `VARCHAR`
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Parameter list without parentheses or whitespace, e.g. `10,2`
    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    /// Number of `[]` suffixes
    pub fn array_depth(&self) -> usize {
        self.array_depth
    }

    /// MySQL `UNSIGNED` numeric type
    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn is_identity(&self) -> bool {
        self.base == IDENTITY_INTEGER && self.array_depth == 0
    }

    /// Numeric parameters; `None` when absent or not all numeric
    pub fn numeric_params(&self) -> Option<Vec<u64>> {
        self.params
            .as_deref()?
            .split(',')
            .map(|p| p.parse::<u64>().ok())
            .collect()
    }

    /// Element type of an array type
    pub fn element(&self) -> NormalizedType {
        NormalizedType {
            base: self.base.clone(),
            params: self.params.clone(),
            unsigned: self.unsigned,
            array_depth: 0,
        }
    }
}

impl fmt::Display for NormalizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(params) = &self.params {
            write!(f, "({})", params)?;
        }
        if self.unsigned {
            write!(f, " UNSIGNED")?;
        }
        for _ in 0..self.array_depth {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// Dialect-aware type normalizer
///
/// Built-in alias tables can be extended with per-dialect custom aliases
/// (e.g. extension types such as `CITEXT`). Custom aliases are consulted
/// first.
#[derive(Debug, Clone, Default)]
pub struct TypeNormalizer {
    custom_aliases: Vec<(Dialect, String, String)>,
}

impl TypeNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extra alias; `Dialect::Generic` applies it to every dialect
    pub fn with_alias(
        mut self,
        dialect: Dialect,
        alias: impl AsRef<str>,
        canonical: impl AsRef<str>,
    ) -> Self {
        self.custom_aliases.push((
            dialect,
            clean(alias.as_ref()),
            clean(canonical.as_ref()),
        ));
        self
    }

    /// Normalize a raw type spelling under a dialect
    pub fn normalize(&self, dialect: Dialect, raw_type: &str) -> NormalizedType {
        let cleaned = clean(raw_type);

        let mut body = cleaned.as_str();
        let mut array_depth = 0;
        while let Some(element) = body.strip_suffix("[]") {
            body = element.trim_end();
            array_depth += 1;
        }

        if is_identity_spelling(body) {
            return NormalizedType {
                base: IDENTITY_INTEGER.to_string(),
                params: None,
                unsigned: false,
                array_depth,
            };
        }

        let (name, params) = split_params(body);
        let (head, unsigned) = split_modifiers(&name);
        let base = self.resolve_alias(dialect, head.to_string());
        let (base, params) = apply_dialect_rules(dialect, base, params, unsigned);

        if !KNOWN_BASES.contains(&base.as_str()) {
            tracing::trace!(
                %dialect,
                raw_type,
                base = %base,
                "unrecognized type, comparing literally"
            );
        }

        NormalizedType {
            base,
            params,
            unsigned,
            array_depth,
        }
    }

    /// Normalize a column's type, honoring its identity flag
    pub fn normalize_column(&self, dialect: Dialect, column: &Column) -> NormalizedType {
        let normalized = self.normalize(dialect, &column.data_type);
        if column.identity && normalized.array_depth == 0 {
            return NormalizedType {
                base: IDENTITY_INTEGER.to_string(),
                params: None,
                unsigned: false,
                array_depth: 0,
            };
        }
        normalized
    }

    /// Follow alias chains to a fixed point
    fn resolve_alias(&self, dialect: Dialect, name: String) -> String {
        let mut current = name;
        // alias chains are short; the bound only guards against cycles
        for _ in 0..8 {
            match self.lookup(dialect, &current) {
                Some(next) if next != current => current = next.to_string(),
                _ => break,
            }
        }
        current
    }

    fn lookup(&self, dialect: Dialect, name: &str) -> Option<&str> {
        let custom = self
            .custom_aliases
            .iter()
            .find(|(d, alias, _)| (*d == dialect || *d == Dialect::Generic) && alias == name)
            .map(|(_, _, canonical)| canonical.as_str());
        if custom.is_some() {
            return custom;
        }

        alias_tables(dialect)
            .iter()
            .flat_map(|table| table.iter())
            .find(|(alias, _)| *alias == name)
            .map(|(_, canonical)| *canonical)
    }
}

/// Alias tables for a dialect, in precedence order
///
/// `Generic` is the union of all of them; earlier tables win on conflicts.
fn alias_tables(dialect: Dialect) -> &'static [&'static [(&'static str, &'static str)]] {
    match dialect {
        Dialect::Postgresql => &[POSTGRES_ALIASES, COMMON_ALIASES],
        Dialect::Mysql => &[MYSQL_ALIASES, COMMON_ALIASES],
        Dialect::Oracle => &[ORACLE_ALIASES, COMMON_ALIASES],
        Dialect::Mssql => &[MSSQL_ALIASES, COMMON_ALIASES],
        Dialect::Generic => &[
            COMMON_ALIASES,
            POSTGRES_ALIASES,
            MYSQL_ALIASES,
            ORACLE_ALIASES,
            MSSQL_ALIASES,
        ],
    }
}

/// Uppercase, trim and collapse interior whitespace
fn clean(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn is_identity_spelling(body: &str) -> bool {
    let mut words = body
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == ',')
        .filter(|w| !w.is_empty());

    match words.next() {
        Some(first) if SERIAL_TYPES.contains(&first) => true,
        Some(_) => words.any(|w| IDENTITY_MARKERS.contains(&w)),
        None => false,
    }
}

/// Split `NAME(params) TRAILING WORDS` into (`NAME TRAILING WORDS`, params)
fn split_params(body: &str) -> (String, Option<String>) {
    let Some(open) = body.find('(') else {
        return (body.trim().to_string(), None);
    };
    let Some(close) = body[open..].find(')').map(|i| open + i) else {
        // unbalanced; keep the literal spelling
        return (body.trim().to_string(), None);
    };

    let params: String = body[open + 1..close]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let head = body[..open].trim();
    let tail = body[close + 1..].trim();

    let name = if tail.is_empty() {
        head.to_string()
    } else {
        format!("{} {}", head, tail)
    };

    (name, (!params.is_empty()).then_some(params))
}

/// Split trailing numeric modifiers off a type name
///
/// `SIGNED` is the default and dropped; `ZEROFILL` only affects display but
/// implies `UNSIGNED`.
fn split_modifiers(name: &str) -> (&str, bool) {
    let mut head = name;
    let mut unsigned = false;
    while let Some((rest, last)) = head.rsplit_once(' ') {
        if !NUMERIC_MODIFIERS.contains(&last) {
            break;
        }
        unsigned |= last != "SIGNED";
        head = rest.trim_end();
    }
    (head, unsigned)
}

/// Rules that look at parameters as well as the base name
fn apply_dialect_rules(
    dialect: Dialect,
    base: String,
    params: Option<String>,
    unsigned: bool,
) -> (String, Option<String>) {
    let mysql = matches!(dialect, Dialect::Mysql | Dialect::Generic);
    let mssql = matches!(dialect, Dialect::Mssql | Dialect::Generic);

    if mysql && !unsigned && base == "TINYINT" && params.as_deref() == Some("1") {
        return ("BOOLEAN".to_string(), None);
    }

    if base == "DECIMAL" {
        let params = match (params, dialect) {
            (Some(p), _) if p.parse::<u64>().is_ok() => Some(format!("{},0", p)),
            (None, Dialect::Mysql) => Some("10,0".to_string()),
            (None, Dialect::Mssql) => Some("18,0".to_string()),
            (params, _) => params,
        };
        return (base, params);
    }

    if mysql && MYSQL_INTEGER_TYPES.contains(&base.as_str()) {
        return (base, None);
    }

    if mssql && params.as_deref() == Some("MAX") {
        let unbounded = match base.as_str() {
            "VARCHAR" => Some("TEXT"),
            "NVARCHAR" => Some("NTEXT"),
            "VARBINARY" => Some("BLOB"),
            _ => None,
        };
        if let Some(unbounded) = unbounded {
            return (unbounded.to_string(), None);
        }
    }

    if base == "BOOLEAN" {
        return (base, None);
    }

    (base, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(dialect: Dialect, raw: &str) -> String {
        TypeNormalizer::new().normalize(dialect, raw).to_string()
    }

    #[test]
    fn ansi_synonyms() {
        assert_eq!(
            norm(Dialect::Postgresql, "VARCHAR(255)"),
            norm(Dialect::Postgresql, "CHARACTER VARYING(255)")
        );
        assert_eq!(norm(Dialect::Postgresql, "character  varying (255)"), "VARCHAR(255)");
        assert_eq!(norm(Dialect::Mysql, "INT"), norm(Dialect::Postgresql, "INTEGER"));
        assert_eq!(norm(Dialect::Postgresql, "bool"), "BOOLEAN");
        assert_eq!(norm(Dialect::Oracle, "NUMERIC(10, 2)"), "DECIMAL(10,2)");
    }

    #[test]
    fn mysql_tinyint_one_is_boolean() {
        assert_eq!(norm(Dialect::Mysql, "TINYINT(1)"), norm(Dialect::Mysql, "BOOLEAN"));
        assert_eq!(norm(Dialect::Mysql, "tinyint(4)"), "TINYINT");
        assert_eq!(norm(Dialect::Postgresql, "TINYINT(1)"), "TINYINT(1)");
    }

    #[test]
    fn mysql_display_width_is_ignored() {
        assert_eq!(norm(Dialect::Mysql, "INT(11)"), "INTEGER");
        assert_eq!(norm(Dialect::Mysql, "BIGINT(20)"), "BIGINT");
    }

    #[test]
    fn mysql_sign_modifiers() {
        assert_eq!(norm(Dialect::Mysql, "INT(11) UNSIGNED"), norm(Dialect::Mysql, "int unsigned"));
        assert_eq!(norm(Dialect::Mysql, "INT(11) UNSIGNED"), "INTEGER UNSIGNED");
        assert_eq!(norm(Dialect::Mysql, "bigint(20) unsigned zerofill"), "BIGINT UNSIGNED");
        assert_eq!(norm(Dialect::Mysql, "INT(10) SIGNED"), "INTEGER");
        assert_eq!(norm(Dialect::Mysql, "TINYINT(1) UNSIGNED"), "TINYINT UNSIGNED");
        assert_eq!(norm(Dialect::Mysql, "DECIMAL(10,2) UNSIGNED"), "DECIMAL(10,2) UNSIGNED");

        let normalized = TypeNormalizer::new().normalize(Dialect::Mysql, "MEDIUMINT(8) UNSIGNED");
        assert_eq!(normalized.base(), "MEDIUMINT");
        assert!(normalized.is_unsigned());
    }

    #[test]
    fn decimal_scale_and_dialect_defaults() {
        assert_eq!(norm(Dialect::Postgresql, "NUMERIC(10)"), "DECIMAL(10,0)");
        assert_eq!(norm(Dialect::Oracle, "NUMBER(10)"), norm(Dialect::Mysql, "DECIMAL(10,0)"));
        assert_eq!(norm(Dialect::Mysql, "DECIMAL"), "DECIMAL(10,0)");
        assert_eq!(norm(Dialect::Mssql, "NUMERIC"), "DECIMAL(18,0)");
        assert_eq!(norm(Dialect::Postgresql, "NUMERIC"), "DECIMAL");
        assert_eq!(norm(Dialect::Generic, "DECIMAL"), "DECIMAL");
    }

    #[test]
    fn identity_spellings_collapse() {
        for (dialect, raw) in [
            (Dialect::Postgresql, "SERIAL"),
            (Dialect::Postgresql, "bigserial"),
            (Dialect::Mysql, "INT AUTO_INCREMENT"),
            (Dialect::Mysql, "int(11) unsigned auto_increment"),
            (Dialect::Oracle, "NUMBER GENERATED ALWAYS AS IDENTITY"),
            (Dialect::Oracle, "NUMBER(10) GENERATED BY DEFAULT AS IDENTITY"),
            (Dialect::Mssql, "INT IDENTITY(1,1)"),
            (Dialect::Generic, "INTEGER AUTOINCREMENT"),
        ] {
            assert_eq!(norm(dialect, raw), IDENTITY_INTEGER, "{dialect} {raw}");
        }
        assert!(TypeNormalizer::new().normalize(Dialect::Mysql, "SERIAL").is_identity());
    }

    #[test]
    fn identity_flag_on_column() {
        let column = Column::new("id", "INTEGER").identity();
        let normalized = TypeNormalizer::new().normalize_column(Dialect::Postgresql, &column);
        assert_eq!(normalized.to_string(), IDENTITY_INTEGER);
    }

    #[test]
    fn dialect_specific_aliases() {
        assert_eq!(norm(Dialect::Oracle, "VARCHAR2(100)"), "VARCHAR(100)");
        assert_eq!(norm(Dialect::Oracle, "NUMBER(10,2)"), "DECIMAL(10,2)");
        assert_eq!(norm(Dialect::Mssql, "BIT"), "BOOLEAN");
        assert_eq!(norm(Dialect::Mssql, "NVARCHAR(MAX)"), "NTEXT");
        assert_eq!(norm(Dialect::Mssql, "varchar(max)"), "TEXT");
        assert_eq!(norm(Dialect::Mssql, "DATETIME2(7)"), "DATETIME(7)");
        assert_eq!(norm(Dialect::Postgresql, "int8"), "BIGINT");
        assert_eq!(norm(Dialect::Postgresql, "TIMESTAMP(6) WITH TIME ZONE"), "TIMESTAMPTZ(6)");
        assert_eq!(norm(Dialect::Postgresql, "timestamp without time zone"), "TIMESTAMP");
    }

    #[test]
    fn postgres_arrays() {
        assert_eq!(norm(Dialect::Postgresql, "int4[]"), "INTEGER[]");
        assert_eq!(norm(Dialect::Postgresql, "character varying(20)[][]"), "VARCHAR(20)[][]");
        let normalized = TypeNormalizer::new().normalize(Dialect::Postgresql, "text[]");
        assert_eq!(normalized.array_depth(), 1);
        assert_eq!(normalized.element().to_string(), "TEXT");
    }

    #[test]
    fn unknown_types_pass_through() {
        assert_eq!(norm(Dialect::Postgresql, "geography(Point, 4326)"), "GEOGRAPHY(POINT,4326)");
        assert_eq!(norm(Dialect::Generic, "  my_domain "), "MY_DOMAIN");
        assert_eq!(norm(Dialect::Generic, ""), "");
        assert_eq!(norm(Dialect::Generic, "VARCHAR(10"), "VARCHAR(10");
    }

    #[test]
    fn generic_uses_union_of_tables() {
        assert_eq!(norm(Dialect::Generic, "VARCHAR2(10)"), "VARCHAR(10)");
        assert_eq!(norm(Dialect::Generic, "UNIQUEIDENTIFIER"), "UUID");
        assert_eq!(norm(Dialect::Generic, "TINYINT(1)"), "BOOLEAN");
        assert_eq!(norm(Dialect::Generic, "int4"), "INTEGER");
    }

    #[test]
    fn custom_aliases_take_precedence() {
        let normalizer = TypeNormalizer::new()
            .with_alias(Dialect::Postgresql, "citext", "text")
            .with_alias(Dialect::Generic, "money", "decimal");
        assert_eq!(normalizer.normalize(Dialect::Postgresql, "CITEXT").to_string(), "TEXT");
        assert_eq!(normalizer.normalize(Dialect::Mysql, "CITEXT").to_string(), "CITEXT");
        assert_eq!(normalizer.normalize(Dialect::Oracle, "MONEY").to_string(), "DECIMAL");
    }

    #[test]
    fn normalization_is_idempotent() {
        let normalizer = TypeNormalizer::new();
        let mut samples: Vec<String> = vec![
            "VARCHAR(255)".into(),
            "TINYINT(1)".into(),
            "NVARCHAR(MAX)".into(),
            "INT IDENTITY(1,1)".into(),
            "TIMESTAMP(3) WITH TIME ZONE".into(),
            "int4[]".into(),
            "geography(Point, 4326)".into(),
            "INT(11) UNSIGNED".into(),
            "NUMERIC(12)".into(),
        ];
        for table in [
            COMMON_ALIASES,
            POSTGRES_ALIASES,
            MYSQL_ALIASES,
            ORACLE_ALIASES,
            MSSQL_ALIASES,
        ] {
            for (alias, canonical) in table {
                samples.push(alias.to_string());
                samples.push(canonical.to_string());
                samples.push(format!("{}(10)", alias));
            }
        }

        for dialect in Dialect::ALL {
            for raw in &samples {
                let once = normalizer.normalize(dialect, raw);
                let twice = normalizer.normalize(dialect, &once.to_string());
                assert_eq!(once, twice, "{dialect}: {raw}");
            }
        }
    }

    #[test]
    fn numeric_params() {
        let normalizer = TypeNormalizer::new();
        assert_eq!(
            normalizer.normalize(Dialect::Postgresql, "numeric(12, 4)").numeric_params(),
            Some(vec![12, 4])
        );
        assert_eq!(normalizer.normalize(Dialect::Postgresql, "text").numeric_params(), None);
        assert_eq!(normalizer.normalize(Dialect::Mssql, "VARCHAR(MAX)").numeric_params(), None);
    }
}
