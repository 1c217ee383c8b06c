//! `normalizeCandidate` (§4.A): contract type + unit + range + enum +
//! component-ref normalization for a single raw candidate value.

use shc_contracts::{EnumPolicy, FieldContract, FieldType};

use crate::bundle::ContractBundle;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub ok: bool,
    pub normalized: Option<String>,
    pub reason_code: Option<String>,
}

impl NormalizeOutcome {
    fn ok(normalized: impl Into<String>) -> Self {
        NormalizeOutcome { ok: true, normalized: Some(normalized.into()), reason_code: None }
    }

    fn fail(reason_code: &str) -> Self {
        NormalizeOutcome { ok: false, normalized: None, reason_code: Some(reason_code.to_string()) }
    }
}

/// Strips a trailing/leading unit suffix and whitespace, returning the bare
/// numeric text. Real unit conversion tables are authored per category in
/// the contract's `parse` hints; here we handle the common case of a
/// number immediately followed by letters (`"120g"`, `"26000 dpi"`).
fn strip_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let numeric_prefix: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    numeric_prefix.parse::<f64>().ok()
}

pub fn normalize_candidate(
    bundle: &ContractBundle,
    rule: &FieldContract,
    value: &str,
) -> NormalizeOutcome {
    match &rule.contract {
        FieldType::Number { range, .. } => {
            let Some(parsed) = strip_numeric(value) else {
                return NormalizeOutcome::fail("out_of_range");
            };
            if let Some(range) = range {
                if !range.contains(parsed) {
                    return NormalizeOutcome::fail("out_of_range");
                }
            }
            NormalizeOutcome::ok(format_number(parsed))
        }
        FieldType::Integer { range } => {
            let Some(parsed) = strip_numeric(value) else {
                return NormalizeOutcome::fail("out_of_range");
            };
            if parsed.fract() != 0.0 {
                return NormalizeOutcome::fail("out_of_range");
            }
            if let Some(range) = range {
                if !range.contains(parsed) {
                    return NormalizeOutcome::fail("out_of_range");
                }
            }
            NormalizeOutcome::ok((parsed as i64).to_string())
        }
        FieldType::Boolean => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => NormalizeOutcome::ok("true"),
            "false" | "no" | "0" => NormalizeOutcome::ok("false"),
            _ => NormalizeOutcome::fail("out_of_range"),
        },
        FieldType::String => NormalizeOutcome::ok(value.trim().to_string()),
        FieldType::Enum { catalog, policy } => normalize_enum(bundle, catalog, *policy, value),
        FieldType::ComponentRef { db_name } => normalize_component_ref(bundle, db_name, value),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let mut s = format!("{}", value);
        if !s.contains('.') {
            s.push_str(".0");
        }
        s
    }
}

fn normalize_enum(
    bundle: &ContractBundle,
    catalog_name: &str,
    policy: EnumPolicy,
    value: &str,
) -> NormalizeOutcome {
    let Some(catalog) = bundle.catalogs.get(catalog_name) else {
        return NormalizeOutcome::fail("enum_value_not_allowed");
    };
    let resolved = catalog.resolve(value);
    match policy {
        EnumPolicy::Closed => match resolved {
            Some(canonical) => NormalizeOutcome::ok(canonical),
            None => NormalizeOutcome::fail("enum_value_not_allowed"),
        },
        EnumPolicy::Open => NormalizeOutcome::ok(value.trim().to_string()),
        EnumPolicy::OpenPreferKnown => match resolved {
            Some(canonical) => NormalizeOutcome::ok(canonical),
            None => NormalizeOutcome::ok(value.trim().to_string()),
        },
    }
}

fn normalize_component_ref(bundle: &ContractBundle, db_name: &str, value: &str) -> NormalizeOutcome {
    let Some(db) = bundle.components.get(db_name) else {
        return NormalizeOutcome::fail("component_not_found");
    };
    if let Some(item) = db.find_by_alias(value) {
        return NormalizeOutcome::ok(item.canonical_name.clone());
    }
    let threshold = bundle
        .fields
        .values()
        .find(|f| matches!(&f.contract, FieldType::ComponentRef { db_name: d } if d == db_name))
        .map(|f| f.fuzzy_threshold())
        .unwrap_or(0.75);
    match db.fuzzy_match(value, threshold) {
        Some((item, _score)) => NormalizeOutcome::ok(item.canonical_name.clone()),
        None => NormalizeOutcome::fail("component_not_found"),
    }
}
