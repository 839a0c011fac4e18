// Argument validation against a tool's declared schema.
//
// Rules run in a fixed order (unknown names, missing required, type
// checks, constraints) and the first failure wins, so a given request
// always reports the same single failure.

use crate::registry::{Constraint, ParamType, ToolDefinition};
use serde_json::{Map, Value};
use std::fmt;

/// A single schema violation: the offending field and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid argument '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Validate `args` against `def`. Short-circuits on the first failing
/// rule.
pub fn validate(def: &ToolDefinition, args: &Map<String, Value>) -> Result<(), ValidationError> {
    // 1. Unknown argument names. serde_json maps iterate in sorted key
    //    order, so the reported field is deterministic.
    for name in args.keys() {
        if def.param(name).is_none() {
            return Err(ValidationError::new(name, "unknown argument"));
        }
    }

    // 2. Missing required arguments, in declaration order.
    for param in &def.params {
        if param.required && !args.contains_key(&param.name) {
            return Err(ValidationError::new(&param.name, "required argument missing"));
        }
    }

    // 3. Type checks, in declaration order.
    for param in &def.params {
        if let Some(value) = args.get(&param.name) {
            if !type_matches(param.param_type, value) {
                return Err(ValidationError::new(
                    &param.name,
                    format!("expected {}", param.param_type.as_str()),
                ));
            }
        }
    }

    // 4. Per-field constraints, in declaration order.
    for param in &def.params {
        if let (Some(constraint), Some(value)) = (param.constraint, args.get(&param.name)) {
            check_constraint(&param.name, constraint, value)?;
        }
    }

    Ok(())
}

fn type_matches(expected: ParamType, value: &Value) -> bool {
    match expected {
        ParamType::String => value.is_string(),
        ParamType::Number => value.is_number(),
        ParamType::Integer => value.is_i64() || value.is_u64(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Array => value.is_array(),
        ParamType::Object => value.is_object(),
    }
}

fn check_constraint(field: &str, constraint: Constraint, value: &Value) -> Result<(), ValidationError> {
    match constraint {
        Constraint::NonEmpty => {
            let s = value.as_str().unwrap_or_default();
            if s.trim().is_empty() {
                return Err(ValidationError::new(field, "must not be empty"));
            }
        }
        Constraint::SpreadsheetId => {
            let s = value.as_str().unwrap_or_default();
            if !is_valid_spreadsheet_id(s) {
                return Err(ValidationError::new(field, "not a valid spreadsheet ID"));
            }
        }
        Constraint::SheetName => {
            let s = value.as_str().unwrap_or_default();
            if !is_valid_sheet_name(s) {
                return Err(ValidationError::new(field, "not a valid sheet name"));
            }
        }
        Constraint::A1Range => {
            let s = value.as_str().unwrap_or_default();
            if !is_valid_a1_range(s) {
                return Err(ValidationError::new(field, "not a valid A1 range"));
            }
        }
        Constraint::Email => {
            let s = value.as_str().unwrap_or_default();
            if !is_valid_email(s) {
                return Err(ValidationError::new(field, "not a valid email address"));
            }
        }
        Constraint::IntRange { min, max } => {
            // Type rule 3 already guaranteed an integer here.
            let n = value.as_i64().unwrap_or(i64::MAX);
            if n < min || n > max {
                return Err(ValidationError::new(
                    field,
                    format!("must be between {} and {}", min, max),
                ));
            }
        }
    }
    Ok(())
}

/// Drive file IDs are long URL-safe tokens. Length bounds keep out
/// both junk and oversized payloads.
pub fn is_valid_spreadsheet_id(id: &str) -> bool {
    if id.len() < 20 || id.len() > 100 {
        return false;
    }
    id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Sheet tab names: bounded length, no characters the Sheets API
/// rejects, no control characters.
pub fn is_valid_sheet_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 100 {
        return false;
    }
    !name
        .chars()
        .any(|c| matches!(c, '[' | ']' | '*' | '?' | ':' | '\\' | '/') || c.is_control())
}

/// Syntactic A1 check: optional `Sheet!` prefix, then a cell or a
/// cell:cell span. Does not verify the range exists.
pub fn is_valid_a1_range(range: &str) -> bool {
    let body = match range.split_once('!') {
        Some((sheet, rest)) => {
            if sheet.is_empty() || !sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return false;
            }
            rest
        }
        None => range,
    };

    match body.split_once(':') {
        Some((start, end)) => is_valid_cell(start) && is_valid_cell(end),
        None => is_valid_cell(body),
    }
}

fn is_valid_cell(cell: &str) -> bool {
    let letters = cell.chars().take_while(|c| c.is_ascii_uppercase()).count();
    if letters == 0 || letters > 3 {
        return false;
    }
    let digits = &cell[letters..];
    (1..=7).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Shallow email shape check: local part, one '@', dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'));
    let domain_ok = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
        && !domain.ends_with('.')
        && domain.rsplit('.').next().is_some_and(|tld| tld.len() >= 2);
    local_ok && domain_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRegistry;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::standard()
    }

    #[test]
    fn test_no_arguments_tool_accepts_empty() {
        let registry = registry();
        let def = registry.lookup("list_spreadsheets").unwrap();
        assert!(validate(def, &Map::new()).is_ok());
    }

    #[test]
    fn test_unknown_argument_rejected_first() {
        let registry = registry();
        let def = registry.lookup("create_spreadsheet").unwrap();

        // "bogus" is unknown AND "title" is missing; the unknown-name
        // rule runs first.
        let err = validate(def, &args(json!({"bogus": 1}))).unwrap_err();
        assert_eq!(err.field, "bogus");
        assert_eq!(err.reason, "unknown argument");
    }

    #[test]
    fn test_missing_required_argument() {
        let registry = registry();
        let def = registry.lookup("get_sheet_data").unwrap();

        let err = validate(
            def,
            &args(json!({"spreadsheet_id": "1A2b3C4d5E6f7G8h9I0j-abc"})),
        )
        .unwrap_err();
        assert_eq!(err.field, "sheet");
        assert_eq!(err.reason, "required argument missing");
    }

    #[test]
    fn test_type_mismatch() {
        let registry = registry();
        let def = registry.lookup("add_rows").unwrap();

        let err = validate(
            def,
            &args(json!({
                "spreadsheet_id": "1A2b3C4d5E6f7G8h9I0j-abc",
                "sheet": "Sheet1",
                "count": "three",
            })),
        )
        .unwrap_err();
        assert_eq!(err.field, "count");
        assert_eq!(err.reason, "expected integer");
    }

    #[test]
    fn test_count_out_of_bounds() {
        let registry = registry();
        let def = registry.lookup("add_columns").unwrap();

        let err = validate(
            def,
            &args(json!({
                "spreadsheet_id": "1A2b3C4d5E6f7G8h9I0j-abc",
                "sheet": "Sheet1",
                "count": 100_000,
            })),
        )
        .unwrap_err();
        assert_eq!(err.field, "count");
        assert!(err.reason.contains("between 1 and 1000"));
    }

    #[test]
    fn test_same_request_reports_same_failure() {
        let registry = registry();
        let def = registry.lookup("update_cells").unwrap();
        let bad = args(json!({"sheet": "Sheet1"}));

        let first = validate(def, &bad).unwrap_err();
        let second = validate(def, &bad).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn test_spreadsheet_id_rules() {
        assert!(is_valid_spreadsheet_id(
            "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms"
        ));
        assert!(!is_valid_spreadsheet_id("short"));
        assert!(!is_valid_spreadsheet_id(&"x".repeat(101)));
        assert!(!is_valid_spreadsheet_id("1BxiMVs0XRA5nFMdK<script>"));
    }

    #[test]
    fn test_sheet_name_rules() {
        assert!(is_valid_sheet_name("Q3 Forecast"));
        assert!(!is_valid_sheet_name(""));
        assert!(!is_valid_sheet_name("bad:name"));
        assert!(!is_valid_sheet_name("bad\x00name"));
        assert!(!is_valid_sheet_name(&"x".repeat(101)));
    }

    #[test]
    fn test_a1_range_rules() {
        assert!(is_valid_a1_range("A1"));
        assert!(is_valid_a1_range("A1:C10"));
        assert!(is_valid_a1_range("Sheet1!A1:B2"));
        assert!(is_valid_a1_range("AAA1000000"));

        assert!(!is_valid_a1_range(""));
        assert!(!is_valid_a1_range("1A"));
        assert!(!is_valid_a1_range("A1:"));
        assert!(!is_valid_a1_range("!A1"));
        assert!(!is_valid_a1_range("AAAA1"));
        assert!(!is_valid_a1_range("A1:B2:C3"));
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("analyst@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@domain."));
    }
}
