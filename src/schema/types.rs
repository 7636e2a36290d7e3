// src/schema/types.rs

/// The literal two-character token the bulk loader reads as SQL NULL.
pub const NULL_SENTINEL: &str = r"\N";

/// Semantic type declared for a table column. Closed set; every raw cell is
/// pushed through exactly one of these coercions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
    Bool,
    Date,
}

impl FieldType {
    /// Coerce one raw cell into its canonical textual form.
    ///
    /// `None` means the value cannot be represented in this type; the caller
    /// turns it into a missing cell. Coercion never fails hard: a garbage
    /// float or bool becomes missing, never an error.
    pub fn coerce(self, raw: &str) -> Option<String> {
        let value = raw.trim();
        match self {
            FieldType::Str => Some(value.to_string()),
            FieldType::Int => value.parse::<i64>().ok().map(|n| n.to_string()),
            // Source locale writes comma decimals ("1234,56").
            FieldType::Float => value
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .map(|f| f.to_string()),
            FieldType::Bool => match value.to_lowercase().as_str() {
                "true" | "1" => Some("true".to_string()),
                "false" | "0" => Some("false".to_string()),
                _ => None,
            },
            // Dates are not validated or reformatted, only null-normalized:
            // the registry encodes "no date" as 0 or 0000-00-00.
            FieldType::Date => match value {
                "" | "0" | "0000-00-00" => Some(NULL_SENTINEL.to_string()),
                _ => Some(raw.to_string()),
            },
        }
    }
}
