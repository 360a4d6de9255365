use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::parser::languages::{float_literal, integer_literal, FieldTable, Grammar};

pub static RUST: RustGrammar = RustGrammar::new();

pub struct RustGrammar {
    table: OnceCell<FieldTable>,
}

impl RustGrammar {
    pub const fn new() -> Self {
        Self {
            table: OnceCell::new(),
        }
    }
}

impl Default for RustGrammar {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip a trailing type suffix such as `u8` or `f64` from a numeric literal.
fn strip_suffix(text: &str, radix_prefixed: bool) -> &str {
    const SUFFIXES: &[&str] = &[
        "u128", "i128", "usize", "isize", "u64", "i64", "u32", "i32", "u16", "i16", "u8", "i8",
        "f64", "f32",
    ];
    SUFFIXES
        .iter()
        // `0xf32` is a hex number, not `0x` with an `f32` suffix
        .filter(|s| !(radix_prefixed && s.starts_with('f')))
        .find_map(|suffix| text.strip_suffix(suffix))
        .unwrap_or(text)
}

impl Grammar for RustGrammar {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_rust::language()
    }

    fn node_types(&self) -> &'static str {
        tree_sitter_rust::NODE_TYPES
    }

    fn table_cell(&self) -> &OnceCell<FieldTable> {
        &self.table
    }

    fn text_kinds(&self) -> &'static [&'static str] {
        &["string_literal", "raw_string_literal", "char_literal"]
    }

    fn scalar(&self, kind: &str, text: &str) -> Value {
        match kind {
            "integer_literal" => {
                let prefixed = ["0x", "0o", "0b"].iter().any(|p| text.starts_with(p));
                match integer_literal(strip_suffix(text, prefixed)) {
                    Value::String(_) => Value::String(text.to_string()),
                    number => number,
                }
            }
            "float_literal" => match float_literal(strip_suffix(text, false)) {
                Value::String(_) => Value::String(text.to_string()),
                number => number,
            },
            "boolean_literal" => Value::Bool(text == "true"),
            _ => Value::String(text.to_string()),
        }
    }
}
