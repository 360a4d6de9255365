use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::parser::languages::{FieldTable, Grammar};

pub static JAVASCRIPT: JavaScriptGrammar = JavaScriptGrammar::new();

pub struct JavaScriptGrammar {
    table: OnceCell<FieldTable>,
}

impl JavaScriptGrammar {
    pub const fn new() -> Self {
        Self {
            table: OnceCell::new(),
        }
    }
}

impl Default for JavaScriptGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for JavaScriptGrammar {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_javascript::language()
    }

    fn node_types(&self) -> &'static str {
        tree_sitter_javascript::NODE_TYPES
    }

    fn table_cell(&self) -> &OnceCell<FieldTable> {
        &self.table
    }

    fn text_kinds(&self) -> &'static [&'static str] {
        &["string", "template_string", "regex"]
    }

    fn scalar(&self, kind: &str, text: &str) -> Value {
        ecmascript_scalar(kind, text)
    }
}

/// Literal typing shared with the TypeScript grammars.
pub(crate) fn ecmascript_scalar(kind: &str, text: &str) -> Value {
    match kind {
        "number" => {
            let value = super::integer_literal(text);
            match value {
                Value::String(_) => super::float_literal(text),
                number => number,
            }
        }
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => Value::String(text.to_string()),
    }
}
