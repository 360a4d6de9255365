use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::parser::languages::{
    float_literal, integer_literal, FieldTable, Grammar, CHILDREN_FIELD,
};

pub static PYTHON: PythonGrammar = PythonGrammar::new();

pub struct PythonGrammar {
    table: OnceCell<FieldTable>,
}

impl PythonGrammar {
    pub const fn new() -> Self {
        Self {
            table: OnceCell::new(),
        }
    }
}

impl Default for PythonGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for PythonGrammar {
    fn name(&self) -> &'static str {
        "python"
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_python::language()
    }

    fn node_types(&self) -> &'static str {
        tree_sitter_python::NODE_TYPES
    }

    fn table_cell(&self) -> &OnceCell<FieldTable> {
        &self.table
    }

    // Statement lists read as `body`, like `Module.body` in Python's own AST.
    fn children_field(&self, kind: &str) -> &'static str {
        match kind {
            "module" | "block" => "body",
            _ => CHILDREN_FIELD,
        }
    }

    fn text_kinds(&self) -> &'static [&'static str] {
        &["string", "string_content"]
    }

    fn scalar(&self, kind: &str, text: &str) -> Value {
        match kind {
            "integer" => integer_literal(text),
            "float" => float_literal(text),
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "none" => Value::Null,
            _ => Value::String(text.to_string()),
        }
    }
}
