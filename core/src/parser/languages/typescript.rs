use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::parser::languages::javascript::ecmascript_scalar;
use crate::parser::languages::{FieldTable, Grammar};

pub static TYPESCRIPT: TypeScriptGrammar = TypeScriptGrammar::new(false);
pub static TSX: TypeScriptGrammar = TypeScriptGrammar::new(true);

/// TypeScript and TSX share a crate but ship separate grammars.
pub struct TypeScriptGrammar {
    tsx: bool,
    table: OnceCell<FieldTable>,
}

impl TypeScriptGrammar {
    pub const fn new(tsx: bool) -> Self {
        Self {
            tsx,
            table: OnceCell::new(),
        }
    }
}

impl Grammar for TypeScriptGrammar {
    fn name(&self) -> &'static str {
        if self.tsx {
            "tsx"
        } else {
            "typescript"
        }
    }

    fn language(&self) -> tree_sitter::Language {
        if self.tsx {
            tree_sitter_typescript::language_tsx()
        } else {
            tree_sitter_typescript::language_typescript()
        }
    }

    fn node_types(&self) -> &'static str {
        if self.tsx {
            tree_sitter_typescript::TSX_NODE_TYPES
        } else {
            tree_sitter_typescript::TYPESCRIPT_NODE_TYPES
        }
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
