pub mod javascript;
pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::{Number, Value};

/// Synthetic field holding named children that the grammar does not label.
pub const CHILDREN_FIELD: &str = "children";

/// Grammars the driver can load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Language {
    #[default]
    Python,
    #[value(name = "typescript")]
    TypeScript,
    Tsx,
    #[value(name = "javascript")]
    JavaScript,
    Rust,
}

impl Language {
    /// Pick a grammar from the file extension, defaulting to Python.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("ts" | "mts" | "cts") => Language::TypeScript,
            Some("tsx") => Language::Tsx,
            Some("js" | "mjs" | "cjs" | "jsx") => Language::JavaScript,
            Some("rs") => Language::Rust,
            _ => Language::Python,
        }
    }

    pub fn grammar(self) -> &'static dyn Grammar {
        match self {
            Language::Python => &python::PYTHON,
            Language::TypeScript => &typescript::TYPESCRIPT,
            Language::Tsx => &typescript::TSX,
            Language::JavaScript => &javascript::JAVASCRIPT,
            Language::Rust => &rust::RUST,
        }
    }
}

pub trait Grammar: Send + Sync {
    fn name(&self) -> &'static str;

    fn language(&self) -> tree_sitter::Language;

    /// The grammar's `node-types.json`.
    fn node_types(&self) -> &'static str;

    /// Lazily-built field table; each grammar owns its cell.
    fn table_cell(&self) -> &OnceCell<FieldTable>;

    /// Name of the slot for unlabelled named children of `kind`.
    fn children_field(&self, _kind: &str) -> &'static str {
        CHILDREN_FIELD
    }

    /// Kinds whose source text is kept as a `value` even when they have
    /// named children (string literals with escapes or interpolations).
    fn text_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    /// Typed scalar for the source text of a terminal node.
    fn scalar(&self, _kind: &str, text: &str) -> Value {
        Value::String(text.to_string())
    }

    fn field_table(&self) -> anyhow::Result<&FieldTable> {
        self.table_cell().get_or_try_init(|| {
            FieldTable::from_node_types(self.node_types(), |kind| self.children_field(kind))
                .with_context(|| format!("loading {} node types", self.name()))
        })
    }
}

// ---------------------------------------------------------------------------
// Field table, built from node-types.json
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NodeTypeEntry {
    #[serde(rename = "type")]
    kind: String,
    named: bool,
    #[serde(default)]
    fields: BTreeMap<String, ChildInfo>,
    children: Option<ChildInfo>,
}

#[derive(Debug, Deserialize)]
struct ChildInfo {
    multiple: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// A field label the grammar declares.
    Named(String),
    /// Named children without a field label.
    Children,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name used in the output.
    pub name: String,
    pub source: FieldSource,
    pub multiple: bool,
}

impl FieldSpec {
    /// Whether a child carrying the tree-sitter field label `field` fills
    /// this slot.
    pub fn matches(&self, field: Option<&str>) -> bool {
        match &self.source {
            FieldSource::Named(name) => field == Some(name.as_str()),
            FieldSource::Children => field.is_none(),
        }
    }
}

/// Ordered field descriptors per node kind.
#[derive(Debug, Default)]
pub struct FieldTable {
    kinds: HashMap<String, Vec<FieldSpec>>,
}

impl FieldTable {
    /// Grammar fields come first, sorted by name; the unlabelled-children slot
    /// goes last.
    pub fn from_node_types(
        json: &str,
        children_field: impl Fn(&str) -> &'static str,
    ) -> anyhow::Result<Self> {
        let entries: Vec<NodeTypeEntry> =
            serde_json::from_str(json).context("node-types.json is malformed")?;

        let mut kinds = HashMap::new();
        for entry in entries.into_iter().filter(|e| e.named) {
            let mut specs: Vec<FieldSpec> = entry
                .fields
                .into_iter()
                .map(|(name, info)| FieldSpec {
                    source: FieldSource::Named(name.clone()),
                    name,
                    multiple: info.multiple,
                })
                .collect();
            if let Some(info) = entry.children {
                specs.push(FieldSpec {
                    name: children_field(&entry.kind).to_string(),
                    source: FieldSource::Children,
                    multiple: info.multiple,
                });
            }
            kinds.insert(entry.kind, specs);
        }

        Ok(Self { kinds })
    }

    pub fn fields(&self, kind: &str) -> &[FieldSpec] {
        self.kinds.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Kinds that declare neither fields nor children.
    pub fn is_terminal(&self, kind: &str) -> bool {
        self.fields(kind).is_empty()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Literal typing shared by the grammars
// ---------------------------------------------------------------------------

/// Integer literal as a JSON number of any magnitude, written in decimal.
/// Accepts `_` separators and `0x`/`0o`/`0b` prefixes; text that is not an
/// integer literal stays a string.
pub fn integer_literal(text: &str) -> Value {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = match lower.get(..2) {
        Some("0x") => (16, &lower[2..]),
        Some("0o") => (8, &lower[2..]),
        Some("0b") => (2, &lower[2..]),
        _ => (10, lower.as_str()),
    };
    to_decimal(body, radix)
        .and_then(|decimal| serde_json::from_str::<Number>(&decimal).ok())
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

/// Decimal digits of an unsigned integer written in `radix`, without
/// leading zeros.
fn to_decimal(body: &str, radix: u32) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    // Least significant digit first.
    let mut decimal: Vec<u8> = vec![0];
    for c in body.chars() {
        let mut carry = c.to_digit(radix)?;
        for d in decimal.iter_mut() {
            let v = u32::from(*d) * radix + carry;
            *d = (v % 10) as u8;
            carry = v / 10;
        }
        while carry > 0 {
            decimal.push((carry % 10) as u8);
            carry /= 10;
        }
    }
    Some(decimal.iter().rev().map(|d| char::from(b'0' + d)).collect())
}

/// Finite float literal as a JSON number, otherwise the source text.
pub fn float_literal(text: &str) -> Value {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    digits
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}
