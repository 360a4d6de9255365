//! Tree walker: renders a `SyntaxTree` as JSON-like text and counts the
//! nodes it visits.
//!
//! Output shape per node is `{ "node": <label>, <positions>, <fields> }`,
//! sequences are `[ a, b ]` (`[ ]` when empty). The walk uses an explicit
//! task stack, so deep trees do not grow the call stack.

use indextree::NodeId;
use serde_json::Value;

use crate::error::WalkError;
use crate::parser::tree::SyntaxTree;
use crate::parser::types::{FieldValue, NodeData, Position};

/// Which position entries a serialized node carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PositionMode {
    /// No `lineno`/`col_offset` entries at all.
    None,
    /// The node's own position followed by the position of the first element
    /// of its `body` sequence. Keys may repeat; a JSON reader keeps the last.
    Shadow,
    /// Same sources as `Shadow`, but each key is written once and the
    /// body-derived value wins.
    #[default]
    Merge,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    pub positions: PositionMode,
}

impl SerializeOptions {
    pub fn positions(mut self, positions: PositionMode) -> Self {
        self.positions = positions;
        self
    }
}

/// Node count and serialized text of one walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationResult {
    pub count: usize,
    pub text: String,
}

/// Where a value sits, for error reporting.
#[derive(Clone, Copy)]
struct Slot<'t> {
    label: &'t str,
    field: &'t str,
}

impl Slot<'_> {
    fn path(&self) -> String {
        format!("{}.{}", self.label, self.field)
    }
}

enum Task<'t> {
    Node(NodeId, Slot<'t>),
    Value(&'t FieldValue, Slot<'t>),
    Key(&'t str),
    Text(&'static str),
}

pub fn serialize(
    tree: &SyntaxTree,
    root: NodeId,
    options: &SerializeOptions,
) -> Result<SerializationResult, WalkError> {
    let mut count = 0usize;
    let mut out = String::new();
    let mut stack = vec![Task::Node(
        root,
        Slot {
            label: "<root>",
            field: "",
        },
    )];

    while let Some(task) = stack.pop() {
        match task {
            Task::Node(id, slot) => {
                let data = tree.get_node(id).ok_or_else(|| {
                    WalkError::contract(slot.path(), format!("node {id:?} is not in the tree"))
                })?;

                out.push_str("{ \"node\": ");
                write_str(&mut out, &data.label)?;
                for (name, value) in position_entries(tree, data, options.positions) {
                    out.push_str(", \"");
                    out.push_str(name);
                    out.push_str("\": ");
                    out.push_str(&value.to_string());
                }

                stack.push(Task::Text(" }"));
                for (name, value) in data.fields.iter().rev() {
                    let slot = Slot {
                        label: &data.label,
                        field: name,
                    };
                    stack.push(Task::Value(value, slot));
                    stack.push(Task::Key(name));
                }
                count += 1;
            }
            Task::Value(FieldValue::Node(id), slot) => stack.push(Task::Node(*id, slot)),
            Task::Value(FieldValue::Sequence(items), slot) => {
                if items.is_empty() {
                    out.push_str("[ ]");
                    continue;
                }
                out.push_str("[ ");
                stack.push(Task::Text(" ]"));
                for (i, item) in items.iter().enumerate().rev() {
                    stack.push(Task::Value(item, slot));
                    if i > 0 {
                        stack.push(Task::Text(", "));
                    }
                }
            }
            Task::Value(FieldValue::Scalar(value), slot) => write_scalar(&mut out, value, slot)?,
            Task::Key(name) => {
                out.push_str(", ");
                write_str(&mut out, name)?;
                out.push_str(": ");
            }
            Task::Text(text) => out.push_str(text),
        }
    }

    Ok(SerializationResult { count, text: out })
}

fn write_scalar(out: &mut String, value: &Value, slot: Slot<'_>) -> Result<(), WalkError> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(WalkError::contract(
            slot.path(),
            "arrays and objects are not scalar values",
        )),
        scalar => {
            let text = serde_json::to_string(scalar)
                .map_err(|e| WalkError::contract(slot.path(), e.to_string()))?;
            out.push_str(&text);
            Ok(())
        }
    }
}

fn write_str(out: &mut String, text: &str) -> Result<(), WalkError> {
    let text =
        serde_json::to_string(text).map_err(|e| WalkError::contract(text, e.to_string()))?;
    out.push_str(&text);
    Ok(())
}

/// Position of the first element of a non-empty `body` sequence.
fn body_position(tree: &SyntaxTree, data: &NodeData) -> Option<Position> {
    match data.field("body")? {
        FieldValue::Sequence(items) => {
            let first = items.first()?.as_node()?;
            tree.get_node(first)?.position
        }
        _ => None,
    }
}

fn position_entries(
    tree: &SyntaxTree,
    data: &NodeData,
    mode: PositionMode,
) -> Vec<(&'static str, u32)> {
    if mode == PositionMode::None {
        return Vec::new();
    }
    let own: Vec<_> = data.position.iter().flat_map(Position::entries).collect();
    let body: Vec<_> = body_position(tree, data)
        .iter()
        .flat_map(Position::entries)
        .collect();

    match mode {
        PositionMode::Shadow => own.into_iter().chain(body).collect(),
        _ => ["lineno", "end_lineno", "col_offset", "end_col_offset"]
            .into_iter()
            .filter_map(|name| {
                body.iter()
                    .chain(own.iter())
                    .find(|(key, _)| *key == name)
                    .copied()
            })
            .collect(),
    }
}

impl SyntaxTree {
    /// Serialize from the root node.
    pub fn to_ast_json(&self, options: &SerializeOptions) -> Result<SerializationResult, WalkError> {
        let root = self.root().ok_or(WalkError::EmptyTree)?;
        serialize(self, root, options)
    }
}
