use indextree::NodeId;
use log::trace;
use tree_sitter::Node;

use crate::error::TreeError;
use crate::parser::languages::{FieldTable, Grammar};
use crate::parser::tree::SyntaxTree;
use crate::parser::types::{FieldValue, NodeData, Position};

/// Field that carries the source text of terminal nodes.
pub const VALUE_FIELD: &str = "value";

/// Lowers a tree-sitter concrete syntax tree into a `SyntaxTree`.
///
/// Anonymous tokens and extras (comments) are dropped. Every remaining named
/// child lands in a field: its grammar label when the kind declares it, the
/// grammar's unlabelled-children slot otherwise.
pub struct CstWalker<'a> {
    grammar: &'a dyn Grammar,
    table: &'a FieldTable,
    source: &'a str,
}

impl<'a> CstWalker<'a> {
    pub fn new(grammar: &'a dyn Grammar, table: &'a FieldTable, source: &'a str) -> Self {
        Self {
            grammar,
            table,
            source,
        }
    }

    pub fn build(&self, root: Node<'_>) -> Result<SyntaxTree, TreeError> {
        let mut tree = SyntaxTree::new();
        let root_id = tree.add_node(node_data(&root)?);
        let mut stack = vec![(root, root_id)];

        while let Some((node, node_id)) = stack.pop() {
            let kind = node.kind();
            let mut pending = named_children(&node);

            if self.grammar.text_kinds().contains(&kind)
                || (pending.is_empty() && self.table.is_terminal(kind))
            {
                let text = self.text(&node)?;
                let value = self.grammar.scalar(kind, text);
                tree.set_field(node_id, VALUE_FIELD, FieldValue::Scalar(value))?;
            }

            for spec in self.table.fields(kind) {
                let (matched, rest): (Vec<_>, Vec<_>) = pending
                    .into_iter()
                    .partition(|(field, _)| spec.matches(*field));
                pending = rest;

                let mut ids = Vec::with_capacity(matched.len());
                for (_, child) in matched {
                    ids.push(adopt(&mut tree, &mut stack, child)?);
                }
                let value = if spec.multiple || ids.len() > 1 {
                    Some(FieldValue::seq(ids))
                } else {
                    ids.pop().map(FieldValue::Node)
                };
                if let Some(value) = value {
                    tree.set_field(node_id, spec.name.as_str(), value)?;
                }
            }

            // Labels this kind does not declare, kept in order of appearance.
            let mut undeclared: Vec<(&'static str, Vec<NodeId>)> = Vec::new();
            for (field, child) in pending {
                let name = field.unwrap_or_else(|| self.grammar.children_field(kind));
                let child_id = adopt(&mut tree, &mut stack, child)?;
                match undeclared.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, ids)) => ids.push(child_id),
                    None => undeclared.push((name, vec![child_id])),
                }
            }
            for (name, ids) in undeclared {
                trace!("{kind}: undeclared field `{name}` with {} node(s)", ids.len());
                tree.set_field(node_id, name, FieldValue::seq(ids))?;
            }
        }

        Ok(tree)
    }

    fn text(&self, node: &Node<'_>) -> Result<&'a str, TreeError> {
        node.utf8_text(self.source.as_bytes())
            .map_err(|_| TreeError::InvalidText {
                kind: node.kind().to_string(),
                line: u32::try_from(node.start_position().row + 1).unwrap_or(u32::MAX),
            })
    }
}

fn adopt<'t>(
    tree: &mut SyntaxTree,
    stack: &mut Vec<(Node<'t>, NodeId)>,
    child: Node<'t>,
) -> Result<NodeId, TreeError> {
    let child_id = tree.add_node(node_data(&child)?);
    stack.push((child, child_id));
    Ok(child_id)
}

fn node_data(node: &Node<'_>) -> Result<NodeData, TreeError> {
    let kind = node.kind();
    let start = node.start_position();
    let end = node.end_position();
    let (lineno, col_offset) = line_col(kind, start.row, start.column)?;
    let (end_lineno, end_col_offset) = line_col(kind, end.row, end.column)?;
    Ok(NodeData::new(kind).with_position(Position::span(
        lineno,
        col_offset,
        end_lineno,
        end_col_offset,
    )))
}

/// 1-based line and 0-based column of a tree-sitter point.
pub(crate) fn line_col(kind: &str, row: usize, column: usize) -> Result<(u32, u32), TreeError> {
    let line = u32::try_from(row).ok().and_then(|r| r.checked_add(1));
    match (line, u32::try_from(column).ok()) {
        (Some(line), Some(column)) => Ok((line, column)),
        _ => Err(TreeError::PositionOverflow {
            kind: kind.to_string(),
            row,
            column,
        }),
    }
}

/// Named, non-extra children with their field labels, in source order.
fn named_children<'t>(node: &Node<'t>) -> Vec<(Option<&'static str>, Node<'t>)> {
    let mut children = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && !child.is_extra() {
                children.push((cursor.field_name(), child));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    children
}

/// First ERROR or MISSING node in source order, if the tree has any.
pub fn first_error<'t>(root: Node<'t>) -> Option<Node<'t>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
