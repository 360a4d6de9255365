use ast2json::error::TreeError;
use ast2json::parser::serialize::{PositionMode, SerializeOptions};
use ast2json::parser::tree::SyntaxTree;
use ast2json::parser::types::{FieldValue, NodeData, Position};

/// `print("hi")`, built by hand.
fn build_tree() -> Result<SyntaxTree, TreeError> {
    let mut tree = SyntaxTree::new();

    let module = tree.add_node(NodeData::new("Module").with_position(Position::span(1, 0, 1, 11)));
    let stmt = tree.add_node(NodeData::new("Expr").with_position(Position::span(1, 0, 1, 11)));
    let call = tree.add_node(NodeData::new("Call").with_position(Position::span(1, 0, 1, 11)));
    let func = tree.add_node(NodeData::new("Name").with_position(Position::span(1, 0, 1, 5)));
    let arg = tree.add_node(NodeData::new("Constant").with_position(Position::span(1, 6, 1, 10)));

    tree.set_field(func, "id", FieldValue::from("print"))?;
    tree.set_field(arg, "value", FieldValue::from("hi"))?;
    tree.set_field(call, "func", FieldValue::Node(func))?;
    tree.set_field(call, "args", FieldValue::seq([arg]))?;
    tree.set_field(call, "keywords", FieldValue::Sequence(vec![]))?;
    tree.set_field(stmt, "value", FieldValue::Node(call))?;
    tree.set_field(module, "body", FieldValue::seq([stmt]))?;

    Ok(tree)
}

fn main() {
    let tree = match build_tree() {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    for mode in [PositionMode::None, PositionMode::Merge, PositionMode::Shadow] {
        match tree.to_ast_json(&SerializeOptions::default().positions(mode)) {
            Ok(result) => {
                println!("{:?} ({} nodes):", mode, result.count);
                println!("{}", result.text);
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}
