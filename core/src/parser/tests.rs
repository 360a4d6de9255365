#[cfg(test)]
mod tests {
    use crate::driver::serialize_source;
    use crate::error::{DriverError, TreeError, WalkError};
    use crate::parser::languages::python::PYTHON;
    use crate::parser::languages::rust::RUST;
    use crate::parser::languages::{
        float_literal, integer_literal, FieldSource, FieldTable, Grammar, Language, CHILDREN_FIELD,
    };
    use crate::parser::serialize::{PositionMode, SerializeOptions};
    use crate::parser::tree::SyntaxTree;
    use crate::parser::types::{FieldValue, NodeData, Position};
    use crate::parser::walk::line_col;
    use crate::types::{ErrorKind, ErrorPayload};
    use serde_json::{json, Value};
    use std::path::Path;

    fn no_positions() -> SerializeOptions {
        SerializeOptions::default().positions(PositionMode::None)
    }

    /// `Module(body=[Pass])` with the spans used by the position tests.
    fn module_with_pass() -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        let module = tree.add_node(NodeData::new("Module").with_position(Position::span(1, 0, 1, 10)));
        let pass = tree.add_node(NodeData::new("Pass").with_position(Position::span(1, 0, 1, 4)));
        tree.set_field(module, "body", FieldValue::seq([pass])).unwrap();
        tree
    }

    // -----------------------------------------------------------------------
    // Walker output
    // -----------------------------------------------------------------------

    #[test]
    fn test_empty_body_module() {
        let mut tree = SyntaxTree::new();
        let module = tree.add_node(NodeData::new("Module"));
        tree.set_field(module, "body", FieldValue::Sequence(vec![]))
            .unwrap();

        let result = tree.to_ast_json(&no_positions()).unwrap();
        assert_eq!(result.text, r#"{ "node": "Module", "body": [ ] }"#);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_module_with_pass() {
        let result = module_with_pass().to_ast_json(&no_positions()).unwrap();
        assert_eq!(
            result.text,
            r#"{ "node": "Module", "body": [ { "node": "Pass" } ] }"#
        );
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_shadow_positions_repeat_keys() {
        let options = SerializeOptions::default().positions(PositionMode::Shadow);
        let result = module_with_pass().to_ast_json(&options).unwrap();

        assert_eq!(
            result.text,
            concat!(
                r#"{ "node": "Module", "lineno": 1, "end_lineno": 1, "col_offset": 0, "end_col_offset": 10, "#,
                r#""lineno": 1, "end_lineno": 1, "col_offset": 0, "end_col_offset": 4, "#,
                r#""body": [ { "node": "Pass", "lineno": 1, "end_lineno": 1, "col_offset": 0, "end_col_offset": 4 } ] }"#,
            )
        );
        assert_eq!(result.text.matches("\"end_col_offset\"").count(), 3);

        // A JSON reader keeps the body-derived occurrence.
        let parsed: Value = serde_json::from_str(&result.text).unwrap();
        assert_eq!(parsed["end_col_offset"], 4);
    }

    #[test]
    fn test_merge_positions_write_each_key_once() {
        let result = module_with_pass()
            .to_ast_json(&SerializeOptions::default())
            .unwrap();

        assert_eq!(
            result.text,
            concat!(
                r#"{ "node": "Module", "lineno": 1, "end_lineno": 1, "col_offset": 0, "end_col_offset": 4, "#,
                r#""body": [ { "node": "Pass", "lineno": 1, "end_lineno": 1, "col_offset": 0, "end_col_offset": 4 } ] }"#,
            )
        );
    }

    #[test]
    fn test_merge_keeps_own_keys_the_body_lacks() {
        let mut tree = SyntaxTree::new();
        let module = tree.add_node(NodeData::new("Module").with_position(Position::span(2, 1, 9, 3)));
        let stmt = tree.add_node(NodeData::new("Expr").with_position(Position::new(4, 6)));
        tree.set_field(module, "body", FieldValue::seq([stmt])).unwrap();

        let result = tree.to_ast_json(&SerializeOptions::default()).unwrap();
        let parsed: Value = serde_json::from_str(&result.text).unwrap();
        assert_eq!(parsed["lineno"], 4);
        assert_eq!(parsed["col_offset"], 6);
        assert_eq!(parsed["end_lineno"], 9);
        assert_eq!(parsed["end_col_offset"], 3);
        assert_eq!(result.text.matches("\"lineno\"").count(), 2);
    }

    #[test]
    fn test_partial_position_skips_absent_keys() {
        let mut tree = SyntaxTree::new();
        tree.add_node(NodeData::new("Name").with_position(Position::new(3, 2)));

        let result = tree.to_ast_json(&SerializeOptions::default()).unwrap();
        assert_eq!(
            result.text,
            r#"{ "node": "Name", "lineno": 3, "col_offset": 2 }"#
        );
    }

    #[test]
    fn test_body_position_needs_node_first_element() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Weird").with_position(Position::span(1, 0, 1, 5)));
        tree.set_field(root, "body", FieldValue::seq(["text"])).unwrap();

        let shadow = SerializeOptions::default().positions(PositionMode::Shadow);
        let result = tree.to_ast_json(&shadow).unwrap();
        assert_eq!(result.text.matches("\"lineno\"").count(), 1);
    }

    #[test]
    fn test_absent_field_is_omitted() {
        let mut tree = SyntaxTree::new();
        let func = tree.add_node(NodeData::new("FunctionDef"));
        tree.set_field(func, "name", FieldValue::from("f")).unwrap();

        let result = tree.to_ast_json(&no_positions()).unwrap();
        assert_eq!(result.text, r#"{ "node": "FunctionDef", "name": "f" }"#);
        assert!(!result.text.contains("returns"));
        assert!(!result.text.contains("null"));
    }

    #[test]
    fn test_scalar_fidelity() {
        let awkward = "say \"hi\"\\\n\tüñí \u{1}";
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Constant"));
        tree.set_field(root, "s", FieldValue::from(awkward)).unwrap();
        tree.set_field(root, "i", FieldValue::from(-42i64)).unwrap();
        tree.set_field(root, "f", FieldValue::Scalar(json!(2.5))).unwrap();
        tree.set_field(root, "b", FieldValue::from(false)).unwrap();
        tree.set_field(root, "n", FieldValue::null()).unwrap();

        let result = tree.to_ast_json(&no_positions()).unwrap();
        let parsed: Value = serde_json::from_str(&result.text).unwrap();
        assert_eq!(
            parsed,
            json!({ "node": "Constant", "s": awkward, "i": -42, "f": 2.5, "b": false, "n": null })
        );
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_field_order_is_insertion_order() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Call"));
        tree.set_field(root, "z", FieldValue::from(1i64)).unwrap();
        tree.set_field(root, "a", FieldValue::from(2i64)).unwrap();
        tree.set_field(root, "m", FieldValue::from(3i64)).unwrap();

        let result = tree.to_ast_json(&no_positions()).unwrap();
        assert_eq!(result.text, r#"{ "node": "Call", "z": 1, "a": 2, "m": 3 }"#);
    }

    #[test]
    fn test_mixed_nested_sequences() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Compare"));
        let left = tree.add_node(NodeData::new("Name"));
        let right = tree.add_node(NodeData::new("Name"));
        let value = FieldValue::Sequence(vec![
            FieldValue::Node(left),
            FieldValue::from("Lt"),
            FieldValue::Sequence(vec![FieldValue::Node(right), FieldValue::Sequence(vec![])]),
        ]);
        tree.set_field(root, "parts", value).unwrap();

        let result = tree.to_ast_json(&no_positions()).unwrap();
        assert_eq!(
            result.text,
            r#"{ "node": "Compare", "parts": [ { "node": "Name" }, "Lt", [ { "node": "Name" }, [ ] ] ] }"#
        );
        assert_eq!(result.count, 3);
        assert_eq!(result.count, tree.reachable_count());
    }

    #[test]
    fn test_count_matches_reachable_nodes() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Module"));
        let mut stmts = Vec::new();
        for i in 0..5 {
            let stmt = tree.add_node(NodeData::new("Expr"));
            let call = tree.add_node(NodeData::new("Call"));
            tree.set_field(call, "args", FieldValue::seq([i as i64])).unwrap();
            tree.set_field(stmt, "value", FieldValue::Node(call)).unwrap();
            stmts.push(stmt);
        }
        tree.set_field(root, "body", FieldValue::seq(stmts)).unwrap();
        // Detached nodes are not part of the walk.
        tree.add_node(NodeData::new("Orphan"));

        let result = tree.to_ast_json(&no_positions()).unwrap();
        assert_eq!(result.count, 11);
        assert_eq!(result.count, tree.reachable_count());
        assert_eq!(result.count, result.text.matches("\"node\":").count());
    }

    #[test]
    fn test_array_scalar_is_a_contract_violation() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Bad"));
        tree.set_field(root, "data", FieldValue::Scalar(json!([1, 2])))
            .unwrap();

        let err = tree.to_ast_json(&no_positions()).unwrap_err();
        assert_eq!(
            err,
            WalkError::ContractViolation {
                path: "Bad.data".to_string(),
                detail: "arrays and objects are not scalar values".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_tree_is_an_error() {
        let tree = SyntaxTree::new();
        assert_eq!(
            tree.to_ast_json(&SerializeOptions::default()),
            Err(WalkError::EmptyTree)
        );
        assert_eq!(tree.reachable_count(), 0);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        const DEPTH: usize = 10_000;
        let mut tree = SyntaxTree::new();
        let mut parent = tree.add_node(NodeData::new("UnaryOp"));
        for _ in 0..DEPTH {
            let child = tree.add_node(NodeData::new("UnaryOp"));
            tree.set_field(parent, "operand", FieldValue::Node(child))
                .unwrap();
            parent = child;
        }

        let result = tree.to_ast_json(&no_positions()).unwrap();
        assert_eq!(result.count, DEPTH + 1);
        assert!(result.text.ends_with(&" }".repeat(DEPTH + 1)));
    }

    // -----------------------------------------------------------------------
    // Tree construction
    // -----------------------------------------------------------------------

    #[test]
    fn test_first_node_is_root() {
        let mut tree = SyntaxTree::new();
        assert!(tree.root().is_none());
        let first = tree.add_node(NodeData::new("Module"));
        tree.add_node(NodeData::new("Other"));
        assert_eq!(tree.root(), Some(first));
    }

    #[test]
    fn test_set_root_rejects_attached_node() {
        let mut tree = module_with_pass();
        let root = tree.root().unwrap();
        let pass = tree.get_node(root).unwrap().field("body").unwrap().node_ids()[0];

        assert_eq!(
            tree.set_root(pass),
            Err(TreeError::AlreadyAttached {
                child: pass,
                parent: root,
            })
        );

        let other = tree.add_node(NodeData::new("Expression"));
        tree.set_root(other).unwrap();
        assert_eq!(tree.root(), Some(other));
        assert_eq!(tree.reachable_count(), 1);
    }

    #[test]
    fn test_root_cannot_be_placed_in_a_field() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Module"));
        let other = tree.add_node(NodeData::new("Expr"));

        assert_eq!(
            tree.set_field(other, "value", FieldValue::Node(root)),
            Err(TreeError::RootAttach(root))
        );
    }

    #[test]
    fn test_node_has_a_single_owner() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Module"));
        let a = tree.add_node(NodeData::new("Expr"));
        let b = tree.add_node(NodeData::new("Expr"));
        let shared = tree.add_node(NodeData::new("Name"));
        tree.set_field(root, "body", FieldValue::seq([a, b])).unwrap();
        tree.set_field(a, "value", FieldValue::Node(shared)).unwrap();

        assert_eq!(
            tree.set_field(b, "value", FieldValue::Node(shared)),
            Err(TreeError::AlreadyAttached {
                child: shared,
                parent: a,
            })
        );
    }

    #[test]
    fn test_duplicate_in_one_value_is_rejected() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Tuple"));
        let elt = tree.add_node(NodeData::new("Name"));

        assert_eq!(
            tree.set_field(root, "elts", FieldValue::seq([elt, elt])),
            Err(TreeError::AlreadyAttached {
                child: elt,
                parent: root,
            })
        );
        assert_eq!(tree.reachable_count(), 1);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut tree = SyntaxTree::new();
        tree.add_node(NodeData::new("Module"));
        let outer = tree.add_node(NodeData::new("Lambda"));
        let inner = tree.add_node(NodeData::new("Lambda"));
        tree.set_field(outer, "body", FieldValue::Node(inner)).unwrap();

        assert_eq!(
            tree.set_field(inner, "body", FieldValue::Node(outer)),
            Err(TreeError::Cycle {
                child: outer,
                owner: inner,
            })
        );
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let mut big = SyntaxTree::new();
        let mut foreign = big.add_node(NodeData::new("Module"));
        for _ in 0..8 {
            foreign = big.add_node(NodeData::new("Pass"));
        }

        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Module"));
        assert_eq!(
            tree.set_field(root, "body", FieldValue::seq([foreign])),
            Err(TreeError::UnknownNode(foreign))
        );
        assert!(tree.get_node(foreign).is_none());
    }

    #[test]
    fn test_replacing_a_field_releases_old_nodes() {
        let mut tree = SyntaxTree::new();
        let root = tree.add_node(NodeData::new("Module"));
        let first = tree.add_node(NodeData::new("Pass"));
        let second = tree.add_node(NodeData::new("Break"));
        tree.set_field(root, "type_ignores", FieldValue::Sequence(vec![]))
            .unwrap();
        tree.set_field(root, "body", FieldValue::seq([first])).unwrap();
        tree.set_field(root, "body", FieldValue::seq([second, first]))
            .unwrap();

        let result = tree.to_ast_json(&no_positions()).unwrap();
        assert_eq!(
            result.text,
            r#"{ "node": "Module", "type_ignores": [ ], "body": [ { "node": "Break" }, { "node": "Pass" } ] }"#
        );

        tree.set_field(root, "body", FieldValue::seq([second])).unwrap();
        assert_eq!(tree.reachable_count(), 2);
        let holder = tree.add_node(NodeData::new("Expr"));
        tree.set_field(holder, "value", FieldValue::Node(first)).unwrap();
    }

    // -----------------------------------------------------------------------
    // Grammar tables and literals
    // -----------------------------------------------------------------------

    const NODE_TYPES: &str = r#"[
        {
            "type": "call",
            "named": true,
            "fields": {
                "function": { "multiple": false, "required": true, "types": [] },
                "arguments": { "multiple": true, "required": false, "types": [] }
            }
        },
        {
            "type": "block",
            "named": true,
            "fields": {},
            "children": { "multiple": true, "required": false, "types": [] }
        },
        { "type": "identifier", "named": true },
        { "type": "(", "named": false }
    ]"#;

    #[test]
    fn test_field_table_from_node_types() {
        let table = FieldTable::from_node_types(NODE_TYPES, |kind| match kind {
            "block" => "body",
            _ => CHILDREN_FIELD,
        })
        .unwrap();

        assert_eq!(table.len(), 3);
        let call: Vec<_> = table.fields("call").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(call, vec!["arguments", "function"]);
        assert!(table.fields("call")[0].multiple);
        assert!(table.fields("call")[1].matches(Some("function")));
        assert!(!table.fields("call")[1].matches(None));

        let block = &table.fields("block")[0];
        assert_eq!(block.name, "body");
        assert_eq!(block.source, FieldSource::Children);
        assert!(block.matches(None));

        assert!(table.is_terminal("identifier"));
        assert!(table.fields("(").is_empty());
    }

    #[test]
    fn test_malformed_node_types() {
        let err = FieldTable::from_node_types("{ not json", |_| CHILDREN_FIELD).unwrap_err();
        assert!(err.to_string().contains("node-types.json"));
    }

    #[test]
    fn test_bundled_grammar_tables_load() {
        for language in [
            Language::Python,
            Language::TypeScript,
            Language::Tsx,
            Language::JavaScript,
            Language::Rust,
        ] {
            let table = language.grammar().field_table().unwrap();
            assert!(!table.is_empty(), "{language:?} has no node kinds");
        }
    }

    #[test]
    fn test_literal_typing() {
        assert_eq!(integer_literal("1_000"), json!(1000));
        assert_eq!(integer_literal("0xFF"), json!(255));
        assert_eq!(integer_literal("0o17"), json!(15));
        assert_eq!(integer_literal("0b101"), json!(5));
        assert_eq!(integer_literal("007"), json!(7));
        assert_eq!(integer_literal("0x"), json!("0x"));
        assert_eq!(integer_literal("10j"), json!("10j"));
        assert_eq!(float_literal("2.5"), json!(2.5));
        assert_eq!(float_literal("1e400"), json!("1e400"));

        assert_eq!(PYTHON.scalar("integer", "42"), json!(42));
        assert_eq!(PYTHON.scalar("none", "None"), Value::Null);
        assert_eq!(PYTHON.scalar("true", "True"), json!(true));
        assert_eq!(PYTHON.scalar("identifier", "x"), json!("x"));
        assert_eq!(RUST.scalar("integer_literal", "42u8"), json!(42));
        assert_eq!(RUST.scalar("boolean_literal", "false"), json!(false));
    }

    #[test]
    fn test_integers_beyond_i64_stay_numbers() {
        let big = integer_literal("99999999999999999999");
        assert!(big.is_number());
        assert_eq!(big.to_string(), "99999999999999999999");

        let hex = integer_literal("0xFFFF_FFFF_FFFF_FFFF_FF");
        assert!(hex.is_number());
        assert_eq!(hex.to_string(), "4722366482869645213695");

        let result = serialize_source(
            "x = 99999999999999999999\n",
            Language::Python,
            &no_positions(),
        )
        .unwrap();
        assert!(result
            .text
            .contains(r#"{ "node": "integer", "value": 99999999999999999999 }"#));
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path(Path::new("a/b.py")), Language::Python);
        assert_eq!(Language::from_path(Path::new("x.TS")), Language::TypeScript);
        assert_eq!(Language::from_path(Path::new("x.tsx")), Language::Tsx);
        assert_eq!(Language::from_path(Path::new("x.mjs")), Language::JavaScript);
        assert_eq!(Language::from_path(Path::new("lib.rs")), Language::Rust);
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::Python);
    }

    // -----------------------------------------------------------------------
    // Parsed sources
    // -----------------------------------------------------------------------

    #[test]
    fn test_python_assignment() {
        let result = serialize_source("x = 1\n", Language::Python, &no_positions()).unwrap();
        let parsed: Value = serde_json::from_str(&result.text).unwrap();

        assert_eq!(parsed["node"], "module");
        let assignment = &parsed["body"][0]["children"][0];
        assert_eq!(assignment["node"], "assignment");
        assert_eq!(assignment["left"]["value"], "x");
        assert_eq!(assignment["right"]["value"], 1);
        assert_eq!(result.count, 5);
        assert_eq!(result.count, result.text.matches("\"node\":").count());
    }

    #[test]
    fn test_python_positions_follow_body() {
        let source = "\n\ndef f():\n    return 1\n";
        let result =
            serialize_source(source, Language::Python, &SerializeOptions::default()).unwrap();
        let parsed: Value = serde_json::from_str(&result.text).unwrap();

        // The module starts where its first statement does.
        assert_eq!(parsed["lineno"], 3);
        assert_eq!(parsed["col_offset"], 0);
        assert_eq!(parsed["body"][0]["node"], "function_definition");
    }

    #[test]
    fn test_python_comments_are_skipped() {
        let result =
            serialize_source("# note\npass\n", Language::Python, &no_positions()).unwrap();
        assert!(!result.text.contains("comment"));
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_python_string_content_keeps_text() {
        let result = serialize_source("s = 'ab'\n", Language::Python, &no_positions()).unwrap();
        assert!(result
            .text
            .contains(r#"{ "node": "string_content", "value": "ab""#));
    }

    #[test]
    fn test_python_syntax_error() {
        let err = serialize_source("def f(:\n", Language::Python, &no_positions()).unwrap_err();
        assert!(matches!(err, DriverError::Parse { .. }));
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_rust_source() {
        let result =
            serialize_source("fn main() { let x = 7; }\n", Language::Rust, &no_positions())
                .unwrap();
        let parsed: Value = serde_json::from_str(&result.text).unwrap();
        assert_eq!(parsed["node"], "source_file");
        assert!(result.text.contains(r#""value": 7"#));
        assert_eq!(result.count, result.text.matches("\"node\":").count());
    }

    #[test]
    fn test_error_kind_mapping() {
        let io = DriverError::Io {
            path: "a.py".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(io.kind(), ErrorKind::IoError);

        let encoding = DriverError::Encoding {
            path: "a.py".into(),
            source: String::from_utf8(vec![0xff]).unwrap_err(),
        };
        assert_eq!(encoding.kind(), ErrorKind::ParseError);
        assert_eq!(DriverError::parse("a.py", "bad").kind(), ErrorKind::ParseError);

        let grammar = DriverError::Grammar(anyhow::anyhow!("node-types.json is malformed"));
        assert_eq!(grammar.kind(), ErrorKind::InternalError);

        let tree = DriverError::from(TreeError::InvalidText {
            kind: "string".to_string(),
            line: 1,
        });
        assert_eq!(tree.kind(), ErrorKind::InternalError);

        let walk = DriverError::from(WalkError::contract("Bad.data", "array"));
        assert_eq!(walk.kind(), ErrorKind::InternalError);
        assert_eq!(DriverError::from(WalkError::EmptyTree).kind(), ErrorKind::InternalError);
    }

    #[test]
    fn test_line_col_rejects_overflow() {
        assert_eq!(line_col("module", 0, 0), Ok((1, 0)));
        assert_eq!(line_col("module", 41, 7), Ok((42, 7)));
        assert_eq!(
            line_col("module", u32::MAX as usize, 0),
            Err(TreeError::PositionOverflow {
                kind: "module".to_string(),
                row: u32::MAX as usize,
                column: 0,
            })
        );
        assert!(line_col("string", 0, u32::MAX as usize + 1).is_err());
    }

    #[test]
    fn test_error_payload_shape() {
        let payload = ErrorPayload::from(ErrorKind::VersionUnsupported);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"errType":"VERSION_UNSUPPORTED"}"#
        );
        assert_eq!(
            serde_json::to_string(&ErrorPayload::from(ErrorKind::IoError)).unwrap(),
            r#"{"errType":"IO_ERROR"}"#
        );
    }
}
