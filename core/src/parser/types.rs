use indextree::NodeId;
use serde_json::Value;

/// Source span of a node. Lines are 1-based, columns are 0-based byte offsets.
///
/// The end coordinates are optional on their own so a partially-known span
/// can still report its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub lineno: u32,
    pub col_offset: u32,
    pub end_lineno: Option<u32>,
    pub end_col_offset: Option<u32>,
}

impl Position {
    pub fn new(lineno: u32, col_offset: u32) -> Self {
        Self {
            lineno,
            col_offset,
            end_lineno: None,
            end_col_offset: None,
        }
    }

    pub fn span(lineno: u32, col_offset: u32, end_lineno: u32, end_col_offset: u32) -> Self {
        Self::new(lineno, col_offset).with_end(end_lineno, end_col_offset)
    }

    pub fn with_end(mut self, end_lineno: u32, end_col_offset: u32) -> Self {
        self.end_lineno = Some(end_lineno);
        self.end_col_offset = Some(end_col_offset);
        self
    }

    /// The position entries in output order, skipping the absent ones.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, u32)> {
        [
            ("lineno", Some(self.lineno)),
            ("end_lineno", self.end_lineno),
            ("col_offset", Some(self.col_offset)),
            ("end_col_offset", self.end_col_offset),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}

/// Value held by a node field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Node(NodeId),
    Sequence(Vec<FieldValue>),
    /// String, number, boolean or null. Arrays and objects are not scalars.
    Scalar(Value),
}

impl FieldValue {
    pub fn seq<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldValue>,
    {
        FieldValue::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn null() -> Self {
        FieldValue::Scalar(Value::Null)
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            FieldValue::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Every node id referenced by this value, including nested sequences.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut pending = vec![self];
        while let Some(value) = pending.pop() {
            match value {
                FieldValue::Node(id) => ids.push(*id),
                FieldValue::Sequence(items) => pending.extend(items.iter().rev()),
                FieldValue::Scalar(_) => {}
            }
        }
        ids
    }
}

impl From<NodeId> for FieldValue {
    fn from(id: NodeId) -> Self {
        FieldValue::Node(id)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(Value::String(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(Value::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Scalar(Value::Bool(value))
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::Sequence(items)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub label: String,
    pub position: Option<Position>,
    pub fields: Vec<(String, FieldValue)>,
}

impl NodeData {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            position: None,
            fields: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}
