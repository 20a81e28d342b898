//! Node-tree model
//!
//! The editor exchanges programs as a JSON tree of [`Node`]s: every node has a
//! `type` tag, named ordered child sets and a property map. This module owns
//! that wire shape and its conversion to and from the typed statement model:
//! - [`Node`]: the serde representation of the wire format
//! - [`tags`]: the fixed tag vocabulary
//! - [`ast`]: closed enums for statements and expression tokens
//! - [`convert`]: `Node` ⇄ typed conversion (decoding rejects unknown tags)

pub mod ast;
pub mod convert;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Deepest expression nesting the source reader accepts. Brackets, call
/// arguments, displays, subscripts and attribute chains each add a level.
pub const MAX_NESTING: usize = 200;

/// Deepest block nesting: levels of indentation in source text, nested
/// statement bodies in a node tree.
pub const MAX_BLOCK_NESTING: usize = 100;

/// Deepest expression nesting accepted when decoding a node tree. Sits above
/// anything the source reader can produce.
pub const MAX_TREE_NESTING: usize = 2 * MAX_NESTING + 50;

/// A node of the editor's program tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(rename = "childSets", default)]
    pub child_sets: IndexMap<String, Vec<Node>>,
    #[serde(default)]
    pub properties: IndexMap<String, JsonValue>,
}

impl Node {
    pub fn new(node_type: &str) -> Self {
        Node {
            node_type: node_type.to_string(),
            child_sets: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    /// Builder: attach a child set.
    pub fn with_child_set(mut self, name: &str, children: Vec<Node>) -> Self {
        self.child_sets.insert(name.to_string(), children);
        self
    }

    /// Builder: attach a property.
    pub fn with_property(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn child_set(&self, name: &str) -> Option<&[Node]> {
        self.child_sets.get(name).map(Vec::as_slice)
    }

    pub fn property(&self, key: &str) -> Option<&JsonValue> {
        self.properties.get(key)
    }

    pub fn from_json(text: &str) -> Result<Node, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Tag vocabulary shared by the editor and the compiler.
pub mod tags {
    pub const PYTHON_FILE: &str = "PYTHON_FILE";

    pub const PYTHON_STATEMENT: &str = "PYTHON_STATEMENT";
    pub const PYTHON_EXPRESSION: &str = "PYTHON_EXPRESSION";
    pub const PYTHON_ASSIGNMENT: &str = "PYTHON_ASSIGNMENT";
    pub const PYTHON_IF_STATEMENT: &str = "PYTHON_IF_STATEMENT";
    pub const PYTHON_ELIF_STATEMENT: &str = "PYTHON_ELIF_STATEMENT";
    pub const PYTHON_ELSE_STATEMENT: &str = "PYTHON_ELSE_STATEMENT";
    pub const PYTHON_WHILE_LOOP: &str = "PYTHON_WHILE_LOOP";
    pub const PYTHON_FOR_LOOP: &str = "PYTHON_FOR_LOOP";
    pub const PYTHON_FUNCTION_DECLARATION: &str = "PYTHON_FUNCTION_DECLARATION";
    pub const PYTHON_RETURN: &str = "PYTHON_RETURN";
    pub const PY_BREAK: &str = "PY_BREAK";
    pub const PY_CONTINUE: &str = "PY_CONTINUE";
    pub const PYTHON_IMPORT: &str = "PYTHON_IMPORT";
    pub const PYTHON_FROM_IMPORT: &str = "PYTHON_FROM_IMPORT";
    pub const PYTHON_MODULE_IDENTIFIER: &str = "PYTHON_MODULE_IDENTIFIER";
    pub const PYTHON_MODULE_ATTRIBUTE: &str = "PYTHON_MODULE_ATTRIBUTE";
    pub const PY_COMMENT: &str = "PY_COMMENT";

    pub const PYTHON_BINARY_OPERATOR: &str = "PYTHON_BINARY_OPERATOR";
    pub const NUMERIC_LITERAL: &str = "NUMERIC_LITERAL";
    pub const STRING_LITERAL: &str = "STRING_LITERAL";
    pub const PYTHON_BOOL: &str = "PYTHON_BOOL";
    pub const PYTHON_NONE: &str = "PYTHON_NONE";
    pub const PY_IDENTIFIER: &str = "PY_IDENTIFIER";
    pub const PYTHON_CALL_VARIABLE: &str = "PYTHON_CALL_VARIABLE";
    pub const PYTHON_CALL_MEMBER: &str = "PYTHON_CALL_MEMBER";
    pub const PYTHON_MEMBER: &str = "PYTHON_MEMBER";
    pub const PYTHON_LIST: &str = "PYTHON_LIST";
    pub const PY_TUPLE: &str = "PY_TUPLE";
    pub const PY_SET: &str = "PY_SET";
    pub const PY_DICT: &str = "PY_DICT";
    pub const PY_KEYVALUE: &str = "PY_KEYVALUE";
    pub const PYTHON_SUBSCRIPT: &str = "PYTHON_SUBSCRIPT";
    pub const PY_SLICE: &str = "PY_SLICE";
    pub const PY_SLICE_RANGE: &str = "PY_SLICE_RANGE";
    pub const PY_BRACKET: &str = "PY_BRACKET";
    pub const PY_ARG: &str = "PY_ARG";
    pub const PY_KWARG: &str = "PY_KWARG";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_child_sets_and_properties_default_to_empty() {
        let node = Node::from_json(r#"{"type": "PY_BREAK"}"#).unwrap();
        assert_eq!(node.node_type, tags::PY_BREAK);
        assert!(node.child_sets.is_empty());
        assert!(node.properties.is_empty());
    }

    #[test]
    fn test_json_shape_uses_editor_field_names() {
        let node = Node::new(tags::PY_IDENTIFIER).with_property("identifier", "x");
        let json: JsonValue = serde_json::from_str(&node.to_json()).unwrap();
        assert_eq!(json["type"], "PY_IDENTIFIER");
        assert_eq!(json["properties"]["identifier"], "x");
        assert!(json["childSets"].as_object().unwrap().is_empty());
    }
}
