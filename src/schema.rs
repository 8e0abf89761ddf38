use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    String,
    Integer {
        minimum: Option<i64>,
    },
    StringArray,
    Array {
        items: Box<SchemaNode>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object(Vec<Field>),
    Enum(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub node: SchemaNode,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, node: SchemaNode) -> Self {
        Self {
            name,
            node,
            required: true,
        }
    }

    pub fn optional(name: &'static str, node: SchemaNode) -> Self {
        Self {
            name,
            node,
            required: false,
        }
    }
}

/// Top-level JSON shape a schema expects, used by lenient extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
    Scalar,
}

impl Shape {
    pub fn brackets(self) -> Option<(char, char)> {
        match self {
            Shape::Object => Some(('{', '}')),
            Shape::Array => Some(('[', ']')),
            Shape::Scalar => None,
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Object => value.is_object(),
            Shape::Array => value.is_array(),
            Shape::Scalar => !value.is_object() && !value.is_array(),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Shape::Object => "JSON object",
            Shape::Array => "JSON array",
            Shape::Scalar => "JSON value",
        }
    }
}

impl SchemaNode {
    pub fn array_of(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    pub fn exact_array_of(items: SchemaNode, count: usize) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
            min_items: Some(count),
            max_items: Some(count),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            SchemaNode::Object(_) => Shape::Object,
            SchemaNode::StringArray | SchemaNode::Array { .. } => Shape::Array,
            SchemaNode::String | SchemaNode::Integer { .. } | SchemaNode::Enum(_) => Shape::Scalar,
        }
    }

    pub fn to_json_schema(&self) -> Value {
        match self {
            SchemaNode::String => json!({ "type": "string" }),
            SchemaNode::Integer { minimum } => {
                let mut out = json!({ "type": "integer" });
                if let Some(min) = minimum {
                    out["minimum"] = json!(min);
                }
                out
            }
            SchemaNode::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
            SchemaNode::Array {
                items,
                min_items,
                max_items,
            } => {
                let mut out = json!({ "type": "array" });
                if let Some(min) = min_items {
                    out["minItems"] = json!(min);
                }
                if let Some(max) = max_items {
                    out["maxItems"] = json!(max);
                }
                out["items"] = items.to_json_schema();
                out
            }
            SchemaNode::Object(fields) => {
                let required = fields
                    .iter()
                    .filter(|f| f.required)
                    .map(|f| Value::String(f.name.to_owned()))
                    .collect::<Vec<_>>();
                let mut properties = Map::new();
                for field in fields {
                    properties.insert(field.name.to_owned(), field.node.to_json_schema());
                }
                json!({
                    "type": "object",
                    "required": required,
                    "properties": properties,
                })
            }
            SchemaNode::Enum(values) => json!({ "type": "string", "enum": values }),
        }
    }
}
