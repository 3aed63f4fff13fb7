//! Conversion of Arcade tool definitions into model-facing form

use serde_json::{json, Map, Value};

use crate::protocol::{ToolDefinition, ValueSchema};

/// Model-facing function name for a qualified tool name.
///
/// Function names may not contain dots, so `GoogleNews.SearchNewsStories`
/// becomes `GoogleNews_SearchNewsStories`.
pub fn model_tool_name(qualified_name: &str) -> String {
    qualified_name.replace('.', "_")
}

/// JSON object schema for a tool's input parameters
pub fn input_schema(definition: &ToolDefinition) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in &definition.input.parameters {
        let mut prop = value_schema(&param.value_schema);
        if let (Some(desc), Some(obj)) = (&param.description, prop.as_object_mut()) {
            obj.insert("description".to_string(), Value::String(desc.clone()));
        }
        properties.insert(param.name.clone(), prop);
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn value_schema(schema: &ValueSchema) -> Value {
    let mut out = match schema.val_type.as_str() {
        "array" => {
            let items = schema
                .inner_val_type
                .as_deref()
                .map(json_type)
                .unwrap_or("string");
            json!({ "type": "array", "items": { "type": items } })
        }
        other => json!({ "type": json_type(other) }),
    };

    if let Some(values) = &schema.enum_values {
        let target = if schema.val_type == "array" {
            &mut out["items"]
        } else {
            &mut out
        };
        if let Some(obj) = target.as_object_mut() {
            obj.insert("enum".to_string(), json!(values));
        }
    }

    out
}

fn json_type(val_type: &str) -> &'static str {
    match val_type {
        "integer" => "integer",
        "number" => "number",
        "boolean" => "boolean",
        "array" => "array",
        "json" => "object",
        _ => "string",
    }
}
