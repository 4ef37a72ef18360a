//! JSON schema builders for MCP tools.

use schemars::{JsonSchema, schema_for};
use serde_json::{Map, Value};

/// Build the input schema of a tool from its argument struct.
pub(crate) fn input_schema<T: JsonSchema>() -> Map<String, Value> {
    let schema = schema_for!(T);
    match serde_json::to_value(schema) {
        Ok(Value::Object(mut map)) => {
            map.remove("$schema");
            map.remove("title");
            map.entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            map
        }
        Ok(_) | Err(_) => {
            tracing::warn!(
                schema = std::any::type_name::<T>(),
                "Falling back to an empty input schema"
            );
            empty_object_schema()
        }
    }
}

/// Schema of a tool without arguments.
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(Map::new()));
    schema
}
