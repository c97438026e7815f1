//! Output schema descriptors
//!
//! A [`SchemaDescriptor`] declares the shape a generation request expects,
//! in the OpenAPI subset Gemini accepts as `responseSchema`
//! (`type: "OBJECT" | "ARRAY" | "STRING"`). Descriptors are only ever used to
//! raise the odds of compliant output: either sent to the provider as a
//! constraint or rendered into the prompt as a hint. Decoded values are never
//! validated against them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use assistive_gateway::schema::SchemaDescriptor;
//!
//! let item = SchemaDescriptor::object()
//!     .property("nombre", SchemaDescriptor::string().describe("Name"))
//!     .property("caracteristicas", SchemaDescriptor::array_of(SchemaDescriptor::string()))
//!     .require(["nombre", "caracteristicas"]);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Declarative description of an expected JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDescriptor(Value);

impl SchemaDescriptor {
    /// Wrap an existing descriptor value (as sent by a caller).
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// An object with no properties yet.
    pub fn object() -> Self {
        Self(json!({ "type": "OBJECT", "properties": {} }))
    }

    /// A string field.
    pub fn string() -> Self {
        Self(json!({ "type": "STRING" }))
    }

    /// An array whose items follow `items`.
    pub fn array_of(items: SchemaDescriptor) -> Self {
        Self(json!({ "type": "ARRAY", "items": items.0 }))
    }

    /// Attach a human-readable description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        if let Some(obj) = self.0.as_object_mut() {
            obj.insert("description".into(), Value::String(description.into()));
        }
        self
    }

    /// Add (or replace) an object property.
    pub fn property(mut self, name: &str, schema: SchemaDescriptor) -> Self {
        if let Some(obj) = self.0.as_object_mut() {
            let props = obj
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(props) = props.as_object_mut() {
                props.insert(name.to_string(), schema.0);
            }
        }
        self
    }

    /// Mark properties as required.
    pub fn require<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        if let Some(obj) = self.0.as_object_mut() {
            let required = obj
                .entry("required")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Some(list) = required.as_array_mut() {
                for name in names {
                    let name = Value::String(name.to_string());
                    if !list.contains(&name) {
                        list.push(name);
                    }
                }
            }
        }
        self
    }

    /// Borrow the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume into the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Render the descriptor as an instruction suffix for providers that
    /// cannot enforce a schema natively.
    pub fn as_prompt_hint(&self) -> String {
        let schema = serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string());
        format!(
            "\n\nResponde únicamente con un objeto JSON válido, sin texto adicional ni bloques de código, \
             que cumpla este esquema:\n{schema}"
        )
    }
}

impl From<Value> for SchemaDescriptor {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_gemini_shape() {
        let schema = SchemaDescriptor::object()
            .property("nombre", SchemaDescriptor::string().describe("El nombre."))
            .property("tags", SchemaDescriptor::array_of(SchemaDescriptor::string()))
            .require(["nombre", "tags"]);

        assert_eq!(
            schema.into_value(),
            json!({
                "type": "OBJECT",
                "properties": {
                    "nombre": { "type": "STRING", "description": "El nombre." },
                    "tags": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["nombre", "tags"]
            })
        );
    }

    #[test]
    fn require_does_not_duplicate() {
        let schema = SchemaDescriptor::object().require(["a"]).require(["a", "b"]);
        assert_eq!(schema.as_value()["required"], json!(["a", "b"]));
    }

    #[test]
    fn prompt_hint_embeds_schema_text() {
        let hint = SchemaDescriptor::object().require(["nombre"]).as_prompt_hint();
        assert!(hint.contains("\"required\":[\"nombre\"]"));
        assert!(hint.contains("JSON"));
    }

    #[test]
    fn caller_descriptors_round_trip_transparently() {
        let raw = json!({ "type": "object", "properties": { "x": { "type": "number" } } });
        let schema: SchemaDescriptor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&schema).unwrap(), raw);
    }
}
