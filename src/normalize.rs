//! Catalog record normalization.
//!
//! Coerces whatever JSON the model produced into [`CatalogRecord`]s that hold
//! the catalog invariants: `nombre`/`descripcion` are strings and the list
//! attribute is an array of strings. Records missing fields are coerced, never
//! dropped. Pure functions only.

use serde_json::{Map, Value};

use crate::catalog::{CatalogKind, CatalogRecord};

/// Locate the record list inside `value` and normalize every entry.
///
/// Returns `None` when no array can be located at all.
pub fn normalize_catalog(value: &Value, kind: CatalogKind) -> Option<Vec<CatalogRecord>> {
    let items = locate_array(value, kind)?;
    Some(
        items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| normalize_record(item, kind))
            .collect(),
    )
}

/// Normalize a single item into a record of `kind`.
pub fn normalize_record(item: &Value, kind: CatalogKind) -> CatalogRecord {
    let mut record = CatalogRecord::empty(kind);
    match item {
        Value::Object(obj) => {
            record.set_text_fields(
                coerce_string(obj.get("nombre")),
                coerce_string(obj.get("descripcion")),
            );
            record.set_attributes(coerce_string_list(list_attribute(obj, kind)));
            let image = obj
                .get("imageUrl")
                .or_else(|| obj.get("image_url"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            record.set_image_url(image);
        }
        other => record.set_text_fields(coerce_string(Some(other)), String::new()),
    }
    record
}

fn list_attribute(obj: &Map<String, Value>, kind: CatalogKind) -> Option<&Value> {
    let legacy = match kind {
        CatalogKind::Devices => "features",
        CatalogKind::Functionalities => "platforms",
    };
    obj.get(kind.list_field()).or_else(|| obj.get(legacy))
}

fn locate_array(value: &Value, kind: CatalogKind) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => {
            if let Some(Value::Array(items)) = obj.get(kind.envelope_key()) {
                return Some(items);
            }
            if let Some(inner) = obj.get("data") {
                if let Some(items) = locate_array(inner, kind) {
                    return Some(items);
                }
            }
            obj.values().find_map(Value::as_array)
        }
        _ => None,
    }
}

/// Render any JSON value as a string: strings verbatim, null as empty,
/// scalars via `Display`, containers as compact JSON.
pub fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Arrays become lists of strings (nulls skipped); anything else is `[]`.
pub fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| coerce_string(Some(v)))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Device, Functionality};
    use serde_json::json;

    #[test]
    fn envelope_with_complete_records() {
        let value = json!({
            "dispositivos": [
                { "nombre": "Audífono", "descripcion": "Amplifica", "caracteristicas": ["a", "b"] }
            ]
        });
        let records = normalize_catalog(&value, CatalogKind::Devices).unwrap();
        assert_eq!(
            records,
            vec![CatalogRecord::Device(Device {
                nombre: "Audífono".into(),
                descripcion: "Amplifica".into(),
                caracteristicas: vec!["a".into(), "b".into()],
                image_url: String::new(),
            })]
        );
    }

    #[test]
    fn missing_and_malformed_fields_are_coerced() {
        let value = json!({
            "dispositivos": [
                { "nombre": 42 },
                { "descripcion": null, "caracteristicas": "not a list" },
                { "nombre": { "es": "Lupa" }, "caracteristicas": [1, null, true, "x"] }
            ]
        });
        let records = normalize_catalog(&value, CatalogKind::Devices).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].nombre(), "42");
        assert_eq!(records[0].descripcion(), "");
        assert!(records[0].attributes().is_empty());

        assert_eq!(records[1].nombre(), "");
        assert!(records[1].attributes().is_empty());

        assert_eq!(records[2].nombre(), r#"{"es":"Lupa"}"#);
        assert_eq!(records[2].attributes(), ["1", "true", "x"]);
    }

    #[test]
    fn bare_array_and_data_wrapper_are_located() {
        let items = json!([{ "nombre": "VoiceOver", "plataformas": ["iOS"] }]);
        let bare = normalize_catalog(&items, CatalogKind::Functionalities).unwrap();
        let wrapped = normalize_catalog(
            &json!({ "data": { "funcionalidades": items.clone() } }),
            CatalogKind::Functionalities,
        )
        .unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(
            bare[0],
            CatalogRecord::Functionality(Functionality {
                nombre: "VoiceOver".into(),
                descripcion: String::new(),
                plataformas: vec!["iOS".into()],
                image_url: String::new(),
            })
        );
    }

    #[test]
    fn drifted_envelope_key_falls_back_to_first_array() {
        let value = json!({ "items": [{ "nombre": "TalkBack" }], "total": 1 });
        let records = normalize_catalog(&value, CatalogKind::Functionalities).unwrap();
        assert_eq!(records[0].nombre(), "TalkBack");
    }

    #[test]
    fn legacy_list_names_are_accepted() {
        let value = json!([{ "nombre": "Línea braille", "features": ["USB"] }]);
        let records = normalize_catalog(&value, CatalogKind::Devices).unwrap();
        assert_eq!(records[0].attributes(), ["USB"]);
    }

    #[test]
    fn string_items_become_names_and_nulls_are_skipped() {
        let value = json!(["Bastón inteligente", null]);
        let records = normalize_catalog(&value, CatalogKind::Devices).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].nombre(), "Bastón inteligente");
    }

    #[test]
    fn image_url_is_kept_when_present() {
        let value = json!([{ "nombre": "x", "imageUrl": "data:image/png;base64,AA" }]);
        let records = normalize_catalog(&value, CatalogKind::Devices).unwrap();
        assert_eq!(records[0].image_url(), "data:image/png;base64,AA");
    }

    #[test]
    fn no_array_anywhere_is_none() {
        assert!(normalize_catalog(&json!({ "mensaje": "hola" }), CatalogKind::Devices).is_none());
        assert!(normalize_catalog(&json!("texto"), CatalogKind::Devices).is_none());
    }
}
