//! Assistive-technology catalog model
//!
//! Disability categories, the two record kinds the portal lists (devices and
//! software functionalities), the canonical output schema for each kind and
//! the instructions sent to the model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::SchemaDescriptor;

/// Disability category a catalog view is filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisabilityCategory {
    /// Blindness or severe visual impairment
    Visual,
    /// Deafness or severe hearing impairment
    #[serde(alias = "auditory")]
    Auditiva,
    /// Muteness or severe speech impairment
    #[serde(alias = "speech")]
    Habla,
}

impl DisabilityCategory {
    /// Wire name used by the portal.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditiva => "auditiva",
            Self::Habla => "habla",
        }
    }

    /// Natural-language description used inside prompts.
    pub const fn phrase(&self) -> &'static str {
        match self {
            Self::Visual => "ceguera o discapacidad visual grave",
            Self::Auditiva => "sordera o discapacidad auditiva grave",
            Self::Habla => "mudez o discapacidad del habla grave",
        }
    }
}

impl fmt::Display for DisabilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category or kind name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {what}: {value}")]
pub struct ParseCatalogError {
    what: &'static str,
    value: String,
}

impl FromStr for DisabilityCategory {
    type Err = ParseCatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "visual" => Ok(Self::Visual),
            "auditiva" | "auditory" => Ok(Self::Auditiva),
            "habla" | "speech" => Ok(Self::Habla),
            _ => Err(ParseCatalogError {
                what: "category",
                value: s.to_string(),
            }),
        }
    }
}

/// Which list a catalog view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// Physical assistive devices
    Devices,
    /// Software, apps and operating-system features
    Functionalities,
}

impl CatalogKind {
    /// Wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Functionalities => "functionalities",
        }
    }

    /// How many items the instruction asks for.
    pub const fn item_count(&self) -> usize {
        match self {
            Self::Devices => 5,
            Self::Functionalities => 4,
        }
    }

    /// Top-level key wrapping the list in the model output.
    pub const fn envelope_key(&self) -> &'static str {
        match self {
            Self::Devices => "dispositivos",
            Self::Functionalities => "funcionalidades",
        }
    }

    /// Name of the list attribute of each record.
    pub const fn list_field(&self) -> &'static str {
        match self {
            Self::Devices => "caracteristicas",
            Self::Functionalities => "plataformas",
        }
    }

    /// Legacy action name the portal used for this kind.
    pub const fn legacy_action(&self) -> &'static str {
        match self {
            Self::Devices => "fetchAssistiveDevices",
            Self::Functionalities => "fetchAssistiveFunctionalities",
        }
    }

    /// Canonical schema of a single record of this kind.
    pub fn item_schema(&self) -> SchemaDescriptor {
        let base = SchemaDescriptor::object();
        match self {
            Self::Devices => base
                .property(
                    "nombre",
                    SchemaDescriptor::string().describe("El nombre del dispositivo."),
                )
                .property(
                    "descripcion",
                    SchemaDescriptor::string()
                        .describe("Una breve descripción de para qué sirve el dispositivo."),
                )
                .property(
                    "caracteristicas",
                    SchemaDescriptor::array_of(SchemaDescriptor::string())
                        .describe("Una lista de 3 a 5 características o beneficios clave."),
                )
                .require(["nombre", "descripcion", "caracteristicas"]),
            Self::Functionalities => base
                .property(
                    "nombre",
                    SchemaDescriptor::string()
                        .describe("El nombre de la funcionalidad o aplicación."),
                )
                .property(
                    "descripcion",
                    SchemaDescriptor::string().describe("Una breve descripción de para qué sirve."),
                )
                .property(
                    "plataformas",
                    SchemaDescriptor::array_of(SchemaDescriptor::string()).describe(
                        "Una lista de plataformas donde está disponible (ej. iOS, Android, Windows, macOS).",
                    ),
                )
                .require(["nombre", "descripcion", "plataformas"]),
        }
    }

    /// Canonical schema of the whole model output: `{ <envelope>: [item] }`.
    pub fn envelope_schema(&self) -> SchemaDescriptor {
        SchemaDescriptor::object()
            .property(
                self.envelope_key(),
                SchemaDescriptor::array_of(self.item_schema()),
            )
            .require([self.envelope_key()])
    }

    /// Instruction asking for this kind of list for `category`.
    pub fn prompt(&self, category: DisabilityCategory) -> String {
        let n = self.item_count();
        let phrase = category.phrase();
        let fields = format!("nombre, descripcion, {}", self.list_field());
        match self {
            Self::Devices => format!(
                "Genera una lista de {n} dispositivos de asistencia modernos y populares para personas con {phrase}. \
                 Para cada dispositivo, proporciona su nombre, una descripción y 3-5 características clave. \
                 Campos requeridos: {fields}."
            ),
            Self::Functionalities => format!(
                "Genera una lista de {n} funcionalidades de software, aplicaciones móviles o funciones de sistema operativo \
                 para personas con {phrase}. Para cada una, proporciona su nombre, una descripción y las plataformas \
                 donde está disponible. Campos requeridos: {fields}."
            ),
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruction for the illustrative image of a catalog entry.
pub fn image_prompt(term: &str) -> String {
    format!(
        "Un dibujo lineal simple y claro, en blanco y negro, de un/a {term} sobre un fondo blanco liso. Estilo iconográfico."
    )
}

/// An assistive device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub nombre: String,
    pub descripcion: String,
    pub caracteristicas: Vec<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

/// A software functionality, app or OS feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Functionality {
    pub nombre: String,
    pub descripcion: String,
    pub plataformas: Vec<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

/// One entry of a catalog view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogRecord {
    Device(Device),
    Functionality(Functionality),
}

impl CatalogRecord {
    /// Build an empty record of `kind`.
    pub fn empty(kind: CatalogKind) -> Self {
        match kind {
            CatalogKind::Devices => Self::Device(Device::default()),
            CatalogKind::Functionalities => Self::Functionality(Functionality::default()),
        }
    }

    pub const fn kind(&self) -> CatalogKind {
        match self {
            Self::Device(_) => CatalogKind::Devices,
            Self::Functionality(_) => CatalogKind::Functionalities,
        }
    }

    pub fn nombre(&self) -> &str {
        match self {
            Self::Device(d) => &d.nombre,
            Self::Functionality(f) => &f.nombre,
        }
    }

    pub fn descripcion(&self) -> &str {
        match self {
            Self::Device(d) => &d.descripcion,
            Self::Functionality(f) => &f.descripcion,
        }
    }

    /// Features for devices, platforms for functionalities.
    pub fn attributes(&self) -> &[String] {
        match self {
            Self::Device(d) => &d.caracteristicas,
            Self::Functionality(f) => &f.plataformas,
        }
    }

    pub fn image_url(&self) -> &str {
        match self {
            Self::Device(d) => &d.image_url,
            Self::Functionality(f) => &f.image_url,
        }
    }

    pub fn set_image_url(&mut self, url: impl Into<String>) {
        match self {
            Self::Device(d) => d.image_url = url.into(),
            Self::Functionality(f) => f.image_url = url.into(),
        }
    }

    pub(crate) fn set_text_fields(&mut self, nombre: String, descripcion: String) {
        match self {
            Self::Device(d) => {
                d.nombre = nombre;
                d.descripcion = descripcion;
            }
            Self::Functionality(f) => {
                f.nombre = nombre;
                f.descripcion = descripcion;
            }
        }
    }

    pub(crate) fn set_attributes(&mut self, attributes: Vec<String>) {
        match self {
            Self::Device(d) => d.caracteristicas = attributes,
            Self::Functionality(f) => f.plataformas = attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_parsing_accepts_wire_names_and_aliases() {
        assert_eq!("visual".parse::<DisabilityCategory>(), Ok(DisabilityCategory::Visual));
        assert_eq!("Auditory".parse::<DisabilityCategory>(), Ok(DisabilityCategory::Auditiva));
        assert_eq!("habla".parse::<DisabilityCategory>(), Ok(DisabilityCategory::Habla));
        assert!("motora".parse::<DisabilityCategory>().is_err());

        let c: DisabilityCategory = serde_json::from_value(json!("speech")).unwrap();
        assert_eq!(c, DisabilityCategory::Habla);
    }

    #[test]
    fn prompts_name_category_count_and_fields() {
        let p = CatalogKind::Devices.prompt(DisabilityCategory::Auditiva);
        assert!(p.contains("5 dispositivos"));
        assert!(p.contains("sordera o discapacidad auditiva grave"));
        assert!(p.contains("nombre, descripcion, caracteristicas"));

        let p = CatalogKind::Functionalities.prompt(DisabilityCategory::Visual);
        assert!(p.contains("4 funcionalidades"));
        assert!(p.contains("ceguera"));
        assert!(p.contains("plataformas"));
    }

    #[test]
    fn envelope_schema_wraps_item_schema() {
        let schema = CatalogKind::Devices.envelope_schema().into_value();
        assert_eq!(schema["required"], json!(["dispositivos"]));
        let item = &schema["properties"]["dispositivos"]["items"];
        assert_eq!(item["required"], json!(["nombre", "descripcion", "caracteristicas"]));
        assert_eq!(item["properties"]["caracteristicas"]["type"], "ARRAY");
    }

    #[test]
    fn functionality_schema_has_no_drift_fields() {
        let item = CatalogKind::Functionalities.item_schema().into_value();
        assert!(item["properties"].get("ejemplo").is_none());
        assert!(
            CatalogKind::Devices.item_schema().into_value()["properties"]
                .get("plataformas")
                .is_none()
        );
    }

    #[test]
    fn records_serialize_with_their_canonical_field_names() {
        let mut rec = CatalogRecord::empty(CatalogKind::Functionalities);
        rec.set_text_fields("Lector".into(), "Lee".into());
        rec.set_attributes(vec!["iOS".into()]);
        rec.set_image_url("data:image/jpeg;base64,AA==");
        assert_eq!(
            serde_json::to_value(&rec).unwrap(),
            json!({
                "nombre": "Lector",
                "descripcion": "Lee",
                "plataformas": ["iOS"],
                "imageUrl": "data:image/jpeg;base64,AA=="
            })
        );
    }
}
