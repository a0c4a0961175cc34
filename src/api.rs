use serde::de::Deserializer;
use serde_derive::{Deserialize, Serialize};

use crate::logger::get_reporter;
use crate::mime::{APPLICATION_JSON, APPLICATION_XML};
use crate::utils::Result;


const MODULE: &str = "API";

pub const JSON_ENCODE_ERROR: &str = "json encode error";
pub const XML_ENCODE_ERROR: &str = "xml encode error";


/// One row of the `persona` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// One point of sale of the JSON catalog. Field names follow the catalog file,
/// `null` values read as the field's zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "idPuntoVendita", deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(rename = "denominazione", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "indirizzo", default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(rename = "cap", default, deserialize_with = "null_as_default")]
    pub postal_code: i64,
    #[serde(rename = "comune", default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(rename = "codProvincia", default, deserialize_with = "null_as_default")]
    pub province: String,
    #[serde(rename = "urlSito", default, deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(rename = "telefonoPrincipale", default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(rename = "telefonoSecondario", default, deserialize_with = "null_as_default")]
    pub secondary_phone: String,
    #[serde(rename = "email", default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(rename = "latitudine", default, deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(rename = "longitudine", default, deserialize_with = "null_as_default")]
    pub longitude: f64,
    #[serde(rename = "flagFisicoOnline", default, deserialize_with = "null_as_default")]
    pub physical_online: bool,
    #[serde(rename = "idEsercente", default, deserialize_with = "null_as_default")]
    pub merchant_id: i64,
    #[serde(rename = "ragioneSociale", default, deserialize_with = "null_as_default")]
    pub company_name: String,
}

fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let value = <Option<T> as serde::Deserialize>::deserialize(d)?;
    Ok(value.unwrap_or_default())
}


#[derive(Serialize)]
struct XmlList<'a, T: serde::Serialize> {
    #[serde(rename = "item")]
    items: &'a [T],
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Json => APPLICATION_JSON,
            Format::Xml => APPLICATION_XML,
        }
    }

    /// Encode `items` in order. JSON gives a plain array, XML wraps
    /// one `<item>` per record in a `<root>` element.
    pub fn encode<T: serde::Serialize>(&self, root: &str, items: &[T]) -> Result<Vec<u8>> {
        match self {
            Format::Json => to_json(items),
            Format::Xml => to_xml(root, items),
        }
    }
}

pub fn to_json<T: serde::Serialize>(items: &[T]) -> Result<Vec<u8>> {
    serde_json::to_vec(items).map_err(get_reporter(MODULE, "JSON", JSON_ENCODE_ERROR))
}

pub fn to_xml<T: serde::Serialize>(root: &str, items: &[T]) -> Result<Vec<u8>> {
    quick_xml::se::to_string_with_root(root, &XmlList { items })
        .map(String::into_bytes)
        .map_err(get_reporter(MODULE, "XML", XML_ENCODE_ERROR))
}
