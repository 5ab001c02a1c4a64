use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use super::{require, Client, ImageRef};
use crate::{FleetError, Result};

fn available_by_default() -> bool {
    true
}

/// Numeric form fields arrive as text when the record was saved by the mobile form.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    use serde::de::Error;

    let raw = match Option::<NumberOrText>::deserialize(deserializer)? {
        None => return Ok(T::default()),
        Some(NumberOrText::Number(n)) => n,
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => return Ok(T::default()),
        Some(NumberOrText::Text(text)) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("expected a number, got {text:?}")))?,
    };
    T::try_from(raw).map_err(|_| D::Error::custom(format!("number out of range: {raw}")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motorcycle {
    /// Key of the record in the store; not part of the stored value.
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year: u32,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub odometer: u64,
    #[serde(default)]
    pub pictures: Vec<ImageRef>,
    #[serde(default)]
    pub document_pictures: Vec<ImageRef>,
    /// Display name of the renting client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Canonical reference to the renting client. Older records only carry `client`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

/// Rental status derived from the `client` / `isAvailable` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RentalStatus {
    Available,
    Rented {
        client_id: Option<String>,
        client_name: String,
    },
    /// The two fields disagree; only reachable through writes made outside the rental service.
    Inconsistent,
}

impl Motorcycle {
    pub fn from_value(id: &str, value: Value) -> Result<Self> {
        let mut motorcycle: Motorcycle = serde_json::from_value(value)?;
        motorcycle.id = id.to_string();
        Ok(motorcycle)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn rental_status(&self) -> RentalStatus {
        match (&self.client, self.is_available) {
            (None, true) => RentalStatus::Available,
            (Some(name), false) => RentalStatus::Rented {
                client_id: self.client_id.clone(),
                client_name: name.clone(),
            },
            _ => RentalStatus::Inconsistent,
        }
    }

    pub fn is_rented(&self) -> bool {
        self.client.is_some()
    }

    /// Matches by client id, or by name for records written before ids were stored.
    pub fn is_rented_by(&self, client: &Client) -> bool {
        match (&self.client_id, &self.client) {
            (Some(id), _) => *id == client.id,
            (None, Some(name)) => *name == client.name,
            _ => false,
        }
    }

    /// Every image file this record owns, pictures first.
    pub fn owned_images(&self) -> Vec<ImageRef> {
        self.pictures
            .iter()
            .chain(self.document_pictures.iter())
            .cloned()
            .collect()
    }

    pub fn thumbnail(&self) -> Option<&ImageRef> {
        self.pictures.first()
    }
}

/// Form values for creating or editing a motorcycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotorcycleDraft {
    pub name: String,
    pub brand: String,
    pub year: u32,
    pub kind: String,
    pub color: String,
    pub odometer: u64,
    pub pictures: Vec<ImageRef>,
    pub document_pictures: Vec<ImageRef>,
}

impl MotorcycleDraft {
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "name")?;
        require(&self.brand, "brand")?;
        if self.year == 0 {
            return Err(FleetError::Validation { field: "year" });
        }
        require(&self.kind, "type")?;
        require(&self.color, "color")?;
        Ok(())
    }

    /// Full record for a first write. New motorcycles start available.
    pub fn into_record(self, id: &str) -> Motorcycle {
        Motorcycle {
            id: id.to_string(),
            name: self.name,
            brand: self.brand,
            year: self.year,
            kind: self.kind,
            color: self.color,
            odometer: self.odometer,
            pictures: self.pictures,
            document_pictures: self.document_pictures,
            client: None,
            client_id: None,
            is_available: true,
        }
    }

    /// Partial update for an edit; rental fields are left untouched.
    pub fn to_update_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("name".into(), json!(self.name));
        fields.insert("brand".into(), json!(self.brand));
        fields.insert("year".into(), json!(self.year));
        fields.insert("type".into(), json!(self.kind));
        fields.insert("color".into(), json!(self.color));
        fields.insert("odometer".into(), json!(self.odometer));
        fields.insert("pictures".into(), json!(self.pictures));
        fields.insert("documentPictures".into(), json!(self.document_pictures));
        fields
    }
}

impl From<&Motorcycle> for MotorcycleDraft {
    fn from(m: &Motorcycle) -> Self {
        Self {
            name: m.name.clone(),
            brand: m.brand.clone(),
            year: m.year,
            kind: m.kind.clone(),
            color: m.color.clone(),
            odometer: m.odometer,
            pictures: m.pictures.clone(),
            document_pictures: m.document_pictures.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> MotorcycleDraft {
        MotorcycleDraft {
            name: "CG 160".to_string(),
            brand: "Honda".to_string(),
            year: 2022,
            kind: "street".to_string(),
            color: "red".to_string(),
            odometer: 1200,
            ..Default::default()
        }
    }

    #[test]
    fn test_reads_camel_case_record() {
        let value = json!({
            "name": "Factor",
            "brand": "Yamaha",
            "year": 2020,
            "type": "street",
            "odometer": 5400,
            "pictures": ["/data/images/1.jpg"],
            "documentPictures": [],
            "client": "Ana",
            "clientId": "c1",
            "isAvailable": false
        });

        let m = Motorcycle::from_value("m1", value).unwrap();
        assert_eq!(m.id, "m1");
        assert_eq!(m.kind, "street");
        assert_eq!(m.thumbnail().map(|r| r.as_str()), Some("/data/images/1.jpg"));
        assert_eq!(
            m.rental_status(),
            RentalStatus::Rented {
                client_id: Some("c1".to_string()),
                client_name: "Ana".to_string()
            }
        );
    }

    #[test]
    fn test_reads_numbers_saved_as_text() {
        let value = json!({
            "name": "CG",
            "brand": "Honda",
            "year": "2020",
            "type": "street",
            "color": "red",
            "odometer": "1200",
            "isAvailable": true
        });

        let m = Motorcycle::from_value("1700000000000", value).unwrap();
        assert_eq!(m.year, 2020);
        assert_eq!(m.odometer, 1200);

        // Written back as numbers
        let stored = m.to_value().unwrap();
        assert_eq!(stored["year"], json!(2020));
        assert_eq!(stored["odometer"], json!(1200));
    }

    #[test]
    fn test_blank_or_null_numbers_read_as_zero() {
        let m = Motorcycle::from_value("m4", json!({ "year": "", "odometer": null })).unwrap();
        assert_eq!((m.year, m.odometer), (0, 0));

        assert!(Motorcycle::from_value("m5", json!({ "year": "20x0" })).is_err());
        assert!(Motorcycle::from_value("m6", json!({ "year": 5_000_000_000u64 })).is_err());
    }

    #[test]
    fn test_record_without_rental_fields_is_available() {
        let m = Motorcycle::from_value("m2", json!({ "name": "Biz" })).unwrap();
        assert!(m.is_available);
        assert_eq!(m.rental_status(), RentalStatus::Available);
        assert!(m.pictures.is_empty());
    }

    #[test]
    fn test_mismatched_rental_fields_are_inconsistent() {
        let m = Motorcycle::from_value("m3", json!({ "isAvailable": false })).unwrap();
        assert_eq!(m.rental_status(), RentalStatus::Inconsistent);
    }

    #[test]
    fn test_stored_value_omits_id_and_empty_client() {
        let value = draft().into_record("123").to_value().unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("client").is_none());
        assert_eq!(value["isAvailable"], json!(true));
        assert_eq!(value["type"], json!("street"));
    }

    #[test]
    fn test_validation_names_first_missing_field() {
        let mut d = draft();
        d.brand = "  ".to_string();
        assert!(matches!(d.validate(), Err(FleetError::Validation { field: "brand" })));

        let mut d = draft();
        d.color = String::new();
        assert!(matches!(d.validate(), Err(FleetError::Validation { field: "color" })));

        let mut d = draft();
        d.year = 0;
        assert!(matches!(d.validate(), Err(FleetError::Validation { field: "year" })));

        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_update_fields_skip_rental_state() {
        let fields = draft().to_update_fields();
        assert!(!fields.contains_key("client"));
        assert!(!fields.contains_key("isAvailable"));
        assert_eq!(fields["documentPictures"], json!([]));
    }
}
