use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{require, ImageRef};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<ImageRef>,
    #[serde(default)]
    pub document_pictures: Vec<ImageRef>,
}

impl Client {
    pub fn from_value(id: &str, value: Value) -> Result<Self> {
        let mut client: Client = serde_json::from_value(value)?;
        client.id = id.to_string();
        Ok(client)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn owned_images(&self) -> Vec<ImageRef> {
        self.picture
            .iter()
            .chain(self.document_pictures.iter())
            .cloned()
            .collect()
    }

    pub fn dial_uri(&self) -> String {
        format!("tel:{}", self.phone)
    }

    /// WhatsApp deep link; the number keeps digits only.
    pub fn whatsapp_uri(&self) -> String {
        let digits: String = self.phone.chars().filter(|c| c.is_ascii_digit()).collect();
        format!("whatsapp://send?phone={digits}")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientDraft {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub picture: Option<ImageRef>,
    pub document_pictures: Vec<ImageRef>,
}

impl ClientDraft {
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "name")?;
        require(&self.address, "address")?;
        require(&self.phone, "phone")?;
        Ok(())
    }

    pub fn into_record(self, id: &str) -> Client {
        Client {
            id: id.to_string(),
            name: self.name,
            address: self.address,
            phone: self.phone,
            picture: self.picture,
            document_pictures: self.document_pictures,
        }
    }

    pub fn to_update_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("name".into(), json!(self.name));
        fields.insert("address".into(), json!(self.address));
        fields.insert("phone".into(), json!(self.phone));
        // null removes a cleared profile picture
        fields.insert("picture".into(), json!(self.picture));
        fields.insert("documentPictures".into(), json!(self.document_pictures));
        fields
    }
}

impl From<&Client> for ClientDraft {
    fn from(c: &Client) -> Self {
        Self {
            name: c.name.clone(),
            address: c.address.clone(),
            phone: c.phone.clone(),
            picture: c.picture.clone(),
            document_pictures: c.document_pictures.clone(),
        }
    }
}
