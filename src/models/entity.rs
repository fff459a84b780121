//! Observable entities.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::CybsiClient;
use crate::error::Result;
use crate::executor::ApiRequest;
use crate::traits::{Get, Register};

const ENTITIES_PATH: &str = "observable/entities";

/// Type of an observable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "IPAddress")]
    IpAddress,
    DomainName,
    File,
    EmailAddress,
    PhoneNumber,
    Identity,
    #[serde(rename = "URL")]
    Url,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IpAddress => "IPAddress",
            Self::DomainName => "DomainName",
            Self::File => "File",
            Self::EmailAddress => "EmailAddress",
            Self::PhoneNumber => "PhoneNumber",
            Self::Identity => "Identity",
            Self::Url => "URL",
        };
        f.write_str(s)
    }
}

/// Type of a natural entity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKeyType {
    String,
    #[serde(rename = "MD5Hash")]
    Md5Hash,
    #[serde(rename = "SHA1Hash")]
    Sha1Hash,
    #[serde(rename = "SHA256Hash")]
    Sha256Hash,
    #[serde(rename = "IANAID")]
    IanaId,
    #[serde(rename = "NICHandle")]
    NicHandle,
}

impl fmt::Display for EntityKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "String",
            Self::Md5Hash => "MD5Hash",
            Self::Sha1Hash => "SHA1Hash",
            Self::Sha256Hash => "SHA256Hash",
            Self::IanaId => "IANAID",
            Self::NicHandle => "NICHandle",
        };
        f.write_str(s)
    }
}

/// Natural key of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKeyView {
    #[serde(rename = "type")]
    pub key_type: EntityKeyType,
    pub value: String,
}

/// An observable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub keys: Vec<EntityKeyView>,
}

impl EntityView {
    /// Value of the first key of the given type.
    pub fn key(&self, key_type: EntityKeyType) -> Option<&str> {
        self.keys
            .iter()
            .find(|k| k.key_type == key_type)
            .map(|k| k.value.as_str())
    }
}

/// Entity registration form.
///
/// # Example
///
/// ```ignore
/// use cybsi::{EntityForm, EntityKeyType, EntityType, Register};
///
/// let mut form = EntityForm::new(EntityType::DomainName);
/// form.add_key(EntityKeyType::String, "example.com");
/// let entity = form.register(&client).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityForm {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub keys: Vec<EntityKeyView>,
}

impl EntityForm {
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            keys: Vec::new(),
        }
    }

    /// Add a natural key.
    pub fn add_key(&mut self, key_type: EntityKeyType, value: impl Into<String>) -> &mut Self {
        self.keys.push(EntityKeyView {
            key_type,
            value: value.into(),
        });
        self
    }
}

impl Register for EntityForm {
    const PATH: &'static str = ENTITIES_PATH;
}

#[async_trait]
impl Get for EntityView {
    type Id = Uuid;

    #[tracing::instrument(skip(client))]
    async fn get(client: &CybsiClient, id: Uuid) -> Result<Self> {
        let response = client
            .execute(ApiRequest::get(format!("{ENTITIES_PATH}/{id}")))
            .await?;
        response.json()
    }
}
