//! Types shared by every API section.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Reference to a resource.
///
/// Returned by registration calls and embedded in other views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefView {
    pub uuid: Uuid,
    /// URL of the resource; only present when the client asks the API to
    /// embed object URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Version of a resource, taken from the `ETag` response header.
///
/// Required by edit calls to prevent mid-air collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Information share level, according to the Traffic Light Protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShareLevel {
    /// Disclosure is not limited.
    White,
    /// Limited disclosure, restricted to the community.
    Green,
    /// Limited disclosure, restricted to participants' organizations.
    Amber,
    /// Not for disclosure, restricted to participants only.
    Red,
}

impl fmt::Display for ShareLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::White => "White",
            Self::Green => "Green",
            Self::Amber => "Amber",
            Self::Red => "Red",
        };
        f.write_str(s)
    }
}

/// Edit field that distinguishes "leave unchanged" from "reset".
///
/// `Unset` fields are omitted from the request body, `Null` fields are sent
/// as an explicit JSON `null`. Serialize them with
/// `#[serde(default, skip_serializing_if = "Nullable::is_unset")]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nullable<T> {
    Unset,
    Value(T),
    Null,
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Nullable<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Value to send, `None` for both `Unset` and `Null`.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<T> for Nullable<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Unset | Self::Null => serializer.serialize_none(),
        }
    }
}
