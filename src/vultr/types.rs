//! Wire types for the Vultr block storage API.
//!
//! The v1 API is loose about numeric fields: identifiers and sizes arrive as
//! JSON numbers from some endpoints and as strings from others.

use serde::{Deserialize, Serialize};

use super::{LIST_ENDPOINT, VultrBackendError};
use crate::backend::{RemoteVolume, VolumeStatus};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub(crate) enum Loose {
    Number(u64),
    Text(String),
}

impl Loose {
    pub(crate) fn into_text(self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }

    pub(crate) fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => value.trim().parse().ok(),
        }
    }
}

/// One entry of `GET /v1/block/list`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct BlockVolume {
    #[serde(rename = "SUBID")]
    pub(crate) subid: Loose,
    #[serde(default)]
    pub(crate) size_gb: Option<Loose>,
    #[serde(default)]
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) label: String,
}

impl BlockVolume {
    pub(crate) fn matches(&self, name_or_id: &str) -> bool {
        self.label == name_or_id
            || match &self.subid {
                Loose::Number(value) => value.to_string() == name_or_id,
                Loose::Text(value) => value == name_or_id,
            }
    }

    /// Converts the entry into the backend-neutral shape.
    ///
    /// A size that is missing or not a whole number is a decode failure
    /// rather than a zero-sized volume.
    pub(crate) fn into_remote(self) -> Result<RemoteVolume, VultrBackendError> {
        let id = self.subid.into_text();
        let raw = self.size_gb.ok_or_else(|| VultrBackendError::Decode {
            endpoint: LIST_ENDPOINT,
            message: format!("volume {id} has no size_gb"),
        })?;
        let size_gb = raw.as_u64().ok_or_else(|| VultrBackendError::Decode {
            endpoint: LIST_ENDPOINT,
            message: format!("volume {id} has unreadable size_gb {:?}", raw.into_text()),
        })?;
        Ok(RemoteVolume {
            size_gb,
            status: VolumeStatus::parse(&self.status),
            id,
        })
    }
}

/// Form body of `POST /v1/block/create`.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct CreateBlockForm<'a> {
    #[serde(rename = "DCID")]
    pub(crate) dcid: u32,
    pub(crate) size_gb: u64,
    pub(crate) label: &'a str,
}

/// Response of `POST /v1/block/create`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CreateBlockResponse {
    #[serde(rename = "SUBID")]
    pub(crate) subid: Loose,
}

/// Form body of `POST /v1/block/delete`.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct DeleteBlockForm<'a> {
    #[serde(rename = "SUBID")]
    pub(crate) subid: &'a str,
}

/// Decodes the list response, which is an empty array or an array of volumes.
pub(crate) fn parse_block_list(body: &[u8]) -> Result<Vec<BlockVolume>, serde_json::Error> {
    serde_json::from_slice(body)
}
