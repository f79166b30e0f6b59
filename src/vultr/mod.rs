//! Vultr backend implementation of block storage.
//!
//! Talks to the v1 block storage endpoints, which address volumes by a
//! numeric subscription identifier (`SUBID`) and place them by numeric data
//! centre code (`DCID`).

mod error;
mod types;

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use tracing::debug;

use crate::backend::{BackendFuture, BlockStorage, CreateVolumeParams, RemoteVolume, VolumeStatus};
use crate::config::DriverConfig;
use types::{CreateBlockForm, CreateBlockResponse, DeleteBlockForm, parse_block_list};

pub use error::VultrBackendError;

const LIST_ENDPOINT: &str = "/v1/block/list";
const CREATE_ENDPOINT: &str = "/v1/block/create";
const DELETE_ENDPOINT: &str = "/v1/block/delete";

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// Backend that manages volumes through the Vultr block storage API.
#[derive(Clone)]
pub struct VultrBackend {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for VultrBackend {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("VultrBackend")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl VultrBackend {
    /// Constructs a new backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VultrBackendError::Config`] when the configuration fails
    /// validation.
    pub fn new(config: &DriverConfig) -> Result<Self, VultrBackendError> {
        config.validate()?;
        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            timeout: config.http_timeout(),
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("API-Key", &self.api_key)
            .timeout(self.timeout)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    async fn send(
        &self,
        endpoint: &'static str,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), VultrBackendError> {
        let transport = |err: reqwest::Error| VultrBackendError::Transport {
            endpoint,
            message: err.to_string(),
        };
        let response = self.request(builder).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;
        debug!(endpoint, status = status.as_u16(), "block storage API responded");
        Ok((status, body.to_vec()))
    }

    async fn list_volumes(&self) -> Result<Vec<types::BlockVolume>, VultrBackendError> {
        let (status, body) = self
            .send(LIST_ENDPOINT, HTTP_CLIENT.get(self.url(LIST_ENDPOINT)))
            .await?;
        if !status.is_success() {
            return Err(api_error(LIST_ENDPOINT, status, &body));
        }
        parse_block_list(&body).map_err(|err| VultrBackendError::Decode {
            endpoint: LIST_ENDPOINT,
            message: err.to_string(),
        })
    }

    async fn find_volume(&self, name_or_id: &str) -> Result<Option<RemoteVolume>, VultrBackendError> {
        self.list_volumes()
            .await?
            .into_iter()
            .find(|volume| volume.matches(name_or_id))
            .map(types::BlockVolume::into_remote)
            .transpose()
    }

    async fn create_volume(
        &self,
        params: &CreateVolumeParams,
    ) -> Result<RemoteVolume, VultrBackendError> {
        let form = CreateBlockForm {
            dcid: params.region,
            size_gb: params.size_gb,
            label: &params.label,
        };
        let (status, body) = self
            .send(
                CREATE_ENDPOINT,
                HTTP_CLIENT.post(self.url(CREATE_ENDPOINT)).form(&form),
            )
            .await?;
        if !status.is_success() {
            return Err(api_error(CREATE_ENDPOINT, status, &body));
        }
        let parsed: CreateBlockResponse =
            serde_json::from_slice(&body).map_err(|err| VultrBackendError::Decode {
                endpoint: CREATE_ENDPOINT,
                message: err.to_string(),
            })?;
        Ok(RemoteVolume {
            id: parsed.subid.into_text(),
            size_gb: params.size_gb,
            status: VolumeStatus::Creating,
        })
    }

    async fn delete_volume(&self, id: &str) -> Result<(), VultrBackendError> {
        let form = DeleteBlockForm { subid: id };
        let (status, body) = self
            .send(
                DELETE_ENDPOINT,
                HTTP_CLIENT.post(self.url(DELETE_ENDPOINT)).form(&form),
            )
            .await?;
        if status.is_success() {
            return Ok(());
        }
        if is_missing_volume(status, &body) {
            return Err(VultrBackendError::NotFound { id: id.to_owned() });
        }
        Err(api_error(DELETE_ENDPOINT, status, &body))
    }
}

fn api_error(endpoint: &'static str, status: StatusCode, body: &[u8]) -> VultrBackendError {
    VultrBackendError::Api {
        endpoint,
        status: status.as_u16(),
        body: String::from_utf8_lossy(body).trim().to_owned(),
    }
}

fn is_missing_volume(status: StatusCode, body: &[u8]) -> bool {
    if status == StatusCode::NOT_FOUND {
        return true;
    }
    let text = String::from_utf8_lossy(body).to_ascii_lowercase();
    text.contains("not found") || text.contains("invalid block storage subscription")
}

impl BlockStorage for VultrBackend {
    type Error = VultrBackendError;

    fn lookup<'a>(
        &'a self,
        name_or_id: &'a str,
    ) -> BackendFuture<'a, Option<RemoteVolume>, Self::Error> {
        Box::pin(async move { self.find_volume(name_or_id).await })
    }

    fn create<'a>(
        &'a self,
        params: &'a CreateVolumeParams,
    ) -> BackendFuture<'a, RemoteVolume, Self::Error> {
        Box::pin(async move { self.create_volume(params).await })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.delete_volume(id).await })
    }

    fn is_not_found(error: &Self::Error) -> bool {
        matches!(error, VultrBackendError::NotFound { .. })
    }
}
