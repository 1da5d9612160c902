use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::errors::RegistryError;

/// The one registry operation the catalog needs: subject -> current schema id.
#[async_trait]
pub trait SchemaRegistryClient: Send + Sync {
    async fn latest_schema_id(&self, subject: &str) -> Result<u32, RegistryError>;
}

#[derive(Debug, Deserialize)]
struct LatestSchema {
    id: u32,
}

/// Confluent-compatible registry client over HTTP.
///
/// Only called during startup binding, never on the message path.
pub struct HttpSchemaRegistry {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpSchemaRegistry {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(RegistryError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// `{base}/subjects/{subject}/versions/latest`, with `subject` encoded as
    /// a single path segment.
    fn latest_version_url(&self, subject: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["subjects", subject, "versions", "latest"]);
        }
        url
    }
}

#[async_trait]
impl SchemaRegistryClient for HttpSchemaRegistry {
    async fn latest_schema_id(&self, subject: &str) -> Result<u32, RegistryError> {
        let url = self.latest_version_url(subject);
        tracing::debug!(subject = %subject, url = %url, "Resolving latest schema");

        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(RegistryError::SubjectNotFound(subject.to_string())),
            status if !status.is_success() => Err(RegistryError::Status {
                subject: subject.to_string(),
                status: status.as_u16(),
            }),
            _ => {
                let latest: LatestSchema = response.json().await?;
                Ok(latest.id)
            }
        }
    }
}
