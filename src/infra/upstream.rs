//! HTTP client for the upstream catalog.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url, header};
use tracing::debug;

use crate::application::repos::{CatalogResource, CatalogSource, FetchError};
use crate::config::UpstreamSettings;

use super::error::InfraError;

/// Fetches catalog resources with a single GET each. No retries.
#[derive(Clone, Debug)]
pub struct HttpCatalogSource {
    client: Client,
    films_url: Url,
    people_url: Url,
}

impl HttpCatalogSource {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::upstream(format!("failed to build http client: {err}")))?;
        Ok(Self {
            client,
            films_url: settings.films_url.clone(),
            people_url: settings.people_url.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("holocron/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, resource: CatalogResource) -> &Url {
        match resource {
            CatalogResource::Films => &self.films_url,
            CatalogResource::People => &self.people_url,
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self, resource: CatalogResource) -> Result<Bytes, FetchError> {
        let url = self.url(resource);

        let response = self
            .client
            .get(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|err| FetchError::Body {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        debug!(
            target = "infra::upstream::fetch",
            resource = %resource,
            status = status.as_u16(),
            bytes = body.len(),
            "upstream resource fetched"
        );
        Ok(body)
    }
}
