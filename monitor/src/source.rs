//! Endpoint list retrieval
//!
//! The fleet is defined externally: an HTTPS document whose configured field
//! holds an ordered list of `scheme://host:port` strings. The list is fetched
//! fresh at the start of every tick.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::SourceError;
use crate::health::Endpoint;

#[async_trait]
pub trait EndpointSource: Send + Sync {
    async fn fetch_endpoints(&self) -> Result<Vec<Endpoint>, SourceError>;
}

pub struct HttpEndpointSource {
    client: Client,
    url: String,
    field: String,
}

impl HttpEndpointSource {
    pub fn new(url: String, field: String, request_timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SourceError::RequestFailed {
                url: url.clone(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, url, field })
    }
}

#[async_trait]
impl EndpointSource for HttpEndpointSource {
    async fn fetch_endpoints(&self) -> Result<Vec<Endpoint>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::RequestFailed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SourceError::HttpStatus {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidDocument {
                url: self.url.clone(),
                reason: format!("body is not JSON: {}", e),
            })?;

        let endpoints = parse_endpoint_list(&document, &self.field).map_err(|reason| {
            SourceError::InvalidDocument {
                url: self.url.clone(),
                reason,
            }
        })?;

        debug!("Fetched {} endpoints from {}", endpoints.len(), self.url);
        Ok(endpoints)
    }
}

/// Extract endpoints from `document[field]`, keeping source order.
///
/// Unparseable entries are skipped with a warning; duplicate canonical URIs
/// keep their first occurrence.
pub fn parse_endpoint_list(document: &Value, field: &str) -> Result<Vec<Endpoint>, String> {
    let entries = document
        .get(field)
        .ok_or_else(|| format!("missing field '{}'", field))?
        .as_array()
        .ok_or_else(|| format!("field '{}' is not an array", field))?;

    let mut seen = HashSet::new();
    let mut endpoints = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(raw) = entry.as_str() else {
            warn!("Skipping non-string endpoint entry: {}", entry);
            continue;
        };

        match Endpoint::parse(raw) {
            Ok(endpoint) => {
                if seen.insert(endpoint.uri.clone()) {
                    endpoints.push(endpoint);
                } else {
                    debug!("Skipping duplicate endpoint {}", endpoint.uri);
                }
            }
            Err(e) => warn!("Skipping endpoint entry: {}", e),
        }
    }

    Ok(endpoints)
}
