// ABOUTME: HTTP client for the migration controller's Kubernetes-style API
// ABOUTME: Handles authenticated resource reads, writes, deletes and error mapping

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::models::ResourceSnapshot;
use super::resource::{ResourceDescriptor, ResourceKind};
use crate::error::MigratorError;

/// Remote resource capability the console core depends on.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn get(&self, resource: &ResourceDescriptor, name: &str) -> Result<Value>;

    async fn put(&self, resource: &ResourceDescriptor, name: &str, body: &Value) -> Result<Value>;

    async fn delete(&self, resource: &ResourceDescriptor, name: &str) -> Result<()>;

    /// Items of a collection, taken from the list object's `items`.
    async fn list(&self, resource: &ResourceDescriptor) -> Result<Vec<Value>>;
}

/// Fetch one object of `kind` and capture it as a snapshot.
pub async fn fetch_snapshot<C: ResourceClient + ?Sized>(
    client: &C,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
) -> Result<ResourceSnapshot> {
    let resource = ResourceDescriptor::for_kind(kind, namespace);
    let object = client.get(&resource, name).await?;
    Ok(ResourceSnapshot::from_object(kind.as_str(), &object))
}

pub struct RemoteClient {
    client: Client,
    api_base_url: String,
    token: Option<String>,
}

impl RemoteClient {
    pub fn new(api_base_url: String) -> Result<Self> {
        Self::with_timeout(api_base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(api_base_url: String, timeout: Duration) -> Result<Self> {
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(MigratorError::Validation(format!(
                "API URL must start with http:// or https://, got: {}",
                api_base_url
            ))
            .into());
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self.authorize(request).send().await.map_err(|e| {
            MigratorError::Connection(format!(
                "failed to reach the migration API for {}: {}. The cluster API may be unavailable",
                what, e
            ))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MigratorError::NotFound(what.to_string()).into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Request for {} failed with status {}: {}", what, status, body);
        }

        Ok(response)
    }
}

#[async_trait]
impl ResourceClient for RemoteClient {
    async fn get(&self, resource: &ResourceDescriptor, name: &str) -> Result<Value> {
        let path = resource.item_path(name);
        debug!(path = %path, "GET resource");

        let response = self.send(self.client.get(self.url(&path)), &path).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse resource {}", path))
    }

    async fn put(&self, resource: &ResourceDescriptor, name: &str, body: &Value) -> Result<Value> {
        let path = resource.item_path(name);
        debug!(path = %path, "PUT resource");

        let response = self
            .send(self.client.put(self.url(&path)).json(body), &path)
            .await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse updated resource {}", path))
    }

    async fn delete(&self, resource: &ResourceDescriptor, name: &str) -> Result<()> {
        let path = resource.item_path(name);
        debug!(path = %path, "DELETE resource");

        self.send(self.client.delete(self.url(&path)), &path).await?;
        Ok(())
    }

    async fn list(&self, resource: &ResourceDescriptor) -> Result<Vec<Value>> {
        let path = resource.collection_path();
        debug!(path = %path, "LIST resources");

        let response = self.send(self.client.get(self.url(&path)), &path).await?;
        let mut list: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse resource list {}", path))?;

        match list.get_mut("items").map(Value::take) {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => anyhow::bail!("Resource list {} has a non-array items field", path),
        }
    }
}
