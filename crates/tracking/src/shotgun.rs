//! REST client for a ShotGrid site.
//!
//! Wraps the `/api/v1` endpoints (client-credential auth, entity search,
//! create, update, retire) using [`reqwest`]. Records come back with
//! `attributes` and `relationships` split apart; [`flatten_record`] merges
//! them into a single field map so links read like any other field.

use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use shotver_core::types::DbId;
use tokio::sync::RwLock;

use crate::store::{Fields, Filter, Record, StoreError, TrackingStore};

/// Content type for `_search` bodies that use array-style filters.
const ARRAY_FILTER_CONTENT_TYPE: &str = "application/vnd+shotgun.api3_array+json";

/// Records requested per search page.
const PAGE_SIZE: usize = 500;

/// Tokens are refreshed this long before the server says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Connection settings for a ShotGrid site.
#[derive(Debug, Clone)]
pub struct ShotgunConfig {
    /// Site URL, e.g. `https://studio.shotgunstudio.com`.
    pub site_url: String,
    /// Name of the API script user.
    pub script_name: String,
    /// Application key of the API script user.
    pub script_key: String,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    entity_type: String,
    id: DbId,
    #[serde(default)]
    attributes: Fields,
    #[serde(default)]
    relationships: Fields,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Vec<RawRecord>,
    #[serde(default)]
    links: PageLinks,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SingleResponse {
    data: RawRecord,
}

/// HTTP client for a single ShotGrid site.
pub struct ShotgunClient {
    client: reqwest::Client,
    config: ShotgunConfig,
    token: RwLock<Option<AccessToken>>,
}

impl ShotgunClient {
    pub fn new(config: ShotgunConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ShotgunConfig) -> Self {
        Self {
            client,
            config,
            token: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/v1/{path}",
            self.config.site_url.trim_end_matches('/')
        )
    }

    fn entity_url(&self, entity_type: &str) -> String {
        self.url(&format!("entity/{}", collection_name(entity_type)))
    }

    /// A valid bearer token, authenticating first if needed.
    async fn access_token(&self) -> Result<String, StoreError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.authenticate().await?;
        let value = fresh.value.clone();
        *self.token.write().await = Some(fresh);
        Ok(value)
    }

    async fn authenticate(&self) -> Result<AccessToken, StoreError> {
        tracing::debug!(script = %self.config.script_name, "Requesting tracking store access token");
        let response = self
            .client
            .post(self.url("auth/access_token"))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.script_name.as_str()),
                ("client_secret", self.config.script_key.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = match Self::parse_response(response).await {
            Err(StoreError::Api { status, body }) if status == 400 || status == 401 => {
                return Err(StoreError::Auth(body));
            }
            other => other?,
        };

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }

    async fn search_page(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
        page_size: usize,
        page: usize,
    ) -> Result<ListResponse, StoreError> {
        let token = self.access_token().await?;
        let body = serde_json::json!({
            "filters": filters.iter().map(Filter::to_value).collect::<Vec<_>>(),
        });

        let response = self
            .client
            .post(format!("{}/_search", self.entity_url(entity_type)))
            .bearer_auth(token)
            .header(CONTENT_TYPE, ARRAY_FILTER_CONTENT_TYPE)
            .query(&[
                ("fields", fields.join(",")),
                ("page[size]", page_size.to_string()),
                ("page[number]", page.to_string()),
            ])
            .body(body.to_string())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Map a 404 on a record URL to [`StoreError::RecordNotFound`].
    fn record_not_found(err: StoreError, entity_type: &str, id: DbId) -> StoreError {
        match err {
            StoreError::Api { status: 404, .. } => StoreError::RecordNotFound {
                entity_type: entity_type.to_string(),
                id,
            },
            other => other,
        }
    }
}

impl TrackingStore for ShotgunClient {
    async fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Vec<Record>, StoreError> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let response = self
                .search_page(entity_type, filters, fields, PAGE_SIZE, page)
                .await?;
            let count = response.data.len();
            records.extend(response.data.into_iter().map(flatten_record));
            if count < PAGE_SIZE || response.links.next.is_none() {
                break;
            }
            page += 1;
        }
        tracing::debug!(entity_type, count = records.len(), "Tracking store search");
        Ok(records)
    }

    async fn find_one(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Option<Record>, StoreError> {
        let response = self.search_page(entity_type, filters, fields, 1, 1).await?;
        Ok(response.data.into_iter().next().map(flatten_record))
    }

    async fn create(&self, entity_type: &str, data: &Fields) -> Result<Record, StoreError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(self.entity_url(entity_type))
            .bearer_auth(token)
            .json(data)
            .send()
            .await?;
        let created: SingleResponse = Self::parse_response(response).await?;
        tracing::info!(entity_type, id = created.data.id, "Created tracking store record");
        Ok(flatten_record(created.data))
    }

    async fn update(
        &self,
        entity_type: &str,
        id: DbId,
        data: &Fields,
    ) -> Result<Record, StoreError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .put(format!("{}/{id}", self.entity_url(entity_type)))
            .bearer_auth(token)
            .json(data)
            .send()
            .await?;
        let updated: SingleResponse = Self::parse_response(response)
            .await
            .map_err(|e| Self::record_not_found(e, entity_type, id))?;
        Ok(flatten_record(updated.data))
    }

    async fn retire(&self, entity_type: &str, id: DbId) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .delete(format!("{}/{id}", self.entity_url(entity_type)))
            .bearer_auth(token)
            .send()
            .await?;
        Self::ensure_success(response)
            .await
            .map_err(|e| Self::record_not_found(e, entity_type, id))?;
        tracing::info!(entity_type, id, "Retired tracking store record");
        Ok(())
    }
}

/// URL collection name of an entity type: `HumanUser` -> `human_users`.
pub fn collection_name(entity_type: &str) -> String {
    let mut name = String::with_capacity(entity_type.len() + 2);
    for (i, c) in entity_type.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                name.push('_');
            }
            name.push(c.to_ascii_lowercase());
        } else {
            name.push(c);
        }
    }
    name.push('s');
    name
}

/// Merge `attributes` and `relationships[*].data` into one field map.
fn flatten_record(raw: RawRecord) -> Record {
    let mut fields = raw.attributes;
    for (name, relationship) in raw.relationships {
        let data = relationship.get("data").cloned().unwrap_or(Value::Null);
        fields.insert(name, data);
    }
    Record {
        entity_type: raw.entity_type,
        id: raw.id,
        fields,
    }
}
