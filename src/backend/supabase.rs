/// Supabase storage backend
///
/// Objects go to the storage API (`/storage/v1/object/{bucket}/...`), metadata
/// rows to PostgREST (`/rest/v1/{table}`) and the uploader's identity comes
/// from the auth API (`/auth/v1/user`).

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, error};

use crate::backend::{FileBackend, FileRecord, NewFileRow};
use crate::config::BackendConfig;
use crate::error::BackendError;

/// HTTP client for the Supabase project holding uploaded files
pub struct SupabaseBackend {
    client: Client,
    base_url: Url,
    anon_key: String,
    access_token: Option<String>,
    bucket: String,
    table: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

impl SupabaseBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = Url::parse(&config.url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
            bucket: config.bucket.clone(),
            table: config.table.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(
                segments
                    .iter()
                    .copied()
                    .flat_map(|s| s.split('/'))
                    .filter(|s| !s.is_empty()),
            );
        Ok(url)
    }

    fn object_url(&self, path: &str) -> Result<Url, BackendError> {
        self.endpoint(&["storage", "v1", "object", self.bucket.as_str(), path])
    }

    /// Attach the project key and the session token (anon key when signed out)
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, BackendError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        // Storage reports missing objects as 400 with a not_found payload.
        if status == StatusCode::NOT_FOUND
            || (status == StatusCode::BAD_REQUEST && body.to_ascii_lowercase().contains("not found"))
        {
            return Err(BackendError::NotFound(what.to_string()));
        }

        error!("Backend request for {} failed: {} - {}", what, status, body);
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl FileBackend for SupabaseBackend {
    async fn list_files(&self) -> Result<Vec<FileRecord>, BackendError> {
        let mut url = self.endpoint(&["rest", "v1", self.table.as_str()])?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        debug!("GET {}", url);

        let response = self.send(self.client.get(url), &self.table).await?;
        Ok(response.json().await?)
    }

    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, BackendError> {
        let url = self.object_url(path)?;
        debug!("POST {} ({} bytes)", url, bytes.len());

        let request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, mime_type)
            .header("x-upsert", "false")
            .body(bytes);
        self.send(request, path).await?;
        Ok(path.to_string())
    }

    async fn delete_object(&self, path: &str) -> Result<(), BackendError> {
        let url = self.object_url(path)?;
        debug!("DELETE {}", url);

        self.send(self.client.delete(url), path).await?;
        Ok(())
    }

    async fn insert_file_row(&self, row: NewFileRow) -> Result<FileRecord, BackendError> {
        let url = self.endpoint(&["rest", "v1", self.table.as_str()])?;
        debug!("POST {}", url);

        let request = self
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self.send(request, &self.table).await?;

        let mut rows: Vec<FileRecord> = response.json().await?;
        if rows.is_empty() {
            return Err(BackendError::Storage(format!(
                "insert into {} returned no row",
                self.table
            )));
        }
        Ok(rows.swap_remove(0))
    }

    async fn current_user_id(&self) -> Result<Option<String>, BackendError> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let url = self.endpoint(&["auth", "v1", "user"])?;

        match self.send(self.client.get(url), "current user").await {
            Ok(response) => {
                let user: AuthUser = response.json().await?;
                Ok(Some(user.id))
            }
            Err(BackendError::Status { status: 401, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn download_file_content(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let url = self.object_url(path)?;
        debug!("GET {}", url);

        let response = self.send(self.client.get(url), path).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
