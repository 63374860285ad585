// Async HTTP client for the inventory backend REST API.
//
// Base path: /api/
// Auth: none (the backend is reachable on the local network only)

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{
    CategoryResponse, DeviceRequest, DeviceResponse, LocationResponse, MacResponse, OwnerRequest,
    OwnerResponse,
};

// ── Error response shape ─────────────────────────────────────────────

/// FastAPI-style `{"detail": "..."}` or a plain `{"message": "..."}`.
/// `detail` may also be a list of validation entries, hence `Value`.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the inventory REST API.
///
/// Every endpoint lives under `{base}/api/`. Cheap to clone; the inner
/// `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The normalized `.../api/` base this client joins paths onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the base URL with a trailing `/api/`.
    ///
    /// `http://host:8000` and `http://host:8000/api` both become
    /// `http://host:8000/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"devices/5"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok().and_then(|err| {
            match err.detail {
                Some(serde_json::Value::String(detail)) => Some(detail),
                Some(other) if !other.is_null() => Some(other.to_string()),
                _ => err.message,
            }
        });

        let message = parsed.unwrap_or_else(|| {
            if raw.is_empty() {
                status.to_string()
            } else {
                raw
            }
        });

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn list_devices(&self) -> Result<Vec<DeviceResponse>, Error> {
        self.get("devices").await
    }

    pub async fn create_device(&self, body: &DeviceRequest) -> Result<DeviceResponse, Error> {
        self.post("devices", body).await
    }

    pub async fn update_device(
        &self,
        id: u64,
        body: &DeviceRequest,
    ) -> Result<DeviceResponse, Error> {
        self.put(&format!("devices/{id}"), body).await
    }

    pub async fn delete_device(&self, id: u64) -> Result<(), Error> {
        self.delete(&format!("devices/{id}")).await
    }

    // ── Owners ───────────────────────────────────────────────────────

    pub async fn list_owners(&self) -> Result<Vec<OwnerResponse>, Error> {
        self.get("owners").await
    }

    pub async fn create_owner(&self, body: &OwnerRequest) -> Result<OwnerResponse, Error> {
        self.post("owners", body).await
    }

    pub async fn update_owner(&self, id: u64, body: &OwnerRequest) -> Result<OwnerResponse, Error> {
        self.put(&format!("owners/{id}"), body).await
    }

    pub async fn delete_owner(&self, id: u64) -> Result<(), Error> {
        self.delete(&format!("owners/{id}")).await
    }

    // ── Read-only collections ────────────────────────────────────────

    pub async fn list_macs(&self) -> Result<Vec<MacResponse>, Error> {
        self.get("macs").await
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryResponse>, Error> {
        self.get("categories").await
    }

    pub async fn list_locations(&self) -> Result<Vec<LocationResponse>, Error> {
        self.get("locations").await
    }
}
