use crate::domain::model::{Announcement, MatchHistory, StatsResponse, UserData};
use crate::domain::ports::{AuthApi, StatsSource};
use crate::utils::error::{ClientError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_GEO_LOOKUP_URL: &str = "https://ipapi.co/json/";
pub const STATS_STREAM_PATH: &str = "api/ws/stats";

/// Cliente REST del servidor. Todas las rutas son relativas a `base_url`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    timeout: Option<Duration>,
    geo_lookup_url: String,
}

#[derive(Debug, Deserialize)]
struct GeoLookup {
    country_code: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // join() descarta el último segmento si no termina en '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            timeout: None,
            geo_lookup_url: DEFAULT_GEO_LOOKUP_URL.to_string(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_geo_lookup_url(mut self, url: impl Into<String>) -> Self {
        self.geo_lookup_url = url.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// `http` → `ws`, `https` → `wss`
    pub fn stats_stream_url(&self) -> Result<String> {
        let mut url = self.endpoint(STATS_STREAM_PATH)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|_| ClientError::ConfigError {
            message: format!("cannot derive WebSocket URL from {}", self.base_url),
        })?;
        Ok(url.to_string())
    }

    pub fn request(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        tracing::debug!("🌐 {} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.header("Authorization", token);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        Ok(request)
    }

    /// 401 → `Unauthorized`, cualquier otro no-2xx → `HttpStatusError`
    pub async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 {} response status: {}", endpoint, status);

        if status.is_success() {
            Ok(response)
        } else if status.as_u16() == 401 {
            Err(ClientError::Unauthorized {
                endpoint: endpoint.to_string(),
            })
        } else {
            Err(ClientError::HttpStatusError {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            })
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T> {
        let request = self
            .request(Method::GET, path, token)?
            .header("Accept", "application/json");
        let response = self.send(request, path).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn get_text(&self, path: &str, token: Option<&str>) -> Result<String> {
        let request = self.request(Method::GET, path, token)?;
        let response = self.send(request, path).await?;
        Ok(response.text().await?)
    }

    pub async fn post_form<F: Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        form: &F,
    ) -> Result<String> {
        let request = self.request(Method::POST, path, token)?.form(form);
        let response = self.send(request, path).await?;
        Ok(response.text().await?)
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<String> {
        let request = self
            .request(Method::POST, path, token)?
            .header("Accept", "application/json")
            .json(body);
        let response = self.send(request, path).await?;
        Ok(response.text().await?)
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<()> {
        let request = self.request(Method::DELETE, path, token)?;
        self.send(request, path).await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        self.get_json("/api/stats", None).await
    }

    pub async fn my_account(&self, token: &str) -> Result<UserData> {
        self.get_json("/api/my-account", Some(token)).await
    }

    pub async fn admin_home(&self, token: &str) -> Result<serde_json::Value> {
        self.get_json("/api/admin/home", Some(token)).await
    }

    pub async fn announcements(&self) -> Result<Vec<Announcement>> {
        self.get_json("/api/announcements", None).await
    }

    pub async fn match_history(&self, limit: u32) -> Result<MatchHistory> {
        self.get_json(&format!("/api/matches/history?limit={}", limit), None)
            .await
    }

    pub async fn registration_page(&self, endpoint: &str) -> Result<String> {
        self.get_text(endpoint, None).await
    }

    /// Devuelve el status y el HTML de la respuesta
    pub async fn submit_registration(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<(u16, String)> {
        let request = self.request(Method::POST, endpoint, None)?.form(form);
        let response = self.send(request, endpoint).await?;
        let status = response.status().as_u16();
        Ok((status, response.text().await?))
    }

    pub async fn country_code(&self) -> Result<Option<String>> {
        let mut request = self.client.get(&self.geo_lookup_url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let lookup = self
            .send(request, &self.geo_lookup_url)
            .await?
            .json::<GeoLookup>()
            .await?;
        Ok(lookup.country_code)
    }
}

#[async_trait]
impl StatsSource for ApiClient {
    async fn fetch_stats(&self) -> Result<StatsResponse> {
        self.stats().await
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn verify_admin(&self, token: &str) -> Result<()> {
        self.admin_home(token).await.map(|_| ())
    }

    async fn fetch_account(&self, token: &str) -> Result<UserData> {
        self.my_account(token).await
    }

    async fn lookup_country(&self) -> Result<Option<String>> {
        self.country_code().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_relative_paths() {
        let client = ApiClient::new("http://localhost:8080/castolo").unwrap();
        assert_eq!(
            client.endpoint("/api/stats").unwrap().as_str(),
            "http://localhost:8080/castolo/api/stats"
        );

        let root = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            root.endpoint("api/admin/home").unwrap().as_str(),
            "http://localhost:8080/api/admin/home"
        );
    }

    #[test]
    fn test_stats_stream_url_scheme() {
        let plain = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            plain.stats_stream_url().unwrap(),
            "ws://localhost:8080/api/ws/stats"
        );

        let secure = ApiClient::new("https://castolo.example").unwrap();
        assert_eq!(
            secure.stats_stream_url().unwrap(),
            "wss://castolo.example/api/ws/stats"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::UrlError(_))
        ));
    }
}
