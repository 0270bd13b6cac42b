use super::email::EmailRequest;
use super::errors::ApiError;
use super::routes::{self, Endpoint, ListQuery, Routes};
use crate::config::ApiConfig;
use crate::forms::InspectionRecord;
use crate::lifecycle::types::{FormKind, Role, User};
use crate::observability::api_metrics;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Operations the workflow needs from the forms backend
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FormsApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<User, ApiError>;
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn users_by_role(&self, role: Role) -> Result<Vec<User>, ApiError>;
    async fn list(&self, kind: FormKind, query: ListQuery) -> Result<Vec<InspectionRecord>, ApiError>;
    async fn get(&self, kind: FormKind, id: &str) -> Result<InspectionRecord, ApiError>;
    async fn create(&self, record: &InspectionRecord) -> Result<InspectionRecord, ApiError>;
    async fn update(&self, record: &InspectionRecord) -> Result<InspectionRecord, ApiError>;
    async fn download_pdf(&self, kind: FormKind, id: &str, user_name: &str) -> Result<Vec<u8>, ApiError>;
    async fn email_pdf(
        &self,
        kind: FormKind,
        id: &str,
        user_name: &str,
        request: &EmailRequest,
    ) -> Result<(), ApiError>;
}

/// Rate-limited REST client for the forms backend with a read cache
#[derive(Debug)]
pub struct FormsApiClient {
    http: reqwest::Client,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    cache: Cache<String, Value>,
}

impl FormsApiClient {
    pub fn new(settings: &ApiConfig) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(&settings.base_url).map_err(|_| ApiError::BaseUrl(settings.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(settings.base_url.clone()));
        }

        let per_second = NonZeroU32::new(settings.rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(settings.rate_limit.burst_capacity).unwrap_or(per_second);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst)));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(settings.cache.max_capacity)
            .time_to_live(Duration::from_secs(settings.cache.ttl_seconds))
            .build();

        Ok(Self {
            http,
            base_url,
            rate_limiter,
            cache,
        })
    }

    /// Client with default pacing and caching against `base_url`
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Self::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(&endpoint.segments);
        if !endpoint.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(endpoint.query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    fn request(&self, method: Method, endpoint: &Endpoint) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.request(method, self.url(endpoint)?))
    }

    /// Wait for the rate limiter, send, and turn error statuses into `ApiError`
    async fn send(&self, request: RequestBuilder, endpoint: &Endpoint) -> Result<Response, ApiError> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let metrics = api_metrics();
        metrics.record_request();
        debug!(endpoint = %endpoint, "Sending forms API request");

        let response = request.send().await.map_err(|err| {
            metrics.record_error();
            warn!(endpoint = %endpoint, error = %err, "Forms API request failed");
            ApiError::from(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        metrics.record_error();
        let body = response.text().await.unwrap_or_default();
        warn!(endpoint = %endpoint, status = status.as_u16(), "Forms API returned an error status");
        Err(ApiError::from_status(status, &body))
    }

    async fn get_json(&self, endpoint: Endpoint) -> Result<Value, ApiError> {
        let key = endpoint.to_string();
        if let Some(cached) = self.cache.get(&key).await {
            api_metrics().record_cache_hit();
            debug!("Cache hit for key: {}", key);
            return Ok(cached);
        }
        api_metrics().record_cache_miss();

        let request = self.request(Method::GET, &endpoint)?;
        let value: Value = self.send(request, &endpoint).await?.json().await?;
        self.cache.insert(key, value.clone()).await;
        Ok(value)
    }

    async fn get_records(&self, kind: FormKind, endpoint: Endpoint) -> Result<Vec<InspectionRecord>, ApiError> {
        let values: Vec<Value> = serde_json::from_value(self.get_json(endpoint).await?)?;
        values
            .into_iter()
            .map(|value| InspectionRecord::from_wire(kind, value).map_err(ApiError::from))
            .collect()
    }

    async fn write_record(
        &self,
        method: Method,
        endpoint: Endpoint,
        record: &InspectionRecord,
    ) -> Result<InspectionRecord, ApiError> {
        let kind = record.kind();
        let request = self.request(method, &endpoint)?.json(&record.to_wire()?);
        let saved: Value = self.send(request, &endpoint).await?.json().await?;
        self.invalidate_cache_pattern(&Routes::for_kind(kind).cache_prefix()).await;
        Ok(InspectionRecord::from_wire(kind, saved)?)
    }

    /// Invalidate every cached read whose key contains `pattern`
    pub async fn invalidate_cache_pattern(&self, pattern: &str) {
        let keys_to_remove: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.contains(pattern))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        for key in keys_to_remove {
            self.cache.invalidate(&key).await;
        }

        debug!("Invalidated cache entries matching pattern: {}", pattern);
    }
}

#[async_trait]
impl FormsApi for FormsApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let endpoint = routes::login(username, password);
        let request = self.request(Method::POST, &endpoint)?;
        let user: User = self.send(request, &endpoint).await?.json().await?;
        info!(user = %user.name, role = %user.role, "Logged in");
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(serde_json::from_value(self.get_json(routes::users()).await?)?)
    }

    async fn users_by_role(&self, role: Role) -> Result<Vec<User>, ApiError> {
        Ok(serde_json::from_value(self.get_json(routes::users_by_role(role)).await?)?)
    }

    async fn list(&self, kind: FormKind, query: ListQuery) -> Result<Vec<InspectionRecord>, ApiError> {
        let routes = Routes::for_kind(kind);
        match query {
            ListQuery::All => self.get_records(kind, routes.list()).await,
            ListQuery::ByStatus(status) => self.get_records(kind, routes.by_status(status)).await,
            ListQuery::BySubmitter(name) => match routes.by_submitter(&name) {
                Some(endpoint) => self.get_records(kind, endpoint).await,
                None => {
                    let records = self.get_records(kind, routes.list()).await?;
                    Ok(records
                        .into_iter()
                        .filter(|record| record.envelope.submitted_by.as_deref() == Some(name.as_str()))
                        .collect())
                }
            },
        }
    }

    async fn get(&self, kind: FormKind, id: &str) -> Result<InspectionRecord, ApiError> {
        let value = self.get_json(Routes::for_kind(kind).item(id)).await?;
        Ok(InspectionRecord::from_wire(kind, value)?)
    }

    async fn create(&self, record: &InspectionRecord) -> Result<InspectionRecord, ApiError> {
        let endpoint = Routes::for_kind(record.kind()).list();
        let saved = self.write_record(Method::POST, endpoint, record).await?;
        info!(kind = %saved.kind(), record_id = ?saved.id(), "Created form record");
        Ok(saved)
    }

    async fn update(&self, record: &InspectionRecord) -> Result<InspectionRecord, ApiError> {
        let id = record.id().ok_or(ApiError::MissingId(record.kind()))?;
        let endpoint = Routes::for_kind(record.kind()).item(id);
        let saved = self.write_record(Method::PUT, endpoint, record).await?;
        info!(kind = %saved.kind(), record_id = ?saved.id(), status = %saved.status(), "Updated form record");
        Ok(saved)
    }

    async fn download_pdf(&self, kind: FormKind, id: &str, user_name: &str) -> Result<Vec<u8>, ApiError> {
        let endpoint = Routes::for_kind(kind).pdf(id, user_name);
        let request = self
            .request(Method::GET, &endpoint)?
            .header(reqwest::header::ACCEPT, "application/pdf");
        let bytes = self.send(request, &endpoint).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn email_pdf(
        &self,
        kind: FormKind,
        id: &str,
        user_name: &str,
        request: &EmailRequest,
    ) -> Result<(), ApiError> {
        request.validate()?;
        let endpoint = Routes::for_kind(kind).email(id, user_name);
        let builder = self.request(Method::POST, &endpoint)?.json(request);
        self.send(builder, &endpoint).await?;
        info!(kind = %kind, record_id = %id, to = %request.to, "Emailed form PDF");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_segments_onto_base() {
        let client = FormsApiClient::with_base_url("http://localhost:8080/").unwrap();
        let url = client
            .url(&Routes::for_kind(FormKind::Quality).pdf("3", "Ann Lee"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/incoming-quality-reports/3/pdf/Ann%20Lee"
        );

        let url = client
            .url(&Routes::for_kind(FormKind::Coating).pdf("3", "Ann Lee"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/coating-inspection-reports/3/pdf?userName=Ann+Lee"
        );
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(matches!(
            FormsApiClient::with_base_url("not a url"),
            Err(ApiError::BaseUrl(_))
        ));
        assert!(matches!(
            FormsApiClient::with_base_url("mailto:qa@example.com"),
            Err(ApiError::BaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let client = FormsApiClient::with_base_url("http://localhost:8080").unwrap();
        let record = InspectionRecord::blank(
            FormKind::Printing,
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        assert!(matches!(
            client.update(&record).await,
            Err(ApiError::MissingId(FormKind::Printing))
        ));
    }
}
