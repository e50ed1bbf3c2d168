//! Signed OCI Identity API client.
//!
//! [`IdentityClient`] implements [`IdentityGateway`] over the Identity REST
//! API. Every request is signed with the profile's API key, list calls
//! follow `opc-next-page` until the listing is exhausted, and HTTP failures
//! are mapped onto [`GatewayError`]. Requests are bounded by a timeout and
//! never retried.

use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use ocipa_core::{
    Compartment, GatewayError, GatewayResult, Group, GroupMembership, IdentityGateway, Policy,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{OciError, OciResult};
use crate::profile::OciProfile;
use crate::signer::RequestSigner;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const NEXT_PAGE_HEADER: &str = "opc-next-page";
const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Options for building an [`IdentityClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Overrides the regional Identity endpoint (including the API version path).
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Error body returned by OCI services.
#[derive(Debug, Deserialize)]
struct ServiceError {
    code: Option<String>,
    message: Option<String>,
}

pub struct IdentityClient {
    http: reqwest::Client,
    base_url: Url,
    signer: RequestSigner,
}

impl IdentityClient {
    pub fn new(base_url: &str, signer: RequestSigner, timeout: Duration) -> OciResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| OciError::configuration(format!("Invalid endpoint {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(OciError::configuration(format!(
                "Invalid endpoint {base_url}: not a base URL"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ocipa/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            signer,
        })
    }

    /// Build a client from an OCI config profile.
    pub fn from_profile(profile: &OciProfile, options: &ClientOptions) -> OciResult<Self> {
        let signer = RequestSigner::from_profile(profile)?;
        let endpoint = options
            .endpoint
            .clone()
            .unwrap_or_else(|| profile.identity_endpoint());
        Self::new(&endpoint, signer, options.timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::protocol(format!("Cannot extend endpoint {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send a signed GET and decode the body, returning the next page token if any.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> GatewayResult<(T, Option<String>)> {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(GatewayError::protocol(format!("URL has no host: {url}"))),
        };
        let target = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        let date = httpdate::fmt_http_date(SystemTime::now());
        let authorization = self
            .signer
            .authorization(&date, "GET", &target, &host)
            .map_err(|e| GatewayError::transient(e.to_string()))?;

        debug!(url = %url, "OCI Identity request");
        let resp = self
            .http
            .get(url.clone())
            .header("date", date.as_str())
            .header("authorization", authorization)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::transient(format!("Request to {url} failed: {e}")))?;

        let status = resp.status();
        let next_page = header_value(&resp, NEXT_PAGE_HEADER);
        let request_id = header_value(&resp, REQUEST_ID_HEADER);
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::transient(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(status_error(status, &body, &url, request_id.as_deref()));
        }

        let value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::protocol(format!("Failed to parse response from {url}: {e}")))?;
        Ok((value, next_page))
    }

    /// Fetch every page of a list endpoint.
    ///
    /// Stops when the service hands back a page token it already returned.
    async fn list_all<T: DeserializeOwned>(
        &self,
        segment: &str,
        query: &[(&str, &str)],
    ) -> GatewayResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let url = {
                let mut params = query.to_vec();
                if let Some(token) = page.as_deref() {
                    params.push(("page", token));
                }
                self.url(&[segment], &params)?
            };
            let (batch, next): (Vec<T>, _) = self.get(url).await?;
            items.extend(batch);

            match next {
                Some(token) if !token.is_empty() => {
                    if !seen.insert(token.clone()) {
                        warn!(segment = %segment, page = %token, "Repeated page token, stopping pagination");
                        break;
                    }
                    page = Some(token);
                }
                _ => break,
            }
        }

        Ok(items)
    }
}

fn header_value(resp: &reqwest::Response, name: &str) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn status_error(status: StatusCode, body: &str, url: &Url, request_id: Option<&str>) -> GatewayError {
    let detail = match serde_json::from_str::<ServiceError>(body) {
        Ok(ServiceError {
            code: Some(code),
            message: Some(message),
        }) => format!("{code}: {message}"),
        Ok(ServiceError {
            code: Some(code), ..
        }) => code,
        _ if body.is_empty() => status.to_string(),
        _ => body.to_string(),
    };
    let detail = match request_id {
        Some(id) => format!("HTTP {} {detail} (opc-request-id {id})", status.as_u16()),
        None => format!("HTTP {} {detail}", status.as_u16()),
    };

    match status {
        StatusCode::NOT_FOUND => GatewayError::not_found(format!("{url}: {detail}")),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::access_denied(detail),
        s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => {
            GatewayError::transient(detail)
        }
        _ => GatewayError::protocol(detail),
    }
}

#[async_trait]
impl IdentityGateway for IdentityClient {
    async fn get_compartment_name(&self, compartment_id: &str) -> GatewayResult<String> {
        let url = self.url(&["compartments", compartment_id], &[])?;
        let (compartment, _): (Compartment, _) = self.get(url).await?;
        Ok(compartment.name)
    }

    async fn list_compartments(&self, tenancy_id: &str) -> GatewayResult<Vec<Compartment>> {
        self.list_all(
            "compartments",
            &[
                ("compartmentId", tenancy_id),
                ("compartmentIdInSubtree", "true"),
                ("accessLevel", "ANY"),
            ],
        )
        .await
    }

    async fn list_user_group_memberships(
        &self,
        tenancy_id: &str,
        user_id: &str,
    ) -> GatewayResult<Vec<GroupMembership>> {
        self.list_all(
            "userGroupMemberships",
            &[("compartmentId", tenancy_id), ("userId", user_id)],
        )
        .await
    }

    async fn get_group(&self, group_id: &str) -> GatewayResult<Group> {
        let url = self.url(&["groups", group_id], &[])?;
        let (group, _) = self.get(url).await?;
        Ok(group)
    }

    async fn list_policies(&self, compartment_id: &str) -> GatewayResult<Vec<Policy>> {
        self.list_all("policies", &[("compartmentId", compartment_id)])
            .await
    }
}
