use crate::{Error, Result};
use async_trait::async_trait;
use fasthar_core::ResourceType;
use fasthar_core::har::Entry;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};

/// An outbound request reproducing a captured entry
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Whether the body is needed; binary resources skip reading it
    pub want_body: bool,
}

impl FetchRequest {
    pub fn from_entry(entry: &Entry) -> Self {
        let resource_type = entry
            .response
            .as_ref()
            .and_then(|r| r.content.as_ref())
            .and_then(|c| c.resource_type.as_deref());

        Self {
            method: entry.request.method.clone(),
            url: entry.request.url.clone(),
            headers: entry
                .request
                .headers
                .iter()
                .map(|h| (h.name.clone(), h.value.clone()))
                .collect(),
            want_body: ResourceType::keeps_body(resource_type),
        }
    }
}

/// What the live response looked like
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    /// Raw `content-length` header, if the server sent one
    pub content_length: Option<String>,
    pub body: Option<String>,
}

/// Issues the outbound request for one entry
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse>;
}

/// [`Fetcher`] backed by a shared `reqwest` connection pool
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert captured headers, dropping what cannot be replayed verbatim.
    ///
    /// HTTP/2 pseudo-headers and invalid names/values are skipped, as is
    /// `content-length` since no request body is replayed.
    fn build_headers(headers: &[(String, String)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            if name.starts_with(':') {
                continue;
            }
            let parsed = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            );
            match parsed {
                (Ok(name), Ok(value)) if name != CONTENT_LENGTH => {
                    map.append(name, value);
                }
                (Ok(_), Ok(_)) => {}
                _ => tracing::debug!("Skipping unreplayable header {}", name),
            }
        }
        map
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidRequest(format!("bad method {:?}", request.method)))?;

        tracing::trace!("Re-fetching {} {}", method, request.url);

        let response = self
            .client
            .request(method, &request.url)
            .headers(Self::build_headers(&request.headers))
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = if request.want_body {
            Some(response.text().await?)
        } else {
            None
        };

        Ok(FetchResponse {
            status,
            content_length,
            body,
        })
    }
}
