use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};

use super::remote::{Remote, RemoteError, RemoteResult};
use crate::storage::Content;

/// A [`Remote`] fetching a single URL over HTTP.
///
/// `200 OK` yields the response body as a stream with its declared length,
/// `404 Not Found` yields absent, and any other status is a failure.
pub struct HttpRemote {
    client: Client,
    url: String,
}

impl HttpRemote {
    /// Create a remote for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Create a remote with a custom reqwest client.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn get(&self) -> RemoteResult {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(RemoteError::failed)?;

        match response.status() {
            StatusCode::OK => {
                let size = response.content_length();
                let stream = response
                    .bytes_stream()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
                Ok(Some(Content::from_stream(stream, size)))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(RemoteError::msg(format!(
                "unexpected status code {} from {}",
                status, self.url
            ))),
        }
    }
}
