//! HTTP resolver for remote logo URLs referenced by generation requests.

use async_trait::async_trait;
use bytes::Bytes;

use crate::application::generation::{FetchedLogo, LogoFetcher, LogoFetchError};

const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;
const DEFAULT_LOGO_MIME: &str = "image/png";

#[derive(Debug, Clone, Default)]
pub struct HttpLogoFetcher {
    client: reqwest::Client,
}

impl HttpLogoFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LogoFetcher for HttpLogoFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedLogo, LogoFetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| LogoFetchError::Fetch(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LogoFetchError::Fetch(format!("status {status}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .unwrap_or_else(|| DEFAULT_LOGO_MIME.to_string());

        let bytes: Bytes = response
            .bytes()
            .await
            .map_err(|err| LogoFetchError::Fetch(err.to_string()))?;
        if bytes.len() > MAX_LOGO_BYTES {
            return Err(LogoFetchError::Fetch(format!(
                "logo exceeds {MAX_LOGO_BYTES} bytes"
            )));
        }

        Ok(FetchedLogo {
            content_type,
            bytes,
        })
    }
}
