//! HTTP client for a running guestbook

use reqwest::redirect::Policy;
use reqwest::StatusCode;

use crate::application::errors::GuestbookError;

/// Talks to a guestbook server; redirects are not followed so the
/// 303 from a submission stays visible
#[derive(Debug, Clone)]
pub struct GuestbookClient {
    http: reqwest::Client,
    base_url: String,
}

/// Status and body of a page fetch
#[derive(Debug, Clone)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

impl GuestbookClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GuestbookError> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn root(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// `GET /`
    pub async fn fetch_page(&self) -> Result<Page, GuestbookError> {
        let response = self.http.get(self.root()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(Page { status, body })
    }

    /// `POST /` with `message=<text>`; returns the raw status
    pub async fn post_message(&self, message: &str) -> Result<StatusCode, GuestbookError> {
        let response = self
            .http
            .post(self.root())
            .form(&[("message", message)])
            .send()
            .await?;
        Ok(response.status())
    }
}
