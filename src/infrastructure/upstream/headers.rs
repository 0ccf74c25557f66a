//! Browser identity presented to the Caoliao endpoints.
//!
//! The upstream only accepts calls that look like they come from its own web page,
//! so every request carries the same origin, referer and user agent a desktop browser
//! on `cli.im` would send.

use anyhow::Context;
use reqwest::header::{self, HeaderMap, HeaderValue};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0";
pub const DEFAULT_ORIGIN: &str = "https://cli.im";
pub const DEFAULT_REFERER: &str = "https://cli.im/deqr/other";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6";

const ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub origin: String,
    pub referer: String,
    pub accept_language: String,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

impl BrowserProfile {
    /// Headers sent with the multipart upload call.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured value is not a valid header value.
    pub fn upload_headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            value("accept_language", &self.accept_language)?,
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::ORIGIN, value("origin", &self.origin)?);
        headers.insert(header::REFERER, value("referer", &self.referer)?);
        headers.insert(header::USER_AGENT, value("user_agent", &self.user_agent)?);
        Ok(headers)
    }

    /// Headers sent with the form-encoded decode call: the upload set plus the
    /// explicit form content type the upstream expects.
    pub fn decode_headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = self.upload_headers()?;
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(FORM_CONTENT_TYPE),
        );
        Ok(headers)
    }
}

fn value(name: &str, raw: &str) -> anyhow::Result<HeaderValue> {
    HeaderValue::from_str(raw).with_context(|| format!("Invalid browser {} header: {:?}", name, raw))
}
