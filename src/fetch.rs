//! HTTP retrieval of listing pages and documents.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;
use crate::contract::Fetcher;
use crate::error::FetchError;

/// A fetched markup page. Parsing is deferred so a `Page` can be held across
/// awaits; call [`Page::document`] where the tree is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub url: String,
    pub markup: String,
}

impl Page {
    pub fn new(url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markup: normalize_markup(&markup.into()),
        }
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.markup)
    }

    /// Resolve `href` relative to this page; unparseable input is returned as-is.
    pub fn resolve(&self, href: &str) -> String {
        Url::parse(&self.url)
            .and_then(|base| base.join(href))
            .map(String::from)
            .unwrap_or_else(|_| href.to_string())
    }
}

/// Replace non-breaking spaces, including the `Â\u{a0}` pair left behind when
/// UTF-8 markup was decoded as Latin-1 upstream, with plain spaces.
pub fn normalize_markup(markup: &str) -> String {
    markup.replace("Â\u{a0}", " ").replace('\u{a0}', " ")
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

fn transport(url: &str, e: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<Page, FetchError> {
        debug!(url = %url, "Fetching page");
        let text = self
            .get(url)
            .await?
            .text()
            .await
            .map_err(|e| transport(url, e))?;
        Ok(Page::new(url, text))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "Fetching document bytes");
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| transport(url, e))?;
        Ok(bytes.to_vec())
    }
}
