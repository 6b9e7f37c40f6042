//! Page fetching and ESPN page extraction

pub mod espn;

use crate::{Result, ScrapeError, ScraperConfig};
use reqwest::{StatusCode, Url};

/// Source of raw page markup
pub trait Fetcher {
    /// Fetch the page at `url` and return its body
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP fetcher sending a browser user-agent
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpFetcher { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("Fetching {}", url);

        let response = self.client.get(url).send()?;
        check_status(url, response.status())?;

        Ok(response.text()?)
    }
}

/// Client and server error statuses fail the fetch
fn check_status(url: &str, status: StatusCode) -> Result<()> {
    if status.is_client_error() || status.is_server_error() {
        return Err(ScrapeError::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Resolve a possibly relative link against the site origin
pub fn resolve_url(base: &str, href: &str) -> Result<String> {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return Ok(href.to_string());
    }

    let base = Url::parse(base)
        .map_err(|e| ScrapeError::Parse(format!("Invalid base URL {}: {}", base, e)))?;
    let url = base
        .join(href)
        .map_err(|e| ScrapeError::Parse(format!("Invalid link {}: {}", href, e)))?;
    Ok(url.to_string())
}
