use chrono::Utc;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::{FetchError, Result};
use crate::models::FetchEnvelope;

/// Copy of `endpoint` with a `callback` parameter (if any) and a fresh `t` timestamp
pub fn cache_busted(endpoint: &Url, callback: Option<&str>) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        if let Some(name) = callback {
            query.append_pair("callback", name);
        }
        query.append_pair("t", &Utc::now().timestamp_millis().to_string());
    }
    url
}

/// Primary transport: plain GET returning the JSON envelope
pub async fn fetch_direct(client: &Client, endpoint: &Url) -> Result<FetchEnvelope> {
    let url = cache_busted(endpoint, None);
    debug!(url = %url, "Requesting reviews directly");

    let response = client
        .get(url)
        .header(CACHE_CONTROL, "no-cache")
        .header(PRAGMA, "no-cache")
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Network(format!("HTTP {}", status.as_u16())));
    }

    response
        .json::<FetchEnvelope>()
        .await
        .map_err(|e| FetchError::Network(format!("invalid response body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_busted_keeps_existing_query() {
        let endpoint = Url::parse("https://example.com/exec?sheet=reviews").unwrap();
        let url = cache_busted(&endpoint, None);

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("sheet".to_string(), "reviews".to_string()));
        assert_eq!(pairs[1].0, "t");
        assert!(pairs[1].1.parse::<i64>().is_ok());
    }

    #[test]
    fn test_cache_busted_with_callback() {
        let endpoint = Url::parse("https://example.com/exec").unwrap();
        let url = cache_busted(&endpoint, Some("jsonpCallback_abc"));

        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["callback", "t"]);
        assert!(url.as_str().contains("callback=jsonpCallback_abc"));
    }
}
