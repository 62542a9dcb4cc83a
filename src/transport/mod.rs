pub mod http;
pub mod script;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use tracing::{info, instrument, warn};

use crate::config::ReviewsConfig;
use crate::error::Result;
use crate::models::FetchEnvelope;

pub use script::{CallbackRegistry, HttpScriptHost, InjectedScript, ScriptHost, ScriptId};

/// Anything that can produce a review envelope
pub trait EnvelopeSource: Send + Sync {
    fn fetch_envelope(&self) -> impl Future<Output = Result<FetchEnvelope>> + Send;

    /// Endpoint the source reads from, for diagnostics
    fn endpoint(&self) -> &Url;
}

/// Dual-transport client: direct request first, callback script as fallback
pub struct ReviewFetcher<H = HttpScriptHost> {
    client: Client,
    endpoint: Url,
    host: H,
    callbacks: Arc<CallbackRegistry>,
    callback_prefix: String,
    fallback_timeout: Duration,
}

impl ReviewFetcher<HttpScriptHost> {
    pub fn new(endpoint: Url) -> Self {
        let defaults = ReviewsConfig::default();
        let client = Client::new();

        Self {
            host: HttpScriptHost::new(client.clone()),
            client,
            endpoint,
            callbacks: Arc::new(CallbackRegistry::new()),
            callback_prefix: defaults.callback_prefix.clone(),
            fallback_timeout: defaults.fallback_timeout(),
        }
    }

    pub fn from_config(config: &ReviewsConfig) -> anyhow::Result<Self> {
        let fetcher = Self::new(config.endpoint_url()?)
            .with_callback_prefix(&config.callback_prefix)
            .with_fallback_timeout(config.fallback_timeout());
        Ok(fetcher)
    }
}

impl<H: ScriptHost> ReviewFetcher<H> {
    pub fn with_script_host<T: ScriptHost>(self, host: T) -> ReviewFetcher<T> {
        ReviewFetcher {
            client: self.client,
            endpoint: self.endpoint,
            host,
            callbacks: self.callbacks,
            callback_prefix: self.callback_prefix,
            fallback_timeout: self.fallback_timeout,
        }
    }

    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    pub fn with_callback_prefix(mut self, prefix: &str) -> Self {
        self.callback_prefix = prefix.to_string();
        self
    }

    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    pub fn script_host(&self) -> &H {
        &self.host
    }

    /// Fetch the envelope, trying the transports strictly in sequence.
    ///
    /// A failed direct request is logged and never returned; the caller only sees
    /// an error when the fallback fails too, and then it is the fallback's error.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn fetch_review_envelope(&self) -> Result<FetchEnvelope> {
        match http::fetch_direct(&self.client, &self.endpoint).await {
            Ok(envelope) => {
                info!(reviews = envelope.reviews.len(), "Fetched reviews directly");
                return Ok(envelope);
            }
            Err(e) => warn!(error = %e, "Direct request failed, falling back to callback script"),
        }

        let envelope = script::fetch_via_script(
            &self.host,
            &self.callbacks,
            &self.endpoint,
            &self.callback_prefix,
            self.fallback_timeout,
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "Fallback transport failed");
            e
        })?;

        info!(reviews = envelope.reviews.len(), "Fetched reviews through callback script");
        Ok(envelope)
    }
}

impl<H: ScriptHost> EnvelopeSource for ReviewFetcher<H> {
    fn fetch_envelope(&self) -> impl Future<Output = Result<FetchEnvelope>> + Send {
        self.fetch_review_envelope()
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}
