use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FetchError, Result};
use crate::lock;
use crate::models::FetchEnvelope;
use crate::transport::http::cache_busted;

/// Pending callbacks, keyed by callback name
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    pending: Mutex<HashMap<String, oneshot::Sender<Value>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` and return the receiving end of its delivery channel
    pub fn register(&self, name: &str) -> oneshot::Receiver<Value> {
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(name.to_string(), tx);
        rx
    }

    /// Deliver a payload to `name`. Returns false if nothing is registered under it.
    pub fn invoke(&self, name: &str, payload: Value) -> bool {
        match lock(&self.pending).remove(name) {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    pub fn deregister(&self, name: &str) -> bool {
        lock(&self.pending).remove(name).is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        lock(&self.pending).contains_key(name)
    }

    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle of an injected script element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(pub u64);

/// A script that has been handed to the host for loading
#[derive(Debug)]
pub struct InjectedScript {
    pub id: ScriptId,
    /// Fires with a message if the script itself fails to load. Dropped without
    /// a value when the script loaded, whether or not it invoked a callback.
    pub load_error: oneshot::Receiver<String>,
}

/// Surface able to load a script and run it against the registered callbacks
pub trait ScriptHost: Send + Sync {
    fn inject(&self, src: Url, callbacks: Arc<CallbackRegistry>) -> InjectedScript;

    /// Remove an injected script. Removing an unknown id is a no-op.
    fn remove(&self, id: ScriptId);
}

/// Script host that retrieves the script over HTTP and interprets the callback call
pub struct HttpScriptHost {
    client: Client,
    next_id: AtomicU64,
    active: Mutex<HashMap<ScriptId, JoinHandle<()>>>,
}

impl HttpScriptHost {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            next_id: AtomicU64::new(1),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Number of injected scripts not yet removed
    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }
}

impl ScriptHost for HttpScriptHost {
    fn inject(&self, src: Url, callbacks: Arc<CallbackRegistry>) -> InjectedScript {
        let id = ScriptId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (error_tx, error_rx) = oneshot::channel();
        let client = self.client.clone();

        let handle = tokio::spawn(async move {
            match load_script(&client, src).await {
                Ok(body) => run_callback_script(&body, &callbacks),
                Err(message) => {
                    let _ = error_tx.send(message);
                }
            }
        });

        lock(&self.active).insert(id, handle);
        InjectedScript {
            id,
            load_error: error_rx,
        }
    }

    fn remove(&self, id: ScriptId) {
        if let Some(handle) = lock(&self.active).remove(&id) {
            handle.abort();
        }
    }
}

async fn load_script(client: &Client, src: Url) -> std::result::Result<String, String> {
    let response = client.get(src).send().await.map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status.as_u16()));
    }

    response.text().await.map_err(|e| e.to_string())
}

fn run_callback_script(body: &str, callbacks: &CallbackRegistry) {
    let Some((name, payload)) = parse_callback_script(body) else {
        warn!(bytes = body.len(), "Fallback script is not a callback invocation");
        return;
    };

    if !callbacks.invoke(&name, payload) {
        warn!(callback = %name, "Fallback script invoked an unknown callback");
    }
}

/// Parse script text of the form `name(<json>);` into the callee and its argument
pub fn parse_callback_script(body: &str) -> Option<(String, Value)> {
    let body = body.trim();
    let body = body.strip_prefix("/**/").unwrap_or(body).trim_start();
    let body = body.trim_end_matches(';').trim_end();

    let open = body.find('(')?;
    let name = body[..open].trim();
    let is_identifier = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.');
    if !is_identifier {
        return None;
    }

    let argument = body[open + 1..].strip_suffix(')')?;
    let payload = serde_json::from_str(argument.trim()).ok()?;
    Some((name.to_string(), payload))
}

/// Deregisters the callback and removes the script when dropped
struct ScriptCleanup<'a, H: ScriptHost> {
    host: &'a H,
    callbacks: &'a CallbackRegistry,
    name: String,
    script: Option<ScriptId>,
}

impl<H: ScriptHost> Drop for ScriptCleanup<'_, H> {
    fn drop(&mut self) {
        self.callbacks.deregister(&self.name);
        if let Some(id) = self.script.take() {
            self.host.remove(id);
        }
        debug!(callback = %self.name, "Cleaned up fallback script");
    }
}

/// Fetch the envelope through an injected callback script
///
/// The endpoint answers `<callback>(<json>)`. A named callback is registered in
/// the [`CallbackRegistry`] before the script is injected through the
/// [`ScriptHost`], and the payload reaches this future through a oneshot channel.
pub async fn fetch_via_script<H: ScriptHost>(
    host: &H,
    callbacks: &Arc<CallbackRegistry>,
    endpoint: &Url,
    callback_prefix: &str,
    timeout: Duration,
) -> Result<FetchEnvelope> {
    let name = format!("{}{}", callback_prefix, Uuid::new_v4().simple());

    // Registered before injection so an immediate invocation cannot be missed
    let delivery = callbacks.register(&name);
    let mut cleanup = ScriptCleanup {
        host,
        callbacks: callbacks.as_ref(),
        name: name.clone(),
        script: None,
    };

    let src = cache_busted(endpoint, Some(&name));
    debug!(callback = %name, "Injecting fallback script");
    let InjectedScript { id, load_error } = host.inject(src, Arc::clone(callbacks));
    cleanup.script = Some(id);

    let load_failed = async move {
        match load_error.await {
            Ok(message) => message,
            Err(_) => std::future::pending::<String>().await,
        }
    };

    let outcome = tokio::time::timeout(timeout, async {
        tokio::select! {
            payload = delivery => payload
                .map_err(|_| FetchError::Load("callback removed before delivery".to_string())),
            message = load_failed => Err(FetchError::Load(message)),
        }
    })
    .await;

    drop(cleanup);

    let payload = match outcome {
        Ok(result) => result?,
        Err(_) => return Err(FetchError::Timeout(timeout)),
    };

    serde_json::from_value(payload)
        .map_err(|e| FetchError::Load(format!("invalid callback payload: {}", e)))
}
