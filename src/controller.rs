use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{FetchError, Result};
use crate::lock;
use crate::models::{RatingSummary, Review, SessionCache, VersionToken};
use crate::transport::EnvelopeSource;

/// Rendering surface for the reviews area.
///
/// Implementations silently skip any part of the output they have no target for.
pub trait ReviewsView: Send + Sync {
    fn set_loading(&self, visible: bool);
    fn hide_error(&self);
    fn show_error(&self, message: &str);
    fn show_no_reviews(&self);
    fn render_summary(&self, summary: &RatingSummary);
    fn render_reviews(&self, reviews: &[Review]);
}

/// Result of one refresh cycle
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated { reviews: usize },
    Unchanged,
    Failed(FetchError),
}

/// Shortest polling period accepted by [`ReviewsController::with_poll_interval`]
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Owns the review cache, change detection and the polling timer
pub struct ReviewsController<S, V> {
    source: S,
    view: V,
    cache: Mutex<SessionCache>,
    poll_interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<S: EnvelopeSource, V: ReviewsView> ReviewsController<S, V> {
    pub fn new(source: S, view: V) -> Self {
        Self {
            source,
            view,
            cache: Mutex::new(SessionCache::default()),
            poll_interval: Duration::from_secs(60),
            timer: Mutex::new(None),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if interval < MIN_POLL_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                "Poll interval too short, using {}s",
                MIN_POLL_INTERVAL.as_secs()
            );
        }
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn cached_reviews(&self) -> Vec<Review> {
        lock(&self.cache).reviews.clone()
    }

    pub fn last_updated(&self) -> Option<VersionToken> {
        lock(&self.cache).last_updated.clone()
    }

    /// Run one fetch cycle and reflect it in the view. Never fails: errors end up
    /// in the view's error banner and in the log.
    ///
    /// Overlapping calls are not deduplicated; the last one to finish wins the cache.
    pub async fn refresh_reviews(&self, show_loading: bool) -> RefreshOutcome {
        if show_loading {
            self.view.set_loading(true);
        }
        self.view.hide_error();

        let outcome = match self.load().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Failed to load reviews");
                self.view.show_error(&e.to_string());
                if lock(&self.cache).is_empty() {
                    self.view.show_no_reviews();
                }
                RefreshOutcome::Failed(e)
            }
        };

        self.view.set_loading(false);
        outcome
    }

    async fn load(&self) -> Result<RefreshOutcome> {
        let envelope = self.source.fetch_envelope().await?.into_result()?;

        {
            let mut cache = lock(&self.cache);
            if cache.is_unchanged(&envelope) {
                debug!("Reviews unchanged, skipping render");
                return Ok(RefreshOutcome::Unchanged);
            }
            cache.replace(&envelope);
        }

        self.view.render_summary(&envelope.summary_or_default());
        self.view.render_reviews(&envelope.reviews);

        info!(count = envelope.reviews.len(), "Reviews updated");

        Ok(RefreshOutcome::Updated {
            reviews: envelope.reviews.len(),
        })
    }

    pub fn is_running(&self) -> bool {
        lock(&self.timer).is_some()
    }

    /// Cancel the polling timer. Safe to call when not running.
    pub fn stop(&self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
            info!("Stopped review polling");
        }
    }
}

impl<S, V> ReviewsController<S, V>
where
    S: EnvelopeSource + 'static,
    V: ReviewsView + 'static,
{
    /// Load once with the loading indicator, then refresh quietly every poll interval
    pub fn start(self: &Arc<Self>) {
        let mut timer = lock(&self.timer);
        if timer.is_some() {
            debug!("Review polling already running");
            return;
        }

        let controller = Arc::clone(self);
        let period = self.poll_interval;
        *timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            controller.refresh_reviews(true).await;
            loop {
                ticker.tick().await;
                controller.refresh_reviews(false).await;
            }
        }));

        info!(interval_secs = period.as_secs(), "Started review polling");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use reqwest::Url;

    use super::*;
    use crate::models::FetchEnvelope;

    /// Source replaying queued results; repeats the last one when the queue runs dry
    pub struct ScriptedSource {
        endpoint: Url,
        queue: Mutex<VecDeque<Result<FetchEnvelope>>>,
        last: Mutex<Option<Result<FetchEnvelope>>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new(results: Vec<Result<FetchEnvelope>>) -> Self {
            Self {
                endpoint: Url::parse("https://example.com/exec").unwrap(),
                queue: Mutex::new(results.into()),
                last: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EnvelopeSource for ScriptedSource {
        fn fetch_envelope(&self) -> impl Future<Output = Result<FetchEnvelope>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.queue.lock().unwrap().pop_front();
            let result = match next {
                Some(result) => {
                    *self.last.lock().unwrap() = Some(result.clone());
                    result
                }
                None => self
                    .last
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| Ok(FetchEnvelope::default())),
            };
            async move { result }
        }

        fn endpoint(&self) -> &Url {
            &self.endpoint
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum ViewCall {
        Loading(bool),
        HideError,
        Error(String),
        NoReviews,
        Summary(RatingSummary),
        Reviews(usize),
    }

    /// View recording every call made on it
    #[derive(Default)]
    pub struct RecordingView {
        pub calls: Mutex<Vec<ViewCall>>,
    }

    impl RecordingView {
        pub fn calls(&self) -> Vec<ViewCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, matcher: impl Fn(&ViewCall) -> bool) -> usize {
            self.calls().iter().filter(|c| matcher(c)).count()
        }

        fn push(&self, call: ViewCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ReviewsView for RecordingView {
        fn set_loading(&self, visible: bool) {
            self.push(ViewCall::Loading(visible));
        }

        fn hide_error(&self) {
            self.push(ViewCall::HideError);
        }

        fn show_error(&self, message: &str) {
            self.push(ViewCall::Error(message.to_string()));
        }

        fn show_no_reviews(&self) {
            self.push(ViewCall::NoReviews);
        }

        fn render_summary(&self, summary: &RatingSummary) {
            self.push(ViewCall::Summary(*summary));
        }

        fn render_reviews(&self, reviews: &[Review]) {
            self.push(ViewCall::Reviews(reviews.len()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingView, ScriptedSource, ViewCall};
    use super::*;
    use crate::models::{FetchEnvelope, ReviewId};

    fn envelope(token: &str) -> FetchEnvelope {
        FetchEnvelope {
            reviews: vec![Review {
                id: ReviewId::Number(1),
                name: "A".to_string(),
                date: "2024-01-01".to_string(),
                rating: 5,
                comment: "Great".to_string(),
            }],
            summary: Some(RatingSummary {
                average: 5.0,
                total: 1,
            }),
            last_updated: Some(VersionToken::Text(token.to_string())),
            error: None,
        }
    }

    fn controller(
        results: Vec<Result<FetchEnvelope>>,
    ) -> ReviewsController<ScriptedSource, RecordingView> {
        ReviewsController::new(ScriptedSource::new(results), RecordingView::default())
    }

    #[tokio::test]
    async fn test_successful_refresh_renders() {
        let ctl = controller(vec![Ok(envelope("v1"))]);

        let outcome = ctl.refresh_reviews(true).await;

        assert_eq!(outcome, RefreshOutcome::Updated { reviews: 1 });
        assert_eq!(
            ctl.view().calls(),
            vec![
                ViewCall::Loading(true),
                ViewCall::HideError,
                ViewCall::Summary(RatingSummary {
                    average: 5.0,
                    total: 1
                }),
                ViewCall::Reviews(1),
                ViewCall::Loading(false),
            ]
        );
        assert_eq!(ctl.cached_reviews().len(), 1);
        assert_eq!(ctl.last_updated(), Some(VersionToken::Text("v1".to_string())));
    }

    #[tokio::test]
    async fn test_identical_envelope_renders_once() {
        let ctl = controller(vec![Ok(envelope("v2")), Ok(envelope("v2"))]);

        ctl.refresh_reviews(true).await;
        let second = ctl.refresh_reviews(false).await;

        assert_eq!(second, RefreshOutcome::Unchanged);
        assert_eq!(ctl.view().count(|c| matches!(c, ViewCall::Reviews(_))), 1);
        assert_eq!(ctl.view().count(|c| matches!(c, ViewCall::Summary(_))), 1);
        // Loading is still hidden on the skipped cycle
        assert_eq!(ctl.view().calls().last(), Some(&ViewCall::Loading(false)));
    }

    #[tokio::test]
    async fn test_new_token_renders_again() {
        let ctl = controller(vec![Ok(envelope("v1")), Ok(envelope("v2"))]);

        ctl.refresh_reviews(true).await;
        ctl.refresh_reviews(false).await;

        assert_eq!(ctl.view().count(|c| matches!(c, ViewCall::Reviews(_))), 2);
    }

    #[tokio::test]
    async fn test_same_token_with_empty_cache_renders() {
        let empty = FetchEnvelope {
            last_updated: Some(VersionToken::Text("v1".to_string())),
            ..Default::default()
        };
        let ctl = controller(vec![Ok(empty.clone()), Ok(empty)]);

        ctl.refresh_reviews(true).await;
        ctl.refresh_reviews(false).await;

        assert_eq!(ctl.view().count(|c| matches!(c, ViewCall::Reviews(0))), 2);
    }

    #[tokio::test]
    async fn test_missing_summary_uses_default() {
        let ctl = controller(vec![Ok(FetchEnvelope {
            summary: None,
            ..envelope("v1")
        })]);

        ctl.refresh_reviews(false).await;

        assert!(ctl
            .view()
            .calls()
            .contains(&ViewCall::Summary(RatingSummary::default())));
    }

    #[tokio::test]
    async fn test_error_envelope_leaves_cache_unchanged() {
        let failing = FetchEnvelope {
            error: Some("Sheet not found".to_string()),
            ..envelope("v9")
        };
        let ctl = controller(vec![Ok(envelope("v1")), Ok(failing)]);

        ctl.refresh_reviews(true).await;
        let outcome = ctl.refresh_reviews(true).await;

        assert_eq!(outcome, RefreshOutcome::Failed(FetchError::Remote("Sheet not found".to_string())));
        assert_eq!(ctl.last_updated(), Some(VersionToken::Text("v1".to_string())));
        assert_eq!(ctl.cached_reviews().len(), 1);
        assert!(ctl.view().calls().contains(&ViewCall::Error("Sheet not found".to_string())));
        // Cache still has data, so no empty-state placeholder
        assert_eq!(ctl.view().count(|c| *c == ViewCall::NoReviews), 0);
    }

    #[tokio::test]
    async fn test_failure_with_empty_cache_shows_placeholder() {
        let ctl = controller(vec![Err(FetchError::Timeout(Duration::from_secs(15)))]);

        let outcome = ctl.refresh_reviews(true).await;

        assert!(matches!(outcome, RefreshOutcome::Failed(FetchError::Timeout(_))));
        assert_eq!(
            ctl.view().calls(),
            vec![
                ViewCall::Loading(true),
                ViewCall::HideError,
                ViewCall::Error("fallback request timed out after 15s".to_string()),
                ViewCall::NoReviews,
                ViewCall::Loading(false),
            ]
        );
        assert!(ctl.cached_reviews().is_empty());
    }

    #[test]
    fn test_quiet_refresh_never_shows_loading() {
        let ctl = controller(vec![Ok(envelope("v1"))]);

        tokio_test::block_on(ctl.refresh_reviews(false));

        assert_eq!(ctl.view().count(|c| *c == ViewCall::Loading(true)), 0);
        assert_eq!(ctl.view().count(|c| *c == ViewCall::Loading(false)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_schedule_and_stop() {
        let ctl = Arc::new(
            controller(vec![Ok(envelope("v1"))]).with_poll_interval(Duration::from_secs(60)),
        );

        ctl.start();
        ctl.start();
        assert!(ctl.is_running());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ctl.source().calls(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ctl.source().calls(), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ctl.source().calls(), 3);

        // Only the eager load shows the indicator
        assert_eq!(ctl.view().count(|c| *c == ViewCall::Loading(true)), 1);
        // Unchanged data rendered once
        assert_eq!(ctl.view().count(|c| matches!(c, ViewCall::Reviews(_))), 1);

        ctl.stop();
        assert!(!ctl.is_running());
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(ctl.source().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_still_loads_and_polls() {
        let ctl = Arc::new(controller(vec![Ok(envelope("v1"))]).with_poll_interval(Duration::ZERO));

        ctl.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ctl.source().calls(), 1);
        assert_eq!(ctl.cached_reviews().len(), 1);

        tokio::time::sleep(MIN_POLL_INTERVAL).await;
        assert_eq!(ctl.source().calls(), 2);
        ctl.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_survives_failures() {
        let ctl = Arc::new(controller(vec![
            Err(FetchError::Network("HTTP 500".to_string())),
            Ok(envelope("v1")),
        ]));

        ctl.start();
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(ctl.source().calls(), 2);
        assert_eq!(ctl.cached_reviews().len(), 1);
        ctl.stop();
    }
}
