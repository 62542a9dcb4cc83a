// End-to-end refresh cycles: endpoint -> dual transport -> change detection -> DOM.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::Url;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use reviews_widget::dom::site_skeleton;
use reviews_widget::dom::view::{ERROR_ID, ITEM_CLASS, LIST_ID, LOADING_ID, NO_REVIEWS_ID};
use reviews_widget::{
    Document, DomView, RatingSummary, RefreshOutcome, Review, ReviewFetcher, ReviewsController,
    ReviewsView,
};

/// DomView that counts render passes
struct CountingView {
    inner: DomView,
    renders: AtomicUsize,
}

impl CountingView {
    fn new(document: Document) -> Self {
        Self {
            inner: DomView::new(document),
            renders: AtomicUsize::new(0),
        }
    }

    fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl ReviewsView for CountingView {
    fn set_loading(&self, visible: bool) {
        self.inner.set_loading(visible);
    }

    fn hide_error(&self) {
        self.inner.hide_error();
    }

    fn show_error(&self, message: &str) {
        self.inner.show_error(message);
    }

    fn show_no_reviews(&self) {
        self.inner.show_no_reviews();
    }

    fn render_summary(&self, summary: &RatingSummary) {
        self.inner.render_summary(summary);
    }

    fn render_reviews(&self, reviews: &[Review]) {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.inner.render_reviews(reviews);
    }
}

/// 500 for the direct request, a script that never calls back for the fallback
struct SilentFallback;

impl Respond for SilentFallback {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if request.url.query_pairs().any(|(k, _)| k == "callback") {
            ResponseTemplate::new(200).set_body_raw("void 0;", "application/javascript")
        } else {
            ResponseTemplate::new(500)
        }
    }
}

fn display(doc: &Document, id: &str) -> Option<String> {
    doc.style(doc.get_element_by_id(id).unwrap(), "display")
}

fn fetcher(server: &MockServer) -> ReviewFetcher {
    let endpoint = Url::parse(&format!("{}/exec", server.uri())).unwrap();
    ReviewFetcher::new(endpoint).with_fallback_timeout(Duration::from_millis(300))
}

#[tokio::test]
async fn timeout_after_server_error_shows_error_banner() {
    let server = MockServer::start().await;
    // Direct request fails; the callback script loads but never calls back
    Mock::given(method("GET"))
        .and(path("/exec"))
        .respond_with(SilentFallback)
        .expect(2)
        .mount(&server)
        .await;

    let doc = site_skeleton();
    let controller = ReviewsController::new(fetcher(&server), CountingView::new(doc.clone()));

    let outcome = controller.refresh_reviews(true).await;

    assert!(matches!(outcome, RefreshOutcome::Failed(ref e) if e.is_timeout()));
    assert_eq!(display(&doc, ERROR_ID).as_deref(), Some("block"));
    assert_eq!(display(&doc, LOADING_ID).as_deref(), Some("none"));
    assert_eq!(display(&doc, NO_REVIEWS_ID).as_deref(), Some("block"));

    let banner = doc.outer_html(doc.get_element_by_id(ERROR_ID).unwrap());
    assert!(banner.contains("timed out"), "banner: {}", banner);
    assert_eq!(controller.view().renders(), 0);
}

#[tokio::test]
async fn identical_envelopes_render_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reviews": [{"id": 1, "name": "A", "rating": 5, "comment": "Great", "date": "2024-01-01"}],
            "summary": {"average": 5, "total": 1},
            "lastUpdated": "v2"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let doc = site_skeleton();
    let controller = ReviewsController::new(fetcher(&server), CountingView::new(doc.clone()));

    assert_eq!(
        controller.refresh_reviews(true).await,
        RefreshOutcome::Updated { reviews: 1 }
    );
    assert_eq!(controller.refresh_reviews(false).await, RefreshOutcome::Unchanged);

    assert_eq!(controller.view().renders(), 1);
    let list = doc.get_element_by_id(LIST_ID).unwrap();
    assert_eq!(doc.query_class_within(list, ITEM_CLASS).len(), 1);
    assert_eq!(
        doc.text(doc.get_element_by_id("averageRating").unwrap()).as_deref(),
        Some("5.0")
    );
}

#[tokio::test]
async fn remote_error_keeps_previous_reviews() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reviews": [{"id": "r1", "name": "A", "rating": 4, "comment": "Good", "date": "2024-02-02"}],
            "lastUpdated": 1
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Quota exceeded",
            "lastUpdated": 2
        })))
        .mount(&server)
        .await;

    let doc = site_skeleton();
    let controller = ReviewsController::new(fetcher(&server), CountingView::new(doc.clone()));

    controller.refresh_reviews(true).await;
    let outcome = controller.refresh_reviews(true).await;

    assert!(matches!(outcome, RefreshOutcome::Failed(_)));
    assert_eq!(controller.cached_reviews().len(), 1);
    assert_eq!(display(&doc, NO_REVIEWS_ID).as_deref(), Some("none"));
    let banner = doc.outer_html(doc.get_element_by_id(ERROR_ID).unwrap());
    assert!(banner.contains("Quota exceeded"));

    let list = doc.get_element_by_id(LIST_ID).unwrap();
    assert_eq!(doc.query_class_within(list, ITEM_CLASS).len(), 1);
}
