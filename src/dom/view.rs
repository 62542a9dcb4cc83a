use tokio::runtime::Handle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::controller::ReviewsView;
use crate::dom::{Document, NodeId};
use crate::models::{RatingSummary, Review};
use crate::render::{review_item_body, RevealSchedule, SummaryText};

pub const LOADING_ID: &str = "loadingMessage";
pub const ERROR_ID: &str = "errorMessage";
pub const NO_REVIEWS_ID: &str = "noReviews";
pub const LIST_ID: &str = "reviewsList";
pub const AVERAGE_ID: &str = "averageRating";
pub const AVERAGE_STARS_ID: &str = "averageStars";
pub const TOTAL_ID: &str = "totalReviews";

pub const ITEM_CLASS: &str = "review-item";
pub const VISIBLE_CLASS: &str = "review-visible";

/// [`ReviewsView`] backed by the named regions of a [`Document`]
#[derive(Debug, Clone)]
pub struct DomView {
    document: Document,
    reveal: RevealSchedule,
}

impl DomView {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            reveal: RevealSchedule::default(),
        }
    }

    pub fn with_reveal_schedule(mut self, reveal: RevealSchedule) -> Self {
        self.reveal = reveal;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn region(&self, id: &str) -> Option<NodeId> {
        self.document.get_element_by_id(id)
    }

    fn set_display(&self, id: &str, display: &str) {
        if let Some(node) = self.region(id) {
            self.document.set_style(node, "display", display);
        }
    }

    fn schedule_reveal(&self, items: Vec<NodeId>) {
        let delays = self.reveal.delays(items.len());

        let Ok(runtime) = Handle::try_current() else {
            for item in items {
                self.document.add_class(item, VISIBLE_CLASS);
            }
            return;
        };

        let document = self.document.clone();
        let start = Instant::now();
        runtime.spawn(async move {
            for (item, delay) in items.into_iter().zip(delays) {
                sleep_until(start + delay).await;
                document.add_class(item, VISIBLE_CLASS);
            }
        });
    }
}

impl ReviewsView for DomView {
    fn set_loading(&self, visible: bool) {
        self.set_display(LOADING_ID, if visible { "block" } else { "none" });
    }

    fn hide_error(&self) {
        self.set_display(ERROR_ID, "none");
    }

    fn show_error(&self, message: &str) {
        let Some(banner) = self.region(ERROR_ID) else {
            return;
        };
        let doc = &self.document;

        doc.set_style(banner, "display", "block");
        doc.clear(banner);

        let wrapper = doc.append_new(banner, "div", None, &["error-content"]);
        let text = doc.append_new(wrapper, "p", None, &[]);
        doc.set_text(text, &format!("⚠️ Could not load reviews: {}", message));

        let retry = doc.append_new(wrapper, "button", None, &["btn", "btn-secondary"]);
        doc.set_attr(retry, "data-action", "reload-reviews");
        doc.set_text(retry, "🔄 Try again");

        let hint = doc.append_new(wrapper, "p", None, &["error-hint"]);
        doc.set_text(
            hint,
            "If the problem persists, check that the review endpoint is configured correctly.",
        );
    }

    fn show_no_reviews(&self) {
        self.set_display(NO_REVIEWS_ID, "block");
    }

    fn render_summary(&self, summary: &RatingSummary) {
        let text = SummaryText::new(summary);

        if let Some(node) = self.region(AVERAGE_ID) {
            self.document.set_text(node, &text.average);
        }
        if let Some(node) = self.region(TOTAL_ID) {
            self.document.set_text(node, &text.total);
        }
        if let Some(node) = self.region(AVERAGE_STARS_ID) {
            self.document.set_inner_html(node, &text.stars_html);
        }
    }

    fn render_reviews(&self, reviews: &[Review]) {
        let Some(list) = self.region(LIST_ID) else {
            return;
        };
        let doc = &self.document;

        doc.clear(list);
        if reviews.is_empty() {
            self.set_display(NO_REVIEWS_ID, "block");
            return;
        }
        self.set_display(NO_REVIEWS_ID, "none");

        let items: Vec<NodeId> = reviews
            .iter()
            .map(|review| {
                let item = doc.append_new(list, "div", None, &[ITEM_CLASS]);
                doc.set_attr(item, "data-review-id", &review.id.to_string());
                doc.set_inner_html(item, &review_item_body(review));
                item
            })
            .collect();

        debug!(count = items.len(), "Rendered review list");
        self.schedule_reveal(items);
    }
}
