use std::time::Duration;

use crate::models::Review;
use crate::render::escape::escape_html;
use crate::render::stars::generate_stars;

/// Inner markup of one review item (header and comment)
pub fn review_item_body(review: &Review) -> String {
    format!(
        r#"<div class="review-header"><div><div class="review-name">{}</div><div class="review-date">{}</div></div><div class="review-rating">{}</div></div><div class="review-comment">{}</div>"#,
        escape_html(&review.name),
        escape_html(&review.date),
        generate_stars(review.rating),
        escape_html(&review.comment),
    )
}

/// Full markup of one review item, keyed by the review id
pub fn review_item_html(review: &Review) -> String {
    format!(
        r#"<div class="review-item" data-review-id="{}">{}</div>"#,
        escape_html(&review.id.to_string()),
        review_item_body(review)
    )
}

/// Markup for the whole list, in the given order
pub fn review_list_html(reviews: &[Review]) -> String {
    reviews.iter().map(review_item_html).collect()
}

/// Staggered reveal timing for freshly inserted review items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSchedule {
    pub base: Duration,
    pub step: Duration,
}

impl Default for RevealSchedule {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            step: Duration::from_millis(100),
        }
    }
}

impl RevealSchedule {
    pub fn new(base: Duration, step: Duration) -> Self {
        Self { base, step }
    }

    /// Delay after insertion at which item `index` becomes visible
    pub fn delay_for(&self, index: usize) -> Duration {
        self.base + self.step * index as u32
    }

    pub fn delays(&self, count: usize) -> Vec<Duration> {
        (0..count).map(|i| self.delay_for(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewId;

    fn review(comment: &str) -> Review {
        Review {
            id: ReviewId::Number(7),
            name: "Ana <admin>".to_string(),
            date: "2024-01-01".to_string(),
            rating: 4,
            comment: comment.to_string(),
        }
    }

    #[test]
    fn test_item_escapes_untrusted_text() {
        let html = review_item_html(&review(r#"<script>alert("x")</script> & 'more'"#));

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#039;more&#039;"));
        assert!(html.contains("Ana &lt;admin&gt;"));
        assert!(html.contains(r#"data-review-id="7""#));
        assert_eq!(html.matches("star filled").count(), 4);
    }

    #[test]
    fn test_list_preserves_order() {
        let mut first = review("first");
        first.id = ReviewId::Text("a".to_string());
        let mut second = review("second");
        second.id = ReviewId::Text("b".to_string());

        let html = review_list_html(&[first, second]);
        let a = html.find(r#"data-review-id="a""#).unwrap();
        let b = html.find(r#"data-review-id="b""#).unwrap();
        assert!(a < b);
        assert_eq!(review_list_html(&[]), "");
    }

    #[test]
    fn test_reveal_schedule() {
        let schedule = RevealSchedule::default();
        assert_eq!(
            schedule.delays(3),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(300)
            ]
        );
    }
}
