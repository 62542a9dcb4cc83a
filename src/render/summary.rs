use crate::models::RatingSummary;
use crate::render::stars::{stars_html, summary_stars};

/// Display strings for the rating summary block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryText {
    pub average: String,
    pub total: String,
    pub stars_html: String,
}

impl SummaryText {
    pub fn new(summary: &RatingSummary) -> Self {
        Self {
            average: format!("{:.1}", summary.average),
            total: summary.total.to_string(),
            stars_html: stars_html(&summary_stars(summary.average)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_text() {
        let text = SummaryText::new(&RatingSummary {
            average: 4.66,
            total: 12,
        });

        assert_eq!(text.average, "4.7");
        assert_eq!(text.total, "12");
        assert_eq!(text.stars_html.matches("star filled").count(), 5);
    }

    #[test]
    fn test_default_summary() {
        let text = SummaryText::new(&RatingSummary::default());

        assert_eq!(text.average, "0.0");
        assert_eq!(text.total, "0");
        assert_eq!(text.stars_html.matches("star filled").count(), 0);
    }
}
