/// One position in a five-star rating display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Star {
    Filled,
    Empty,
}

impl Star {
    pub fn html(self) -> &'static str {
        match self {
            Star::Filled => r#"<span class="star filled">★</span>"#,
            Star::Empty => r#"<span class="star">☆</span>"#,
        }
    }
}

pub const STAR_COUNT: u8 = 5;

/// Stars for a single review: exactly `rating` filled, the rest empty
pub fn review_stars(rating: u8) -> [Star; 5] {
    let mut stars = [Star::Empty; 5];
    for (i, star) in stars.iter_mut().enumerate() {
        if (i as u8) < rating {
            *star = Star::Filled;
        }
    }
    stars
}

/// Stars for the aggregate rating.
///
/// Position `floor(average) + 1` is drawn filled when the fractional part is at
/// least one half. There is no half glyph: it renders the same as a full star.
pub fn summary_stars(average: f64) -> [Star; 5] {
    let full = average.floor();
    let has_half = average % 1.0 >= 0.5;

    let mut stars = [Star::Empty; 5];
    for (i, star) in stars.iter_mut().enumerate() {
        let position = (i + 1) as f64;
        if position <= full || (position == full + 1.0 && has_half) {
            *star = Star::Filled;
        }
    }
    stars
}

pub fn stars_html(stars: &[Star]) -> String {
    stars.iter().map(|s| s.html()).collect()
}

/// Star markup for an integer rating
pub fn generate_stars(rating: u8) -> String {
    stars_html(&review_stars(rating))
}
