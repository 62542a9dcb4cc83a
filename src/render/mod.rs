pub mod escape;
pub mod reviews;
pub mod stars;
pub mod summary;

pub use escape::escape_html;
pub use reviews::{review_item_body, review_item_html, review_list_html, RevealSchedule};
pub use stars::{generate_stars, review_stars, stars_html, summary_stars, Star};
pub use summary::SummaryText;
