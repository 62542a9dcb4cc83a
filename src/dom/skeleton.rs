use crate::dom::{Document, NodeId};

/// Build the page structure the widget expects to find.
///
/// Used by the binary and by tests; a real page supplies its own markup with
/// the same ids and classes.
pub fn site_skeleton() -> Document {
    let doc = Document::new();
    let body = doc.body();

    doc.append_new(body, "div", Some("pageLoader"), &["page-loader"]);

    let navbar = doc.append_new(body, "nav", Some("navbar"), &["navbar"]);
    for label in ["Plans", "Resources"] {
        let dropdown = doc.append_new(navbar, "div", None, &["dropdown"]);
        let button = doc.append_new(dropdown, "button", None, &[]);
        doc.set_attr(button, "data-action", "toggle-dropdown");
        doc.set_text(button, label);
        let content = doc.append_new(dropdown, "div", None, &["dropdown-content"]);
        doc.set_style(content, "display", "none");
    }
    let menu_button = doc.append_new(navbar, "button", None, &["mobile-menu"]);
    doc.set_attr(menu_button, "data-action", "toggle-mobile-menu");
    let menu = doc.append_new(navbar, "ul", None, &["nav-menu"]);
    anchor(&doc, menu, "#reviews", "Reviews");
    let enroll = doc.append_new(menu, "button", None, &["btn", "btn-primary"]);
    doc.set_attr(enroll, "data-action", "open-enrollment");
    doc.set_text(enroll, "Enroll");

    let main = doc.append_new(body, "main", Some("mainContent"), &[]);
    for plan in ["diario", "domingo"] {
        let card = doc.append_new(main, "div", None, &["service-card"]);
        let services = doc.append_new(card, "button", None, &[]);
        doc.set_attr(services, "data-action", "show-services");
        doc.set_attr(services, "data-plan", plan);
        let photos = doc.append_new(card, "button", None, &[]);
        doc.set_attr(photos, "data-action", "show-photos");
        doc.set_attr(photos, "data-plan", plan);
    }
    doc.append_new(main, "div", None, &["feature-item"]);

    let reviews = doc.append_new(main, "section", Some("reviews"), &["reviews-section"]);
    let display = doc.append_new(reviews, "div", None, &["reviews-display"]);
    let summary = doc.append_new(display, "div", None, &["rating-summary"]);
    doc.append_new(summary, "span", Some("averageRating"), &["average-rating"]);
    doc.append_new(summary, "div", Some("averageStars"), &["stars"]);
    doc.append_new(summary, "span", Some("totalReviews"), &["total-reviews"]);
    let loading = doc.append_new(display, "div", Some("loadingMessage"), &["loading"]);
    doc.set_style(loading, "display", "none");
    let error = doc.append_new(display, "div", Some("errorMessage"), &["error-message"]);
    doc.set_style(error, "display", "none");
    let empty = doc.append_new(display, "div", Some("noReviews"), &["no-reviews"]);
    doc.set_style(empty, "display", "none");
    doc.append_new(display, "div", Some("reviewsList"), &["reviews-list"]);

    let services = doc.append_new(body, "section", Some("servicesSection"), &["services-section"]);
    doc.append_new(services, "h2", Some("servicesTitle"), &[]);
    doc.append_new(services, "a", Some("notasLink"), &[]);
    doc.append_new(services, "a", Some("tareasLink"), &[]);
    let back = doc.append_new(services, "button", None, &[]);
    doc.set_attr(back, "data-action", "show-home");

    let program = doc.append_new(body, "section", Some("programSection"), &["program-section"]);
    doc.append_new(program, "div", None, &["program-card"]);

    let enrollment = doc.append_new(body, "div", Some("inscripcionesModal"), &["modal-overlay"]);
    doc.set_style(enrollment, "display", "none");
    let content = doc.append_new(enrollment, "div", None, &["modal-content"]);
    let open_form = doc.append_new(content, "button", None, &[]);
    doc.set_attr(open_form, "data-action", "open-form");
    let close = doc.append_new(content, "button", None, &["modal-close"]);
    doc.set_attr(close, "data-action", "close-enrollment");

    let form = doc.append_new(body, "div", Some("formularioModal"), &["modal-overlay"]);
    doc.set_style(form, "display", "none");
    let content = doc.append_new(form, "div", None, &["modal-content"]);
    doc.append_new(content, "iframe", None, &[]);
    let close = doc.append_new(content, "button", None, &["modal-close"]);
    doc.set_attr(close, "data-action", "close-form");

    let toast = doc.append_new(body, "div", Some("successNotification"), &["notification"]);
    doc.append_new(toast, "span", Some("successMessage"), &[]);

    doc
}

fn anchor(doc: &Document, parent: NodeId, href: &str, label: &str) -> NodeId {
    let item = doc.append_new(parent, "li", None, &[]);
    let link = doc.append_new(item, "a", None, &[]);
    doc.set_attr(link, "href", href);
    doc.set_text(link, label);
    link
}
