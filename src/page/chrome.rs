use std::time::Duration;

use tokio::runtime::Handle;

use crate::dom::{Document, NodeId};

pub const LOADER_ID: &str = "pageLoader";
pub const NAVBAR_ID: &str = "navbar";

/// Classes of elements that fade in when scrolled into view
pub const FADE_IN_CLASSES: [&str; 4] = ["service-card", "program-card", "feature-item", "review-item"];

/// Hide the page loader once `delay` has passed
pub fn hide_loader_after(doc: &Document, delay: Duration) {
    let Ok(runtime) = Handle::try_current() else {
        hide_loader(doc);
        return;
    };
    let document = doc.clone();
    runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        hide_loader(&document);
    });
}

fn hide_loader(doc: &Document) {
    if let Some(loader) = doc.get_element_by_id(LOADER_ID) {
        doc.add_class(loader, "hidden");
    }
}

pub fn update_navbar(doc: &Document, scroll_y: f64, threshold: f64) {
    let Some(navbar) = doc.get_element_by_id(NAVBAR_ID) else {
        return;
    };
    if scroll_y > threshold {
        doc.add_class(navbar, "scrolled");
    } else {
        doc.remove_class(navbar, "scrolled");
    }
}

fn dropdown_content(doc: &Document, dropdown: NodeId) -> Option<NodeId> {
    doc.query_class_within(dropdown, "dropdown-content").into_iter().next()
}

/// Toggle the dropdown containing `node`, closing every other dropdown
pub fn toggle_dropdown(doc: &Document, node: NodeId) {
    let dropdowns = doc.query_class("dropdown");
    let Some(current) = dropdowns.iter().copied().find(|d| doc.contains(*d, node)) else {
        return;
    };

    for other in dropdowns.iter().filter(|d| **d != current) {
        if let Some(content) = dropdown_content(doc, *other) {
            doc.set_style(content, "display", "none");
        }
    }

    if let Some(content) = dropdown_content(doc, current) {
        let open = doc.style(content, "display").as_deref() == Some("block");
        doc.set_style(content, "display", if open { "none" } else { "block" });
    }
}

/// Close every dropdown that does not contain the clicked element
pub fn close_dropdowns_outside(doc: &Document, target: NodeId) {
    for dropdown in doc.query_class("dropdown") {
        if doc.contains(dropdown, target) {
            continue;
        }
        if let Some(content) = dropdown_content(doc, dropdown) {
            doc.set_style(content, "display", "none");
        }
    }
}

pub fn toggle_mobile_menu(doc: &Document) {
    let Some(menu) = doc.query_class("nav-menu").into_iter().next() else {
        return;
    };
    let open = doc.style(menu, "display").as_deref() == Some("flex");
    doc.set_style(menu, "display", if open { "none" } else { "flex" });
}

/// Put every fade-in element into its hidden starting state
pub fn init_scroll_animations(doc: &Document) {
    for class in FADE_IN_CLASSES {
        for node in doc.query_class(class) {
            doc.set_style(node, "opacity", "0");
            doc.set_style(node, "transform", "translateY(30px)");
            doc.set_style(node, "transition", "all 0.6s ease");
        }
    }
}

/// Reveal an element that entered the viewport
pub fn reveal_on_intersect(doc: &Document, node: NodeId) {
    if FADE_IN_CLASSES.iter().any(|c| doc.has_class(node, c)) {
        doc.set_style(node, "opacity", "1");
        doc.set_style(node, "transform", "translateY(0)");
    }
}

/// Scroll the element referenced by an in-page `#id` link into view
pub fn scroll_to_anchor(doc: &Document, href: &str) {
    let Some(id) = href.strip_prefix('#').filter(|id| !id.is_empty()) else {
        return;
    };
    if let Some(target) = doc.get_element_by_id(id) {
        doc.scroll_into_view(target);
    }
}
