use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::dom::Document;
use crate::page::notify::{NotificationKind, Toast};

pub const PANEL_ID: &str = "adminControls";
pub const REVIEWS_AREA_CLASS: &str = "reviews-display";

/// Client-side debug toggle. Grants nothing; it only adds a control panel.
#[derive(Debug, Default)]
pub struct AdminMode {
    enabled: AtomicBool,
}

impl AdminMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flip the mode, updating the panel and announcing the change. Returns the new state.
    pub fn toggle(&self, doc: &Document, toast: &Toast) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);

        if enabled {
            toast.show("🔧 Admin mode enabled", NotificationKind::Success);
            insert_panel(doc);
        } else {
            toast.show("👤 Back to normal mode", NotificationKind::Info);
            remove_panel(doc);
        }

        info!(enabled, "Admin mode toggled");
        enabled
    }
}

/// Add the control panel at the top of the reviews area, once
fn insert_panel(doc: &Document) {
    if doc.get_element_by_id(PANEL_ID).is_some() {
        return;
    }
    let Some(area) = doc.query_class(REVIEWS_AREA_CLASS).into_iter().next() else {
        return;
    };

    let panel = doc.create_element("div");
    doc.set_id(panel, PANEL_ID);
    doc.add_class(panel, "admin-controls");

    let title = doc.append_new(panel, "p", None, &["admin-title"]);
    doc.set_text(title, "🔧 ADMIN MODE");

    for (action, label, class) in [
        ("reload-reviews", "🔄 Reload reviews", "btn-primary"),
        ("test-connection", "🧪 Test connection", "btn-secondary"),
        ("exit-admin", "❌ Exit", "btn-secondary"),
    ] {
        let button = doc.append_new(panel, "button", None, &["btn", class]);
        doc.set_attr(button, "data-action", action);
        doc.set_text(button, label);
    }

    doc.insert_first_child(area, panel);
}

fn remove_panel(doc: &Document) {
    if let Some(panel) = doc.get_element_by_id(PANEL_ID) {
        doc.remove(panel);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dom::site_skeleton;

    #[test]
    fn test_toggle_inserts_and_removes_panel() {
        let doc = site_skeleton();
        let toast = Toast::new(doc.clone(), Duration::from_secs(5));
        let admin = AdminMode::new();
        let area = doc.query_class(REVIEWS_AREA_CLASS)[0];

        assert!(admin.toggle(&doc, &toast));
        assert!(admin.is_enabled());
        let panel = doc.get_element_by_id(PANEL_ID).unwrap();
        assert_eq!(doc.children(area)[0], panel);
        assert_eq!(doc.query_tag_within(panel, "button").len(), 3);

        assert!(!admin.toggle(&doc, &toast));
        assert!(doc.get_element_by_id(PANEL_ID).is_none());
    }

    #[test]
    fn test_panel_inserted_once() {
        let doc = site_skeleton();

        insert_panel(&doc);
        insert_panel(&doc);

        assert_eq!(doc.query_class("admin-controls").len(), 1);
    }
}
