use std::time::Duration;

use tokio::time::sleep;

use crate::dom::{Document, NodeId};

pub const ENROLLMENT_MODAL_ID: &str = "inscripcionesModal";
pub const FORM_MODAL_ID: &str = "formularioModal";

const ACTIVATE_DELAY: Duration = Duration::from_millis(10);
const CLOSE_DELAY: Duration = Duration::from_millis(300);

/// Show a modal and lock page scrolling
pub async fn open_modal(doc: &Document, id: &str) {
    let Some(modal) = doc.get_element_by_id(id) else {
        return;
    };
    doc.set_style(modal, "display", "flex");
    lock_scroll(doc, true);

    sleep(ACTIVATE_DELAY).await;
    doc.add_class(modal, "active");
}

/// Start the closing transition and hide the modal once it has finished
pub async fn close_modal(doc: &Document, id: &str) {
    let Some(modal) = doc.get_element_by_id(id) else {
        return;
    };
    doc.remove_class(modal, "active");

    sleep(CLOSE_DELAY).await;
    doc.set_style(modal, "display", "none");
    lock_scroll(doc, false);
}

/// Swap the enrollment modal for the embedded form
pub async fn open_form(doc: &Document, embed_url: &str) {
    close_modal(doc, ENROLLMENT_MODAL_ID).await;

    let Some(modal) = doc.get_element_by_id(FORM_MODAL_ID) else {
        return;
    };
    if let Some(frame) = doc.query_tag_within(modal, "iframe").into_iter().next() {
        doc.set_attr(frame, "src", embed_url);
    }
    open_modal(doc, FORM_MODAL_ID).await;
}

/// Close the modal whose overlay was clicked. Returns false if `target` is not an overlay.
pub async fn close_on_overlay(doc: &Document, target: NodeId) -> bool {
    if !doc.has_class(target, "modal-overlay") {
        return false;
    }

    let Some(id) = doc
        .get_element_by_id(ENROLLMENT_MODAL_ID)
        .filter(|m| *m == target)
        .map(|_| ENROLLMENT_MODAL_ID)
        .or_else(|| {
            doc.get_element_by_id(FORM_MODAL_ID)
                .filter(|m| *m == target)
                .map(|_| FORM_MODAL_ID)
        })
    else {
        return false;
    };

    close_modal(doc, id).await;
    true
}

/// Lock or release body scrolling
pub fn lock_scroll(doc: &Document, locked: bool) {
    doc.set_style(doc.body(), "overflow", if locked { "hidden" } else { "auto" });
}
