use tracing::debug;

use crate::config::SiteConfig;
use crate::dom::Document;
use crate::page::notify::{NotificationKind, Toast};

pub const MAIN_ID: &str = "mainContent";
pub const SERVICES_ID: &str = "servicesSection";
pub const PROGRAM_ID: &str = "programSection";
pub const SERVICES_TITLE_ID: &str = "servicesTitle";
pub const NOTES_LINK_ID: &str = "notasLink";
pub const TASKS_LINK_ID: &str = "tareasLink";

/// Which top-level section is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Services,
    Program,
}

fn show_section(doc: &Document, section: Section) {
    if let Some(main) = doc.get_element_by_id(MAIN_ID) {
        let display = if section == Section::Home { "block" } else { "none" };
        doc.set_style(main, "display", display);
    }
    for (id, which) in [(SERVICES_ID, Section::Services), (PROGRAM_ID, Section::Program)] {
        if let Some(node) = doc.get_element_by_id(id) {
            if section == which {
                doc.add_class(node, "active");
            } else {
                doc.remove_class(node, "active");
            }
        }
    }
    doc.scroll_to(0.0);
    debug!(?section, "Switched section");
}

pub fn show_home(doc: &Document) {
    show_section(doc, Section::Home);
}

pub fn show_program(doc: &Document) {
    show_section(doc, Section::Program);
}

/// Show the services of a plan, pointing the notes and tasks links at it
pub fn show_services(doc: &Document, plan: &str, site: &SiteConfig) {
    if let Some(title) = doc.get_element_by_id(SERVICES_TITLE_ID) {
        doc.set_text(title, &format!("Services for the {} plan", capitalize(plan)));
    }

    if let Some(links) = site.plan(plan) {
        for (id, url) in [(NOTES_LINK_ID, &links.notes_url), (TASKS_LINK_ID, &links.tasks_url)] {
            if let (Some(node), Some(url)) = (doc.get_element_by_id(id), url) {
                doc.set_attr(node, "href", url);
            }
        }
    }

    show_section(doc, Section::Services);
}

/// Open a plan's photo gallery, or announce that it is not published yet
pub fn show_photos(doc: &Document, plan: &str, site: &SiteConfig, toast: &Toast) {
    let gallery = site.plan(plan).and_then(|links| links.gallery_url.as_deref());

    match gallery {
        Some(url) => {
            doc.open_window(url);
            toast.show(
                &format!("Opening the {} plan gallery", capitalize(plan)),
                NotificationKind::Success,
            );
        }
        None => toast.show(
            &format!("The {} plan gallery is coming soon", capitalize(plan)),
            NotificationKind::Info,
        ),
    }
}

pub fn show_coming_soon(doc: &Document, service: &str) {
    doc.alert(&format!(
        "{}\n\nThis section will be available soon. Stay tuned for updates.\n\nFor more information, contact us on WhatsApp.",
        service
    ));
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
