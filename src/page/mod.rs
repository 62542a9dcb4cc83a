pub mod admin;
pub mod chrome;
pub mod modals;
pub mod notify;
pub mod sections;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Config, SiteConfig};
use crate::controller::{RefreshOutcome, ReviewsController};
use crate::dom::{Document, DomView, NodeId};
use crate::models::Review;
use crate::render::RevealSchedule;
use crate::transport::EnvelopeSource;

use admin::AdminMode;
use notify::{NotificationKind, Toast};

/// Input events the page reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// All resources finished loading
    Loaded,
    Scrolled { y: f64 },
    Click { target: NodeId },
    KeyDown { ctrl: bool, alt: bool, key: String },
    /// An element entered the viewport
    Intersected { target: NodeId },
    /// The page is about to be discarded
    BeforeUnload,
}

/// What a clickable element asks for, read from its `data-action` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    ToggleDropdown,
    ToggleMobileMenu,
    OpenEnrollment,
    CloseEnrollment,
    OpenForm,
    CloseForm,
    ShowHome,
    ShowServices(String),
    ShowProgram,
    ShowPhotos(String),
    ComingSoon(String),
    ReloadReviews,
    TestConnection,
    ExitAdmin,
    Anchor(String),
}

impl Action {
    fn from_element(doc: &Document, node: NodeId) -> Option<Self> {
        let attr = |name: &str| doc.attr(node, name).unwrap_or_default();

        let action = match doc.attr(node, "data-action").as_deref() {
            Some("toggle-dropdown") => Action::ToggleDropdown,
            Some("toggle-mobile-menu") => Action::ToggleMobileMenu,
            Some("open-enrollment") => Action::OpenEnrollment,
            Some("close-enrollment") => Action::CloseEnrollment,
            Some("open-form") => Action::OpenForm,
            Some("close-form") => Action::CloseForm,
            Some("show-home") => Action::ShowHome,
            Some("show-services") => Action::ShowServices(attr("data-plan")),
            Some("show-program") => Action::ShowProgram,
            Some("show-photos") => Action::ShowPhotos(attr("data-plan")),
            Some("coming-soon") => Action::ComingSoon(attr("data-service")),
            Some("reload-reviews") => Action::ReloadReviews,
            Some("test-connection") => Action::TestConnection,
            Some("exit-admin") => Action::ExitAdmin,
            Some(_) => return None,
            None => {
                let href = doc.attr(node, "href").filter(|h| h.starts_with('#'));
                match href {
                    Some(href) if doc.tag(node) == "a" => Action::Anchor(href),
                    _ => return None,
                }
            }
        };
        Some(action)
    }

    /// Nearest action on the clicked element or one of its ancestors
    fn resolve(doc: &Document, target: NodeId) -> Option<(NodeId, Self)> {
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(action) = Self::from_element(doc, node) {
                return Some((node, action));
            }
            current = doc.parent(node);
        }
        None
    }
}

/// Snapshot reported by the debug hook
#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    pub reviews: Vec<Review>,
    pub endpoint: String,
    pub admin_mode: bool,
}

/// The whole page: document, chrome controllers and the reviews widget
pub struct Page<S> {
    document: Document,
    site: SiteConfig,
    reviews: Arc<ReviewsController<S, DomView>>,
    admin: AdminMode,
    toast: Toast,
}

impl<S: EnvelopeSource + 'static> Page<S> {
    pub fn new(document: Document, config: &Config, source: S) -> Self {
        let reveal = RevealSchedule::new(
            config.reviews.reveal_base_delay(),
            config.reviews.reveal_step(),
        );
        let view = DomView::new(document.clone()).with_reveal_schedule(reveal);
        let reviews = ReviewsController::new(source, view)
            .with_poll_interval(config.reviews.poll_interval());

        Self {
            toast: Toast::new(document.clone(), config.site.notification_duration()),
            document,
            site: config.site.clone(),
            reviews: Arc::new(reviews),
            admin: AdminMode::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn reviews(&self) -> &Arc<ReviewsController<S, DomView>> {
        &self.reviews
    }

    pub fn is_admin_mode(&self) -> bool {
        self.admin.is_enabled()
    }

    /// Prepare the chrome and start loading reviews
    pub fn start(&self) {
        chrome::init_scroll_animations(&self.document);
        self.reviews.start();

        let chord = &self.site.admin_chord;
        let chord = format!(
            "{}{}{}",
            if chord.ctrl { "Ctrl+" } else { "" },
            if chord.alt { "Alt+" } else { "" },
            chord.key.to_uppercase()
        );
        info!(%chord, "Page started; admin mode available through the key chord");
    }

    pub async fn dispatch(&self, event: PageEvent) {
        let doc = &self.document;

        match event {
            PageEvent::Loaded => chrome::hide_loader_after(doc, self.site.loader_delay()),
            PageEvent::Scrolled { y } => {
                doc.scroll_to(y);
                chrome::update_navbar(doc, y, self.site.navbar_scroll_threshold);
            }
            PageEvent::Click { target } => self.click(target).await,
            PageEvent::KeyDown { ctrl, alt, key } => {
                if self.site.admin_chord.matches(ctrl, alt, &key) {
                    self.admin.toggle(doc, &self.toast);
                }
            }
            PageEvent::Intersected { target } => chrome::reveal_on_intersect(doc, target),
            PageEvent::BeforeUnload => self.teardown(),
        }
    }

    async fn click(&self, target: NodeId) {
        let doc = &self.document;

        chrome::close_dropdowns_outside(doc, target);
        if modals::close_on_overlay(doc, target).await {
            return;
        }

        let Some((node, action)) = Action::resolve(doc, target) else {
            return;
        };
        debug!(?action, "Click action");

        match action {
            Action::ToggleDropdown => chrome::toggle_dropdown(doc, node),
            Action::ToggleMobileMenu => chrome::toggle_mobile_menu(doc),
            Action::OpenEnrollment => modals::open_modal(doc, modals::ENROLLMENT_MODAL_ID).await,
            Action::CloseEnrollment => modals::close_modal(doc, modals::ENROLLMENT_MODAL_ID).await,
            Action::OpenForm => modals::open_form(doc, &self.site.form_embed_url).await,
            Action::CloseForm => modals::close_modal(doc, modals::FORM_MODAL_ID).await,
            Action::ShowHome => sections::show_home(doc),
            Action::ShowServices(plan) => sections::show_services(doc, &plan, &self.site),
            Action::ShowProgram => sections::show_program(doc),
            Action::ShowPhotos(plan) => sections::show_photos(doc, &plan, &self.site, &self.toast),
            Action::ComingSoon(service) => sections::show_coming_soon(doc, &service),
            Action::ReloadReviews => {
                self.reviews.refresh_reviews(true).await;
            }
            Action::TestConnection => {
                self.test_connection().await;
            }
            Action::ExitAdmin => {
                self.admin.toggle(doc, &self.toast);
            }
            Action::Anchor(href) => chrome::scroll_to_anchor(doc, &href),
        }
    }

    /// Announce a connection test and run a full refresh
    pub async fn test_connection(&self) -> RefreshOutcome {
        info!("Testing connection to the reviews endpoint");
        self.toast
            .show("Testing connection to the reviews endpoint...", NotificationKind::Info);
        self.reviews.refresh_reviews(true).await
    }

    /// Stop polling and release the scroll lock
    pub fn teardown(&self) {
        self.reviews.stop();
        modals::lock_scroll(&self.document, false);
        info!("Page torn down");
    }

    /// Log and return the widget's current state
    pub fn debug_reviews(&self) -> DebugReport {
        let report = DebugReport {
            reviews: self.reviews.cached_reviews(),
            endpoint: self.reviews.source().endpoint().to_string(),
            admin_mode: self.admin.is_enabled(),
        };

        info!(
            reviews = ?report.reviews,
            endpoint = %report.endpoint,
            admin_mode = report.admin_mode,
            "Reviews debug report"
        );

        report
    }
}
