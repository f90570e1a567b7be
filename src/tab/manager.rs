use crate::config;
use crate::tab::TabRow;
use crate::webview::{self, WebViewExt as VireoWebViewExt};
use gtk4::glib;
use gtk4::prelude::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use url::Url;
use webkit6::prelude::*;
use webkit6::NetworkSession;

/// Ordered registry of browsing contexts. Every tab owns a strip row and a
/// webview; the stack child names are tab ids, so the visible child name
/// always identifies the active tab.
pub struct TabManager {
    tab_strip: gtk4::Box,
    content_stack: gtk4::Stack,
    tabs: RefCell<HashMap<u32, Tab>>,
    /// Ids in strip order; close reassignment is resolved against it
    order: RefCell<Vec<u32>>,
    active_tab_id: Cell<Option<u32>>,
    next_tab_id: Cell<u32>,
    url_entry: gtk4::Entry,
    load_progress: gtk4::ProgressBar,
    window: glib::WeakRef<libadwaita::ApplicationWindow>,
    back_button: gtk4::Button,
    network_session: NetworkSession,
}

struct Tab {
    id: u32,
    row: TabRow,
    webview: webkit6::WebView,
}

impl TabManager {
    pub fn new(
        tab_strip: gtk4::Box,
        content_stack: gtk4::Stack,
        url_entry: gtk4::Entry,
        load_progress: gtk4::ProgressBar,
        back_button: gtk4::Button,
        network_session: NetworkSession,
    ) -> Rc<Self> {
        Rc::new(Self {
            tab_strip,
            content_stack,
            tabs: RefCell::new(HashMap::new()),
            order: RefCell::new(Vec::new()),
            active_tab_id: Cell::new(None),
            next_tab_id: Cell::new(1),
            url_entry,
            load_progress,
            window: glib::WeakRef::new(),
            back_button,
            network_session,
        })
    }

    pub fn set_window(&self, window: &libadwaita::ApplicationWindow) {
        self.window.set(Some(window));
    }

    /// Open a tab over a fresh webview, activate it, and navigate it when
    /// a url is given
    pub fn new_tab(self: &Rc<Self>, url: Option<&Url>) -> u32 {
        let tab_id = self.next_tab_id.get();
        self.next_tab_id.set(tab_id + 1);

        let row = TabRow::new(tab_id);
        let webview = webview::create_webview(&self.network_session);
        self.setup_webview_signals(tab_id, &webview, &row);

        // Clicking a strip row activates its tab. Programmatic toggling
        // does not emit clicked, so activation cannot re-enter here.
        let manager = Rc::downgrade(self);
        row.connect_clicked(move |row| {
            if let Some(manager) = manager.upgrade() {
                manager.switch_to_tab(row.tab_id());
            }
        });

        let manager = Rc::clone(self);
        row.connect_close_clicked(move |row| {
            manager.close_tab(row.tab_id());
        });

        self.content_stack
            .add_named(&webview, Some(&tab_id.to_string()));
        self.tab_strip.append(&row);

        self.tabs.borrow_mut().insert(
            tab_id,
            Tab {
                id: tab_id,
                row,
                webview,
            },
        );
        self.order.borrow_mut().push(tab_id);
        log::debug!("Opened tab {}", tab_id);

        self.switch_to_tab(tab_id);

        if let Some(url) = url {
            self.navigate_to_in_tab(tab_id, url);
        }

        tab_id
    }

    fn setup_webview_signals(self: &Rc<Self>, tab_id: u32, webview: &webkit6::WebView, row: &TabRow) {
        let name = tab_id.to_string();

        // Address bar text belongs to the visible tab only
        let url_entry = self.url_entry.clone();
        let stack = self.content_stack.clone();
        let tab_name = name.clone();
        webview.connect_notify_local(Some("uri"), move |wv, _| {
            if !is_visible_tab(&stack, &tab_name) {
                return;
            }
            if let Some(uri) = wv.uri() {
                url_entry.set_text(&uri);
            }
        });

        // The owning row's label follows the page title whether or not the
        // tab is visible; the window title only while it is
        let title_row = row.clone();
        let window_ref = self.window.clone();
        let stack = self.content_stack.clone();
        let tab_name = name.clone();
        webview.connect_notify_local(Some("title"), move |wv, _| {
            let title = wv.title();
            title_row.set_title(title.as_deref().unwrap_or_default());

            if is_visible_tab(&stack, &tab_name) {
                if let Some(window) = window_ref.upgrade() {
                    window.set_title(Some(&window_title(title.as_deref())));
                }
            }
        });

        let progress_bar = self.load_progress.clone();
        let stack = self.content_stack.clone();
        let tab_name = name.clone();
        webview.connect_load_changed(move |wv, event| {
            use webkit6::LoadEvent;

            if !is_visible_tab(&stack, &tab_name) {
                return;
            }
            match event {
                LoadEvent::Started => {
                    progress_bar.set_fraction(0.1);
                    progress_bar.set_visible(true);
                }
                LoadEvent::Committed => {
                    let progress = wv.estimated_load_progress();
                    progress_bar.set_fraction(progress.max(0.3));
                }
                LoadEvent::Finished => {
                    progress_bar.set_visible(false);
                    progress_bar.set_fraction(0.0);
                }
                _ => {
                    progress_bar.set_fraction(wv.estimated_load_progress());
                }
            }
        });

        let loading_row = row.clone();
        let back_button = self.back_button.clone();
        let stack = self.content_stack.clone();
        let tab_name = name.clone();
        webview.connect_notify_local(Some("is-loading"), move |wv, _| {
            loading_row.set_loading(wv.is_loading());

            if is_visible_tab(&stack, &tab_name) {
                back_button.set_sensitive(wv.can_go_back());
            }
        });

        let favicon_row = row.clone();
        webview.connect_notify_local(Some("favicon"), move |wv, _| {
            favicon_row.set_favicon(wv.favicon().as_ref());
        });

        // target="_blank" and window.open() land in a new tab instead of a
        // new window
        let manager = Rc::downgrade(self);
        webview.connect_decide_policy(move |_wv, decision, decision_type| {
            if decision_type != webkit6::PolicyDecisionType::NewWindowAction {
                return false;
            }

            let uri = decision
                .downcast_ref::<webkit6::NavigationPolicyDecision>()
                .and_then(|d| d.navigation_action())
                .and_then(|mut action| action.request())
                .and_then(|request| request.uri());
            if let Some(uri) = uri {
                log::debug!("New-window request routed to a tab: {}", uri);
                if let (Some(manager), Ok(url)) = (manager.upgrade(), Url::parse(&uri)) {
                    manager.new_tab(Some(&url));
                }
            }

            decision.ignore();
            true
        });
    }

    /// Close a tab and release its view. When the active tab goes away the
    /// previous strip neighbour takes over; closing the last tab leaves a
    /// fresh blank one instead of an empty strip.
    pub fn close_tab(self: &Rc<Self>, tab_id: u32) {
        let (removed, was_active, removed_index) = {
            let mut tabs = self.tabs.borrow_mut();
            let mut order = self.order.borrow_mut();
            match tabs.remove(&tab_id) {
                Some(tab) => {
                    let index = order.iter().position(|&id| id == tab_id).unwrap_or(0);
                    order.remove(index);
                    (Some(tab), self.active_tab_id.get() == Some(tab_id), index)
                }
                None => (None, false, 0),
            }
        };
        // Registry borrows end here; widget teardown re-enters GTK

        let Some(tab) = removed else { return };

        self.tab_strip.remove(&tab.row);
        self.content_stack.remove(&tab.webview);
        log::debug!("Closed tab {}", tab_id);

        let remaining = self.order.borrow().len();
        if remaining == 0 {
            self.active_tab_id.set(None);
            let blank = Url::parse(config::NEW_TAB_URL).ok();
            self.new_tab(blank.as_ref());
            return;
        }

        if was_active {
            let index = previous_tab_index(removed_index, remaining);
            let next_id = self.order.borrow()[index];
            self.switch_to_tab(next_id);
        }
    }

    pub fn close_current_tab(self: &Rc<Self>) {
        if let Some(tab_id) = self.active_tab_id.get() {
            self.close_tab(tab_id);
        }
    }

    /// Make `tab_id` the active tab and refresh everything that tracks it:
    /// row pressed states, the visible stack child, address bar, window
    /// title, back sensitivity, and the load progress bar.
    pub fn switch_to_tab(&self, tab_id: u32) {
        if !self.tabs.borrow().contains_key(&tab_id) {
            return;
        }

        // Exactly one strip row stays pressed after a switch
        for tab in self.tabs.borrow().values() {
            tab.row.set_active(tab.id == tab_id);
        }

        self.active_tab_id.set(Some(tab_id));
        self.content_stack
            .set_visible_child_name(&tab_id.to_string());

        if let Some(tab) = self.tabs.borrow().get(&tab_id) {
            match tab.webview.uri() {
                Some(uri) => self.url_entry.set_text(&uri),
                None => self.url_entry.set_text(""),
            }

            if let Some(window) = self.window.upgrade() {
                window.set_title(Some(&window_title(tab.webview.title().as_deref())));
            }

            self.back_button.set_sensitive(tab.webview.can_go_back());

            if tab.webview.is_loading() {
                self.load_progress
                    .set_fraction(tab.webview.estimated_load_progress());
                self.load_progress.set_visible(true);
            } else {
                self.load_progress.set_visible(false);
            }
        }
    }

    /// Load a url in the active tab
    pub fn navigate_to(&self, url: &Url) {
        if let Some(tab_id) = self.active_tab_id.get() {
            self.navigate_to_in_tab(tab_id, url);
        }
    }

    fn navigate_to_in_tab(&self, tab_id: u32, url: &Url) {
        if let Some(tab) = self.tabs.borrow().get(&tab_id) {
            tab.webview.load_url(url);
        }
    }

    pub fn reload_current(&self) {
        if let Some(view) = self.active_webview() {
            view.reload();
        }
    }

    pub fn go_back(&self) {
        if let Some(view) = self.active_webview() {
            view.go_back();
        }
    }

    /// Raw URI of the active tab, as the engine reports it
    pub fn current_uri(&self) -> Option<String> {
        self.active_webview().and_then(|view| view.uri()).map(Into::into)
    }

    pub fn focus_active_webview(&self) {
        if let Some(view) = self.active_webview() {
            view.grab_focus();
        }
    }

    fn active_webview(&self) -> Option<webkit6::WebView> {
        let tab_id = self.active_tab_id.get()?;
        self.tabs.borrow().get(&tab_id).map(|tab| tab.webview.clone())
    }
}

fn is_visible_tab(stack: &gtk4::Stack, name: &str) -> bool {
    stack
        .visible_child_name()
        .map(|visible| visible == name)
        .unwrap_or(false)
}

fn window_title(page_title: Option<&str>) -> String {
    match page_title {
        Some(title) if !title.is_empty() => format!("{} - {}", title, config::APP_NAME),
        _ => config::APP_NAME.to_string(),
    }
}

/// Strip index that takes over when the tab at `removed_index` closes.
/// The previous neighbour wins; closing the first tab falls through to
/// the new first.
fn previous_tab_index(removed_index: usize, remaining: usize) -> usize {
    removed_index
        .saturating_sub(1)
        .min(remaining.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::{previous_tab_index, window_title};

    #[test]
    fn test_closing_middle_tab_activates_previous() {
        // [A, B, C] with B closed: A takes over
        assert_eq!(previous_tab_index(1, 2), 0);
    }

    #[test]
    fn test_closing_first_tab_activates_new_first() {
        // [A, B, C] with A closed: B (now index 0) takes over
        assert_eq!(previous_tab_index(0, 2), 0);
    }

    #[test]
    fn test_closing_last_tab_activates_previous() {
        // [A, B, C] with C closed: B takes over
        assert_eq!(previous_tab_index(2, 2), 1);
    }

    #[test]
    fn test_index_is_always_in_bounds() {
        for removed in 0..8 {
            for remaining in 1..8 {
                assert!(previous_tab_index(removed, remaining) < remaining);
            }
        }
    }

    #[test]
    fn test_window_title_includes_page_title() {
        assert_eq!(window_title(Some("Example")), "Example - vireo");
        assert_eq!(window_title(Some("")), "vireo");
        assert_eq!(window_title(None), "vireo");
    }
}
