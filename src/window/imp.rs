use crate::application::VireoApplication;
use crate::config;
use crate::download::DownloadsDialog;
use crate::preferences::PreferencesDialog;
use crate::tab::TabManager;
use crate::url_bar;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use libadwaita::prelude::{AdwApplicationWindowExt, AdwDialogExt, AlertDialogExt};
use libadwaita::subclass::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

#[derive(Default)]
pub struct VireoWindow {
    pub url_entry: RefCell<Option<gtk4::Entry>>,
    pub load_progress: RefCell<Option<gtk4::ProgressBar>>,
    pub back_button: RefCell<Option<gtk4::Button>>,
    pub refresh_button: RefCell<Option<gtk4::Button>>,
    pub tab_strip: RefCell<Option<gtk4::Box>>,
    pub content_stack: RefCell<Option<gtk4::Stack>>,

    pub tab_manager: RefCell<Option<Rc<TabManager>>>,

    // Built once; it subscribes to download registry changes
    pub downloads_dialog: RefCell<Option<DownloadsDialog>>,
}

#[glib::object_subclass]
impl ObjectSubclass for VireoWindow {
    const NAME: &'static str = "VireoWindow";
    type Type = super::VireoWindow;
    type ParentType = libadwaita::ApplicationWindow;
}

impl ObjectImpl for VireoWindow {
    fn constructed(&self) {
        self.parent_constructed();

        let obj = self.obj();

        obj.set_title(Some(config::APP_NAME));
        obj.set_default_size(config::DEFAULT_WINDOW_WIDTH, config::DEFAULT_WINDOW_HEIGHT);

        // Header bar: navigation left, address entry centered, dialogs right
        let header_bar = libadwaita::HeaderBar::new();

        let back_button = gtk4::Button::from_icon_name("go-previous-symbolic");
        back_button.set_tooltip_text(Some("Back"));
        back_button.set_sensitive(false);
        header_bar.pack_start(&back_button);

        let refresh_button = gtk4::Button::from_icon_name("view-refresh-symbolic");
        refresh_button.set_tooltip_text(Some("Reload"));
        header_bar.pack_start(&refresh_button);

        let url_entry = gtk4::Entry::new();
        url_entry.set_placeholder_text(Some("Search or enter address"));
        url_entry.set_input_purpose(gtk4::InputPurpose::Url);
        url_entry.set_hexpand(true);
        header_bar.set_title_widget(Some(&url_entry));

        let settings_button = gtk4::Button::from_icon_name("emblem-system-symbolic");
        settings_button.set_tooltip_text(Some("Settings"));
        header_bar.pack_end(&settings_button);

        let downloads_button = gtk4::Button::from_icon_name("folder-download-symbolic");
        downloads_button.set_tooltip_text(Some("Downloads"));
        header_bar.pack_end(&downloads_button);

        // Tab strip below the header
        let tab_strip = gtk4::Box::new(gtk4::Orientation::Horizontal, 2);

        let strip_scroll = gtk4::ScrolledWindow::new();
        strip_scroll.set_policy(gtk4::PolicyType::Automatic, gtk4::PolicyType::Never);
        strip_scroll.set_hexpand(true);
        strip_scroll.set_child(Some(&tab_strip));

        let new_tab_button = gtk4::Button::from_icon_name("tab-new-symbolic");
        new_tab_button.add_css_class("flat");
        new_tab_button.set_tooltip_text(Some("New Tab"));

        let strip_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 2);
        strip_row.add_css_class("toolbar");
        strip_row.append(&strip_scroll);
        strip_row.append(&new_tab_button);

        // Content: webview stack with the load progress floating on top
        let content_stack = gtk4::Stack::new();
        content_stack.set_hexpand(true);
        content_stack.set_vexpand(true);

        let load_progress = gtk4::ProgressBar::new();
        load_progress.add_css_class("osd");
        load_progress.set_valign(gtk4::Align::Start);
        load_progress.set_visible(false);

        let overlay = gtk4::Overlay::new();
        overlay.set_child(Some(&content_stack));
        overlay.add_overlay(&load_progress);

        let toolbar_view = libadwaita::ToolbarView::new();
        toolbar_view.add_top_bar(&header_bar);
        toolbar_view.add_top_bar(&strip_row);
        toolbar_view.set_content(Some(&overlay));
        obj.set_content(Some(&toolbar_view));

        // Dialog buttons work without the tab manager
        let obj_weak = obj.downgrade();
        downloads_button.connect_clicked(move |_| {
            if let Some(obj) = obj_weak.upgrade() {
                obj.imp().show_downloads();
            }
        });

        let obj_weak = obj.downgrade();
        settings_button.connect_clicked(move |_| {
            if let Some(obj) = obj_weak.upgrade() {
                obj.imp().show_preferences();
            }
        });

        let obj_weak = obj.downgrade();
        new_tab_button.connect_clicked(move |_| {
            if let Some(obj) = obj_weak.upgrade() {
                obj.imp().new_tab(None);
            }
        });

        *self.url_entry.borrow_mut() = Some(url_entry);
        *self.load_progress.borrow_mut() = Some(load_progress);
        *self.back_button.borrow_mut() = Some(back_button);
        *self.refresh_button.borrow_mut() = Some(refresh_button);
        *self.tab_strip.borrow_mut() = Some(tab_strip);
        *self.content_stack.borrow_mut() = Some(content_stack);

        // Defer initialization until application is available
        let obj_weak = obj.downgrade();
        glib::idle_add_local_once(move || {
            if let Some(obj) = obj_weak.upgrade() {
                obj.imp().initialize_tab_manager();
            }
        });
    }
}

impl VireoWindow {
    /// Initialize tab manager - called after application is available
    fn initialize_tab_manager(&self) {
        if self.tab_manager.borrow().is_some() {
            return;
        }

        let obj = self.obj();

        let app = obj
            .application()
            .and_then(|a| a.downcast::<VireoApplication>().ok());

        let Some(app) = app else {
            log::error!("No application available for TabManager");
            return;
        };

        // Network session from the shared profile for cookie persistence
        let network_session = app
            .profile()
            .map(|p| p.network_session().clone())
            .unwrap_or_else(|| {
                log::warn!("No profile available, using ephemeral session");
                webkit6::NetworkSession::new_ephemeral()
            });

        let (
            Some(url_entry),
            Some(load_progress),
            Some(back_button),
            Some(refresh_button),
            Some(tab_strip),
            Some(content_stack),
        ) = (
            self.url_entry.borrow().clone(),
            self.load_progress.borrow().clone(),
            self.back_button.borrow().clone(),
            self.refresh_button.borrow().clone(),
            self.tab_strip.borrow().clone(),
            self.content_stack.borrow().clone(),
        )
        else {
            return;
        };

        let tab_manager = TabManager::new(
            tab_strip,
            content_stack,
            url_entry.clone(),
            load_progress,
            back_button.clone(),
            network_session,
        );
        tab_manager.set_window(obj.upcast_ref::<libadwaita::ApplicationWindow>());

        *self.tab_manager.borrow_mut() = Some(Rc::clone(&tab_manager));

        // Address bar activation drives the resolver; the store is read
        // again on every activation so settings changes apply immediately
        if let Some(store) = app.settings_store() {
            let tm = Rc::clone(&tab_manager);
            url_entry.connect_activate(move |entry| {
                let text = entry.text();
                let settings = store.get();
                if let Some(url) = url_bar::resolve(&text, &settings) {
                    tm.navigate_to(&url);
                }
            });
        } else {
            log::error!("No settings store available for the address bar");
        }

        // Escape restores the entry from the page address
        let entry_key_controller = gtk4::EventControllerKey::new();
        entry_key_controller.set_propagation_phase(gtk4::PropagationPhase::Capture);
        let tm = Rc::clone(&tab_manager);
        let entry_for_escape = url_entry.clone();
        entry_key_controller.connect_key_pressed(move |_, key, _, _| {
            if key == gtk4::gdk::Key::Escape {
                entry_for_escape.set_text(&tm.current_uri().unwrap_or_default());
                tm.focus_active_webview();
                return glib::Propagation::Stop;
            }
            glib::Propagation::Proceed
        });
        url_entry.add_controller(entry_key_controller);

        // Connect back button
        {
            let tm = Rc::clone(&tab_manager);
            back_button.connect_clicked(move |_| {
                tm.go_back();
            });
        }

        // Connect refresh button
        {
            let tm = Rc::clone(&tab_manager);
            refresh_button.connect_clicked(move |_| {
                tm.reload_current();
            });
        }

        // Initial tab at the homepage
        match Url::parse(config::DEFAULT_HOMEPAGE) {
            Ok(url) => {
                tab_manager.new_tab(Some(&url));
            }
            Err(e) => {
                log::warn!("Unusable homepage {:?}: {}", config::DEFAULT_HOMEPAGE, e);
                tab_manager.new_tab(None);
            }
        }
        self.focus_url_bar();
    }

    pub fn new_tab(&self, url: Option<&Url>) {
        if let Some(tab_manager) = self.tab_manager.borrow().as_ref() {
            tab_manager.new_tab(url);
        }
        self.focus_url_bar();
    }

    pub fn close_current_tab(&self) {
        if let Some(tab_manager) = self.tab_manager.borrow().as_ref() {
            tab_manager.close_current_tab();
        }
    }

    pub fn focus_url_bar(&self) {
        if let Some(entry) = self.url_entry.borrow().as_ref() {
            entry.grab_focus();
            entry.select_region(0, -1);
        }
    }

    pub fn reload(&self) {
        if let Some(tab_manager) = self.tab_manager.borrow().as_ref() {
            tab_manager.reload_current();
        }
    }

    pub fn go_back(&self) {
        if let Some(tab_manager) = self.tab_manager.borrow().as_ref() {
            tab_manager.go_back();
        }
    }

    pub fn show_downloads(&self) {
        if self.downloads_dialog.borrow().is_none() {
            *self.downloads_dialog.borrow_mut() = Some(DownloadsDialog::new());
        }
        if let Some(dialog) = self.downloads_dialog.borrow().as_ref() {
            dialog.present(&*self.obj());
        }
    }

    pub fn show_preferences(&self) {
        let obj = self.obj();
        let Some(app) = obj
            .application()
            .and_then(|a| a.downcast::<VireoApplication>().ok())
        else {
            return;
        };
        let Some(store) = app.settings_store() else {
            return;
        };

        let obj_weak = obj.downgrade();
        let dialog = PreferencesDialog::new(&store, move || {
            if let Some(obj) = obj_weak.upgrade() {
                obj.imp().clear_all_data();
            }
        });
        dialog.present(&*obj);
    }

    /// Wipe the profile, inform the user, and restart. The wipe happens
    /// up front; the dialog only announces it.
    fn clear_all_data(&self) {
        let obj = self.obj();
        let Some(app) = obj
            .application()
            .and_then(|a| a.downcast::<VireoApplication>().ok())
        else {
            return;
        };

        if let Some(profile) = app.profile() {
            profile.wipe();
        }

        let dialog = libadwaita::AlertDialog::new(
            Some("Data Cleared"),
            Some("All browser data has been erased. The browser will now restart."),
        );
        dialog.add_response("ok", "OK");
        dialog.set_default_response(Some("ok"));
        dialog.set_close_response("ok");

        dialog.connect_response(None, move |_, _| {
            app.relaunch();
        });

        dialog.present(Some(&*obj));
    }
}

impl WidgetImpl for VireoWindow {}
impl WindowImpl for VireoWindow {}
impl ApplicationWindowImpl for VireoWindow {}
impl AdwApplicationWindowImpl for VireoWindow {}
