mod imp;

use crate::application::VireoApplication;
use glib::subclass::prelude::*;
use gtk4::gio;
use gtk4::glib;
use url::Url;

glib::wrapper! {
    pub struct VireoWindow(ObjectSubclass<imp::VireoWindow>)
        @extends libadwaita::ApplicationWindow, gtk4::ApplicationWindow, gtk4::Window, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget, gtk4::Native, gtk4::Root, gtk4::ShortcutManager, gio::ActionGroup, gio::ActionMap;
}

impl VireoWindow {
    pub fn new(app: &VireoApplication) -> Self {
        glib::Object::builder()
            .property("application", app)
            .build()
    }

    pub fn new_tab(&self, url: Option<&Url>) {
        self.imp().new_tab(url);
    }

    pub fn close_current_tab(&self) {
        self.imp().close_current_tab();
    }

    pub fn focus_url_bar(&self) {
        self.imp().focus_url_bar();
    }

    pub fn reload(&self) {
        self.imp().reload();
    }

    pub fn go_back(&self) {
        self.imp().go_back();
    }

    pub fn show_downloads(&self) {
        self.imp().show_downloads();
    }

    pub fn show_preferences(&self) {
        self.imp().show_preferences();
    }
}
