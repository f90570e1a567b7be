//! Download row widget for the downloads dialog.

use super::{DownloadRecord, DownloadState};
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct DownloadRow {
        /// Record id shared with the cancel handler, rebound on update()
        pub download_id: Rc<Cell<u64>>,
        pub name_label: RefCell<Option<gtk4::Label>>,
        pub detail_label: RefCell<Option<gtk4::Label>>,
        pub progress_bar: RefCell<Option<gtk4::ProgressBar>>,
        pub state_icon: RefCell<Option<gtk4::Image>>,
        pub cancel_button: RefCell<Option<gtk4::Button>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for DownloadRow {
        const NAME: &'static str = "VireoDownloadRow";
        type Type = super::DownloadRow;
        type ParentType = gtk4::Box;
    }

    impl ObjectImpl for DownloadRow {
        fn constructed(&self) {
            self.parent_constructed();

            let obj = self.obj();
            obj.set_orientation(gtk4::Orientation::Vertical);
            obj.set_spacing(4);
            obj.add_css_class("download-row");

            let name_label = gtk4::Label::builder()
                .hexpand(true)
                .halign(gtk4::Align::Start)
                .max_width_chars(30)
                .build();
            name_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);

            // Hidden until the download settles
            let state_icon = gtk4::Image::new();
            state_icon.set_visible(false);

            let cancel_button = gtk4::Button::from_icon_name("process-stop-symbolic");
            cancel_button.add_css_class("flat");
            cancel_button.add_css_class("circular");
            cancel_button.set_tooltip_text(Some("Cancel"));

            let header = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
            header.append(&name_label);
            header.append(&state_icon);
            header.append(&cancel_button);
            obj.append(&header);

            // Percent and byte counts while running, outcome afterwards
            let detail_label = gtk4::Label::builder()
                .halign(gtk4::Align::Start)
                .build();
            detail_label.add_css_class("dim-label");
            detail_label.add_css_class("caption");
            obj.append(&detail_label);

            let progress_bar = gtk4::ProgressBar::new();
            obj.append(&progress_bar);

            self.name_label.replace(Some(name_label));
            self.detail_label.replace(Some(detail_label));
            self.state_icon.replace(Some(state_icon));
            self.cancel_button.replace(Some(cancel_button));
            self.progress_bar.replace(Some(progress_bar));
        }
    }

    impl WidgetImpl for DownloadRow {}
    impl BoxImpl for DownloadRow {}
}

glib::wrapper! {
    pub struct DownloadRow(ObjectSubclass<imp::DownloadRow>)
        @extends gtk4::Box, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget, gtk4::Orientable;
}

/// Symbolic icon for a settled download, `None` while running
fn state_icon_name(state: &DownloadState) -> Option<&'static str> {
    match state {
        DownloadState::InProgress => None,
        DownloadState::Completed => Some("emblem-ok-symbolic"),
        DownloadState::Failed(_) => Some("dialog-error-symbolic"),
        DownloadState::Cancelled => Some("process-stop-symbolic"),
    }
}

impl DownloadRow {
    pub fn new() -> Self {
        glib::Object::new()
    }

    /// Mirror a record into the row
    pub fn update(&self, record: &DownloadRecord) {
        let imp = self.imp();
        imp.download_id.set(record.id);

        if let Some(label) = imp.name_label.borrow().as_ref() {
            label.set_text(&record.suggested_name);
        }

        // Full save path rides on the tooltip once one is chosen
        match &record.target_path {
            Some(path) => self.set_tooltip_text(Some(&path.display().to_string())),
            None => self.set_tooltip_text(None),
        }

        let detail = match &record.state {
            DownloadState::InProgress => match record.percent() {
                Some(percent) => format!("{}% - {}", percent, record.size_string()),
                None => record.size_string(),
            },
            DownloadState::Completed => "Completed".to_string(),
            DownloadState::Failed(reason) => format!("Failed: {}", reason),
            DownloadState::Cancelled => "Cancelled".to_string(),
        };
        if let Some(label) = imp.detail_label.borrow().as_ref() {
            label.set_text(&detail);
        }

        if let Some(progress) = imp.progress_bar.borrow().as_ref() {
            progress.set_visible(record.is_active());
            progress.set_fraction(record.fraction());
        }

        if let Some(icon) = imp.state_icon.borrow().as_ref() {
            match state_icon_name(&record.state) {
                Some(name) => {
                    icon.set_icon_name(Some(name));
                    icon.set_visible(true);
                }
                None => icon.set_visible(false),
            }
        }

        // A settled download cannot be cancelled again
        if let Some(button) = imp.cancel_button.borrow().as_ref() {
            button.set_visible(record.is_active());
        }
    }

    pub fn download_id(&self) -> u64 {
        self.imp().download_id.get()
    }

    pub fn connect_cancel_clicked<F: Fn(u64) + 'static>(&self, f: F) {
        if let Some(button) = self.imp().cancel_button.borrow().as_ref() {
            let id = Rc::clone(&self.imp().download_id);
            button.connect_clicked(move |_| f(id.get()));
        }
    }
}

impl Default for DownloadRow {
    fn default() -> Self {
        Self::new()
    }
}
