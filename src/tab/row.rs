use gtk4::glib;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use std::cell::{Cell, RefCell};

/// Label shown before a page reports its title
const UNTITLED: &str = "New Tab";

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct TabRow {
        pub tab_id: Cell<u32>,

        pub icon_slot: RefCell<Option<gtk4::Stack>>,
        pub favicon: RefCell<Option<gtk4::Image>>,
        pub spinner: RefCell<Option<gtk4::Spinner>>,
        pub title_label: RefCell<Option<gtk4::Label>>,
        pub close_button: RefCell<Option<gtk4::Button>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for TabRow {
        const NAME: &'static str = "VireoTabRow";
        type Type = super::TabRow;
        type ParentType = gtk4::ToggleButton;
    }

    impl ObjectImpl for TabRow {
        fn constructed(&self) {
            self.parent_constructed();

            let obj = self.obj();
            obj.add_css_class("flat");

            // Favicon and spinner share one slot; loading swaps them
            let favicon = gtk4::Image::builder()
                .icon_name("web-browser-symbolic")
                .pixel_size(16)
                .build();

            let spinner = gtk4::Spinner::new();

            let icon_slot = gtk4::Stack::builder()
                .transition_type(gtk4::StackTransitionType::Crossfade)
                .build();
            icon_slot.add_named(&favicon, Some("favicon"));
            icon_slot.add_named(&spinner, Some("spinner"));
            icon_slot.set_visible_child_name("favicon");

            let title_label = gtk4::Label::builder()
                .label(UNTITLED)
                .halign(gtk4::Align::Start)
                .width_chars(10)
                .max_width_chars(18)
                .build();
            title_label.set_ellipsize(gtk4::pango::EllipsizeMode::End);

            // An inner button claims the close click before the toggle
            // underneath ever sees it
            let close_button = gtk4::Button::builder()
                .icon_name("window-close-symbolic")
                .css_classes(["flat", "circular"])
                .valign(gtk4::Align::Center)
                .tooltip_text("Close Tab")
                .build();

            let content = gtk4::Box::new(gtk4::Orientation::Horizontal, 6);
            content.set_margin_start(2);
            content.set_margin_end(2);
            content.set_valign(gtk4::Align::Center);
            content.append(&icon_slot);
            content.append(&title_label);
            content.append(&close_button);
            obj.set_child(Some(&content));

            self.favicon.replace(Some(favicon));
            self.spinner.replace(Some(spinner));
            self.icon_slot.replace(Some(icon_slot));
            self.title_label.replace(Some(title_label));
            self.close_button.replace(Some(close_button));
        }
    }

    impl WidgetImpl for TabRow {}
    impl ButtonImpl for TabRow {}
    impl ToggleButtonImpl for TabRow {}
}

glib::wrapper! {
    /// One pressed-state row in the horizontal tab strip
    pub struct TabRow(ObjectSubclass<imp::TabRow>)
        @extends gtk4::ToggleButton, gtk4::Button, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget, gtk4::Actionable;
}

impl TabRow {
    pub fn new(tab_id: u32) -> Self {
        let row: Self = glib::Object::new();
        row.imp().tab_id.set(tab_id);
        row
    }

    pub fn tab_id(&self) -> u32 {
        self.imp().tab_id.get()
    }

    /// Update the strip label. Pages without a title fall back to the
    /// untitled placeholder.
    pub fn set_title(&self, title: &str) {
        let shown = if title.is_empty() { UNTITLED } else { title };
        if let Some(label) = self.imp().title_label.borrow().as_ref() {
            label.set_text(shown);
        }
    }

    pub fn set_favicon(&self, texture: Option<&gtk4::gdk::Texture>) {
        let Some(image) = self.imp().favicon.borrow().clone() else {
            return;
        };
        match texture {
            Some(texture) => image.set_paintable(Some(texture)),
            None => image.set_icon_name(Some("web-browser-symbolic")),
        }
    }

    pub fn set_loading(&self, loading: bool) {
        let imp = self.imp();
        if let Some(spinner) = imp.spinner.borrow().as_ref() {
            spinner.set_spinning(loading);
        }
        if let Some(slot) = imp.icon_slot.borrow().as_ref() {
            slot.set_visible_child_name(if loading { "spinner" } else { "favicon" });
        }
    }

    pub fn connect_close_clicked<F: Fn(&Self) + 'static>(&self, f: F) {
        let Some(button) = self.imp().close_button.borrow().clone() else {
            return;
        };
        let row = self.clone();
        button.connect_clicked(move |_| f(&row));
    }
}

impl Default for TabRow {
    fn default() -> Self {
        Self::new(0)
    }
}
