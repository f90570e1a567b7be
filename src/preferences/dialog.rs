//! Preferences dialog implementation.

use crate::config;
use crate::settings::{self, SearchEngine, SettingsStore};
use gtk4::prelude::*;
use libadwaita::prelude::*;
use std::rc::Rc;

/// Settings dialog: search engine selection, custom template editing,
/// and the clear-all-data action.
pub struct PreferencesDialog {
    dialog: libadwaita::PreferencesDialog,
}

impl PreferencesDialog {
    /// Build the dialog against the settings store. `on_clear_data` runs
    /// when the user triggers the clear-all-data row.
    pub fn new<F: Fn() + 'static>(store: &Rc<SettingsStore>, on_clear_data: F) -> Self {
        let dialog = libadwaita::PreferencesDialog::new();
        dialog.set_title("Settings");

        let page = libadwaita::PreferencesPage::new();
        page.set_title("General");
        page.set_icon_name(Some("preferences-system-symbolic"));

        // === Search ===
        let search_group = libadwaita::PreferencesGroup::new();
        search_group.set_title("Search");

        let engine_names: Vec<&str> = config::SEARCH_ENGINES
            .iter()
            .map(|(_, name, _)| *name)
            .collect();
        let engine_model = gtk4::StringList::new(&engine_names);

        let engine_row = libadwaita::ComboRow::new();
        engine_row.set_title("Search Engine");
        engine_row.set_model(Some(&engine_model));

        let current = store.get();
        let engine_index = config::SEARCH_ENGINES
            .iter()
            .position(|(id, _, _)| *id == current.search_engine.id())
            .unwrap_or(0) as u32;
        engine_row.set_selected(engine_index);
        search_group.add(&engine_row);

        let custom_row = libadwaita::EntryRow::new();
        custom_row.set_title("Custom Search URL");
        custom_row.set_text(&current.custom_template);
        custom_row.set_show_apply_button(true);
        custom_row.set_visible(current.search_engine == SearchEngine::Custom);
        search_group.add(&custom_row);

        let store_for_engine = Rc::clone(store);
        let custom_row_for_engine = custom_row.clone();
        engine_row.connect_selected_notify(move |row| {
            let index = row.selected() as usize;
            let Some((id, _, _)) = config::SEARCH_ENGINES.get(index) else {
                return;
            };
            let Some(engine) = SearchEngine::from_id(id) else {
                return;
            };
            store_for_engine.update(|s| s.search_engine = engine);
            custom_row_for_engine.set_visible(engine == SearchEngine::Custom);
        });

        // A template without the placeholder is rejected at the apply
        // button; whatever is already stored stays untouched.
        let store_for_template = Rc::clone(store);
        custom_row.connect_apply(move |row| {
            let text = row.text().to_string();
            if settings::template_has_placeholder(&text) {
                row.remove_css_class("error");
                store_for_template.update(|s| s.custom_template = text);
            } else {
                log::warn!("Rejected custom search template without {:?}", config::SEARCH_PLACEHOLDER);
                row.add_css_class("error");
            }
        });
        custom_row.connect_changed(|row| {
            row.remove_css_class("error");
        });

        page.add(&search_group);

        // === Data ===
        let data_group = libadwaita::PreferencesGroup::new();
        data_group.set_title("Data");

        let clear_row = libadwaita::ActionRow::new();
        clear_row.set_title("Clear ALL browser data");
        clear_row.set_subtitle("Cookies, cache, site storage, and settings");

        let clear_button = gtk4::Button::with_label("Clear…");
        clear_button.add_css_class("destructive-action");
        clear_button.set_valign(gtk4::Align::Center);
        clear_row.add_suffix(&clear_button);
        clear_row.set_activatable_widget(Some(&clear_button));
        data_group.add(&clear_row);

        clear_button.connect_clicked(move |_| {
            on_clear_data();
        });

        page.add(&data_group);

        // === About ===
        let about_group = libadwaita::PreferencesGroup::new();

        let version_row = libadwaita::ActionRow::new();
        version_row.set_title("Version");
        version_row.set_subtitle(config::APP_VERSION);
        version_row.add_css_class("property");
        about_group.add(&version_row);

        page.add(&about_group);
        dialog.add(&page);

        Self { dialog }
    }

    pub fn present(&self, parent: &impl IsA<gtk4::Widget>) {
        self.dialog.present(Some(parent.upcast_ref::<gtk4::Widget>()));
    }
}
