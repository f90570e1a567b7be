use crate::config;
use crate::profile::BrowsingProfile;
use crate::settings::SettingsStore;
use crate::update;
use crate::window::VireoWindow;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{gio, glib};
use libadwaita::subclass::prelude::*;
use std::cell::{Cell, OnceCell};
use std::rc::Rc;

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct VireoApplication {
        pub profile: OnceCell<Rc<BrowsingProfile>>,
        pub settings: OnceCell<Rc<SettingsStore>>,
        pub update_checked: Cell<bool>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for VireoApplication {
        const NAME: &'static str = "VireoApplication";
        type Type = super::VireoApplication;
        type ParentType = libadwaita::Application;
    }

    impl ObjectImpl for VireoApplication {}

    impl ApplicationImpl for VireoApplication {
        fn activate(&self) {
            let app = self.obj();

            let window = VireoWindow::new(&app);
            window.present();

            // One background update check per run, after the first window shows
            if !self.update_checked.get() {
                self.update_checked.set(true);
                app.spawn_update_check(&window);
            }
        }

        fn startup(&self) {
            self.parent_startup();

            let app = self.obj();

            // Open the on-disk profile and the settings stored inside it
            match BrowsingProfile::open() {
                Ok(profile) => {
                    let profile = Rc::new(profile);
                    let store = Rc::new(SettingsStore::load(profile.settings_path()));

                    if self.settings.set(store).is_err() {
                        log::warn!("Settings store already initialized");
                    }
                    if self.profile.set(profile).is_err() {
                        log::warn!("Profile already initialized");
                    }
                    log::info!("Profile initialized");
                }
                Err(e) => {
                    log::error!("Failed to open profile: {}", e);
                }
            }

            // Set up application actions
            app.setup_actions();
            app.setup_accels();
        }
    }

    impl GtkApplicationImpl for VireoApplication {}
    impl AdwApplicationImpl for VireoApplication {}
}

glib::wrapper! {
    pub struct VireoApplication(ObjectSubclass<imp::VireoApplication>)
        @extends libadwaita::Application, gtk4::Application, gio::Application,
        @implements gio::ActionGroup, gio::ActionMap;
}

impl VireoApplication {
    pub fn new() -> Self {
        glib::Object::builder()
            .property("application-id", config::APP_ID)
            .property("flags", gio::ApplicationFlags::NON_UNIQUE)
            .build()
    }

    pub fn profile(&self) -> Option<Rc<BrowsingProfile>> {
        self.imp().profile.get().cloned()
    }

    pub fn settings_store(&self) -> Option<Rc<SettingsStore>> {
        self.imp().settings.get().cloned()
    }

    /// Spawn a fresh instance of the current binary and quit this one.
    pub fn relaunch(&self) {
        match std::env::current_exe() {
            Ok(exe) => {
                let args: Vec<String> = std::env::args().skip(1).collect();
                if let Err(e) = std::process::Command::new(&exe).args(&args).spawn() {
                    log::error!("Failed to relaunch {}: {}", exe.display(), e);
                }
            }
            Err(e) => {
                log::error!("Failed to locate current executable: {}", e);
            }
        }
        self.quit();
    }

    /// Check for a newer release. If one is staged and confirmed, hand off
    /// to the staged binary and quit. Failures are logged and browsing
    /// continues undisturbed.
    fn spawn_update_check(&self, window: &VireoWindow) {
        let Some(profile) = self.profile() else {
            return;
        };
        let updates_dir = profile.updates_dir();

        let app = self.clone();
        let window = window.clone();
        glib::spawn_future_local(async move {
            match update::check_and_stage(window.upcast_ref(), &updates_dir).await {
                Ok(Some(staged)) => match update::launch_staged(&staged) {
                    Ok(()) => app.quit(),
                    Err(e) => log::warn!("Failed to launch updater: {}", e),
                },
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Update check skipped: {}", e);
                }
            }
        });
    }

    /// Register a stateless action whose handler runs against the focused
    /// browser window. Fires into nothing when no window is up.
    fn add_window_action(&self, name: &str, handler: fn(&VireoWindow)) {
        let action = gio::SimpleAction::new(name, None);
        action.connect_activate(glib::clone!(
            #[weak(rename_to = app)]
            self,
            move |_, _| {
                let window = app
                    .active_window()
                    .and_then(|w| w.downcast::<VireoWindow>().ok());
                if let Some(window) = window {
                    handler(&window);
                }
            }
        ));
        self.add_action(&action);
    }

    fn setup_actions(&self) {
        let quit_action = gio::SimpleAction::new("quit", None);
        quit_action.connect_activate(glib::clone!(
            #[weak(rename_to = app)]
            self,
            move |_, _| app.quit()
        ));
        self.add_action(&quit_action);

        self.add_window_action("new-tab", |window| window.new_tab(None));
        self.add_window_action("close-tab", VireoWindow::close_current_tab);
        self.add_window_action("focus-url-bar", VireoWindow::focus_url_bar);
        self.add_window_action("reload", VireoWindow::reload);
        self.add_window_action("go-back", VireoWindow::go_back);
        self.add_window_action("downloads", VireoWindow::show_downloads);
        self.add_window_action("preferences", VireoWindow::show_preferences);
    }

    fn setup_accels(&self) {
        self.set_accels_for_action("app.quit", &["<Control>q"]);
        self.set_accels_for_action("app.new-tab", &["<Control>t"]);
        self.set_accels_for_action("app.close-tab", &["<Control>w"]);
        self.set_accels_for_action("app.focus-url-bar", &["<Control>l"]);
        self.set_accels_for_action("app.reload", &["<Control>r", "F5"]);
        self.set_accels_for_action("app.go-back", &["<Alt>Left"]);
        self.set_accels_for_action("app.downloads", &["<Control>j"]);
        self.set_accels_for_action("app.preferences", &["<Control>comma"]);
    }
}

impl Default for VireoApplication {
    fn default() -> Self {
        Self::new()
    }
}
