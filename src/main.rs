mod application;
mod config;
mod download;
mod preferences;
mod profile;
mod settings;
mod tab;
mod update;
mod url_bar;
mod webview;
mod window;

use gtk4::prelude::*;
use std::path::Path;

fn main() -> glib::ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Updater role: replace the target binary with this one, respawn it, exit.
    // Handled before any GTK machinery comes up.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("--apply-update") {
        let Some(target) = args.get(2) else {
            log::error!("--apply-update requires a target path");
            return glib::ExitCode::FAILURE;
        };
        return match update::apply_update(Path::new(target), &args[3..]) {
            Ok(()) => glib::ExitCode::SUCCESS,
            Err(e) => {
                log::error!("Failed to apply update: {}", e);
                glib::ExitCode::FAILURE
            }
        };
    }

    // WebKitGTK still renders more reliably under XWayland
    if std::env::var_os("GDK_BACKEND").is_none()
        && std::env::var("XDG_SESSION_TYPE").as_deref() == Ok("wayland")
    {
        std::env::set_var("GDK_BACKEND", "x11");
    }

    log::info!("Starting {} v{}", config::APP_NAME, config::APP_VERSION);

    let app = application::VireoApplication::new();
    app.run()
}
