use crate::config;
use crate::download::{self, DownloadState};
use gtk4::gio;
use gtk4::glib;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use webkit6::prelude::*;
use webkit6::{CookieAcceptPolicy, CookiePersistentStorage, NetworkSession};

/// Failures raised while opening the profile directory tree
#[derive(Debug)]
pub enum ProfileError {
    Io(std::io::Error),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<std::io::Error> for ProfileError {
    fn from(e: std::io::Error) -> Self {
        ProfileError::Io(e)
    }
}

/// The single persistent browsing profile shared by every tab. Owns the
/// profile directory tree and the WebKit network session built over it.
pub struct BrowsingProfile {
    base_dir: PathBuf,
    network_session: NetworkSession,
}

impl std::fmt::Debug for BrowsingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowsingProfile")
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl BrowsingProfile {
    /// Create or open the profile directory and its network session
    pub fn open() -> Result<Self, ProfileError> {
        let base_dir = default_base_dir();
        fs::create_dir_all(&base_dir)?;

        // Data and cache subdirectories for WebKit
        let data_dir = base_dir.join("data");
        let cache_dir = base_dir.join("cache");
        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(&cache_dir)?;

        let network_session = NetworkSession::new(data_dir.to_str(), cache_dir.to_str());

        // Cookies persist unconditionally across restarts
        if let Some(cookie_manager) = network_session.cookie_manager() {
            cookie_manager.set_accept_policy(CookieAcceptPolicy::Always);

            let cookies_path = data_dir.join("cookies.sqlite");
            if let Some(path) = cookies_path.to_str() {
                cookie_manager.set_persistent_storage(path, CookiePersistentStorage::Sqlite);
                log::info!("Cookie manager configured: cookies stored at {:?}", cookies_path);
            }
        } else {
            log::warn!("Could not get cookie manager from network session");
        }

        // Enable favicon loading for the tab strip
        if let Some(data_manager) = network_session.website_data_manager() {
            data_manager.set_favicons_enabled(true);
        }

        Self::setup_download_handler(&network_session);

        log::info!(
            "Profile opened with data={:?}, cache={:?}",
            data_dir,
            cache_dir
        );

        Ok(Self {
            base_dir,
            network_session,
        })
    }

    /// Path of the persisted settings file
    pub fn settings_path(&self) -> PathBuf {
        self.base_dir.join(config::SETTINGS_FILE)
    }

    /// Directory staged release binaries are written to
    pub fn updates_dir(&self) -> PathBuf {
        self.base_dir.join(config::UPDATES_DIR)
    }

    /// Session every webview is built over
    pub fn network_session(&self) -> &NetworkSession {
        &self.network_session
    }

    /// Delete the entire profile directory (cookies, cache, storage,
    /// settings). Entries that cannot be removed are skipped.
    pub fn wipe(&self) {
        log::info!("Wiping profile directory {:?}", self.base_dir);
        remove_tree_best_effort(&self.base_dir);
    }

    /// Wire engine download events into the download registry. Every
    /// download prompts for a save location; the transfer stays deferred
    /// until a destination is set, and is cancelled when none is chosen.
    fn setup_download_handler(network_session: &NetworkSession) {
        network_session.connect_download_started(|_session, engine_download| {
            let source = engine_download.request().and_then(|r| r.uri());
            log::info!("Engine raised a download from {:?}", source);
            track_download(engine_download);
        });
    }
}

/// Mirror one engine download into the registry and keep both sides in
/// sync until it settles.
fn track_download(engine_download: &webkit6::Download) {
    // Registry id assigned at decide-destination, read by every later signal
    let record_id: Rc<Cell<Option<u64>>> = Rc::new(Cell::new(None));

    let id_cell = Rc::clone(&record_id);
    engine_download.connect_decide_destination(move |engine_download, suggested_name| {
        let id = download::add_download(suggested_name);
        id_cell.set(Some(id));

        let handle = engine_download.clone();
        download::register_cancel_callback(id, move || handle.cancel());

        prompt_for_destination(id, suggested_name, engine_download.clone());
        true // The transfer stays deferred until a destination is set
    });

    let id_cell = Rc::clone(&record_id);
    engine_download.connect_received_data(move |engine_download, _chunk_len| {
        let (Some(id), Some(response)) = (id_cell.get(), engine_download.response()) else {
            return;
        };
        download::update_progress(
            id,
            engine_download.received_data_length(),
            response.content_length() as u64,
        );
    });

    // A record already settled by a cancel keeps its state; the registry
    // drops transitions after the first terminal one.
    let id_cell = Rc::clone(&record_id);
    engine_download.connect_finished(move |_| {
        if let Some(id) = id_cell.get() {
            download::set_download_state(id, DownloadState::Completed);
            download::remove_cancel_callback(id);
        }
    });

    let id_cell = record_id;
    engine_download.connect_failed(move |_, error| {
        if let Some(id) = id_cell.get() {
            download::set_download_state(id, DownloadState::Failed(error.to_string()));
            download::remove_cancel_callback(id);
        }
    });
}

/// Ask where to save. Dismissing the chooser, or choosing a file with no
/// local path, cancels the transfer.
fn prompt_for_destination(id: u64, suggested_name: &str, engine_download: webkit6::Download) {
    let chooser = gtk4::FileDialog::builder()
        .title("Save Download")
        .initial_name(suggested_name)
        .initial_folder(&gio::File::for_path(downloads_dir()))
        .build();

    let parent = gio::Application::default()
        .and_then(|a| a.downcast::<gtk4::Application>().ok())
        .as_ref()
        .and_then(|a| a.active_window());

    chooser.save(parent.as_ref(), gio::Cancellable::NONE, move |result| {
        let chosen = match &result {
            Ok(file) => file.path(),
            Err(_) => None,
        };
        match chosen {
            Some(path) => {
                log::info!("Download {} saving to {:?}", id, path);
                engine_download.set_allow_overwrite(true);
                engine_download.set_destination(&path.to_string_lossy());
                download::set_target_path(id, path);
            }
            None => {
                log::info!("Download {} abandoned at the save dialog", id);
                download::cancel_download(id);
            }
        }
    });
}

/// Default downloads directory, created if missing
fn downloads_dir() -> PathBuf {
    let dir = glib::user_special_dir(glib::UserDirectory::Downloads).unwrap_or_else(|| {
        PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into())).join("Downloads")
    });
    if let Err(e) = fs::create_dir_all(&dir) {
        log::warn!("Failed to create downloads directory {:?}: {}", dir, e);
    }
    dir
}

/// Profile directory under the XDG data dir
fn default_base_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "vireo", "vireo")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                .join(".local/share/vireo")
        })
}

/// Remove a directory tree, skipping entries that cannot be deleted
fn remove_tree_best_effort(path: &Path) {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let entry_path = entry.path();
        // Symlinks are removed, never followed
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            remove_tree_best_effort(&entry_path);
        } else if let Err(e) = fs::remove_file(&entry_path) {
            log::debug!("Skipping {:?}: {}", entry_path, e);
        }
    }

    if let Err(e) = fs::remove_dir(path) {
        log::debug!("Could not remove {:?}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wipe_removes_nested_tree() {
        let base = std::env::temp_dir().join(format!("vireo-wipe-{}", std::process::id()));
        fs::create_dir_all(base.join("data").join("sub")).unwrap();
        fs::write(base.join("settings.json"), "{}").unwrap();
        fs::write(base.join("data").join("sub").join("cookies.sqlite"), "x").unwrap();

        remove_tree_best_effort(&base);
        assert!(!base.exists());
    }

    #[test]
    fn test_wipe_missing_directory_is_a_no_op() {
        let base = std::env::temp_dir().join("vireo-wipe-not-there");
        remove_tree_best_effort(&base);
        assert!(!base.exists());
    }
}
