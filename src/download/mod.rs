//! Download tracking shared between the profile's download handler and the
//! downloads dialog.

mod dialog;
mod row;

pub use dialog::DownloadsDialog;
pub use row::DownloadRow;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

// Thread-local shared state; everything download-related runs on the UI
// thread (the profile's handler, the dialog, and WebKit's signal emissions).
thread_local! {
    static DOWNLOAD_REGISTRY: RefCell<DownloadRegistry> = RefCell::new(DownloadRegistry::new());
    static CANCEL_CALLBACKS: RefCell<HashMap<u64, Box<dyn Fn()>>> = RefCell::new(HashMap::new());
}

/// Registry of all downloads raised during this session
struct DownloadRegistry {
    downloads: Vec<DownloadRecord>,
    next_id: u64,
    on_changed_callbacks: Vec<Rc<dyn Fn()>>,
}

impl DownloadRegistry {
    fn new() -> Self {
        Self {
            downloads: Vec::new(),
            next_id: 1,
            on_changed_callbacks: Vec::new(),
        }
    }
}

// Callbacks run with no registry borrow held, so they can read it back.
fn notify_subscribers() {
    let callbacks: Vec<_> =
        DOWNLOAD_REGISTRY.with(|registry| registry.borrow().on_changed_callbacks.to_vec());
    for callback in callbacks {
        callback();
    }
}

/// State of a download
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadState {
    InProgress,
    Completed,
    Failed(String),
    Cancelled,
}

impl DownloadState {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DownloadState::InProgress)
    }
}

/// Bookkeeping for a single engine-raised download
#[derive(Debug, Clone)]
pub struct DownloadRecord {
    pub id: u64,
    pub suggested_name: String,
    /// Chosen save location; `None` until the save dialog is answered
    pub target_path: Option<PathBuf>,
    pub bytes_received: u64,
    pub bytes_total: u64,
    pub state: DownloadState,
}

impl DownloadRecord {
    /// Whole percent, `floor(received * 100 / total)`. `None` while the
    /// total is unknown (indeterminate progress).
    pub fn percent(&self) -> Option<u64> {
        if self.bytes_total == 0 {
            None
        } else {
            Some((self.bytes_received as u128 * 100 / self.bytes_total as u128) as u64)
        }
    }

    /// Progress as a fraction for a progress bar (0.0 to 1.0)
    pub fn fraction(&self) -> f64 {
        if self.bytes_total == 0 {
            0.0
        } else {
            self.bytes_received as f64 / self.bytes_total as f64
        }
    }

    /// Check if the download is still in progress
    pub fn is_active(&self) -> bool {
        matches!(self.state, DownloadState::InProgress)
    }

    /// Format received/total as a human readable string
    pub fn size_string(&self) -> String {
        if self.bytes_total > 0 {
            format!(
                "{} / {}",
                format_bytes(self.bytes_received),
                format_bytes(self.bytes_total)
            )
        } else {
            format_bytes(self.bytes_received)
        }
    }
}

/// Subscribe to registry changes (new records, progress, state transitions)
pub fn subscribe_to_changes<F: Fn() + 'static>(callback: F) {
    DOWNLOAD_REGISTRY.with(|registry| {
        registry
            .borrow_mut()
            .on_changed_callbacks
            .push(Rc::new(callback));
    });
}

/// Add a new download and return its ID
pub fn add_download(suggested_name: &str) -> u64 {
    let id = DOWNLOAD_REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;

        registry.downloads.push(DownloadRecord {
            id,
            suggested_name: suggested_name.to_string(),
            target_path: None,
            bytes_received: 0,
            bytes_total: 0,
            state: DownloadState::InProgress,
        });
        id
    });
    log::info!("Download added: {} (id={})", suggested_name, id);
    notify_subscribers();
    id
}

/// Record the save location chosen for a download
pub fn set_target_path(id: u64, path: PathBuf) {
    let changed = DOWNLOAD_REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        match registry.downloads.iter_mut().find(|d| d.id == id) {
            Some(record) => {
                record.target_path = Some(path);
                true
            }
            None => false,
        }
    });
    if changed {
        notify_subscribers();
    }
}

/// Mirror engine progress into a record. Ignored once the record is terminal.
pub fn update_progress(id: u64, received: u64, total: u64) {
    let changed = DOWNLOAD_REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        match registry
            .downloads
            .iter_mut()
            .find(|d| d.id == id && !d.state.is_terminal())
        {
            Some(record) => {
                record.bytes_received = received;
                record.bytes_total = total;
                true
            }
            None => false,
        }
    });
    if changed {
        notify_subscribers();
    }
}

/// Transition a record's state. A record reaches a terminal state exactly
/// once; later transitions are ignored.
pub fn set_download_state(id: u64, state: DownloadState) {
    let changed = DOWNLOAD_REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        match registry.downloads.iter_mut().find(|d| d.id == id) {
            Some(record) if !record.state.is_terminal() => {
                log::info!("Download {} state: {:?}", id, state);
                record.state = state;
                true
            }
            _ => false,
        }
    });
    if changed {
        notify_subscribers();
    }
}

/// Look up a single record
pub fn get_download(id: u64) -> Option<DownloadRecord> {
    DOWNLOAD_REGISTRY.with(|registry| {
        registry
            .borrow()
            .downloads
            .iter()
            .find(|d| d.id == id)
            .cloned()
    })
}

/// All records, newest first
pub fn all_downloads() -> Vec<DownloadRecord> {
    DOWNLOAD_REGISTRY.with(|registry| registry.borrow().downloads.iter().rev().cloned().collect())
}

/// Register the hook that cancels the underlying engine download
pub fn register_cancel_callback<F: Fn() + 'static>(id: u64, callback: F) {
    CANCEL_CALLBACKS.with(|callbacks| {
        callbacks.borrow_mut().insert(id, Box::new(callback));
    });
}

/// Cancel a download. Marks the record cancelled before the engine hook runs
/// so WebKit's failed signal cannot overwrite the state, and consumes the
/// hook so further cancellation is disabled.
pub fn cancel_download(id: u64) {
    let already_terminal = get_download(id).map(|d| d.state.is_terminal()).unwrap_or(true);
    if already_terminal {
        return;
    }

    set_download_state(id, DownloadState::Cancelled);
    let callback = CANCEL_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&id));
    if let Some(callback) = callback {
        callback();
    }
}

/// Drop the cancel hook once a download settles
pub fn remove_cancel_callback(id: u64) {
    CANCEL_CALLBACKS.with(|callbacks| {
        callbacks.borrow_mut().remove(&id);
    });
}

/// Format bytes as human readable string (KB, MB, GB)
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.0} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_percent_is_floored() {
        let id = add_download("file.bin");
        update_progress(id, 1, 3);
        assert_eq!(get_download(id).unwrap().percent(), Some(33));
        update_progress(id, 2, 3);
        assert_eq!(get_download(id).unwrap().percent(), Some(66));
        update_progress(id, 3, 3);
        assert_eq!(get_download(id).unwrap().percent(), Some(100));
    }

    #[test]
    fn test_percent_unknown_total() {
        let id = add_download("file.bin");
        update_progress(id, 4096, 0);
        assert_eq!(get_download(id).unwrap().percent(), None);
        assert_eq!(get_download(id).unwrap().fraction(), 0.0);
    }

    #[test]
    fn test_percent_does_not_assume_monotonicity() {
        let id = add_download("file.bin");
        update_progress(id, 150, 100);
        assert_eq!(get_download(id).unwrap().percent(), Some(150));
    }

    #[test]
    fn test_terminal_state_is_reached_exactly_once() {
        let id = add_download("file.bin");
        set_download_state(id, DownloadState::Completed);
        set_download_state(id, DownloadState::Failed("late error".to_string()));
        assert_eq!(get_download(id).unwrap().state, DownloadState::Completed);
    }

    #[test]
    fn test_cancelled_download_never_completes() {
        let id = add_download("file.bin");
        cancel_download(id);
        assert_eq!(get_download(id).unwrap().state, DownloadState::Cancelled);

        // WebKit fires failed after a cancel, and finished after that
        set_download_state(id, DownloadState::Failed("cancelled".to_string()));
        set_download_state(id, DownloadState::Completed);
        assert_eq!(get_download(id).unwrap().state, DownloadState::Cancelled);
    }

    #[test]
    fn test_progress_frozen_after_terminal() {
        let id = add_download("file.bin");
        update_progress(id, 10, 100);
        cancel_download(id);
        update_progress(id, 50, 100);
        assert_eq!(get_download(id).unwrap().bytes_received, 10);
    }

    #[test]
    fn test_cancel_hook_runs_exactly_once() {
        let id = add_download("file.bin");
        let count = Rc::new(Cell::new(0));
        let count_for_hook = count.clone();
        register_cancel_callback(id, move || count_for_hook.set(count_for_hook.get() + 1));

        cancel_download(id);
        cancel_download(id);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_records_listed_newest_first() {
        let first = add_download("a.bin");
        let second = add_download("b.bin");
        let ids: Vec<u64> = all_downloads().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
