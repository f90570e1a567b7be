mod dialog;

pub use dialog::PreferencesDialog;
