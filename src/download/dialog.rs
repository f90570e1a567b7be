//! Downloads dialog listing every download of the session.

use super::{self as download, DownloadRow};
use gtk4::prelude::*;
use libadwaita::prelude::*;

/// Modal dialog with one row per download record
pub struct DownloadsDialog {
    dialog: libadwaita::Dialog,
}

impl DownloadsDialog {
    /// Create the dialog and subscribe it to registry changes. Create it
    /// once and present it as needed; the subscription stays alive with it.
    pub fn new() -> Self {
        let dialog = libadwaita::Dialog::new();
        dialog.set_title("Downloads");
        dialog.set_content_width(420);
        dialog.set_content_height(400);

        let list = gtk4::ListBox::new();
        list.set_selection_mode(gtk4::SelectionMode::None);
        list.add_css_class("boxed-list");
        list.set_valign(gtk4::Align::Start);

        let empty_label = gtk4::Label::new(Some("No downloads yet"));
        empty_label.add_css_class("dim-label");
        empty_label.set_margin_top(24);

        let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        content.set_margin_top(12);
        content.set_margin_bottom(12);
        content.set_margin_start(12);
        content.set_margin_end(12);
        content.append(&empty_label);
        content.append(&list);

        let scrolled = gtk4::ScrolledWindow::new();
        scrolled.set_policy(gtk4::PolicyType::Never, gtk4::PolicyType::Automatic);
        scrolled.set_child(Some(&content));

        let view = libadwaita::ToolbarView::new();
        view.add_top_bar(&libadwaita::HeaderBar::new());
        view.set_content(Some(&scrolled));
        dialog.set_child(Some(&view));

        let list_for_sync = list.clone();
        let empty_for_sync = empty_label.clone();
        download::subscribe_to_changes(move || {
            Self::sync_list(&list_for_sync, &empty_for_sync);
        });
        Self::sync_list(&list, &empty_label);

        Self { dialog }
    }

    /// Update existing rows in place and prepend rows for new records,
    /// so progress ticks do not rebuild the list.
    fn sync_list(list: &gtk4::ListBox, empty_label: &gtk4::Label) {
        let downloads = download::all_downloads();
        empty_label.set_visible(downloads.is_empty());

        for record in &downloads {
            let mut found = false;
            let mut child = list.first_child();
            while let Some(widget) = child {
                if let Some(row) = widget.downcast_ref::<gtk4::ListBoxRow>() {
                    if let Some(download_row) =
                        row.child().and_then(|c| c.downcast::<DownloadRow>().ok())
                    {
                        if download_row.download_id() == record.id {
                            download_row.update(record);
                            found = true;
                            break;
                        }
                    }
                }
                child = widget.next_sibling();
            }

            if !found {
                let row = DownloadRow::new();
                row.update(record);
                row.connect_cancel_clicked(download::cancel_download);
                list.prepend(&row);
            }
        }
    }

    /// Present the dialog over the given window
    pub fn present(&self, parent: &impl IsA<gtk4::Widget>) {
        self.dialog.present(Some(parent.upcast_ref::<gtk4::Widget>()));
    }
}

impl Default for DownloadsDialog {
    fn default() -> Self {
        Self::new()
    }
}
