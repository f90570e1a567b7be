//! WebView construction over the shared browsing profile.

use gtk4::prelude::*;
use url::Url;
use webkit6::prelude::WebViewExt as WebKitWebViewExt;
use webkit6::NetworkSession;

/// Bridges parsed `url::Url` values to the engine's string URI surface
pub trait WebViewExt {
    fn load_url(&self, url: &Url);
}

impl WebViewExt for webkit6::WebView {
    fn load_url(&self, url: &Url) {
        self.load_uri(url.as_str());
    }
}

fn engine_settings() -> webkit6::Settings {
    // Pages cannot open windows, read the clipboard, or navigate the top
    // frame to data: URLs without a user gesture. Kinetic scrolling stays
    // off; WebKit's implementation fights GNOME defaults.
    let settings = webkit6::Settings::builder()
        .enable_javascript(true)
        .javascript_can_open_windows_automatically(false)
        .javascript_can_access_clipboard(false)
        .allow_top_navigation_to_data_urls(false)
        .allow_file_access_from_file_urls(false)
        .allow_universal_access_from_file_urls(false)
        .enable_smooth_scrolling(false)
        .hardware_acceleration_policy(webkit6::HardwareAccelerationPolicy::Always)
        .enable_page_cache(true)
        .build();

    settings.set_user_agent_with_application_details(
        Some(crate::config::APP_NAME),
        Some(crate::config::APP_VERSION),
    );

    settings
}

/// Build a view over the profile's session so every tab shares cookies
/// and storage
pub fn create_webview(network_session: &NetworkSession) -> webkit6::WebView {
    let webview = webkit6::WebView::builder()
        .settings(&engine_settings())
        .network_session(network_session)
        .build();

    webview.set_hexpand(true);
    webview.set_vexpand(true);

    webview
}
