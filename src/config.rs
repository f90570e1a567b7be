/// Application ID (reverse domain notation)
pub const APP_ID: &str = "dev.vireo.browser";

/// Application name
pub const APP_NAME: &str = "vireo";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Homepage loaded by the first tab
pub const DEFAULT_HOMEPAGE: &str = "https://www.google.com";

/// Default new tab page
pub const NEW_TAB_URL: &str = "about:blank";

/// Default window size
pub const DEFAULT_WINDOW_WIDTH: i32 = 1200;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 800;

/// Settings filename inside the profile directory
pub const SETTINGS_FILE: &str = "settings.json";

// ============================================================================
// Search Engines
// ============================================================================

/// Placeholder token substituted with the encoded query in search templates
pub const SEARCH_PLACEHOLDER: &str = "%s";

/// Fallback search URL template when the configured engine is unusable
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=%s";

/// Available search engines: (id, display_name, url_template)
pub const SEARCH_ENGINES: &[(&str, &str, &str)] = &[
    ("google", "Google", "https://www.google.com/search?q=%s"),
    ("duckduckgo", "DuckDuckGo", "https://duckduckgo.com/?q=%s"),
    ("bing", "Bing", "https://www.bing.com/search?q=%s"),
    ("custom", "Custom", ""),
];

// ============================================================================
// Updates
// ============================================================================

/// Plaintext latest-version endpoint
pub const UPDATE_VERSION_URL: &str =
    "https://github.com/vireo-browser/vireo/releases/latest/download/VERSION";

/// Base URL for versioned release downloads
pub const UPDATE_RELEASE_URL_BASE: &str =
    "https://github.com/vireo-browser/vireo/releases/download";

/// Release asset name; the detached signature adds a `.sig` suffix
pub const UPDATE_RELEASE_ASSET: &str = "vireo-x86_64";

/// Timeout for update-related HTTP requests (seconds)
pub const UPDATE_TIMEOUT_SECS: u32 = 10;

/// Ed25519 public key release signatures are verified against
pub const RELEASE_PUBLIC_KEY: [u8; 32] = [
    0x87, 0x55, 0x6d, 0x6d, 0x12, 0x00, 0x60, 0x8f, 0xb6, 0x4f, 0x32, 0xf5, 0x30, 0xfa, 0x8f,
    0xd2, 0x0d, 0xc8, 0x61, 0x35, 0x46, 0x25, 0x22, 0xe9, 0x3e, 0xc7, 0x1a, 0xfd, 0xf8, 0xed,
    0x1e, 0x35,
];

/// Subdirectory of the profile directory where staged updates are written
pub const UPDATES_DIR: &str = "updates";
