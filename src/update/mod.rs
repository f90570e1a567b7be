//! Release update checking and replacement.
//!
//! The running binary never rewrites itself. A newer release is downloaded
//! and staged inside the profile directory, its detached signature checked
//! against the embedded release key, and the staged binary is launched in
//! updater mode to rename itself over the installed one and relaunch it.

use crate::config;
use gtk4::prelude::*;
use libadwaita::prelude::*;
use ring::signature;
use soup::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug)]
pub enum UpdateError {
    Fetch(String),
    Signature,
    Io(std::io::Error),
}

impl std::fmt::Display for UpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            UpdateError::Signature => write!(f, "Signature verification failed"),
            UpdateError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for UpdateError {}

impl From<std::io::Error> for UpdateError {
    fn from(e: std::io::Error) -> Self {
        UpdateError::Io(e)
    }
}

/// Check the published version string and, with the user's consent, stage
/// a verified replacement binary. Returns the staged path, or `None` when
/// there is nothing to do.
pub async fn check_and_stage(
    window: &libadwaita::ApplicationWindow,
    updates_dir: &Path,
) -> Result<Option<PathBuf>, UpdateError> {
    let session = soup::Session::new();
    session.set_timeout(config::UPDATE_TIMEOUT_SECS);

    let remote = fetch_text(&session, config::UPDATE_VERSION_URL).await?;
    let version = match update_available(&remote, config::APP_VERSION) {
        Some(v) => v.to_string(),
        None => {
            log::debug!("No update available (running {})", config::APP_VERSION);
            return Ok(None);
        }
    };

    log::info!("Update available: {} -> {}", config::APP_VERSION, version);

    if !confirm_update(window, &version).await {
        log::info!("Update to {} declined", version);
        return Ok(None);
    }

    let asset_url = format!(
        "{}/v{}/{}",
        config::UPDATE_RELEASE_URL_BASE,
        version,
        config::UPDATE_RELEASE_ASSET
    );
    let signature_url = format!("{}.sig", asset_url);

    let payload = fetch_bytes(&session, &asset_url).await?;
    let detached = fetch_bytes(&session, &signature_url).await?;
    verify_release(&payload, &detached, &config::RELEASE_PUBLIC_KEY)?;

    let staged = stage_release(updates_dir, &version, &payload)?;
    log::info!("Release {} staged at {:?}", version, staged);
    Ok(Some(staged))
}

/// Hand control to a staged binary. It replaces the installed executable
/// and relaunches it with the arguments forwarded here.
pub fn launch_staged(staged: &Path) -> Result<(), UpdateError> {
    let current = std::env::current_exe()?;

    let mut command = Command::new(staged);
    command.arg("--apply-update").arg(&current);
    command.args(std::env::args().skip(1));
    command.spawn()?;

    log::info!("Updater launched from {:?}", staged);
    Ok(())
}

/// Updater mode: the staged binary copies itself over `target` and
/// relaunches it. The rename keeps any instance still executing the old
/// inode alive.
pub fn apply_update(target: &Path, forwarded_args: &[String]) -> Result<(), UpdateError> {
    let staged = std::env::current_exe()?;
    log::info!("Applying update: {:?} -> {:?}", staged, target);

    // Written next to the target so the final rename stays on one filesystem
    let replacement = target.with_extension("new");
    fs::copy(&staged, &replacement)?;
    make_executable(&replacement)?;
    fs::rename(&replacement, target)?;

    log::info!("Relaunching {:?}", target);
    Command::new(target).args(forwarded_args).spawn()?;
    Ok(())
}

/// A published version counts as an update when it is non-empty and
/// differs from the running one
pub fn update_available<'a>(remote: &'a str, current: &str) -> Option<&'a str> {
    let remote = remote.trim();
    if remote.is_empty() || remote == current {
        None
    } else {
        Some(remote)
    }
}

/// Check a release payload against its detached Ed25519 signature
pub fn verify_release(
    payload: &[u8],
    detached: &[u8],
    public_key: &[u8],
) -> Result<(), UpdateError> {
    let key = signature::UnparsedPublicKey::new(&signature::ED25519, public_key);
    key.verify(payload, detached)
        .map_err(|_| UpdateError::Signature)
}

async fn confirm_update(window: &libadwaita::ApplicationWindow, version: &str) -> bool {
    let dialog = libadwaita::AlertDialog::new(
        Some("Update Available"),
        Some(&format!(
            "Version {} is ready to install. The browser will restart.",
            version
        )),
    );
    dialog.add_response("cancel", "Not Now");
    dialog.add_response("update", "Update");
    dialog.set_response_appearance("update", libadwaita::ResponseAppearance::Suggested);
    dialog.set_default_response(Some("update"));
    dialog.set_close_response("cancel");

    dialog.choose_future(window).await == "update"
}

/// Fetch a URL as text using soup
async fn fetch_text(session: &soup::Session, url: &str) -> Result<String, UpdateError> {
    let bytes = fetch_bytes(session, url).await?;
    String::from_utf8(bytes).map_err(|e| UpdateError::Fetch(format!("Invalid UTF-8: {}", e)))
}

/// Fetch a URL as raw bytes using soup
async fn fetch_bytes(session: &soup::Session, url: &str) -> Result<Vec<u8>, UpdateError> {
    let message = soup::Message::new("GET", url)
        .map_err(|e| UpdateError::Fetch(format!("Invalid URL: {}", e)))?;

    let bytes = session
        .send_and_read_future(&message, soup::glib::Priority::DEFAULT)
        .await
        .map_err(|e| UpdateError::Fetch(format!("Request failed: {}", e)))?;

    let status = message.status();
    if status != soup::Status::Ok {
        return Err(UpdateError::Fetch(format!("HTTP error: {:?}", status)));
    }

    Ok(bytes.to_vec())
}

/// Write a verified payload into the updates directory, ready to run
fn stage_release(updates_dir: &Path, version: &str, payload: &[u8]) -> Result<PathBuf, UpdateError> {
    fs::create_dir_all(updates_dir)?;

    let staged = updates_dir.join(format!("{}-{}", config::UPDATE_RELEASE_ASSET, version));
    fs::write(&staged, payload)?;
    make_executable(&staged)?;
    Ok(staged)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::KeyPair;

    fn test_key_pair() -> signature::Ed25519KeyPair {
        let rng = ring::rand::SystemRandom::new();
        let pkcs8 = signature::Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        signature::Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap()
    }

    #[test]
    fn test_newer_version_is_an_update() {
        assert_eq!(update_available("0.3.0", "0.2.0"), Some("0.3.0"));
    }

    #[test]
    fn test_same_version_is_not_an_update() {
        assert_eq!(update_available("0.2.0", "0.2.0"), None);
    }

    #[test]
    fn test_version_string_is_trimmed() {
        assert_eq!(update_available("0.2.0\n", "0.2.0"), None);
        assert_eq!(update_available("  0.3.0\n", "0.2.0"), Some("0.3.0"));
    }

    #[test]
    fn test_empty_version_is_skipped() {
        assert_eq!(update_available("", "0.2.0"), None);
        assert_eq!(update_available("  \n", "0.2.0"), None);
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        let key_pair = test_key_pair();
        let payload = b"release payload";
        let sig = key_pair.sign(payload);

        let result = verify_release(payload, sig.as_ref(), key_pair.public_key().as_ref());
        assert!(result.is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let key_pair = test_key_pair();
        let sig = key_pair.sign(b"release payload");

        let result = verify_release(b"release payloaD", sig.as_ref(), key_pair.public_key().as_ref());
        assert!(matches!(result, Err(UpdateError::Signature)));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let signer = test_key_pair();
        let other = test_key_pair();
        let payload = b"release payload";
        let sig = signer.sign(payload);

        let result = verify_release(payload, sig.as_ref(), other.public_key().as_ref());
        assert!(matches!(result, Err(UpdateError::Signature)));
    }

    #[test]
    fn test_verify_rejects_truncated_signature() {
        let key_pair = test_key_pair();
        let payload = b"release payload";
        let sig = key_pair.sign(payload);

        let truncated = &sig.as_ref()[..sig.as_ref().len() - 1];
        let result = verify_release(payload, truncated, key_pair.public_key().as_ref());
        assert!(matches!(result, Err(UpdateError::Signature)));
    }

    #[test]
    fn test_stage_release_writes_runnable_file() {
        let dir = std::env::temp_dir().join(format!("vireo-stage-{}", std::process::id()));
        let payload = b"#!/bin/sh\nexit 0\n";

        let staged = stage_release(&dir, "9.9.9", payload).unwrap();
        assert!(staged.ends_with("vireo-x86_64-9.9.9"));
        assert_eq!(fs::read(&staged).unwrap(), payload);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&staged).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0);
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
