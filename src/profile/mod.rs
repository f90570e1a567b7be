mod manager;

pub use manager::{BrowsingProfile, ProfileError};
