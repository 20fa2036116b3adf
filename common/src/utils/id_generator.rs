//! Unique ID generator.
//!
//! Provides utilities for generating unique identifiers.

use uuid::Uuid;

/// Generates unique identifiers for various entities.
pub struct IdGenerator;

impl IdGenerator {
    /// Generates a unique request ID.
    pub fn request_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Generates a storage file name carrying `extension`.
    ///
    /// Stored content is keyed by this name rather than the display name, so
    /// renames never move files.
    pub fn storage_name(extension: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        if extension.is_empty() {
            id
        } else {
            format!("{id}.{extension}")
        }
    }
}
