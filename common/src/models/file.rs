//! Script and macro file models.
//!
//! Both kinds share the same shapes and naming rules; [`FileKind`] tells them
//! apart where storage and error messages differ.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Suffix every script and macro file name must carry.
pub const REQUIRED_SUFFIX: &str = ".sql";

/// Kind of stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Script,
    MacroFile,
}

impl FileKind {
    /// Resource name used in logs and error messages.
    pub fn resource(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::MacroFile => "macro file",
        }
    }

    /// Metadata table holding records of this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::Script => "scripts",
            Self::MacroFile => "macro_files",
        }
    }

    /// Directory, relative to the data dir, holding the content.
    pub fn storage_dir(self) -> &'static str {
        match self {
            Self::Script => "scripts",
            Self::MacroFile => "macros",
        }
    }
}

/// Stored file as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileOut {
    pub id: i64,
    /// Storage path relative to the data directory.
    pub path: String,
    pub name: String,
    /// Extension of the display name, without the dot.
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileContentOut {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExistsOut {
    pub exists: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeletedOut {
    pub id: i64,
    pub deleted: bool,
}

/// Request body for creating a file.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFileIn {
    #[validate(
        length(min = 5, message = "File name must be at least 5 characters"),
        custom(function = "validate_file_name")
    )]
    pub name: String,

    #[serde(default)]
    pub content: Option<String>,
}

/// Request body for updating a file. At least one field is required.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "at_least_one_file_field"))]
pub struct UpdateFileIn {
    #[serde(default)]
    #[validate(
        length(min = 5, message = "File name must be at least 5 characters"),
        custom(function = "validate_file_name")
    )]
    pub name: Option<String>,

    #[serde(default)]
    pub content: Option<String>,
}

/// Request body for renaming a file.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RenameFileIn {
    #[validate(
        length(min = 5, message = "File name must be at least 5 characters"),
        custom(function = "validate_file_name")
    )]
    pub name: String,
}

/// Request body for replacing a file's content.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateContentIn {
    pub content: String,
}

/// Checks the naming rule shared by every create, update and rename.
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    if !name.ends_with(REQUIRED_SUFFIX) {
        return Err(ValidationError::new("suffix")
            .with_message("File name must end with .sql".into()));
    }
    if name.contains(['/', '\\']) {
        return Err(ValidationError::new("path")
            .with_message("File name must not contain path separators".into()));
    }
    Ok(())
}

fn at_least_one_file_field(input: &UpdateFileIn) -> Result<(), ValidationError> {
    if input.name.is_none() && input.content.is_none() {
        return Err(ValidationError::new("at_least_one")
            .with_message("At least one argument must be provided.".into()));
    }
    Ok(())
}

/// Extension of a file name, without the dot.
pub fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string()
}
