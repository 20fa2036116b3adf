//! Request and response models shared by the services.

pub mod database;
pub mod file;
pub mod query;

// Re-export commonly used types
pub use database::{CreateDatabaseIn, DatabaseOut, UpdateDatabaseIn, UserOut, MAX_POOL_SIZE};
pub use file::{
    CreateFileIn, DeletedOut, ExistsOut, FileContentOut, FileKind, FileOut, RenameFileIn,
    UpdateContentIn, UpdateFileIn,
};
pub use query::{RunIn, RunOut, RunQuery, StatementType};
