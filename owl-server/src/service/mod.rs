//! 业务服务模块

pub mod database;
pub mod file;
pub mod query;

pub use database::{DatabaseService, DatabaseServiceTrait};
pub use file::{FileService, FileServiceTrait};
pub use query::QueryService;
