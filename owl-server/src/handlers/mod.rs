//! Handler模块

pub mod databases;
pub mod files;
pub mod health;
pub mod query;
