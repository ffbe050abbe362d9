pub mod config;
pub mod error;
pub mod profile;
pub mod records;
pub mod stream;
pub mod tool;
pub mod trace;
