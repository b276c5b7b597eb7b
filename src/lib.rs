pub mod blacklist;
pub mod config;
pub mod error;
pub mod handler;
pub mod metadata;
pub mod package;
pub mod scan;
