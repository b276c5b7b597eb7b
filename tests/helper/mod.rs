//! Shared test utilities
#![allow(dead_code)]

pub mod handler;
pub mod index;

pub use handler::FakeHandler;
pub use index::create_test_index;
