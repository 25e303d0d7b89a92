pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod paths;
pub mod session;
pub mod srs;
pub mod store;
pub mod study;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Result, SrsError};
