//! Configuration types
//!
//! Runtime configuration and validation of remote setting updates.

pub mod settings;
pub mod types;

pub use settings::{Setting, SettingChange};
pub use types::*;
