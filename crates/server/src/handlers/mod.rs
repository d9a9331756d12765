//! HTTP request handlers organized by domain

pub mod categorize;
pub mod import;
pub mod learning;
pub mod reference;

pub use categorize::*;
pub use import::*;
pub use learning::*;
pub use reference::*;
