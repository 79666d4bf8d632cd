//! HTTP request handlers
//!
//! - `speak` - relays text to the speech engine

pub mod speak;
