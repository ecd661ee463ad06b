//! mockomatic-session library
//!
//! Session planning for mock clinical examinations: station timing, the
//! slot/run timeline and submission to the session API.

pub mod api;
pub mod assemble;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod submit;
