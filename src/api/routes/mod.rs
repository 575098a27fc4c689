//! API route handlers
//!
//! Split by resource: export jobs (create, inspect, download,
//! benchmark) and system endpoints (health, OpenAPI document).

pub mod exports;
pub mod system;

pub use exports::*;
pub use system::*;
