//! Jokes Application Library
//!
//! Service modules plus the bootstrap that wires them to the database and
//! the HTTP server.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::App;
pub use modules::*;
