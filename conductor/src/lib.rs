//! Conductor: worker registry and concurrent score distribution.
//!
//! The library half of the `conductor` binary. Musicians and the CLI use
//! [`client::ConductorClient`] from here.

pub mod api;
pub mod baton;
pub mod client;
pub mod config;
pub mod error;
pub mod library;
pub mod lifecycle;
pub mod node;
pub mod score;
pub mod state;

pub use error::ConductorError;
pub use node::ConductorNode;
pub use state::AppState;
