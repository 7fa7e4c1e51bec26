//! Domain layer for the static ZPA policy plugin.

mod client;
pub mod service;

pub use service::Service;
