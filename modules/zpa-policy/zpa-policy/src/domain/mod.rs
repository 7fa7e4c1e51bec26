//! Domain layer for the ZPA policy module.

pub mod error;
pub mod local_client;
pub mod locks;
pub mod order;
pub mod service;

pub use error::DomainError;
pub use local_client::ZpaPolicyLocalClient;
pub use locks::{PolicyListGuard, PolicyListLocks};
pub use service::Service;
