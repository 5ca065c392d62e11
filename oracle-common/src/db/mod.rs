//! Database models and queries

pub mod agents;
pub mod events;
pub mod init;
pub mod models;

pub use agents::*;
pub use events::*;
pub use init::*;
pub use models::*;
