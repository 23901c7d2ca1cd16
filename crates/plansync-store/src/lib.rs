//! # Plansync Store
//!
//! The [`RemoteStore`] capability contract, the live change-feed machinery,
//! and an in-memory reference store used by tests and local sessions.

pub mod memory;
pub mod store;
pub mod subscription;

pub use memory::MemoryStore;
pub use store::RemoteStore;
pub use subscription::{ChangeHub, Subscription};
