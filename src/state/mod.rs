//! Shared in-process state.
//!
//! Ticket state itself lives on the platform (channel name and overwrites);
//! the only state held here is the per-channel operation registry.

mod registry;

pub use registry::{Admission, OperationRegistry, OperationSnapshot, TransitionGuard};
