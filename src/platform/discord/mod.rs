//! Discord HTTP API: REST collaborators and inbound request verification.

mod rest;
pub(crate) mod verify;

pub use rest::DiscordRest;
pub use verify::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER, VerifyError};
