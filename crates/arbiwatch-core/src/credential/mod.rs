//! Bearer credential lookup and the gate that guards authenticated sources.
//!
//! The token is issued and stored by an external auth subsystem. Every lookup
//! re-reads the underlying store so a token that shows up after start is seen
//! on the next check.

pub mod gate;
pub mod sources;

pub use gate::CredentialGate;
pub use sources::{
    ChainCredential, CredentialSource, EnvCredential, FileCredential, SharedCredential,
};
