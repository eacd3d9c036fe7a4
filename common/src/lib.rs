//! Host-inspection and process primitives for the outfitter provisioner.
//!
//! This crate carries the pieces of outfitter that talk to the host rather
//! than to release archives: probing the search path for installed commands,
//! running external programs with bounded timeouts, resolving the
//! non-privileged user on whose behalf user-scoped steps run, and the
//! SHA-256 digest value type used for artifact and fragment verification.
//!
//! # Modules
//!
//! - [`digest`] - Validated SHA-256 digest strings and content hashing
//! - [`exec`] - External command execution with bounded timeouts
//! - [`probe`] - Side-effect-free command-presence probing
//! - [`user`] - Target-user resolution for user-scoped steps

pub mod digest;
pub mod exec;
pub mod probe;
pub mod user;
