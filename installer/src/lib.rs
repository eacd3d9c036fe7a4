//! outfitter installer library.
//!
//! This crate provides the core functionality for provisioning a developer
//! workstation: the checksum-verified artifact installer, the collaborator
//! steps it is sequenced with (system packages, third-party installer
//! commands, runtime version management, shell configuration, git aliases),
//! and the fail-fast plan orchestrator. It is used by the `outfitter` CLI
//! binary and can be consumed programmatically for testing or custom
//! provisioning workflows.
//!
//! # Modules
//!
//! - [`artefact`] - Checksum-verified artifact download, extraction, and commit
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Provisioning manifest loading and validation
//! - [`error`] - Semantic error types for pipeline and step failures
//! - [`git`] - Global git alias configuration
//! - [`output`] - Console reporting helpers
//! - [`packages`] - System package-manager wrapper
//! - [`plan`] - Provisioning plan construction and fail-fast execution
//! - [`runtime`] - Version-manager-installed runtime setup
//! - [`scripts`] - Third-party installer command execution
//! - [`shellcfg`] - Shell configuration fragment management

pub mod artefact;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod output;
pub mod packages;
pub mod plan;
pub mod runtime;
pub mod scripts;
pub mod shellcfg;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
