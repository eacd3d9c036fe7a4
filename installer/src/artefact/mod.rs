//! Checksum-verified artifact installation.
//!
//! The modules here implement the installer's one nontrivial contract:
//! fetch a release archive into an invocation-scoped staging area, verify
//! its SHA-256 digest before anything else happens, unpack it with
//! path-traversal protection, locate the expected top-level directory, and
//! only then commit the files into the install location.
//!
//! - [`descriptor`] - Artifact descriptors and installation outcomes
//! - [`download`] - HTTP fetch into the staging area
//! - [`staging`] - Invocation-scoped staging directory acquisition
//! - [`extraction`] - Gzip-tar unpacking and root-directory location
//! - [`commit`] - Mode-preserving, rename-into-place commit
//! - [`install`] - The pipeline tying the steps together

pub mod commit;
pub mod descriptor;
pub mod download;
pub mod extraction;
pub mod install;
pub mod staging;
