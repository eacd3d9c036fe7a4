//! Provisioning manifest loading and validation.
//!
//! The manifest replaces the ambient state a provisioning shell script
//! would lean on: install location, staging root, and target user are all
//! explicit fields here, and digest strings are validated at parse time so
//! a stale or mistyped checksum is reported before any step runs.

use crate::artefact::descriptor::ToolSpec;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Errors arising from manifest loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The manifest file could not be read.
    #[error("could not read manifest {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or fails field validation.
    #[error("invalid manifest {path}: {reason}")]
    Parse {
        /// Path of the offending manifest.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// The manifest parsed but its contents are inconsistent.
    #[error("invalid manifest: {reason}")]
    Invalid {
        /// Description of the inconsistency.
        reason: String,
    },
}

/// Package-manager configuration and package list.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Package-manager program.
    #[serde(default = "default_package_manager")]
    pub manager: String,

    /// Arguments for the index-refresh invocation.
    #[serde(default = "default_update_args")]
    pub update_args: Vec<String>,

    /// Arguments prepended to the package list for installation.
    #[serde(default = "default_install_args")]
    pub install_args: Vec<String>,

    /// Packages to install.
    #[serde(default)]
    pub names: Vec<String>,

    /// Whether to refresh the package index before installing.
    #[serde(default = "default_true")]
    pub update: bool,
}

fn default_package_manager() -> String {
    "apt-get".to_owned()
}

fn default_update_args() -> Vec<String> {
    vec!["update".to_owned()]
}

fn default_install_args() -> Vec<String> {
    vec!["install".to_owned(), "-y".to_owned()]
}

fn default_true() -> bool {
    true
}

/// A third-party installer command, guarded by a presence probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptConfig {
    /// Executable name whose presence makes this step a no-op.
    pub provides: String,

    /// Program to run.
    pub program: String,

    /// Arguments.
    #[serde(default)]
    pub args: Vec<String>,

    /// Run as the target user rather than the invoking user.
    #[serde(default)]
    pub run_as_user: bool,
}

/// Version-manager-installed runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Executable name of the runtime itself (the presence check).
    pub runtime: String,

    /// Version-manager program that installs it.
    pub manager: String,

    /// Arguments ahead of the version (defaults to `install`).
    #[serde(default = "default_runtime_args")]
    pub install_args: Vec<String>,

    /// Version to install.
    pub version: String,
}

fn default_runtime_args() -> Vec<String> {
    vec!["install".to_owned()]
}

/// Shell configuration fragment settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellFragmentConfig {
    /// Path to the fragment shipped alongside the manifest.
    pub fragment: Utf8PathBuf,

    /// File name the fragment is installed under in the user's home.
    #[serde(default = "default_fragment_name")]
    pub target_name: String,

    /// Startup file, relative to the user's home, that sources the
    /// fragment.
    #[serde(default = "default_rc_file")]
    pub rc_file: String,
}

fn default_fragment_name() -> String {
    ".outfitter.sh".to_owned()
}

fn default_rc_file() -> String {
    ".bashrc".to_owned()
}

/// Explicit target-user override.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// User name.
    pub name: String,
    /// Home directory.
    pub home: Utf8PathBuf,
}

/// The provisioning manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// System-wide install location for verified tool archives.
    pub install_root: Utf8PathBuf,

    /// Where staging areas are created (defaults to the system temp dir).
    #[serde(default)]
    pub staging_root: Option<Utf8PathBuf>,

    /// Explicit target-user override.
    #[serde(default)]
    pub user: Option<UserConfig>,

    /// System packages.
    #[serde(default)]
    pub packages: Option<PackageConfig>,

    /// Checksum-verified tools, applied in manifest order.
    #[serde(default, rename = "tool")]
    pub tools: Vec<ToolSpec>,

    /// Third-party installer commands, applied in manifest order.
    #[serde(default, rename = "script")]
    pub scripts: Vec<ScriptConfig>,

    /// Version-manager-installed runtime.
    #[serde(default)]
    pub runtime: Option<RuntimeConfig>,

    /// Shell configuration fragment.
    #[serde(default)]
    pub shell: Option<ShellFragmentConfig>,

    /// Global git aliases.
    #[serde(default)]
    pub git_aliases: BTreeMap<String, String>,
}

impl Manifest {
    /// Load and validate the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read,
    /// [`ConfigError::Parse`] for TOML or digest-format errors, and
    /// [`ConfigError::Invalid`] for inconsistent contents.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let manifest: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Cross-field validation beyond what deserialization enforces.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.install_root.as_str().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "install_root must not be empty".to_owned(),
            });
        }

        let mut seen = BTreeSet::new();
        for tool in &self.tools {
            if tool.name.is_empty() {
                return Err(ConfigError::Invalid {
                    reason: "tool entry with an empty name".to_owned(),
                });
            }
            if tool.source_url.is_empty() {
                return Err(ConfigError::Invalid {
                    reason: format!("tool {} has an empty url", tool.name),
                });
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(ConfigError::Invalid {
                    reason: format!("duplicate tool entry {}", tool.name),
                });
            }
        }

        Ok(())
    }
}
