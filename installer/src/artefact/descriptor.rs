//! Artifact descriptors and installation outcomes.

use crate::error::InstallError;
use outfitter_common::digest::Sha256Digest;
use serde::Deserialize;

/// Where inside the install root a tool's files land.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallLayout {
    /// Copy the archive root's contents directly into the install root.
    ///
    /// Suits archives that ship their own `bin/`, `share/`, etc. hierarchy.
    #[default]
    Tree,
    /// Copy into the install root's `bin/` subdirectory.
    ///
    /// Suits single-binary tools whose archive root holds the executable
    /// next to licences and completions.
    Bin,
}

/// Describes one prebuilt tool to fetch, verify, and install.
///
/// Constructed by manifest deserialization; immutable thereafter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
    /// Unique identifier, also the executable name used by the presence
    /// check.
    pub name: String,

    /// URL of the release archive (gzip-compressed tar).
    #[serde(rename = "url")]
    pub source_url: String,

    /// Expected SHA-256 of the archive. Verification is skipped when
    /// absent; when present, a mismatch is a hard stop.
    #[serde(default, rename = "sha256", deserialize_with = "de_opt_digest")]
    pub expected_digest: Option<Sha256Digest>,

    /// Prefix of the archive's top-level directory, for archives whose
    /// directory name carries a version suffix. Defaults to `name`.
    #[serde(default)]
    pub archive_root: Option<String>,

    /// Placement inside the install root.
    #[serde(default)]
    pub layout: InstallLayout,
}

impl ToolSpec {
    /// The prefix used to locate the extracted top-level directory.
    #[must_use]
    pub fn root_prefix(&self) -> &str {
        self.archive_root.as_deref().unwrap_or(&self.name)
    }

    /// File name the download is stored under in the staging area.
    pub(crate) fn archive_file_name(&self) -> String {
        self.source_url
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{}.tar.gz", self.name))
    }
}

/// Deserialize an optional hex digest string into a validated wrapper.
fn de_opt_digest<'de, D>(deserializer: D) -> Result<Option<Sha256Digest>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| Sha256Digest::try_from(value).map_err(serde::de::Error::custom))
        .transpose()
}

/// The outcome of one installation attempt.
///
/// Deliberately not a `Result`: "already present" is the normal idempotent
/// path, and the orchestrator decides what a failure means for the rest of
/// the run.
#[derive(Debug)]
pub enum InstallOutcome {
    /// The tool already resolves on the search path; nothing was done.
    AlreadyPresent,
    /// The tool was fetched, verified, extracted, and committed.
    Installed,
    /// The attempt failed; the install location is unchanged.
    Failed(InstallError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> Result<ToolSpec, toml::de::Error> {
        toml::from_str(toml_text)
    }

    #[test]
    fn deserializes_full_tool_entry() {
        let digest = "c".repeat(64);
        let spec = parse(&format!(
            r#"
            name = "bat"
            url = "https://example.test/bat-v0.26.0-x86_64.tar.gz"
            sha256 = "{digest}"
            archive_root = "bat-"
            layout = "bin"
            "#
        ))
        .expect("valid entry");

        assert_eq!(spec.name, "bat");
        assert_eq!(spec.root_prefix(), "bat-");
        assert_eq!(spec.layout, InstallLayout::Bin);
        assert_eq!(
            spec.expected_digest.as_ref().map(|d| d.as_str().to_owned()),
            Some(digest)
        );
    }

    #[test]
    fn defaults_apply_for_minimal_entry() {
        let spec = parse(
            r#"
            name = "fd"
            url = "https://example.test/fd.tar.gz"
            "#,
        )
        .expect("valid entry");

        assert_eq!(spec.root_prefix(), "fd");
        assert_eq!(spec.layout, InstallLayout::Tree);
        assert!(spec.expected_digest.is_none());
    }

    #[test]
    fn malformed_digest_is_rejected_at_parse_time() {
        let err = parse(
            r#"
            name = "bat"
            url = "https://example.test/bat.tar.gz"
            sha256 = "not-a-digest"
            "#,
        )
        .expect_err("digest must be rejected");
        assert!(err.to_string().contains("malformed SHA-256 digest"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = parse(
            r#"
            name = "bat"
            url = "https://example.test/bat.tar.gz"
            checksum = "typo-field"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn archive_file_name_uses_last_url_segment() {
        let spec = parse(
            r#"
            name = "bat"
            url = "https://example.test/release/bat-v0.26.0.tar.gz"
            "#,
        )
        .expect("valid entry");
        assert_eq!(spec.archive_file_name(), "bat-v0.26.0.tar.gz");
    }

    #[test]
    fn archive_file_name_falls_back_to_tool_name() {
        let spec = parse(
            r#"
            name = "bat"
            url = "https://example.test/download/"
            "#,
        )
        .expect("valid entry");
        assert_eq!(spec.archive_file_name(), "bat.tar.gz");
    }
}
