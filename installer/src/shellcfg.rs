//! Shell configuration fragment management.
//!
//! Installs a fixed shell fragment into the target user's home and wires
//! it into the shell startup file. Content digests decide whether the
//! fragment needs rewriting, and the sourcing directive is appended only
//! when absent, so repeated runs leave both files alone. When the process
//! is elevated, ownership of anything written is handed back to the
//! target user.

use crate::config::ShellFragmentConfig;
use crate::error::{StepError, StepResult};
use camino::Utf8Path;
use outfitter_common::digest::hash_bytes;
use outfitter_common::exec::{CommandExecutor, Invocation, stderr_text};
use outfitter_common::user::TargetUser;

/// What the shell configuration step changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ShellReport {
    /// Whether the fragment file was written.
    pub fragment_written: bool,
    /// Whether the sourcing directive was appended to the startup file.
    pub source_line_added: bool,
}

impl ShellReport {
    /// True when the step changed nothing.
    #[must_use]
    pub fn unchanged(&self) -> bool {
        !self.fragment_written && !self.source_line_added
    }
}

/// Sync the shell fragment and its sourcing directive for `user`.
///
/// # Errors
///
/// Returns [`StepError::ShellConfig`] when the fragment source cannot be
/// read, either file cannot be written, or ownership cannot be restored.
pub fn sync(
    executor: &dyn CommandExecutor,
    config: &ShellFragmentConfig,
    user: &TargetUser,
) -> StepResult<ShellReport> {
    let fragment =
        std::fs::read(config.fragment.as_std_path()).map_err(|e| StepError::ShellConfig {
            message: format!("could not read fragment {}: {e}", config.fragment),
        })?;

    let target = user.home().join(&config.target_name);
    let fragment_written = write_if_changed(&target, &fragment)?;

    let rc_path = user.home().join(&config.rc_file);
    let line = source_line(&config.target_name);
    let source_line_added = ensure_line(&rc_path, &line)?;

    if user.needs_privilege_drop() {
        if fragment_written {
            restore_ownership(executor, user, &target)?;
        }
        if source_line_added {
            restore_ownership(executor, user, &rc_path)?;
        }
    }

    Ok(ShellReport {
        fragment_written,
        source_line_added,
    })
}

/// The directive appended to the startup file.
fn source_line(target_name: &str) -> String {
    format!(". \"$HOME/{target_name}\"")
}

/// Write `contents` to `target` unless the digests already match.
fn write_if_changed(target: &Utf8Path, contents: &[u8]) -> StepResult<bool> {
    if let Ok(existing) = std::fs::read(target.as_std_path()) {
        if hash_bytes(&existing) == hash_bytes(contents) {
            return Ok(false);
        }
    }
    std::fs::write(target.as_std_path(), contents).map_err(|e| StepError::ShellConfig {
        message: format!("could not write {target}: {e}"),
    })?;
    Ok(true)
}

/// Append `line` to `rc_path` unless an identical line is present.
fn ensure_line(rc_path: &Utf8Path, line: &str) -> StepResult<bool> {
    let existing = match std::fs::read_to_string(rc_path.as_std_path()) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(StepError::ShellConfig {
                message: format!("could not read {rc_path}: {e}"),
            });
        }
    };
    if existing.lines().any(|l| l.trim() == line) {
        return Ok(false);
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');
    std::fs::write(rc_path.as_std_path(), updated).map_err(|e| StepError::ShellConfig {
        message: format!("could not write {rc_path}: {e}"),
    })?;
    Ok(true)
}

/// Hand ownership of a freshly-written file back to the target user.
fn restore_ownership(
    executor: &dyn CommandExecutor,
    user: &TargetUser,
    path: &Utf8Path,
) -> StepResult<()> {
    let invocation = Invocation::new(
        "chown",
        vec![user.name().to_owned(), path.as_str().to_owned()],
    );
    let output = executor.run(&invocation).map_err(|e| StepError::ShellConfig {
        message: format!("could not chown {path}: {e}"),
    })?;
    if !output.status.success() {
        return Err(StepError::ShellConfig {
            message: format!("chown {path} failed: {}", stderr_text(&output)),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, success_output};
    use camino::Utf8PathBuf;

    struct Fixture {
        _temp_dir: tempfile::TempDir,
        home: Utf8PathBuf,
        config: ShellFragmentConfig,
    }

    fn fixture() -> Fixture {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let home = Utf8PathBuf::try_from(temp_dir.path().join("home")).expect("UTF-8 path");
        std::fs::create_dir_all(&home).expect("mkdir home");

        let fragment_src = Utf8PathBuf::try_from(temp_dir.path().join("outfitter.sh"))
            .expect("UTF-8 path");
        std::fs::write(&fragment_src, b"export EDITOR=vim\n").expect("write fragment");

        let config = ShellFragmentConfig {
            fragment: fragment_src,
            target_name: ".outfitter.sh".to_owned(),
            rc_file: ".bashrc".to_owned(),
        };
        Fixture {
            _temp_dir: temp_dir,
            home,
            config,
        }
    }

    fn user_at(home: &Utf8Path) -> TargetUser {
        TargetUser::with_home("dev", home.to_owned(), false)
    }

    #[test]
    fn first_sync_writes_fragment_and_source_line() {
        let fx = fixture();
        let executor = StubExecutor::new(Vec::new());

        let report = sync(&executor, &fx.config, &user_at(&fx.home)).expect("sync succeeds");
        assert!(report.fragment_written);
        assert!(report.source_line_added);

        let rc = std::fs::read_to_string(fx.home.join(".bashrc").as_std_path()).expect("read rc");
        assert!(rc.contains(". \"$HOME/.outfitter.sh\""));
        let fragment =
            std::fs::read(fx.home.join(".outfitter.sh").as_std_path()).expect("read fragment");
        assert_eq!(fragment, b"export EDITOR=vim\n");
    }

    #[test]
    fn second_sync_changes_nothing() {
        let fx = fixture();
        let executor = StubExecutor::new(Vec::new());
        let user = user_at(&fx.home);

        sync(&executor, &fx.config, &user).expect("first sync");
        let report = sync(&executor, &fx.config, &user).expect("second sync");
        assert!(report.unchanged());

        let rc = std::fs::read_to_string(fx.home.join(".bashrc").as_std_path()).expect("read rc");
        assert_eq!(rc.matches(".outfitter.sh").count(), 1);
    }

    #[test]
    fn changed_fragment_source_is_rewritten() {
        let fx = fixture();
        let executor = StubExecutor::new(Vec::new());
        let user = user_at(&fx.home);

        sync(&executor, &fx.config, &user).expect("first sync");
        std::fs::write(fx.config.fragment.as_std_path(), b"export EDITOR=hx\n")
            .expect("update source");

        let report = sync(&executor, &fx.config, &user).expect("second sync");
        assert!(report.fragment_written);
        assert!(!report.source_line_added);

        let fragment =
            std::fs::read(fx.home.join(".outfitter.sh").as_std_path()).expect("read fragment");
        assert_eq!(fragment, b"export EDITOR=hx\n");
    }

    #[test]
    fn existing_rc_content_is_preserved() {
        let fx = fixture();
        let executor = StubExecutor::new(Vec::new());
        std::fs::write(
            fx.home.join(".bashrc").as_std_path(),
            b"export PATH=\"$HOME/bin:$PATH\"",
        )
        .expect("seed rc");

        sync(&executor, &fx.config, &user_at(&fx.home)).expect("sync succeeds");
        let rc = std::fs::read_to_string(fx.home.join(".bashrc").as_std_path()).expect("read rc");
        assert!(rc.starts_with("export PATH"));
        assert!(rc.ends_with(". \"$HOME/.outfitter.sh\"\n"));
    }

    #[test]
    fn elevated_sync_restores_ownership_of_written_files() {
        let fx = fixture();
        let fragment_path = fx.home.join(".outfitter.sh");
        let rc_path = fx.home.join(".bashrc");
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("chown", &["dev", fragment_path.as_str()], Ok(success_output())),
            ExpectedCall::new("chown", &["dev", rc_path.as_str()], Ok(success_output())),
        ]);
        let user = TargetUser::with_home("dev", fx.home.clone(), true);

        let report = sync(&executor, &fx.config, &user).expect("sync succeeds");
        assert!(report.fragment_written);
        assert_eq!(executor.remaining(), 0);
    }

    #[test]
    fn missing_fragment_source_is_an_error() {
        let fx = fixture();
        let executor = StubExecutor::new(Vec::new());
        std::fs::remove_file(fx.config.fragment.as_std_path()).expect("remove source");

        let err = sync(&executor, &fx.config, &user_at(&fx.home)).expect_err("sync fails");
        assert!(err.to_string().contains("could not read fragment"));
    }
}
