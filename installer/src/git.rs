//! Global git alias configuration.
//!
//! Applies the manifest's alias table with `git config --global`, as the
//! target user. Setting an alias to its current value is harmless, so the
//! step is idempotent by construction.

use crate::error::{StepError, StepResult};
use outfitter_common::exec::{CommandExecutor, Invocation, stderr_text};
use outfitter_common::user::TargetUser;
use std::collections::BTreeMap;

/// Apply the global git aliases, returning how many were set.
///
/// # Errors
///
/// Returns [`StepError::GitAlias`] naming the first alias that could not
/// be set.
pub fn apply_aliases(
    executor: &dyn CommandExecutor,
    aliases: &BTreeMap<String, String>,
    user: &TargetUser,
) -> StepResult<usize> {
    for (alias, expansion) in aliases {
        let invocation = Invocation::new(
            "git",
            vec![
                "config".to_owned(),
                "--global".to_owned(),
                format!("alias.{alias}"),
                expansion.clone(),
            ],
        )
        .as_user(user);

        let output = executor.run(&invocation).map_err(|e| StepError::GitAlias {
            alias: alias.clone(),
            message: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(StepError::GitAlias {
                alias: alias.clone(),
                message: stderr_text(&output),
            });
        }
    }
    Ok(aliases.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
    use camino::Utf8PathBuf;

    fn aliases() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("lg".to_owned(), "log --oneline --graph".to_owned()),
            ("st".to_owned(), "status -sb".to_owned()),
        ])
    }

    fn plain_user() -> TargetUser {
        TargetUser::with_home("dev", Utf8PathBuf::from("/home/dev"), false)
    }

    #[test]
    fn applies_aliases_in_deterministic_order() {
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("git", &["config", "--global", "alias.lg", "log --oneline --graph"], Ok(success_output())),
            ExpectedCall::new("git", &["config", "--global", "alias.st", "status -sb"], Ok(success_output())),
        ]);

        let count = apply_aliases(&executor, &aliases(), &plain_user()).expect("aliases apply");
        assert_eq!(count, 2);
        assert_eq!(executor.remaining(), 0);
    }

    #[test]
    fn elevated_process_sets_aliases_as_the_target_user() {
        let executor = StubExecutor::new(vec![ExpectedCall::new("sudo", &["-u", "dev", "--", "git", "config", "--global", "alias.st", "status -sb",], Ok(success_output()))]);
        let user = TargetUser::with_home("dev", Utf8PathBuf::from("/home/dev"), true);
        let aliases = BTreeMap::from([("st".to_owned(), "status -sb".to_owned())]);

        apply_aliases(&executor, &aliases, &user).expect("aliases apply");
        assert_eq!(executor.remaining(), 0);
    }

    #[test]
    fn failing_alias_is_named_in_the_error() {
        let executor = StubExecutor::new(vec![ExpectedCall::new("git", &["config", "--global", "alias.lg", "log --oneline --graph"], Ok(failure_output("error: could not lock config file")))]);

        let err = apply_aliases(&executor, &aliases(), &plain_user()).expect_err("step fails");
        let msg = err.to_string();
        assert!(msg.contains("lg"));
        assert!(msg.contains("could not lock config file"));
    }

    #[test]
    fn empty_alias_table_is_a_no_op() {
        let executor = StubExecutor::new(Vec::new());
        let count =
            apply_aliases(&executor, &BTreeMap::new(), &plain_user()).expect("no-op succeeds");
        assert_eq!(count, 0);
    }
}
