//! Target-user resolution for user-scoped provisioning steps.
//!
//! The provisioner is usually invoked with elevated privileges, but several
//! steps (shell configuration, runtime installation, git aliases) belong to
//! the ordinary user the machine is being set up for. This module resolves
//! that user once, at startup, from explicit environment evidence captured
//! into a [`UserEnv`] value so the steps themselves never read ambient
//! process state.

use camino::{Utf8Path, Utf8PathBuf};

/// Environment evidence used to resolve the target user.
///
/// Captured once via [`UserEnv::from_process`] and passed around
/// explicitly; tests construct it directly.
#[derive(Debug, Clone, Default)]
pub struct UserEnv {
    /// The invoking user name (`USER`), when set.
    pub current_user: Option<String>,
    /// The pre-elevation user name (`SUDO_USER`), when set.
    pub sudo_user: Option<String>,
    /// The invoking user's home directory (`HOME`), when set.
    pub home: Option<Utf8PathBuf>,
}

impl UserEnv {
    /// Capture the relevant environment variables from the current process.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            current_user: non_empty_var("USER"),
            sudo_user: non_empty_var("SUDO_USER"),
            home: non_empty_var("HOME").map(Utf8PathBuf::from),
        }
    }
}

/// Read an environment variable, treating empty values as unset.
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Errors arising from target-user resolution.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// No usable user identity could be derived from the environment.
    #[error("could not determine target user: {reason}")]
    Unresolved {
        /// Description of what evidence was missing.
        reason: String,
    },
}

/// The non-privileged user on whose behalf user-scoped steps run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUser {
    name: String,
    home: Utf8PathBuf,
    drop_privileges: bool,
}

impl TargetUser {
    /// Construct a target user from explicit values.
    ///
    /// Used for manifest overrides; `drop_privileges` records whether the
    /// process is running elevated relative to this user, so user-scoped
    /// commands are wrapped accordingly.
    #[must_use]
    pub fn with_home(name: &str, home: Utf8PathBuf, drop_privileges: bool) -> Self {
        Self {
            name: name.to_owned(),
            home,
            drop_privileges,
        }
    }

    /// Resolve the target user from captured environment evidence.
    ///
    /// When the process was elevated via sudo, the pre-elevation user is the
    /// target and user-scoped commands must drop privileges. Otherwise the
    /// invoking user is the target. The sudo branch derives the home
    /// directory from the conventional `/home/<name>` layout; manifests can
    /// override the user when that convention does not hold.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Unresolved`] when neither sudo evidence nor a
    /// usable `USER`/`HOME` pair is available.
    pub fn resolve(env: &UserEnv) -> Result<Self, UserError> {
        match env.sudo_user.as_deref() {
            Some(sudo_user) if sudo_user != "root" => {
                return Ok(Self {
                    name: sudo_user.to_owned(),
                    home: Utf8PathBuf::from(format!("/home/{sudo_user}")),
                    drop_privileges: true,
                });
            }
            _ => {}
        }

        let name = env
            .current_user
            .clone()
            .ok_or_else(|| UserError::Unresolved {
                reason: "neither SUDO_USER nor USER is set".to_owned(),
            })?;
        let home = env.home.clone().ok_or_else(|| UserError::Unresolved {
            reason: "HOME is not set".to_owned(),
        })?;

        Ok(Self {
            name,
            home,
            drop_privileges: false,
        })
    }

    /// The target user's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The target user's home directory.
    #[must_use]
    pub fn home(&self) -> &Utf8Path {
        &self.home
    }

    /// Whether user-scoped commands must drop privileges to this user.
    #[must_use]
    pub fn needs_privilege_drop(&self) -> bool {
        self.drop_privileges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sudo_user_takes_precedence() {
        let env = UserEnv {
            current_user: Some("root".to_owned()),
            sudo_user: Some("dev".to_owned()),
            home: Some(Utf8PathBuf::from("/root")),
        };
        let user = TargetUser::resolve(&env).expect("resolvable");
        assert_eq!(user.name(), "dev");
        assert_eq!(user.home(), Utf8Path::new("/home/dev"));
        assert!(user.needs_privilege_drop());
    }

    #[test]
    fn plain_invocation_uses_current_user_and_home() {
        let env = UserEnv {
            current_user: Some("dev".to_owned()),
            sudo_user: None,
            home: Some(Utf8PathBuf::from("/home/dev")),
        };
        let user = TargetUser::resolve(&env).expect("resolvable");
        assert_eq!(user.name(), "dev");
        assert_eq!(user.home(), Utf8Path::new("/home/dev"));
        assert!(!user.needs_privilege_drop());
    }

    #[test]
    fn sudo_as_root_falls_back_to_current_user() {
        let env = UserEnv {
            current_user: Some("root".to_owned()),
            sudo_user: Some("root".to_owned()),
            home: Some(Utf8PathBuf::from("/root")),
        };
        let user = TargetUser::resolve(&env).expect("resolvable");
        assert_eq!(user.name(), "root");
        assert!(!user.needs_privilege_drop());
    }

    #[test]
    fn missing_identity_is_an_error() {
        let env = UserEnv::default();
        let err = TargetUser::resolve(&env).expect_err("unresolvable");
        assert!(err.to_string().contains("SUDO_USER"));
    }

    #[test]
    fn missing_home_is_an_error() {
        let env = UserEnv {
            current_user: Some("dev".to_owned()),
            sudo_user: None,
            home: None,
        };
        let err = TargetUser::resolve(&env).expect_err("unresolvable");
        assert!(err.to_string().contains("HOME"));
    }

    #[test]
    fn from_process_reads_captured_variables() {
        temp_env::with_vars(
            [
                ("USER", Some("builder")),
                ("SUDO_USER", None::<&str>),
                ("HOME", Some("/home/builder")),
            ],
            || {
                let env = UserEnv::from_process();
                assert_eq!(env.current_user.as_deref(), Some("builder"));
                assert!(env.sudo_user.is_none());
                assert_eq!(
                    env.home.as_deref(),
                    Some(Utf8Path::new("/home/builder"))
                );
            },
        );
    }

    #[test]
    fn empty_variables_are_treated_as_unset() {
        temp_env::with_vars([("SUDO_USER", Some(""))], || {
            let env = UserEnv::from_process();
            assert!(env.sudo_user.is_none());
        });
    }
}
