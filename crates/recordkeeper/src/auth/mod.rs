//! Login, lockout and first-run bootstrap.
//!
//! [`Authenticator`] drives a small state machine:
//!
//! ```text
//! Bootstrap ───────────────────────────────► Authenticated
//! LoginPrompt ─┬─ password ok ─────────────► Authenticated
//!              ├─ wrong password, limit ───► LockedOut
//!              ├─ inactive account ────────► Failed
//!              ├─ unknown user, limit ─────► Failed
//!              ├─ prompt budget spent ─────► Failed
//!              └─ anything else ───────────► LoginPrompt
//! ```
//!
//! Each username has its own failure counter, and only that counter decides
//! lockout. Separately, the session allows at most `max_login_attempts`
//! prompts in total. Counters live in the authenticator, so they last for one
//! run of the workflow.

pub mod accounts;
pub mod password;

use std::collections::HashMap;
use std::fmt;

use tracing::{error, info, warn};

use crate::config::AuthConfig;
use crate::error::Result;
use crate::prompt::Prompt;
use crate::storage::credentials::{Credential, CredentialStore};

pub use accounts::create_system_user;
pub use password::PasswordScheme;

/// Why a login workflow ended without a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The same unknown username was tried too many times.
    UnknownUser {
        /// The name that was tried.
        username: String,
    },
    /// The account exists but is inactive.
    AccountLocked {
        /// The stored account name.
        username: String,
    },
    /// Every allowed prompt was used up.
    AttemptsExhausted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownUser { username } => {
                write!(f, "too many attempts for unknown user '{username}'")
            }
            Self::AccountLocked { username } => write!(f, "account '{username}' is locked"),
            Self::AttemptsExhausted => write!(f, "maximum login attempts reached"),
        }
    }
}

/// A state of the login workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No accounts exist; the first administrator is being created.
    Bootstrap,
    /// Waiting for credentials; `attempt` is the 1-based prompt number.
    LoginPrompt {
        /// Which prompt of the session comes next.
        attempt: u32,
    },
    /// A user is logged in.
    Authenticated {
        /// The stored account name.
        username: String,
    },
    /// An account was just deactivated for too many wrong passwords.
    LockedOut {
        /// The stored account name.
        username: String,
    },
    /// Login failed without changing any account.
    Failed {
        /// What ended the workflow.
        reason: FailureReason,
    },
}

/// Final result of the login workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Proceed with a session for `username`.
    Authenticated {
        /// The stored account name.
        username: String,
    },
    /// The account was locked during this run.
    LockedOut {
        /// The stored account name.
        username: String,
    },
    /// Login failed.
    Failed {
        /// What ended the workflow.
        reason: FailureReason,
    },
}

impl AuthOutcome {
    /// Whether a session may start.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The logged-in user, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Authenticated { username } => Some(username),
            Self::LockedOut { .. } | Self::Failed { .. } => None,
        }
    }
}

/// Runs the login workflow against a credential store.
#[derive(Debug)]
pub struct Authenticator {
    store: CredentialStore,
    max_attempts: u32,
    scheme: PasswordScheme,
    failures: HashMap<String, u32>,
}

impl Authenticator {
    /// Create an authenticator with the limits from `config`.
    #[must_use]
    pub fn new(store: CredentialStore, config: &AuthConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_login_attempts.max(1),
            scheme: PasswordScheme::from_config(config),
            failures: HashMap::new(),
        }
    }

    /// The state the workflow starts in.
    #[must_use]
    pub fn initial_state(&self) -> AuthState {
        if self.store.is_uninitialized() {
            AuthState::Bootstrap
        } else {
            AuthState::LoginPrompt { attempt: 1 }
        }
    }

    /// Failed attempts recorded for `username` in this run.
    #[must_use]
    pub fn failed_attempts(&self, username: &str) -> u32 {
        self.failures
            .get(&username.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Run the workflow until it reaches a terminal state.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential file cannot be read or written, or
    /// if input runs out.
    pub fn run(&mut self, prompt: &mut dyn Prompt) -> Result<AuthOutcome> {
        let mut state = self.initial_state();
        loop {
            state = match state {
                AuthState::Bootstrap => self.bootstrap(prompt)?,
                AuthState::LoginPrompt { attempt } => self.login(prompt, attempt)?,
                AuthState::Authenticated { username } => {
                    return Ok(AuthOutcome::Authenticated { username })
                }
                AuthState::LockedOut { username } => {
                    return Ok(AuthOutcome::LockedOut { username })
                }
                AuthState::Failed { reason } => return Ok(AuthOutcome::Failed { reason }),
            };
        }
    }

    fn bootstrap(&mut self, prompt: &mut dyn Prompt) -> Result<AuthState> {
        if self.store.path().exists() {
            prompt.say("The user file is empty.");
        } else {
            prompt.say("The user file does not exist.");
        }
        info!(
            "{} not found or empty. Initiating first admin user creation process.",
            self.store.path().display()
        );
        prompt.say("--- Create First Administrator ---");

        let username = accounts::read_username(prompt, "Enter the administrator username: ", &[])?;
        let password = accounts::read_password(prompt, "Enter the administrator password: ")?;

        let sealed = self.scheme.seal(&password);
        self.store
            .save(&[Credential::new(username.clone(), sealed, true)])?;

        prompt.say(&format!(
            "Administrator '{username}' created successfully. Welcome."
        ));
        info!("Initial admin user '{username}' created and logged in.");
        Ok(AuthState::Authenticated { username })
    }

    fn login(&mut self, prompt: &mut dyn Prompt, attempt: u32) -> Result<AuthState> {
        let max = self.max_attempts;
        if attempt > max {
            prompt.say("Maximum login attempts reached.");
            error!("Maximum login attempts reached overall for the session.");
            return Ok(AuthState::Failed {
                reason: FailureReason::AttemptsExhausted,
            });
        }
        let again = AuthState::LoginPrompt {
            attempt: attempt + 1,
        };

        let username = prompt.ask("Enter username: ")?;
        let password = prompt.ask_secret("Enter password: ")?;
        let username = username.trim();

        if username.is_empty() || password.is_empty() {
            prompt.say("Username and password cannot be empty.");
            warn!("Login attempt with empty username or password. Attempt {attempt} of {max}.");
            return Ok(again);
        }

        let mut entries = self.store.load()?;
        let Some(index) = entries.iter().position(|entry| entry.matches(username)) else {
            prompt.say("Invalid username or password.");
            let failures = self.record_failure(username);
            warn!("Login attempt for non-existent user: {username}. Attempt {failures} of {max}.");
            if failures >= max {
                prompt.say("Maximum login attempts reached for this username.");
                error!(
                    user = username,
                    "Non-existent user reached max attempts. No blocking action taken."
                );
                return Ok(AuthState::Failed {
                    reason: FailureReason::UnknownUser {
                        username: username.to_string(),
                    },
                });
            }
            return Ok(again);
        };

        let entry = &entries[index];
        let stored_name = entry.username.clone();

        if !entry.is_active {
            prompt.say("User account is locked.");
            error!(user = %stored_name, "Login attempt for locked user.");
            return Ok(AuthState::Failed {
                reason: FailureReason::AccountLocked {
                    username: stored_name,
                },
            });
        }

        if password::verify(&entry.password, &password) {
            self.failures.remove(&username.to_lowercase());
            prompt.say(&format!("Welcome, {stored_name}!"));
            info!(user = %stored_name, "Login successful.");
            return Ok(AuthState::Authenticated {
                username: stored_name,
            });
        }

        prompt.say("Invalid username or password.");
        let failures = self.record_failure(username);
        warn!(
            user = %stored_name,
            "Failed login attempt (incorrect password). Attempt {failures} of {max}."
        );
        if failures < max {
            return Ok(again);
        }

        prompt.say("Maximum login attempts reached. User account will be locked.");
        entries[index].is_active = false;
        self.store.save(&entries)?;
        error!(
            user = %stored_name,
            "Account locked after {max} failed login attempts."
        );
        Ok(AuthState::LockedOut {
            username: stored_name,
        })
    }

    fn record_failure(&mut self, username: &str) -> u32 {
        let count = self.failures.entry(username.to_lowercase()).or_insert(0);
        *count += 1;
        *count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::testing::ScriptedPrompt;
    use std::fs;

    fn store_in(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("Users.txt"))
    }

    fn store_with(dir: &tempfile::TempDir, contents: &str) -> CredentialStore {
        let store = store_in(dir);
        fs::write(store.path(), contents).unwrap();
        store
    }

    fn authenticator(store: &CredentialStore) -> Authenticator {
        Authenticator::new(store.clone(), &AuthConfig::default())
    }

    #[test]
    fn test_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(authenticator(&store).initial_state(), AuthState::Bootstrap);

        fs::write(store.path(), "").unwrap();
        assert_eq!(authenticator(&store).initial_state(), AuthState::Bootstrap);

        fs::write(store.path(), "admin,secret,true\n").unwrap();
        assert_eq!(
            authenticator(&store).initial_state(),
            AuthState::LoginPrompt { attempt: 1 }
        );
    }

    #[test]
    fn test_bootstrap_creates_single_active_admin() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut prompt = ScriptedPrompt::new(["", "admin", "  ", "secret"]);

        let outcome = authenticator(&store).run(&mut prompt).unwrap();

        assert_eq!(
            outcome,
            AuthOutcome::Authenticated {
                username: "admin".to_string()
            }
        );
        assert_eq!(
            store.load().unwrap(),
            vec![Credential::new("admin", "secret", true)]
        );
        assert!(prompt.saw("does not exist"));
    }

    #[test]
    fn test_bootstrap_on_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "");
        let mut prompt = ScriptedPrompt::new(["root", "toor"]);

        let outcome = authenticator(&store).run(&mut prompt).unwrap();

        assert!(outcome.is_authenticated());
        assert_eq!(store.load().unwrap().len(), 1);
        assert!(prompt.saw("is empty"));
    }

    #[test]
    fn test_login_success_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "Admin,secret,true\n");
        let mut prompt = ScriptedPrompt::new(["ADMIN", "secret"]);

        let outcome = authenticator(&store).run(&mut prompt).unwrap();

        assert_eq!(outcome.username(), Some("Admin"));
        assert!(prompt.saw("Welcome, Admin!"));
    }

    #[test]
    fn test_three_wrong_passwords_lock_account() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\nbob,pw,true\n");
        let mut prompt = ScriptedPrompt::new(["admin", "a", "admin", "b", "admin", "c"]);

        let outcome = authenticator(&store).run(&mut prompt).unwrap();

        assert_eq!(
            outcome,
            AuthOutcome::LockedOut {
                username: "admin".to_string()
            }
        );
        assert_eq!(
            store.load().unwrap(),
            vec![
                Credential::new("admin", "secret", false),
                Credential::new("bob", "pw", true),
            ]
        );
    }

    #[test]
    fn test_correct_password_clears_counter() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let mut auth = authenticator(&store);
        let mut prompt = ScriptedPrompt::new(["admin", "wrong", "admin", "wrong", "admin", "secret"]);

        let outcome = auth.run(&mut prompt).unwrap();

        assert!(outcome.is_authenticated());
        assert_eq!(auth.failed_attempts("admin"), 0);
        assert!(store.load().unwrap()[0].is_active);
    }

    #[test]
    fn test_locked_account_fails_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,false\n");
        let mut prompt = ScriptedPrompt::new(["admin", "secret", "admin", "secret"]);

        let outcome = authenticator(&store).run(&mut prompt).unwrap();

        assert_eq!(
            outcome,
            AuthOutcome::Failed {
                reason: FailureReason::AccountLocked {
                    username: "admin".to_string()
                }
            }
        );
        assert_eq!(prompt.remaining(), 2);
    }

    #[test]
    fn test_unknown_user_fails_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let original = "admin,secret,true\n";
        let store = store_with(&dir, original);
        let mut prompt = ScriptedPrompt::new(["ghost", "x", "Ghost", "y", "GHOST", "z"]);

        let outcome = authenticator(&store).run(&mut prompt).unwrap();

        assert_eq!(
            outcome,
            AuthOutcome::Failed {
                reason: FailureReason::UnknownUser {
                    username: "GHOST".to_string()
                }
            }
        );
        assert_eq!(fs::read_to_string(store.path()).unwrap(), original);
    }

    #[test]
    fn test_empty_input_uses_prompt_budget() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let mut auth = authenticator(&store);
        let mut prompt = ScriptedPrompt::new(["", "", "admin", "", "  ", "pw"]);

        let outcome = auth.run(&mut prompt).unwrap();

        assert_eq!(
            outcome,
            AuthOutcome::Failed {
                reason: FailureReason::AttemptsExhausted
            }
        );
        assert_eq!(auth.failed_attempts("admin"), 0);
    }

    #[test]
    fn test_mixed_failures_exhaust_budget_without_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\nbob,pw,true\n");
        let mut auth = authenticator(&store);
        let mut prompt = ScriptedPrompt::new(["admin", "x", "admin", "y", "bob", "z"]);

        let outcome = auth.run(&mut prompt).unwrap();

        assert_eq!(
            outcome,
            AuthOutcome::Failed {
                reason: FailureReason::AttemptsExhausted
            }
        );
        assert_eq!(auth.failed_attempts("admin"), 2);
        assert_eq!(auth.failed_attempts("bob"), 1);
        assert!(store.load().unwrap().iter().all(|entry| entry.is_active));
    }

    #[test]
    fn test_custom_attempt_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let config = AuthConfig {
            max_login_attempts: 1,
            ..AuthConfig::default()
        };
        let mut prompt = ScriptedPrompt::new(["admin", "nope"]);

        let outcome = Authenticator::new(store.clone(), &config)
            .run(&mut prompt)
            .unwrap();

        assert!(matches!(outcome, AuthOutcome::LockedOut { .. }));
        assert!(!store.load().unwrap()[0].is_active);
    }

    #[test]
    fn test_hashed_bootstrap_then_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let config = AuthConfig {
            hash_passwords: true,
            ..AuthConfig::default()
        };

        let mut prompt = ScriptedPrompt::new(["admin", "secret"]);
        Authenticator::new(store.clone(), &config)
            .run(&mut prompt)
            .unwrap();
        let stored = store.load().unwrap();
        assert!(password::is_sealed(&stored[0].password));

        let mut prompt = ScriptedPrompt::new(["admin", "secret"]);
        let outcome = Authenticator::new(store.clone(), &config)
            .run(&mut prompt)
            .unwrap();
        assert!(outcome.is_authenticated());
    }

    #[test]
    fn test_input_closed_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let mut prompt = ScriptedPrompt::new(["admin"]);

        let err = authenticator(&store).run(&mut prompt).unwrap_err();

        assert!(err.is_input_closed());
    }

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(
            FailureReason::AttemptsExhausted.to_string(),
            "maximum login attempts reached"
        );
        assert!(FailureReason::AccountLocked {
            username: "bob".to_string()
        }
        .to_string()
        .contains("bob"));
    }
}
