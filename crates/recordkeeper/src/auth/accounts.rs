//! Account creation.
//!
//! Shared by first-run bootstrap and the "create system user" menu action.

use tracing::info;

use super::password::{self, PasswordScheme};
use crate::error::Result;
use crate::prompt::Prompt;
use crate::storage::credentials::{self, parse_flag, Credential, CredentialStore, DELIMITER};

/// Ask until a usable, unused username is given.
pub(crate) fn read_username(
    prompt: &mut dyn Prompt,
    label: &str,
    existing: &[Credential],
) -> Result<String> {
    loop {
        let input = prompt.ask(label)?;
        let username = input.trim();
        if username.is_empty() {
            prompt.say("Username cannot be empty.");
        } else if username.contains(DELIMITER) {
            prompt.say("Username cannot contain a comma.");
        } else if credentials::find(existing, username).is_some() {
            prompt.say("Error: this username already exists. Try another one.");
        } else {
            return Ok(username.to_string());
        }
    }
}

/// Ask until a usable password is given.
pub(crate) fn read_password(prompt: &mut dyn Prompt, label: &str) -> Result<String> {
    loop {
        let password = prompt.ask_secret(label)?;
        if password.trim().is_empty() {
            prompt.say("Password cannot be empty.");
        } else if password.contains(DELIMITER) {
            prompt.say("Password cannot contain a comma.");
        } else if password::is_sealed(&password) {
            prompt.say("Password cannot start with 'blake3$'.");
        } else {
            return Ok(password);
        }
    }
}

/// Interactively add a login account on behalf of `acting_user`.
///
/// # Errors
///
/// Returns an error if the credential file cannot be read or written, or if
/// input runs out.
pub fn create_system_user(
    store: &CredentialStore,
    scheme: PasswordScheme,
    acting_user: &str,
    prompt: &mut dyn Prompt,
) -> Result<Credential> {
    prompt.say("--- Create New System User ---");
    let mut entries = store.load()?;

    let username = read_username(prompt, "Enter the new username: ", &entries)?;
    let password = read_password(prompt, "Enter the password for the new user: ")?;

    let answer = prompt.ask("Will the user be active? (true/false, ENTER for 'true'): ")?;
    let is_active = if answer.trim().is_empty() {
        true
    } else if let Some(flag) = parse_flag(&answer) {
        flag
    } else {
        prompt.say("Invalid value for active status; the user will be created inactive.");
        false
    };

    let sealed = scheme.seal(&password);
    let entry = Credential::new(username, sealed, is_active);
    entries.push(entry.clone());
    store.save(&entries)?;

    prompt.say(&format!(
        "User '{}' created successfully. Active: {}",
        entry.username, entry.is_active
    ));
    info!(
        user = acting_user,
        "Created new system user: {}, Active: {}", entry.username, entry.is_active
    );
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::testing::ScriptedPrompt;

    fn store_with(dir: &tempfile::TempDir, lines: &str) -> CredentialStore {
        let store = CredentialStore::new(dir.path().join("Users.txt"));
        std::fs::write(store.path(), lines).unwrap();
        store
    }

    #[test]
    fn test_read_username_rejects_blank_comma_and_duplicates() {
        let existing = vec![Credential::new("Admin", "pw", true)];
        let mut prompt = ScriptedPrompt::new(["  ", "a,b", "admin", " maria "]);

        let username = read_username(&mut prompt, "User: ", &existing).unwrap();

        assert_eq!(username, "maria");
        assert!(prompt.saw("cannot be empty"));
        assert!(prompt.saw("cannot contain a comma"));
        assert!(prompt.saw("already exists"));
    }

    #[test]
    fn test_read_password_rejects_blank() {
        let mut prompt = ScriptedPrompt::new(["", "   ", "pa,ss", "s3cret"]);

        assert_eq!(read_password(&mut prompt, "Password: ").unwrap(), "s3cret");
        assert!(prompt.saw("Password cannot be empty."));
    }

    #[test]
    fn test_read_password_rejects_digest_shape() {
        let mut prompt = ScriptedPrompt::new(["blake3$abcd$ef01", "blake3$", "blake3-ok"]);

        assert_eq!(read_password(&mut prompt, "Password: ").unwrap(), "blake3-ok");
        assert!(prompt.saw("Password cannot start with 'blake3$'."));
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn test_create_system_user_refuses_digest_shaped_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let mut prompt = ScriptedPrompt::new(["maria", "blake3$x$00", "real-pass", ""]);

        let entry =
            create_system_user(&store, PasswordScheme::Plaintext, "admin", &mut prompt).unwrap();

        assert_eq!(entry.password, "real-pass");
        assert!(password::verify(&entry.password, "real-pass"));
        assert!(!password::verify(&entry.password, "blake3$x$00"));
    }

    #[test]
    fn test_create_system_user_defaults_to_active() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let mut prompt = ScriptedPrompt::new(["maria", "pw123", ""]);

        let entry =
            create_system_user(&store, PasswordScheme::Plaintext, "admin", &mut prompt).unwrap();

        assert_eq!(entry, Credential::new("maria", "pw123", true));
        assert_eq!(
            store.load().unwrap(),
            vec![
                Credential::new("admin", "secret", true),
                Credential::new("maria", "pw123", true),
            ]
        );
    }

    #[test]
    fn test_create_system_user_explicit_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let mut prompt = ScriptedPrompt::new(["maria", "pw123", "FALSE"]);

        let entry =
            create_system_user(&store, PasswordScheme::Plaintext, "admin", &mut prompt).unwrap();

        assert!(!entry.is_active);
    }

    #[test]
    fn test_create_system_user_invalid_flag_is_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let mut prompt = ScriptedPrompt::new(["maria", "pw123", "sure"]);

        let entry =
            create_system_user(&store, PasswordScheme::Plaintext, "admin", &mut prompt).unwrap();

        assert!(!entry.is_active);
        assert!(prompt.saw("created inactive"));
    }

    #[test]
    fn test_create_system_user_hashes_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "admin,secret,true\n");
        let mut prompt = ScriptedPrompt::new(["maria", "pw123", "true"]);

        let entry =
            create_system_user(&store, PasswordScheme::SaltedBlake3, "admin", &mut prompt)
                .unwrap();

        assert!(password::is_sealed(&entry.password));
        assert!(password::verify(&entry.password, "pw123"));
        assert_eq!(store.load().unwrap().len(), 2);
    }
}
