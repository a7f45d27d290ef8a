//! Session driver: login, then the main menu until the user exits.

use tracing::{error, info, warn};

use crate::auth::{self, AuthOutcome, Authenticator, PasswordScheme};
use crate::config::Config;
use crate::editor;
use crate::error::Result;
use crate::prompt::Prompt;
use crate::session::Session;
use crate::storage::{CredentialStore, RecordLoad, RecordStore};

const SEPARATOR: &str = "=======================================";

/// One entry of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// List every record.
    ShowContent,
    /// Add a record.
    AddPerson,
    /// Write the record book to disk.
    Save,
    /// Edit a record.
    EditPerson,
    /// Delete a record.
    DeletePerson,
    /// Balances grouped by city.
    Report,
    /// Add a login account.
    CreateUser,
    /// Leave the session.
    Exit,
}

impl MenuChoice {
    /// Parse a menu answer; `None` for anything unrecognised.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::ShowContent),
            "2" => Some(Self::AddPerson),
            "3" => Some(Self::Save),
            "4" => Some(Self::EditPerson),
            "5" => Some(Self::DeletePerson),
            "6" => Some(Self::Report),
            "7" => Some(Self::CreateUser),
            "0" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// The console application, wired to the configured files.
#[derive(Debug, Clone)]
pub struct App {
    config: Config,
    records: RecordStore,
    credentials: CredentialStore,
}

impl App {
    /// Create the application for `config`. No files are touched yet.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let records = RecordStore::new(config.storage.people_path.clone());
        let credentials = CredentialStore::new(config.storage.users_path.clone());
        Self {
            config,
            records,
            credentials,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Authenticate, then serve the menu until the user exits.
    ///
    /// A failed login ends the run normally.
    ///
    /// # Errors
    ///
    /// Returns an error if a data file cannot be written or if input runs
    /// out outside the main menu.
    pub fn run(&self, prompt: &mut dyn Prompt) -> Result<()> {
        let mut authenticator = Authenticator::new(self.credentials.clone(), &self.config.auth);
        let username = match authenticator.run(prompt)? {
            AuthOutcome::Authenticated { username } => username,
            AuthOutcome::LockedOut { username } => {
                prompt.say("Authentication or initial setup failed. Program will exit.");
                error!(user = %username, "Authentication failed: account locked.");
                return Ok(());
            }
            AuthOutcome::Failed { reason } => {
                prompt.say("Authentication or initial setup failed. Program will exit.");
                error!("Authentication failed: {reason}.");
                return Ok(());
            }
        };

        let mut session = Session::new(username, self.load_records(prompt));
        info!(user = session.user(), "Application started.");
        self.menu_loop(&mut session, prompt)
    }

    fn load_records(&self, prompt: &mut dyn Prompt) -> RecordLoad {
        let load = self.records.load().unwrap_or_else(|e| {
            error!("Failed to read {}: {e}", self.records.path().display());
            RecordLoad::Malformed {
                reason: e.to_string(),
            }
        });

        match &load {
            RecordLoad::Malformed { reason } => prompt.say(&format!(
                "Warning: {} could not be read ({reason}). It will only be overwritten after you make changes.",
                self.records.path().display()
            )),
            RecordLoad::Parsed { skipped, .. } if *skipped > 0 => prompt.say(&format!(
                "Warning: {skipped} unreadable row(s) in {} were skipped.",
                self.records.path().display()
            )),
            _ => {}
        }
        load
    }

    fn menu_loop(&self, session: &mut Session, prompt: &mut dyn Prompt) -> Result<()> {
        loop {
            let input = match ask_menu(prompt) {
                Ok(input) => input,
                Err(e) if e.is_input_closed() => {
                    info!(user = session.user(), "Input closed at the main menu.");
                    "0".to_string()
                }
                Err(e) => return Err(e),
            };
            prompt.say(SEPARATOR);

            match MenuChoice::parse(&input) {
                Some(MenuChoice::ShowContent) => editor::show_content(session, prompt),
                Some(MenuChoice::AddPerson) => editor::add_person(session, prompt)?,
                Some(MenuChoice::Save) => {
                    self.save(session)?;
                    prompt.say("Changes saved successfully.");
                }
                Some(MenuChoice::EditPerson) => editor::edit_person(session, prompt)?,
                Some(MenuChoice::DeletePerson) => editor::delete_person(session, prompt)?,
                Some(MenuChoice::Report) => editor::show_report(session, prompt),
                Some(MenuChoice::CreateUser) => {
                    auth::create_system_user(
                        &self.credentials,
                        PasswordScheme::from_config(&self.config.auth),
                        session.user(),
                        prompt,
                    )?;
                }
                Some(MenuChoice::Exit) => {
                    info!(user = session.user(), "User chose to exit.");
                    break;
                }
                None => {
                    prompt.say("Invalid option. Try again.");
                    warn!(
                        user = session.user(),
                        "Invalid menu option selected: {}",
                        input.trim()
                    );
                }
            }
        }

        if session.should_save_on_exit() {
            self.save(session)?;
            info!(
                user = session.user(),
                "Application shutting down. Final changes saved."
            );
        } else {
            warn!(
                user = session.user(),
                "Application shutting down. {} left untouched.",
                self.records.path().display()
            );
        }
        Ok(())
    }

    fn save(&self, session: &mut Session) -> Result<()> {
        self.records.save(session.book().people())?;
        session.mark_saved();
        info!(
            user = session.user(),
            count = session.book().len(),
            "Saved records to {}",
            self.records.path().display()
        );
        Ok(())
    }
}

fn ask_menu(prompt: &mut dyn Prompt) -> Result<String> {
    prompt.say(&format!("\n{SEPARATOR}"));
    prompt.say("1. Show content");
    prompt.say("2. Add person");
    prompt.say("3. Save changes");
    prompt.say("4. Edit person");
    prompt.say("5. Delete person");
    prompt.say("6. Show report by city");
    prompt.say("7. Create new system user");
    prompt.say("0. Exit");
    prompt.ask("Choose an option: ")
}
