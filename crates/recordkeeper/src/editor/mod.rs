//! The in-memory record book and the interactive workflows that edit it.
//!
//! Each workflow reads its input through a [`Prompt`], shows validation
//! failures to the user and asks again. Nothing here touches the record
//! file; saving is the caller's job.

pub mod report;
pub mod validation;

use tracing::{info, warn};

pub use report::{CityGroup, CityReport, TotalOverflow, UNASSIGNED_CITY};
pub use validation::ValidationError;

use crate::error::Result;
use crate::person::{format_amount, Person};
use crate::prompt::Prompt;
use crate::session::Session;

/// Ordered collection of person records with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBook {
    people: Vec<Person>,
}

impl RecordBook {
    /// Wrap records in file order.
    #[must_use]
    pub fn new(people: Vec<Person>) -> Self {
        Self { people }
    }

    /// All records in order.
    #[must_use]
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Whether the book has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: i32) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    /// Look up a record by id for modification.
    pub fn get_mut(&mut self, id: i32) -> Option<&mut Person> {
        self.people.iter_mut().find(|person| person.id == id)
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateId`] if the id is taken; the book
    /// is unchanged.
    pub fn add(&mut self, person: Person) -> std::result::Result<(), ValidationError> {
        if self.get(person.id).is_some() {
            return Err(ValidationError::DuplicateId(person.id));
        }
        self.people.push(person);
        Ok(())
    }

    /// Remove and return the record with `id`.
    pub fn remove(&mut self, id: i32) -> Option<Person> {
        let index = self.people.iter().position(|person| person.id == id)?;
        Some(self.people.remove(index))
    }

    /// Balances grouped by city.
    ///
    /// # Errors
    ///
    /// Returns [`TotalOverflow`] if a total does not fit in a decimal.
    pub fn report(&self) -> std::result::Result<CityReport, TotalOverflow> {
        CityReport::build(&self.people)
    }

    /// Give up the records.
    #[must_use]
    pub fn into_people(self) -> Vec<Person> {
        self.people
    }
}

/// Print every record, or a notice when there are none.
pub fn show_content(session: &Session, prompt: &mut dyn Prompt) {
    let book = session.book();
    if book.is_empty() {
        prompt.say("No people data to display.");
        return;
    }
    for person in book.people() {
        prompt.say(&person.to_string());
    }
}

/// Ask for every field of a new record and append it.
///
/// # Errors
///
/// Returns an error only if input runs out.
pub fn add_person(session: &mut Session, prompt: &mut dyn Prompt) -> Result<()> {
    prompt.say("--- Add New Person ---");

    let id = ask_until(prompt, "Enter the ID: ", |input| {
        validation::new_id(input, session.book().people())
    })?;
    let first_name = ask_until(prompt, "Enter the First name: ", |input| {
        validation::name(input, "First name")
    })?;
    let last_name = ask_until(prompt, "Enter the Last name: ", |input| {
        validation::name(input, "Last name")
    })?;
    let phone = ask_until(prompt, "Enter the phone (digits only): ", validation::phone)?;
    let city = prompt.ask("Enter the city: ")?.trim().to_string();
    let balance = ask_until(prompt, "Enter the balance: ", validation::balance)?;

    let person = Person {
        id,
        first_name,
        last_name,
        phone,
        city,
        balance,
    };
    if let Err(e) = session.book_mut().add(person) {
        prompt.say(&format!("Error: {e}"));
        return Ok(());
    }
    session.mark_dirty();

    prompt.say("Person added successfully.");
    info!(user = session.user(), "Added new person with ID: {id}");
    Ok(())
}

/// Change fields of an existing record. Blank answers keep the current value.
///
/// # Errors
///
/// Returns an error only if input runs out.
pub fn edit_person(session: &mut Session, prompt: &mut dyn Prompt) -> Result<()> {
    let Some(current) = find_by_prompt(session, prompt, "Enter the ID of the person to edit: ")?
    else {
        return Ok(());
    };

    prompt.say(&format!(
        "Editing person: {} (ID: {})",
        current.full_name(),
        current.id
    ));
    prompt.say("Press ENTER to keep current value for a field.");

    let mut updated = current.clone();
    let label = format!("Enter new First name (current: {}): ", current.first_name);
    if let Some(value) = ask_optional(prompt, &label, |input| {
        validation::name(input, "First name")
    })? {
        updated.first_name = value;
    }
    let label = format!("Enter new Last name (current: {}): ", current.last_name);
    if let Some(value) = ask_optional(prompt, &label, |input| {
        validation::name(input, "Last name")
    })? {
        updated.last_name = value;
    }
    let label = format!("Enter new phone (current: {}): ", current.phone);
    if let Some(value) = ask_optional(prompt, &label, validation::phone)? {
        updated.phone = value;
    }
    let label = format!("Enter new city (current: {}): ", current.city);
    let city = prompt.ask(&label)?;
    if !city.trim().is_empty() {
        updated.city = city.trim().to_string();
    }
    let label = format!(
        "Enter new balance (current: {}): ",
        format_amount(current.balance)
    );
    if let Some(value) = ask_optional(prompt, &label, validation::balance)? {
        updated.balance = value;
    }

    if updated != current {
        if let Some(slot) = session.book_mut().get_mut(current.id) {
            *slot = updated;
        }
        session.mark_dirty();
    }

    prompt.say("Person updated successfully.");
    info!(user = session.user(), "Edited person with ID: {}", current.id);
    Ok(())
}

/// Remove a record after the user confirms with `yes`.
///
/// # Errors
///
/// Returns an error only if input runs out.
pub fn delete_person(session: &mut Session, prompt: &mut dyn Prompt) -> Result<()> {
    let Some(person) = find_by_prompt(session, prompt, "Enter the ID of the person to delete: ")?
    else {
        return Ok(());
    };

    prompt.say("Person found:");
    prompt.say(&person.to_string());
    let answer = prompt.ask("Are you sure you want to delete this person? (yes/no): ")?;
    if !answer.trim().eq_ignore_ascii_case("yes") {
        prompt.say("Deletion cancelled.");
        info!(
            user = session.user(),
            "Deletion of person with ID: {} cancelled.", person.id
        );
        return Ok(());
    }

    session.book_mut().remove(person.id);
    session.mark_dirty();
    prompt.say("Person deleted successfully.");
    info!(user = session.user(), "Deleted person with ID: {}", person.id);
    Ok(())
}

/// Print balances grouped by city.
pub fn show_report(session: &Session, prompt: &mut dyn Prompt) {
    let report = match session.book().report() {
        Ok(report) => report,
        Err(e) => {
            prompt.say(&format!("Error: {e}"));
            warn!(user = session.user(), "Report by city not generated: {e}");
            return;
        }
    };
    if report.is_empty() {
        prompt.say("No data to generate report.");
        return;
    }
    prompt.say(&report.render());
    info!(user = session.user(), "Generated report by city.");
}

/// Ask for an id and return a copy of the matching record, telling the user
/// when the id is unusable.
fn find_by_prompt(
    session: &Session,
    prompt: &mut dyn Prompt,
    label: &str,
) -> Result<Option<Person>> {
    let input = prompt.ask(label)?;
    let Ok(id) = validation::parse_id(&input) else {
        prompt.say("Invalid ID format.");
        warn!(user = session.user(), input = input.trim(), "Invalid ID format entered");
        return Ok(None);
    };

    match session.book().get(id) {
        Some(person) => Ok(Some(person.clone())),
        None => {
            prompt.say(&format!("Person with ID {id} not found."));
            warn!(user = session.user(), "Person with ID {id} not found");
            Ok(None)
        }
    }
}

fn ask_until<T>(
    prompt: &mut dyn Prompt,
    label: &str,
    mut check: impl FnMut(&str) -> std::result::Result<T, ValidationError>,
) -> Result<T> {
    loop {
        let input = prompt.ask(label)?;
        match check(&input) {
            Ok(value) => return Ok(value),
            Err(e) => prompt.say(&format!("Error: {e}")),
        }
    }
}

/// Like [`ask_until`], but a blank answer yields `None`.
fn ask_optional<T>(
    prompt: &mut dyn Prompt,
    label: &str,
    mut check: impl FnMut(&str) -> std::result::Result<T, ValidationError>,
) -> Result<Option<T>> {
    ask_until(prompt, label, |input| {
        if input.trim().is_empty() {
            Ok(None)
        } else {
            check(input).map(Some)
        }
    })
}
