//! Console interaction.
//!
//! Every interactive workflow talks to the user through the [`Prompt`] trait.
//! [`ConsolePrompt`] is the stdin/stdout implementation used by the binary.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{Error, Result};

/// A line-oriented conversation with the user.
pub trait Prompt {
    /// Show a line of output.
    fn say(&mut self, line: &str);

    /// Show `label` and read one line of input, without the line terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] when no more input is available.
    fn ask(&mut self, label: &str) -> Result<String>;

    /// Like [`ask`](Self::ask), but the answer is not echoed when possible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] when no more input is available.
    fn ask_secret(&mut self, label: &str) -> Result<String> {
        self.ask(label)
    }
}

/// Prompt over the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    /// Create a console prompt.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Prompt for ConsolePrompt {
    fn say(&mut self, line: &str) {
        println!("{line}");
    }

    fn ask(&mut self, label: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{label}")?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(Error::input_closed(label));
        }
        Ok(strip_line_ending(line))
    }

    fn ask_secret(&mut self, label: &str) -> Result<String> {
        if io::stdin().is_terminal() {
            rpassword::prompt_password(label).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    Error::input_closed(label)
                } else {
                    Error::Io(e)
                }
            })
        } else {
            self.ask(label)
        }
    }
}

fn strip_line_ending(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedPrompt;
    use super::*;

    #[test]
    fn test_strip_line_ending() {
        assert_eq!(strip_line_ending("yes\n".to_string()), "yes");
        assert_eq!(strip_line_ending("yes\r\n".to_string()), "yes");
        assert_eq!(strip_line_ending("  padded  \n".to_string()), "  padded  ");
        assert_eq!(strip_line_ending(String::new()), "");
    }

    #[test]
    fn test_scripted_prompt_answers_in_order() {
        let mut prompt = ScriptedPrompt::new(["first", "second"]);

        assert_eq!(prompt.ask("A: ").unwrap(), "first");
        assert_eq!(prompt.ask_secret("B: ").unwrap(), "second");
        assert!(prompt.ask("C: ").unwrap_err().is_input_closed());
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn test_scripted_prompt_records_output() {
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
        prompt.say("Welcome, admin!");

        assert!(prompt.saw("Welcome"));
        assert!(!prompt.saw("Goodbye"));
    }
}
