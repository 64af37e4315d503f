//! Interactive confirmation prompts
//!
//! The one-time EEZ acquisition needs a modal OK/Cancel confirmation. The
//! trait keeps the pipeline testable; the console binding uses `inquire`.

use colored::Colorize;
use nais_common::error::Result;

/// A modal OK/Cancel confirmation
pub trait ConfirmPrompt {
    /// Show the prompt and return true for OK, false for Cancel.
    fn confirm(&self, title: &str, message: &str) -> Result<bool>;
}

/// Console prompt for interactive runs
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl ConfirmPrompt for ConsolePrompt {
    fn confirm(&self, title: &str, message: &str) -> Result<bool> {
        println!("{}", title.bold());
        let answer = inquire::Confirm::new(message)
            .with_default(true)
            .prompt()
            .map_err(|e| nais_common::NaisError::Other(e.into()))?;
        Ok(answer)
    }
}

/// Fixed-answer prompt for non-interactive runs and tests
#[derive(Debug)]
pub struct StaticPrompt(pub bool);

impl ConfirmPrompt for StaticPrompt {
    fn confirm(&self, _title: &str, _message: &str) -> Result<bool> {
        Ok(self.0)
    }
}
