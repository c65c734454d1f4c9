//! Terminal front end for the intake conversation.
//!
//! Questions are asked with dialoguer; persona messages are printed with colored.

use crate::conversation::{Persona, Question};
use crate::session::{Prompter, SessionError};
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

/// Prompts the requester on an interactive terminal
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, _persona: Persona, question: &Question) -> Result<String, SessionError> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(question.prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| SessionError::Prompt(e.to_string()))
    }

    fn say(&mut self, persona: Persona, message: &str) {
        println!("\n{} {}", format!("[{}]", persona.name()).cyan().bold(), message);
    }
}
