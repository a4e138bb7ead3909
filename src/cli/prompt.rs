// file: src/cli/prompt.rs
// description: interactive prompting over a terminal or plain line-based stdin
// reference: https://docs.rs/dialoguer

use crate::error::{ProcessingError, Result};
use crate::utils::Validator;
use dialoguer::console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::io::{BufRead, Write};

/// Source of answers for parameters missing from the command line.
pub trait Prompter {
    /// Ask for one line of text. `None` means input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Show a line of text to the user.
    fn say(&mut self, message: &str) -> Result<()>;

    /// Pick one of `items`, re-asking until the answer is a valid 1-based number.
    fn choose(&mut self, prompt: &str, items: &[&str], _default: usize) -> Result<Option<usize>> {
        self.say(prompt)?;
        for (index, item) in items.iter().enumerate() {
            self.say(&format!("{} - {}", index + 1, item))?;
        }

        let question = match items.len() {
            2 => "Enter selection (1 or 2): ".to_string(),
            n => format!("Enter selection (1-{}): ", n),
        };

        loop {
            let Some(answer) = self.ask(&question)? else {
                return Ok(None);
            };
            match Validator::clean_prompt_input(&answer).parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => self.say(&format!(
                    "Invalid selection. Please enter a number from 1 to {}.",
                    items.len()
                ))?,
            }
        }
    }
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        (**self).ask(prompt)
    }

    fn say(&mut self, message: &str) -> Result<()> {
        (**self).say(message)
    }

    fn choose(&mut self, prompt: &str, items: &[&str], default: usize) -> Result<Option<usize>> {
        (**self).choose(prompt, items, default)
    }
}

/// Plain prompts over any reader/writer pair; used when stdin is not a TTY.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }
}

/// Prompts rendered by dialoguer on the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
    term: Term,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            term: Term::stderr(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt.trim_end().trim_end_matches(':'))
            .allow_empty(true)
            .interact_text_on(&self.term)
            .map_err(|e| ProcessingError::Prompt(e.to_string()))?;
        Ok(Some(answer))
    }

    fn say(&mut self, message: &str) -> Result<()> {
        self.term.write_line(message)?;
        Ok(())
    }

    fn choose(&mut self, prompt: &str, items: &[&str], default: usize) -> Result<Option<usize>> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact_on_opt(&self.term)
            .map_err(|e| ProcessingError::Prompt(e.to_string()))
    }
}
