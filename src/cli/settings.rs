// file: src/cli/settings.rs
// description: resolves run parameters from arguments, prompts and defaults
// reference: explicit argument, then validated prompt, then documented default

use crate::cli::prompt::Prompter;
use crate::config::Config;
use crate::error::{ProcessingError, Result};
use crate::pipeline::{Mode, RunRequest, Scale};
use crate::utils::Validator;
use std::path::PathBuf;
use tracing::debug;

/// Parameters as given on the command line; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgValues {
    pub mode: Option<Mode>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub scale: Option<Scale>,
}

const MODE_ITEMS: [&str; 2] = ["Remove Background & Upscale", "Upscale Only"];

pub struct SettingsResolver<'a, P> {
    config: &'a Config,
    prompter: Option<P>,
}

impl<'a, P: Prompter> SettingsResolver<'a, P> {
    pub fn interactive(config: &'a Config, prompter: P) -> Self {
        Self {
            config,
            prompter: Some(prompter),
        }
    }

    pub fn non_interactive(config: &'a Config) -> Self {
        Self {
            config,
            prompter: None,
        }
    }

    pub fn resolve(mut self, args: ArgValues) -> Result<RunRequest> {
        let mode = match args.mode {
            Some(mode) => mode,
            None => self.prompt_mode()?,
        };

        let input = match args.input {
            Some(input) => input,
            None => self.prompt_input()?,
        };

        let output = match args.output {
            Some(output) => output,
            None => self.prompt_output()?,
        };

        let scale = match args.scale {
            Some(scale) => scale,
            None => self.prompt_scale()?,
        };

        debug!(
            "Resolved settings: mode={:?} input={} output={} scale={}",
            mode,
            input.display(),
            output.display(),
            scale
        );

        Ok(RunRequest::new(input, output, scale, mode))
    }

    fn prompt_mode(&mut self) -> Result<Mode> {
        let Some(prompter) = self.prompter.as_mut() else {
            return Ok(Mode::default());
        };

        let choice = prompter.choose("Select Mode:", &MODE_ITEMS, 0)?;
        Ok(choice
            .and_then(|index| Mode::ALL.get(index).copied())
            .unwrap_or_default())
    }

    fn prompt_input(&mut self) -> Result<PathBuf> {
        let Some(prompter) = self.prompter.as_mut() else {
            return Err(ProcessingError::Prompt(
                "an input image path is required".to_string(),
            ));
        };

        loop {
            let Some(answer) = prompter.ask("Enter input image path: ")? else {
                return Err(ProcessingError::Prompt(
                    "no input image path given".to_string(),
                ));
            };
            match Validator::clean_path_input(&answer) {
                Some(path) => return Ok(path),
                None => prompter.say("Input path is required.")?,
            }
        }
    }

    fn prompt_output(&mut self) -> Result<PathBuf> {
        let default = self.config.default_output().to_path_buf();
        let Some(prompter) = self.prompter.as_mut() else {
            return Ok(default);
        };

        let question = format!(
            "Enter output image path (default: {}): ",
            default.display()
        );
        Ok(prompter
            .ask(&question)?
            .and_then(|answer| Validator::clean_path_input(&answer))
            .unwrap_or(default))
    }

    fn prompt_scale(&mut self) -> Result<Scale> {
        let default = self.config.defaults.scale;
        let Some(prompter) = self.prompter.as_mut() else {
            return Ok(default);
        };

        let question = format!(
            "Enter upscaling factor (2, 4, 8) [default: {}]: ",
            default.factor()
        );
        loop {
            let Some(answer) = prompter.ask(&question)? else {
                return Ok(default);
            };
            let answer = Validator::clean_prompt_input(&answer);
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<Scale>() {
                Ok(scale) => return Ok(scale),
                Err(_) => prompter.say("Invalid factor. Please enter 2, 4 or 8.")?,
            }
        }
    }
}
