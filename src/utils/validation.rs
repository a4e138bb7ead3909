// file: src/utils/validation.rs
// description: pre-flight path validation and prompt input cleanup
// reference: input validation patterns

use crate::error::{ProcessingError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Validator;

impl Validator {
    /// The input must exist and be a regular file.
    pub fn validate_input_file(path: &Path) -> Result<()> {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => Ok(()),
            _ => Err(ProcessingError::InputNotFound(path.to_path_buf())),
        }
    }

    /// The output must not be a directory and must have an existing parent.
    pub fn validate_output_path(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(ProcessingError::Output {
                path: path.to_path_buf(),
                message: "path is empty".to_string(),
            });
        }

        if path.is_dir() {
            return Err(ProcessingError::Output {
                path: path.to_path_buf(),
                message: "is a directory".to_string(),
            });
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            return Err(ProcessingError::Output {
                path: path.to_path_buf(),
                message: format!("directory {} does not exist", parent.display()),
            });
        }

        Ok(())
    }

    /// Trim whitespace and surrounding `"`/`'` quotes.
    pub fn clean_prompt_input(input: &str) -> String {
        input
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'')
            .trim()
            .to_string()
    }

    pub fn clean_path_input(input: &str) -> Option<PathBuf> {
        let cleaned = Self::clean_prompt_input(input);
        if cleaned.is_empty() {
            None
        } else {
            Some(PathBuf::from(cleaned))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_input_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("photo.png");
        fs::write(&file_path, "x").unwrap();

        assert!(Validator::validate_input_file(&file_path).is_ok());
        assert!(matches!(
            Validator::validate_input_file(&temp.path().join("missing.png")),
            Err(ProcessingError::InputNotFound(_))
        ));
        assert!(matches!(
            Validator::validate_input_file(temp.path()),
            Err(ProcessingError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_validate_output_path() {
        let temp = TempDir::new().unwrap();

        assert!(Validator::validate_output_path(&temp.path().join("out.png")).is_ok());
        assert!(Validator::validate_output_path(Path::new("out.png")).is_ok());
        assert!(Validator::validate_output_path(temp.path()).is_err());
        assert!(Validator::validate_output_path(&temp.path().join("nope/out.png")).is_err());
        assert!(Validator::validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_clean_prompt_input() {
        assert_eq!(Validator::clean_prompt_input("  photo.png \n"), "photo.png");
        assert_eq!(
            Validator::clean_prompt_input("\"/tmp/my photo.jpg\""),
            "/tmp/my photo.jpg"
        );
        assert_eq!(Validator::clean_prompt_input(" 'a.png' "), "a.png");
        assert_eq!(Validator::clean_prompt_input("   "), "");
    }

    #[test]
    fn test_clean_path_input() {
        assert_eq!(
            Validator::clean_path_input("'in.png'"),
            Some(PathBuf::from("in.png"))
        );
        assert_eq!(Validator::clean_path_input("\"\""), None);
    }
}
