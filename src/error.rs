//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `repo-vendor` application. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the application. Each variant corresponds to a specific
//!   type of error and includes contextual information to aid in debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the application to simplify function signatures and ensure
//!   type safety.
//!
//! ## Error taxonomy
//!
//! Specifier-syntax errors (`InvalidSpecifier`) are local and synchronous:
//! they are raised before any I/O is attempted. Per-repository errors
//! (`RepoNotDefined`, `RepoNotVisible`, `Fetch`) are collected across a
//! multi-repository operation and reported together at the end, never
//! one-at-a-time. `VendoringFailed` is the aggregate terminal error of a
//! vendor invocation; `MissingOfflineRepo` is fatal only for the targets that
//! depend on the missing repository.

use thiserror::Error;

/// Main error type for repo-vendor operations
#[derive(Error, Debug)]
pub enum Error {
    /// The repository specifier matched neither the apparent (`@repo`) nor
    /// the canonical (`@@repo`) syntax.
    #[error(
        "Invalid repo name '{specifier}': The repo value has to be either apparent '@repo' or \
         canonical '@@repo' repo name"
    )]
    InvalidSpecifier { specifier: String },

    /// A canonical specifier named a repository that is absent from the graph.
    #[error("Repository '@@{repo}' is not defined")]
    RepoNotDefined { repo: String },

    /// An apparent specifier has no entry in the consuming repository's
    /// mapping.
    #[error("No repository visible as '@{name}' from {consumer} repository")]
    RepoNotVisible { name: String, consumer: String },

    /// The underlying fetch primitive failed for one repository.
    ///
    /// Recorded per repository; sibling repositories keep processing.
    #[error("Fetching repository '{repo}' failed: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Fetch {
        repo: String,
        message: String,
        /// Optional hint for how to resolve the fetch issue
        hint: Option<String>,
    },

    /// Aggregate terminal error for a vendor invocation.
    ///
    /// Raised only after every candidate has been attempted, and never when
    /// the candidate set was empty.
    #[error("Vendoring some repos failed with errors: [{}]", errors.join(", "))]
    VendoringFailed { errors: Vec<String> },

    /// A repository required by the build is not vendored and fetching is
    /// disabled.
    #[error(
        "Vendored repository {repo} not found under the vendor directory and fetching is \
         disabled. To fix run 'repo-vendor vendor' or build without '--no-fetch'"
    )]
    MissingOfflineRepo { repo: String },

    /// An error occurred while parsing the `.repo-vendor.yaml` manifest.
    #[error("Manifest parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the manifest issue
        hint: Option<String>,
    },

    /// A marker record in the vendor store could not be read or written.
    #[error("Marker error for repository '{repo}': {message}")]
    Marker { repo: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_specifier() {
        let error = Error::InvalidSpecifier {
            specifier: "hello".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Invalid repo name 'hello'"));
        assert!(display.contains("apparent '@repo' or canonical '@@repo'"));
    }

    #[test]
    fn test_error_display_not_defined() {
        let error = Error::RepoNotDefined {
            repo: "nono".to_string(),
        };
        assert_eq!(format!("{}", error), "Repository '@@nono' is not defined");
    }

    #[test]
    fn test_error_display_not_visible() {
        let error = Error::RepoNotVisible {
            name: "nana".to_string(),
            consumer: "main".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "No repository visible as '@nana' from main repository"
        );
    }

    #[test]
    fn test_error_display_fetch_with_hint() {
        let error = Error::Fetch {
            repo: "aaa".to_string(),
            message: "Authentication failed".to_string(),
            hint: Some("Check SSH keys".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Fetching repository 'aaa' failed"));
        assert!(display.contains("hint:"));
        assert!(display.contains("Check SSH keys"));
    }

    #[test]
    fn test_error_display_vendoring_failed_joins_errors() {
        let error = Error::VendoringFailed {
            errors: vec![
                "Repository '@@nono' is not defined".to_string(),
                "No repository visible as '@nana' from main repository".to_string(),
            ],
        };
        let display = format!("{}", error);
        assert!(display.starts_with("Vendoring some repos failed with errors: ["));
        assert!(display.contains("'@@nono' is not defined, No repository visible"));
        assert!(display.ends_with("]"));
    }

    #[test]
    fn test_error_display_missing_offline_repo() {
        let error = Error::MissingOfflineRepo {
            repo: "aaa".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("not found under the vendor directory"));
        assert!(display.contains("'repo-vendor vendor'"));
        assert!(display.contains("--no-fetch"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_str = "invalid: [unclosed";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: Error = yaml_error.into();
        let display = format!("{}", error);
        assert!(display.contains("YAML parsing error"));
    }

    #[test]
    fn test_error_config_parse_with_hint() {
        let error = Error::ConfigParse {
            message: "missing rule field".to_string(),
            hint: Some("Add 'rule:' to the repo block".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Manifest parsing error"));
        assert!(display.contains("hint:"));
    }
}
