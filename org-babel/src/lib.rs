//! org-babel: source-block execution
//!
//! Runs the content of a `src` block with the conventional interpreter for
//! its language tag and returns the combined stdout/stderr as text. A
//! failing script is still a successful execution: its diagnostics and exit
//! status are part of the returned text, so the editor shows them instead
//! of swallowing them. Only a missing interpreter or an unrecognized
//! language is an error.

use std::io::Write;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unsupported source language {0:?}")]
    UnsupportedLanguage(String),
    #[error("no {program} interpreter found for {language}")]
    InterpreterMissing { language: String, program: String },
    #[error("failed to run {program}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Languages the executor recognizes, with their interpreter programs in
/// preference order.
const INTERPRETERS: &[(&str, &[&str])] = &[
    ("python", &["python3", "python"]),
    ("bash", &["bash"]),
    ("sh", &["sh"]),
    ("javascript", &["node"]),
    ("js", &["node"]),
    ("ruby", &["ruby"]),
];

/// Execute `code` under the interpreter for `language`.
pub fn execute(language: &str, code: &str) -> Result<String, ExecError> {
    let normalized = language.trim().to_lowercase();
    let programs = INTERPRETERS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, programs)| *programs)
        .ok_or_else(|| ExecError::UnsupportedLanguage(language.to_string()))?;

    let program = programs
        .iter()
        .find_map(|candidate| which::which(candidate).ok())
        .ok_or_else(|| ExecError::InterpreterMissing {
            language: normalized.clone(),
            program: programs[0].to_string(),
        })?;

    let mut script = tempfile::NamedTempFile::new().map_err(|source| ExecError::Io {
        program: program.display().to_string(),
        source,
    })?;
    script
        .write_all(code.as_bytes())
        .map_err(|source| ExecError::Io {
            program: program.display().to_string(),
            source,
        })?;

    debug!(language = %normalized, program = %program.display(), "executing source block");
    let output = Command::new(&program)
        .arg(script.path())
        .output()
        .map_err(|source| ExecError::Io {
            program: program.display().to_string(),
            source,
        })?;

    let mut text = String::new();
    text.push_str(&String::from_utf8_lossy(&output.stdout));
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    if !output.status.success() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&format!("[exit status: {}]", output.status));
    }
    Ok(text)
}

/// Whether `language` is one the executor can run.
pub fn is_supported(language: &str) -> bool {
    let normalized = language.trim().to_lowercase();
    INTERPRETERS.iter().any(|(name, _)| *name == normalized)
}
