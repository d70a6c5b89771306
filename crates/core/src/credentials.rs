//! # Credential Resolver
//!
//! Finds the provider API key. Sources, first non-blank wins:
//!
//! 1. the persisted credential file (`.scribe/.env`)
//! 2. the process environment
//! 3. an interactive prompt, when stdin is a terminal and prompting is on
//!
//! The key is handed back as a [`Credential`] and passed explicitly to the
//! engine. The process environment is never written.

use std::fmt;
use std::io::{BufRead, ErrorKind, IsTerminal, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{ensure_runtime_dir, CREDENTIAL_FILE};
use crate::error::ScribeError;
use crate::models::LlmProvider;

/// Where a credential was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    File,
    Environment,
    Prompt,
    /// Supplied directly (settings API, `scribe key`)
    Explicit,
}

/// An API key bound to the variable name it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    env_var: String,
    secret: String,
    source: CredentialSource,
}

impl Credential {
    pub fn new(env_var: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
            secret: secret.into().trim().to_string(),
            source: CredentialSource::Explicit,
        }
    }

    fn from_source(env_var: &str, secret: String, source: CredentialSource) -> Self {
        Self {
            source,
            ..Self::new(env_var, secret)
        }
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// The raw key. Only the engine should call this.
    pub fn expose(&self) -> &str {
        &self.secret
    }

    /// `sk-…wxyz` style preview for status displays.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.secret.chars().collect();
        if chars.len() < 12 {
            return "****".to_string();
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("env_var", &self.env_var)
            .field("secret", &self.masked())
            .field("source", &self.source)
            .finish()
    }
}

/// Whether the resolver may fall back to asking on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Disabled,
    /// Prompt only when stdin is attached to a terminal
    IfTerminal,
}

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    env_var: String,
    file: PathBuf,
    prompt: PromptMode,
}

impl CredentialResolver {
    /// Resolver for `provider`'s key, reading `runtime_dir/.env`.
    pub fn new(provider: LlmProvider, runtime_dir: &Path) -> Self {
        Self {
            env_var: provider.env_var().to_string(),
            file: runtime_dir.join(CREDENTIAL_FILE),
            prompt: PromptMode::Disabled,
        }
    }

    pub fn with_env_var(mut self, env_var: impl Into<String>) -> Self {
        self.env_var = env_var.into();
        self
    }

    pub fn with_prompt(mut self, prompt: PromptMode) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    pub fn resolve(&self) -> Result<Credential, ScribeError> {
        if let Some(secret) = self.from_file() {
            tracing::debug!(file = %self.file.display(), "API key loaded from credential file");
            return Ok(Credential::from_source(
                &self.env_var,
                secret,
                CredentialSource::File,
            ));
        }

        if let Some(secret) = non_blank(std::env::var(&self.env_var).ok()) {
            tracing::debug!(env_var = %self.env_var, "API key loaded from environment");
            return Ok(Credential::from_source(
                &self.env_var,
                secret,
                CredentialSource::Environment,
            ));
        }

        if self.prompt == PromptMode::IfTerminal && std::io::stdin().is_terminal() {
            let stdin = std::io::stdin();
            let answer = self.prompt_line(&mut stdin.lock(), &mut std::io::stderr())?;
            if let Some(secret) = answer {
                return Ok(Credential::from_source(
                    &self.env_var,
                    secret,
                    CredentialSource::Prompt,
                ));
            }
        }

        Err(self.missing())
    }

    /// Write the key into the credential file, replacing an earlier value
    /// for the same variable and keeping every other line.
    pub fn persist(&self, credential: &Credential) -> Result<(), ScribeError> {
        if credential.expose().is_empty() {
            return Err(ScribeError::InvalidInput("API key must not be empty".to_string()));
        }
        // One `KEY=value` line per key; a newline would smuggle in another entry
        if credential.expose().chars().any(char::is_control) {
            return Err(ScribeError::InvalidInput(
                "API key must not contain control characters".to_string(),
            ));
        }
        if let Some(dir) = self.file.parent() {
            ensure_runtime_dir(dir)?;
        }

        let existing = match std::fs::read_to_string(&self.file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                String::from("# Scribe API Keys - DO NOT COMMIT\n")
            }
            Err(e) => return Err(e.into()),
        };
        let prefix = format!("{}=", credential.env_var());
        let mut content: String = existing
            .lines()
            .filter(|line| !line.trim_start().starts_with(&prefix))
            .map(|line| format!("{}\n", line))
            .collect();
        content.push_str(&format!("{}={}\n", credential.env_var(), credential.expose()));

        std::fs::write(&self.file, content)?;
        tracing::info!(file = %self.file.display(), env_var = %credential.env_var(), "API key saved");
        Ok(())
    }

    fn from_file(&self) -> Option<String> {
        if !self.file.exists() {
            return None;
        }
        let entries = match dotenvy::from_path_iter(&self.file) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(file = %self.file.display(), "Unreadable credential file: {}", e);
                return None;
            }
        };
        let value = entries
            .filter_map(Result::ok)
            .filter(|(key, _)| key == &self.env_var)
            .map(|(_, value)| value)
            .last();
        non_blank(value)
    }

    fn prompt_line(
        &self,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> std::io::Result<Option<String>> {
        write!(output, "Please enter your {}: ", self.env_var)?;
        output.flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(non_blank(Some(line)))
    }

    fn missing(&self) -> ScribeError {
        ScribeError::MissingCredential {
            env_var: self.env_var.clone(),
            path: self.file.clone(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns a unique variable name so parallel tests never share env state.
    fn resolver(dir: &Path, env_var: &str) -> CredentialResolver {
        CredentialResolver::new(LlmProvider::OpenAI, dir).with_env_var(env_var)
    }

    #[test]
    fn test_file_beats_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SCRIBE_TEST_KEY_ORDER=A\n").unwrap();
        std::env::set_var("SCRIBE_TEST_KEY_ORDER", "B");

        let credential = resolver(dir.path(), "SCRIBE_TEST_KEY_ORDER").resolve().unwrap();
        assert_eq!(credential.expose(), "A");
        assert_eq!(credential.source(), CredentialSource::File);
    }

    #[test]
    fn test_environment_used_without_file() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("SCRIBE_TEST_KEY_ENV", "  env-secret  ");

        let credential = resolver(dir.path(), "SCRIBE_TEST_KEY_ENV").resolve().unwrap();
        assert_eq!(credential.expose(), "env-secret");
        assert_eq!(credential.source(), CredentialSource::Environment);
    }

    #[test]
    fn test_blank_file_value_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SCRIBE_TEST_KEY_BLANK=\"   \"\n").unwrap();
        std::env::set_var("SCRIBE_TEST_KEY_BLANK", "from-env");

        let credential = resolver(dir.path(), "SCRIBE_TEST_KEY_BLANK").resolve().unwrap();
        assert_eq!(credential.expose(), "from-env");
    }

    #[test]
    fn test_missing_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver(dir.path(), "SCRIBE_TEST_KEY_ABSENT")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ScribeError::MissingCredential { .. }));
        assert!(err.to_string().contains("SCRIBE_TEST_KEY_ABSENT"));
    }

    #[test]
    fn test_resolve_does_not_touch_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SCRIBE_TEST_KEY_NOENV=file-only\n").unwrap();

        resolver(dir.path(), "SCRIBE_TEST_KEY_NOENV").resolve().unwrap();
        assert!(std::env::var("SCRIBE_TEST_KEY_NOENV").is_err());
    }

    #[test]
    fn test_persist_replaces_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = dir.path().join(".scribe");
        let resolver = resolver(&runtime, "SCRIBE_TEST_KEY_PERSIST");
        std::fs::create_dir_all(&runtime).unwrap();
        std::fs::write(
            resolver.file(),
            "OTHER_KEY=keep\nSCRIBE_TEST_KEY_PERSIST=old\n",
        )
        .unwrap();

        resolver
            .persist(&Credential::new("SCRIBE_TEST_KEY_PERSIST", "new"))
            .unwrap();

        let content = std::fs::read_to_string(resolver.file()).unwrap();
        assert!(content.contains("OTHER_KEY=keep"));
        assert!(!content.contains("=old"));
        assert_eq!(resolver.resolve().unwrap().expose(), "new");
        assert!(runtime.join(".gitignore").exists());
    }

    #[test]
    fn test_persist_rejects_empty_key() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver(dir.path(), "SCRIBE_TEST_KEY_EMPTY")
            .persist(&Credential::new("SCRIBE_TEST_KEY_EMPTY", "  "))
            .unwrap_err();
        assert!(matches!(err, ScribeError::InvalidInput(_)));
    }

    #[test]
    fn test_persist_keeps_unreadable_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path(), "SCRIBE_TEST_KEY_LATIN1");
        let original: &[u8] = b"OTHER_KEY=keep\n# caf\xE9\n";
        std::fs::write(resolver.file(), original).unwrap();

        let err = resolver
            .persist(&Credential::new("SCRIBE_TEST_KEY_LATIN1", "new"))
            .unwrap_err();
        assert!(matches!(err, ScribeError::Io(_)));
        assert_eq!(std::fs::read(resolver.file()).unwrap(), original);
    }

    #[test]
    fn test_persist_rejects_embedded_newline() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path(), "SCRIBE_TEST_KEY_NEWLINE");

        let err = resolver
            .persist(&Credential::new("SCRIBE_TEST_KEY_NEWLINE", "sk-a\nINJECTED=1"))
            .unwrap_err();
        assert!(matches!(err, ScribeError::InvalidInput(_)));
        assert!(!resolver.file().exists());
    }

    #[test]
    fn test_prompt_line_reads_and_trims() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path(), "SCRIBE_TEST_KEY_PROMPT");
        let mut input = std::io::Cursor::new("  typed-key \n");
        let mut output = Vec::new();

        let answer = resolver.prompt_line(&mut input, &mut output).unwrap();
        assert_eq!(answer.as_deref(), Some("typed-key"));
        assert!(String::from_utf8(output).unwrap().contains("SCRIBE_TEST_KEY_PROMPT"));

        let mut empty = std::io::Cursor::new("\n");
        assert_eq!(resolver.prompt_line(&mut empty, &mut Vec::new()).unwrap(), None);
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::new("OPENAI_API_KEY", "sk-abcdefghijklmnop");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("abcdefghijklmnop"));
        assert!(debug.contains("sk-…mnop"));
    }
}
