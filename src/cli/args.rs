//! Command-line argument parsing for the ollamastream demo binary
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::config::ClientConfig;
use crate::errors::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// ollamastream - chat with a local Ollama model from the terminal
#[derive(Parser, Debug)]
#[command(name = "ollamastream")]
#[command(version)]
#[command(about = "Stream chat answers, list models and inspect them on a local Ollama server", long_about = None)]
pub struct Args {
    /// Ollama model to use (overrides config and OLLAMA_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Ollama base URL (overrides config and OLLAMA_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Deadline for one chat call, in seconds
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress logs)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Stream an answer to a prompt
    Chat {
        /// Prompt text
        prompt: String,

        /// Optional system message sent before the prompt
        #[arg(long)]
        system: Option<String>,

        /// Single attempt without retry (the deadline still applies)
        #[arg(long)]
        once: bool,
    },

    /// Ask for a structured JSON answer
    Json {
        /// Prompt text
        prompt: String,
    },

    /// List available Ollama models
    Models,

    /// Show metadata for one model
    Show {
        /// Model name (e.g., "llama3.1:8b")
        name: String,
    },

    /// Check that the server is reachable
    Health,

    /// Display effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Load configuration and apply command-line overrides on top
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load(self.config.as_deref())?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(secs) = self.deadline {
            config = config.with_deadline(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }
}

impl Verbosity {
    /// Default tracing filter for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "off",
            Verbosity::Normal => "ollamastream=warn",
            Verbosity::Verbose => "ollamastream=info",
            Verbosity::VeryVerbose => "ollamastream=debug",
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["ollamastream", "-q", "models"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["ollamastream", "models"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["ollamastream", "-v", "models"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["ollamastream", "-vv", "models"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_chat_subcommand() {
        let args = parse(&["ollamastream", "chat", "Why is the sky blue?", "--system", "be brief"]);
        assert_eq!(
            args.command,
            Commands::Chat {
                prompt: "Why is the sky blue?".to_string(),
                system: Some("be brief".to_string()),
                once: false,
            }
        );
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["ollamastream"]).is_err());
    }

    #[test]
    fn test_overrides_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        ClientConfig::default().save(&path).unwrap();

        let path_arg = path.to_string_lossy().to_string();
        let args = parse(&[
            "ollamastream",
            "--config",
            &path_arg,
            "--host",
            "http://10.1.1.1:11434",
            "--model",
            "phi3",
            "--deadline",
            "5",
            "health",
        ]);

        let config = args.client_config().unwrap();
        assert_eq!(config.host, "http://10.1.1.1:11434");
        assert_eq!(config.model, "phi3");
        assert_eq!(config.deadline_ms, 5000);
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(Verbosity::Quiet.log_filter(), "off");
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());
    }
}
