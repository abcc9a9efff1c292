//! CLI module for hilite
//!
//! ## Commands
//!
//! - `highlight <file>` - Print every line with its final (lexical + semantic) styles
//! - `tasks <file>` - Report unresolved names and directive problems
//! - `tokens <file>` - Dump the lexical chunks of every line
//!
//! ## Design
//!
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod report;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::config::{BuildConfiguration, HighlightSettings};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// A user-facing message plus the code to exit with.
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Incremental C# highlighting with preprocessor tracking
#[derive(Parser, Debug)]
#[command(name = "hilite")]
#[command(version = VERSION)]
#[command(about = "Incremental C# highlighting with preprocessor tracking", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every line with its final styles
    Highlight {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        options: HighlightArgs,
    },

    /// Report unresolved names and directive problems
    Tasks {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        options: HighlightArgs,
    },

    /// Dump lexical chunks (no semantic overlay)
    Tokens {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        options: HighlightArgs,
    },
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct HighlightArgs {
    /// Define preprocessor symbols (repeatable; accepts `A;B` lists)
    #[arg(short = 'D', long = "define", value_name = "SYMBOLS")]
    pub defines: Vec<String>,

    /// Target runtime; `Mono` also defines __MonoCS__
    #[arg(long, value_name = "RUNTIME")]
    pub runtime: Option<String>,

    /// Lexical and preprocessor highlighting only
    #[arg(long = "no-semantic")]
    pub no_semantic: bool,

    /// Do not track #if blocks (nothing is excluded)
    #[arg(long = "no-conditional")]
    pub no_conditional: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl HighlightArgs {
    pub fn configuration(&self) -> BuildConfiguration {
        let config = BuildConfiguration::from_define_list(&self.defines.join(";"));
        match &self.runtime {
            Some(runtime) => config.with_runtime(runtime.as_str()),
            None => config,
        }
    }

    pub fn settings(&self) -> HighlightSettings {
        HighlightSettings::default()
            .with_semantic_highlighting(!self.no_semantic)
            .with_conditional_highlighting(!self.no_conditional)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Highlight { file, options } => commands::highlight_file(&file, &options),
        Command::Tasks { file, options } => commands::tasks_file(&file, &options),
        Command::Tokens { file, options } => commands::tokens_file(&file, &options),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_highlight_with_defines() {
        let cli = Cli::try_parse_from(["hilite", "highlight", "a.cs", "-D", "DEBUG;TRACE", "--define", "X"]).unwrap();
        let Command::Highlight { file, options } = cli.command else {
            panic!("Expected Highlight command");
        };
        assert_eq!(file, PathBuf::from("a.cs"));
        assert_eq!(options.configuration().defines, vec!["DEBUG", "TRACE", "X"]);
        assert!(options.settings().semantic_highlighting);
    }

    #[test]
    fn test_cli_parse_tasks_flags() {
        let cli = Cli::try_parse_from(["hilite", "tasks", "a.cs", "--json", "--runtime", "Mono"]).unwrap();
        let Command::Tasks { options, .. } = cli.command else {
            panic!("Expected Tasks command");
        };
        assert!(options.json);
        assert!(options.configuration().defined_symbols().contains("__MonoCS__"));
    }

    #[test]
    fn test_cli_parse_tokens_switches() {
        let cli = Cli::try_parse_from(["hilite", "tokens", "a.cs", "--no-semantic", "--no-conditional"]).unwrap();
        let Command::Tokens { options, .. } = cli.command else {
            panic!("Expected Tokens command");
        };
        let settings = options.settings();
        assert!(!settings.semantic_highlighting);
        assert!(!settings.conditional_highlighting);
    }

    #[test]
    fn test_cli_requires_file() {
        assert!(Cli::try_parse_from(["hilite", "highlight"]).is_err());
        assert!(Cli::try_parse_from(["hilite"]).is_err());
    }
}
