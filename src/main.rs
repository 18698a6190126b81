//! Quarry - guided atomisation of long-form notes
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quarry::cli::candidates::parse_list;
use quarry::cli::pick::PickOptions;
use quarry::cli::{
    AddCommand, AdvanceCommand, CommandOptions, CreateCommand, CritiqueCommand, EndCommand,
    PhaseCommand, PickCommand, QuarriesCommand, RemoveCommand, StartCommand, StatusCommand,
    UpdateArgs, UpdateCommand, ValidateCommand,
};
use quarry::config::{quarry_home, Config};
use quarry::error::exit_codes;
use quarry::providers::create_provider;
use quarry::storage::FileSessionStore;
use quarry::vault::FsVault;

// =============================================================================
// CLI Definition
// =============================================================================

/// Quarry - break long notes into atomic notes, one concept at a time
#[derive(Parser)]
#[command(name = "quarry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Vault root directory (defaults to the current directory)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, short, global = true)]
    json: bool,

    /// Suppress output
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a random quarry note
    Pick {
        /// Start a session on the picked note
        #[arg(long)]
        start: bool,
    },

    /// List quarry notes
    Quarries,

    /// Start a session on a note
    Start {
        /// Vault-relative path of the note
        path: String,
    },

    /// Show the live session
    Status,

    /// Move to the next phase
    Advance,

    /// Jump to a phase (introduction, identification, explanation, critique,
    /// refinement, confirmation, creation, complete)
    Phase {
        /// Phase name
        name: String,
    },

    /// Add a candidate for a concept
    Add {
        /// The concept, in a few words
        concept: String,
    },

    /// Update a candidate
    Update {
        /// Candidate id
        id: String,

        #[arg(long)]
        concept: Option<String>,

        #[arg(long)]
        explanation: Option<String>,

        #[arg(long)]
        evidence: Option<String>,

        /// Title used for the atom note
        #[arg(long)]
        title: Option<String>,

        /// Comma separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Comma separated titles of related atoms
        #[arg(long)]
        related: Option<String>,

        /// Approve the candidate for creation
        #[arg(long, conflicts_with = "reject")]
        approve: bool,

        /// Withdraw approval
        #[arg(long)]
        reject: bool,
    },

    /// Remove a candidate
    Remove {
        /// Candidate id
        id: String,
    },

    /// Check a candidate's explanation
    Validate {
        /// Candidate id
        id: String,
    },

    /// Critique a candidate
    Critique {
        /// Candidate id
        id: String,
    },

    /// Create the approved atoms and finish the session
    Create,

    /// Discard the live session
    End,
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("quarry error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Install the stderr subscriber, filtered by `QUARRY_LOG` (default `warn`).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("QUARRY_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

/// Set up the global panic handler.
///
/// On panic, appends to `~/.quarry/crash.log` and exits with the error code.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("quarry panic: {}", info);

        if let Some(home) = quarry_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::ERROR);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let root = match cli.vault {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let options = CommandOptions {
        json: cli.json,
        quiet: cli.quiet,
    };

    let config = Config::load(&root);
    let store = FileSessionStore::for_vault(&root);
    let vault = FsVault::new(&root);

    let (formatted, code) = match cli.command {
        Commands::Pick { start } => {
            let pick_options = PickOptions {
                json: cli.json,
                quiet: cli.quiet,
                start,
            };
            let output = PickCommand::new(store, vault, config).run(&pick_options);
            (output.format(&pick_options.output_options()), output.exit_code)
        }
        Commands::Quarries => {
            let output = QuarriesCommand::new(vault, config).run();
            (output.format(&options), output.exit_code)
        }
        Commands::Start { path } => {
            let output = StartCommand::new(store, vault, config).run(&path);
            (output.format(&options), output.exit_code)
        }
        Commands::Status => {
            let output = StatusCommand::new(store).run();
            (output.format(&options), output.exit_code)
        }
        Commands::Advance => {
            let output = AdvanceCommand::new(store).run();
            (output.format(&options), output.exit_code)
        }
        Commands::Phase { name } => {
            let output = PhaseCommand::new(store).run(&name);
            (output.format(&options), output.exit_code)
        }
        Commands::Add { concept } => {
            let output = AddCommand::new(store).run(&concept);
            (output.format(&options), output.exit_code)
        }
        Commands::Update {
            id,
            concept,
            explanation,
            evidence,
            title,
            tags,
            related,
            approve,
            reject,
        } => {
            let args = UpdateArgs {
                concept,
                explanation,
                evidence,
                title,
                tags: tags.as_deref().map(parse_list),
                related: related.as_deref().map(parse_list),
                approved: approval(approve, reject),
            };
            let output = UpdateCommand::new(store).run(&id, &args);
            (output.format(&options), output.exit_code)
        }
        Commands::Remove { id } => {
            let output = RemoveCommand::new(store).run(&id);
            (output.format(&options), output.exit_code)
        }
        Commands::Validate { id } => {
            let output = ValidateCommand::new(store).run(&id);
            (output.format(&options), output.exit_code)
        }
        Commands::Critique { id } => {
            let provider = create_provider(&config.provider);
            let output = CritiqueCommand::new(store, provider, config).run(&id);
            (output.format(&options), output.exit_code)
        }
        Commands::Create => {
            let output = CreateCommand::new(store, vault, config).run();
            (output.format(&options), output.exit_code)
        }
        Commands::End => {
            let output = EndCommand::new(store).run();
            (output.format(&options), output.exit_code)
        }
    };

    if !formatted.is_empty() {
        print!("{}", formatted);
        if !formatted.ends_with('\n') {
            println!();
        }
    }

    Ok(ExitCode::from(code as u8))
}

/// Map `--approve` / `--reject` to a patch value.
fn approval(approve: bool, reject: bool) -> Option<bool> {
    match (approve, reject) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}
