// src/cli.rs
use clap::{Command, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use workout_schedule_lib::{Weekday, REP_CHOICES};

#[derive(Parser, Debug)]
#[command(author, version, about = "Build and edit weekly workout schedules", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print tables as CSV instead
    #[arg(long, global = true)]
    pub export_csv: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

fn parse_reps(s: &str) -> Result<u32, String> {
    let reps: u32 = s.parse().map_err(|e| format!("'{s}' is not a number: {e}"))?;
    if REP_CHOICES.contains(&reps) {
        Ok(reps)
    } else {
        Err(format!("reps must be one of {REP_CHOICES:?}"))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty schedule
    Create {
        /// Display name (defaults to the configured placeholder)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List stored schedules
    List,
    /// Show one schedule, day by day
    Show {
        /// Schedule ID
        id: String,
        /// Only show this day (defaults to the whole week)
        #[arg(short, long)]
        day: Option<Weekday>,
    },
    /// Add a catalog exercise to a day
    Add {
        /// Schedule ID
        id: String,
        #[arg(short, long)]
        day: Weekday,
        /// Catalog exercise ID or name
        #[arg(short, long)]
        exercise: String,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=6))]
        sets: Option<u32>,
        #[arg(short, long, value_parser = parse_reps)]
        reps: Option<u32>,
    },
    /// Change sets and/or reps of an exercise already on a day
    Update {
        /// Schedule ID
        id: String,
        #[arg(short, long)]
        day: Weekday,
        /// Entry ID as shown by 'show'
        #[arg(short, long)]
        exercise_id: String,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=6))]
        sets: Option<u32>,
        #[arg(short, long, value_parser = parse_reps)]
        reps: Option<u32>,
    },
    /// Remove an exercise from a day
    Remove {
        /// Schedule ID
        id: String,
        #[arg(short, long)]
        day: Weekday,
        /// Entry ID as shown by 'show'
        #[arg(short, long)]
        exercise_id: String,
    },
    /// Rename a schedule
    Rename {
        /// Schedule ID
        id: String,
        name: String,
    },
    /// Delete a schedule
    Delete {
        /// Schedule ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Search the exercise catalog (name, body part, equipment, muscles)
    Catalog {
        /// Free-text query; omit to list everything
        query: Option<String>,
    },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Set sets used when 'add' is given none
    SetDefaultSets {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=6))]
        sets: u32,
    },
    /// Set reps used when 'add' is given none
    SetDefaultReps {
        #[arg(value_parser = parse_reps)]
        reps: u32,
    },
    /// Enable or disable the prompt before deleting a schedule
    SetConfirmDelete {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Generate a shell completion script
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> Command {
    Cli::command()
}
