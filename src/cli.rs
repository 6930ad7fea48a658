// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use crate::core::naming::APP_NAME;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pgdrift - Migration drift detection for PostgreSQL
///
/// Compares a declarative schema file with the result of replaying
/// a migrations directory, using disposable databases on a live server.
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Migration drift detection for PostgreSQL")]
#[command(long_about = "pgdrift - Migration drift detection for PostgreSQL

Materializes your declarative schema file and your migrations directory
into two temporary databases, then prints the DDL that would bring the
migrated database to the declared schema.

Temporary databases are tagged with a marker comment and dropped after
every run. If a run is killed, use `pgdrift clean` to remove leftovers.")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Create pgdrift.yaml with a `database.dbname` prefix
  2. Print the missing migration:   pgdrift diff
  3. Fail CI on drift:              pgdrift check
  4. Remove leftover databases:     pgdrift clean

For detailed help on each command, use: pgdrift <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the DDL that brings the migrated schema to the declared schema
    ///
    /// Creates two temporary databases, applies the schema file to one and
    /// every *.sql file of the migrations directory (in filename order) to
    /// the other, and prints the difference. Prints nothing when the
    /// migrations already reproduce the schema.
    ///
    /// EXAMPLES:
    ///   # Write the missing migration to a new file
    ///   pgdrift diff > migrations/20240101_add_users.sql
    ///
    ///   # Show progress on stderr
    ///   pgdrift diff --verbose
    Diff,

    /// Fail when the migrations do not reproduce the declared schema
    ///
    /// Runs the same comparison as `diff`. Exits with status 1 and prints
    /// the pending DDL when drift is found.
    ///
    /// EXAMPLES:
    ///   pgdrift check
    Check,

    /// Drop temporary databases left behind by interrupted runs
    ///
    /// Only databases carrying the exact pgdrift marker comment are dropped.
    ///
    /// EXAMPLES:
    ///   pgdrift clean --verbose
    Clean,
}
