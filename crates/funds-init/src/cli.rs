//! Command-line interface.

use clap::{Parser, Subcommand};

/// Create the funds platform collections, validators and indexes.
#[derive(Parser, Debug)]
#[command(name = "funds-init", version)]
pub struct Cli {
    /// `MongoDB` connection string (overrides `MONGODB_URL`)
    #[arg(long, global = true)]
    pub uri: Option<String>,

    /// Database to initialize (overrides `DATABASE_NAME`)
    #[arg(long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// What to do with the database.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Create missing collections and indexes (default)
    #[default]
    Init,
    /// Report differences from the declared schema without writing
    Verify,
    /// Initialize, then insert the default fund catalog if `funds` is empty
    Seed,
}

impl Cli {
    /// The selected command; `init` when none was given.
    #[must_use]
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_init() {
        let cli = Cli::try_parse_from(["funds-init"]).unwrap();
        assert_eq!(cli.selected_command(), Command::Init);
        assert!(cli.uri.is_none());
        assert!(cli.database.is_none());
    }

    #[test]
    fn flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "funds-init",
            "verify",
            "--uri",
            "mongodb://db:27017",
            "--database",
            "funds_qa",
        ])
        .unwrap();
        assert_eq!(cli.selected_command(), Command::Verify);
        assert_eq!(cli.uri.as_deref(), Some("mongodb://db:27017"));
        assert_eq!(cli.database.as_deref(), Some("funds_qa"));
    }

    #[test]
    fn seed_subcommand() {
        let cli = Cli::try_parse_from(["funds-init", "--database", "x", "seed"]).unwrap();
        assert_eq!(cli.selected_command(), Command::Seed);
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["funds-init", "migrate"]).is_err());
    }
}
