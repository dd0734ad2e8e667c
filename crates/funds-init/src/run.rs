//! Command execution against a schema target.

use funds_store::{
    seed_default_funds, verify, InitReport, SchemaInitializer, SchemaReport, SchemaTarget,
};
use tracing::{info, instrument};

use crate::cli::Command;
use crate::error::CliError;

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `init` finished.
    Initialized(InitReport),
    /// `verify` finished; the report may hold drift.
    Verified(SchemaReport),
    /// `seed` finished.
    Seeded {
        /// The initialization that ran first.
        report: InitReport,
        /// Number of funds inserted.
        inserted: usize,
    },
}

impl Outcome {
    /// Human-readable summary for stdout.
    #[must_use]
    pub fn render(&self, database: &str) -> String {
        let lines = match self {
            Self::Initialized(report) => init_lines(database, report),
            Self::Seeded { report, inserted } => {
                let mut lines = init_lines(database, report);
                if *inserted == 0 {
                    lines.push("Fund catalog already present, nothing seeded".to_string());
                } else {
                    lines.push(format!("Seeded {inserted} default funds"));
                }
                lines
            }
            Self::Verified(report) if report.is_clean() => vec![format!(
                "Database `{database}` matches the declared schema ({} collections)",
                report.checked
            )],
            Self::Verified(report) => {
                let mut lines = vec![format!(
                    "Database `{database}` differs from the declared schema:"
                )];
                lines.extend(report.drift.iter().map(|drift| format!("  - {drift}")));
                lines
            }
        };

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Fail if the outcome should end the process with an error status.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Drift` if verification found differences.
    pub fn check(&self) -> Result<(), CliError> {
        match self {
            Self::Verified(report) if !report.is_clean() => Err(CliError::Drift(report.drift.len())),
            _ => Ok(()),
        }
    }
}

fn init_lines(database: &str, report: &InitReport) -> Vec<String> {
    vec![
        format!("Database `{database}` initialized successfully"),
        format!("Collections: {}", report.collection_names().join(", ")),
        format!(
            "Indexes: {} created, {} already present",
            report.indexes_created(),
            report.index_count() - report.indexes_created()
        ),
    ]
}

/// Run `command` against `target`.
///
/// # Errors
///
/// Returns an error if initialization, verification or seeding fails.
#[instrument(skip(target))]
pub async fn execute<T: SchemaTarget + ?Sized>(
    command: Command,
    target: &T,
) -> Result<Outcome, CliError> {
    match command {
        Command::Init => {
            let report = SchemaInitializer::new(target).run().await?;
            Ok(Outcome::Initialized(report))
        }
        Command::Verify => {
            let report = verify(target).await?;
            info!(drift = report.drift.len(), "Verification finished");
            Ok(Outcome::Verified(report))
        }
        Command::Seed => {
            let report = SchemaInitializer::new(target).run().await?;
            let inserted = seed_default_funds(target).await?;
            Ok(Outcome::Seeded { report, inserted })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funds_store::{MemoryTarget, StoreError};

    #[tokio::test]
    async fn init_reports_every_collection() {
        let target = MemoryTarget::new();
        let outcome = execute(Command::Init, &target).await.unwrap();

        let text = outcome.render("btg_pactual");
        assert!(text.contains("Database `btg_pactual` initialized successfully"));
        assert!(text.contains("Collections: users, funds, transactions, user_fund_subscriptions"));
        assert!(text.contains("Indexes: 15 created, 0 already present"));
        assert!(outcome.check().is_ok());
    }

    #[tokio::test]
    async fn verify_before_init_reports_drift() {
        let target = MemoryTarget::new();
        let outcome = execute(Command::Verify, &target).await.unwrap();

        assert!(matches!(outcome.check(), Err(CliError::Drift(4))));
        assert!(outcome
            .render("db")
            .contains("  - collection `users` is missing"));
    }

    #[tokio::test]
    async fn verify_after_init_is_clean() {
        let target = MemoryTarget::new();
        execute(Command::Init, &target).await.unwrap();
        let outcome = execute(Command::Verify, &target).await.unwrap();

        assert!(outcome.check().is_ok());
        assert_eq!(
            outcome.render("db"),
            "Database `db` matches the declared schema (4 collections)\n"
        );
    }

    #[tokio::test]
    async fn seed_initializes_then_inserts_once() {
        let target = MemoryTarget::new();

        let first = execute(Command::Seed, &target).await.unwrap();
        assert!(matches!(first, Outcome::Seeded { inserted: 5, .. }));
        assert!(first.render("db").contains("Seeded 5 default funds"));

        let second = execute(Command::Seed, &target).await.unwrap();
        assert!(matches!(second, Outcome::Seeded { inserted: 0, .. }));
        assert!(second.render("db").contains("Indexes: 0 created, 15 already present"));
    }

    #[tokio::test]
    async fn connection_failure_names_the_step() {
        let target = MemoryTarget::unreachable();
        let err = execute(Command::Init, &target).await.unwrap_err();

        assert!(matches!(
            err,
            CliError::Init(ref e) if matches!(e.source, StoreError::Connection(_))
        ));
        assert!(err.to_string().starts_with("connect to database failed"));
    }
}
