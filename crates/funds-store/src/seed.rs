//! Default fund catalog seeding.

use funds_core::{default_funds, Fund};
use tracing::{info, instrument};

use crate::documents::ToDocument;
use crate::error::{Result, StoreError};
use crate::schema;
use crate::target::SchemaTarget;
use crate::validate;

/// Insert the default fund catalog if `funds` is empty.
///
/// Returns the number of funds inserted; zero when the collection already
/// holds data.
///
/// # Errors
///
/// Returns an error if a fund fails the declared schema or an insert fails.
pub async fn seed_default_funds<T: SchemaTarget + ?Sized>(target: &T) -> Result<usize> {
    seed_funds(target, &default_funds()).await
}

/// Insert `funds` if the `funds` collection is empty.
///
/// Every document is checked against the declared schema before the first
/// insert, so a bad catalog writes nothing.
///
/// # Errors
///
/// Returns an error if a fund fails the declared schema or an insert fails.
#[instrument(skip_all, fields(funds = funds.len()))]
pub async fn seed_funds<T: SchemaTarget + ?Sized>(target: &T, funds: &[Fund]) -> Result<usize> {
    let existing = target.count_documents(Fund::COLLECTION).await?;
    if existing > 0 {
        info!(existing, "Fund catalog already present, skipping seed");
        return Ok(0);
    }

    let declared = schema::funds();
    let documents = funds
        .iter()
        .map(|fund| {
            let document = fund.to_document()?;
            validate::check(&declared, &document).map_err(|reason| {
                StoreError::DocumentRejected {
                    collection: Fund::COLLECTION.to_string(),
                    reason: format!("{}: {reason}", fund.name),
                }
            })?;
            Ok(document)
        })
        .collect::<Result<Vec<_>>>()?;

    for document in documents {
        target.insert_document(Fund::COLLECTION, document).await?;
    }

    info!(inserted = funds.len(), "Seeded fund catalog");
    Ok(funds.len())
}
