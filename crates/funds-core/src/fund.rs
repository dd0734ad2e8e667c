//! Fund types and the default fund catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::FundId;

token_enum! {
    /// Regulatory category of a fund.
    ///
    /// The database stores the category as a free string; these are the
    /// categories the platform offers.
    FundCategory, "category" {
        /// Voluntary pension fund (Fondo de Pensiones Voluntarias).
        Fpv => "FPV",
        /// Collective investment fund (Fondo de Inversión Colectiva).
        Fic => "FIC",
    }
}

/// An investment fund clients can subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fund {
    /// Unique identifier.
    pub id: FundId,

    /// Fund name, e.g. `FPV_BTG_PACTUAL_RECAUDADORA`.
    pub name: String,

    /// Fund category.
    pub category: FundCategory,

    /// Minimum subscription amount in COP.
    pub minimum_amount: i64,

    /// Human-readable description.
    pub description: Option<String>,

    /// Whether the fund accepts new subscriptions.
    pub is_active: bool,

    /// When the fund was created.
    pub created_at: DateTime<Utc>,
}

impl Fund {
    /// Create an active fund.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyField` if the name is blank.
    pub fn new(name: impl Into<String>, category: FundCategory, minimum_amount: i64) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyField("name"));
        }

        Ok(Self {
            id: FundId::generate(),
            name,
            category,
            minimum_amount,
            description: None,
            is_active: true,
            created_at: Utc::now(),
        })
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Catalog entries: name, category, minimum (COP), description.
const DEFAULT_FUND_CATALOG: [(&str, FundCategory, i64, &str); 5] = [
    (
        "FPV_BTG_PACTUAL_RECAUDADORA",
        FundCategory::Fpv,
        75_000,
        "Fondo de Pensiones Voluntarias BTG Pactual Recaudadora",
    ),
    (
        "FPV_BTG_PACTUAL_ECOPETROL",
        FundCategory::Fpv,
        125_000,
        "Fondo de Pensiones Voluntarias BTG Pactual Ecopetrol",
    ),
    (
        "DEUDAPRIVADA",
        FundCategory::Fic,
        50_000,
        "Fondo de Inversión Colectiva de Deuda Privada",
    ),
    (
        "FDO-ACCIONES",
        FundCategory::Fic,
        250_000,
        "Fondo de Inversión Colectiva de Acciones",
    ),
    (
        "FPV_BTG_PACTUAL_DINAMICA",
        FundCategory::Fpv,
        100_000,
        "Fondo de Pensiones Voluntarias BTG Pactual Dinámica",
    ),
];

/// The funds offered on a fresh installation.
#[must_use]
pub fn default_funds() -> Vec<Fund> {
    let created_at = Utc::now();
    DEFAULT_FUND_CATALOG
        .iter()
        .map(|&(name, category, minimum_amount, description)| Fund {
            id: FundId::generate(),
            name: name.to_string(),
            category,
            minimum_amount,
            description: Some(description.to_string()),
            is_active: true,
            created_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_five_active_funds() {
        let funds = default_funds();
        assert_eq!(funds.len(), 5);
        assert!(funds.iter().all(|f| f.is_active && f.description.is_some()));

        let recaudadora = &funds[0];
        assert_eq!(recaudadora.name, "FPV_BTG_PACTUAL_RECAUDADORA");
        assert_eq!(recaudadora.minimum_amount, 75_000);
        assert_eq!(recaudadora.category, FundCategory::Fpv);

        let acciones = funds.iter().find(|f| f.name == "FDO-ACCIONES").unwrap();
        assert_eq!(acciones.minimum_amount, 250_000);
        assert_eq!(acciones.category, FundCategory::Fic);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(matches!(
            Fund::new(" ", FundCategory::Fic, 1),
            Err(DomainError::EmptyField("name"))
        ));
    }

    #[test]
    fn category_uses_uppercase_tokens() {
        assert_eq!(FundCategory::Fpv.as_str(), "FPV");
        assert_eq!(serde_json::to_string(&FundCategory::Fic).unwrap(), "\"FIC\"");
        assert_eq!("FIC".parse::<FundCategory>().unwrap(), FundCategory::Fic);
    }
}
