use serde::{Deserialize, Serialize};

use arledger_core::{CompanyId, CountryCode, CurrencyCode, Entity};

/// Company master data as seen by the accounting layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// Base (company) currency; balances are expressed in it.
    pub currency: CurrencyCode,
    /// Rounding precision of the company currency.
    pub currency_decimals: u32,
    /// Fiscal country. Localizations key off this.
    pub country: Option<CountryCode>,
}

impl Company {
    pub fn new(name: impl Into<String>, currency: CurrencyCode, country: Option<CountryCode>) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            currency,
            currency_decimals: 2,
            country,
        }
    }

    pub fn is_country(&self, country: &CountryCode) -> bool {
        self.country.as_ref() == Some(country)
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
