//! Budget bands over a price-sorted listing.

use serde::{Deserialize, Serialize};

/// Positional price bucket within a sorted tyre listing.
///
/// Bands are positional, not rupee thresholds: `Budget` is the cheap end
/// of the sorted list, `Premium` the expensive end, `Mid` the window
/// between them and `All` the whole listing. Slicing rules live in the
/// catalog query layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetBand {
    Budget,
    Mid,
    Premium,
    #[default]
    All,
}

impl BudgetBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetBand::Budget => "budget",
            BudgetBand::Mid => "mid",
            BudgetBand::Premium => "premium",
            BudgetBand::All => "all",
        }
    }

    /// Case-insensitive parse; `None` for anything outside the four bands.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Some(BudgetBand::Budget),
            "mid" => Some(BudgetBand::Mid),
            "premium" => Some(BudgetBand::Premium),
            "all" => Some(BudgetBand::All),
            _ => None,
        }
    }
}
