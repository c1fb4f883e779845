//! Fixed domain constants.
//!
//! Values that are part of the product's behavior rather than deployment
//! tuning. Anything an operator should be able to change lives in
//! [`crate::settings`] instead.

/// Catalog import and query behavior.
pub mod catalog {
    /// Rows read per import chunk when the setting is absent.
    pub const DEFAULT_CHUNK_ROWS: usize = 5_000;

    /// Ceiling on a configured chunk size; above this the bounded-memory
    /// guarantee stops meaning anything.
    pub const MAX_CHUNK_ROWS: usize = 100_000;

    /// Fraction of a sorted listing covered by the budget band.
    pub const BUDGET_FRACTION: f64 = 0.3;

    /// Fraction boundary where the premium band begins.
    pub const PREMIUM_FRACTION: f64 = 0.7;

    /// The budget band never shrinks below this many items.
    pub const MIN_BUDGET_ITEMS: usize = 3;

    /// Items served for a mid band whose window came out empty.
    pub const MID_FALLBACK_ITEMS: usize = 5;

    /// Cap on vehicle search matches.
    pub const MAX_SEARCH_RESULTS: usize = 20;

    /// Quotes per recommendation set.
    pub const MAX_RECOMMENDATIONS: usize = 5;

    /// Quotes per price-range listing.
    pub const MAX_PRICE_RANGE_RESULTS: usize = 10;

    /// Upper bound of a price window when the caller omits one, in rupees.
    pub const DEFAULT_PRICE_WINDOW_MAX: i64 = 100_000;

    /// Version string written into every snapshot document.
    pub const SNAPSHOT_VERSION: &str = "1";
}

/// HTTP service defaults.
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Tool execution limits.
pub mod tools {
    /// Per-tool execution timeout unless a tool overrides it.
    pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

    /// Store-backed tools (lead capture, booking) get longer.
    pub const STORE_TOOL_TIMEOUT_SECS: u64 = 45;
}

/// Conversation and classification behavior.
pub mod agent {
    /// Re-prompts allowed per collection stage before it fails.
    pub const DEFAULT_MAX_SLOT_RETRIES: u32 = 3;

    /// Confidence reported when a keyword rule matches.
    pub const MATCHED_INTENT_CONFIDENCE: f64 = 0.7;

    /// Confidence reported for the fallback intent.
    pub const FALLBACK_INTENT_CONFIDENCE: f64 = 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_fractions_are_ordered() {
        assert!(catalog::BUDGET_FRACTION > 0.0);
        assert!(catalog::BUDGET_FRACTION < catalog::PREMIUM_FRACTION);
        assert!(catalog::PREMIUM_FRACTION < 1.0);
    }

    #[test]
    fn test_chunk_defaults_fit_bounds() {
        assert!(catalog::DEFAULT_CHUNK_ROWS >= 1);
        assert!(catalog::DEFAULT_CHUNK_ROWS <= catalog::MAX_CHUNK_ROWS);
    }

    #[test]
    fn test_intent_confidences_are_probabilities() {
        assert!(agent::FALLBACK_INTENT_CONFIDENCE < agent::MATCHED_INTENT_CONFIDENCE);
        assert!(agent::MATCHED_INTENT_CONFIDENCE <= 1.0);
    }
}
