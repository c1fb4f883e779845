//! Rule-based intent classification.
//!
//! A deliberately small keyword table, checked in order with first match
//! winning, plus regex slot extraction for tyre-size mentions. The
//! classifier never touches the catalog: it labels the utterance and
//! leaves lookups to whoever routed it.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tyreplex_config::constants::agent as consts;
use tyreplex_core::{Intent, IntentClassifier, IntentPrediction};

// Intent keywords, most specific phrasing first. Checked against the
// lowercased utterance with plain substring matching.
const KEYWORD_RULES: [(Intent, &[&str]); 5] = [
    (Intent::VehicleInquiry, &["have", "my car", "my vehicle", "drive"]),
    (Intent::PriceInquiry, &["price", "cost", "how much"]),
    (Intent::BrandComparison, &["compare", "vs", "difference"]),
    (Intent::BookingRequest, &["book", "appointment", "schedule"]),
    (Intent::AvailabilityCheck, &["available", "stock", "delivery"]),
];

// Accepts "185/65 R15", "185/65R15" and "185-65-15".
static TYRE_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3}\s*[/-]\s*\d{2}\s*(?:[Rr]|-)?\s*\d{2})\b").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleIntentClassifier;

impl RuleIntentClassifier {
    pub fn new() -> Self {
        RuleIntentClassifier
    }
}

impl IntentClassifier for RuleIntentClassifier {
    fn classify(&self, text: &str) -> IntentPrediction {
        let message = text.to_lowercase();
        let mut slots = HashMap::new();
        if let Some(found) = TYRE_SIZE.find(text) {
            slots.insert("tyre_size".to_string(), found.as_str().trim().to_string());
        }

        for (intent, keywords) in KEYWORD_RULES {
            if keywords.iter().any(|keyword| message.contains(keyword)) {
                return IntentPrediction {
                    intent,
                    confidence: consts::MATCHED_INTENT_CONFIDENCE,
                    source: "rules".to_string(),
                    slots,
                };
            }
        }

        IntentPrediction {
            intent: Intent::TyreRecommendation,
            confidence: consts::FALLBACK_INTENT_CONFIDENCE,
            source: "rules".to_string(),
            slots,
        }
    }
}
