//! Stage-Based Dialog Management
//!
//! Conversation flow for a tyre sales call: greet, collect the vehicle
//! identity slot by slot, recommend, then capture contact and booking
//! details. The voice layer driving this lives outside this crate; the
//! manager only tracks state, validates transitions and meters the retry
//! budget each collection stage gets for failed slot extractions.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tyreplex_config::constants::agent as consts;

use crate::AgentError;

/// Conversation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    /// Initial greeting and rapport building
    #[default]
    Greeting,
    /// Collecting the vehicle make
    CollectMake,
    /// Collecting the model within the make
    CollectModel,
    /// Collecting the exact variant
    CollectVariant,
    /// Presenting matched tyre options
    Recommend,
    /// Capturing name and phone number
    CollectContact,
    /// Scheduling the fitment
    Booking,
    /// Wrapping up
    Close,
}

impl ConversationStage {
    /// Get stage display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationStage::Greeting => "Greeting",
            ConversationStage::CollectMake => "Collect Make",
            ConversationStage::CollectModel => "Collect Model",
            ConversationStage::CollectVariant => "Collect Variant",
            ConversationStage::Recommend => "Recommend",
            ConversationStage::CollectContact => "Collect Contact",
            ConversationStage::Booking => "Booking",
            ConversationStage::Close => "Close",
        }
    }

    /// The slot this stage is trying to fill, if it is a collection stage.
    pub fn required_slot(&self) -> Option<&'static str> {
        match self {
            ConversationStage::CollectMake => Some("make"),
            ConversationStage::CollectModel => Some("model"),
            ConversationStage::CollectVariant => Some("variant"),
            ConversationStage::CollectContact => Some("phone_number"),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationStage::Close)
    }

    /// Short guidance for whoever renders this stage's prompt.
    pub fn guidance(&self) -> &'static str {
        match self {
            ConversationStage::Greeting => {
                "Welcome the customer and ask which vehicle they drive."
            }
            ConversationStage::CollectMake => {
                "Ask for the vehicle make, for example Maruti Suzuki or Hyundai."
            }
            ConversationStage::CollectModel => "Ask for the model within the confirmed make.",
            ConversationStage::CollectVariant => {
                "Ask for the exact variant; fitments differ between variants."
            }
            ConversationStage::Recommend => {
                "Present the matched tyre options with prices and discounts."
            }
            ConversationStage::CollectContact => {
                "Ask for the customer's name and 10-digit mobile number."
            }
            ConversationStage::Booking => {
                "Offer a fitment date and time slot, then confirm the booking."
            }
            ConversationStage::Close => "Summarise next steps and thank the customer.",
        }
    }

    /// Get all valid transitions from this stage
    pub fn valid_transitions(&self) -> Vec<ConversationStage> {
        match self {
            ConversationStage::Greeting => {
                vec![ConversationStage::CollectMake, ConversationStage::Close]
            }
            ConversationStage::CollectMake => {
                vec![ConversationStage::CollectModel, ConversationStage::Close]
            }
            ConversationStage::CollectModel => {
                vec![ConversationStage::CollectVariant, ConversationStage::Close]
            }
            ConversationStage::CollectVariant => {
                vec![ConversationStage::Recommend, ConversationStage::Close]
            }
            ConversationStage::Recommend => vec![
                ConversationStage::CollectContact,
                ConversationStage::Booking,
                ConversationStage::Close,
            ],
            ConversationStage::CollectContact => {
                vec![ConversationStage::Booking, ConversationStage::Close]
            }
            ConversationStage::Booking => vec![ConversationStage::Close],
            ConversationStage::Close => vec![],
        }
    }
}

/// Stage transition
#[derive(Debug, Clone)]
pub struct StageTransition {
    pub from: ConversationStage,
    pub to: ConversationStage,
    pub reason: TransitionReason,
}

/// Reason for stage transition
#[derive(Debug, Clone)]
pub enum TransitionReason {
    /// The stage's slot was extracted successfully
    SlotFilled(String),
    /// Customer explicitly asked for this
    CustomerRequest,
    /// Retry budget for the stage ran out
    RetriesExhausted,
    /// Natural conversation flow
    NaturalFlow,
    /// Manual override or state restore
    Manual,
}

/// What a failed slot extraction means for the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Budget remains, ask again.
    Reprompt,
    /// Budget spent, the caller should close gracefully.
    Exhausted,
}

/// Stage manager for tracking and transitioning conversation stages
pub struct StageManager {
    current_stage: Mutex<ConversationStage>,
    stage_history: Mutex<Vec<StageTransition>>,
    stage_turns: Mutex<HashMap<ConversationStage, usize>>,
    slot_retries: Mutex<HashMap<ConversationStage, u32>>,
    collected: Mutex<HashMap<String, String>>,
    max_slot_retries: u32,
}

impl StageManager {
    pub fn new() -> Self {
        Self::with_retry_budget(consts::DEFAULT_MAX_SLOT_RETRIES)
    }

    /// Manager with a specific per-stage retry budget (at least 1).
    pub fn with_retry_budget(max_slot_retries: u32) -> Self {
        Self {
            current_stage: Mutex::new(ConversationStage::Greeting),
            stage_history: Mutex::new(Vec::new()),
            stage_turns: Mutex::new(HashMap::new()),
            slot_retries: Mutex::new(HashMap::new()),
            collected: Mutex::new(HashMap::new()),
            max_slot_retries: max_slot_retries.max(1),
        }
    }

    /// Get current stage
    pub fn current(&self) -> ConversationStage {
        *self.current_stage.lock()
    }

    /// Record a turn in the current stage
    pub fn record_turn(&self) {
        let stage = self.current();
        let mut turns = self.stage_turns.lock();
        *turns.entry(stage).or_insert(0) += 1;
    }

    /// Record an extracted slot value
    pub fn record_slot(&self, key: &str, value: &str) {
        self.collected
            .lock()
            .insert(key.to_string(), value.to_string());
    }

    pub fn slot(&self, key: &str) -> Option<String> {
        self.collected.lock().get(key).cloned()
    }

    /// Everything collected so far
    pub fn slots(&self) -> HashMap<String, String> {
        self.collected.lock().clone()
    }

    /// Burn one retry of the current stage's budget after a failed slot
    /// extraction. Returns whether to re-prompt or give up.
    pub fn record_retry(&self) -> RetryOutcome {
        let stage = self.current();
        let mut retries = self.slot_retries.lock();
        let used = retries.entry(stage).or_insert(0);
        *used += 1;
        if *used >= self.max_slot_retries {
            tracing::debug!(stage = stage.display_name(), "slot retry budget exhausted");
            RetryOutcome::Exhausted
        } else {
            RetryOutcome::Reprompt
        }
    }

    /// Retries already burned in the current stage
    pub fn retries_used(&self) -> u32 {
        let stage = self.current();
        self.slot_retries.lock().get(&stage).copied().unwrap_or(0)
    }

    /// Whether the current stage has done its job: its slot is filled, or
    /// for stages without one, at least one turn has happened.
    pub fn stage_completed(&self) -> bool {
        let stage = self.current();
        match stage.required_slot() {
            Some(slot) => self.collected.lock().contains_key(slot),
            None => {
                if stage.is_terminal() {
                    return false;
                }
                self.stage_turns.lock().get(&stage).copied().unwrap_or(0) >= 1
            }
        }
    }

    /// Transition to a new stage
    pub fn transition(
        &self,
        to: ConversationStage,
        reason: TransitionReason,
    ) -> Result<StageTransition, AgentError> {
        let from = self.current();

        if !from.valid_transitions().contains(&to) && to != from {
            return Err(AgentError::InvalidTransition { from, to });
        }

        let transition = StageTransition { from, to, reason };
        *self.current_stage.lock() = to;
        self.stage_history.lock().push(transition.clone());

        Ok(transition)
    }

    /// Force set stage without validation (for restore operations)
    pub fn set_stage(&self, stage: ConversationStage) {
        let from = self.current();
        *self.current_stage.lock() = stage;
        self.stage_history.lock().push(StageTransition {
            from,
            to: stage,
            reason: TransitionReason::Manual,
        });
    }

    /// Suggest next stage based on current state
    pub fn suggest_next(&self) -> Option<ConversationStage> {
        if !self.stage_completed() {
            return None;
        }
        match self.current() {
            ConversationStage::Greeting => Some(ConversationStage::CollectMake),
            ConversationStage::CollectMake => Some(ConversationStage::CollectModel),
            ConversationStage::CollectModel => Some(ConversationStage::CollectVariant),
            ConversationStage::CollectVariant => Some(ConversationStage::Recommend),
            ConversationStage::Recommend => Some(ConversationStage::CollectContact),
            ConversationStage::CollectContact => Some(ConversationStage::Booking),
            ConversationStage::Booking => Some(ConversationStage::Close),
            ConversationStage::Close => None,
        }
    }

    /// Get stage history
    pub fn history(&self) -> Vec<StageTransition> {
        self.stage_history.lock().clone()
    }

    /// Get turns in current stage
    pub fn current_stage_turns(&self) -> usize {
        let stage = self.current();
        self.stage_turns.lock().get(&stage).copied().unwrap_or(0)
    }

    /// Reset manager
    pub fn reset(&self) {
        *self.current_stage.lock() = ConversationStage::Greeting;
        self.stage_history.lock().clear();
        self.stage_turns.lock().clear();
        self.slot_retries.lock().clear();
        self.collected.lock().clear();
    }
}

impl Default for StageManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_transitions() {
        let manager = StageManager::new();

        assert_eq!(manager.current(), ConversationStage::Greeting);

        let result = manager.transition(
            ConversationStage::CollectMake,
            TransitionReason::NaturalFlow,
        );
        assert!(result.is_ok());
        assert_eq!(manager.current(), ConversationStage::CollectMake);
    }

    #[test]
    fn test_invalid_transition() {
        let manager = StageManager::new();

        // Can't jump from Greeting straight to Booking.
        let result = manager.transition(ConversationStage::Booking, TransitionReason::Manual);
        assert!(matches!(
            result,
            Err(AgentError::InvalidTransition {
                from: ConversationStage::Greeting,
                to: ConversationStage::Booking,
            })
        ));
        assert_eq!(manager.current(), ConversationStage::Greeting);
    }

    #[test]
    fn test_every_stage_can_abort_to_close() {
        for stage in [
            ConversationStage::Greeting,
            ConversationStage::CollectMake,
            ConversationStage::CollectModel,
            ConversationStage::CollectVariant,
            ConversationStage::Recommend,
            ConversationStage::CollectContact,
            ConversationStage::Booking,
        ] {
            let manager = StageManager::new();
            manager.set_stage(stage);
            let result =
                manager.transition(ConversationStage::Close, TransitionReason::CustomerRequest);
            assert!(result.is_ok(), "could not close from {stage:?}");
        }
    }

    #[test]
    fn test_close_is_terminal() {
        let manager = StageManager::new();
        manager.set_stage(ConversationStage::Close);
        assert!(manager.current().is_terminal());
        assert!(manager
            .transition(ConversationStage::Greeting, TransitionReason::NaturalFlow)
            .is_err());
        assert_eq!(manager.suggest_next(), None);
    }

    #[test]
    fn test_full_happy_path() {
        let manager = StageManager::new();
        let path = [
            ConversationStage::CollectMake,
            ConversationStage::CollectModel,
            ConversationStage::CollectVariant,
            ConversationStage::Recommend,
            ConversationStage::CollectContact,
            ConversationStage::Booking,
            ConversationStage::Close,
        ];
        for stage in path {
            manager
                .transition(stage, TransitionReason::NaturalFlow)
                .unwrap();
        }
        assert_eq!(manager.current(), ConversationStage::Close);
        assert_eq!(manager.history().len(), 7);
    }

    #[test]
    fn test_recommend_may_skip_contact_collection() {
        let manager = StageManager::new();
        manager.set_stage(ConversationStage::Recommend);
        assert!(manager
            .transition(ConversationStage::Booking, TransitionReason::NaturalFlow)
            .is_ok());
    }

    #[test]
    fn test_retry_budget_exhaustion() {
        let manager = StageManager::new();
        manager
            .transition(
                ConversationStage::CollectMake,
                TransitionReason::NaturalFlow,
            )
            .unwrap();

        // Default budget is 3 attempts.
        assert_eq!(manager.record_retry(), RetryOutcome::Reprompt);
        assert_eq!(manager.record_retry(), RetryOutcome::Reprompt);
        assert_eq!(manager.record_retry(), RetryOutcome::Exhausted);
        assert_eq!(manager.retries_used(), 3);
    }

    #[test]
    fn test_retry_budget_is_per_stage() {
        let manager = StageManager::with_retry_budget(2);
        manager.set_stage(ConversationStage::CollectMake);
        assert_eq!(manager.record_retry(), RetryOutcome::Reprompt);

        manager.set_stage(ConversationStage::CollectModel);
        // Fresh stage, fresh budget.
        assert_eq!(manager.record_retry(), RetryOutcome::Reprompt);
        assert_eq!(manager.record_retry(), RetryOutcome::Exhausted);
    }

    #[test]
    fn test_budget_of_one_fails_immediately() {
        let manager = StageManager::with_retry_budget(1);
        manager.set_stage(ConversationStage::CollectVariant);
        assert_eq!(manager.record_retry(), RetryOutcome::Exhausted);
    }

    #[test]
    fn test_slot_completion_gates_suggest_next() {
        let manager = StageManager::new();
        manager
            .transition(
                ConversationStage::CollectMake,
                TransitionReason::NaturalFlow,
            )
            .unwrap();

        // Slot not filled yet: stay put.
        assert!(!manager.stage_completed());
        assert_eq!(manager.suggest_next(), None);

        manager.record_slot("make", "Maruti Suzuki");
        assert!(manager.stage_completed());
        assert_eq!(manager.suggest_next(), Some(ConversationStage::CollectModel));
        assert_eq!(manager.slot("make").as_deref(), Some("Maruti Suzuki"));
    }

    #[test]
    fn test_stages_without_slots_complete_after_a_turn() {
        let manager = StageManager::new();
        assert!(!manager.stage_completed());
        manager.record_turn();
        assert!(manager.stage_completed());
        assert_eq!(manager.current_stage_turns(), 1);
        assert_eq!(manager.suggest_next(), Some(ConversationStage::CollectMake));
    }

    #[test]
    fn test_reset() {
        let manager = StageManager::new();
        manager
            .transition(
                ConversationStage::CollectMake,
                TransitionReason::NaturalFlow,
            )
            .unwrap();
        manager.record_slot("make", "Tata");
        manager.record_turn();
        manager.record_retry();

        manager.reset();
        assert_eq!(manager.current(), ConversationStage::Greeting);
        assert!(manager.history().is_empty());
        assert!(manager.slots().is_empty());
        assert_eq!(manager.retries_used(), 0);
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&ConversationStage::CollectMake).unwrap();
        assert_eq!(json, "\"collect_make\"");
        let back: ConversationStage = serde_json::from_str("\"collect_contact\"").unwrap();
        assert_eq!(back, ConversationStage::CollectContact);
    }
}
