//! Intake state machine
//!
//! Drives the configured attribute sequence: validate, store, advance.
//! A rejected answer re-prompts with the attribute's clarification up to the
//! configured bound, then the raw text is accepted so the dialogue can never
//! get permanently stuck.

use super::{ConversationState, Stage};
use crate::config::{AttributeSpec, IntakeConfig};
use crate::error::Result;
use crate::recommend::ApplicantProfile;
use regex::Regex;

/// Result of feeding one user message to the machine
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeStep {
    /// Next question or a clarification re-prompt
    Prompt(String),
    /// The last attribute was just collected; intake reached COMPLETE
    Completed(ApplicantProfile),
    /// Intake already completed earlier; the caller should reuse the stored
    /// recommendation
    AlreadyComplete,
    /// The user cancelled the intake
    Abandoned(String),
}

const CANCEL_COMMANDS: &[&str] = &["/cancel", "cancel", "stop", "/stop"];

const ABANDON_REPLY: &str =
    "Intake cancelled. Send /reset if you want to start over, or just ask a question.";

/// Fixed-sequence attribute collection
pub struct IntakeMachine {
    attributes: Vec<AttributeSpec>,
    patterns: Vec<Option<Regex>>,
    max_rejections: usize,
}

impl IntakeMachine {
    /// Compile the configured attribute patterns up front
    pub fn new(config: &IntakeConfig) -> Result<Self> {
        let mut patterns = Vec::with_capacity(config.attributes.len());
        for attr in &config.attributes {
            patterns.push(match &attr.pattern {
                Some(p) => Some(Regex::new(p)?),
                None => None,
            });
        }
        Ok(Self {
            attributes: config.attributes.clone(),
            patterns,
            max_rejections: config.max_validation_retries,
        })
    }

    /// Feed one user message, mutating the conversation state
    pub fn handle(&self, state: &mut ConversationState, text: &str) -> IntakeStep {
        let text = text.trim();

        if CANCEL_COMMANDS.contains(&text.to_lowercase().as_str()) {
            state.stage = Stage::Abandoned;
            return IntakeStep::Abandoned(ABANDON_REPLY.to_string());
        }

        match state.stage {
            Stage::Start => {
                state.stage = Stage::Collecting(0);
                state.rejected_answers = 0;
                IntakeStep::Prompt(self.attributes[0].prompt.clone())
            }
            Stage::Collecting(index) => self.collect(state, index, text),
            Stage::Complete => IntakeStep::AlreadyComplete,
            Stage::Abandoned => IntakeStep::Abandoned(ABANDON_REPLY.to_string()),
        }
    }

    fn collect(&self, state: &mut ConversationState, index: usize, text: &str) -> IntakeStep {
        let attr = &self.attributes[index];

        let accepted = self.validates(index, text);
        let fallback = !accepted && state.rejected_answers >= self.max_rejections;

        if !accepted && !fallback {
            state.rejected_answers += 1;
            tracing::debug!(
                attribute = %attr.name,
                rejections = state.rejected_answers,
                "answer rejected, re-prompting"
            );
            return IntakeStep::Prompt(attr.clarification.clone());
        }

        if fallback {
            tracing::debug!(attribute = %attr.name, "retry bound reached, accepting free text");
        }

        state
            .attributes
            .insert(attr.name.clone(), text.to_string());
        state.rejected_answers = 0;

        let next = index + 1;
        if next < self.attributes.len() {
            state.stage = Stage::Collecting(next);
            IntakeStep::Prompt(self.attributes[next].prompt.clone())
        } else {
            state.stage = Stage::Complete;
            IntakeStep::Completed(ApplicantProfile {
                attributes: state.attributes.clone(),
            })
        }
    }

    fn validates(&self, index: usize, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let attr = &self.attributes[index];
        let lower = text.to_lowercase();

        if attr.accepted.iter().any(|kw| lower.contains(kw.as_str())) {
            return true;
        }
        if let Some(ref regex) = self.patterns[index] {
            return regex.is_match(text);
        }
        attr.accepted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntakeConfig;

    fn machine() -> IntakeMachine {
        IntakeMachine::new(&IntakeConfig::default()).unwrap()
    }

    fn fresh_state() -> ConversationState {
        ConversationState::new(12)
    }

    #[test]
    fn test_start_prompts_first_attribute() {
        let machine = machine();
        let mut state = fresh_state();
        let step = machine.handle(&mut state, "/intake");
        assert_eq!(state.stage, Stage::Collecting(0));
        assert!(matches!(step, IntakeStep::Prompt(p) if p.contains("educational background")));
    }

    #[test]
    fn test_valid_answer_advances_one_attribute() {
        let machine = machine();
        let mut state = fresh_state();
        machine.handle(&mut state, "/intake");

        let step = machine.handle(&mut state, "computer science");
        assert_eq!(state.stage, Stage::Collecting(1));
        assert_eq!(
            state.attributes.get("education").map(|s| s.as_str()),
            Some("computer science")
        );
        assert!(matches!(step, IntakeStep::Prompt(_)));
    }

    #[test]
    fn test_invalid_answer_does_not_advance() {
        let machine = machine();
        let mut state = fresh_state();
        machine.handle(&mut state, "/intake");
        machine.handle(&mut state, "computer science");

        // "experience" expects none/beginner/intermediate/advanced
        let step = machine.handle(&mut state, "???");
        assert_eq!(state.stage, Stage::Collecting(1));
        assert_eq!(state.rejected_answers, 1);
        assert!(matches!(step, IntakeStep::Prompt(p) if p.contains("one of")));
    }

    #[test]
    fn test_retry_bound_accepts_free_text() {
        let machine = machine();
        let mut state = fresh_state();
        machine.handle(&mut state, "/intake");
        machine.handle(&mut state, "computer science");

        machine.handle(&mut state, "???");
        machine.handle(&mut state, "???");
        // Third rejection-worthy answer is accepted as free text
        let step = machine.handle(&mut state, "???");
        assert_eq!(state.stage, Stage::Collecting(2));
        assert_eq!(state.attributes.get("experience").map(|s| s.as_str()), Some("???"));
        assert!(matches!(step, IntakeStep::Prompt(_)));
    }

    #[test]
    fn test_last_attribute_reaches_complete_exactly_once() {
        let machine = machine();
        let mut state = fresh_state();
        machine.handle(&mut state, "/intake");
        machine.handle(&mut state, "computer science");
        machine.handle(&mut state, "beginner");
        machine.handle(&mut state, "product management");

        let step = machine.handle(&mut state, "product manager");
        assert_eq!(state.stage, Stage::Complete);
        let IntakeStep::Completed(profile) = step else {
            panic!("expected completion");
        };
        assert_eq!(profile.attributes.len(), 4);

        // Re-entering COMPLETE is idempotent
        let again = machine.handle(&mut state, "hello again");
        assert_eq!(again, IntakeStep::AlreadyComplete);
    }

    #[test]
    fn test_cancel_reaches_abandoned_from_any_stage() {
        let machine = machine();
        let mut state = fresh_state();
        machine.handle(&mut state, "/intake");
        machine.handle(&mut state, "computer science");

        let step = machine.handle(&mut state, "/cancel");
        assert_eq!(state.stage, Stage::Abandoned);
        assert!(matches!(step, IntakeStep::Abandoned(_)));
    }
}
