//! Conversation state and the intake dialogue

mod intake;
mod state;

pub use intake::{IntakeMachine, IntakeStep};
pub use state::{ConversationState, ConversationStore, Stage};
