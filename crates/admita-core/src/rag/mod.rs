//! Grounded answer composition

mod composer;

pub use composer::AnswerComposer;
