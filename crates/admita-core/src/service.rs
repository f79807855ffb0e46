//! Advisor service
//!
//! The two entry points the chat transport calls: `handle_question` for
//! free-form grounded Q&A and `handle_intake_message` for the structured
//! intake dialogue. Per-conversation locks serialize state transitions;
//! the question path never holds a lock across a backend call.

use crate::config::Config;
use crate::db::{SharedDatabase, Track};
use crate::dialogue::{ConversationStore, IntakeMachine, IntakeStep};
use crate::error::{AdmitaError, Result};
use crate::llm::{ChatMessage, ChatModel, Embedder};
use crate::rag::AnswerComposer;
use crate::recommend::{ApplicantProfile, Recommender};
use crate::search::Retriever;
use std::sync::Arc;

/// Single-process advisor core wiring retrieval, composition, intake, and
/// recommendation together
pub struct AdvisorService {
    config: Config,
    retriever: Arc<Retriever>,
    composer: AnswerComposer,
    intake: IntakeMachine,
    recommender: Recommender,
    conversations: ConversationStore,
}

impl AdvisorService {
    pub fn new(
        db: SharedDatabase,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;

        let retriever = Arc::new(
            Retriever::new(db, embedder).with_min_score(config.retrieval.min_score),
        );
        let composer = AnswerComposer::new(chat, &config);
        let intake = IntakeMachine::new(&config.intake)?;
        let recommender = Recommender::new(retriever.clone(), &config);
        let conversations = ConversationStore::new(config.intake.history_limit);

        Ok(Self {
            config,
            retriever,
            composer,
            intake,
            recommender,
            conversations,
        })
    }

    /// Answer a free-form question grounded in the indexed corpus.
    ///
    /// Retrieval failures propagate to the caller; generation failures come
    /// back as the configured "temporarily unavailable" reply so the user
    /// can tell them apart from "no information".
    pub async fn handle_question(&self, conversation_id: &str, text: &str) -> Result<String> {
        let state = self.conversations.get_or_create(conversation_id).await;

        // Snapshot before recording the turn: the composer appends the
        // question itself, so the history window must not repeat it.
        let history = {
            let mut state = state.lock().await;
            let history = state.history();
            state.push_turn(ChatMessage::user(text));
            history
        };

        let retrieval = self
            .retriever
            .retrieve(text, self.config.retrieval.k, None)
            .await?;

        let reply = match self.composer.answer(text, &retrieval, &history).await {
            Ok(answer) => answer,
            Err(AdmitaError::Generation(e)) => {
                tracing::error!(error = %e, "generation failed after retry");
                self.config.replies.unavailable.clone()
            }
            Err(e) => return Err(e),
        };

        state.lock().await.push_turn(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    /// Drive the intake dialogue one message forward
    pub async fn handle_intake_message(&self, conversation_id: &str, text: &str) -> Result<String> {
        let state = self.conversations.get_or_create(conversation_id).await;
        let mut state = state.lock().await;
        state.push_turn(ChatMessage::user(text));

        let reply = match self.intake.handle(&mut state, text) {
            IntakeStep::Prompt(prompt) => prompt,
            IntakeStep::Abandoned(reply) => reply,
            IntakeStep::Completed(profile) => {
                // The lock stays held here: completion must trigger the
                // recommender exactly once per conversation.
                let recommendation = self.recommender.recommend(&profile).await?;
                let reply = recommendation.render();
                state.recommendation = Some(recommendation);
                reply
            }
            IntakeStep::AlreadyComplete => match state.recommendation.clone() {
                Some(recommendation) => recommendation.render(),
                None => {
                    // A previous completion failed before the result was
                    // stored; recompute from the collected attributes.
                    let profile = ApplicantProfile {
                        attributes: state.attributes.clone(),
                    };
                    let recommendation = self.recommender.recommend(&profile).await?;
                    let reply = recommendation.render();
                    state.recommendation = Some(recommendation);
                    reply
                }
            },
        };

        state.push_turn(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    /// Whether the conversation is in the middle of the intake dialogue.
    /// Transports use this to route messages between the intake machine and
    /// the Q&A path.
    pub async fn intake_active(&self, conversation_id: &str) -> bool {
        let state = self.conversations.get_or_create(conversation_id).await;
        let state = state.lock().await;
        matches!(state.stage, crate::dialogue::Stage::Collecting(_))
    }

    /// Restart a conversation, discarding collected state and any
    /// in-progress recommendation
    pub async fn reset(&self, conversation_id: &str) {
        let state = self.conversations.get_or_create(conversation_id).await;
        state.lock().await.reset();
    }

    /// Forget a conversation entirely (session ended)
    pub async fn end(&self, conversation_id: &str) {
        self.conversations.remove(conversation_id).await;
    }

    /// Grounded summary of one track
    pub async fn track_summary(&self, track: Track) -> Result<String> {
        let query = format!(
            "{} track overview curriculum duration cost career prospects",
            track.display_name()
        );
        let retrieval = self
            .retriever
            .retrieve(&query, self.config.retrieval.k, Some(track))
            .await?;

        let question = format!(
            "Summarize the {} master's track: what it covers, how long it takes, \
             and where it leads.",
            track.display_name()
        );
        self.composer.answer(&question, &retrieval, &[]).await
    }

    /// Grounded comparison of the two tracks
    pub async fn compare_tracks(&self) -> Result<String> {
        let per_track = self.config.retrieval.k.div_ceil(2).max(1);
        let mut retrieval = self
            .retriever
            .retrieve("program overview curriculum career", per_track, Some(Track::Ai))
            .await?;
        let product = self
            .retriever
            .retrieve(
                "program overview curriculum career",
                per_track,
                Some(Track::AiProduct),
            )
            .await?;
        retrieval.passages.extend(product.passages);

        self.composer
            .answer(
                "Compare the AI and AI Product tracks and explain who each one suits.",
                &retrieval,
                &[],
            )
            .await
    }
}
