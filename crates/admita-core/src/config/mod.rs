//! Configuration management
//!
//! The core consumes configuration, it does not own it: chunk sizing,
//! retrieval depth, backend endpoints, intake attributes, and recommender
//! rules all arrive through [`Config`]. `validate()` fails fast on settings
//! that would corrupt the pipeline instead of clamping them silently.

use crate::db::Track;
use crate::error::{AdmitaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    #[serde(default)]
    pub intake: IntakeConfig,

    #[serde(default)]
    pub recommender: RecommenderConfig,

    #[serde(default)]
    pub replies: ReplyConfig,
}

/// Chunking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Look-back overlap between consecutive chunks, in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    std::env::var("ADMITA_CHUNK_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000)
}

fn default_chunk_overlap() -> usize {
    std::env::var("ADMITA_CHUNK_OVERLAP")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(200)
}

/// Retrieval parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of passages fetched per query
    #[serde(default = "default_k")]
    pub k: usize,

    /// Maximum elective disciplines cited in a recommendation
    #[serde(default = "default_max_electives")]
    pub max_electives: usize,

    /// Minimum similarity a chunk must exceed to count as evidence
    #[serde(default)]
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            max_electives: default_max_electives(),
            min_score: 0.0,
        }
    }
}

fn default_k() -> usize {
    5
}

fn default_max_electives() -> usize {
    3
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per backend call (first try plus retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("ADMITA_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("ADMITA_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("ADMITA_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("ADMITA_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("ADMITA_LLM_MODEL")
        .unwrap_or_else(|_| "meta-llama/Llama-3.1-8B-Instruct".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("ADMITA_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string())
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    2
}

/// One attribute collected during intake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Attribute name used as the profile key
    pub name: String,

    /// Question shown when this attribute is being collected
    pub prompt: String,

    /// Clarification shown after a rejected answer
    pub clarification: String,

    /// Accepted keywords; an answer containing any of them validates
    #[serde(default)]
    pub accepted: Vec<String>,

    /// Regex pattern alternative to the keyword set
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Intake dialogue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Ordered attribute sequence
    #[serde(default = "default_attributes")]
    pub attributes: Vec<AttributeSpec>,

    /// Rejected answers tolerated per attribute before free-text fallback
    #[serde(default = "default_max_validation_retries")]
    pub max_validation_retries: usize,

    /// Conversation turns kept for grounding context
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            attributes: default_attributes(),
            max_validation_retries: default_max_validation_retries(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_max_validation_retries() -> usize {
    2
}

fn default_history_limit() -> usize {
    12
}

fn default_attributes() -> Vec<AttributeSpec> {
    vec![
        AttributeSpec {
            name: "education".into(),
            prompt: "What is your educational background (e.g. computer science, \
                     engineering, economics, design)?"
                .into(),
            clarification: "Please name your field of study, for example \
                            \"computer science\" or \"economics\"."
                .into(),
            accepted: [
                "computer", "software", "engineering", "mathematics", "physics",
                "economics", "business", "design", "linguistics", "biology",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            pattern: None,
        },
        AttributeSpec {
            name: "experience".into(),
            prompt: "How would you rate your programming experience: none, beginner, \
                     intermediate, or advanced?"
                .into(),
            clarification: "Please answer with one of: none, beginner, intermediate, \
                            advanced."
                .into(),
            accepted: ["none", "beginner", "intermediate", "advanced", "expert"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pattern: None,
        },
        AttributeSpec {
            name: "interest".into(),
            prompt: "Which area interests you most (e.g. machine learning, NLP, \
                     product management, analytics)?"
                .into(),
            clarification: "A few words about the topics you want to study are enough."
                .into(),
            accepted: Vec::new(),
            pattern: Some(r"\S{3,}".into()),
        },
        AttributeSpec {
            name: "goal".into(),
            prompt: "What role are you aiming for after graduation (e.g. ML engineer, \
                     researcher, product manager)?"
                .into(),
            clarification: "Please name a target role, for example \"ML engineer\" or \
                            \"product manager\"."
                .into(),
            accepted: [
                "engineer", "developer", "scientist", "researcher", "manager",
                "product", "analyst", "entrepreneur", "architect",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            pattern: None,
        },
    ]
}

/// One weighted scoring rule for the recommender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRule {
    /// Profile attribute the rule inspects
    pub attribute: String,

    /// Keywords that fire the rule when found in the attribute value
    pub keywords: Vec<String>,

    /// Track credited when the rule fires
    pub track: Track,

    /// Score added to the track
    pub weight: f64,
}

/// Recommender configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Weighted rules over profile attributes
    #[serde(default = "default_rules")]
    pub rules: Vec<ScoringRule>,

    /// Track descriptions used for the keyword-overlap tie-break
    #[serde(default = "default_track_descriptions")]
    pub track_descriptions: HashMap<Track, String>,

    /// Track chosen when the profile carries no usable attributes
    #[serde(default = "default_track")]
    pub default_track: Track,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            track_descriptions: default_track_descriptions(),
            default_track: default_track(),
        }
    }
}

fn default_track() -> Track {
    Track::Ai
}

fn rule(attribute: &str, keywords: &[&str], track: Track, weight: f64) -> ScoringRule {
    ScoringRule {
        attribute: attribute.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        track,
        weight,
    }
}

fn default_rules() -> Vec<ScoringRule> {
    vec![
        rule(
            "experience",
            &["intermediate", "advanced", "expert"],
            Track::Ai,
            2.0,
        ),
        rule("experience", &["none", "beginner"], Track::AiProduct, 1.5),
        rule(
            "goal",
            &["engineer", "developer", "scientist", "researcher", "architect"],
            Track::Ai,
            2.0,
        ),
        rule(
            "goal",
            &["manager", "product", "entrepreneur", "analyst"],
            Track::AiProduct,
            2.0,
        ),
        rule(
            "interest",
            &["machine", "learning", "deep", "vision", "nlp", "model", "research"],
            Track::Ai,
            1.5,
        ),
        rule(
            "interest",
            &["product", "management", "business", "startup", "market", "analytics"],
            Track::AiProduct,
            1.5,
        ),
        rule(
            "education",
            &["computer", "software", "mathematics", "physics", "engineering"],
            Track::Ai,
            1.0,
        ),
        rule(
            "education",
            &["economics", "business", "design", "management"],
            Track::AiProduct,
            1.0,
        ),
    ]
}

fn default_track_descriptions() -> HashMap<Track, String> {
    let mut map = HashMap::new();
    map.insert(
        Track::Ai,
        "Artificial Intelligence: machine learning, deep learning, computer vision, \
         NLP, ML engineering, research and model development"
            .to_string(),
    );
    map.insert(
        Track::AiProduct,
        "AI Product: product management, analytics, business strategy, go-to-market, \
         managing AI products and teams"
            .to_string(),
    );
    map
}

/// User-visible reply templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Reply when retrieval finds nothing to ground an answer on
    #[serde(default = "default_no_answer_reply")]
    pub no_answer: String,

    /// Reply when the generation backend fails after retry
    #[serde(default = "default_unavailable_reply")]
    pub unavailable: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            no_answer: default_no_answer_reply(),
            unavailable: default_unavailable_reply(),
        }
    }
}

fn default_no_answer_reply() -> String {
    "I don't have enough information about that in the program materials. \
     Try rephrasing the question or asking about the curriculum, admission, \
     or career prospects."
        .to_string()
}

fn default_unavailable_reply() -> String {
    "The answering service is temporarily unavailable. Please try again in a \
     few minutes."
        .to_string()
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from an explicit path, falling back to defaults when absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Fail fast on settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(AdmitaError::Config("chunk_size must be positive".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AdmitaError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.k == 0 {
            return Err(AdmitaError::Config("retrieval k must be positive".into()));
        }
        if self.intake.attributes.is_empty() {
            return Err(AdmitaError::Config(
                "intake requires at least one attribute".into(),
            ));
        }
        for attr in &self.intake.attributes {
            if let Some(ref pattern) = attr.pattern {
                regex::Regex::new(pattern).map_err(|e| {
                    AdmitaError::Config(format!(
                        "invalid pattern for attribute '{}': {}",
                        attr.name, e
                    ))
                })?;
            }
        }
        Ok(())
    }
}
