pub mod config;
pub mod data;
pub mod embeddings;
pub mod engine;
pub mod index;
pub mod llm;
pub mod router;
pub mod session;
pub mod tax;
pub mod types;

// Re-export primary types for convenience
pub use config::EngineConfig;
pub use data::{Employee, EmployeeDirectory, Holiday, HolidayCalendar};
pub use engine::HrEngine;
pub use router::{PolicySearch, RouteOutcome, Router, Rule, RULE_ORDER};
pub use session::{ConversationState, SessionStore};
pub use types::{Answer, PolicyHit, RoutedReply, NO_ANSWER_TEXT, SEMANTIC_SENTINEL};

// Re-export LLM types
pub use llm::{ApiProvider, GenerationConfig, LlmClient, TextGenerator};

// Re-export common types
pub use anyhow::{Error, Result};
