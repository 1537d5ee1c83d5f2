//! Conversational wrapper around the tax engine.
//!
//! Holds per-session chat history in memory, builds the CA-style prompt
//! with the knowledge base and the last turns, and stages the interview:
//! profile → income → deductions → calculation. LLM failures degrade to an
//! apology reply, never an error.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::knowledge::TAX_KNOWLEDGE_BASE;
use crate::llm::{GenerationConfig, TextGenerator};

/// Turns of conversation included in each prompt.
const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorReply {
    pub response: String,
    pub suggestions: Vec<String>,
    pub data_collected: serde_json::Value,
    pub next_step: String,
}

pub struct TaxAdvisor {
    llm: Arc<dyn TextGenerator>,
    generation: GenerationConfig,
    history: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl TaxAdvisor {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self {
            llm,
            generation: GenerationConfig {
                max_tokens: 512,
                temperature: 0.2,
            },
            history: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    fn system_prompt() -> String {
        format!(
            "You are an expert Indian Chartered Accountant (CA) specializing in Income Tax Returns (ITR).\n\n\
             Your role:\n\
             - Guide users through ITR filing step-by-step\n\
             - Answer tax-related queries accurately\n\
             - Suggest deductions and tax-saving options\n\
             - Recommend appropriate tax regime\n\
             - Explain full forms and abbreviations\n\
             - Maintain professional, polite tone\n\n\
             Knowledge Base:\n{}\n\n\
             Always ask clarifying questions before giving advice, collect\n\
             information systematically, and include a disclaimer that this is\n\
             guidance and users should verify with a professional CA for\n\
             complex cases.",
            TAX_KNOWLEDGE_BASE
        )
    }

    fn build_prompt(turns: &[ChatTurn], context: Option<&serde_json::Value>) -> String {
        let mut parts = vec![Self::system_prompt()];

        if let Some(context) = context {
            parts.push(format!(
                "Current user context:\n{}",
                serde_json::to_string_pretty(context).unwrap_or_default()
            ));
        }

        let window_start = turns.len().saturating_sub(HISTORY_WINDOW);
        let history: String = turns[window_start..]
            .iter()
            .map(|t| {
                let speaker = if t.role == "user" { "User" } else { "Assistant" };
                format!("{}: {}", speaker, t.content)
            })
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(format!("Conversation so far:\n{}", history));

        parts.push(
            "Provide a helpful, accurate response. If you're collecting information, suggest the next logical question.".to_string(),
        );
        parts.join("\n\n")
    }

    /// Process one chat message within a session.
    pub async fn chat(
        &self,
        session_id: &str,
        message: &str,
        context: Option<&serde_json::Value>,
    ) -> AdvisorReply {
        {
            let mut history = self.history.write();
            history
                .entry(session_id.to_string())
                .or_default()
                .push(ChatTurn {
                    role: "user".to_string(),
                    content: message.to_string(),
                });
        }

        let turns = self.history(session_id);
        let prompt = Self::build_prompt(&turns, context);

        match self.llm.generate(&prompt, &self.generation).await {
            Ok(response) => {
                let response = response.trim().to_string();
                self.history
                    .write()
                    .entry(session_id.to_string())
                    .or_default()
                    .push(ChatTurn {
                        role: "assistant".to_string(),
                        content: response.clone(),
                    });

                AdvisorReply {
                    response,
                    suggestions: Self::suggestions(context),
                    data_collected: context.cloned().unwrap_or_else(|| serde_json::json!({})),
                    next_step: Self::next_step(context).to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(session = session_id, error = %e, "Tax advisor LLM call failed");
                AdvisorReply {
                    response: format!(
                        "I apologize, but I encountered an error: {}. Please try again.",
                        e
                    ),
                    suggestions: vec!["Start over".to_string(), "Contact support".to_string()],
                    data_collected: context.cloned().unwrap_or_else(|| serde_json::json!({})),
                    next_step: Self::next_step(context).to_string(),
                }
            }
        }
    }

    /// Contextual quick-reply suggestions by interview stage.
    fn suggestions(context: Option<&serde_json::Value>) -> Vec<String> {
        let has = |key: &str| {
            context
                .and_then(|c| c.get(key))
                .map(|v| !v.is_null())
                .unwrap_or(false)
        };

        let stage: &[&str] = if !has("taxpayer_profile") {
            &[
                "I'm a salaried employee",
                "I have business income",
                "I have capital gains",
                "Tell me about deductions",
            ]
        } else if !has("income_details") {
            &[
                "Enter my salary details",
                "I have multiple income sources",
                "Calculate my tax",
                "Which ITR form should I use?",
            ]
        } else {
            &[
                "Compare old vs new regime",
                "Show me deduction options",
                "Calculate final tax",
                "How to file ITR online?",
            ]
        };
        stage.iter().map(|s| s.to_string()).collect()
    }

    /// Next interview stage given what has been collected so far.
    fn next_step(context: Option<&serde_json::Value>) -> &'static str {
        let has = |key: &str| {
            context
                .and_then(|c| c.get(key))
                .map(|v| !v.is_null())
                .unwrap_or(false)
        };

        if !has("taxpayer_profile") {
            "profile_collection"
        } else if !has("income_details") {
            "income_collection"
        } else if !has("deduction_details") {
            "deduction_collection"
        } else {
            "tax_calculation"
        }
    }

    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.history
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear_session(&self, session_id: &str) {
        self.history.write().remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct CannedGenerator(Result<String, String>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow!(e.clone())),
            }
        }
    }

    fn advisor(result: Result<String, String>) -> TaxAdvisor {
        TaxAdvisor::new(Arc::new(CannedGenerator(result)))
    }

    #[test]
    fn interview_stages_advance_with_collected_context() {
        assert_eq!(TaxAdvisor::next_step(None), "profile_collection");

        let ctx = serde_json::json!({"taxpayer_profile": {"age": 30}});
        assert_eq!(TaxAdvisor::next_step(Some(&ctx)), "income_collection");

        let ctx = serde_json::json!({
            "taxpayer_profile": {}, "income_details": {}
        });
        assert_eq!(TaxAdvisor::next_step(Some(&ctx)), "deduction_collection");

        let ctx = serde_json::json!({
            "taxpayer_profile": {}, "income_details": {}, "deduction_details": {}
        });
        assert_eq!(TaxAdvisor::next_step(Some(&ctx)), "tax_calculation");
    }

    #[test]
    fn suggestions_track_the_interview_stage() {
        let fresh = TaxAdvisor::suggestions(None);
        assert!(fresh.contains(&"I'm a salaried employee".to_string()));

        let ctx = serde_json::json!({"taxpayer_profile": {}, "income_details": {}});
        let late = TaxAdvisor::suggestions(Some(&ctx));
        assert!(late.contains(&"Compare old vs new regime".to_string()));
    }

    #[test]
    fn prompt_embeds_knowledge_base_context_and_history() {
        let turns = vec![
            ChatTurn {
                role: "user".into(),
                content: "I earn 12 lakhs".into(),
            },
            ChatTurn {
                role: "assistant".into(),
                content: "Any deductions?".into(),
            },
        ];
        let ctx = serde_json::json!({"taxpayer_profile": {"age": 31}});
        let prompt = TaxAdvisor::build_prompt(&turns, Some(&ctx));

        assert!(prompt.contains("Indian Chartered Accountant"));
        assert!(prompt.contains("Indian Income Tax Knowledge Base"));
        assert!(prompt.contains("User: I earn 12 lakhs"));
        assert!(prompt.contains("Assistant: Any deductions?"));
        assert!(prompt.contains("\"age\": 31"));
    }

    #[test]
    fn prompt_keeps_only_the_last_ten_turns() {
        let turns: Vec<ChatTurn> = (0..14)
            .map(|i| ChatTurn {
                role: "user".into(),
                content: format!("turn-{}", i),
            })
            .collect();
        let prompt = TaxAdvisor::build_prompt(&turns, None);
        assert!(!prompt.contains("turn-3"));
        assert!(prompt.contains("turn-4"));
        assert!(prompt.contains("turn-13"));
    }

    #[tokio::test]
    async fn successful_chat_records_both_turns() {
        let advisor = advisor(Ok("Let's start with your income sources.".into()));
        let reply = advisor.chat("s1", "help me file my ITR", None).await;

        assert_eq!(reply.response, "Let's start with your income sources.");
        assert_eq!(reply.next_step, "profile_collection");

        let history = advisor.history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");
    }

    #[tokio::test]
    async fn llm_failure_degrades_to_apology_reply() {
        let advisor = advisor(Err("quota exhausted".into()));
        let reply = advisor.chat("s1", "help", None).await;

        assert!(reply.response.starts_with("I apologize, but I encountered an error:"));
        assert_eq!(
            reply.suggestions,
            vec!["Start over".to_string(), "Contact support".to_string()]
        );
        // The failed assistant turn is not recorded.
        assert_eq!(advisor.history("s1").len(), 1);
    }

    #[tokio::test]
    async fn clear_session_drops_history() {
        let advisor = advisor(Ok("ok".into()));
        let _ = advisor.chat("s1", "hi", None).await;
        advisor.clear_session("s1");
        assert!(advisor.history("s1").is_empty());
    }
}
