use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub employees_file: PathBuf,
    pub holidays_file: PathBuf,
    pub index: IndexConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding the pre-built LanceDB policy dataset.
    pub index_dir: PathBuf,
    /// Directory containing the sentence-embedding model files.
    pub model_dir: PathBuf,
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Passages requested from the policy index per fallback query.
    pub fallback_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "openai", "google", "ollama", or a custom endpoint URL.
    pub provider: String,
    pub model: String,
    /// Environment variable holding the API key (never the key itself).
    pub api_key_env: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl EngineConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.index.dimension == 0 {
            return Err("index.dimension must be > 0".into());
        }
        if self.search.fallback_k == 0 {
            return Err("search.fallback_k must be > 0".into());
        }
        if self.llm.max_tokens == 0 {
            return Err("llm.max_tokens must be > 0".into());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err("llm.temperature must be in [0.0, 2.0]".into());
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sahayak");

        let model_dir = if Path::new("models").exists() {
            PathBuf::from("models")
        } else if let Ok(env_path) = std::env::var("MODEL_PATH") {
            PathBuf::from(env_path)
        } else {
            data_dir.join("models")
        };

        Self {
            employees_file: data_dir.join("employees.csv"),
            holidays_file: data_dir.join("holidays.json"),
            index: IndexConfig {
                index_dir: data_dir.join("policy_index"),
                model_dir,
                dimension: 384,
            },
            search: SearchConfig { fallback_k: 2 },
            llm: LlmConfig {
                provider: "google".to_string(),
                model: "gemini-2.5-flash".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
                max_tokens: 80,
                temperature: 0.0,
            },
            data_dir,
        }
    }
}
