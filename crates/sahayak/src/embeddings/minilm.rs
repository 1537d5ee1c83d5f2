//! Sentence embeddings via all-MiniLM-L6-v2 under ONNX Runtime.
//!
//! The policy corpus is embedded offline with the same model, so query
//! vectors live in the same space. MiniLM is symmetric (no query/passage
//! prefix, unlike E5-style models) and emits 384-dim vectors.

use anyhow::{anyhow, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::Tokenizer;

use super::EmbeddingModel;

#[derive(Clone)]
pub struct MiniLmConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub dimension: usize,
    pub max_length: usize,
    pub normalize: bool,
}

impl MiniLmConfig {
    /// Locate the model under `model_dir`, preferring a quantized export.
    pub fn auto_detect(model_dir: &Path) -> Option<Self> {
        let base_path = if model_dir.join("all-MiniLM-L6-v2").exists() {
            model_dir.join("all-MiniLM-L6-v2")
        } else if model_dir.join("model.onnx").exists() {
            model_dir.to_path_buf()
        } else {
            return None;
        };

        let quantized = base_path.join("model_quantized.onnx");
        let model_path = if quantized.exists() {
            quantized
        } else {
            base_path.join("model.onnx")
        };

        let tokenizer_path = base_path.join("tokenizer.json");
        if !model_path.exists() || !tokenizer_path.exists() {
            return None;
        }

        Some(Self {
            model_path,
            tokenizer_path,
            dimension: 384,
            max_length: 256,
            normalize: true,
        })
    }
}

pub struct MiniLmEmbeddings {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    config: MiniLmConfig,
    cache: Arc<RwLock<lru::LruCache<u64, Vec<f32>>>>,
}

impl MiniLmEmbeddings {
    pub fn new(config: MiniLmConfig) -> Result<Self> {
        ort::init().with_name("minilm_embeddings").commit();

        if !config.model_path.exists() {
            return Err(anyhow!(
                "Model file not found at: {}",
                config.model_path.display()
            ));
        }

        let model_bytes = std::fs::read(&config.model_path)
            .map_err(|e| anyhow!("Failed to read model: {:?}", e))?;

        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        let session = Session::builder()
            .map_err(|e| anyhow!("Session builder: {:?}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow!("Optimization level: {:?}", e))?
            .with_intra_threads(num_threads)
            .map_err(|e| anyhow!("Intra threads: {:?}", e))?
            .with_inter_threads(1)
            .map_err(|e| anyhow!("Inter threads: {:?}", e))?
            .with_memory_pattern(true)
            .map_err(|e| anyhow!("Memory pattern: {:?}", e))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| anyhow!("Failed to load model: {:?}", e))?;

        let tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            config,
            cache: Arc::new(RwLock::new(lru::LruCache::new(
                std::num::NonZeroUsize::new(1000).expect("cache size is non-zero"),
            ))),
        })
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let cache_key = hasher.finish();
        if let Some(cached) = self.cache.write().get(&cache_key) {
            return Ok(cached.clone());
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        ids.truncate(self.config.max_length);
        let seq_len = ids.len();

        let mask: Vec<i64> = vec![1; seq_len];
        let type_ids: Vec<i64> = vec![0; seq_len];

        let shape = vec![1, seq_len];
        let input_ids = Value::from_array((shape.clone(), ids))
            .map_err(|e| anyhow!("input_ids tensor: {:?}", e))?;
        let attention_mask = Value::from_array((shape.clone(), mask.clone()))
            .map_err(|e| anyhow!("attention_mask tensor: {:?}", e))?;
        let token_type_ids = Value::from_array((shape, type_ids))
            .map_err(|e| anyhow!("token_type_ids tensor: {:?}", e))?;

        let inputs = ort::inputs![
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        ];

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| anyhow!("Inference failed: {:?}", e))?;

        let embedding = Self::mean_pool(&outputs, &mask, self.config.normalize)?;

        self.cache.write().put(cache_key, embedding.clone());
        Ok(embedding)
    }

    /// Mean pooling over the attention mask on `last_hidden_state`,
    /// optionally L2-normalized so cosine distance is well-behaved.
    fn mean_pool(
        outputs: &ort::session::SessionOutputs,
        attention_mask: &[i64],
        normalize: bool,
    ) -> Result<Vec<f32>> {
        let output_name = outputs
            .iter()
            .find(|(name, _)| *name == "last_hidden_state" || *name == "token_embeddings")
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| {
                outputs
                    .iter()
                    .next()
                    .map(|(name, _)| name.to_string())
                    .unwrap_or_else(|| "last_hidden_state".to_string())
            });

        let (shape, data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("Failed to extract output '{}': {:?}", output_name, e))?;

        let seq_len = shape[1] as usize;
        let hidden_dim = shape[2] as usize;

        let mut pooled = vec![0.0f32; hidden_dim];
        let mut mask_sum = 0.0f32;

        for pos in 0..seq_len {
            let mask_val = if pos < attention_mask.len() {
                attention_mask[pos] as f32
            } else {
                0.0
            };
            if mask_val > 0.0 {
                mask_sum += mask_val;
                let offset = pos * hidden_dim;
                for dim in 0..hidden_dim {
                    pooled[dim] += data[offset + dim] * mask_val;
                }
            }
        }

        if mask_sum > 0.0 {
            for dim in 0..hidden_dim {
                pooled[dim] /= mask_sum;
            }
        }

        if normalize {
            let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 1e-12 {
                for v in &mut pooled {
                    *v /= norm;
                }
            }
        }

        Ok(pooled)
    }
}

impl EmbeddingModel for MiniLmEmbeddings {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text)
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
