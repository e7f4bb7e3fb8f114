//! Text embedding models for semantic duplicate detection.
//!
//! The model is an owned, injectable resource. [`SharedEmbedder`] loads it
//! lazily on the first semantic call and reuses it afterwards; a failed load
//! is remembered so later calls degrade immediately instead of retrying.

use std::fmt;
use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{DatanexError, Result};

/// Turns texts into fixed-length vectors.
pub trait EmbeddingModel: Send + Sync {
    /// Model name for logs and notes.
    fn name(&self) -> &str;

    /// Encode each text into one vector; output order matches input order.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Which embedding model to build.
///
/// Defaults to the offline [`HashingEmbedder`]. `Ollama` gives real sentence
/// embeddings but needs a running server with the model pulled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbedderConfig {
    /// Local character n-gram feature hashing.
    Hashing { dimensions: usize, ngram: usize },
    /// Embeddings endpoint of a local Ollama server.
    Ollama { model: String },
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        EmbedderConfig::Hashing {
            dimensions: 512,
            ngram: 3,
        }
    }
}

impl EmbedderConfig {
    /// Construct the configured model.
    pub fn build(&self) -> Result<Box<dyn EmbeddingModel>> {
        match self {
            EmbedderConfig::Hashing { dimensions, ngram } => {
                Ok(Box::new(HashingEmbedder::new(*dimensions, *ngram)?))
            }
            EmbedderConfig::Ollama { model } => Ok(Box::new(OllamaEmbedder::with_model(model)?)),
        }
    }
}

// =============================================================================
// HASHING EMBEDDER
// =============================================================================

/// Deterministic embedding from hashed character n-grams.
///
/// Case and surrounding whitespace are ignored. Texts sharing most of their
/// n-grams end up with high cosine similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    ngram: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing `dimensions`-long vectors from `ngram`-character shingles.
    pub fn new(dimensions: usize, ngram: usize) -> Result<Self> {
        if dimensions == 0 || ngram == 0 {
            return Err(DatanexError::Config(
                "hashing embedder needs non-zero dimensions and ngram".to_string(),
            ));
        }
        Ok(Self { dimensions, ngram })
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return vector;
        }

        let padded: Vec<char> = format!(" {} ", normalized.to_lowercase()).chars().collect();
        let n = self.ngram.min(padded.len());
        for window in padded.windows(n) {
            let hash = fnv1a(window);
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimensions: 512,
            ngram: 3,
        }
    }
}

impl EmbeddingModel for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = OFFSET;
    let mut buf = [0u8; 4];
    for c in chars {
        for byte in c.encode_utf8(&mut buf).bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}

// =============================================================================
// OLLAMA EMBEDDER
// =============================================================================

/// Default Ollama embeddings endpoint.
const DEFAULT_EMBED_URL: &str = "http://localhost:11434/api/embed";

/// Embedding model served by a local Ollama instance.
pub struct OllamaEmbedder {
    client: Client,
    api_url: String,
    model: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create with the `nomic-embed-text` model. Pull it first with
    /// `ollama pull nomic-embed-text`.
    pub fn new() -> Result<Self> {
        Self::with_model("nomic-embed-text")
    }

    /// Create with a specific embedding model; `OLLAMA_HOST` overrides the server.
    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| DatanexError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_url = std::env::var("OLLAMA_HOST")
            .map(|host| format!("{}/api/embed", host.trim_end_matches('/')))
            .unwrap_or_else(|_| DEFAULT_EMBED_URL.to_string());

        Ok(Self {
            client,
            api_url,
            model: model.into(),
        })
    }
}

impl EmbeddingModel for OllamaEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    DatanexError::Embedding(
                        "Failed to connect to Ollama. Is it running? Start with: ollama serve"
                            .to_string(),
                    )
                } else {
                    DatanexError::Embedding(format!("Ollama request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            if error_text.contains("not found") {
                return Err(DatanexError::Embedding(format!(
                    "Model '{}' not found. Pull it with: ollama pull {}",
                    self.model, self.model
                )));
            }
            return Err(DatanexError::Embedding(format!(
                "Ollama error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbedResponse = response.json().map_err(|e| {
            DatanexError::Embedding(format!("Failed to parse Ollama response: {}", e))
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(DatanexError::Embedding(format!(
                "Ollama returned {} embeddings for {} texts",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        debug!(model = %self.model, count = texts.len(), "Encoded texts with Ollama");
        Ok(parsed.embeddings)
    }
}

// =============================================================================
// SHARED, LAZILY LOADED MODEL
// =============================================================================

type Loader = Box<dyn Fn() -> Result<Box<dyn EmbeddingModel>> + Send + Sync>;

/// A model loaded once on first use and shared read-only afterwards.
pub struct SharedEmbedder {
    loader: Loader,
    model: OnceCell<std::result::Result<Box<dyn EmbeddingModel>, String>>,
}

impl SharedEmbedder {
    /// Wrap a loader that runs on the first semantic call.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn EmbeddingModel>> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    /// Wrap an already constructed model.
    pub fn from_model(model: impl EmbeddingModel + 'static) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(Ok(Box::new(model) as Box<dyn EmbeddingModel>));
        Self {
            loader: Box::new(|| {
                Err(DatanexError::Embedding("model already provided".to_string()))
            }),
            model: cell,
        }
    }

    /// Lazily build the model described by `config`.
    pub fn from_config(config: EmbedderConfig) -> Self {
        Self::new(move || config.build())
    }

    /// The loaded model, loading it on first call.
    pub fn get(&self) -> Result<&dyn EmbeddingModel> {
        let loaded = self.model.get_or_init(|| {
            (self.loader)().map_err(|e| {
                warn!(error = %e, "Embedding model failed to load");
                e.to_string()
            })
        });
        match loaded {
            Ok(model) => Ok(&**model),
            Err(msg) => Err(DatanexError::Embedding(msg.clone())),
        }
    }

    /// Whether a load has been attempted.
    pub fn is_initialized(&self) -> bool {
        self.model.get().is_some()
    }
}

impl Default for SharedEmbedder {
    fn default() -> Self {
        Self::from_config(EmbedderConfig::default())
    }
}

impl fmt::Debug for SharedEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.model.get() {
            None => "unloaded".to_string(),
            Some(Ok(model)) => format!("loaded({})", model.name()),
            Some(Err(_)) => "failed".to_string(),
        };
        f.debug_struct("SharedEmbedder").field("model", &state).finish()
    }
}

/// Cosine similarity; zero when either vector is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
