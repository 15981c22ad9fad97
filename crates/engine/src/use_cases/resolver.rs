//! Player input resolution against the current action list.
//!
//! Two stages. First a case-insensitive substring scan in list order, which
//! is cheap and covers players who type the action verbatim. When that finds
//! nothing, each candidate is embedded and compared against the input by
//! cosine similarity, so "give them a hand" still resolves to "help".
//! Embedding failures leave the input unresolved; they never fail the turn.

use std::sync::Arc;

use crate::infrastructure::cache::LruCache;
use crate::infrastructure::ports::EmbeddingPort;

/// Minimum cosine similarity for an embedding match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Bound on the number of cached embedding vectors.
pub const DEFAULT_EMBED_CACHE_CAPACITY: usize = 512;

/// Outcome of resolving player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Input resolved to this action label, verbatim from the action list.
    Matched(String),
    /// Input matched nothing.
    Unresolved,
}

pub struct ActionResolver {
    embedder: Arc<dyn EmbeddingPort>,
    cache: LruCache<String, Vec<f32>>,
    threshold: f32,
}

impl ActionResolver {
    pub fn new(embedder: Arc<dyn EmbeddingPort>) -> Self {
        Self::with_threshold(embedder, DEFAULT_SIMILARITY_THRESHOLD)
    }

    pub fn with_threshold(embedder: Arc<dyn EmbeddingPort>, threshold: f32) -> Self {
        Self {
            embedder,
            cache: LruCache::new(DEFAULT_EMBED_CACHE_CAPACITY),
            threshold,
        }
    }

    /// Resolve `input` against `actions`, returning the matched label.
    ///
    /// Ties on similarity keep the earlier action in the list.
    pub async fn resolve(&self, input: &str, actions: &[String]) -> Resolution {
        let input = input.trim();
        if input.is_empty() || actions.is_empty() {
            return Resolution::Unresolved;
        }

        let input_lower = input.to_lowercase();
        for action in actions {
            if !action.is_empty() && input_lower.contains(&action.to_lowercase()) {
                return Resolution::Matched(action.clone());
            }
        }

        let input_vec = match self.embedding_of(input).await {
            Some(vec) => vec,
            None => return Resolution::Unresolved,
        };

        let mut best: Option<(&String, f32)> = None;
        for action in actions {
            let Some(action_vec) = self.embedding_of(action).await else {
                continue;
            };
            let score = cosine_similarity(&input_vec, &action_vec);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((action, score));
            }
        }

        match best {
            Some((action, score)) if score >= self.threshold => {
                tracing::debug!(action = %action, score, "input resolved by embedding similarity");
                Resolution::Matched(action.clone())
            }
            _ => Resolution::Unresolved,
        }
    }

    /// Embed `text`, cached by the exact string so case-sensitive embedders
    /// are never served another casing's vector.
    async fn embedding_of(&self, text: &str) -> Option<Vec<f32>> {
        let key = text.to_string();
        if let Some(cached) = self.cache.get(&key).await {
            return Some(cached);
        }
        match self.embedder.embed(text).await {
            Ok(vec) => {
                self.cache.insert(key, vec.clone()).await;
                Some(vec)
            }
            Err(e) => {
                tracing::warn!(error = %e, "embedding failed, leaving input unresolved");
                None
            }
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}
