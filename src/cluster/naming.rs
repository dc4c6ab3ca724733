//! Cluster naming.
//!
//! Cascade per group: name cache → LLM (when configured and not latched) →
//! category keywords → TF-IDF terms → filename tokens → `"Mixed Documents"`.
//! Every successful stage feeds the cache. A rate-limit signal from the LLM
//! latches a back-off during which the LLM stage is skipped entirely.

use super::categories::KeywordMatcher;
use super::terms;
use crate::config::{AppConfig, LlmConfig};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Hard cap on generated cluster names.
const MAX_NAME_LEN: usize = 50;

struct NameCache {
    map: HashMap<String, String>,
    order: VecDeque<String>,
    max: usize,
}

impl NameCache {
    fn new(max: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max,
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    /// Insert with FIFO eviction: when full, the oldest quarter is dropped.
    fn insert(&mut self, key: String, name: String) {
        if self.map.contains_key(&key) {
            self.map.insert(key, name);
            return;
        }
        if self.map.len() >= self.max {
            let drop_count = (self.max / 4).max(1);
            for _ in 0..drop_count {
                if let Some(old) = self.order.pop_front() {
                    self.map.remove(&old);
                }
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, name);
    }
}

enum LlmFailure {
    RateLimited,
    Other(String),
}

pub struct ClusterNamer {
    cache: Mutex<NameCache>,
    rate_limited_until: Mutex<Option<Instant>>,
    backoff: Duration,
    cluster_score_min: u32,
    llm: LlmConfig,
    http: reqwest::Client,
}

impl ClusterNamer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            cache: Mutex::new(NameCache::new(config.name_cache_max)),
            rate_limited_until: Mutex::new(None),
            backoff: config.rate_limit_backoff,
            cluster_score_min: config.cluster_score_min,
            llm: config.llm.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Name one group of documents.
    pub async fn name_group(
        &self,
        matcher: &KeywordMatcher,
        texts: &[&str],
        file_names: &[&str],
    ) -> String {
        let key = cache_key(texts);
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached;
        }

        if self.llm.api_key.is_some() && !self.is_rate_limited() {
            match self.llm_name(texts, file_names).await {
                Ok(name) if !name.is_empty() => {
                    self.cache.lock().insert(key, name.clone());
                    return name;
                }
                Ok(_) => {}
                Err(LlmFailure::RateLimited) => self.mark_rate_limited(),
                Err(LlmFailure::Other(e)) => debug!("LLM naming failed: {}", e),
            }
        }

        if let Some(name) =
            matcher.best_cluster_category(texts, file_names, self.cluster_score_min)
        {
            let name = name.to_string();
            self.cache.lock().insert(key, name.clone());
            return name;
        }

        let tfidf_terms = terms::tfidf_top_terms(texts, 2);
        if !tfidf_terms.is_empty() {
            let name = truncate_name(
                &tfidf_terms
                    .iter()
                    .map(|t| terms::title_case(t))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            self.cache.lock().insert(key, name.clone());
            return name;
        }

        if let Some(name) = terms::name_from_filenames(file_names) {
            let name = truncate_name(&name);
            self.cache.lock().insert(key, name.clone());
            return name;
        }

        "Mixed Documents".to_string()
    }

    pub fn is_rate_limited(&self) -> bool {
        let mut until = self.rate_limited_until.lock();
        match *until {
            Some(deadline) if Instant::now() < deadline => true,
            Some(_) => {
                *until = None;
                false
            }
            None => false,
        }
    }

    pub fn mark_rate_limited(&self) {
        warn!(
            "LLM rate limited, skipping naming calls for {}s",
            self.backoff.as_secs()
        );
        *self.rate_limited_until.lock() = Some(Instant::now() + self.backoff);
    }

    async fn llm_name(&self, texts: &[&str], file_names: &[&str]) -> Result<String, LlmFailure> {
        let api_key = self
            .llm
            .api_key
            .as_deref()
            .ok_or_else(|| LlmFailure::Other("no API key".into()))?;

        let samples: Vec<String> = texts
            .iter()
            .take(3)
            .map(|t| format!("- {}", terms::smart_truncate(t, 150)))
            .collect();
        let files: Vec<&str> = file_names.iter().take(5).copied().collect();

        let prompt = format!(
            "Based on these file excerpts and names, suggest a brief category name (2-4 words):\n\n\
             Files: {}\n\n\
             Content samples:\n{}\n\n\
             Category name:",
            files.join(", "),
            samples.join("\n"),
        );

        let body = serde_json::json!({
            "model": self.llm.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": 30,
            "temperature": 0.3,
        });

        let response = self
            .http
            .post(&self.llm.api_url)
            .bearer_auth(api_key)
            .timeout(self.llm.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if response.status().as_u16() == 429 {
            return Err(LlmFailure::RateLimited);
        }
        if !response.status().is_success() {
            return Err(LlmFailure::Other(format!("status {}", response.status())));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmFailure::Other(e.to_string()))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();

        Ok(sanitize_name(content))
    }
}

fn classify_transport_error(e: &reqwest::Error) -> LlmFailure {
    let message = e.to_string().to_lowercase();
    if message.contains("rate") || message.contains("limit") {
        LlmFailure::RateLimited
    } else {
        LlmFailure::Other(message)
    }
}

/// Cache key: stable hash of the leading texts of the group.
fn cache_key(texts: &[&str]) -> String {
    let sample: String = texts
        .iter()
        .take(3)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(200)
        .collect();
    format!("{:x}", Sha256::digest(sample.as_bytes()))
}

fn sanitize_name(raw: &str) -> String {
    let first_line = raw.lines().next().unwrap_or_default();
    let trimmed = first_line.trim().trim_matches(['"', '\'', '`']).trim();
    truncate_name(trimmed)
}

fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}
