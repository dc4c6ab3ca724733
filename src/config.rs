use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Canonical list of file extensions the pipeline will ingest.
/// The watcher filter, the upload boundary, and the reconciler scan all use
/// this single list so they never diverge.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Check whether a file extension (without leading dot, lowercase) is supported.
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext)
}

/// Cluster color palette, indexed by `cluster_id % len`.
pub const PALETTE: &[&str] = &[
    "#FFB3BA", // pastel pink
    "#FFDFBA", // pastel peach
    "#FFFFBA", // pastel yellow
    "#BAFFC9", // pastel green
    "#BAE1FF", // pastel blue
    "#D4BAFF", // pastel purple
    "#FFBAF3", // pastel magenta
    "#FFCCCB", // light coral
    "#B5EAD7", // mint
    "#C7CEEA", // periwinkle
    "#FFDAC1", // apricot
    "#E2F0CB", // tea green
    "#F4ACB7", // pink
    "#9DD9D2", // turquoise
    "#FFF8DC", // cornsilk
];

pub fn cluster_color(cluster_id: usize) -> &'static str {
    PALETTE[cluster_id % PALETTE.len()]
}

/// Name of the staging directory under the managed root, used for uploads
/// in flight. Always hidden from the watcher.
pub const STAGING_DIR: &str = ".staging";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub listen_addr: String,
    /// Managed root directory. Everything the organiser owns lives under it.
    pub root_dir: PathBuf,
    /// Managed-folder prefix; direct children of the root starting with this
    /// are wholly owned by the organiser.
    pub folder_prefix: String,
    /// Per-path debounce window for watcher events.
    pub debounce: Duration,
    /// Quiet period after the last ingest before a global reclustering fires.
    pub recluster_delay: Duration,
    /// Interval between disk↔index reconciliation sweeps.
    pub reconcile_interval: Duration,
    /// Lifetime of an ignore-registry entry.
    pub ignore_ttl: Duration,
    /// LLM back-off period after a rate-limit signal.
    pub rate_limit_backoff: Duration,
    /// Cluster-name cache capacity (FIFO, trimmed by a quarter when full).
    pub name_cache_max: usize,
    /// Upper bound of the silhouette search for k.
    pub max_k: usize,
    /// Minimum keyword score for the per-file category pass.
    pub file_score_min: u32,
    /// Minimum keyword score for the post-hoc cluster-naming pass.
    pub cluster_score_min: u32,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("SEFS_PORT").unwrap_or_else(|_| "8000".to_string());

        let root_dir = std::env::var("SEFS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("root"));

        Self {
            listen_addr: format!("127.0.0.1:{}", port),
            root_dir,
            folder_prefix: std::env::var("SEFS_FOLDER_PREFIX")
                .unwrap_or_else(|_| "SEFS_".to_string()),
            debounce: env_duration_ms("SEFS_DEBOUNCE_MS", 3_000),
            recluster_delay: env_duration_ms("SEFS_RECLUSTER_DELAY_MS", 5_000),
            reconcile_interval: env_duration_ms("SEFS_RECONCILE_INTERVAL_MS", 8_000),
            ignore_ttl: env_duration_ms("SEFS_IGNORE_TTL_MS", 15_000),
            rate_limit_backoff: env_duration_ms("SEFS_RATE_LIMIT_BACKOFF_MS", 300_000),
            name_cache_max: env_parse("SEFS_NAME_CACHE_MAX", 200),
            max_k: env_parse("SEFS_MAX_K", 8),
            file_score_min: env_parse("SEFS_FILE_SCORE_MIN", 2),
            cluster_score_min: env_parse("SEFS_CLUSTER_SCORE_MIN", 5),
            llm: LlmConfig {
                api_key: std::env::var("SEFS_LLM_API_KEY").ok().filter(|k| !k.is_empty()),
                api_url: std::env::var("SEFS_LLM_API_URL").unwrap_or_else(|_| {
                    "https://api.groq.com/openai/v1/chat/completions".to_string()
                }),
                model: std::env::var("SEFS_LLM_MODEL")
                    .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
                timeout: env_duration_ms("SEFS_LLM_TIMEOUT_MS", 5_000),
            },
        }
    }

    /// Staging directory for uploads in flight.
    pub fn staging_dir(&self) -> PathBuf {
        self.root_dir.join(STAGING_DIR)
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_duration_ms(var: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_parse(var, default_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_are_lowercase() {
        assert!(is_supported_extension("pdf"));
        assert!(is_supported_extension("txt"));
        assert!(!is_supported_extension("md"));
        assert!(!is_supported_extension("PDF"));
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(cluster_color(0), PALETTE[0]);
        assert_eq!(cluster_color(PALETTE.len()), PALETTE[0]);
        assert_eq!(cluster_color(PALETTE.len() + 3), PALETTE[3]);
    }
}
