use crate::config::AppConfig;
use crate::engine::Engine;
use crate::engine::index::{ActivityEntry, Cluster};
use serde::Serialize;
use std::sync::Arc;

/// One file entry in a graph snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct FileNode {
    /// The file's absolute path doubles as its identity.
    pub id: String,
    pub path: String,
    pub name: String,
    pub snippet: String,
    pub word_count: usize,
    pub cluster_id: Option<usize>,
    pub cluster_name: String,
    pub color: String,
    pub keywords: Vec<String>,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub files: Vec<FileNode>,
    pub clusters: Vec<Cluster>,
    pub total_files: usize,
}

/// Messages pushed to all connected WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "graph_update")]
    GraphUpdate(GraphSnapshot),
    #[serde(rename = "activity_log_entry")]
    ActivityLogEntry { entry: ActivityEntry },
    #[serde(rename = "activity_log")]
    ActivityLog { logs: Vec<ActivityEntry> },
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(config: AppConfig, engine: Arc<Engine>) -> Self {
        Self { config, engine }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_events_serialize_with_type_tags() {
        let snapshot = GraphSnapshot {
            files: vec![],
            clusters: vec![],
            total_files: 0,
        };
        let json = serde_json::to_value(ServerEvent::GraphUpdate(snapshot)).unwrap();
        assert_eq!(json["type"], "graph_update");
        assert_eq!(json["total_files"], 0);
        assert!(json["files"].as_array().unwrap().is_empty());
    }
}
