use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub depth: usize,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub links_found: Vec<String>,
    pub nodes_translated: usize,
    pub nodes_failed: usize,
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl PageResult {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            depth,
            status_code: 0,
            content_type: None,
            response_time: Duration::from_secs(0),
            links_found: Vec::new(),
            nodes_translated: 0,
            nodes_failed: 0,
            output_path: None,
            error: None,
        }
    }

    pub fn with_error(url: String, depth: usize, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url, depth)
        }
    }

    /// A page counts as scraped once its rewritten body reached the output directory.
    pub fn is_scraped(&self) -> bool {
        self.output_path.is_some()
    }
}
