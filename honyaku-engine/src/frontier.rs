use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

/// Decides which discovered links get scheduled.
///
/// Owns the visited set for the lifetime of one run. The check-and-insert in
/// [`Frontier::should_visit`] happens under a single lock, so two workers
/// discovering the same link concurrently can never both schedule it.
pub struct Frontier {
    visited: Mutex<HashSet<String>>,
    base_host: String,
    max_depth: usize,
}

impl Frontier {
    pub fn new(base_host: String, max_depth: usize) -> Self {
        Self {
            visited: Mutex::new(HashSet::new()),
            base_host,
            max_depth,
        }
    }

    /// Marks a URL as scheduled without domain or depth checks.
    ///
    /// Used for the base URL, which is in scope by definition.
    pub async fn seed(&self, url: &str) {
        let mut visited = self.visited.lock().await;
        visited.insert(url.to_string());
    }

    /// Returns true exactly once per schedulable link.
    ///
    /// A link is schedulable when it parses, its host matches the base host,
    /// following it stays within the depth limit, and it has not been
    /// scheduled before. Malformed URLs are not visitable, never an error.
    pub async fn should_visit(&self, link: &str, current_depth: usize) -> bool {
        let parsed = match Url::parse(link) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Skipping malformed URL {}: {}", link, e);
                return false;
            }
        };

        match parsed.host_str() {
            Some(host) if host == self.base_host => {}
            _ => {
                debug!("Skipping cross-domain link {}", link);
                return false;
            }
        }

        if current_depth + 1 > self.max_depth {
            debug!("Skipping {} beyond depth limit {}", link, self.max_depth);
            return false;
        }

        // Single lock around check-and-insert: at-most-once scheduling.
        let mut visited = self.visited.lock().await;
        if visited.contains(link) {
            return false;
        }
        visited.insert(link.to_string());
        true
    }

    pub async fn visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_same_domain_once() {
        let frontier = Frontier::new("example.com".to_string(), 2);
        assert!(frontier.should_visit("http://example.com/about", 0).await);
        assert!(!frontier.should_visit("http://example.com/about", 0).await);
        assert_eq!(frontier.visited_count().await, 1);
    }

    #[tokio::test]
    async fn rejects_cross_domain() {
        let frontier = Frontier::new("example.com".to_string(), 2);
        assert!(!frontier.should_visit("http://other.com/x", 0).await);
        assert_eq!(frontier.visited_count().await, 0);
    }

    #[tokio::test]
    async fn rejects_beyond_depth_limit() {
        let frontier = Frontier::new("example.com".to_string(), 1);
        assert!(frontier.should_visit("http://example.com/a", 0).await);
        assert!(!frontier.should_visit("http://example.com/b", 1).await);
    }

    #[tokio::test]
    async fn rejects_malformed_urls() {
        let frontier = Frontier::new("example.com".to_string(), 2);
        assert!(!frontier.should_visit("not a url", 0).await);
        assert!(!frontier.should_visit("", 0).await);
    }

    #[tokio::test]
    async fn seed_blocks_rediscovery_of_base() {
        let frontier = Frontier::new("example.com".to_string(), 2);
        frontier.seed("http://example.com/").await;
        assert!(!frontier.should_visit("http://example.com/", 0).await);
    }

    #[tokio::test]
    async fn concurrent_discovery_schedules_once() {
        use std::sync::Arc;

        let frontier = Arc::new(Frontier::new("example.com".to_string(), 2));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let frontier = frontier.clone();
            handles.push(tokio::spawn(async move {
                frontier.should_visit("http://example.com/dup", 0).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
    }
}
