use crate::dom::charset_from_content_type;
use crate::error::{EngineError, Result};
use crate::frontier::Frontier;
use crate::result::PageResult;
use crate::rewrite::rewrite_page;
use crate::translator::SharedTranslator;
use crate::writer::OutputWriter;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(PageResult) + Send + Sync>;

/// Drives the crawl: fetches pages, routes links through the frontier,
/// rewrites visible text through the shared Translator, and hands finished
/// pages to the output writer.
pub struct Crawler {
    client: Client,
    translator: SharedTranslator,
    target_lang: String,
    output_dir: PathBuf,
    max_depth: usize,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    shutdown: Arc<AtomicBool>,
}

impl Crawler {
    pub fn new(translator: SharedTranslator, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_timeout(translator, output_dir, 10)
    }

    pub fn with_timeout(
        translator: SharedTranslator,
        output_dir: impl Into<PathBuf>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "Honyaku/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/trapdoorsec/honyaku)"
            ))
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            translator,
            target_lang: "ja".to_string(),
            output_dir: output_dir.into(),
            max_depth: 1,
            progress_callback: None,
            result_callback: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_target_lang(mut self, lang: impl Into<String>) -> Self {
        self.target_lang = lang.into();
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    /// Installs an external stop flag. Once raised, workers stop picking up
    /// new pages; in-flight pages finish and persist normally.
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    pub async fn crawl(&self, base_url: &str, workers: usize) -> Result<Vec<PageResult>> {
        let parsed_base = Url::parse(base_url)
            .map_err(|e| EngineError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let base_host = parsed_base
            .host_str()
            .ok_or_else(|| EngineError::InvalidUrl(format!("{} has no host", base_url)))?
            .to_string();
        // Canonical form so discovered links compare equal to the seed.
        let base_url = parsed_base.to_string();

        let workers = workers.max(1);
        info!(
            "Starting crawl of {} with {} workers, depth {}",
            base_url, workers, self.max_depth
        );

        let frontier = Arc::new(Frontier::new(base_host, self.max_depth));
        frontier.seed(&base_url).await;

        let writer = Arc::new(OutputWriter::new(self.output_dir.clone()));
        let results: Arc<Mutex<Vec<PageResult>>> = Arc::new(Mutex::new(Vec::new()));

        // Each worker owns a queue; discovered links are dealt round-robin.
        let worker_queues: Arc<Vec<Mutex<VecDeque<(String, usize)>>>> =
            Arc::new((0..workers).map(|_| Mutex::new(VecDeque::new())).collect());
        {
            let mut queue = worker_queues[0].lock().await;
            queue.push_back((base_url.clone(), 0));
        }

        // Pages popped but not yet fully processed. Queues draining empty is
        // not enough to stop: a page still in flight may discover more links.
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut worker_handles = Vec::new();

        for worker_id in 0..workers {
            let client = self.client.clone();
            let translator = self.translator.clone();
            let target_lang = self.target_lang.clone();
            let frontier = frontier.clone();
            let writer = writer.clone();
            let results = results.clone();
            let worker_queues = worker_queues.clone();
            let in_flight = in_flight.clone();
            let shutdown = self.shutdown.clone();
            let progress_cb = self.progress_callback.clone();
            let result_cb = self.result_callback.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                let mut empty_iterations = 0;
                const MAX_EMPTY_ITERATIONS: usize = 10;

                loop {
                    if shutdown.load(Ordering::Acquire) {
                        debug!("Worker {} stopping on shutdown signal", worker_id);
                        break;
                    }

                    let work_item = {
                        let mut queue = worker_queues[worker_id].lock().await;
                        queue.pop_front()
                    };

                    let (url, depth) = if let Some(item) = work_item {
                        empty_iterations = 0;
                        item
                    } else {
                        let queues_empty = Self::all_queues_empty(&worker_queues).await;
                        if queues_empty && in_flight.load(Ordering::Acquire) == 0 {
                            empty_iterations += 1;
                            if empty_iterations >= MAX_EMPTY_ITERATIONS {
                                debug!("Worker {} exiting", worker_id);
                                break;
                            }
                        } else {
                            empty_iterations = 0;
                        }
                        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
                        continue;
                    };

                    in_flight.fetch_add(1, Ordering::AcqRel);

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.clone());
                    }

                    let (page_result, discovered) = Self::process_page_static(
                        &client,
                        &translator,
                        &writer,
                        &url,
                        depth,
                        &target_lang,
                    )
                    .await;

                    // Distribute accepted links round-robin across all queues.
                    if !shutdown.load(Ordering::Acquire) {
                        let mut target_worker = 0;
                        for link in discovered {
                            if frontier.should_visit(&link, depth).await {
                                let mut queue = worker_queues[target_worker].lock().await;
                                queue.push_back((link, depth + 1));
                                drop(queue);
                                target_worker = (target_worker + 1) % worker_queues.len();
                            }
                        }
                    }

                    if let Some(ref callback) = result_cb {
                        callback(page_result.clone());
                    }
                    {
                        let mut results_lock = results.lock().await;
                        results_lock.push(page_result);
                    }

                    in_flight.fetch_sub(1, Ordering::AcqRel);
                }

                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        for handle in worker_handles {
            handle.await?;
        }

        let results = results.lock().await;
        info!(
            "Crawl complete. {} pages processed, {} URLs scheduled",
            results.len(),
            frontier.visited_count().await
        );
        Ok(results.clone())
    }

    async fn all_queues_empty(worker_queues: &Arc<Vec<Mutex<VecDeque<(String, usize)>>>>) -> bool {
        for queue in worker_queues.iter() {
            if !queue.lock().await.is_empty() {
                return false;
            }
        }
        true
    }

    /// Fetches one page, rewrites it, and persists it. Every failure past
    /// this point is per-page: it lands in the returned record and the log,
    /// never in the run's Result.
    async fn process_page_static(
        client: &Client,
        translator: &SharedTranslator,
        writer: &OutputWriter,
        url: &str,
        depth: usize,
        target_lang: &str,
    ) -> (PageResult, Vec<String>) {
        debug!("Fetching {}", url);
        let start = Instant::now();

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Fetch failed for {}: {}", url, e);
                return (
                    PageResult::with_error(url.to_string(), depth, format!("fetch: {}", e)),
                    Vec::new(),
                );
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut result = PageResult::new(url.to_string(), depth);
        result.status_code = status.as_u16();
        result.content_type = content_type.clone();

        if !status.is_success() {
            warn!("Request URL {} failed with response: {}", url, status.as_u16());
            result.error = Some(format!("fetch: status {}", status.as_u16()));
            result.response_time = start.elapsed();
            return (result, Vec::new());
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read body of {}: {}", url, e);
                result.error = Some(format!("fetch: {}", e));
                result.response_time = start.elapsed();
                return (result, Vec::new());
            }
        };
        result.response_time = start.elapsed();

        let is_html = content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);
        if !is_html {
            debug!("Skipping non-HTML page {}", url);
            return (result, Vec::new());
        }

        let links = Self::extract_links_static(&String::from_utf8_lossy(&body), url);
        result.links_found = links.clone();

        let charset = content_type.as_deref().and_then(charset_from_content_type);
        let rewritten = match rewrite_page(
            url,
            &body,
            charset,
            translator,
            target_lang,
        )
        .await
        {
            Ok((rewritten, summary)) => {
                result.nodes_translated = summary.nodes_translated;
                result.nodes_failed = summary.nodes_failed;
                rewritten
            }
            Err(e) => {
                warn!("Rewrite failed for {}: {}", url, e);
                result.error = Some(format!("translation: {}", e));
                return (result, links);
            }
        };

        match writer.persist(url, &rewritten).await {
            Ok(path) => {
                info!("Translated page saved to {}", path.display());
                result.output_path = Some(path);
            }
            Err(e) => {
                warn!("Failed to write output for {}: {}", url, e);
                result.error = Some(format!("persist: {}", e));
            }
        }

        (result, links)
    }

    /// Pulls anchor hrefs out of the page, resolved to absolute URLs.
    ///
    /// Cross-domain links are returned too; the frontier discards them when
    /// scheduling. The `scraper` document never crosses an await.
    fn extract_links_static(html: &str, current_url: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let link_selector =
            Selector::parse("a[href]").expect("static selector is valid");

        let mut links = Vec::new();
        for element in document.select(&link_selector) {
            if let Some(href) = element.value().attr("href")
                && let Some(absolute_url) = Self::resolve_url_static(current_url, href)
            {
                debug!("Found link: {}", absolute_url);
                links.push(absolute_url);
            }
        }
        links
    }

    fn resolve_url_static(base: &str, href: &str) -> Option<String> {
        // Skip empty, javascript:, mailto:, tel:, and same-page fragments.
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with('#')
        {
            return None;
        }

        let base_url = Url::parse(base).ok()?;
        let mut resolved = base_url.join(href).ok()?;
        resolved.set_fragment(None);

        Some(resolved.to_string())
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }
}
