use honyaku_engine::PageResult;
use std::collections::HashMap;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Generate an end-of-run report from crawl results
pub fn generate_report(results: &[PageResult], output_dir: &Path) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!(
        "  Finished: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("  Pages processed: {}\n", results.len()));

    let saved = results.iter().filter(|r| r.is_scraped()).count();
    report.push_str(&format!(
        "  Pages saved: {} (under {})\n",
        saved,
        output_dir.display()
    ));

    let translated: usize = results.iter().map(|r| r.nodes_translated).sum();
    report.push_str(&format!("  Text nodes translated: {}\n", translated));

    let failed_nodes: usize = results.iter().map(|r| r.nodes_failed).sum();
    if failed_nodes > 0 {
        report.push_str(&format!(
            "  Text nodes kept untranslated: {}\n",
            failed_nodes
        ));
    }

    let failed_pages = results.iter().filter(|r| r.error.is_some()).count();
    if failed_pages > 0 {
        report.push_str(&format!("  Pages with errors: {}\n", failed_pages));
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group results by host
    let mut by_host: HashMap<String, Vec<&PageResult>> = HashMap::new();
    for result in results {
        if let Ok(url) = Url::parse(&result.url)
            && let Some(host) = url.host_str()
        {
            by_host.entry(host.to_string()).or_default().push(result);
        }
    }

    for (host, host_results) in by_host.iter() {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages\n\n", host_results.len()));

        for result in host_results {
            let path = extract_url_path(&result.url);

            // Color code based on status
            let status_str = match result.status_code {
                100..=199 => format!("\x1b[37m{}\x1b[0m", result.status_code), // White
                200..=299 => format!("\x1b[32m{}\x1b[0m", result.status_code), // Green
                300..=399 => format!("\x1b[36m{}\x1b[0m", result.status_code), // Cyan
                400..=499 => format!("\x1b[33m{}\x1b[0m", result.status_code), // Orange/Yellow
                500..=599 => format!("\x1b[31m{}\x1b[0m", result.status_code), // Red
                _ => format!("{}", result.status_code),
            };

            let mut line = format!("  {} {}", status_str, path);

            if let Some(ref output_path) = result.output_path {
                line.push_str(&format!(
                    " \x1b[90m→ {}\x1b[0m",
                    output_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                ));
            } else if let Some(ref error) = result.error {
                line.push_str(&format!(" \x1b[31m{}\x1b[0m", error));
            }

            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}

/// Generate a machine-readable report
pub fn generate_json_report(results: &[PageResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}
