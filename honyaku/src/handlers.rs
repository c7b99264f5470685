use clap::ArgMatches;
use colored::Colorize;
use honyaku_engine::{Crawler, HttpTranslator, SharedTranslator};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

use crate::report::{ReportFormat, extract_url_path, generate_json_report, generate_report};

pub fn print_banner() {
    println!(
        "{}",
        r#"
  honyaku ── crawl a site, translate its text, keep its markup
"#
        .bright_cyan()
    );
}

/// Tilde-expands the raw flag value and creates the directory.
///
/// Failure here is a configuration error; nothing has been fetched yet.
pub fn prepare_output_dir(raw: &str) -> Result<PathBuf, String> {
    let expanded = shellexpand::tilde(raw);
    let path = PathBuf::from(expanded.as_ref());
    fs::create_dir_all(&path)
        .map_err(|e| format!("Failed to create output directory {}: {}", path.display(), e))?;
    Ok(path)
}

/// The base URL must be fetchable: http(s) scheme and a host to scope the
/// crawl to.
pub fn validate_base_url(url: &Url) -> Result<(), String> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("Unsupported URL scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err(format!("URL '{}' has no host to scope the crawl to", url));
    }
    Ok(())
}

pub async fn handle_translate(sub_matches: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url = sub_matches.get_one::<Url>("url").unwrap();
    let output_dir = sub_matches.get_one::<String>("output-dir").unwrap();
    let depth = sub_matches.get_one::<usize>("depth").unwrap();
    let lang = sub_matches.get_one::<String>("lang").unwrap();
    let threads = sub_matches.get_one::<usize>("threads").unwrap();
    let api_url = sub_matches.get_one::<String>("api-url").unwrap();
    let api_key = sub_matches.get_one::<String>("api-key").cloned();
    let timeout = sub_matches.get_one::<u64>("timeout").unwrap();
    let format = sub_matches.get_one::<String>("format").unwrap();

    if let Err(e) = validate_base_url(url) {
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    let output_dir = match prepare_output_dir(output_dir) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let translator: SharedTranslator =
        match HttpTranslator::new(api_url.clone(), api_key) {
            Ok(translator) => Arc::new(translator),
            Err(e) => {
                eprintln!("{} Failed to set up translator: {}", "✗".red().bold(), e);
                std::process::exit(1);
            }
        };

    // Ctrl-C stops scheduling new pages; in-flight ones finish cleanly.
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, shutdown.clone()) {
            eprintln!("⚠️  Could not register signal handler: {}", e);
        }
    }

    if !quiet {
        println!("\n🌐 Translating {} into '{}'", url.host_str().unwrap(), lang);
        println!("Workers: {}", threads);
        println!("Max depth: {}", depth);
        println!("Output: {}\n", output_dir.display());
    }

    // Set up multi-progress
    let m = Arc::new(MultiProgress::new());
    let worker_bars: Arc<Mutex<HashMap<usize, ProgressBar>>> = Arc::new(Mutex::new(HashMap::new()));

    if !quiet {
        for i in 0..*threads {
            let pb = m.add(ProgressBar::new_spinner());
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} Worker {msg}")
                    .unwrap(),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message(format!("{}: idle", i));
            worker_bars.lock().await.insert(i, pb);
        }
    }

    let worker_bars_clone = worker_bars.clone();
    let progress_callback = Arc::new(move |worker_id: usize, url: String| {
        let path = extract_url_path(&url);
        // Use try_lock to avoid blocking in async context
        if let Ok(bars) = worker_bars_clone.try_lock() {
            if let Some(pb) = bars.get(&worker_id) {
                pb.set_message(format!("{}: {}", worker_id, path));
            }
        }
    });

    let crawler = match Crawler::with_timeout(translator, output_dir.clone(), *timeout) {
        Ok(crawler) => crawler
            .with_max_depth(*depth)
            .with_target_lang(lang.clone())
            .with_progress_callback(progress_callback)
            .with_shutdown_flag(shutdown),
        Err(e) => {
            eprintln!("{} Failed to set up crawler: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    match crawler.crawl(url.as_str(), *threads).await {
        Ok(results) => {
            for (_, pb) in worker_bars.lock().await.iter() {
                pb.finish_and_clear();
            }
            let _ = m.clear();

            let report = match ReportFormat::from_str(format) {
                Some(ReportFormat::Json) => generate_json_report(&results)
                    .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
                _ => generate_report(&results, &output_dir),
            };
            println!("{}", report);
        }
        Err(e) => {
            for (_, pb) in worker_bars.lock().await.iter() {
                pb.finish_and_clear();
            }
            let _ = m.clear();
            eprintln!("{} Crawl failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
