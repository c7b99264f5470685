use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("honyaku")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("honyaku")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("translate")
                .about(
                    "Crawl a website within its own domain, translate every visible text \
                node, and save the rewritten pages locally.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The base URL of the website to translate")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("The output directory for translated pages")
                        .default_value("./output"),
                )
                .arg(
                    arg!(-d --"depth" <LEVELS>)
                        .required(false)
                        .help("The number of levels to follow links from the base URL")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(-l --"lang" <LANG>)
                        .required(false)
                        .help("Target language code for the translation backend")
                        .default_value("ja"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("8"),
                )
                .arg(
                    arg!(--"api-url" <URL>)
                        .required(false)
                        .help("Endpoint of the translation backend")
                        .default_value("http://127.0.0.1:1188/translate"),
                )
                .arg(
                    arg!(--"api-key" <KEY>)
                        .required(false)
                        .help("Bearer token for the translation backend, if it needs one"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Page fetch timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
