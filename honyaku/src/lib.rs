pub mod commands;
pub mod handlers;
pub mod report;

// Re-export commonly used handler functions for convenience
pub use handlers::{prepare_output_dir, print_banner, validate_base_url};
pub use report::{ReportFormat, extract_url_path, generate_json_report, generate_report};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
