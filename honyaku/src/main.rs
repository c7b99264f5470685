use honyaku::commands::command_argument_builder;
use honyaku::handlers::handle_translate;
use honyaku::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("translate", primary_command)) => handle_translate(primary_command, quiet).await,
        _ => {
            // No subcommand provided, just show the banner
        }
    }
}
