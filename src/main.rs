use clap::Parser;

use git_release::cli::Cli;
use git_release::ui;

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = cli.execute() {
        ui::display_error_chain(&e);
        std::process::exit(1);
    }
}
