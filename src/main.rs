use clap::Parser;
use noxide::app::{handle_fatal_error, init_logging, AppConfig};
use noxide::cli::{execute_command, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let config = match AppConfig::new(verbose) {
        Ok(config) => config.with_quiet(cli.quiet),
        Err(e) => handle_fatal_error(e, verbose),
    };
    init_logging(&config);

    match execute_command(cli, &config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => handle_fatal_error(e, verbose),
    }
}
