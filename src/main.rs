mod aggregate;
mod cache;
mod cli;
mod dashboard;
mod error;
mod filters;
mod fmt;
mod loader;
mod models;
mod normalizer;
mod settings;

use clap::Parser;

use cli::{Cli, Commands, FilterArgs};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = settings::load_settings();
    let sources = cli.source.resolve(&settings);

    let result = match &cli.command {
        Some(Commands::Init { payment_mode }) => cli::init::run(&cli.source, *payment_mode, settings),
        Some(Commands::Options { json }) => cli::options::run(&sources, *json),
        Some(Commands::Dashboard { filters, json }) => {
            cli::dashboard::run(&sources, &settings, filters, *json)
        }
        Some(Commands::Report { command }) => cli::report::dispatch(command, &sources, &settings),
        None => cli::dashboard::run(&sources, &settings, &FilterArgs::default(), false),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
