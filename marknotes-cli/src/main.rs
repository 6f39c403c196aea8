mod app;
mod cli;
mod settings;
mod shell;

use std::process::ExitCode;

use clap::Parser;
use marknotes_core::MarknotesError;

use crate::app::App;
use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Config edits the settings file itself and needs no store.
    if let Commands::Config { action } = cli.command {
        return match app::handle_config(action) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MarknotesError> {
    let mut app = App::open(settings::load_settings(), cli.data_dir, cli.ephemeral)?;

    match cli.command {
        Commands::List { json } => app::handle_list(&app, json),
        Commands::Show { id } => app::handle_show(&app, &id),
        Commands::New { title, content, json } => app::handle_new(&app, title, content, json),
        Commands::Edit { id, title, content, stdin } => {
            app::handle_edit(&app, &id, title, content, stdin)
        }
        Commands::Delete { id } => app::handle_delete(&app, &id),
        Commands::Preview { id } => app::handle_preview(&app, &id),
        Commands::Export { id, format, out } => app::handle_export(&app, &id, format.into(), out),
        Commands::Theme { action } => app::handle_theme(&mut app, action),
        Commands::Shell => shell::run(&mut app),
        Commands::Config { .. } => unreachable!("handled before the store is opened"),
    }
}
