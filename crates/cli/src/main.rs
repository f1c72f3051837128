// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use voxlibre_config::{Config, ConfigManager};

mod commands;
mod player;

use commands::Shell;

fn build_cli() -> Command {
    Command::new("voxlibre")
        .version(env!("CARGO_PKG_VERSION"))
        .author("VoxLibre Contributors")
        .about("Audiobook player with AI story and narration generation")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (platform default when omitted)")
                .global(true),
        )
        .arg(
            Arg::new("headless")
                .long("headless")
                .help("Play without an audio device")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("list")
                .about("List books in the library")
                .arg(Arg::new("query").short('q').long("query").value_name("TEXT").help("Match title or author"))
                .arg(
                    Arg::new("category")
                        .short('g')
                        .long("category")
                        .value_name("CATEGORY")
                        .help("Only books in this category")
                        .default_value(voxlibre_core::category::ALL),
                ),
        )
        .subcommand(Command::new("stats").about("Show library statistics"))
        .subcommand(Command::new("categories").about("List the category selector"))
        .subcommand(
            Command::new("play")
                .about("Play a book")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Book ID to play")),
        )
        .subcommand(
            Command::new("generate")
                .about("Write, illustrate and narrate a new story")
                .arg(
                    Arg::new("prompt")
                        .required(true)
                        .value_name("PROMPT")
                        .num_args(1..)
                        .help("What the story should be about"),
                )
                .arg(
                    Arg::new("no-play")
                        .long("no-play")
                        .help("Add the book without starting playback")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a book from the library")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Book ID to remove")),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config if none exists"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location")),
        )
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    let manager = match matches.get_one::<String>("config-dir") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    };
    manager.context("Failed to resolve config directory")
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = config_manager(&matches)?;

    let config = match manager.load_with_env_overrides() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}; using default settings", e);
            Config::default()
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.as_str()),
    )
    .init();

    let shell = Shell::new(manager, config, matches.get_flag("headless"));

    match matches.subcommand() {
        Some(("list", sub_matches)) => {
            let query = sub_matches.get_one::<String>("query").map(String::as_str).unwrap_or("");
            let category = sub_matches
                .get_one::<String>("category")
                .map(String::as_str)
                .unwrap_or(voxlibre_core::category::ALL);
            commands::list_books(&shell, query, category)
        }
        Some(("stats", _)) => commands::show_stats(&shell),
        Some(("categories", _)) => commands::list_categories(&shell),
        Some(("play", sub_matches)) => {
            let book_id = sub_matches
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("Book ID is required"))?;
            commands::play_book(&shell, book_id).await
        }
        Some(("generate", sub_matches)) => {
            let prompt = sub_matches
                .get_many::<String>("prompt")
                .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            commands::generate_book(&shell, &prompt, !sub_matches.get_flag("no-play")).await
        }
        Some(("remove", sub_matches)) => {
            let book_id = sub_matches
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("Book ID is required"))?;
            commands::remove_book(&shell, book_id)
        }
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("init", _)) => commands::config_init(&shell),
            Some(("show", _)) => commands::config_show(&shell),
            Some(("path", _)) => commands::config_path(&shell),
            _ => Ok(()),
        },
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
