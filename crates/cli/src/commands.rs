// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use console::style;
use std::sync::Arc;
use voxlibre_config::{Config, ConfigManager, OutputKind};
use voxlibre_core::{category, Book, BookId, LibraryStats};
use voxlibre_generation::{
    ClientConfig, GeminiClient, GenerationClient, GenerationError, GenerationResult, StoryDraft,
    Studio,
};
use voxlibre_library::{FileStore, Library, LibraryFilter};
use voxlibre_media_engine::{
    AudioBackend, CpalBackend, EngineSettings, HeadlessBackend, PlaybackEngine,
};

use crate::player;

/// Everything a command needs: resolved config and where it came from
pub struct Shell {
    manager: ConfigManager,
    config: Config,
    headless: bool,
}

impl Shell {
    pub fn new(manager: ConfigManager, config: Config, headless: bool) -> Self {
        Self {
            manager,
            config,
            headless,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the cached library, seeding it on first run
    pub fn open_library(&self) -> Result<Library> {
        let dir = self
            .manager
            .data_dir(&self.config)
            .context("Failed to resolve data directory")?;
        let store = Arc::new(FileStore::new(dir));
        Library::from_config(store, &self.config.library).context("Failed to load library")
    }

    fn backend(&self) -> Arc<dyn AudioBackend> {
        if self.headless || self.config.player.output == OutputKind::Headless {
            Arc::new(HeadlessBackend::realtime())
        } else {
            Arc::new(CpalBackend::new())
        }
    }

    /// The remote client, or a stand-in that reports the missing key on use
    pub fn generation_client(&self) -> Arc<dyn GenerationClient> {
        let client_config = ClientConfig::from_config(&self.config.generation);
        match GeminiClient::new(client_config) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                log::warn!("Generation unavailable: {}", e);
                Arc::new(OfflineClient {
                    api_key_env: self.config.generation.api_key_env.clone(),
                })
            }
        }
    }

    pub fn engine(&self, client: Arc<dyn GenerationClient>) -> PlaybackEngine {
        let settings = EngineSettings::from_config(&self.config.player, self.config.generation.voice.clone());
        PlaybackEngine::new(self.backend(), client, settings)
    }
}

/// Fails every request with [`GenerationError::MissingApiKey`]
struct OfflineClient {
    api_key_env: String,
}

impl OfflineClient {
    fn missing_key(&self) -> GenerationError {
        GenerationError::MissingApiKey(self.api_key_env.clone())
    }
}

#[async_trait]
impl GenerationClient for OfflineClient {
    async fn generate_story(&self, _prompt: &str) -> GenerationResult<StoryDraft> {
        Err(self.missing_key())
    }

    async fn generate_tts(&self, _text: &str, _voice: &str) -> GenerationResult<String> {
        Err(self.missing_key())
    }

    async fn try_generate_cover(&self, _title: &str, _prompt: &str) -> GenerationResult<String> {
        Err(self.missing_key())
    }
}

/// List books matching the search box and category selector
pub fn list_books(shell: &Shell, query: &str, category: &str) -> Result<()> {
    let library = shell.open_library()?;
    let filter = LibraryFilter::new().with_query(query).with_category(category);
    let books = library.filter(&filter);

    if books.is_empty() {
        if library.is_empty() {
            println!("No books in library. Use 'generate' to create one.");
        } else {
            println!("No books match the current filter.");
        }
        return Ok(());
    }

    println!("\n{} Books in Library", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for book in books {
        print_book_summary(book);
    }

    Ok(())
}

/// Show library statistics
pub fn show_stats(shell: &Shell) -> Result<()> {
    let library = shell.open_library()?;
    let stats = library.stats();

    println!("\n{}", style("Library Statistics").bold().cyan());
    println!("{}", "=".repeat(80));
    for line in format_stats(&stats) {
        println!("{}", line);
    }

    let categories = library.categories();
    if !categories.is_empty() {
        println!("\n  Categories: {}", categories.join(", "));
    }

    Ok(())
}

/// Print the category selector
pub fn list_categories(shell: &Shell) -> Result<()> {
    let library = shell.open_library()?;

    for name in category::CATEGORIES {
        let count = library
            .filter(&LibraryFilter::new().with_category(name))
            .len();
        println!("  {:<14} {}", name, style(count).dim());
    }

    Ok(())
}

/// Play a book from the library
pub async fn play_book(shell: &Shell, book_id: &str) -> Result<()> {
    let library = shell.open_library()?;
    let book = find_book(&library, book_id)?.clone();

    let engine = Arc::new(shell.engine(shell.generation_client()));
    let start = {
        let engine = engine.clone();
        let book = book.clone();
        async move { engine.select_book(book).await }
    };

    player::run_player(engine, &book, start).await
}

/// Generate a new book, add it to the library and play it
pub async fn generate_book(shell: &Shell, prompt: &str, play: bool) -> Result<()> {
    if prompt.trim().is_empty() {
        bail!("Describe the story you want to hear");
    }

    let mut library = shell.open_library()?;
    let client = shell.generation_client();
    let studio = Studio::new(client.clone(), shell.config().generation.voice.clone());

    let generated = match studio
        .create_book(prompt, |step| println!("  {} {}", style("…").cyan(), step))
        .await
    {
        Ok(generated) => generated,
        Err(e) => {
            bail!("Failed to generate story ({}). Please try a different prompt.", e);
        }
    };

    library
        .prepend(generated.book.clone())
        .context("Failed to save the new book")?;

    println!("{} Story created!", style("✓").green().bold());
    print_book_summary(&generated.book);

    if !play {
        return Ok(());
    }

    let engine = Arc::new(shell.engine(client));
    let start = {
        let engine = engine.clone();
        let book = generated.book.clone();
        let narration = generated.narration.clone();
        async move { engine.select_book_with_narration(book, &narration).await }
    };

    player::run_player(engine, &generated.book, start).await
}

/// Remove a book from the library
pub fn remove_book(shell: &Shell, book_id: &str) -> Result<()> {
    let mut library = shell.open_library()?;
    let removed = library
        .remove(&BookId::new(book_id))
        .with_context(|| format!("Failed to remove book {}", book_id))?;

    println!("{} Removed '{}'", style("✓").green().bold(), removed.title);
    Ok(())
}

/// Write a default config file if none exists
pub fn config_init(shell: &Shell) -> Result<()> {
    let created = shell
        .manager
        .initialize()
        .context("Failed to write config file")?;

    if created {
        println!("{} Created {}", style("✓").green().bold(), shell.manager.config_path().display());
    } else {
        println!("Config already exists at {}", shell.manager.config_path().display());
    }
    Ok(())
}

/// Print the effective configuration as TOML
pub fn config_show(shell: &Shell) -> Result<()> {
    let rendered = format_config(shell.config())?;
    print!("{}", rendered);

    if let Err(errors) = shell.config().validate() {
        for error in errors {
            eprintln!("{} {}", style("warning:").yellow(), error);
        }
    }
    Ok(())
}

/// Print the config file location
pub fn config_path(shell: &Shell) -> Result<()> {
    println!("{}", shell.manager.config_path().display());
    Ok(())
}

fn find_book<'a>(library: &'a Library, book_id: &str) -> Result<&'a Book> {
    library
        .get(&BookId::new(book_id))
        .with_context(|| format!("Book not found: {}", book_id))
}

fn print_book_summary(book: &Book) {
    println!("{}", format_book_line(book));
    println!("    {}", style(&book.description).dim());
}

/// One-line listing: id, title, author, category, duration, rating
pub(crate) fn format_book_line(book: &Book) -> String {
    let marker = if book.is_generated() { " ✦" } else { "" };
    format!(
        "  [{}] {}{} by {} | {} | {} | ★ {:.1}",
        book.id,
        book.title,
        marker,
        book.author,
        book.category,
        book.duration,
        book.rating
    )
}

pub(crate) fn format_stats(stats: &LibraryStats) -> Vec<String> {
    vec![
        format!("  Total books:      {}", stats.total_books),
        format!(
            "  AI generated:     {} ({:.0}%)",
            stats.generated_books,
            stats.generated_percentage()
        ),
        format!("  With narration:   {}", stats.narratable_books),
        format!("  Narration words:  {}", stats.narratable_words),
        format!("  Categories:       {}", stats.categories),
    ]
}

pub(crate) fn format_config(config: &Config) -> Result<String> {
    config.to_toml().context("Failed to render config")
}

#[cfg(test)]
mod tests;
