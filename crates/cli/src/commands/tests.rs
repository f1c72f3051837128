use super::*;
use tempfile::TempDir;
use voxlibre_core::category::AI_GENERATED;

fn setup_shell() -> (TempDir, Shell) {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(temp_dir.path().join("config")).unwrap();

    let mut config = Config::default();
    config.app.data_dir = Some(temp_dir.path().join("data"));
    config.generation.api_key_env = "VOXLIBRE_CLI_TEST_UNSET_KEY".to_string();

    (temp_dir, Shell::new(manager, config, true))
}

fn sample_book(id: &str, title: &str) -> Book {
    let mut book = Book::new(id, title, "Test Author", AI_GENERATED)
        .with_content("Once upon a time there was a test.");
    book.duration = "Short Story".to_string();
    book.rating = 5.0;
    book.is_generated = Some(true);
    book
}

#[test]
fn test_open_library_seeds_first_run() {
    let (temp_dir, shell) = setup_shell();

    let library = shell.open_library().unwrap();
    assert_eq!(library.len(), 4);
    assert!(temp_dir.path().join("data").join("voxlibre_library.json").exists());
}

#[test]
fn test_library_changes_visible_to_next_command() {
    let (_temp_dir, shell) = setup_shell();

    let mut library = shell.open_library().unwrap();
    library.prepend(sample_book("42", "The Lighthouse")).unwrap();

    let reopened = shell.open_library().unwrap();
    assert_eq!(reopened.len(), 5);
    assert_eq!(reopened.books()[0].title, "The Lighthouse");
}

#[test]
fn test_remove_book() {
    let (_temp_dir, shell) = setup_shell();

    remove_book(&shell, "1").unwrap();

    let library = shell.open_library().unwrap();
    assert_eq!(library.len(), 3);
    assert!(library.get(&BookId::new("1")).is_none());
}

#[test]
fn test_remove_unknown_book_fails() {
    let (_temp_dir, shell) = setup_shell();
    assert!(remove_book(&shell, "nope").is_err());
}

#[test]
fn test_find_book() {
    let (_temp_dir, shell) = setup_shell();
    let library = shell.open_library().unwrap();

    assert_eq!(find_book(&library, "2").unwrap().title, "Project Hail Mary");

    let err = find_book(&library, "404").unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[test]
fn test_list_commands_succeed() {
    let (_temp_dir, shell) = setup_shell();

    list_books(&shell, "", "All").unwrap();
    list_books(&shell, "no such title", "All").unwrap();
    show_stats(&shell).unwrap();
    list_categories(&shell).unwrap();
}

#[test]
fn test_format_book_line() {
    let line = format_book_line(&sample_book("7", "Tides"));

    assert!(line.contains("[7] Tides ✦"));
    assert!(line.contains("by Test Author"));
    assert!(line.contains("AI Generated"));
    assert!(line.contains("★ 5.0"));
}

#[test]
fn test_format_book_line_seed_book_unmarked() {
    let book = Book::new("1", "The Midnight Library", "Matt Haig", "Fiction");
    assert!(!format_book_line(&book).contains('✦'));
}

#[test]
fn test_format_stats() {
    let stats = LibraryStats {
        total_books: 4,
        generated_books: 1,
        narratable_books: 1,
        narratable_words: 120,
        categories: 3,
    };

    let lines = format_stats(&stats);
    assert_eq!(lines.len(), 5);
    assert!(lines[1].contains("1 (25%)"));
    assert!(lines[3].contains("120"));
}

#[test]
fn test_config_init_then_show() {
    let (temp_dir, shell) = setup_shell();

    config_init(&shell).unwrap();
    assert!(temp_dir.path().join("config").join("config.toml").exists());

    // Second call leaves the file alone
    config_init(&shell).unwrap();

    let rendered = format_config(shell.config()).unwrap();
    assert!(rendered.contains("[player]"));
    assert!(rendered.contains("VOXLIBRE_CLI_TEST_UNSET_KEY"));
}

#[tokio::test]
async fn test_offline_client_reports_missing_key() {
    let (_temp_dir, shell) = setup_shell();
    let client = shell.generation_client();

    let err = client.generate_story("a lighthouse").await.unwrap_err();
    assert!(matches!(err, GenerationError::MissingApiKey(ref name) if name == "VOXLIBRE_CLI_TEST_UNSET_KEY"));

    // Covers still fall back to the placeholder
    let cover = client.generate_cover("Tides", "a lighthouse").await;
    assert!(cover.starts_with("https://picsum.photos/seed/"));
}

#[tokio::test]
async fn test_headless_engine_simulates_seed_book() {
    let (_temp_dir, shell) = setup_shell();
    let library = shell.open_library().unwrap();
    let book = find_book(&library, "1").unwrap().clone();

    let engine = shell.engine(shell.generation_client());
    engine.select_book(book).await.unwrap();

    assert!(engine.is_simulated());
    assert!(engine.snapshot().is_playing);
    engine.close();
}

#[tokio::test]
async fn test_narration_without_key_fails_and_pauses() {
    let (_temp_dir, shell) = setup_shell();
    let engine = shell.engine(shell.generation_client());

    let result = engine.select_book(sample_book("9", "Unvoiced")).await;

    assert!(result.is_err());
    assert!(!engine.snapshot().is_playing);
    engine.close();
}

#[tokio::test]
async fn test_generate_without_key_fails_with_hint() {
    let (_temp_dir, shell) = setup_shell();

    let err = generate_book(&shell, "a lighthouse keeper", false).await.unwrap_err();
    assert!(err.to_string().contains("Please try a different prompt"));

    let library = shell.open_library().unwrap();
    assert_eq!(library.len(), 4);
}

#[tokio::test]
async fn test_generate_rejects_blank_prompt() {
    let (_temp_dir, shell) = setup_shell();
    assert!(generate_book(&shell, "   ", false).await.is_err());
}
