use std::path::PathBuf;
use tempfile::TempDir;
use voxlibre_config::{
    apply_env_overrides, Config, ConfigError, ConfigManager, LogLevel, OutputKind, CONFIG_VERSION,
};

fn manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().join("voxlibre"))?;
    Ok((temp_dir, manager))
}

#[test]
fn test_headless_setup_survives_restart() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = manager()?;
    assert!(manager.initialize()?);

    manager.update(|config| {
        config.player.output = OutputKind::Headless;
        config.library.storage_key = "bedside_shelf".to_string();
        config.app.log_level = LogLevel::Debug;
    })?;

    let restarted = ConfigManager::with_directory(manager.config_dir().to_path_buf())?;
    let config = restarted.load()?;
    assert_eq!(config.version, CONFIG_VERSION);
    assert_eq!(config.player.output, OutputKind::Headless);
    assert_eq!(config.library.storage_key, "bedside_shelf");
    assert_eq!(config.app.log_level, LogLevel::Debug);

    Ok(())
}

#[test]
fn test_partial_file_fills_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = manager()?;
    std::fs::create_dir_all(manager.config_dir())?;
    std::fs::write(
        manager.config_path(),
        "[generation]\nvoice = \"Aoede\"\n\n[player]\noutput = \"headless\"\n",
    )?;

    let config = manager.load()?;
    assert_eq!(config.generation.voice, "Aoede");
    assert_eq!(config.generation.tts_model, "gemini-2.5-flash-preview-tts");
    assert_eq!(config.player.output, OutputKind::Headless);
    assert_eq!(config.player.sample_rate, 24_000);
    assert!(config.library.seed_when_missing);

    Ok(())
}

#[test]
fn test_rendered_config_loads_back() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = manager()?;
    let mut original = Config::default();
    original.app.data_dir = Some(PathBuf::from("/var/lib/voxlibre"));
    original.generation.max_attempts = 5;

    std::fs::create_dir_all(manager.config_dir())?;
    std::fs::write(manager.config_path(), original.to_toml()?)?;

    assert_eq!(manager.load()?, original);
    Ok(())
}

#[test]
fn test_invalid_save_leaves_previous_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = manager()?;
    manager.update(|config| config.player.default_volume = 55)?;

    let mut broken = manager.load()?;
    broken.player.default_volume = 150;
    broken.player.sample_rate = 96_000;
    broken.generation.max_attempts = 0;

    match manager.save(&broken) {
        Err(ConfigError::Invalid(errors)) => {
            assert_eq!(errors.len(), 3);
            assert!(errors.iter().any(|e| e.field == "generation.max_attempts"));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    assert_eq!(manager.load()?.player.default_volume, 55);
    Ok(())
}

#[test]
fn test_process_environment_overrides() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = manager()?;
    manager.initialize()?;

    std::env::set_var("VOXLIBRE_APP_DATA_DIR", "/tmp/voxlibre-data");
    let config = manager.load_with_env_overrides()?;
    std::env::remove_var("VOXLIBRE_APP_DATA_DIR");

    assert_eq!(config.app.data_dir, Some(PathBuf::from("/tmp/voxlibre-data")));
    assert_eq!(manager.data_dir(&config)?, PathBuf::from("/tmp/voxlibre-data"));
    Ok(())
}

#[test]
fn test_overrides_do_not_touch_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = manager()?;
    manager.initialize()?;

    let mut config = manager.load()?;
    apply_env_overrides(&mut config, |name| {
        (name == "VOXLIBRE_GENERATION_VOICE").then(|| "Zephyr".to_string())
    });

    assert_eq!(config.generation.voice, "Zephyr");
    assert_eq!(manager.load()?.generation.voice, "Kore");
    Ok(())
}
