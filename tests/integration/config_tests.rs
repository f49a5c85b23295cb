use figment::providers::Serialized;
use notedupe::config::Config;
use notedupe::dedupe::RetentionPolicy;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.host.base_url, "http://127.0.0.1:6806");
    assert_eq!(config.scan.placeholder_title, "Untitled");
    assert!(config.scan.exclude_placeholder);
    assert_eq!(config.cleanup.keep, RetentionPolicy::Newest);
    assert!(config.cleanup.confirm_before_delete);
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("NOTEDUPE_HOST__TOKEN", "secret-token");
    // Use double underscore for nesting
    std::env::set_var("NOTEDUPE_SCAN__MIN_FILE_SIZE", "4096");

    // Use figment directly to test loading from environment
    use figment::{providers::Env, Figment};
    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("NOTEDUPE_").split("__"));

    let config: Config = figment.extract().unwrap();

    assert_eq!(config.host.token, "secret-token");
    assert_eq!(config.scan.min_file_size, 4096);

    // Clean up
    std::env::remove_var("NOTEDUPE_HOST__TOKEN");
    std::env::remove_var("NOTEDUPE_SCAN__MIN_FILE_SIZE");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
[host]
base_url = "http://notes.local:6806/"
timeout_secs = 5

[scan]
placeholder_title = "Draft"
ignore_extensions = [".PNG", "tmp"]
recursive = false

[cleanup]
keep = "largest"
confirm_before_delete = false
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load(Some(&config_path)).unwrap();

    assert_eq!(config.host.base_url, "http://notes.local:6806/");
    assert_eq!(config.host.timeout_secs, 5);
    assert_eq!(config.scan.placeholder_title, "Draft");
    // Extensions come out normalized: lowercased, no leading dot.
    assert_eq!(config.scan.ignore_extensions, vec!["png", "tmp"]);
    assert!(!config.scan.recursive);
    assert_eq!(config.cleanup.keep, RetentionPolicy::Largest);
    assert!(!config.cleanup.confirm_before_delete);
}

#[test]
fn test_config_partial_toml_keeps_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    fs::write(&config_path, "[scan]\nplaceholder_title = \"Leer\"\n").unwrap();

    let config = Config::load(Some(&config_path)).unwrap();

    assert_eq!(config.scan.placeholder_title, "Leer");
    assert_eq!(config.host.base_url, "http://127.0.0.1:6806");
    assert!(config.scan.hide_referenced);
}

#[test]
fn test_config_missing_explicit_path_errors() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("no-such.toml");

    let result = Config::load(Some(&missing));
    assert!(result.is_err());
}

#[test]
fn test_config_rejects_invalid_values() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    fs::write(&config_path, "[host]\ntimeout_secs = 0\n").unwrap();
    assert!(Config::load(Some(&config_path)).is_err());

    fs::write(&config_path, "[host]\nbase_url = \"  \"\n").unwrap();
    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_config_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    fs::write(&config_path, "invalid = toml").unwrap();
    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_starter_file_loads_back_unchanged() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    Config::write_starter(&config_path, false).unwrap();
    let config = Config::load(Some(&config_path)).unwrap();

    // Spot-check fields the environment tests never touch.
    assert_eq!(config.host.base_url, Config::default().host.base_url);
    assert_eq!(
        config.scan.placeholder_title,
        Config::default().scan.placeholder_title
    );
    assert_eq!(config.cleanup.keep, Config::default().cleanup.keep);

    // A second write without force refuses to clobber the file.
    assert!(Config::write_starter(&config_path, false).is_err());
    assert!(Config::write_starter(&config_path, true).is_ok());
}
