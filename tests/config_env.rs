// tests/config_env.rs
use flow_themes::config::{ENV_CONFIG_PATH, ENV_MIN_MERGE_SIMILARITY, ENV_SIMILARITY_THRESHOLD};
use flow_themes::{EngineConfig, TagType};
use std::path::PathBuf;
use std::{env, fs};

/// Restores the working directory on drop, also when an assertion fails.
struct CwdGuard {
    old: PathBuf,
}

impl CwdGuard {
    fn enter(dir: &std::path::Path) -> Self {
        let old = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        Self { old }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.old);
    }
}

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_SIMILARITY_THRESHOLD);
    env::remove_var(ENV_MIN_MERGE_SIMILARITY);
}

#[serial_test::serial]
#[test]
fn missing_default_file_falls_back_to_builtin_values() {
    // Isolate CWD so the repo's config/ is not picked up.
    let tmp = tempfile::tempdir().unwrap();
    let _cwd = CwdGuard::enter(tmp.path());
    clear_env();

    let cfg = EngineConfig::from_env().unwrap();
    assert_eq!(cfg, EngineConfig::default());

    // Default location is read once it exists.
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("clustering.toml"),
        "[clustering]\nsimilarity_threshold = 0.5\n",
    )
    .unwrap();
    let cfg = EngineConfig::from_env().unwrap();
    assert_eq!(cfg.clustering.similarity_threshold, 0.5);
}

#[serial_test::serial]
#[test]
fn explicit_path_wins_and_must_exist() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("themes.toml");
    fs::write(
        &p,
        r#"
[clustering]
source_tags = ["value", "value", "emotion"]
min_merge_similarity = 0.2
"#,
    )
    .unwrap();

    env::set_var(ENV_CONFIG_PATH, p.display().to_string());
    let cfg = EngineConfig::from_env().unwrap();
    assert_eq!(
        cfg.clustering.source_tags,
        vec![TagType::Value, TagType::Emotion]
    );
    assert_eq!(cfg.clustering.min_merge_similarity, 0.2);

    env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
    let err = EngineConfig::from_env().unwrap_err();
    assert!(format!("{err:#}").contains("nope.toml"));

    clear_env();
}

#[serial_test::serial]
#[test]
fn env_thresholds_override_file_values() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("themes.toml");
    fs::write(&p, "[clustering]\nsimilarity_threshold = 0.5\n").unwrap();

    env::set_var(ENV_CONFIG_PATH, p.display().to_string());
    env::set_var(ENV_SIMILARITY_THRESHOLD, "0.35");
    env::set_var(ENV_MIN_MERGE_SIMILARITY, "not-a-number");

    let cfg = EngineConfig::from_env().unwrap();
    assert_eq!(cfg.clustering.similarity_threshold, 0.35);
    // Garbage is ignored, the default stays.
    assert_eq!(cfg.clustering.min_merge_similarity, 0.1);

    env::set_var(ENV_MIN_MERGE_SIMILARITY, "7");
    let cfg = EngineConfig::from_env().unwrap();
    assert_eq!(cfg.clustering.min_merge_similarity, 1.0);

    clear_env();
}

#[test]
fn shipped_config_parses() {
    let cfg = EngineConfig::load_from_file(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/clustering.toml"),
    )
    .unwrap();
    assert_eq!(cfg.clustering.similarity_threshold, 0.25);
    assert_eq!(cfg.clustering.source_tags, TagType::default_source_tags());
    assert!(cfg.contexts.joy.iter().any(|p| p == "hobbies"));
}
