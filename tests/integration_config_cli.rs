use assert_cmd::Command;
use tempfile::tempdir;
use whackamole::{
    config::{ConfigStore, FileConfigStore},
    Settings,
};

#[test]
fn write_default_config_creates_a_loadable_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("config.json");

    let assert = Command::cargo_bin("whackamole")?
        .arg("--config")
        .arg(&path)
        .arg("--write-default-config")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert_eq!(stdout.trim(), path.display().to_string());

    let text = std::fs::read_to_string(&path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(value["session_secs"], 30);
    assert_eq!(FileConfigStore::with_path(&path).load(), Settings::default());
    Ok(())
}
