use super::*;
use tempfile::tempdir;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dawnr.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn empty_file_yields_all_defaults() {
    let (_keep, path) = write_config("");
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.light_lead_minutes(), 20);
    assert_eq!(config.light_tick_ms(), 2000);
    assert_eq!(config.volume_ramp_seconds(), 60);
    assert_eq!(config.volume_tick_ms(), 1000);
    assert_eq!(config.max_ramp_restarts(), 3);
    assert_eq!(config.default_sound(), "classicalarm_digital");
    assert!(config.backlight_device.is_none());
}

#[test]
fn explicit_values_override_defaults() {
    let (_keep, path) = write_config(
        r#"
light_lead_minutes = 30
light_tick_ms = 1000
backlight_device = "amdgpu_bl0"
default_sound = "naturalsound_rain"
"#,
    );
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.light_lead_minutes(), 30);
    assert_eq!(config.light_tick_ms(), 1000);
    assert_eq!(config.backlight_device.as_deref(), Some("amdgpu_bl0"));
    assert_eq!(config.default_sound(), "naturalsound_rain");
    // untouched fields still default
    assert_eq!(config.volume_ramp_seconds(), 60);
}

#[test]
fn out_of_range_lead_is_rejected_with_the_range() {
    let (_keep, path) = write_config("light_lead_minutes = 240\n");
    let err = Config::load_from_path(&path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("light_lead_minutes"));
    assert!(message.contains("120"));
}

#[test]
fn out_of_range_tick_is_rejected() {
    let (_keep, path) = write_config("light_tick_ms = 50\n");
    assert!(Config::load_from_path(&path).is_err());

    let (_keep, path) = write_config("volume_tick_ms = 60000\n");
    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn unknown_default_sound_is_rejected() {
    let (_keep, path) = write_config("default_sound = \"klaxon_of_doom\"\n");
    let err = Config::load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("klaxon_of_doom"));
}

#[test]
fn malformed_toml_names_the_file() {
    let (_keep, path) = write_config("light_lead_minutes = [not toml\n");
    let err = Config::load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("dawnr.toml"));
}

#[test]
fn generated_default_file_loads_cleanly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sub").join("dawnr.toml");
    create_default_config(&path).unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.light_lead_minutes(), 20);
    assert_eq!(config.default_sound(), "classicalarm_digital");
}
