use std::path::PathBuf;

use markpane::config::{ConfigFlags, load_config_flags, parse_flag_tokens, save_config_flags};
use markpane::theme::Theme;

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".markpanerc");
    let content = r#"
# comment
--no-sync

--theme dark

--render-debug-log=render.log
--plantuml-server http://localhost:8080/plantuml
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_sync);
    assert_eq!(flags.theme, Some(Theme::Dark));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
    assert_eq!(
        flags.plantuml_server.as_deref(),
        Some("http://localhost:8080/plantuml")
    );
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".markpanerc");
    let content = "--no-sync\n--theme light\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "markpane".to_string(),
        "render".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--perf".to_string(),
        "notes.md".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_sync, "file flags should remain enabled");
    assert!(effective.perf, "cli flags should be applied");
    assert_eq!(effective.theme, Some(Theme::Dark), "cli should override theme");
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_local_override_layers_on_global() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().join("global").join("config");
    let local = dir.path().join(".markpanerc");
    save_config_flags(
        &global,
        &ConfigFlags {
            theme: Some(Theme::Dark),
            plantuml_server: Some("https://global.example/plantuml".to_string()),
            ..ConfigFlags::default()
        },
    )
    .unwrap();
    std::fs::write(&local, "--plantuml-server=https://local.example/plantuml\n").unwrap();

    let merged = load_config_flags(&global)
        .unwrap()
        .union(&load_config_flags(&local).unwrap());
    assert_eq!(merged.theme, Some(Theme::Dark));
    assert_eq!(
        merged.plantuml_server.as_deref(),
        Some("https://local.example/plantuml")
    );
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}
