use cp_domain::config::{Config, ConfigSeverity};

#[test]
fn empty_file_yields_full_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.cache.ttl_hours, 24);
    assert_eq!(config.extract.wait_timeout_secs, 30);
    assert_eq!(config.llm.model, "gemini-2.0-flash");
    assert_eq!(config.state.history_limit, 40);
    assert_eq!(config.memory.default_user_id, "anonymous");
}

#[test]
fn state_paths_hang_off_root() {
    let config: Config = toml::from_str(
        r#"
[state]
path = "/var/lib/careerpath"
"#,
    )
    .unwrap();
    assert_eq!(
        config.state.profiles_path(),
        std::path::PathBuf::from("/var/lib/careerpath/profiles/profiles.json")
    );
    assert_eq!(
        config.state.cache_dir(),
        std::path::PathBuf::from("/var/lib/careerpath/cache")
    );
}

#[test]
fn default_config_only_warns() {
    let issues = Config::default().validate();
    assert!(issues.iter().all(|i| i.severity == ConfigSeverity::Warning));
    assert!(issues.iter().any(|i| i.field == "search.pinecone.index_host"));
}

#[test]
fn zero_ttl_is_an_error() {
    let config: Config = toml::from_str(
        r#"
[cache]
ttl_hours = 0
"#,
    )
    .unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "cache.ttl_hours" && i.severity == ConfigSeverity::Error));
}

#[test]
fn non_http_jobs_url_is_rejected() {
    let config: Config = toml::from_str(
        r#"
[extract]
jobs_url = "ftp://example.com/jobs"
"#,
    )
    .unwrap();
    assert!(config.validate().iter().any(|i| i.field == "extract.jobs_url"));
}

#[test]
fn cors_wildcard_warns() {
    let config: Config = toml::from_str(
        r#"
[server.cors]
allowed_origins = ["*"]
"#,
    )
    .unwrap();
    assert!(config
        .validate()
        .iter()
        .any(|i| i.field == "server.cors.allowed_origins"));
}
