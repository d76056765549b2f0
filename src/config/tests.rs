use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_service_contract() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.cache.backend, CacheBackend::Memory);
    assert_eq!(settings.cache.entry_ttl, Duration::from_secs(7200));
    assert_eq!(settings.cache.invalidation_ttl, Duration::from_secs(1));
    assert_eq!(settings.database.query_timeout, Duration::from_secs(3));
    assert_eq!(settings.database.acquire_timeout, Duration::from_secs(5));
    assert_eq!(settings.upstream.timeout, Duration::from_secs(5));
    assert_eq!(settings.upstream.films_url.as_str(), "https://swapi.dev/api/films");
    assert_eq!(
        settings.upstream.people_url.as_str(),
        "https://swapi.dev/api/people"
    );
    assert!(settings.database.url.is_none());
}

#[test]
fn redis_backend_uses_configured_url() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        cache_backend: Some("Redis".to_string()),
        cache_redis_url: Some("redis://cache:6379/2".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.cache.backend,
        CacheBackend::Redis {
            url: "redis://cache:6379/2".to_string()
        }
    );
}

#[test]
fn unknown_cache_backend_names_the_key() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcached".to_string());

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "cache.backend", .. }));
}

#[test]
fn zero_entry_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.entry_ttl_seconds = Some(0);

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.entry_ttl_seconds",
            ..
        }
    ));
}

#[test]
fn invalidation_ttl_must_undercut_entry_ttl() {
    let mut raw = RawSettings::default();
    raw.cache.entry_ttl_seconds = Some(5);
    raw.cache.invalidation_ttl_seconds = Some(5);

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.invalidation_ttl_seconds",
            ..
        }
    ));
}

#[test]
fn upstream_urls_must_be_http() {
    let mut raw = RawSettings::default();
    raw.upstream.people_url = Some("ftp://swapi.dev/api/people".to_string());

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "upstream.people_url",
            ..
        }
    ));
}

#[test]
fn blank_database_url_counts_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["holocron"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "holocron",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--upstream-timeout-seconds",
        "9",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.upstream_timeout_seconds, Some(9));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "holocron",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}
