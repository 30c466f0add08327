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
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.database.url, None);
    assert_eq!(settings.database.max_connections.get(), 8);
    assert_eq!(
        settings.client.request_timeout,
        Duration::from_secs(DEFAULT_CLIENT_REQUEST_TIMEOUT_SECS)
    );
    assert!(matches!(settings.logging.format, LogFormat::Compact));
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
fn zero_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.rate_limit.max_requests = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero max requests");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "rate_limit.max_requests",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.client.request_timeout_seconds = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "client.request_timeout_seconds",
            ..
        }
    ));
}

#[test]
fn blank_database_url_is_treated_as_absent() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.database.url, None);
}

#[test]
fn malformed_client_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.client.base_url = Some("not a url".to_string());
    let err = Settings::from_raw(raw).expect_err("bad url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "client.base_url",
            ..
        }
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["creator-circle"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_import_arguments() {
    let args = CliArgs::parse_from([
        "creator-circle",
        "import",
        "--database-url",
        "postgres://example",
        "/tmp/posts",
    ]);

    match args.command.expect("import command") {
        Command::Import(import) => {
            assert_eq!(
                import.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(import.dir, std::path::Path::new("/tmp/posts"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "creator-circle",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--rate-limit-max-requests",
        "5",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.rate_limit_max_requests, Some(5));
            assert!(serve.overrides.rate_limit_trusted_proxies.is_empty());
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn trusted_proxies_default_to_none() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert!(settings.rate_limit.trusted_proxies.is_empty());
}

#[test]
fn trusted_proxies_are_parsed_from_cli() {
    let args = CliArgs::parse_from([
        "creator-circle",
        "serve",
        "--rate-limit-trusted-proxies",
        "10.0.0.1, ::1",
    ]);
    let Some(Command::Serve(serve)) = args.command else {
        panic!("serve command expected");
    };

    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&serve.overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.rate_limit.trusted_proxies,
        vec![
            "10.0.0.1".parse::<IpAddr>().expect("ipv4"),
            "::1".parse::<IpAddr>().expect("ipv6"),
        ]
    );
}

#[test]
fn malformed_trusted_proxy_is_rejected() {
    let mut raw = RawSettings::default();
    raw.rate_limit.trusted_proxies = Some(vec!["proxy.internal".to_string()]);

    let err = Settings::from_raw(raw).expect_err("hostname is not an address");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "rate_limit.trusted_proxies",
            ..
        }
    ));
}
