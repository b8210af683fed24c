//! Tests for configuration module.

use super::*;

fn sample_settings() -> Settings {
    Settings {
        database: DatabaseConfig {
            url: "postgresql://localhost/campus".to_string(),
            max_connections: 4,
            run_migrations: true,
        },
        auth: AuthConfig {
            session_ttl_hours: 168,
            activation_ttl_hours: 72,
            bootstrap_admin: None,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8698,
            serve_origin: None,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
        },
        schedule: ScheduleConfig {
            timezone: "Europe/Paris".to_string(),
            max_recurrence_count: 52,
            invalid_monthly_date: InvalidDatePolicy::SkipOnInvalidDate,
            ordinal_overflow: OrdinalOverflow::Spill,
        },
        documents: DocumentsConfig {
            max_upload_bytes: 1024,
        },
    }
}

#[test_log::test]
fn test_sample_settings_validate() {
    tracing::debug!("Validating sample settings");
    assert!(sample_settings().validate().is_ok());
}

#[test]
fn test_origin_falls_back_to_host_and_port() {
    let settings = sample_settings();
    assert_eq!(settings.server.origin(), "http://127.0.0.1:8698");

    let mut with_origin = settings;
    with_origin.server.serve_origin = Some("https://campus.example.org".to_string());
    assert_eq!(with_origin.server.origin(), "https://campus.example.org");
}

#[test]
fn test_unknown_timezone_is_rejected() {
    let mut settings = sample_settings();
    settings.schedule.timezone = "Mars/Olympus_Mons".to_string();

    let err = settings.validate().expect_err("timezone should be rejected");
    assert!(err.to_string().contains("Mars/Olympus_Mons"));
}

#[test]
fn test_timezone_parses() {
    let settings = sample_settings();
    assert_eq!(
        settings.schedule.tz().expect("valid timezone"),
        chrono_tz::Europe::Paris
    );
}

#[test]
fn test_zero_recurrence_cap_is_rejected() {
    let mut settings = sample_settings();
    settings.schedule.max_recurrence_count = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn test_empty_database_url_is_rejected() {
    let mut settings = sample_settings();
    settings.database.url = "  ".to_string();
    assert!(settings.validate().is_err());
}

#[test]
fn test_clamp_count() {
    let schedule = sample_settings().schedule;

    assert_eq!(schedule.clamp_count(-3), 1);
    assert_eq!(schedule.clamp_count(0), 1);
    assert_eq!(schedule.clamp_count(1), 1);
    assert_eq!(schedule.clamp_count(12), 12);
    assert_eq!(schedule.clamp_count(52), 52);
    assert_eq!(schedule.clamp_count(53), 52);
    assert_eq!(schedule.clamp_count(i64::MAX), 52);
}

#[test]
fn test_bootstrap_admin_debug_redacts_password() {
    let admin = BootstrapAdminConfig {
        email: "admin@example.org".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Admin".to_string(),
        password: "hunter2hunter2".to_string(),
    };

    let rendered = format!("{admin:?}");
    assert!(rendered.contains("admin@example.org"));
    assert!(!rendered.contains("hunter2hunter2"));
}

#[test]
fn test_policy_names_round_trip_through_serde() {
    let policy: InvalidDatePolicy =
        serde::Deserialize::deserialize(serde::de::value::StrDeserializer::<
            serde::de::value::Error,
        >::new("clamp_to_month_end"))
        .expect("known policy");
    assert_eq!(policy, InvalidDatePolicy::ClampToMonthEnd);

    let overflow: OrdinalOverflow = serde::Deserialize::deserialize(
        serde::de::value::StrDeserializer::<serde::de::value::Error>::new("skip_outside_month"),
    )
    .expect("known policy");
    assert_eq!(overflow, OrdinalOverflow::SkipOutsideMonth);
}
