use printshelf_web::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: [&str; 7] = [
    "APP_ENV",
    "BIND_ADDR",
    "UPSTREAM_URL",
    "SESSION_COOKIE",
    "JWT_SECRET",
    "LANDING_ROUTE",
    "UPSTREAM_TIMEOUT_SECS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with a clean configuration environment and restores the previous values
/// afterwards, even if the test panics.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_requires_jwt_secret() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("UPSTREAM_URL", "http://api.internal:8000");
            }
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without JWT_SECRET"
    );
}

#[test]
#[serial]
fn test_app_config_production_loads_with_secrets() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("UPSTREAM_URL", "http://api.internal:8000");
            env::set_var("JWT_SECRET", "prod-secret");
            env::set_var("UPSTREAM_TIMEOUT_SECS", "15");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.jwt_secret.as_deref(), Some("prod-secret"));
    assert_eq!(config.upstream_timeout_secs, Some(15));
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "local");
            env::set_var("JWT_SECRET", "");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.upstream_url, "http://localhost:8000");
    assert_eq!(config.session_cookie, "authorization_key");
    assert_eq!(config.landing_route, "/home");
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    // An empty secret means unverified local mode.
    assert!(config.jwt_secret.is_none());
    assert!(config.upstream_timeout_secs.is_none());
}
