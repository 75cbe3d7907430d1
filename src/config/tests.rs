use super::*;
use serial_test::serial;
use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

const ALL_VARS: [&str; 8] = [
    "M3SCORE_PORT",
    "M3SCORE_BIND_ADDR",
    "M3SCORE_MODEL_ID",
    "M3SCORE_MODEL_PATH",
    "M3SCORE_CACHE_DIR",
    "M3SCORE_USE_FP16",
    "M3SCORE_STUB",
    "M3SCORE_DOWNLOAD_PROGRESS",
];

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_m3score_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for key in ALL_VARS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 5000);
    assert_eq!(config.bind_addr, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
    assert_eq!(config.model_id, "BAAI/bge-m3");
    assert!(config.model_path.is_none());
    assert!(config.cache_dir.is_none());
    assert!(config.use_fp16);
    assert!(!config.stub);
    assert!(!config.download_progress);
}

#[test]
fn test_socket_addr() {
    let config = Config::default();
    assert_eq!(config.socket_addr(), "127.0.0.1:5000");

    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");

    let config = Config {
        bind_addr: IpAddr::V6(Ipv6Addr::LOCALHOST),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "[::1]:5000");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_m3score_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.port, 5000);
    assert_eq!(config.model_id, "BAAI/bge-m3");
    assert!(config.use_fp16);
}

#[test]
#[serial]
fn test_from_env_custom_port() {
    clear_m3score_env();

    with_env_vars(&[("M3SCORE_PORT", "3000")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.port, 3000);
    });
}

#[test]
#[serial]
fn test_from_env_ipv6_bind_addr() {
    clear_m3score_env();

    with_env_vars(&[("M3SCORE_BIND_ADDR", "::1")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.bind_addr, IpAddr::V6(Ipv6Addr::LOCALHOST));
    });
}

#[test]
#[serial]
fn test_from_env_model_settings() {
    clear_m3score_env();

    with_env_vars(
        &[
            ("M3SCORE_MODEL_ID", "org/bge-m3-finetune"),
            ("M3SCORE_MODEL_PATH", "/models/bge-m3"),
            ("M3SCORE_CACHE_DIR", "/var/cache/hf"),
            ("M3SCORE_USE_FP16", "false"),
            ("M3SCORE_STUB", "1"),
            ("M3SCORE_DOWNLOAD_PROGRESS", "yes"),
        ],
        || {
            let config = Config::from_env().expect("should parse");

            assert_eq!(config.model_id, "org/bge-m3-finetune");
            assert_eq!(config.model_path, Some(PathBuf::from("/models/bge-m3")));
            assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/hf")));
            assert!(!config.use_fp16);
            assert!(config.stub);
            assert!(config.download_progress);
        },
    );
}

#[test]
#[serial]
fn test_blank_values_fall_back_to_defaults() {
    clear_m3score_env();

    with_env_vars(
        &[
            ("M3SCORE_MODEL_ID", "  "),
            ("M3SCORE_MODEL_PATH", ""),
            ("M3SCORE_USE_FP16", ""),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.model_id, "BAAI/bge-m3");
            assert!(config.model_path.is_none());
            assert!(config.use_fp16);
        },
    );
}

#[test]
#[serial]
fn test_invalid_port_zero() {
    clear_m3score_env();

    with_env_vars(&[("M3SCORE_PORT", "0")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
        assert!(err.to_string().contains("invalid port"));
    });
}

#[test]
#[serial]
fn test_invalid_port_not_number() {
    clear_m3score_env();

    with_env_vars(&[("M3SCORE_PORT", "not_a_port")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_port_too_large() {
    clear_m3score_env();

    with_env_vars(&[("M3SCORE_PORT", "99999")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_bind_addr() {
    clear_m3score_env();

    with_env_vars(&[("M3SCORE_BIND_ADDR", "not.an.ip.address")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
        assert!(err.to_string().contains("failed to parse bind address"));
    });
}

#[test]
#[serial]
fn test_invalid_bool() {
    clear_m3score_env();

    with_env_vars(&[("M3SCORE_USE_FP16", "maybe")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidBool {
                name: "M3SCORE_USE_FP16",
                ..
            }
        ));
        assert!(err.to_string().contains("maybe"));
    });
}

#[test]
fn test_validate_nonexistent_model_path() {
    let config = Config {
        model_path: Some(PathBuf::from("/nonexistent/path/to/bge-m3")),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::PathNotFound { .. }));
}

#[test]
fn test_validate_model_path_is_file() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let config = Config {
        model_path: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::NotADirectory { .. }));
}

#[test]
fn test_validate_cache_dir_is_file() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let config = Config {
        cache_dir: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::NotADirectory { .. }));
}

#[test]
fn test_validate_success_with_valid_paths() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config {
        model_path: Some(dir.path().to_path_buf()),
        cache_dir: Some(dir.path().join("not-created-yet")),
        ..Default::default()
    };

    assert!(config.validate().is_ok());
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_m3_config_mirrors_settings() {
    let config = Config {
        model_id: "org/model".to_string(),
        model_path: Some(PathBuf::from("/models/bge-m3")),
        cache_dir: Some(PathBuf::from("/cache")),
        use_fp16: false,
        stub: true,
        download_progress: true,
        ..Default::default()
    };

    let m3 = config.m3_config();
    assert_eq!(m3.model_id, "org/model");
    assert_eq!(m3.model_dir, Some(PathBuf::from("/models/bge-m3")));
    assert_eq!(m3.cache_dir, Some(PathBuf::from("/cache")));
    assert!(!m3.use_fp16);
    assert!(m3.testing_stub);
    assert!(m3.download_progress);
}
