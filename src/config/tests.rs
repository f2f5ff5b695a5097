use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const ALL_VARS: &[&str] = &[
    "RESEMBLE_QUERY",
    "RESEMBLE_TOP_K",
    "RESEMBLE_CACHE_CAPACITY",
    "RESEMBLE_UNIT_CONCURRENCY",
    "RESEMBLE_DECISION_RULE",
    "RESEMBLE_DISTANCE_LOW",
    "RESEMBLE_DISTANCE_HIGH",
    "RESEMBLE_YES_THRESHOLD",
    "RESEMBLE_EMBEDDING_URL",
    "RESEMBLE_RELATED_URL",
    "RESEMBLE_GENERATIVE_URL",
    "RESEMBLE_EMBEDDING_LAUNCH_CMD",
    "RESEMBLE_RELATED_LAUNCH_CMD",
    "RESEMBLE_GENERATIVE_LAUNCH_CMD",
    "RESEMBLE_CORPUS_PATH",
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

fn clear_resemble_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for key in ALL_VARS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.query.is_none());
    assert_eq!(config.top_k, 1000);
    assert_eq!(config.cache_capacity, 1000);
    assert_eq!(config.unit_concurrency, 4);
    assert_eq!(config.decision_rule, DecisionRuleKind::Ternary);
    assert_eq!(config.distance_low, 0.2);
    assert_eq!(config.distance_high, 0.8);
    assert_eq!(config.yes_threshold, 0.5932);
    assert_eq!(config.embedding_url, "http://127.0.0.1:7860");
    assert_eq!(config.related_url, "http://127.0.0.1:7871");
    assert_eq!(config.generative_url, "http://127.0.0.1:7878");
    assert!(config.corpus_path.is_none());
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_resemble_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.top_k, 1000);
    assert_eq!(config.decision_rule, DecisionRuleKind::Ternary);
    assert!(config.embedding_launch_cmd.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_full_config_parse() {
    clear_resemble_env();

    with_env_vars(
        &[
            ("RESEMBLE_QUERY", "sort a list"),
            ("RESEMBLE_TOP_K", "25"),
            ("RESEMBLE_CACHE_CAPACITY", "64"),
            ("RESEMBLE_UNIT_CONCURRENCY", "8"),
            ("RESEMBLE_DECISION_RULE", "Distance"),
            ("RESEMBLE_DISTANCE_LOW", "0.1"),
            ("RESEMBLE_DISTANCE_HIGH", "0.9"),
            ("RESEMBLE_YES_THRESHOLD", "0.75"),
            ("RESEMBLE_EMBEDDING_URL", "http://models:9000"),
            ("RESEMBLE_GENERATIVE_LAUNCH_CMD", "  llama-server --port 7878  "),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.require_query().expect("query"), "sort a list");
            assert_eq!(config.top_k, 25);
            assert_eq!(config.cache_capacity, 64);
            assert_eq!(config.unit_concurrency, 8);
            assert_eq!(config.decision_rule, DecisionRuleKind::Distance);
            assert_eq!(config.distance_low, 0.1);
            assert_eq!(config.distance_high, 0.9);
            assert_eq!(config.yes_threshold, 0.75);
            assert_eq!(config.embedding_url, "http://models:9000");
            assert_eq!(
                config.launch_command(ModelKind::Generative),
                Some("llama-server --port 7878")
            );
            assert_eq!(config.launch_command(ModelKind::Embedding), None);
        },
    );
}

#[test]
#[serial]
fn test_from_env_invalid_number() {
    clear_resemble_env();

    with_env_vars(&[("RESEMBLE_TOP_K", "lots")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                name: "RESEMBLE_TOP_K",
                ..
            }
        ));
        assert!(err.to_string().contains("lots"));
    });
}

#[test]
#[serial]
fn test_from_env_invalid_decision_rule() {
    clear_resemble_env();

    with_env_vars(&[("RESEMBLE_DECISION_RULE", "vibes")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDecisionRule { .. }));
    });
}

#[test]
#[serial]
fn test_blank_query_is_missing() {
    clear_resemble_env();

    with_env_vars(&[("RESEMBLE_QUERY", "   ")], || {
        let config = Config::from_env().expect("should parse");
        let err = config.require_query().unwrap_err();
        assert!(err.to_string().contains("RESEMBLE_QUERY"));
    });
}

#[test]
fn test_validate_rejects_zero_sizes() {
    for config in [
        Config {
            top_k: 0,
            ..Default::default()
        },
        Config {
            cache_capacity: 0,
            ..Default::default()
        },
        Config {
            unit_concurrency: 0,
            ..Default::default()
        },
    ] {
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));
    }
}

#[test]
fn test_validate_threshold_ranges() {
    let inverted = Config {
        distance_low: 0.9,
        distance_high: 0.1,
        ..Default::default()
    };
    assert!(matches!(inverted.validate(), Err(ConfigError::OutOfRange { .. })));

    let single = Config {
        distance_low: 0.5,
        distance_high: 0.5,
        ..Default::default()
    };
    assert!(single.validate().is_ok());

    let bad_probability = Config {
        yes_threshold: 1.5,
        ..Default::default()
    };
    assert!(matches!(
        bad_probability.validate(),
        Err(ConfigError::OutOfRange { .. })
    ));
}

#[test]
fn test_validate_corpus_path() {
    let missing = Config {
        corpus_path: Some(PathBuf::from("/nonexistent/corpus.json")),
        ..Default::default()
    };
    assert!(matches!(
        missing.validate(),
        Err(ConfigError::PathNotFound { .. })
    ));

    let directory = Config {
        corpus_path: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
        ..Default::default()
    };
    assert!(matches!(directory.validate(), Err(ConfigError::NotAFile { .. })));

    let file = Config {
        corpus_path: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")),
        ..Default::default()
    };
    assert!(file.validate().is_ok());
}

#[test]
fn test_decision_rule_mapping() {
    let ternary = Config::default().decision_rule();
    assert!(matches!(ternary, DecisionRule::Ternary { .. }));

    let distance = Config {
        decision_rule: DecisionRuleKind::Distance,
        distance_low: 0.3,
        distance_high: 0.6,
        ..Default::default()
    }
    .decision_rule();
    assert_eq!(
        distance,
        DecisionRule::DistanceThreshold {
            low: 0.3,
            high: 0.6
        }
    );
}

#[test]
fn test_gateway_config_uses_urls() {
    let config = Config {
        related_url: "http://related:1234/".to_string(),
        ..Default::default()
    };
    let gateway = config.gateway_config(ModelKind::Relatedness);
    assert_eq!(gateway.base_url, "http://related:1234");
    assert_eq!(gateway.call_url(), "http://related:1234/classify");
}

#[test]
fn test_pipeline_settings_from_config() {
    let config = Config {
        top_k: 7,
        yes_threshold: 0.6,
        ..Default::default()
    };
    let settings = config.pipeline_settings("find me");
    assert_eq!(settings.query, "find me");
    assert_eq!(settings.top_k, 7);
    assert_eq!(settings.yes_threshold, 0.6);
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = ConfigError::PathNotFound {
        path: PathBuf::from("/some/path"),
    };
    assert!(err.to_string().contains("/some/path"));

    let err = ConfigError::MissingEnvVar {
        name: "RESEMBLE_QUERY",
    };
    assert!(err.to_string().contains("RESEMBLE_QUERY"));
}
