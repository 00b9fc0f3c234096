//! Integration tests for the configuration system: validation, presets,
//! environment parsing and JSON persistence.

use super::*;
use crate::error::PradsortError;
use std::env;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_and_presets_valid() {
    assert!(SortConfig::default().validate().is_ok());
    assert!(SortConfig::performance_preset().validate().is_ok());
    assert!(SortConfig::memory_preset().validate().is_ok());
    assert!(SortConfig::balanced_preset().validate().is_ok());
    assert_eq!(SortConfig::balanced_preset(), SortConfig::default());
}

#[test]
fn test_preset_characteristics() {
    let perf = SortConfig::performance_preset();
    assert!(perf.affinity.cpu_binding);
    assert_eq!(perf.affinity.numa_binding, NumaBinding::HalfSplit);
    assert_eq!(perf.affinity.first_touch, FirstTouch::EveryPage);

    let mem = SortConfig::memory_preset();
    assert!(mem.bucket_count() < SortConfig::default().bucket_count());
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = SortConfig::default();
    config.digit_bits = 0;
    assert!(matches!(config.validate(), Err(PradsortError::Configuration { .. })));

    config.digit_bits = 17;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("digit_bits"));

    let mut config = SortConfig::default();
    config.affinity.numa_binding = NumaBinding::Threshold(0);
    assert!(config.validate().is_err());

    assert!(SortConfig::builder().digit_bits(20).build().is_err());
}

#[test]
fn test_env_initialization() {
    let prefix = "PRADSORT_CFGTEST_";
    env::set_var(format!("{}DIGIT_BITS", prefix), "11");
    env::set_var(format!("{}NUM_THREADS", prefix), "6");
    env::set_var(format!("{}CPU_BINDING", prefix), "yes");
    env::set_var(format!("{}NUMA_BINDING", prefix), "threshold:8");
    env::set_var(format!("{}FIRST_TOUCH", prefix), "element");

    let config = SortConfig::from_env_with_prefix(prefix).unwrap();
    assert_eq!(config.digit_bits, 11);
    assert_eq!(config.num_threads, 6);
    assert!(config.affinity.cpu_binding);
    assert_eq!(config.affinity.numa_binding, NumaBinding::Threshold(8));
    assert_eq!(config.affinity.first_touch, FirstTouch::EveryElement);
    assert!(!config.page_aligned_partitions);

    // Out-of-range values are rejected by validation
    env::set_var(format!("{}DIGIT_BITS", prefix), "32");
    assert!(SortConfig::from_env_with_prefix(prefix).is_err());

    for field in ["DIGIT_BITS", "NUM_THREADS", "CPU_BINDING", "NUMA_BINDING", "FIRST_TOUCH"] {
        env::remove_var(format!("{}{}", prefix, field));
    }
}

#[test]
fn test_env_unset_gives_defaults() {
    let config = SortConfig::from_env_with_prefix("PRADSORT_UNSET_PREFIX_").unwrap();
    assert_eq!(config, SortConfig::default());
}

#[test]
fn test_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sort.json");

    let config = SortConfig::performance_preset();
    config.save_to_file(&path).unwrap();
    let loaded = SortConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_invalid_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");

    fs::write(&path, "{ not json").unwrap();
    assert!(SortConfig::load_from_file(&path).is_err());

    let mut config = SortConfig::default();
    config.digit_bits = 40;
    fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
    assert!(SortConfig::load_from_file(&path).is_err());

    assert!(SortConfig::load_from_file(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_validation_error_display() {
    let err = ValidationError::new("digit_bits", "0", "too small").with_suggestion("8");
    let text = err.to_string();
    assert!(text.contains("digit_bits"));
    assert!(text.contains("Suggested values: 8"));
}

#[test]
fn test_parse_env_helpers() {
    env::set_var("PRADSORT_HELPER_NUM", " 42 ");
    env::set_var("PRADSORT_HELPER_BOOL", "On");
    assert_eq!(parse_env_var("PRADSORT_HELPER_NUM", 0usize), 42);
    assert!(parse_env_bool("PRADSORT_HELPER_BOOL", false));
    assert_eq!(parse_env_var("PRADSORT_HELPER_MISSING", 7u32), 7);
    env::remove_var("PRADSORT_HELPER_NUM");
    env::remove_var("PRADSORT_HELPER_BOOL");
}
