use crate::config::SimConfig;
use crate::error::ConfigError;
use crate::mem::replace::ReplacementPolicy;
use crate::mem::{PGSIZE_1G, PGSIZE_2M, PGSIZE_4K};
use crate::pattern::AccessPattern;
use crate::strategy::MappingStrategy;

#[test]
fn default_layout() {
    let layout = SimConfig::default().validate().unwrap();
    assert_eq!(layout.page_size, PGSIZE_4K);
    assert_eq!(layout.num_virtual_pages, 1024);
    assert_eq!(layout.num_physical_frames, 256);
    assert_eq!(layout.tlb_capacity, 64);
}

#[test]
fn rejects_unsupported_page_size() {
    let config = SimConfig::default().with_sizes(4, 1, 8192);
    assert_eq!(config.validate(), Err(ConfigError::UnsupportedPageSize(8192)));
}

#[test]
fn rejects_zero_sizes() {
    let no_virtual = SimConfig::default().with_sizes(0, 1, PGSIZE_4K);
    assert!(matches!(no_virtual.validate(), Err(ConfigError::ZeroSize(_))));
    let no_physical = SimConfig::default().with_sizes(4, 0, PGSIZE_4K);
    assert!(matches!(no_physical.validate(), Err(ConfigError::ZeroSize(_))));
    let no_steps = SimConfig::default().with_steps(0, 10);
    assert!(matches!(no_steps.validate(), Err(ConfigError::ZeroSize("total steps"))));
    let no_batch = SimConfig::default().with_steps(10, 0);
    assert!(matches!(no_batch.validate(), Err(ConfigError::ZeroSize("batch size"))));
    let no_tlb = SimConfig { tlb_capacity: 0, ..SimConfig::default() };
    assert!(no_tlb.validate().is_err());
}

#[test]
fn pacing_bounds_are_inclusive() {
    assert_eq!(
        SimConfig::default().with_pacing_ms(49).validate(),
        Err(ConfigError::PacingOutOfRange(49))
    );
    assert_eq!(
        SimConfig::default().with_pacing_ms(1001).validate(),
        Err(ConfigError::PacingOutOfRange(1001))
    );
    assert!(SimConfig::default().with_pacing_ms(50).validate().is_ok());
    assert!(SimConfig::default().with_pacing_ms(1000).validate().is_ok());
}

#[test]
fn page_counts_are_clamped() {
    let huge = SimConfig::default().with_sizes(4096, 4096, PGSIZE_4K).validate().unwrap();
    assert_eq!(huge.num_virtual_pages, 1024);
    assert_eq!(huge.num_physical_frames, 4096);

    // a page larger than the whole space still yields one page
    let tiny = SimConfig::default().with_sizes(64, 8, PGSIZE_1G).validate().unwrap();
    assert_eq!(tiny.num_virtual_pages, 1);
    assert_eq!(tiny.num_physical_frames, 1);

    let mid = SimConfig::default().with_sizes(64, 8, PGSIZE_2M).validate().unwrap();
    assert_eq!(mid.num_virtual_pages, 32);
    assert_eq!(mid.num_physical_frames, 4);
}

#[test]
fn write_ratio_must_be_a_probability() {
    assert!(SimConfig::default().with_write_ratio(0.0).validate().is_ok());
    assert!(SimConfig::default().with_write_ratio(1.0).validate().is_ok());
    let err = SimConfig::default().with_write_ratio(1.5).validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidParameter { field: "write_ratio", .. }));
    assert!(SimConfig::default().with_write_ratio(f64::NAN).validate().is_err());
}

#[test]
fn parses_ui_field_names() {
    let json = r#"{
        "virtualAddressSpaceSizeMB": 16,
        "physicalMemorySizeMB": 2,
        "pageSizeBytes": 4096,
        "mappingStrategy": "prefetch",
        "accessPattern": "localized",
        "stepPacingMs": 200,
        "seed": 7
    }"#;
    let config: SimConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.virtual_space_mb, 16);
    assert_eq!(config.physical_memory_mb, 2);
    assert_eq!(config.mapping_strategy, MappingStrategy::Prefetch);
    assert_eq!(config.access_pattern, AccessPattern::Localized);
    assert_eq!(config.step_pacing_ms, 200);
    assert_eq!(config.seed, 7);
    // unspecified fields keep their defaults
    assert_eq!(config.total_steps, 100);
    assert_eq!(config.eviction_policy, ReplacementPolicy::Random);

    let layout = config.validate().unwrap();
    assert_eq!(layout.num_virtual_pages, 1024);
    assert_eq!(layout.num_physical_frames, 512);
}

#[test]
fn parses_snake_case_and_round_trips() {
    let config = SimConfig::default()
        .with_strategy(MappingStrategy::Streaming)
        .with_eviction(ReplacementPolicy::Lru)
        .with_seed(99);
    let text = serde_json::to_string(&config).unwrap();
    assert!(text.contains("\"mapping_strategy\":\"streaming\""));
    assert!(text.contains("\"eviction_policy\":\"lru\""));
    let back: SimConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn variant_names_parse_case_insensitively() {
    assert_eq!("Sequential".parse::<AccessPattern>().unwrap(), AccessPattern::Sequential);
    assert_eq!("STREAMING".parse::<MappingStrategy>().unwrap(), MappingStrategy::Streaming);
    assert_eq!("Lru".parse::<ReplacementPolicy>().unwrap(), ReplacementPolicy::Lru);

    let err = "zigzag".parse::<AccessPattern>().unwrap_err();
    assert_eq!(err, ConfigError::UnknownVariant { kind: "access pattern", value: "zigzag".into() });
    assert_eq!(err.to_string(), "unknown access pattern 'zigzag'");
    assert!("lazy".parse::<MappingStrategy>().is_err());
    assert!("clock".parse::<ReplacementPolicy>().is_err());
}
