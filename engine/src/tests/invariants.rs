use proptest::prelude::*;

use crate::config::SimConfig;
use crate::mem::PGSIZE_2M;
use crate::mem::replace::ReplacementPolicy;
use crate::mem::space::AccessKind;
use crate::pattern::AccessPattern;
use crate::sim::Machine;
use crate::strategy::MappingStrategy;

fn pattern() -> impl Strategy<Value = AccessPattern> {
    prop_oneof![
        Just(AccessPattern::Sequential),
        Just(AccessPattern::Random),
        Just(AccessPattern::Localized),
    ]
}

fn mapping() -> impl Strategy<Value = MappingStrategy> {
    prop_oneof![
        Just(MappingStrategy::Demand),
        Just(MappingStrategy::Prefetch),
        Just(MappingStrategy::Streaming),
    ]
}

fn policy() -> impl Strategy<Value = ReplacementPolicy> {
    prop_oneof![
        Just(ReplacementPolicy::Random),
        Just(ReplacementPolicy::Fifo),
        Just(ReplacementPolicy::Lru),
    ]
}

prop_compose! {
    fn small_configs()(
        seed in any::<u64>(),
        pattern in pattern(),
        strategy in mapping(),
        eviction in policy(),
        tlb_replacement in policy(),
        physical_mb in 2u64..=16,
        tlb_capacity in 1usize..=8,
        write_ratio in 0.0f64..=1.0
    ) -> SimConfig {
        SimConfig {
            eviction_policy: eviction,
            tlb_replacement,
            tlb_capacity,
            locality_window: 8,
            ..SimConfig::default()
                .with_sizes(64, physical_mb, PGSIZE_2M)
                .with_pattern(pattern)
                .with_strategy(strategy)
                .with_seed(seed)
                .with_steps(40, 10)
                .with_write_ratio(write_ratio)
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn structures_agree_after_every_step(config in small_configs()) {
        let frames = config.validate().unwrap().num_physical_frames;
        let mut machine = Machine::new(config).unwrap();
        let mut last = machine.metrics();
        while machine.step().is_some() {
            if let Err(violation) = machine.check_invariants() {
                return Err(TestCaseError::fail(violation.to_string()));
            }
            let metrics = machine.metrics();
            prop_assert!(metrics.page_faults >= last.page_faults);
            prop_assert!(metrics.memory_access_time >= last.memory_access_time);
            prop_assert_eq!(metrics.tlb_hits + metrics.tlb_misses, metrics.accesses);
            prop_assert!(machine.space().frames().allocated_count() <= frames);
            last = metrics;
        }
        prop_assert_eq!(last.accesses, 400);
        prop_assert!(last.writebacks <= last.evictions);
    }

    #[test]
    fn faults_match_absent_accesses(
        config in small_configs(),
        vpns in proptest::collection::vec(0usize..32, 1..200),
        writes in proptest::collection::vec(any::<bool>(), 200),
    ) {
        let mut machine = Machine::new(config).unwrap();
        let mut absent = 0;
        for (vpn, write) in vpns.into_iter().zip(writes) {
            if !machine.space().is_present(vpn) {
                absent += 1;
            }
            let kind = if write { AccessKind::Write } else { AccessKind::Read };
            let outcome = machine.access(vpn, kind);
            prop_assert!(outcome.is_some());
            prop_assert!(machine.space().is_present(vpn));
            prop_assert_eq!(machine.metrics().page_faults, absent);
        }
        prop_assert!(machine.check_invariants().is_ok());
    }
}
