//! Property-based tests for prompt debouncing

use promptmux::config::TimeoutConfig;
use promptmux::terminal::{Decision, Observation, PromptDebouncer};
use proptest::prelude::*;

const MATCH: Observation = Observation::Timeout { matched: true };

fn observation() -> impl Strategy<Value = Observation> {
    prop_oneof![
        Just(Observation::Line),
        any::<bool>().prop_map(|matched| Observation::Timeout { matched }),
    ]
}

fn timeouts(pattern_cycles: u32, safety_cycles: u32, ceiling: Option<u32>) -> TimeoutConfig {
    TimeoutConfig {
        pattern_cycles,
        safety_cycles,
        prompt_ceiling_cycles: ceiling,
        ..TimeoutConfig::default()
    }
}

proptest! {
    #[test]
    fn test_non_matching_cycle_resets_confirmations(
        pattern_cycles in 1u32..6,
        matches_before in 0u32..5,
    ) {
        let mut debouncer = PromptDebouncer::new(&timeouts(pattern_cycles, 100, None));
        for _ in 0..matches_before.min(pattern_cycles) {
            debouncer.observe(MATCH);
        }

        debouncer.observe(Observation::Timeout { matched: false });

        prop_assert_eq!(debouncer.confirmations(), 0);
    }

    #[test]
    fn test_accept_requires_consecutive_matches(
        pattern_cycles in 0u32..5,
        observations in prop::collection::vec(observation(), 0..60),
    ) {
        let mut debouncer = PromptDebouncer::new(&timeouts(pattern_cycles, 7, None));
        let needed = pattern_cycles as usize + 1;

        for (i, obs) in observations.iter().enumerate() {
            if debouncer.observe(*obs) == Decision::Accept {
                prop_assert!(i + 1 >= needed);
                let window = &observations[i + 1 - needed..=i];
                prop_assert!(
                    window.iter().all(|o| *o == MATCH),
                    "accepted after a non-matching observation"
                );
                break;
            }
        }
    }

    #[test]
    fn test_enough_matches_always_accept(
        pattern_cycles in 0u32..5,
        prefix in prop::collection::vec(observation(), 0..30),
    ) {
        let mut debouncer = PromptDebouncer::new(&timeouts(pattern_cycles, 7, None));
        let mut accepted = false;
        for obs in &prefix {
            if debouncer.observe(*obs) == Decision::Accept {
                accepted = true;
                break;
            }
        }
        if !accepted {
            for _ in 0..=pattern_cycles {
                if debouncer.observe(MATCH) == Decision::Accept {
                    accepted = true;
                    break;
                }
            }
        }
        prop_assert!(accepted);
    }

    #[test]
    fn test_no_give_up_without_ceiling(
        observations in prop::collection::vec(observation(), 0..200),
    ) {
        let mut debouncer = PromptDebouncer::new(&timeouts(2, 3, None));
        for obs in observations {
            let decision = debouncer.observe(obs);
            prop_assert_ne!(decision, Decision::GiveUp);
            if decision == Decision::Accept {
                break;
            }
        }
    }

    #[test]
    fn test_nudge_after_safety_cycles_of_misses(safety_cycles in 1u32..20) {
        let mut debouncer = PromptDebouncer::new(&timeouts(2, safety_cycles, None));
        for _ in 1..safety_cycles {
            prop_assert_eq!(
                debouncer.observe(Observation::Timeout { matched: false }),
                Decision::Continue
            );
        }
        prop_assert_eq!(
            debouncer.observe(Observation::Timeout { matched: false }),
            Decision::Nudge
        );
        prop_assert_eq!(debouncer.safety(), 0);
    }

    #[test]
    fn test_ceiling_bounds_timeout_cycles(
        ceiling in 1u32..40,
        observations in prop::collection::vec(observation(), 0..200),
    ) {
        let mut debouncer = PromptDebouncer::new(&timeouts(1000, 5, Some(ceiling)));
        let mut timeouts_seen = 0u32;
        for obs in observations {
            if matches!(obs, Observation::Timeout { .. }) {
                timeouts_seen += 1;
            }
            let decision = debouncer.observe(obs);
            if decision == Decision::GiveUp {
                prop_assert_eq!(timeouts_seen, ceiling);
                break;
            }
            prop_assert!(timeouts_seen < ceiling);
        }
    }
}
