//! Property-based tests for key identifiers and duration policies.
//!
//! Properties that must hold for every input:
//! - Generated identifiers are `PREFIX-` followed by 16 alphanumerics
//! - Prefix normalization is idempotent and always uppercase
//! - Random policies only ever yield 6, 12 or 24 hours
//! - Expiry is exactly activation + duration

use chrono::{DateTime, Duration, TimeZone, Utc};
use keygate_core::{
    expiry_after, DurationHours, DurationPolicy, KeyId, KeyPrefix, KEY_SUFFIX_LEN,
    MAX_DURATION_HOURS, RANDOM_DURATION_CHOICES,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn prefix_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_]{1,32}").unwrap()
}

fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 .. 2100-01-01
    (946_684_800i64..4_102_444_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

proptest! {
    #[test]
    fn generated_ids_have_expected_shape(raw in prefix_strategy(), seed in any::<u64>()) {
        let prefix = KeyPrefix::new(raw.clone()).unwrap();
        let id = KeyId::generate(&prefix, &mut StdRng::seed_from_u64(seed));
        let expected_head = format!("{}-", raw.to_uppercase());
        prop_assert!(id.as_str().starts_with(&expected_head));
        let suffix = &id.as_str()[expected_head.len()..];
        prop_assert_eq!(suffix.len(), KEY_SUFFIX_LEN);
        prop_assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn prefix_normalization_is_idempotent(raw in prefix_strategy()) {
        let once = KeyPrefix::new(raw).unwrap();
        let twice = KeyPrefix::new(once.as_str()).unwrap();
        prop_assert_eq!(once.as_str(), twice.as_str());
        prop_assert_eq!(once.as_str().to_uppercase(), once.as_str());
    }

    #[test]
    fn random_policy_stays_in_candidate_set(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let hours = DurationPolicy::Random.resolve(&mut rng).get();
        prop_assert!(RANDOM_DURATION_CHOICES.contains(&hours));
    }

    #[test]
    fn expiry_is_activation_plus_duration(
        at in instant_strategy(),
        hours in 1u32..=MAX_DURATION_HOURS,
    ) {
        let d = DurationHours::new(hours).unwrap();
        let exp = expiry_after(at, d).unwrap();
        prop_assert_eq!(exp - at, Duration::hours(i64::from(hours)));
    }

    #[test]
    fn fixed_policy_text_roundtrips(hours in 1u32..=MAX_DURATION_HOURS) {
        let policy: DurationPolicy = hours.to_string().parse().unwrap();
        prop_assert_eq!(policy, DurationPolicy::Fixed(DurationHours::new(hours).unwrap()));
        prop_assert_eq!(policy.to_string(), hours.to_string());
    }
}
