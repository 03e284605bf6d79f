// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

#[test]
fn within_window_succeeds() {
    let sentry = RecursionSentry::with_base(1_000_000, DEFAULT_WINDOW_BITS);
    assert!(sentry.check(1_000_500).is_ok());
}

#[test]
fn outside_window_fails() {
    let sentry = RecursionSentry::with_base(0, DEFAULT_WINDOW_BITS);
    let err = sentry.check(1 << 21).unwrap_err();
    assert!(matches!(err, SentryError::AvertedStackOverflow { .. }));
}

#[test]
fn boundary_is_exclusive() {
    let sentry = RecursionSentry::with_base(0, DEFAULT_WINDOW_BITS);
    // exactly at the limit must fail ("any bit above the 20th set" == delta >= 2^20)
    assert!(sentry.check(1 << 20).is_err());
    assert!(sentry.check((1 << 20) - 1).is_ok());
}

#[test]
fn monotonic_in_delta() {
    let sentry = RecursionSentry::with_base(0, DEFAULT_WINDOW_BITS);
    let mut last_ok = true;
    for delta in (0..(1usize << 22)).step_by(4096) {
        let ok = sentry.check(delta).is_ok();
        // once it fails, it must never succeed again for a larger delta
        assert!(!(ok && !last_ok));
        last_ok = ok;
    }
}

#[test]
fn here_constructs_from_own_address() {
    let sentry = RecursionSentry::here();
    assert!(sentry.base() != 0);
}

mod sentry_proptest {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn check_fails_iff_delta_at_least_limit(
            base in 0u32..1_000_000,
            delta in 0u32..(1 << 24),
            window_bits in 10u32..24,
        ) {
            let base = base as usize;
            let current = base + delta as usize;
            let sentry = RecursionSentry::with_base(base, window_bits);
            let limit = 1u64 << window_bits;
            prop_assert_eq!(sentry.check(current).is_err(), u64::from(delta) >= limit);
        }

        /// §8: "Property: monotonic in `|a - b|`" — once a given delta trips
        /// the sentry, every larger delta from the same base must too.
        #[test]
        fn check_is_monotonic_in_delta(
            base in 0u32..1_000_000,
            d1 in 0u32..(1 << 24),
            extra in 0u32..(1 << 24),
        ) {
            let base = base as usize;
            let sentry = RecursionSentry::with_base(base, DEFAULT_WINDOW_BITS);
            let d2 = d1 + extra;
            let c1 = base + d1 as usize;
            let c2 = base + d2 as usize;
            if sentry.check(c1).is_err() {
                prop_assert!(sentry.check(c2).is_err());
            }
        }
    }
}
