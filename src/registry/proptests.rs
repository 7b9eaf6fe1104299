//! Property-based tests for seat accounting

use super::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum RegistryOp {
    Claim(usize),
    ClaimUnknown,
    Release(usize, u32),
}

fn arb_op(drivers: usize) -> impl Strategy<Value = RegistryOp> {
    prop_oneof![
        6 => (0..drivers).prop_map(RegistryOp::Claim),
        1 => Just(RegistryOp::ClaimUnknown),
        1 => (0..drivers, 1u32..4).prop_map(|(i, n)| RegistryOp::Release(i, n)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Successful claims never exceed the seat count, and each success
    // reports total minus successes so far
    #[test]
    fn prop_claims_never_exceed_seats(seats in 1u32..10, attempts in 0usize..30) {
        let registry = DriverRegistry::new();
        let driver = registry.register_driver("Ivan", seats).unwrap();
        let mut successes = 0u32;

        for _ in 0..attempts {
            match registry.claim_seat(&DriverRef::Id(driver.id)) {
                Ok(claim) => {
                    successes += 1;
                    prop_assert_eq!(claim.remaining_seats, seats - successes);
                }
                Err(e) => {
                    prop_assert_eq!(e, RegistryError::SeatsExhausted("Ivan".to_string()));
                    prop_assert_eq!(successes, seats);
                }
            }
        }

        prop_assert!(successes <= seats);
        let stored = registry.get(&driver.id).unwrap();
        prop_assert_eq!(stored.remaining_seats, seats - successes);
    }

    // 0 <= remaining <= total for every driver after any operation sequence
    #[test]
    fn prop_remaining_stays_in_bounds(
        seats in proptest::collection::vec(1u32..5, 1..4),
        ops in proptest::collection::vec(arb_op(4), 0..40),
    ) {
        let registry = DriverRegistry::new();
        let ids: Vec<DriverId> = seats
            .iter()
            .enumerate()
            .map(|(i, &n)| registry.register_driver(&format!("driver-{i}"), n).unwrap().id)
            .collect();

        for op in ops {
            match op {
                RegistryOp::Claim(i) => {
                    let _ = registry.claim_seat(&DriverRef::Id(ids[i % ids.len()]));
                }
                RegistryOp::ClaimUnknown => {
                    let result = registry.claim_seat(&DriverRef::Name("nobody".to_string()));
                    prop_assert!(matches!(result, Err(RegistryError::DriverNotFound(_))));
                }
                RegistryOp::Release(i, n) => {
                    registry.release_seats(&ids[i % ids.len()], n).unwrap();
                }
            }

            for driver in registry.drivers() {
                prop_assert!(driver.remaining_seats <= driver.total_seats);
            }
        }
    }

    // Listings only ever offer drivers with free seats, in registration order
    #[test]
    fn prop_listing_offers_only_free_drivers(
        seats in proptest::collection::vec(1u32..4, 0..6),
        claims in proptest::collection::vec(0usize..6, 0..20),
    ) {
        let registry = DriverRegistry::new();
        let ids: Vec<DriverId> = seats
            .iter()
            .enumerate()
            .map(|(i, &n)| registry.register_driver(&format!("driver-{i}"), n).unwrap().id)
            .collect();

        if !ids.is_empty() {
            for i in claims {
                let _ = registry.claim_seat(&DriverRef::Id(ids[i % ids.len()]));
            }
        }

        let listing = registry.list_available_drivers();
        prop_assert!(listing.iter().all(|l| l.remaining_seats > 0));

        let expected: Vec<DriverId> = registry
            .drivers()
            .iter()
            .filter(|d| d.has_seats())
            .map(|d| d.id)
            .collect();
        let listed: Vec<DriverId> = listing.iter().map(|l| l.id).collect();
        prop_assert_eq!(listed, expected);
    }
}
