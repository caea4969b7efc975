// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use deleg_core::{decode_name, Decision, Labels, Principal, RecordKind, Registry};

const OWNER: Principal = Principal::repeat(0x40);
const DELEGATE: Principal = Principal::repeat(0x41);

// Small alphabet so generated names share suffixes often.
fn label() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "eth", "xyz"]).prop_map(str::to_owned)
}

fn labels(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(label(), 1..=max)
}

fn make(labels: &[String]) -> Labels {
    Labels::from_labels(labels).expect("generated labels are valid")
}

proptest! {
    #[test]
    fn authority_is_the_or_of_every_suffix(
        target in labels(5),
        grants in prop::collection::vec(labels(5), 0..4),
    ) {
        let mut registry = Registry::new(OWNER);
        let granted: Vec<Labels> = grants.iter().map(|g| make(g)).collect();
        for name in &granted {
            registry.approve(&name.to_wire(), DELEGATE, true, OWNER).unwrap();
        }

        let target = make(&target);
        let hierarchy = target.hierarchy();
        let expected = hierarchy
            .suffixes()
            .find(|(_, node)| granted.iter().any(|g| g.namehash() == *node));

        let auth = registry.authorize(&target, &DELEGATE);
        match expected {
            Some((offset, node)) => {
                prop_assert_eq!(auth.decision, Decision::Approved { offset });
                prop_assert_eq!(auth.decided_at, node);
            }
            None => prop_assert_eq!(auth.decision, Decision::Denied),
        }
        prop_assert_eq!(auth.node, target.namehash());

        // The owner is authorized regardless of approvals.
        prop_assert!(registry.authorize(&target, &OWNER).is_authorized());
    }

    #[test]
    fn write_succeeds_exactly_when_authorized(
        target in labels(4),
        grant in labels(3),
    ) {
        let mut registry = Registry::new(OWNER);
        registry.approve(&make(&grant).to_wire(), DELEGATE, true, OWNER).unwrap();
        let target = make(&target);
        let allowed = registry.authorize(&target, &DELEGATE).is_authorized();
        let before = registry.events().len();
        let res = registry.set_record(&target, &RecordKind::text("k"), b"v", DELEGATE);
        prop_assert_eq!(res.is_ok(), allowed);
        prop_assert_eq!(registry.events().len() - before, usize::from(allowed));
    }

    #[test]
    fn wire_names_round_trip(target in labels(6)) {
        let name = make(&target);
        prop_assert_eq!(decode_name(&name.to_wire()).unwrap(), name);
    }
}

#[test]
fn revoking_every_grant_restores_denial() {
    const SEED_BYTES: [u8; 32] = [
        0x44, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0,
    ];
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);

    let strategy = (labels(4), prop::collection::vec(labels(4), 1..4));
    runner
        .run(&strategy, |(target, grants)| {
            let mut registry = Registry::new(OWNER);
            for g in &grants {
                let wire = make(g).to_wire();
                registry.approve(&wire, DELEGATE, true, OWNER).unwrap();
            }
            for g in &grants {
                let wire = make(g).to_wire();
                registry.approve(&wire, DELEGATE, false, OWNER).unwrap();
            }
            let auth = registry.authorize(&make(&target), &DELEGATE);
            prop_assert_eq!(auth.decision, Decision::Denied);
            Ok(())
        })
        .expect("property holds");
}
