// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use deleg_core::{
    InterfaceId, Labels, Principal, RecordKind, Registry, RegistryError, RegistryEvent,
};

const OWNER: Principal = Principal::repeat(0x30);

fn name(s: &str) -> Labels {
    Labels::from_dotted(s).expect("valid name")
}

#[test]
fn unset_records_read_as_empty() {
    let registry = Registry::new(OWNER);
    let node = name("nobody.eth").namehash();
    assert!(registry.record(&node, &RecordKind::Contenthash).is_empty());
    assert_eq!(registry.addr(&node), None);
    assert_eq!(registry.text(&node, "url"), None);
    assert_eq!(registry.abi(&node, u64::MAX), None);
    assert_eq!(registry.record_version(&node), 0);
}

#[test]
fn every_kind_is_keyed_independently() {
    let mut registry = Registry::new(OWNER);
    let target = name("multi.eth");
    let kinds = [
        (RecordKind::addr(), vec![1; 20]),
        (RecordKind::Addr { coin_type: 0 }, b"bc1q-opaque".to_vec()),
        (RecordKind::Name, b"multi.eth".to_vec()),
        (RecordKind::Abi { content_type: 1 }, b"[]".to_vec()),
        (RecordKind::Pubkey, vec![9; 64]),
        (RecordKind::text("url"), b"https://multi".to_vec()),
        (RecordKind::text("avatar"), b"ipfs://x".to_vec()),
        (RecordKind::Contenthash, vec![0xe3, 0x01]),
        (
            RecordKind::DnsRecord {
                name: name("www.multi.eth").namehash(),
                resource: 1,
            },
            vec![127, 0, 0, 1],
        ),
        (RecordKind::DnsZonehash, vec![5; 32]),
        (
            RecordKind::Interface {
                interface_id: InterfaceId::from_u32(0x0102_0304),
            },
            vec![8; 20],
        ),
    ];
    for (kind, payload) in &kinds {
        registry.set_record(&target, kind, payload, OWNER).unwrap();
    }
    for (kind, payload) in &kinds {
        assert_eq!(&*registry.get_record(&target, kind), payload.as_slice(), "{kind}");
    }
    assert_eq!(registry.events().len(), kinds.len());
}

#[test]
fn empty_payload_unsets_and_still_emits() {
    let mut registry = Registry::new(OWNER);
    let target = name("gone.eth");
    registry
        .set_record(&target, &RecordKind::Contenthash, &[1, 2, 3], OWNER)
        .unwrap();
    registry
        .set_record(&target, &RecordKind::Contenthash, &[], OWNER)
        .unwrap();
    assert!(registry.get_record(&target, &RecordKind::Contenthash).is_empty());
    assert!(registry.store().is_empty());
    let last = &registry.events()[1].event;
    assert!(matches!(last, RegistryEvent::RecordChanged { payload, .. } if payload.is_empty()));
}

#[test]
fn abi_lookup_returns_lowest_matching_content_type() {
    let mut registry = Registry::new(OWNER);
    let target = name("abi.eth");
    let node = target.namehash();
    registry
        .set_record(&target, &RecordKind::Abi { content_type: 2 }, b"zlib", OWNER)
        .unwrap();
    registry
        .set_record(&target, &RecordKind::Abi { content_type: 8 }, b"uri", OWNER)
        .unwrap();

    let (ct, bytes) = registry.abi(&node, 0xff).unwrap();
    assert_eq!((ct, &*bytes), (2, &b"zlib"[..]));
    let (ct, _) = registry.abi(&node, 0x8).unwrap();
    assert_eq!(ct, 8);
    assert_eq!(registry.abi(&node, 0x1), None);
}

#[test]
fn invalid_payloads_leave_no_trace() {
    let mut registry = Registry::new(OWNER);
    let target = name("bad.eth");
    assert_eq!(
        registry.set_record(&target, &RecordKind::Abi { content_type: 6 }, b"x", OWNER),
        Err(RegistryError::InvalidContentType(6))
    );
    assert!(registry
        .set_record(&target, &RecordKind::addr(), &[1; 19], OWNER)
        .is_err());
    assert!(registry.events().is_empty());
    assert!(registry.store().is_empty());
}

#[test]
fn clearing_records_hides_older_versions() {
    let mut registry = Registry::new(OWNER);
    let target = name("clear.eth");
    let node = target.namehash();
    registry
        .set_record(&target, &RecordKind::text("k"), b"v1", OWNER)
        .unwrap();
    assert_eq!(registry.clear_records(&target, OWNER), Ok(1));
    assert_eq!(registry.record_version(&node), 1);
    assert_eq!(registry.text(&node, "k"), None);

    registry
        .set_record(&target, &RecordKind::text("k"), b"v2", OWNER)
        .unwrap();
    assert_eq!(registry.text(&node, "k").as_deref(), Some("v2"));
    assert!(matches!(
        registry.events()[1].event,
        RegistryEvent::VersionChanged { version: 1, .. }
    ));
}

#[test]
fn clearing_requires_authority() {
    let mut registry = Registry::new(OWNER);
    let stranger = Principal::repeat(0x31);
    assert!(matches!(
        registry.clear_records(&name("clear.eth"), stranger),
        Err(RegistryError::NotAuthorized { .. })
    ));
}

#[test]
fn each_request_gets_a_fresh_transaction_id() {
    let mut registry = Registry::new(OWNER);
    registry
        .set_record(&name("a.eth"), &RecordKind::Name, b"a", OWNER)
        .unwrap();
    let _ = registry.set_record(&name("a.eth"), &RecordKind::Name, b"a", Principal::repeat(1));
    registry
        .set_record(&name("b.eth"), &RecordKind::Name, b"b", OWNER)
        .unwrap();
    let txs: Vec<u64> = registry.events().iter().map(|e| e.tx.value()).collect();
    // The rejected request consumed id 2.
    assert_eq!(txs, vec![1, 3]);
}
