use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;
use tandem_types::{Error, NodeId, ParticipantId, SiteId};

// ── SiteId ────────────────────────────────────────────────────────

#[test]
fn site_id_random_is_unique() {
    let a = SiteId::random();
    let b = SiteId::random();
    assert_ne!(a, b);
}

#[test]
fn site_id_from_str_and_string_agree() {
    let a = SiteId::from("alpha");
    let b = SiteId::from("alpha".to_string());
    let c = SiteId::new("alpha");
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.as_str(), "alpha");
    assert_eq!(a.to_string(), "alpha");
}

#[test]
fn site_id_orders_lexicographically() {
    assert!(SiteId::from("a") < SiteId::from("b"));
    assert!(SiteId::from("siteA") < SiteId::from("siteB"));
}

#[test]
fn site_id_serializes_as_plain_string() {
    let json = serde_json::to_string(&SiteId::from("a")).unwrap();
    assert_eq!(json, "\"a\"");
    let parsed: SiteId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, SiteId::from("a"));
}

// ── NodeId ────────────────────────────────────────────────────────

#[test]
fn node_id_orders_by_time_first() {
    let early = NodeId::new(1, "z");
    let late = NodeId::new(2, "a");
    assert!(early < late);
}

#[test]
fn node_id_tie_breaks_on_descending_site() {
    let a = NodeId::new(5, "a");
    let b = NodeId::new(5, "b");
    // The smaller site id sorts higher on a clock tie.
    assert!(a > b);
    assert!(b < a);
}

#[test]
fn node_id_equal_only_when_both_fields_match() {
    assert_eq!(NodeId::new(3, "a"), NodeId::new(3, "a"));
    assert_ne!(NodeId::new(3, "a"), NodeId::new(3, "b"));
    assert_ne!(NodeId::new(3, "a"), NodeId::new(4, "a"));
}

#[test]
fn node_id_hash_eq() {
    let mut set = HashSet::new();
    set.insert(NodeId::new(1, "a"));
    set.insert(NodeId::new(1, "a"));
    assert_eq!(set.len(), 1);
}

#[test]
fn node_id_display() {
    assert_eq!(NodeId::new(7, "site").to_string(), "7@site");
}

#[test]
fn node_id_serde_roundtrip() {
    let id = NodeId::new(42, "b");
    let json = serde_json::to_string(&id).unwrap();
    let parsed: NodeId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

proptest! {
    #[test]
    fn node_id_order_is_total_and_antisymmetric(
        t1 in 0u64..4,
        t2 in 0u64..4,
        s1 in "[a-c]",
        s2 in "[a-c]",
    ) {
        let a = NodeId::new(t1, s1.as_str());
        let b = NodeId::new(t2, s2.as_str());
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a == b, a.cmp(&b) == std::cmp::Ordering::Equal);
    }
}

// ── ParticipantId ─────────────────────────────────────────────────

#[test]
fn participant_id_new_is_unique() {
    assert_ne!(ParticipantId::new(), ParticipantId::new());
}

#[test]
fn participant_id_display_and_parse() {
    let id = ParticipantId::new();
    let parsed = ParticipantId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
    let from_str = ParticipantId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, from_str);
}

#[test]
fn participant_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::new_v4();
    assert_eq!(ParticipantId::from_uuid(uuid).as_uuid(), uuid);
}

#[test]
fn participant_id_parse_invalid() {
    assert!(ParticipantId::parse("not-a-uuid").is_err());
}

// ── Error ─────────────────────────────────────────────────────────

#[test]
fn index_error_message() {
    let err = Error::IndexOutOfBounds { index: 4, len: 2 };
    assert_eq!(
        err.to_string(),
        "index 4 out of bounds for sequence of length 2"
    );
}
