//! Cross-checks against `yrs`, the Rust port of the external implementation.

use y_inspect::{
    decode_state_vector, decode_update, encode_state_vector, encode_update, id, merge_updates,
    Inspector, ItemContent, Origin, Parent, Record, StateVector,
};
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::{Doc, GetString, Map, ReadTxn, Text, Transact, Update};

fn full_state(doc: &Doc) -> Vec<u8> {
    doc.transact()
        .encode_state_as_update_v1(&yrs::StateVector::default())
}

fn state_vector(doc: &Doc) -> Vec<u8> {
    doc.transact().state_vector().encode_v1()
}

fn apply(doc: &Doc, update: &[u8]) {
    let update = Update::decode_v1(update).unwrap();
    let mut txn = doc.transact_mut();
    let _ = txn.apply_update(update);
}

fn text_of(records: &[Record]) -> String {
    records
        .iter()
        .filter_map(Record::as_item)
        .filter_map(|item| match &item.content {
            ItemContent::String(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn single_replica_text_reencodes_bit_for_bit() {
    let doc = Doc::with_client_id(1);
    let text = doc.get_or_insert_text("t");
    {
        let mut txn = doc.transact_mut();
        text.insert(&mut txn, 0, "hello");
    }
    {
        let mut txn = doc.transact_mut();
        text.insert(&mut txn, 5, " world");
    }
    let bytes = full_state(&doc);
    let (records, ds) = decode_update(&bytes).unwrap();

    assert_eq!(text_of(&records), "hello world");
    assert!(ds.is_empty());
    let first = records[0].as_item().unwrap();
    assert_eq!(first.id, id(1, 0));
    assert_eq!(first.parent, Some(Parent::Root("t".into())));
    assert_eq!(encode_update(&records, &ds), bytes);
}

#[test]
fn single_replica_deletions_reencode_bit_for_bit() {
    let doc = Doc::with_client_id(1);
    let text = doc.get_or_insert_text("t");
    {
        let mut txn = doc.transact_mut();
        text.insert(&mut txn, 0, "hello world");
    }
    {
        let mut txn = doc.transact_mut();
        text.remove_range(&mut txn, 5, 6);
    }
    let bytes = full_state(&doc);
    let (records, ds) = decode_update(&bytes).unwrap();

    assert!(ds.is_deleted(id(1, 5)));
    assert!(ds.is_deleted(id(1, 10)));
    assert!(!ds.is_deleted(id(1, 4)));
    assert_eq!(encode_update(&records, &ds), bytes);
}

#[test]
fn single_replica_map_overwrite_reencodes_bit_for_bit() {
    let doc = Doc::with_client_id(1);
    let map = doc.get_or_insert_map("m");
    {
        let mut txn = doc.transact_mut();
        map.insert(&mut txn, "k", "x");
    }
    {
        let mut txn = doc.transact_mut();
        map.insert(&mut txn, "k", "y");
    }
    let bytes = full_state(&doc);
    let (records, ds) = decode_update(&bytes).unwrap();

    let overwrite = records
        .iter()
        .filter_map(Record::as_item)
        .find(|item| item.id == id(1, 1))
        .unwrap();
    assert!(overwrite.origin.is_some());
    assert!(overwrite.has_parent_sub);
    assert!(ds.is_deleted(id(1, 0)));
    assert_eq!(encode_update(&records, &ds), bytes);

    let mut inspector = Inspector::default();
    inspector.on_update(&bytes, Origin::Local).unwrap();
    assert_eq!(inspector.encoded_state(), &bytes[..]);
}

#[test]
fn state_vectors_match() {
    let doc = Doc::with_client_id(3);
    let text = doc.get_or_insert_text("t");
    {
        let mut txn = doc.transact_mut();
        text.insert(&mut txn, 0, "abc");
    }
    let sv = decode_state_vector(&state_vector(&doc)).unwrap();
    assert_eq!(sv.get(3), 3);

    let mut inspector = Inspector::default();
    inspector.on_update(&full_state(&doc), Origin::Local).unwrap();
    assert_eq!(inspector.current_state_vector(), &sv);
    assert_eq!(encode_state_vector(&sv), state_vector(&doc));
}

#[test]
fn map_overwrite_deletes_previous_entry() {
    let alice = Doc::with_client_id(1);
    let map = alice.get_or_insert_map("m");
    {
        let mut txn = alice.transact_mut();
        map.insert(&mut txn, "k", "x");
    }
    let bob = Doc::with_client_id(2);
    apply(&bob, &full_state(&alice));
    let bob_map = bob.get_or_insert_map("m");
    {
        let mut txn = bob.transact_mut();
        bob_map.insert(&mut txn, "k", "y");
    }

    let mut inspector = Inspector::default();
    inspector.on_update(&full_state(&bob), Origin::Remote).unwrap();
    assert!(inspector.is_deleted(id(1, 0)));
    assert!(!inspector.is_deleted(id(2, 0)));

    let expected: StateVector = [(1, 1), (2, 1)].into_iter().collect();
    assert_eq!(inspector.current_state_vector(), &expected);
    assert_eq!(decode_state_vector(&state_vector(&bob)).unwrap(), expected);

    let overwrite = inspector
        .current_structs()
        .iter()
        .filter_map(Record::as_item)
        .find(|item| item.id == id(2, 0))
        .unwrap();
    assert_eq!(overwrite.origin, Some(id(1, 0)));
}

#[test]
fn merged_concurrent_updates_converge_in_yrs() {
    let alice = Doc::with_client_id(1);
    let bob = Doc::with_client_id(2);
    for (doc, s) in [(&alice, "ab"), (&bob, "xy")] {
        let text = doc.get_or_insert_text("t");
        let mut txn = doc.transact_mut();
        text.insert(&mut txn, 0, s);
    }
    let updates = [full_state(&alice), full_state(&bob)];

    let reference = Doc::with_client_id(9);
    for update in &updates {
        apply(&reference, update);
    }
    let merged_doc = Doc::with_client_id(10);
    apply(&merged_doc, &merge_updates(&updates).unwrap());

    let expected = {
        let text = reference.get_or_insert_text("t");
        let txn = reference.transact();
        text.get_string(&txn)
    };
    let text = merged_doc.get_or_insert_text("t");
    let txn = merged_doc.transact();
    assert_eq!(text.get_string(&txn), expected);
    assert_eq!(expected.len(), 4);
}

#[test]
fn chains_follow_concurrent_inserts() {
    let alice = Doc::with_client_id(1);
    let text = alice.get_or_insert_text("t");
    {
        let mut txn = alice.transact_mut();
        text.insert(&mut txn, 0, "ac");
    }
    let bob = Doc::with_client_id(2);
    apply(&bob, &full_state(&alice));
    let bob_text = bob.get_or_insert_text("t");
    {
        let mut txn = bob.transact_mut();
        bob_text.insert(&mut txn, 1, "b");
    }

    let mut inspector = Inspector::default();
    inspector.on_update(&full_state(&bob), Origin::Local).unwrap();
    let chains = inspector.group_into_chains();
    assert_eq!(chains.len(), 1);
    let ids: Vec<_> = chains[0].iter().map(Record::id).collect();
    // "b" hangs below both halves of the split "ac".
    assert_eq!(ids.iter().filter(|&&i| i == id(2, 0)).count(), 2);
    assert!(ids.contains(&id(1, 1)));
}
