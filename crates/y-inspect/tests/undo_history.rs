use proptest::prelude::*;
use y_inspect::{
    encode_update, id, DeleteSet, Id, Inspector, Item, ItemContent, Origin, Parent, Record,
};

#[derive(Debug, Clone)]
enum Action {
    Type(u64),
    Delete(prop::sample::Index),
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (1u64..4).prop_map(Action::Type),
        any::<prop::sample::Index>().prop_map(Action::Delete),
    ]
}

fn typed(clock: u64, len: u64) -> Record {
    let origin = clock.checked_sub(1).map(|c| id(1, c));
    Record::Item(Item {
        id: id(1, clock),
        origin,
        right_origin: None,
        parent: origin.is_none().then(|| Parent::Root("t".into())),
        parent_sub: None,
        has_parent_sub: false,
        content: ItemContent::String("a".repeat(len as usize)),
    })
}

fn deletion(target: Id) -> Vec<u8> {
    let ds: DeleteSet = [(target, 1)].into_iter().collect();
    encode_update(&[], &ds)
}

/// A remote baseline "aaa" with its middle slot deleted. Remote updates are
/// not part of the undo history.
fn baseline() -> Inspector {
    let mut inspector = Inspector::default();
    let ds: DeleteSet = [(id(1, 1), 1)].into_iter().collect();
    inspector
        .on_update(&encode_update(&[typed(0, 3)], &ds), Origin::Remote)
        .unwrap();
    assert!(!inspector.can_undo());
    inspector
}

proptest! {
    #[test]
    fn undo_tombstones_insertions_and_redo_restores(actions in prop::collection::vec(arb_action(), 1..12)) {
        let mut inspector = baseline();
        let pre = inspector.current_delete_set().clone();
        let mut visible = vec![0u64, 2];
        let mut next = 3;
        let mut inserted = DeleteSet::new();
        let mut count = 0;

        for action in actions {
            match action {
                Action::Type(len) => {
                    let update = encode_update(&[typed(next, len)], &DeleteSet::new());
                    inspector.on_update(&update, Origin::Local).unwrap();
                    inserted.insert(id(1, next), len);
                    visible.extend(next..next + len);
                    next += len;
                }
                Action::Delete(pick) => {
                    if visible.is_empty() {
                        continue;
                    }
                    let clock = visible.remove(pick.index(visible.len()));
                    inspector.on_update(&deletion(id(1, clock)), Origin::Local).unwrap();
                }
            }
            count += 1;
        }
        let after = inspector.current_delete_set().clone();
        prop_assert_eq!(inspector.undo_stack().len(), count);

        for _ in 0..count {
            prop_assert!(inspector.undo().is_some());
        }
        prop_assert!(inspector.undo().is_none());
        prop_assert_eq!(inspector.current_delete_set(), &pre.merge(&inserted));

        for _ in 0..count {
            prop_assert!(inspector.redo().is_some());
        }
        prop_assert!(inspector.redo().is_none());
        prop_assert_eq!(inspector.current_delete_set(), &after);
    }
}

#[test]
fn deletion_only_history_returns_to_baseline() {
    let mut inspector = baseline();
    let pre = inspector.current_delete_set().clone();
    inspector.on_update(&deletion(id(1, 0)), Origin::Local).unwrap();
    inspector.on_update(&deletion(id(1, 2)), Origin::Local).unwrap();
    assert!(inspector.is_deleted(id(1, 0)));

    inspector.undo().unwrap();
    inspector.undo().unwrap();
    assert_eq!(inspector.current_delete_set(), &pre);
    assert!(!inspector.is_deleted(id(1, 0)));
    assert!(inspector.is_deleted(id(1, 1)));
}

#[test]
fn new_action_after_undo_discards_redo() {
    let mut inspector = baseline();
    inspector
        .on_update(&encode_update(&[typed(3, 1)], &DeleteSet::new()), Origin::Local)
        .unwrap();
    inspector.undo().unwrap();
    assert!(inspector.can_redo());

    inspector.on_update(&deletion(id(1, 0)), Origin::Local).unwrap();
    assert!(!inspector.can_redo());
    assert_eq!(inspector.undo_stack().len(), 1);
}
