use rowan::{TextRange, TextSize};

use super::nodes::{ExprNode, NodeArena, StaleNode};
use super::types::Constant;

fn node(v: i32) -> ExprNode {
    ExprNode::constant(Constant::Int(v), TextRange::empty(TextSize::from(0)))
}

#[test]
fn create_and_get() {
    let mut arena = NodeArena::new();
    let a = arena.create(node(1));
    let b = arena.create(node(2));

    assert_eq!(arena.get(a).unwrap().as_constant(), Some(Constant::Int(1)));
    assert_eq!(arena.get(b).unwrap().as_constant(), Some(Constant::Int(2)));
    assert_eq!(arena.live_count(), 2);
}

#[test]
fn take_releases() {
    let mut arena = NodeArena::new();
    let a = arena.create(node(7));

    let taken = arena.take(a).unwrap();

    assert_eq!(taken.as_constant(), Some(Constant::Int(7)));
    assert_eq!(arena.live_count(), 0);
    assert!(arena.get(a).is_err());
}

#[test]
fn stale_handle_does_not_alias_reused_slot() {
    let mut arena = NodeArena::new();
    let old = arena.create(node(1));
    arena.release(old).unwrap();
    let new = arena.create(node(2));

    assert_ne!(old, new);
    assert!(matches!(arena.get(old), Err(StaleNode { index: 0, generation: 0 })));
    assert_eq!(arena.get(new).unwrap().as_constant(), Some(Constant::Int(2)));
}

#[test]
fn double_release_is_an_error() {
    let mut arena = NodeArena::new();
    let a = arena.create(node(1));

    arena.release(a).unwrap();

    assert!(arena.release(a).is_err());
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn release_all_invalidates_everything() {
    let mut arena = NodeArena::new();
    let ids: Vec<_> = (0..4).map(|v| arena.create(node(v))).collect();
    arena.release(ids[1]).unwrap();

    assert_eq!(arena.release_all(), 3);
    assert_eq!(arena.live_count(), 0);
    for id in ids {
        assert!(arena.get(id).is_err());
    }

    let fresh = arena.create(node(9));
    assert_eq!(arena.get(fresh).unwrap().as_constant(), Some(Constant::Int(9)));
}
