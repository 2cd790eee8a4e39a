use crate::{Interner, Symbol};

#[test]
fn intern_deduplicates() {
    let mut interner = Interner::new();

    let a = interner.intern("x");
    let b = interner.intern("x");
    let c = interner.intern("y");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.len(), 2);
}

#[test]
fn resolve_roundtrip() {
    let mut interner = Interner::new();

    let sym = interner.intern("counter");
    assert_eq!(interner.resolve(sym), "counter");
    assert_eq!(interner.try_resolve(sym), Some("counter"));
}

#[test]
fn get_does_not_intern() {
    let mut interner = Interner::new();
    interner.intern("a");

    assert!(interner.get("b").is_none());
    assert_eq!(interner.len(), 1);
    assert_eq!(interner.get("a"), Some(interner.intern("a")));
}

#[test]
fn symbols_follow_insertion_order() {
    let mut interner = Interner::new();

    let z = interner.intern("z");
    let a = interner.intern("a");

    assert!(z < a);
    let names: Vec<(Symbol, &str)> = interner.iter().collect();
    assert_eq!(names, vec![(z, "z"), (a, "a")]);
}
