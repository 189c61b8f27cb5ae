//! End-to-end scenarios over the public API.

use pretty_assertions::assert_eq;
use smg_core::{
    consistency, prove_inequality, HasValueEdge, PointsToEdge, ReadResult, Smg, SmgObject,
    SmgObjectId, SmgValue, SmgValueId, TargetSpecifier,
};

/// Zero-fill a 256-bit object, write one 64-bit value at bit 24, then
/// overwrite bits [56, 120) with a second value. The first value must
/// vanish entirely and the zero fill must survive only outside the
/// written ranges.
#[test]
fn overlapping_writes_on_zero_filled_object() {
    let object = SmgObjectId(1);
    let smg = Smg::default()
        .copy_and_add_object(SmgObject::region(object, 256))
        .unwrap();
    let smg = smg
        .copy_and_add_value(SmgValue::new(SmgValueId(10), 0))
        .unwrap()
        .copy_and_add_value(SmgValue::new(SmgValueId(11), 0))
        .unwrap();

    let smg = smg.write_value(object, 0, 256, SmgValueId::ZERO).unwrap();
    let smg = smg.write_value(object, 24, 64, SmgValueId(10)).unwrap();
    let smg = smg.write_value(object, 56, 64, SmgValueId(11)).unwrap();

    assert_eq!(
        smg.has_value_edges(object),
        vec![
            HasValueEdge::new(SmgValueId::ZERO, 0, 24),
            HasValueEdge::new(SmgValueId(11), 56, 64),
            HasValueEdge::new(SmgValueId::ZERO, 120, 136),
        ]
    );

    // the leading and trailing bytes read back as zero
    let (smg, head) = smg.read_value(object, 0, 24).unwrap();
    assert_eq!(head, ReadResult::Value(SmgValueId::ZERO));
    let (smg, tail) = smg.read_value(object, 120, 16).unwrap();
    assert_eq!(tail, ReadResult::Value(SmgValueId::ZERO));
    let (smg, middle) = smg.read_value(object, 56, 64).unwrap();
    assert_eq!(middle, ReadResult::Value(SmgValueId(11)));

    assert!(consistency::verify(&smg).is_ok());
}

#[test]
fn invalidation_and_removal_visibility() {
    let object = SmgObjectId(1);
    let smg = Smg::default()
        .copy_and_add_object(SmgObject::region(object, 64))
        .unwrap();
    let smg = smg.write_value(object, 0, 64, SmgValueId::ZERO).unwrap();

    let invalidated = smg.copy_and_invalidate_object(object).unwrap();
    assert!(invalidated.contains_object(object));
    assert!(!invalidated.is_valid(object));
    assert!(invalidated.has_value_edges(object).is_empty());
    assert!(consistency::verify(&invalidated).is_ok());

    let removed = invalidated.copy_and_remove_object(object).unwrap();
    assert!(!removed.contains_object(object));
    assert!(consistency::verify(&removed).is_ok());

    // the original snapshot is untouched by either step
    assert!(smg.is_valid(object));
    assert_eq!(smg.has_value_edges(object).len(), 1);
}

#[test]
fn snapshots_share_structure_but_diverge_independently() {
    let a = SmgObjectId(1);
    let b = SmgObjectId(2);
    let base = Smg::default()
        .copy_and_add_object(SmgObject::region(a, 128))
        .unwrap()
        .copy_and_add_object(SmgObject::region(b, 128))
        .unwrap();

    let left = base.write_value(a, 0, 128, SmgValueId::ZERO).unwrap();
    let right = base.write_value(b, 0, 128, SmgValueId::ZERO).unwrap();

    assert!(left.has_value_edges(b).is_empty());
    assert!(right.has_value_edges(a).is_empty());
    assert_ne!(left, right);
    assert_eq!(base.has_value_edges(a).len() + base.has_value_edges(b).len(), 0);
}

#[test]
fn identical_operation_sequences_yield_equal_graphs() {
    let build = || {
        let object = SmgObjectId(1);
        let smg = Smg::default()
            .copy_and_add_object(SmgObject::region(object, 256))
            .unwrap();
        let (smg, v) = smg.copy_and_add_fresh_value();
        let smg = smg.write_value(object, 0, 256, SmgValueId::ZERO).unwrap();
        let smg = smg.write_value(object, 32, 64, v.id).unwrap();
        let (smg, _) = smg.read_value(object, 128, 64).unwrap();
        smg
    };
    assert_eq!(build(), build());
}

#[test]
fn linked_list_teardown_keeps_shared_tail() {
    // head -> node -> tail, plus an external pointer at the tail
    let head = SmgObjectId(1);
    let node = SmgObjectId(2);
    let tail = SmgObjectId(3);
    let external = SmgObjectId(4);
    let mut smg = Smg::default();
    for (id, bits) in [(head, 128), (node, 128), (tail, 128), (external, 64)] {
        smg = smg.copy_and_add_object(SmgObject::region(id, bits)).unwrap();
    }

    let mut pointers = Vec::new();
    for (vid, target) in [(10, node), (11, tail), (12, tail)] {
        let v = SmgValueId(vid);
        smg = smg
            .copy_and_add_value(SmgValue::new(v, 0))
            .unwrap()
            .copy_and_add_pt_edge(v, PointsToEdge::new(target, 0, TargetSpecifier::Region))
            .unwrap();
        pointers.push(v);
    }
    smg = smg.write_value(head, 0, 64, pointers[0]).unwrap(); // head -> node
    smg = smg.write_value(node, 0, 64, pointers[1]).unwrap(); // node -> tail
    smg = smg.write_value(external, 0, 64, pointers[2]).unwrap(); // external -> tail

    // removing node drags head along (head held the only pointer at node
    // and nothing points at head) but spares the shared tail
    let smg = smg.copy_and_remove_object_and_sub_smg(node).unwrap();

    assert!(!smg.contains_object(node));
    assert!(!smg.contains_object(head));
    assert!(smg.contains_object(tail));
    assert!(smg.contains_object(external));
    assert_eq!(smg.pointers_toward(tail), vec![(pointers[2], 1)]);
    assert!(consistency::verify(&smg).is_ok());
}

#[test]
fn inequality_over_a_small_heap() {
    let a = SmgObjectId(1);
    let b = SmgObjectId(2);
    let smg = Smg::default()
        .copy_and_add_object(SmgObject::region(a, 64))
        .unwrap()
        .copy_and_add_object(SmgObject::region(b, 64))
        .unwrap();
    let pa = SmgValueId(10);
    let pb = SmgValueId(11);
    let smg = smg
        .copy_and_add_value(SmgValue::new(pa, 0))
        .unwrap()
        .copy_and_add_pt_edge(pa, PointsToEdge::new(a, 0, TargetSpecifier::Region))
        .unwrap()
        .copy_and_add_value(SmgValue::new(pb, 0))
        .unwrap()
        .copy_and_add_pt_edge(pb, PointsToEdge::new(b, 0, TargetSpecifier::Region))
        .unwrap();

    assert!(prove_inequality(&smg, pa, pb));
    assert!(!prove_inequality(&smg, pa, pa));
    assert!(prove_inequality(&smg, pa, SmgValueId::ZERO));

    // once b is gone from the valid heap, the proof disappears with it
    let smg = smg.copy_and_invalidate_object(b).unwrap();
    assert!(!prove_inequality(&smg, pa, pb));
}
