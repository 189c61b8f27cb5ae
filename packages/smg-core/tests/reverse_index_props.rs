//! Property tests: the derived occurrence indices must stay equal to a
//! from-scratch edge scan under arbitrary operation sequences, and field
//! writes must behave like writes.

use proptest::prelude::*;
use smg_core::{
    consistency, PointsToEdge, ReadResult, Smg, SmgObject, SmgObjectId, SmgValue, SmgValueId,
    TargetSpecifier,
};

const OBJECT_BITS: u64 = 128;

#[derive(Debug, Clone)]
enum Op {
    AddObject(u64),
    AddValue(u64),
    AddPointer { value: u64, target: u64 },
    Write { object: u64, offset: i64, size: u64, value: u64 },
    WriteZero { object: u64, offset: i64, size: u64 },
    Read { object: u64, offset: i64, size: u64 },
    Invalidate(u64),
    Remove(u64),
    RemoveSubSmg(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let object = 1u64..6;
    let value = 10u64..18;
    prop_oneof![
        object.clone().prop_map(Op::AddObject),
        value.clone().prop_map(Op::AddValue),
        (value.clone(), object.clone())
            .prop_map(|(value, target)| Op::AddPointer { value, target }),
        (object.clone(), 0i64..96, 8u64..32, value)
            .prop_map(|(object, offset, size, value)| Op::Write {
                object,
                offset,
                size,
                value
            }),
        (object.clone(), 0i64..96, 8u64..32)
            .prop_map(|(object, offset, size)| Op::WriteZero { object, offset, size }),
        (object.clone(), 0i64..96, 8u64..32)
            .prop_map(|(object, offset, size)| Op::Read { object, offset, size }),
        object.clone().prop_map(Op::Invalidate),
        object.clone().prop_map(Op::Remove),
        object.prop_map(Op::RemoveSubSmg),
    ]
}

/// Apply one operation, ignoring rejections (out-of-bounds requests,
/// writes into invalidated objects and the like are legitimate no-ops
/// for this property).
fn apply(smg: Smg, op: Op) -> Smg {
    match op {
        Op::AddObject(id) => smg
            .copy_and_add_object(SmgObject::region(SmgObjectId(id), OBJECT_BITS))
            .unwrap_or(smg),
        Op::AddValue(id) => smg
            .copy_and_add_value(SmgValue::new(SmgValueId(id), 0))
            .unwrap_or(smg),
        Op::AddPointer { value, target } => smg
            .copy_and_add_pt_edge(
                SmgValueId(value),
                PointsToEdge::new(SmgObjectId(target), 0, TargetSpecifier::Region),
            )
            .unwrap_or(smg),
        Op::Write {
            object,
            offset,
            size,
            value,
        } => smg
            .write_value(SmgObjectId(object), offset, size, SmgValueId(value))
            .unwrap_or(smg),
        Op::WriteZero {
            object,
            offset,
            size,
        } => smg
            .write_value(SmgObjectId(object), offset, size, SmgValueId::ZERO)
            .unwrap_or(smg),
        Op::Read {
            object,
            offset,
            size,
        } => match smg.read_value(SmgObjectId(object), offset, size) {
            Ok((next, _)) => next,
            Err(_) => smg,
        },
        Op::Invalidate(id) => smg
            .copy_and_invalidate_object(SmgObjectId(id))
            .unwrap_or(smg),
        Op::Remove(id) => smg.copy_and_remove_object(SmgObjectId(id)).unwrap_or(smg),
        Op::RemoveSubSmg(id) => smg
            .copy_and_remove_object_and_sub_smg(SmgObjectId(id))
            .unwrap_or(smg),
    }
}

proptest! {
    /// After any operation sequence, the full consistency audit holds —
    /// in particular both reverse indices equal a from-scratch scan.
    #[test]
    fn reverse_indices_stay_rederivable(ops in proptest::collection::vec(op_strategy(), 1..48)) {
        let mut smg = Smg::default();
        for op in ops {
            smg = apply(smg, op);
            prop_assert!(consistency::verify(&smg).is_ok());
        }
    }

    /// A write followed by a read of the same field returns the written
    /// value, for any in-bounds field.
    #[test]
    fn write_read_round_trip(offset in 0i64..96, size in 8u64..32) {
        let object = SmgObjectId(1);
        let value = SmgValueId(10);
        let smg = Smg::default()
            .copy_and_add_object(SmgObject::region(object, OBJECT_BITS))
            .unwrap()
            .copy_and_add_value(SmgValue::new(value, 0))
            .unwrap();
        let smg = smg.write_value(object, offset, size, value).unwrap();
        let (_, result) = smg.read_value(object, offset, size).unwrap();
        prop_assert_eq!(result, ReadResult::Value(value));
    }

    /// Writing the same value twice at the same field is content-equal
    /// to writing it once.
    #[test]
    fn double_write_is_idempotent(offset in 0i64..96, size in 8u64..32, zero in any::<bool>()) {
        let object = SmgObjectId(1);
        let value = if zero { SmgValueId::ZERO } else { SmgValueId(10) };
        let smg = Smg::default()
            .copy_and_add_object(SmgObject::region(object, OBJECT_BITS))
            .unwrap()
            .copy_and_add_value(SmgValue::new(SmgValueId(10), 0))
            .unwrap();
        let once = smg.write_value(object, offset, size, value).unwrap();
        let twice = once.write_value(object, offset, size, value).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// After zero-filling an object, any in-bounds sub-range reads zero.
    #[test]
    fn zero_fill_covers_all_subranges(offset in 0i64..96, size in 8u64..32) {
        let object = SmgObjectId(1);
        let smg = Smg::default()
            .copy_and_add_object(SmgObject::region(object, OBJECT_BITS))
            .unwrap();
        let smg = smg.write_value(object, 0, OBJECT_BITS, SmgValueId::ZERO).unwrap();
        let (_, result) = smg.read_value(object, offset, size).unwrap();
        prop_assert_eq!(result, ReadResult::Value(SmgValueId::ZERO));
    }

    /// Inequality is never provable between a value and itself.
    #[test]
    fn inequality_is_irreflexive(id in 0u64..20) {
        let object = SmgObjectId(1);
        let mut smg = Smg::default()
            .copy_and_add_object(SmgObject::region(object, OBJECT_BITS))
            .unwrap();
        let value = SmgValueId(id);
        if !smg.contains_value(value) {
            smg = smg.copy_and_add_value(SmgValue::new(value, 0)).unwrap();
        }
        prop_assert!(!smg_core::prove_inequality(&smg, value, value));
    }
}
