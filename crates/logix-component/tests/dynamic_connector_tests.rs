//! Dynamic connector behavior through the public API.
//!
//! Connectors are obtained the way callers get them: by wrapping a unit and
//! looking the slot up on the component.

use logix_component::{
    ComponentError, ConnectorError, DynamicConnector, Logic, LogicComponent, Pin, SlotList,
    SlotTable, Unit,
};
use logix_types::Value;
use std::sync::Arc;

/// A unit with one bounded dynamic input.
struct Bank {
    values: SlotList<i64>,
    min: usize,
    max: Option<usize>,
}

impl Unit for Bank {
    fn declare(&self, slots: &mut SlotTable) {
        slots.input_list("values", &self.values).bounds(self.min, self.max);
    }
}

impl Logic for Bank {
    fn logic(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}

fn bank(min: usize, max: Option<usize>) -> (LogicComponent, Arc<DynamicConnector>) {
    let component = LogicComponent::new(Bank {
        values: SlotList::new(),
        min,
        max,
    })
    .expect("valid unit");
    let connector = component
        .connectors()
        .connector("values")
        .expect("declared slot")
        .as_dynamic()
        .map(Arc::clone)
        .expect("dynamic slot");
    (component, connector)
}

fn values(connector: &DynamicConnector) -> Vec<Option<Value>> {
    connector.pins().iter().map(Pin::value).collect()
}

mod scenarios {
    use super::*;

    #[test]
    fn add_past_maximum() {
        let (_component, connector) = bank(0, Some(3));
        let indices: Vec<_> = (0..3)
            .map(|_| connector.add_pin().expect("below max").index())
            .collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);

        let err = connector.add_pin().expect_err("fourth add");
        assert!(matches!(err, ConnectorError::MaximumBoundExceeded { max: 3, .. }));
        assert_eq!(connector.size(), 3);
    }

    #[test]
    fn try_increase_twice() {
        let (_component, connector) = bank(0, Some(3));
        assert_eq!(connector.try_increase(5).len(), 3);
        assert!(connector.try_increase(5).is_empty());
        assert_eq!(connector.size(), 3);
    }

    #[test]
    fn bounds_two_to_five() {
        let (_component, connector) = bank(2, Some(5));
        assert_eq!(connector.size(), 2);

        assert!(matches!(
            connector.remove_pin(0),
            Err(ConnectorError::MinimumBoundExceeded { min: 2, .. })
        ));
        assert_eq!(connector.size(), 2);

        for _ in 0..3 {
            connector.add_pin().expect("below max");
        }
        assert!(matches!(
            connector.add_pin(),
            Err(ConnectorError::MaximumBoundExceeded { max: 5, .. })
        ));
        assert_eq!(connector.size(), 5);
        connector.verify_integrity().expect("intact");
    }

    #[test]
    fn new_pins_take_type_default() {
        let (_component, connector) = bank(1, None);
        let pin = connector.add_pin().expect("unbounded");
        assert_eq!(pin.value(), Some(Value::Int(0)));
        assert!(!pin.is_refreshed());
        assert_eq!(pin.refresh_count(), 0);
    }

    #[test]
    fn reset_discards_identities() {
        let (_component, connector) = bank(2, None);
        connector.try_increase(6);
        let old: Vec<_> = connector.pins().iter().map(Pin::uid).collect();
        let old_pins = connector.pins();

        let fresh = connector.reset();
        assert_eq!(fresh.len(), 2);
        assert!(fresh.iter().all(|p| !old.contains(&p.uid())));
        assert!(old_pins.iter().all(|p| p.index().is_none()));
    }
}

mod proptest_invariant {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Insert(usize),
        Remove(usize),
        TryIncrease(usize),
        Reset,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Add),
            3 => (0usize..10).prop_map(Op::Insert),
            3 => (0usize..10).prop_map(Op::Remove),
            1 => (0usize..10).prop_map(Op::TryIncrease),
            1 => Just(Op::Reset),
        ]
    }

    fn bounds_strategy() -> impl Strategy<Value = (usize, Option<usize>)> {
        (0usize..4, prop::option::of(0usize..6))
            .prop_map(|(min, extra)| (min, extra.map(|e| min + e)))
    }

    /// Writes a distinct marker into a fresh pin so shifts are observable.
    fn mark(pin: &Pin, model: &mut [i64], counter: &mut i64) {
        *counter += 1;
        pin.set_value(Some(Value::Int(*counter)))
            .expect("typed write");
        let index = pin.index().expect("live pin");
        model[index] = *counter;
    }

    proptest! {
        /// After every operation the pin sequence matches a plain Vec model,
        /// every pin carries its own position, and bounds hold.
        #[test]
        fn matches_vec_model(
            (min, max) in bounds_strategy(),
            ops in prop::collection::vec(op_strategy(), 0..60),
        ) {
            let (_component, connector) = bank(min, max);
            let cap = max.unwrap_or(usize::MAX);
            let mut model = vec![0_i64; min];
            let mut counter = 0_i64;

            for op in ops {
                let before = model.len();
                match op {
                    Op::Add => match connector.add_pin() {
                        Ok(pin) => {
                            prop_assert!(before < cap);
                            model.push(0);
                            mark(&pin, &mut model, &mut counter);
                        }
                        Err(err) => {
                            prop_assert_eq!(before, cap);
                            let is_max = matches!(err, ConnectorError::MaximumBoundExceeded { .. });
                            prop_assert!(is_max);
                        }
                    },
                    Op::Insert(index) => match connector.insert_pin(index) {
                        Ok(pin) => {
                            prop_assert!(before < cap && index <= before);
                            model.insert(index, 0);
                            mark(&pin, &mut model, &mut counter);
                        }
                        Err(ConnectorError::MaximumBoundExceeded { .. }) => {
                            prop_assert_eq!(before, cap);
                        }
                        Err(ConnectorError::IndexOutOfRange { size, .. }) => {
                            prop_assert!(index > before);
                            prop_assert_eq!(size, before);
                        }
                        Err(other) => prop_assert!(false, "unexpected {other}"),
                    },
                    Op::Remove(index) => match connector.remove_pin(index) {
                        Ok(pin) => {
                            prop_assert!(before > min && index < before);
                            prop_assert_eq!(pin.index(), None);
                            model.remove(index);
                        }
                        Err(ConnectorError::MinimumBoundExceeded { .. }) => {
                            prop_assert_eq!(before, min);
                        }
                        Err(ConnectorError::IndexOutOfRange { .. }) => {
                            prop_assert!(index >= before);
                        }
                        Err(other) => prop_assert!(false, "unexpected {other}"),
                    },
                    Op::TryIncrease(desired) => {
                        let added = connector.try_increase(desired);
                        let target = desired.min(cap);
                        prop_assert_eq!(added.len(), target.saturating_sub(before));
                        model.resize(before.max(target), 0);
                    }
                    Op::Reset => {
                        let fresh = connector.reset();
                        prop_assert_eq!(fresh.len(), min);
                        model = vec![0; min];
                    }
                }

                prop_assert!(connector.verify_integrity().is_ok());
                prop_assert_eq!(connector.size(), model.len());
                prop_assert!(model.len() >= min && model.len() <= cap);
                let pins = connector.pins();
                for (i, pin) in pins.iter().enumerate() {
                    prop_assert_eq!(pin.index(), Some(i));
                }
                let expected: Vec<_> = model.iter().map(|v| Some(Value::Int(*v))).collect();
                prop_assert_eq!(values(&connector), expected);
            }
        }
    }
}
