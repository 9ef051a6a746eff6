//! Link graph between output and input pins.
//!
//! The engine keeps the graph consistent with structural changes but does
//! not move values along links; delivery belongs to whatever drives the
//! graph.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`LinkError::UnknownPin`] | `LINK_UNKNOWN_PIN` | Yes |
//! | [`LinkError::InvalidDirection`] | `LINK_INVALID_DIRECTION` | Yes |

use logix_component::{Component, Direction};
use logix_types::{ErrorCode, Uid};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The pin belongs to no tracked component.
    #[error("pin {0} is not tracked by the link graph")]
    UnknownPin(Uid),

    /// Links run from an output pin to an input pin.
    #[error("cannot link {from} to {to}: links run from an output pin to an input pin")]
    InvalidDirection { from: Uid, to: Uid },
}

impl ErrorCode for LinkError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownPin(_) => "LINK_UNKNOWN_PIN",
            Self::InvalidDirection { .. } => "LINK_INVALID_DIRECTION",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

/// A directed edge from an output pin to an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link {
    pub source: Uid,
    pub target: Uid,
}

/// Bookkeeping contract for pin-to-pin links.
pub trait LinkGraph: Send + Sync {
    /// Adds `source → target`. Returns `false` if the link already existed.
    ///
    /// # Errors
    ///
    /// [`LinkError`] if either pin is untracked or the directions are wrong.
    fn link(&mut self, source: Uid, target: Uid) -> Result<bool, LinkError>;

    /// Drops every link touching `pin`. Returns how many were dropped.
    fn unlink(&mut self, pin: Uid) -> usize;

    /// Drops `source → target`. Returns whether it existed.
    fn unlink_pair(&mut self, source: Uid, target: Uid) -> bool;

    /// Pins on the other end of every link touching `pin`.
    fn linked_pins(&self, pin: Uid) -> Vec<Uid>;

    /// Tracks every current pin of `component`.
    ///
    /// Calling it again after the component's dynamic connectors were
    /// resized picks up new pins and forgets removed ones, with their links.
    fn register(&mut self, component: &Component);

    /// Forgets every pin of the component and every link touching them.
    fn deregister(&mut self, component: Uid);
}

#[derive(Debug, Clone, Copy)]
struct TrackedPin {
    owner: Uid,
    direction: Direction,
}

/// In-memory [`LinkGraph`].
#[derive(Debug, Default)]
pub struct LinkTable {
    pins: HashMap<Uid, TrackedPin>,
    links: BTreeSet<Link>,
}

impl LinkTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All links in `(source, target)` order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn direction(&self, pin: Uid) -> Result<Direction, LinkError> {
        self.pins
            .get(&pin)
            .map(|tracked| tracked.direction)
            .ok_or(LinkError::UnknownPin(pin))
    }

    fn forget(&mut self, pins: &[Uid]) {
        for pin in pins {
            self.pins.remove(pin);
            self.unlink(*pin);
        }
    }
}

impl LinkGraph for LinkTable {
    fn link(&mut self, source: Uid, target: Uid) -> Result<bool, LinkError> {
        let from = self.direction(source)?;
        let to = self.direction(target)?;
        if from != Direction::Output || to != Direction::Input {
            return Err(LinkError::InvalidDirection {
                from: source,
                to: target,
            });
        }
        let added = self.links.insert(Link { source, target });
        if added {
            debug!(%source, %target, "pins linked");
        }
        Ok(added)
    }

    fn unlink(&mut self, pin: Uid) -> usize {
        let before = self.links.len();
        self.links.retain(|link| link.source != pin && link.target != pin);
        before - self.links.len()
    }

    fn unlink_pair(&mut self, source: Uid, target: Uid) -> bool {
        self.links.remove(&Link { source, target })
    }

    fn linked_pins(&self, pin: Uid) -> Vec<Uid> {
        self.links
            .iter()
            .filter_map(|link| {
                if link.source == pin {
                    Some(link.target)
                } else if link.target == pin {
                    Some(link.source)
                } else {
                    None
                }
            })
            .collect()
    }

    fn register(&mut self, component: &Component) {
        let owner = component.uid();
        let mut live = HashMap::new();
        for connector in component.connectors().iter() {
            for pin in connector.pins() {
                live.insert(
                    pin.uid(),
                    TrackedPin {
                        owner,
                        direction: connector.direction(),
                    },
                );
            }
        }

        let stale: Vec<Uid> = self
            .pins
            .iter()
            .filter(|(uid, tracked)| tracked.owner == owner && !live.contains_key(uid))
            .map(|(uid, _)| *uid)
            .collect();
        self.forget(&stale);
        self.pins.extend(live);
    }

    fn deregister(&mut self, component: Uid) {
        let owned: Vec<Uid> = self
            .pins
            .iter()
            .filter(|(_, tracked)| tracked.owner == component)
            .map(|(uid, _)| *uid)
            .collect();
        self.forget(&owned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logix_component::{ComponentError, Logic, LogicComponent, Slot, SlotList, SlotTable, Unit};
    use logix_types::assert_error_codes;
    use std::sync::Arc;

    #[derive(Default)]
    struct Gate {
        inputs: SlotList<bool>,
        out: Slot<bool>,
    }

    impl Unit for Gate {
        fn declare(&self, slots: &mut SlotTable) {
            slots.input_list("inputs", &self.inputs).bounds(1, None);
            slots.output("out", &self.out);
        }
    }

    impl Logic for Gate {
        fn logic(&mut self) -> Result<(), ComponentError> {
            self.out.set(self.inputs.to_vec().into_iter().flatten().all(|b| b));
            Ok(())
        }
    }

    fn gate() -> Component {
        LogicComponent::new(Gate::default())
            .expect("valid unit")
            .into()
    }

    fn uid(component: &Component, path: &str) -> Uid {
        component.pin(path).expect("declared").uid()
    }

    #[test]
    fn links_output_to_input() {
        let (a, b) = (gate(), gate());
        let mut table = LinkTable::new();
        table.register(&a);
        table.register(&b);

        let (out, inp) = (uid(&a, "out"), uid(&b, "inputs[0]"));
        assert_eq!(table.link(out, inp), Ok(true));
        assert_eq!(table.link(out, inp), Ok(false));
        assert_eq!(table.len(), 1);
        assert_eq!(table.linked_pins(out), vec![inp]);
        assert_eq!(table.linked_pins(inp), vec![out]);
    }

    #[test]
    fn rejects_wrong_direction_and_unknown_pins() {
        let (a, b) = (gate(), gate());
        let mut table = LinkTable::new();
        table.register(&a);
        table.register(&b);

        let (out_a, out_b) = (uid(&a, "out"), uid(&b, "out"));
        let inp = uid(&b, "inputs[0]");
        assert_eq!(
            table.link(inp, out_a),
            Err(LinkError::InvalidDirection {
                from: inp,
                to: out_a
            })
        );
        assert!(matches!(
            table.link(out_a, out_b),
            Err(LinkError::InvalidDirection { .. })
        ));

        let stranger = Uid::new();
        assert_eq!(table.link(stranger, inp), Err(LinkError::UnknownPin(stranger)));
        assert!(table.is_empty());
    }

    #[test]
    fn unlink_variants() {
        let (a, b, c) = (gate(), gate(), gate());
        let mut table = LinkTable::new();
        for component in [&a, &b, &c] {
            table.register(component);
        }
        let out = uid(&a, "out");
        let (ib, ic) = (uid(&b, "inputs[0]"), uid(&c, "inputs[0]"));
        table.link(out, ib).expect("valid");
        table.link(out, ic).expect("valid");

        assert!(table.unlink_pair(out, ib));
        assert!(!table.unlink_pair(out, ib));
        assert_eq!(table.unlink(out), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn reregister_forgets_removed_pins() {
        let (a, b) = (gate(), gate());
        let mut table = LinkTable::new();
        table.register(&a);
        table.register(&b);

        let inputs = b
            .connector("inputs")
            .expect("declared")
            .as_dynamic()
            .map(Arc::clone)
            .expect("dynamic");
        let second = inputs.add_pin().expect("unbounded");
        table.register(&b);

        let out = uid(&a, "out");
        table.link(out, second.uid()).expect("tracked after re-register");
        table.link(out, uid(&b, "inputs[0]")).expect("valid");

        inputs.remove_pin(1).expect("above min");
        table.register(&b);
        assert_eq!(table.linked_pins(out), vec![uid(&b, "inputs[0]")]);
        assert_eq!(
            table.link(out, second.uid()),
            Err(LinkError::UnknownPin(second.uid()))
        );
    }

    #[test]
    fn deregister_drops_links_on_both_ends() {
        let (a, b) = (gate(), gate());
        let mut table = LinkTable::new();
        table.register(&a);
        table.register(&b);
        let out = uid(&a, "out");
        table.link(out, uid(&b, "inputs[0]")).expect("valid");

        table.deregister(b.uid());
        assert!(table.is_empty());
        assert!(table.linked_pins(out).is_empty());
    }

    #[test]
    fn error_codes() {
        let (source, target) = (Uid::new(), Uid::new());
        assert_error_codes(
            &[
                LinkError::UnknownPin(source),
                LinkError::InvalidDirection {
                    from: source,
                    to: target,
                },
            ],
            "LINK_",
        );
    }
}
