//! Creates one [`SignalValue`] per net and rewires every member node to
//! point at it (spec §4.C).

use std::rc::Rc;

use crate::cycle_engine::QueueHandle;
use crate::model::Model;
use crate::net_builder::Net;
use crate::value::{SignalId, SignalValue};

pub struct SignalBinder;

impl SignalBinder {
    /// For each net: pick any member's declared width, create one
    /// `SignalValue`, seed both current and shadow from the constant value
    /// (if any) or else the first member's `initial_value`, and rewrite
    /// every member node's `signal` field to the shared handle. A net
    /// holding a constant is marked read-only — it never sees a runtime
    /// write (spec §3 invariant iii).
    pub fn bind(model: &mut Model, nets: Vec<Net>, queue: &QueueHandle) -> Vec<Rc<SignalValue>> {
        let mut signals = Vec::with_capacity(nets.len());
        for (i, net) in nets.into_iter().enumerate() {
            let id = SignalId(i as u32);
            let initial = match &net.constant {
                Some(v) => v.clone(),
                None => model.node(net.members[0]).initial_value.clone(),
            };
            let read_only = net.constant.is_some();
            let signal = SignalValue::new(id, net.width, initial, read_only, Rc::clone(queue));
            for &node_id in &net.members {
                model.node_mut(node_id).signal = Some(Rc::clone(&signal));
            }
            signals.push(signal);
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle_engine::CycleEngine;
    use crate::model::ModelBuilder;
    use num_bigint::BigUint;

    #[test]
    fn one_signal_per_net_and_constant_nets_are_read_only() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("M", None);
        let n0 = b.add_port(root, "n0", 8);
        let n1 = b.add_port(root, "n1", 8);
        let c = b.add_constant(root, 4, 5u8);
        let reset = b.add_port(root, "reset", 1);
        let mut model = b.finish(root, reset);

        let engine = CycleEngine::new();
        let queue = engine.queue_handle();
        let nets = vec![
            Net { members: vec![n0, n1], width: 8, constant: None },
            Net { members: vec![c], width: 4, constant: Some(BigUint::from(5u8)) },
        ];
        let signals = SignalBinder::bind(&mut model, nets, &queue);

        assert_eq!(signals.len(), 2);
        assert!(!signals[0].is_read_only());
        assert!(signals[1].is_read_only());
        assert_eq!(signals[1].read(), BigUint::from(5u8));
        assert!(Rc::ptr_eq(model.node(n0).signal(), model.node(n1).signal()));
    }
}
