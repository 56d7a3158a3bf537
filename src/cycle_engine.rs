//! The two-phase cycle engine: combinational fixed-point, then sequential
//! flop, with a deduplicating FIFO event queue (spec §4.F).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use fxhash::FxHashSet;
use num_bigint::BigUint;

use crate::error::SimError;
use crate::model::{CombBlockId, Model};
use crate::value::SignalValue;

/// Engine-private queue + register-list state, shared with every
/// [`SignalValue`] via `Rc<RefCell<_>>` so writes anywhere in the graph can
/// enqueue callbacks without the engine being reachable from the signal.
#[derive(Default)]
pub(crate) struct EventQueueState {
    queue: VecDeque<CombBlockId>,
    member: FxHashSet<CombBlockId>,
    current: Option<CombBlockId>,
    register_list: Vec<Rc<SignalValue>>,
}

impl EventQueueState {
    /// New entries push to the front; `settle` pops from the back, so the
    /// queue drains in FIFO order of enqueue (spec §4.F, §9).
    pub(crate) fn enqueue(&mut self, cb: CombBlockId) {
        if self.member.insert(cb) {
            self.queue.push_front(cb);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<CombBlockId> {
        let cb = self.queue.pop_back()?;
        self.member.remove(&cb);
        Some(cb)
    }

    pub(crate) fn current_block(&self) -> Option<CombBlockId> {
        self.current
    }

    #[cfg(test)]
    pub(crate) fn set_current(&mut self, cb: Option<CombBlockId>) {
        self.current = cb;
    }

    pub(crate) fn push_register(&mut self, signal: Rc<SignalValue>) {
        self.register_list.push(signal);
    }
}

pub type QueueHandle = Rc<RefCell<EventQueueState>>;

pub struct CycleEngine {
    queue: QueueHandle,
    /// Indices into `Model::seq_blocks`, in depth-first declaration order
    /// (spec §4.E, §5): fixed once by
    /// [`SensitivityBinder`](crate::sensitivity::SensitivityBinder).
    sequential_order: Vec<usize>,
    ncycles: u64,
}

impl CycleEngine {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(EventQueueState::default())),
            sequential_order: Vec::new(),
            ncycles: 0,
        }
    }

    pub fn queue_handle(&self) -> QueueHandle {
        Rc::clone(&self.queue)
    }

    pub fn set_sequential_order(&mut self, order: Vec<usize>) {
        self.sequential_order = order;
    }

    /// Seeds the queue at construction time so derived signals reach a
    /// consistent initial state before the first real settle (spec §4.D, §4.E).
    pub fn prime(&mut self, cb: CombBlockId) {
        self.queue.borrow_mut().enqueue(cb);
    }

    pub fn ncycles(&self) -> u64 {
        self.ncycles
    }

    /// Drains the event queue to empty. Guaranteed to terminate only if the
    /// combinational subgraph is acyclic; a user-constructed cycle makes
    /// this loop indefinitely (spec §4.F, §7 `CombinationalCycle`, latent).
    pub fn settle(&mut self, model: &Model) -> Result<(), SimError> {
        loop {
            let next = self.queue.borrow_mut().pop();
            let Some(cb) = next else { break };
            self.queue.borrow_mut().current = Some(cb);
            log::trace!("settle: invoking combinational block {cb:?}");
            let result = (model.comb_blocks[cb.0 as usize].block.run)(model);
            self.queue.borrow_mut().current = None;
            result?;
        }
        Ok(())
    }

    /// One full clock cycle: settle, run every sequential block once, flop
    /// every shadow write, settle again (spec §4.F).
    pub fn cycle(&mut self, model: &Model) -> Result<(), SimError> {
        self.settle(model)?;

        for &idx in &self.sequential_order {
            log::trace!("cycle: running sequential block {idx}");
            (model.seq_blocks[idx].run)(model)?;
        }

        loop {
            let next = self.queue.borrow_mut().register_list.pop();
            let Some(signal) = next else { break };
            signal.flop();
        }

        self.settle(model)?;
        self.ncycles += 1;
        log::debug!("cycle: advanced to ncycles={}", self.ncycles);
        Ok(())
    }

    /// Writes 1 to the model's reset input, cycles twice, then writes 0
    /// (spec §4.F). The reset signal is addressed only by the handle the
    /// model hands back, never by name.
    pub fn reset(&mut self, model: &Model) -> Result<(), SimError> {
        let reset = model.reset_signal();
        reset.write(BigUint::from(1u8))?;
        self.cycle(model)?;
        self.cycle(model)?;
        reset.write(BigUint::from(0u8))?;
        Ok(())
    }
}

impl Default for CycleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Simulator;
    use crate::model::ModelBuilder;

    /// A block enqueued twice before it runs only appears once in the drain
    /// order (spec §8 invariant 4, "at-most-once enqueue").
    #[test]
    fn enqueue_dedups_pending_entries() {
        let mut state = EventQueueState::default();
        let cb = CombBlockId(3);
        state.enqueue(cb);
        state.enqueue(cb);
        assert_eq!(state.pop(), Some(cb));
        assert_eq!(state.pop(), None);
    }

    /// Two registers that swap values every cycle: `write_shadow` reads
    /// pre-flop state, so both registers update from the same snapshot
    /// instead of one seeing the other's already-flopped value (spec §8
    /// invariant 6, "flop atomicity").
    #[test]
    fn sequential_blocks_flop_from_a_shared_pre_cycle_snapshot() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("Swap", None);
        let reg_a = b.add_wire(root, "a", 8);
        let reg_b = b.add_wire(root, "b", 8);
        let reset = b.add_port(root, "reset", 1);
        b.add_tick(root, "swap_to_b", file!(), line!(), Box::new(move |model| {
            let v = model.node(reg_a).signal().read();
            model.node(reg_b).signal().write_shadow(v)
        }));
        b.add_tick(root, "swap_to_a", file!(), line!(), Box::new(move |model| {
            let v = model.node(reg_b).signal().read();
            model.node(reg_a).signal().write_shadow(v)
        }));
        let model = b.finish(root, reset);

        let mut sim = Simulator::builder(model).build().unwrap();
        sim.model().node(reg_a).signal().write(BigUint::from(1u8)).unwrap();
        sim.model().node(reg_b).signal().write(BigUint::from(2u8)).unwrap();

        sim.cycle().unwrap();
        assert_eq!(sim.model().node(reg_a).signal().read(), BigUint::from(2u8));
        assert_eq!(sim.model().node(reg_b).signal().read(), BigUint::from(1u8));
    }
}
