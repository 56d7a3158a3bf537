//! `SignalValue`: the runtime storage cell shared by every member of a net
//! (spec §4.A).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use fxhash::FxHashSet;
use num_bigint::BigUint;

use crate::cycle_engine::QueueHandle;
use crate::error::SimError;
use crate::model::CombBlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(pub u32);

/// Storage + change notification for one net.
///
/// Created once per net by [`SignalBinder`](crate::signal_binder::SignalBinder)
/// and shared by identity (via `Rc`) with every node in the net, every
/// registered callback, and the cycle engine's register-list. `current`
/// and `shadow` are always the same width; callbacks fire only through the
/// engine, never synchronously inside `write`/`write_shadow` themselves.
pub struct SignalValue {
    pub id: SignalId,
    width: u32,
    current: RefCell<BigUint>,
    shadow: RefCell<BigUint>,
    read_only: Cell<bool>,
    callbacks: RefCell<Vec<CombBlockId>>,
    callback_set: RefCell<FxHashSet<CombBlockId>>,
    queue: QueueHandle,
    self_weak: Weak<SignalValue>,
}

impl SignalValue {
    pub fn new(id: SignalId, width: u32, initial: BigUint, read_only: bool, queue: QueueHandle) -> Rc<Self> {
        Rc::new_cyclic(|weak| SignalValue {
            id,
            width,
            shadow: RefCell::new(initial.clone()),
            current: RefCell::new(initial),
            read_only: Cell::new(read_only),
            callbacks: RefCell::new(Vec::new()),
            callback_set: RefCell::new(FxHashSet::default()),
            queue,
            self_weak: weak.clone(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    pub fn mark_constant(&self) {
        self.read_only.set(true);
    }

    pub fn read(&self) -> BigUint {
        self.current.borrow().clone()
    }

    pub fn read_shadow(&self) -> BigUint {
        self.shadow.borrow().clone()
    }

    /// Sets the current value and enqueues every registered callback
    /// (excluding the block presently executing, if any).
    pub fn write(&self, value: BigUint) -> Result<(), SimError> {
        if self.read_only.get() {
            return Err(SimError::ConstantWrite(self.id));
        }
        *self.current.borrow_mut() = value;
        self.notify_comb();
        Ok(())
    }

    /// Non-blocking write: sets the shadow value and records this signal
    /// in the engine's register-to-flop list.
    pub fn write_shadow(&self, value: BigUint) -> Result<(), SimError> {
        if self.read_only.get() {
            return Err(SimError::ConstantWrite(self.id));
        }
        *self.shadow.borrow_mut() = value;
        let me = self
            .self_weak
            .upgrade()
            .expect("SignalValue outlives its own Rc");
        self.queue.borrow_mut().push_register(me);
        Ok(())
    }

    /// Copies shadow into current, firing the combinational notifier
    /// exactly as `write` would.
    pub fn flop(&self) {
        let value = self.shadow.borrow().clone();
        *self.current.borrow_mut() = value;
        self.notify_comb();
    }

    /// Appends `cb` to the callback set. Idempotent: registering the same
    /// block twice is a no-op (spec §4.A, §9 "insertion-ordered set").
    pub fn register_callback(&self, cb: CombBlockId) {
        if self.callback_set.borrow_mut().insert(cb) {
            self.callbacks.borrow_mut().push(cb);
        }
    }

    fn notify_comb(&self) {
        let mut queue = self.queue.borrow_mut();
        let current = queue.current_block();
        for &cb in self.callbacks.borrow().iter() {
            if Some(cb) != current {
                queue.enqueue(cb);
            }
        }
    }
}

impl std::fmt::Debug for SignalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalValue")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("current", &self.current.borrow())
            .field("read_only", &self.read_only.get())
            .finish()
    }
}
