//! Event-driven cycle simulator core for an elaborated RTL model.
//!
//! Consumes a module tree of typed ports, wires, structural connections,
//! and behavioral blocks, and executes clock cycles: propagate
//! combinational changes to a fixed point, flop registered state, and
//! re-propagate. The front end that produces the elaborated tree, the
//! bit-vector arithmetic type, the behavioral static analyser, waveform
//! dumping, and any HDL-to-Verilog translation are all external
//! collaborators this crate only defines narrow interfaces for.

pub mod bits;
pub mod cycle_engine;
pub mod error;
pub mod facade;
pub mod model;
pub mod net_builder;
pub mod path;
pub mod sensitivity;
pub mod signal_binder;
pub mod slice_lowerer;
pub mod value;

pub use error::SimError;
pub use facade::{Simulator, SimulatorBuilder, SimulatorOptions};
pub use model::{Model, ModelBuilder};
pub use value::SignalValue;
