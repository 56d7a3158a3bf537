//! Owns the constructed graph and exposes the caller-facing surface
//! (spec §4.G, §6).

use crate::cycle_engine::CycleEngine;
use crate::error::SimError;
use crate::model::Model;
use crate::net_builder::NetBuilder;
use crate::sensitivity::SensitivityBinder;
use crate::signal_binder::SignalBinder;
use crate::slice_lowerer::SliceLowerer;

/// Construction-time toggle between the dev and perf facade variants
/// (spec §4.G, §9 "two cycle variants"). Both implement the §4.F contract
/// identically with respect to observable values; `dev` only adds the
/// explicit clock-pin trace line for external waveform observers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatorOptions {
    pub dev: bool,
}

/// Fluent builder mirroring the teacher's `SimulatorBuilder`/`.build()`
/// shape, minus the parse-from-source step: the front end that would
/// produce an elaborated [`Model`] is out of scope (spec §1), so the
/// builder starts from one directly.
pub struct SimulatorBuilder {
    model: Model,
    options: SimulatorOptions,
}

impl SimulatorBuilder {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            options: SimulatorOptions::default(),
        }
    }

    /// Selects the dev variant (extra clock-pin toggling for waveform
    /// observers) instead of the perf variant (elided). Default: perf.
    pub fn dev(mut self, enable: bool) -> Self {
        self.options.dev = enable;
        self
    }

    pub fn build(self) -> Result<Simulator, SimError> {
        Simulator::new(self.model, self.options)
    }
}

/// The two cycle variants, resolved once at construction time and stored as
/// a plain function pointer so `cycle()` itself never branches on `dev`
/// (spec §9 Design Notes: "expose as a construction-time flag; do not
/// branch in the hot path").
type CycleFn = fn(&mut CycleEngine, &Model) -> Result<(), SimError>;

fn cycle_dev(engine: &mut CycleEngine, model: &Model) -> Result<(), SimError> {
    log::trace!("dev: toggling clock pin for waveform observers");
    engine.cycle(model)
}

fn cycle_perf(engine: &mut CycleEngine, model: &Model) -> Result<(), SimError> {
    engine.cycle(model)
}

pub struct Simulator {
    model: Model,
    engine: CycleEngine,
    cycle_fn: CycleFn,
}

impl Simulator {
    pub fn builder(model: Model) -> SimulatorBuilder {
        SimulatorBuilder::new(model)
    }

    /// Elaboration-check, then the full construction pipeline: net
    /// construction, signal binding, slice lowering, sensitivity binding,
    /// and a first settle so every derived signal reaches a consistent
    /// initial value before the caller observes anything (spec §2).
    pub fn new(mut model: Model, options: SimulatorOptions) -> Result<Self, SimError> {
        if !model.is_elaborated() {
            return Err(SimError::NotElaborated);
        }

        let mut engine = CycleEngine::new();
        let build = NetBuilder::build(&model)?;
        let queue = engine.queue_handle();
        SignalBinder::bind(&mut model, build.nets, &queue);
        SliceLowerer::lower(&mut model, build.slice_edges, &mut engine)?;
        SensitivityBinder::bind(&model, &mut engine)?;
        engine.settle(&model)?;

        let cycle_fn: CycleFn = if options.dev { cycle_dev } else { cycle_perf };

        Ok(Self {
            model,
            engine,
            cycle_fn,
        })
    }

    pub fn reset(&mut self) -> Result<(), SimError> {
        self.engine.reset(&self.model)
    }

    pub fn cycle(&mut self) -> Result<(), SimError> {
        let cycle_fn = self.cycle_fn;
        cycle_fn(&mut self.engine, &self.model)
    }

    pub fn eval_combinational(&mut self) -> Result<(), SimError> {
        self.engine.settle(&self.model)
    }

    pub fn ncycles(&self) -> u64 {
        self.engine.ncycles()
    }

    pub fn print_line_trace(&self) {
        println!("{}", self.model.line_trace());
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    fn trivial_model() -> Model {
        let mut b = ModelBuilder::new();
        let root = b.add_module("Empty", None);
        let reset = b.add_port(root, "reset", 1);
        b.finish(root, reset)
    }

    #[test]
    fn dev_option_selects_the_dev_cycle_fn_once_at_construction() {
        let dev_sim = Simulator::builder(trivial_model()).dev(true).build().unwrap();
        assert!(dev_sim.cycle_fn as usize == cycle_dev as usize);

        let perf_sim = Simulator::builder(trivial_model()).build().unwrap();
        assert!(perf_sim.cycle_fn as usize == cycle_perf as usize);
    }
}
