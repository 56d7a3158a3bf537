//! Wires combinational blocks to the signals their read-set names resolve
//! to, and gathers the sequential-block execution order (spec §4.E).

use crate::cycle_engine::CycleEngine;
use crate::error::SimError;
use crate::model::{CombBlockId, Model, ModuleId};
use crate::path;

pub struct SensitivityBinder;

impl SensitivityBinder {
    pub fn bind(model: &Model, engine: &mut CycleEngine) -> Result<(), SimError> {
        Self::bind_module(model, model.root, engine)?;
        let mut order = Vec::new();
        Self::gather_sequential(model, model.root, &mut order);
        for &idx in &order {
            let block = &model.seq_blocks[idx];
            if block.arity != 0 {
                return Err(SimError::BlockSignature {
                    name: block.name.clone(),
                    file: block.file.clone(),
                    line: block.line,
                });
            }
        }
        engine.set_sequential_order(order);
        Ok(())
    }

    fn bind_module(model: &Model, module_id: ModuleId, engine: &mut CycleEngine) -> Result<(), SimError> {
        let module = model.module(module_id);
        for &cb_id in &module.combinational_blocks {
            Self::bind_one(model, module_id, cb_id, engine)?;
        }
        for &sub in &module.submodules {
            Self::bind_module(model, sub, engine)?;
        }
        Ok(())
    }

    fn bind_one(
        model: &Model,
        module_id: ModuleId,
        cb_id: CombBlockId,
        engine: &mut CycleEngine,
    ) -> Result<(), SimError> {
        let comb = &model.comb_blocks[cb_id.0 as usize];
        if comb.block.arity != 0 {
            return Err(SimError::BlockSignature {
                name: comb.block.name.clone(),
                file: comb.block.file.clone(),
                line: comb.block.line,
            });
        }
        for raw in &comb.reads {
            let resolved = path::parse_path(raw).and_then(|p| path::resolve(model, module_id, &p));
            match resolved {
                Some(nodes) => {
                    for node_id in nodes {
                        model.node(node_id).signal().register_callback(cb_id);
                    }
                }
                None => {
                    log::warn!(
                        "unresolved sensitivity name '{raw}' for block '{}' ({}:{}); skipped",
                        comb.block.name,
                        comb.block.file,
                        comb.block.line
                    );
                }
            }
        }
        engine.prime(cb_id);
        Ok(())
    }

    /// Depth-first by module tree, tick-blocks before posedge-clk-blocks
    /// within a module, each in its own declaration order (spec §4.E, §5).
    fn gather_sequential(model: &Model, module_id: ModuleId, order: &mut Vec<usize>) {
        let module = model.module(module_id);
        order.extend(module.tick_blocks.iter().copied());
        order.extend(module.posedge_clk_blocks.iter().copied());
        for &sub in &module.submodules {
            Self::gather_sequential(model, sub, order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    #[test]
    fn nonzero_arity_combinational_block_is_rejected() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("M", None);
        let reset = b.add_port(root, "reset", 1);
        b.add_combinational(root, "bad", file!(), line!(), vec![], Box::new(|_m| Ok(())));
        let mut model = b.finish(root, reset);
        model.comb_blocks[0].block.arity = 1;

        let mut engine = CycleEngine::new();
        let err = SensitivityBinder::bind(&model, &mut engine).unwrap_err();
        assert!(matches!(err, SimError::BlockSignature { .. }));
    }

    #[test]
    fn nonzero_arity_sequential_block_is_rejected() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("M", None);
        let reset = b.add_port(root, "reset", 1);
        b.add_tick(root, "bad", file!(), line!(), Box::new(|_m| Ok(())));
        let mut model = b.finish(root, reset);
        model.seq_blocks[0].arity = 1;

        let mut engine = CycleEngine::new();
        let err = SensitivityBinder::bind(&model, &mut engine).unwrap_err();
        assert!(matches!(err, SimError::BlockSignature { .. }));
    }

    #[test]
    fn unresolved_sensitivity_name_is_a_warning_not_an_error() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("M", None);
        let reset = b.add_port(root, "reset", 1);
        b.add_combinational(
            root,
            "ok",
            file!(),
            line!(),
            vec!["does_not_exist".into()],
            Box::new(|_m| Ok(())),
        );
        let model = b.finish(root, reset);

        let mut engine = CycleEngine::new();
        assert!(SensitivityBinder::bind(&model, &mut engine).is_ok());
    }
}
