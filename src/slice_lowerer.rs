//! Synthesizes a combinational closure for every bit-slice structural edge
//! (spec §4.D).

use crate::bits::{self, BitRange};
use crate::cycle_engine::CycleEngine;
use crate::error::SimError;
use crate::model::{Block, CombBlockId, CombinationalBlock, EdgeId, Model, NodeKind};

pub struct SliceLowerer;

impl SliceLowerer {
    /// `src[src_range] -> dst[dst_range]`. A constant source is folded into
    /// a one-time partial write at construction time with no runtime
    /// callback; otherwise a synthesized block is registered on `src` and
    /// primed into the event queue so the first settle makes the slice
    /// consistent before any behavioral block runs.
    pub fn lower(
        model: &mut Model,
        slice_edges: Vec<EdgeId>,
        engine: &mut CycleEngine,
    ) -> Result<(), SimError> {
        for edge_id in slice_edges {
            let edge = model.edge(edge_id);
            let src_node = edge.src;
            let dst_node = edge.dst;
            let src_signal = model.node(src_node).signal().clone();
            let dst_signal = model.node(dst_node).signal().clone();
            let src_range = edge.src_range.unwrap_or(BitRange::full(src_signal.width()));
            let dst_range = edge.dst_range.unwrap_or(BitRange::full(dst_signal.width()));

            let dst_width = dst_signal.width();

            if matches!(model.node(src_node).kind, NodeKind::Constant(_)) {
                let bits = bits::get_bits(&src_signal.read(), src_range);
                let mut dst_val = dst_signal.read();
                bits::set_bits(&mut dst_val, dst_width, dst_range, &bits);
                dst_signal.write(dst_val)?;
                continue;
            }

            let run_src = src_signal.clone();
            let run_dst = dst_signal.clone();
            // Already bound to concrete SignalValues (SliceLowerer runs
            // after SignalBinder), so unlike a model-authored block this
            // closure has no need to re-resolve through `&Model`.
            let run = Box::new(move |_model: &Model| -> Result<(), SimError> {
                let bits = bits::get_bits(&run_src.read(), src_range);
                let mut dst_val = run_dst.read();
                bits::set_bits(&mut dst_val, dst_width, dst_range, &bits);
                run_dst.write(dst_val)
            });

            let id = CombBlockId(model.comb_blocks.len() as u32);
            model.comb_blocks.push(CombinationalBlock {
                block: Block {
                    name: format!("__slice_{}", edge_id.0),
                    file: "<slice-lowerer>".to_string(),
                    line: 0,
                    arity: 0,
                    run,
                },
                reads: Vec::new(),
            });
            src_signal.register_callback(id);
            engine.prime(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle_engine::CycleEngine;
    use crate::model::ModelBuilder;
    use crate::net_builder::NetBuilder;
    use crate::signal_binder::SignalBinder;
    use num_bigint::BigUint;

    #[test]
    fn constant_source_slice_is_folded_into_an_immediate_write() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("ConstSlice", None);
        let c = b.add_constant(root, 1, 1u8);
        let out = b.add_port(root, "out", 8);
        let reset = b.add_port(root, "reset", 1);
        b.connect_slice(c, BitRange::full(1), out, BitRange::new(3, 4));
        let mut model = b.finish(root, reset);

        let build = NetBuilder::build(&model).unwrap();
        let mut engine = CycleEngine::new();
        let queue = engine.queue_handle();
        SignalBinder::bind(&mut model, build.nets, &queue);

        SliceLowerer::lower(&mut model, build.slice_edges, &mut engine).unwrap();

        // folded into an immediate write, not a synthesized runtime block
        assert_eq!(model.comb_blocks.len(), 0);
        assert_eq!(model.node(out).signal().read(), BigUint::from(0b0000_1000u32));
    }
}
