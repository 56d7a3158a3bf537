use thiserror::Error;

use crate::model::NodeId;

/// Fatal errors surfaced to the caller of `new`, `cycle`, or `reset`
/// (spec §7). `UnresolvedSensitivity` is deliberately absent here: it is
/// a warning, reported through `log::warn!` by [`crate::sensitivity`],
/// not an error variant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("model passed to Simulator::new is not elaborated")]
    NotElaborated,

    #[error(
        "plain edge between {a:?} (width {width_a}) and {b:?} (width {width_b}) has mismatched widths"
    )]
    WidthMismatch {
        a: NodeId,
        b: NodeId,
        width_a: u32,
        width_b: u32,
    },

    #[error("write to constant-valued signal {0:?} is not permitted")]
    ConstantWrite(crate::value::SignalId),

    #[error("block '{name}' ({file}:{line}) takes arguments; behavioral blocks must be nullary")]
    BlockSignature {
        name: String,
        file: String,
        line: u32,
    },

    /// Latent: the engine never detects a combinational cycle, it diverges
    /// (spec §7, §9). No code in this crate constructs this variant; it
    /// exists so a future cycle detector has somewhere to report into.
    #[error("combinational cycle detected among signals {0:?}")]
    CombinationalCycle(Vec<crate::value::SignalId>),
}
