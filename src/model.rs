//! The elaborated module tree this crate consumes (spec §3, §6).
//!
//! A real deployment gets this from an external elaboration pass; the
//! [`ModelBuilder`] here is a minimal, hand-rolled stand-in for that
//! front end, just expressive enough for the core engine's own tests and
//! for a caller who already has ports/wires/edges/blocks in hand.

use std::rc::Rc;

use num_bigint::BigUint;

use crate::bits::BitRange;
use crate::error::SimError;
use crate::value::SignalValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Identifies a combinational block for event-queue membership
/// (spec §4.F). Sequential blocks need no stable id: they run
/// unconditionally, in declaration order, once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombBlockId(pub u32);

pub enum NodeKind {
    Port,
    Wire,
    /// A structural literal. Never a valid edge destination (spec §3).
    Constant(BigUint),
}

pub struct Node {
    pub name: String,
    pub parent: ModuleId,
    pub width: u32,
    pub initial_value: BigUint,
    pub kind: NodeKind,
    pub connections: Vec<EdgeId>,
    /// Filled in by [`crate::signal_binder::SignalBinder`].
    pub signal: Option<Rc<SignalValue>>,
}

impl Node {
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, NodeKind::Constant(_))
    }

    /// Panics if [`SignalBinder`](crate::signal_binder::SignalBinder) has not
    /// yet run; every node is bound before the simulator becomes usable.
    pub fn signal(&self) -> &Rc<SignalValue> {
        self.signal
            .as_ref()
            .expect("node dereferenced before SignalBinder ran")
    }
}

pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
    pub src_range: Option<BitRange>,
    pub dst_range: Option<BitRange>,
}

impl Edge {
    pub fn is_slice(&self) -> bool {
        self.src_range.is_some() || self.dst_range.is_some()
    }
}

/// Blocks are re-resolved against the model on every invocation rather
/// than capturing a `SignalValue` handle up front — at the point a model
/// author writes a block, `SignalBinder` hasn't run yet and no signal
/// exists for a given node (spec §9 "dynamic attribute rewrite": the
/// indirection strategy, realized here as "resolve the node's `signal()`
/// fresh each call" instead of a mutable rewritten field).
pub type BlockFn = Box<dyn Fn(&Model) -> Result<(), SimError>>;

/// A user-defined behavioral procedure together with the metadata needed
/// to report a [`SimError::BlockSignature`] error with file/line.
pub struct Block {
    pub name: String,
    pub file: String,
    pub line: u32,
    /// Declared argument count. Behavioral blocks must be nullary closures;
    /// a nonzero arity is rejected at bind time (spec §5, §7).
    pub arity: usize,
    pub run: BlockFn,
}

/// A combinational block plus the read-set the external static analyser
/// extracted for it (spec §4.E). The read-set drives sensitivity wiring
/// only — the closure itself independently captures whatever
/// [`SignalValue`] handles it actually reads and writes.
pub struct CombinationalBlock {
    pub block: Block,
    pub reads: Vec<String>,
}

pub struct Module {
    pub name: String,
    pub parent: Option<ModuleId>,
    /// Ports and wires declared directly on this module, in declaration order.
    pub nodes: Vec<NodeId>,
    pub submodules: Vec<ModuleId>,
    pub combinational_blocks: Vec<CombBlockId>,
    pub tick_blocks: Vec<usize>,
    pub posedge_clk_blocks: Vec<usize>,
}

pub struct Model {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub modules: Vec<Module>,
    pub comb_blocks: Vec<CombinationalBlock>,
    pub seq_blocks: Vec<Block>,
    pub root: ModuleId,
    pub reset: NodeId,
    elaborated: bool,
}

impl Model {
    pub fn is_elaborated(&self) -> bool {
        self.elaborated
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    /// All nodes in the tree, recursing through submodules (spec §6
    /// `ports()`/`wires()`/`submodules()` graph enumeration collapsed into
    /// one walk since the core does not distinguish port/wire identity).
    pub fn all_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_nodes(self.root, &mut out);
        out
    }

    fn collect_nodes(&self, m: ModuleId, out: &mut Vec<NodeId>) {
        let module = self.module(m);
        out.extend_from_slice(&module.nodes);
        for &sub in &module.submodules {
            self.collect_nodes(sub, out);
        }
    }

    /// The reset input's bound signal, owned by the model and addressed
    /// only by identity — the engine never looks it up by name (spec §4.F).
    pub fn reset_signal(&self) -> Rc<SignalValue> {
        Rc::clone(self.node(self.reset).signal())
    }

    /// Operator-facing one-line status, delegated to by
    /// [`Simulator::print_line_trace`](crate::facade::Simulator::print_line_trace)
    /// (spec §4.G, §6). Reports every node declared directly on the root
    /// module; submodule internals are omitted, matching the common
    /// top-level-only convention for line traces.
    pub fn line_trace(&self) -> String {
        self.module(self.root)
            .nodes
            .iter()
            .map(|&id| {
                let node = self.node(id);
                format!("{}={}", node.name, node.signal().read())
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Minimal constructive stand-in for the elaboration front end (out of
/// scope per spec §1). Builds one flat or nested [`Model`] node/edge/block
/// graph; good enough to express the end-to-end scenarios in spec §8.
#[derive(Default)]
pub struct ModelBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    modules: Vec<Module>,
    comb_blocks: Vec<CombinationalBlock>,
    seq_blocks: Vec<Block>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, name: impl Into<String>, parent: Option<ModuleId>) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module {
            name: name.into(),
            parent,
            nodes: Vec::new(),
            submodules: Vec::new(),
            combinational_blocks: Vec::new(),
            tick_blocks: Vec::new(),
            posedge_clk_blocks: Vec::new(),
        });
        if let Some(p) = parent {
            self.modules[p.0 as usize].submodules.push(id);
        }
        id
    }

    fn push_node(&mut self, parent: ModuleId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.modules[parent.0 as usize].nodes.push(id);
        id
    }

    pub fn add_port(&mut self, parent: ModuleId, name: impl Into<String>, width: u32) -> NodeId {
        self.push_node(
            parent,
            Node {
                name: name.into(),
                parent,
                width,
                initial_value: BigUint::from(0u8),
                kind: NodeKind::Port,
                connections: Vec::new(),
                signal: None,
            },
        )
    }

    pub fn add_wire(&mut self, parent: ModuleId, name: impl Into<String>, width: u32) -> NodeId {
        self.push_node(
            parent,
            Node {
                name: name.into(),
                parent,
                width,
                initial_value: BigUint::from(0u8),
                kind: NodeKind::Wire,
                connections: Vec::new(),
                signal: None,
            },
        )
    }

    pub fn add_constant(&mut self, parent: ModuleId, width: u32, value: impl Into<BigUint>) -> NodeId {
        let value = value.into();
        self.push_node(
            parent,
            Node {
                name: format!("__const_{value}"),
                parent,
                width,
                initial_value: value.clone(),
                kind: NodeKind::Constant(value),
                connections: Vec::new(),
                signal: None,
            },
        )
    }

    pub fn connect(&mut self, src: NodeId, dst: NodeId) -> EdgeId {
        self.add_edge(src, dst, None, None)
    }

    pub fn connect_slice(
        &mut self,
        src: NodeId,
        src_range: BitRange,
        dst: NodeId,
        dst_range: BitRange,
    ) -> EdgeId {
        self.add_edge(src, dst, Some(src_range), Some(dst_range))
    }

    fn add_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        src_range: Option<BitRange>,
        dst_range: Option<BitRange>,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            src,
            dst,
            src_range,
            dst_range,
        });
        self.nodes[src.0 as usize].connections.push(id);
        self.nodes[dst.0 as usize].connections.push(id);
        id
    }

    pub fn add_combinational(
        &mut self,
        parent: ModuleId,
        name: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        reads: Vec<String>,
        run: BlockFn,
    ) -> CombBlockId {
        let id = CombBlockId(self.comb_blocks.len() as u32);
        self.comb_blocks.push(CombinationalBlock {
            block: Block {
                name: name.into(),
                file: file.into(),
                line,
                arity: 0,
                run,
            },
            reads,
        });
        self.modules[parent.0 as usize].combinational_blocks.push(id);
        id
    }

    fn add_seq(&mut self, name: impl Into<String>, file: impl Into<String>, line: u32, run: BlockFn) -> usize {
        let id = self.seq_blocks.len();
        self.seq_blocks.push(Block {
            name: name.into(),
            file: file.into(),
            line,
            arity: 0,
            run,
        });
        id
    }

    pub fn add_tick(
        &mut self,
        parent: ModuleId,
        name: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        run: BlockFn,
    ) {
        let idx = self.add_seq(name, file, line, run);
        self.modules[parent.0 as usize].tick_blocks.push(idx);
    }

    pub fn add_posedge_clk(
        &mut self,
        parent: ModuleId,
        name: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        run: BlockFn,
    ) {
        let idx = self.add_seq(name, file, line, run);
        self.modules[parent.0 as usize].posedge_clk_blocks.push(idx);
    }

    /// Finalizes the tree into an elaborated [`Model`]. `reset` must name a
    /// node already added via [`Self::add_port`] or [`Self::add_wire`].
    pub fn finish(self, root: ModuleId, reset: NodeId) -> Model {
        Model {
            nodes: self.nodes,
            edges: self.edges,
            modules: self.modules,
            comb_blocks: self.comb_blocks,
            seq_blocks: self.seq_blocks,
            root,
            reset,
            elaborated: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_nodes_recurses_into_submodules_depth_first() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("Root", None);
        let r0 = b.add_port(root, "r0", 1);
        let child = b.add_module("Child", Some(root));
        let c0 = b.add_port(child, "c0", 1);
        let r1 = b.add_port(root, "r1", 1);
        let model = b.finish(root, r0);

        assert_eq!(model.all_nodes(), vec![r0, r1, c0]);
    }

    #[test]
    fn node_kind_reports_constant() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("Root", None);
        let c = b.add_constant(root, 4, 5u8);
        let w = b.add_wire(root, "w", 4);
        let model = b.finish(root, c);

        assert!(model.node(c).is_constant());
        assert!(!model.node(w).is_constant());
    }

    #[test]
    fn finish_marks_the_model_elaborated() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("Root", None);
        let reset = b.add_port(root, "reset", 1);
        let model = b.finish(root, reset);
        assert!(model.is_elaborated());
    }
}
