//! Collapses the port/wire graph into maximal connected components over
//! plain (non-sliced) structural edges (spec §4.B).

use fxhash::FxHashSet;
use itertools::Itertools;
use num_bigint::BigUint;

use crate::error::SimError;
use crate::model::{EdgeId, Model, NodeId};

pub struct Net {
    pub members: Vec<NodeId>,
    pub width: u32,
    pub constant: Option<BigUint>,
}

pub struct NetBuildResult {
    pub nets: Vec<Net>,
    pub slice_edges: Vec<EdgeId>,
}

pub struct NetBuilder;

impl NetBuilder {
    /// Builds the net partition. Plain edges with mismatched endpoint
    /// widths are rejected here as a defensive boundary check, even
    /// though a well-formed elaborated model never produces one (spec
    /// §4.B: "NetBuilder assumes this already holds").
    pub fn build(model: &Model) -> Result<NetBuildResult, SimError> {
        let all_nodes = model.all_nodes();
        let mut unvisited: FxHashSet<NodeId> = all_nodes.iter().copied().collect();
        let slice_edges = all_nodes
            .iter()
            .flat_map(|id| model.node(*id).connections.iter().copied())
            .filter(|&edge_id| model.edge(edge_id).is_slice())
            .unique()
            .collect();

        let mut nets = Vec::new();
        while let Some(&start) = unvisited.iter().next() {
            let net = Self::dfs_one_net(model, start, &mut unvisited)?;
            nets.push(net);
        }

        Ok(NetBuildResult { nets, slice_edges })
    }

    /// Iterative DFS over plain edges incident to `start`, removing every
    /// visited node from `unvisited`. Self-loops collapse harmlessly;
    /// a constant node encountered mid-walk is folded into the net.
    fn dfs_one_net(
        model: &Model,
        start: NodeId,
        unvisited: &mut FxHashSet<NodeId>,
    ) -> Result<Net, SimError> {
        let width = model.node(start).width;
        let mut members = Vec::new();
        let mut constant = None;
        let mut constant_count = 0;
        let mut stack = vec![start];
        unvisited.remove(&start);

        while let Some(node_id) = stack.pop() {
            let node = model.node(node_id);
            if node.width != width {
                return Err(SimError::WidthMismatch {
                    a: start,
                    b: node_id,
                    width_a: width,
                    width_b: node.width,
                });
            }
            if let crate::model::NodeKind::Constant(v) = &node.kind {
                constant_count += 1;
                constant = Some(v.clone());
            }
            members.push(node_id);

            for &edge_id in &node.connections {
                let edge = model.edge(edge_id);
                if edge.is_slice() {
                    continue;
                }
                if model.node(edge.src).width != model.node(edge.dst).width {
                    return Err(SimError::WidthMismatch {
                        a: edge.src,
                        b: edge.dst,
                        width_a: model.node(edge.src).width,
                        width_b: model.node(edge.dst).width,
                    });
                }
                let other = if edge.src == node_id { edge.dst } else { edge.src };
                if unvisited.remove(&other) {
                    stack.push(other);
                }
            }
        }

        debug_assert!(
            constant_count <= 1,
            "net {start:?} has more than one constant node; invariant (iii) violated upstream"
        );

        Ok(Net {
            members,
            width,
            constant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    #[test]
    fn plain_edge_between_mismatched_widths_is_rejected() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("Bad", None);
        let narrow = b.add_port(root, "narrow", 8);
        let wide = b.add_port(root, "wide", 16);
        b.connect(narrow, wide);
        let reset = b.add_port(root, "reset", 1);
        let model = b.finish(root, reset);

        let err = NetBuilder::build(&model).unwrap_err();
        assert!(matches!(err, SimError::WidthMismatch { .. }));
    }

    #[test]
    fn disjoint_chains_form_separate_nets() {
        let mut b = ModelBuilder::new();
        let root = b.add_module("TwoChains", None);
        let a1 = b.add_port(root, "a1", 4);
        let a2 = b.add_port(root, "a2", 4);
        b.connect(a1, a2);
        let b1 = b.add_port(root, "b1", 4);
        let b2 = b.add_port(root, "b2", 4);
        b.connect(b1, b2);
        let reset = b.add_port(root, "reset", 1);
        let model = b.finish(root, reset);

        let result = NetBuilder::build(&model).unwrap();
        // {a1, a2}, {b1, b2}, {reset}: the two chains never merge.
        assert_eq!(result.nets.len(), 3);
        assert!(result.slice_edges.is_empty());
    }
}
