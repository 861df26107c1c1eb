/*
 * Copyright (c) pvgss contributors.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *        http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Monotone access structures made of nested threshold gates.
//!
//! Callers describe a structure with the recursive [`Policy`] value (which
//! can also be decoded from JSON); [`AccessTree::new`] validates it and
//! flattens it into an arena of nodes addressed by index.

use std::collections::BTreeSet;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PvgssError, Result};

/// index of a node inside an [`AccessTree`]
pub type NodeId = usize;

/// Nested threshold-gate description of who may reconstruct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// a single participant
    Leaf { id: u64 },
    /// satisfied when at least `threshold` of `children` are
    Threshold { threshold: usize, children: Vec<Policy> },
}

impl Policy {
    pub fn leaf(id: u64) -> Self {
        Policy::Leaf { id }
    }

    pub fn threshold(threshold: usize, children: Vec<Policy>) -> Self {
        Policy::Threshold { threshold, children }
    }

    /// all children required
    pub fn and(children: Vec<Policy>) -> Self {
        let n = children.len();
        Policy::threshold(n, children)
    }

    /// any one child suffices
    pub fn or(children: Vec<Policy>) -> Self {
        Policy::threshold(1, children)
    }

    /// parses a policy from json
    pub fn from_str(s: &str) -> Result<Self> {
        let policy: Policy = serde_json::from_str(s)
            .with_context(|| format!("Failed to decode policy JSON from {}", s))?;
        Ok(policy)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Leaf { id: u64 },
    Gate { threshold: usize, children: Vec<NodeId> },
}

/// A validated, immutable access tree.
///
/// Nodes are allocated parent-first, so every child has a larger index
/// than its parent and the root is node 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessTree {
    nodes: Vec<Node>,
    leaves: Vec<NodeId>,
}

impl AccessTree {
    pub fn new(policy: &Policy) -> Result<Self> {
        let mut nodes: Vec<Option<Node>> = vec![None];
        let mut stack: Vec<(&Policy, NodeId)> = vec![(policy, 0)];

        while let Some((p, slot)) = stack.pop() {
            match p {
                Policy::Leaf { id } => nodes[slot] = Some(Node::Leaf { id: *id }),
                Policy::Threshold { threshold, children } => {
                    let n = children.len();
                    if n == 0 {
                        return Err(PvgssError::Construction(format!(
                            "gate at node {} has no children",
                            slot
                        )));
                    }
                    if *threshold == 0 || *threshold > n {
                        return Err(PvgssError::Construction(format!(
                            "gate at node {} has threshold {} outside [1, {}]",
                            slot, threshold, n
                        )));
                    }

                    let first = nodes.len();
                    nodes.resize(first + n, None);
                    let ids: Vec<NodeId> = (first..first + n).collect();
                    // reversed so that children are expanded left to right
                    for (child, &id) in children.iter().zip(&ids).rev() {
                        stack.push((child, id));
                    }
                    nodes[slot] = Some(Node::Gate {
                        threshold: *threshold,
                        children: ids,
                    });
                }
            }
        }

        let nodes: Vec<Node> = nodes
            .into_iter()
            .collect::<Option<_>>()
            .ok_or_else(|| PvgssError::Construction("unfilled node slot".into()))?;
        let leaves = leaf_order(&nodes);

        Ok(AccessTree { nodes, leaves })
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf nodes in left-to-right order. Position `i` here is row `i` of
    /// the compiled matrix.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Participant identities of the leaves, left to right.
    pub fn leaf_ids(&self) -> Vec<u64> {
        self.leaves
            .iter()
            .filter_map(|&l| match self.nodes[l] {
                Node::Leaf { id } => Some(id),
                Node::Gate { .. } => None,
            })
            .collect()
    }

    /// Whether the leaves at the given left-to-right positions satisfy
    /// every threshold on the way to the root.
    pub fn is_satisfied_by(&self, positions: &BTreeSet<usize>) -> bool {
        let mut satisfied = vec![false; self.nodes.len()];
        for (pos, &leaf) in self.leaves.iter().enumerate() {
            satisfied[leaf] = positions.contains(&pos);
        }
        // children always sit after their parent
        for id in (0..self.nodes.len()).rev() {
            if let Node::Gate { threshold, children } = &self.nodes[id] {
                let count = children.iter().filter(|&&c| satisfied[c]).count();
                satisfied[id] = count >= *threshold;
            }
        }
        satisfied[self.root()]
    }
}

fn leaf_order(nodes: &[Node]) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut stack = vec![0];
    while let Some(id) = stack.pop() {
        match &nodes[id] {
            Node::Leaf { .. } => order.push(id),
            Node::Gate { children, .. } => stack.extend(children.iter().rev()),
        }
    }
    order
}
