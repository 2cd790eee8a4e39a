//! Arena owning the expression nodes of the statement being compiled.
//!
//! Nodes are addressed by generation-tagged handles. Releasing a node bumps
//! its slot's generation, so a handle kept past release is detected instead of
//! aliasing whatever reuses the slot.

use kestrel_bytecode::Reg;
use kestrel_core::Symbol;
use rowan::TextRange;
use thiserror::Error;

use super::types::{Constant, ValueType};

/// Where an expression's value lives.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Operand {
    Constant(Constant),
    /// Held in a temporary register owned by the node.
    Register(Reg),
    /// A variable's stack slot, `[ebp - offset]`.
    Addressed { offset: i32, name: Symbol },
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ExprNode {
    pub operand: Operand,
    pub ty: ValueType,
    pub span: TextRange,
}

impl ExprNode {
    pub fn constant(value: Constant, span: TextRange) -> Self {
        Self {
            operand: Operand::Constant(value),
            ty: value.ty(),
            span,
        }
    }

    pub fn as_constant(&self) -> Option<Constant> {
        match self.operand {
            Operand::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn register(&self) -> Option<Reg> {
        match self.operand {
            Operand::Register(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expression node {index} (generation {generation}) used after release")]
pub struct StaleNode {
    pub index: u32,
    pub generation: u32,
}

impl From<NodeId> for StaleNode {
    fn from(id: NodeId) -> Self {
        Self {
            index: id.index,
            generation: id.generation,
        }
    }
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    node: Option<ExprNode>,
}

#[derive(Debug, Default)]
pub struct NodeArena {
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, node: ExprNode) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.node = Some(node);
            return NodeId {
                index,
                generation: entry.generation,
            };
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.entries
            .get(id.index as usize)
            .filter(|e| e.generation == id.generation && e.node.is_some())
    }

    pub fn get(&self, id: NodeId) -> Result<&ExprNode, StaleNode> {
        self.entry(id)
            .and_then(|e| e.node.as_ref())
            .ok_or(StaleNode::from(id))
    }

    /// Release a node and hand back its contents.
    pub fn take(&mut self, id: NodeId) -> Result<ExprNode, StaleNode> {
        if self.entry(id).is_none() {
            return Err(id.into());
        }
        let entry = &mut self.entries[id.index as usize];
        let node = entry.node.take().ok_or(StaleNode::from(id))?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Ok(node)
    }

    pub fn release(&mut self, id: NodeId) -> Result<(), StaleNode> {
        self.take(id).map(|_| ())
    }

    /// Release every outstanding node. Returns how many were live.
    pub fn release_all(&mut self) -> usize {
        let released = self.live;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.node.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
        released
    }

    pub fn live_count(&self) -> usize {
        self.live
    }
}
