//! The scene graph the compositor renders from.
//!
//! The workspace core only needs a handful of operations: subtrees that can
//! be toggled as a whole (one per workspace), buffer nodes it can position and
//! attach content to (the OSD), and offscreen buffers drawn from a display
//! list. [`HeadlessScene`] keeps the whole graph in memory so a session can
//! run without a GPU and tests can inspect what would be shown.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;
use tracing::{debug, trace};

use super::geometry::{Point, Rect, Size};
use crate::common::config::Color;

new_key_type! {
    pub struct NodeId;
    pub struct BufferId;
}

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("failed to allocate {width}x{height} buffer at scale {scale}")]
    BufferAllocation { width: u32, height: u32, scale: f64 },
}

/// One drawing instruction in buffer-local, unscaled coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum DrawOp {
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color },
    /// Border of `width` drawn inside the edges of the whole buffer.
    Border { width: f64, color: Color },
    Text {
        origin: Point,
        max_width: u32,
        font_size: f64,
        color: Color,
        text: String,
    },
}

pub trait Scene {
    fn root(&self) -> NodeId;

    fn create_tree(&mut self, parent: NodeId) -> NodeId;

    fn create_buffer_node(&mut self, parent: NodeId) -> NodeId;

    /// Destroys `node` together with its subtree and any attached buffers.
    fn destroy_node(&mut self, node: NodeId);

    fn set_enabled(&mut self, node: NodeId, enabled: bool);

    fn is_enabled(&self, node: NodeId) -> bool;

    fn set_position(&mut self, node: NodeId, at: Point);

    /// Allocates an offscreen buffer of `size` logical pixels at `scale` and
    /// draws `ops` into it.
    fn render_buffer(
        &mut self,
        size: Size,
        scale: f64,
        ops: &[DrawOp],
    ) -> Result<BufferId, SceneError>;

    /// Attaches `buffer` to a buffer node, or detaches with `None`. The node
    /// takes ownership; a replaced or detached buffer is released.
    fn set_buffer(&mut self, node: NodeId, buffer: Option<BufferId>, dest: Size);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Tree,
    Buffer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub enabled: bool,
    pub position: Point,
    pub buffer: Option<BufferId>,
    pub dest_size: Size,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneBuffer {
    pub size: Size,
    pub scale: f64,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug)]
struct SceneGraph {
    root: NodeId,
    nodes: SlotMap<NodeId, SceneNode>,
    buffers: SlotMap<BufferId, SceneBuffer>,
    /// Largest physical width a buffer may have; models allocation failure.
    max_physical_width: Option<u32>,
}

impl SceneGraph {
    fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode {
            kind: NodeKind::Tree,
            parent: None,
            enabled: true,
            position: Point::default(),
            buffer: None,
            dest_size: Size::default(),
        });
        Self {
            root,
            nodes,
            buffers: SlotMap::with_key(),
            max_physical_width: None,
        }
    }

    fn insert(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        assert!(self.nodes.contains_key(parent), "parent node does not exist");
        self.nodes.insert(SceneNode {
            kind,
            parent: Some(parent),
            enabled: true,
            position: Point::default(),
            buffer: None,
            dest_size: Size::default(),
        })
    }

    fn destroy(&mut self, node: NodeId) {
        let children: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(node))
            .map(|(id, _)| id)
            .collect();
        for child in children {
            self.destroy(child);
        }
        if let Some(removed) = self.nodes.remove(node) {
            if let Some(buffer) = removed.buffer {
                self.buffers.remove(buffer);
            }
        }
    }

    fn visible(&self, mut node: NodeId) -> bool {
        loop {
            let Some(n) = self.nodes.get(node) else { return false };
            if !n.enabled {
                return false;
            }
            match n.parent {
                Some(parent) => node = parent,
                None => return true,
            }
        }
    }
}

/// An in-memory scene. Clones share the same graph.
#[derive(Debug, Clone)]
pub struct HeadlessScene(Rc<RefCell<SceneGraph>>);

impl Default for HeadlessScene {
    fn default() -> Self { Self::new() }
}

impl HeadlessScene {
    pub fn new() -> Self { Self(Rc::new(RefCell::new(SceneGraph::new()))) }

    /// Makes buffer allocation fail when `width * scale` exceeds `limit`.
    pub fn set_max_physical_width(&self, limit: Option<u32>) {
        self.0.borrow_mut().max_physical_width = limit;
    }

    pub fn node(&self, node: NodeId) -> Option<SceneNode> { self.0.borrow().nodes.get(node).cloned() }

    pub fn buffer(&self, buffer: BufferId) -> Option<SceneBuffer> {
        self.0.borrow().buffers.get(buffer).cloned()
    }

    /// Whether `node` and all of its ancestors are enabled.
    pub fn is_visible(&self, node: NodeId) -> bool { self.0.borrow().visible(node) }

    pub fn node_count(&self) -> usize { self.0.borrow().nodes.len() }

    pub fn buffer_count(&self) -> usize { self.0.borrow().buffers.len() }
}

impl Scene for HeadlessScene {
    fn root(&self) -> NodeId { self.0.borrow().root }

    fn create_tree(&mut self, parent: NodeId) -> NodeId {
        self.0.borrow_mut().insert(parent, NodeKind::Tree)
    }

    fn create_buffer_node(&mut self, parent: NodeId) -> NodeId {
        self.0.borrow_mut().insert(parent, NodeKind::Buffer)
    }

    fn destroy_node(&mut self, node: NodeId) {
        trace!(?node, "destroying scene node");
        self.0.borrow_mut().destroy(node);
    }

    fn set_enabled(&mut self, node: NodeId, enabled: bool) {
        if let Some(n) = self.0.borrow_mut().nodes.get_mut(node) {
            n.enabled = enabled;
        }
    }

    fn is_enabled(&self, node: NodeId) -> bool {
        self.0.borrow().nodes.get(node).is_some_and(|n| n.enabled)
    }

    fn set_position(&mut self, node: NodeId, at: Point) {
        if let Some(n) = self.0.borrow_mut().nodes.get_mut(node) {
            n.position = at;
        }
    }

    fn render_buffer(
        &mut self,
        size: Size,
        scale: f64,
        ops: &[DrawOp],
    ) -> Result<BufferId, SceneError> {
        let mut graph = self.0.borrow_mut();
        let physical_width = (size.width as f64 * scale).ceil() as u32;
        if graph.max_physical_width.is_some_and(|limit| physical_width > limit) {
            return Err(SceneError::BufferAllocation {
                width: size.width,
                height: size.height,
                scale,
            });
        }
        debug!(?size, scale, ops = ops.len(), "rendered offscreen buffer");
        Ok(graph.buffers.insert(SceneBuffer { size, scale, ops: ops.to_vec() }))
    }

    fn set_buffer(&mut self, node: NodeId, buffer: Option<BufferId>, dest: Size) {
        let mut graph = self.0.borrow_mut();
        let Some(n) = graph.nodes.get_mut(node) else { return };
        debug_assert_eq!(n.kind, NodeKind::Buffer);
        let old = std::mem::replace(&mut n.buffer, buffer);
        n.dest_size = dest;
        if let Some(old) = old {
            if Some(old) != buffer {
                graph.buffers.remove(old);
            }
        }
    }
}
