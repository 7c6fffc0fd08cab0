use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::target::Direction;
use crate::sys::scene::{NodeId, Scene};

/// Position of a workspace in the registry. The registry never reorders or
/// removes workspaces while it is alive, so the position is a stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(usize);

impl WorkspaceId {
    pub fn index(self) -> usize { self.0 }

    /// 1-based position, the way users count workspaces.
    pub fn ordinal(self) -> usize { self.0 + 1 }
}

#[derive(Debug)]
pub struct Workspace {
    name: String,
    tree: NodeId,
}

impl Workspace {
    pub fn name(&self) -> &str { &self.name }

    /// The scene subtree every view on this workspace is parented to.
    pub fn tree(&self) -> NodeId { self.tree }
}

/// The ordered set of workspaces plus the `current` and `last` pointers.
#[derive(Debug)]
pub struct WorkspaceRegistry {
    workspaces: Vec<Workspace>,
    current: WorkspaceId,
    last: Option<WorkspaceId>,
}

impl WorkspaceRegistry {
    /// Creates one workspace per name, in order, each with its own subtree
    /// under `parent`. The first becomes current; all others start hidden.
    ///
    /// Panics if `names` is empty: a compositor without workspaces is a
    /// configuration error that must be caught before we get here.
    pub fn new<I>(names: I, scene: &mut dyn Scene, parent: NodeId) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut workspaces = Vec::new();
        for name in names {
            let tree = scene.create_tree(parent);
            if !workspaces.is_empty() {
                scene.set_enabled(tree, false);
            }
            workspaces.push(Workspace { name: name.into(), tree });
        }
        assert!(!workspaces.is_empty(), "workspace registry needs at least one workspace");
        info!(
            count = workspaces.len(),
            current = %workspaces[0].name,
            "initialized workspaces"
        );
        Self {
            workspaces,
            current: WorkspaceId(0),
            last: None,
        }
    }

    pub fn current(&self) -> WorkspaceId { self.current }

    pub fn last(&self) -> Option<WorkspaceId> { self.last }

    pub fn is_active(&self, id: WorkspaceId) -> bool { self.current == id }

    pub fn len(&self) -> usize { self.workspaces.len() }

    pub fn is_empty(&self) -> bool { self.workspaces.is_empty() }

    /// Panics if `id` did not come from this registry.
    pub fn get(&self, id: WorkspaceId) -> &Workspace {
        self.workspaces
            .get(id.0)
            .unwrap_or_else(|| panic!("{id:?} is not part of this registry"))
    }

    pub fn name(&self, id: WorkspaceId) -> &str { self.get(id).name() }

    pub fn all(&self) -> impl ExactSizeIterator<Item = (WorkspaceId, &Workspace)> + Clone + '_ {
        self.workspaces.iter().enumerate().map(|(i, ws)| (WorkspaceId(i), ws))
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = WorkspaceId> + Clone + '_ {
        (0..self.workspaces.len()).map(WorkspaceId)
    }

    pub fn contains(&self, id: WorkspaceId) -> bool { id.0 < self.workspaces.len() }

    /// Looks up the workspace at the 1-based position `ordinal`.
    pub fn by_ordinal(&self, ordinal: usize) -> Option<WorkspaceId> {
        let index = ordinal.checked_sub(1)?;
        self.contains(WorkspaceId(index)).then_some(WorkspaceId(index))
    }

    /// The first workspace whose name matches, ignoring ASCII case.
    pub fn by_name(&self, name: &str) -> Option<WorkspaceId> {
        self.all().find(|(_, ws)| ws.name.eq_ignore_ascii_case(name)).map(|(id, _)| id)
    }

    pub fn neighbor(&self, anchor: WorkspaceId, dir: Direction, wrap: bool) -> Option<WorkspaceId> {
        dir.step(anchor.0, self.workspaces.len(), wrap).map(WorkspaceId)
    }

    /// Records `target` as current and the outgoing workspace as last.
    /// Scene and focus bookkeeping is the switcher's job.
    pub(crate) fn set_current(&mut self, target: WorkspaceId) {
        assert!(self.contains(target), "{target:?} is not part of this registry");
        self.last = Some(self.current);
        self.current = target;
    }

    /// Destroys every workspace subtree. Consuming the registry guarantees
    /// nothing else can still refer to its workspaces.
    pub fn teardown(mut self, scene: &mut dyn Scene) {
        for ws in self.workspaces.drain(..) {
            debug!(name = %ws.name, "destroying workspace");
            scene.destroy_node(ws.tree);
        }
        self.last = None;
        assert!(self.workspaces.is_empty());
    }
}
