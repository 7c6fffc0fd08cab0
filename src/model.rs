pub mod server;
pub mod target;
pub mod view;
pub mod workspace;

pub use target::Direction;
pub use view::{ViewId, ViewStore, Views};
pub use workspace::{Workspace, WorkspaceId, WorkspaceRegistry};
