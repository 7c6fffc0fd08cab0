//! Workspace management core for the rift compositor: the ordered workspace
//! registry, the switch protocol, the target name grammar used by commands,
//! and the on-screen display shown while switching.

pub mod actor;
pub mod common;
pub mod model;
pub mod sys;
pub mod ui;
