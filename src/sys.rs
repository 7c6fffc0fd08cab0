pub mod cursor;
pub mod event;
pub mod geometry;
pub mod scene;
pub mod screen;
pub mod timer;
