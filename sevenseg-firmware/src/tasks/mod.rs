//! Embassy async tasks
//!
//! Each task runs independently and talks to the display through its
//! `&self` methods.

pub mod demo;
pub mod refresh;
pub mod tick;

pub use demo::demo_task;
pub use refresh::refresh_task;
pub use tick::tick_task;
