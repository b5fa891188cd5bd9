//! Virtualized list engine: a scrolling window of recycled renderers over a
//! long, variable-height entry sequence.
//!
//! [`controller::ListController`] is the entry point. It owns a
//! [`pool::RendererPool`] and keeps only the entries near the viewport bound
//! to renderer instances, standing in for everything scrolled past with a
//! single spacer extent.

pub mod axis;
pub mod config;
pub mod controller;
pub mod entry;
pub mod load;
pub mod pool;
pub mod renderer;
pub mod source;
pub mod viewer;
pub mod watch;
