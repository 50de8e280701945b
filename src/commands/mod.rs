//! Host command handlers
//!
//! Thin async entry points a host bridge dispatches into. Each one delegates
//! to the shared orchestrator and converts failures into `ErrorResponse`.

pub mod media;
