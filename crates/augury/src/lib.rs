//! Augury: an IOC intelligence lookup client rendered as a terminal UI.
//!
//! The binary wires four parts together: configuration with a preference
//! persistence port ([`config`]), the backend HTTP client ([`api`]), the
//! fixed lookup-link table ([`links`]), and the TUI itself ([`tui`]) with
//! its tabbed session store and record rendering.

pub mod api;
pub mod cli;
pub mod config;
pub mod links;
pub mod tui;
