//! Route handlers

pub mod catalog;
pub mod flow;
pub mod intervention;
pub mod monitor;
pub mod theme;
