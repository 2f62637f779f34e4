//! 核心戰鬥邏輯

pub mod algo;
pub mod combat;
pub mod grid;
pub mod movement;
pub mod registry;
pub mod reward;
pub mod scheduler;
pub mod teleport;
pub mod unit_attributes;
