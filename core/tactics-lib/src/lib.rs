//! 網格戰棋戰鬥引擎
//!
//! 一場戰鬥（[`encounter::Encounter`]）擁有棋盤、單位登錄表、回合排程、
//! 亂數與獎勵計算，外部只透過行動意圖與事件紀錄互動。

pub mod action;
pub mod alias;
pub mod constants;
pub mod core_types;
pub mod encounter;
pub mod error;
pub mod event;
pub mod loader;
pub mod loader_schema;
pub mod logic;
