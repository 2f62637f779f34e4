//! 整合測試共用輔助
#![allow(dead_code)]

mod encounter_builder;

pub use encounter_builder::*;
