//! 型別別名

pub use skills_lib::{Rounds, SkillName};

pub type Coord = usize;
pub type ID = u32;
pub type UnitId = u64;
pub type TypeName = String;
pub type MovementCost = u32;
pub type Experience = u32;
/// CombatEvent 流水號，供獎勵去重
pub type EventSeq = u64;
