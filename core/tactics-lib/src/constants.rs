//! 遊戲常數定義

use crate::alias::MovementCost;

/// 地形成本為 0 代表無法通過
pub const IMPASSABLE_MOVEMENT_COST: MovementCost = 0;

/// 命中判定的骰值範圍（0..100）
pub const HIT_ROLL_SIDES: u32 = 100;

/// 掉落物判定使用的 ChaCha stream，與戰鬥判定分開
pub const LOOT_RNG_STREAM: u64 = 1;
