//! Loader 相關的資料結構定義
//!
//! 戰鬥開始時讀入，戰鬥期間不可變更。

use crate::alias::{Coord, Experience, MovementCost, Rounds, SkillName, TypeName, UnitId};
use crate::constants::IMPASSABLE_MOVEMENT_COST;
use crate::core_types::{DistanceMetric, Faction, Position, Reach, Terrain};
use serde::{Deserialize, Serialize};
use skills_lib::SkillType;
use std::collections::BTreeMap;

// ============================================================================
// 地形系統 (Terrain System)
// ============================================================================

/// 地形屬性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainProfile {
    /// 進入此格的移動成本，`IMPASSABLE_MOVEMENT_COST` = 無法通過
    pub movement_cost: MovementCost,
    /// 站在此格的防守方獲得的防禦加值
    #[serde(default)]
    pub defense_bonus: i32,
    /// 站在此格的防守方獲得的閃避加值
    #[serde(default)]
    pub evasion_bonus: i32,
    #[serde(default)]
    pub blocks_sight: bool,
}

impl TerrainProfile {
    pub fn is_passable(&self) -> bool {
        self.movement_cost > IMPASSABLE_MOVEMENT_COST
    }
}

/// 預設地形表
pub fn default_terrain_profile(terrain: Terrain) -> TerrainProfile {
    let (movement_cost, defense_bonus, evasion_bonus, blocks_sight) = match terrain {
        Terrain::Plain => (1, 0, 0, false),
        Terrain::Hill => (2, 1, 5, false),
        Terrain::Forest => (2, 0, 15, true),
        Terrain::ShallowWater => (3, -1, -5, false),
        Terrain::DeepWater => (0, 0, 0, false),
        Terrain::Wall => (0, 0, 0, true),
    };
    TerrainProfile {
        movement_cost,
        defense_bonus,
        evasion_bonus,
        blocks_sight,
    }
}

// ============================================================================
// 單位系統 (Unit System)
// ============================================================================

/// 單位基礎數值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub movement: MovementCost,
    #[serde(default)]
    pub attack_range: Reach,
    #[serde(default)]
    pub evasion: i32,
    #[serde(default)]
    pub accuracy: i32,
    #[serde(default = "default_level")]
    pub level: u32,
    /// 是否具備反擊能力
    #[serde(default = "default_true")]
    pub can_counter: bool,
}

impl Default for StatBlock {
    fn default() -> Self {
        StatBlock {
            max_hp: 10,
            attack: 5,
            defense: 0,
            speed: 5,
            movement: 3,
            attack_range: Reach::default(),
            evasion: 0,
            accuracy: 0,
            level: default_level(),
            can_counter: true,
        }
    }
}

/// 掉落表項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: String,
    /// 掉落機率（百分比）
    pub chance: u32,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// 單位類型定義
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    pub name: TypeName,
    pub stats: StatBlock,
    #[serde(default)]
    pub skills: Vec<SkillName>,
    #[serde(default)]
    pub loot: Vec<LootEntry>,
    /// 擊倒此類單位時額外給予的經驗
    #[serde(default)]
    pub experience_bonus: Experience,
}

/// 單位配置（關卡中的單位放置）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// 未指定時依配置順序自動編號
    #[serde(default)]
    pub id: Option<UnitId>,
    pub unit_type_name: TypeName,
    pub faction: Faction,
    pub position: Position,
}

// ============================================================================
// 規則 (Rules)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementRules {
    /// 可穿越友軍（但不可停留）
    pub allied_pass_through: bool,
    /// 允許斜向移動，同時射程改用 Chebyshev 距離
    pub diagonal: bool,
}

impl Default for MovementRules {
    fn default() -> Self {
        MovementRules {
            allied_pass_through: true,
            diagonal: false,
        }
    }
}

impl MovementRules {
    pub fn metric(&self) -> DistanceMetric {
        if self.diagonal {
            DistanceMetric::Chebyshev
        } else {
            DistanceMetric::Manhattan
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// 命中率 = base + (命中 - 閃避)，再限制在 [min, max]
    pub base_hit_chance: i32,
    pub min_hit_chance: u32,
    pub max_hit_chance: u32,
    /// 遠程攻擊是否需要視線
    pub line_of_sight: bool,
}

impl Default for CombatRules {
    fn default() -> Self {
        CombatRules {
            base_hit_chance: 80,
            min_hit_chance: 5,
            max_hit_chance: 95,
            line_of_sight: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterRules {
    pub enabled: bool,
    /// 每輪最多反擊次數，None = 不限
    pub max_per_round: Option<u32>,
    /// 反擊後需等待的輪數
    pub cooldown: Rounds,
}

impl Default for CounterRules {
    fn default() -> Self {
        CounterRules {
            enabled: true,
            max_per_round: Some(1),
            cooldown: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardRules {
    pub base_experience: Experience,
    pub experience_per_level: Experience,
    pub multiplier_percent: u32,
    /// 戰鬥勝利時，勝方存活單位額外獲得的經驗
    pub victory_bonus: Experience,
}

impl Default for RewardRules {
    fn default() -> Self {
        RewardRules {
            base_experience: 10,
            experience_per_level: 5,
            multiplier_percent: 100,
            victory_bonus: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub movement: MovementRules,
    pub combat: CombatRules,
    pub counter: CounterRules,
    pub reward: RewardRules,
}

// ============================================================================
// 戰鬥配置 (Encounter Config)
// ============================================================================

/// 棋盤設定
///
/// `terrain_rows` 為空時整張棋盤都是平地；否則每列以空白分隔地形符號，
/// 列數與每列符號數必須等於 height / width。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: Coord,
    pub height: Coord,
    #[serde(default)]
    pub terrain_rows: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    pub board: BoardConfig,
    /// 覆寫預設地形表，未列出的地形使用預設值
    #[serde(default)]
    pub terrain: BTreeMap<Terrain, TerrainProfile>,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default)]
    pub skills: Vec<SkillType>,
    #[serde(default)]
    pub unit_types: Vec<UnitType>,
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
}

fn default_level() -> u32 {
    1
}

fn default_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}
