//! 技能表資料結構
//!
//! 只描述靜態設定（射程、冷卻、效果種類），不含任何戰鬥或棋盤邏輯。
use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub type SkillName = String;
/// 以「輪」為單位的持續時間 / 冷卻
pub type Rounds = u32;

/// 技能資料結構
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SkillType {
    pub name: SkillName,
    /// 未指定時與 `Default` 相同，射程 1..=1
    #[serde(default = "default_range")]
    pub min_range: usize,
    #[serde(default = "default_range")]
    pub max_range: usize,
    /// 施放後需等待的輪數（0 = 無冷卻）
    #[serde(default)]
    pub cooldown: Rounds,
    pub kind: SkillKind,
}

/// 技能效果種類
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Display)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillKind {
    /// 對單一敵方單位的攻擊
    Strike {
        #[serde(default)]
        power: i32,
        #[serde(default)]
        accuracy_bonus: i32,
        /// false 代表此攻擊不會引發反擊
        #[serde(default = "default_true")]
        provokes_counter: bool,
        /// 命中時附加的狀態
        #[serde(default)]
        inflicts: Option<StatusTemplate>,
    },
    /// 瞬間移動到 max_range 內的空格，不受路徑成本限制
    Teleport,
}

/// 狀態效果模板，數值皆為加值（可為負數）
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct StatusTemplate {
    pub name: String,
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub evasion: i32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub movement: i32,
    pub duration: Rounds,
}

impl SkillType {
    pub fn range(&self) -> (usize, usize) {
        (self.min_range, self.max_range)
    }

    /// 是否以格子為目標（否則以單位為目標）
    pub fn targets_cell(&self) -> bool {
        matches!(self.kind, SkillKind::Teleport)
    }
}

impl Default for SkillType {
    fn default() -> Self {
        SkillType {
            name: String::new(),
            min_range: default_range(),
            max_range: default_range(),
            cooldown: 0,
            kind: SkillKind::Strike {
                power: 0,
                accuracy_bonus: 0,
                provokes_counter: true,
                inflicts: None,
            },
        }
    }
}

fn default_range() -> usize {
    1
}

fn default_true() -> bool {
    true
}
