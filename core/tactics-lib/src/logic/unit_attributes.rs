//! 單位屬性計算邏輯（狀態效果加總）

use crate::alias::{MovementCost, Rounds};
use crate::loader_schema::StatBlock;
use serde::{Deserialize, Serialize};
use skills_lib::StatusTemplate;

/// 單位身上的狀態效果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub template: StatusTemplate,
    pub remaining: Rounds,
}

impl StatusEffect {
    pub fn name(&self) -> &str {
        &self.template.name
    }
}

/// 加上狀態修正後的數值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectiveStats {
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub movement: MovementCost,
    pub evasion: i32,
    pub accuracy: i32,
}

/// 計算單位屬性
pub fn effective_stats(stats: &StatBlock, statuses: &[StatusEffect]) -> EffectiveStats {
    let mut attack = stats.attack;
    let mut defense = stats.defense;
    let mut speed = stats.speed;
    let mut movement = stats.movement as i32;
    let mut evasion = stats.evasion;

    for status in statuses {
        let t = &status.template;
        attack += t.attack;
        defense += t.defense;
        speed += t.speed;
        movement += t.movement;
        evasion += t.evasion;
    }

    EffectiveStats {
        attack,
        defense,
        speed,
        movement: movement.max(0) as MovementCost,
        evasion,
        accuracy: stats.accuracy,
    }
}

/// 套用狀態；同名狀態以新的數值與持續時間覆蓋，保留原本順序
///
/// 持續時間為 0 的狀態不會生效。
pub fn apply_status(statuses: &mut Vec<StatusEffect>, template: &StatusTemplate) {
    if template.duration == 0 {
        return;
    }
    let effect = StatusEffect {
        template: template.clone(),
        remaining: template.duration,
    };
    match statuses.iter_mut().find(|s| s.template.name == template.name) {
        Some(existing) => *existing = effect,
        None => statuses.push(effect),
    }
}

/// 輪末遞減持續時間，回傳到期移除的狀態名稱
pub fn tick_statuses(statuses: &mut Vec<StatusEffect>) -> Vec<String> {
    let mut expired = Vec::new();
    statuses.retain_mut(|status| {
        status.remaining = status.remaining.saturating_sub(1);
        if status.remaining == 0 {
            expired.push(status.template.name.clone());
            false
        } else {
            true
        }
    });
    expired
}
