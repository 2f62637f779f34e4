//! 獎勵計算：擊倒經驗、掉落物與戰鬥結束結算
//!
//! 以 CombatEvent 流水號去重，同一事件重複送入不會重複給獎勵。

use crate::alias::{EventSeq, Experience, UnitId};
use crate::core_types::Faction;
use crate::loader_schema::{LootEntry, RewardRules, UnitType};
use crate::logic::combat::CombatEvent;
use crate::logic::registry::{Unit, UnitRegistry};
use crate::logic::scheduler::Outcome;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// 一筆掉落物
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootDrop {
    pub item: String,
    pub quantity: u32,
    /// 掉落來源（被擊倒的單位）
    pub source: UnitId,
    /// 獲得掉落的陣營
    pub faction: Faction,
}

/// 單次擊倒的獎勵
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefeatReward {
    pub victor: UnitId,
    pub experience: Experience,
    pub loot: Vec<LootDrop>,
}

/// 戰鬥結束的獎勵總結
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSummary {
    pub outcome: Outcome,
    pub experience: BTreeMap<UnitId, Experience>,
    pub loot: Vec<LootDrop>,
}

/// 擊倒經驗 = (基礎 + 等級 × 每級經驗) × 倍率% + 單位類型額外經驗
///
/// 各步驟飽和運算，數值來自設定檔，不保證在範圍內。
pub fn defeat_experience(rules: &RewardRules, level: u32, unit_type: &UnitType) -> Experience {
    let base = rules
        .base_experience
        .saturating_add(level.saturating_mul(rules.experience_per_level));
    (base.saturating_mul(rules.multiplier_percent) / 100).saturating_add(unit_type.experience_bonus)
}

/// 依掉落表擲骰，每項獨立判定
pub fn roll_loot<R: Rng>(
    table: &[LootEntry],
    source: UnitId,
    faction: Faction,
    rng: &mut R,
) -> Vec<LootDrop> {
    table
        .iter()
        .filter(|entry| rng.random_range(0..100) < entry.chance)
        .map(|entry| LootDrop {
            item: entry.item.clone(),
            quantity: entry.quantity,
            source,
            faction,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct RewardEngine {
    rules: RewardRules,
    rng: ChaCha8Rng,
    consumed: HashSet<EventSeq>,
    experience: BTreeMap<UnitId, Experience>,
    loot: Vec<LootDrop>,
    summary: Option<RewardSummary>,
}

impl RewardEngine {
    /// `rng` 應為獨立於戰鬥判定的 stream
    pub fn new(rules: RewardRules, rng: ChaCha8Rng) -> Self {
        RewardEngine {
            rules,
            rng,
            consumed: HashSet::new(),
            experience: BTreeMap::new(),
            loot: Vec::new(),
            summary: None,
        }
    }

    /// 擊倒獎勵，經驗給予擊倒者
    ///
    /// 只讀取被擊倒單位，不修改它。事件不是擊倒、或流水號已處理過時回傳 None。
    pub fn on_defeat(
        &mut self,
        defeated: &Unit,
        victor: &Unit,
        defeated_type: &UnitType,
        event: &CombatEvent,
    ) -> Option<DefeatReward> {
        if !event.defeated || event.defender != defeated.id || event.attacker != victor.id {
            return None;
        }
        if self.summary.is_some() || !self.consumed.insert(event.seq) {
            return None;
        }

        let experience = defeat_experience(&self.rules, defeated.stats.level, defeated_type);
        let total = self.experience.entry(victor.id).or_default();
        *total = total.saturating_add(experience);
        let loot = roll_loot(&defeated_type.loot, defeated.id, victor.faction, &mut self.rng);
        self.loot.extend(loot.iter().cloned());

        tracing::info!(
            victor = victor.id,
            defeated = defeated.id,
            experience,
            drops = loot.len(),
            "擊倒獎勵"
        );
        Some(DefeatReward {
            victor: victor.id,
            experience,
            loot,
        })
    }

    /// 戰鬥結束結算；結果會被記住，重複呼叫回傳相同的總結
    ///
    /// - 只保留勝方的掉落物，平手時沒有掉落物
    /// - 勝方存活單位獲得勝利加成經驗
    pub fn on_encounter_end(&mut self, outcome: Outcome, registry: &UnitRegistry) -> &RewardSummary {
        let rules = self.rules;
        let experience = &self.experience;
        let loot = &self.loot;
        self.summary.get_or_insert_with(|| {
            let mut experience = experience.clone();
            let loot = match outcome {
                Outcome::Victory { faction } => {
                    if rules.victory_bonus > 0 {
                        for unit in registry.living_units().filter(|u| u.faction == faction) {
                            let total = experience.entry(unit.id).or_default();
                            *total = total.saturating_add(rules.victory_bonus);
                        }
                    }
                    loot.iter().filter(|d| d.faction == faction).cloned().collect()
                }
                Outcome::Draw => Vec::new(),
            };
            RewardSummary {
                outcome,
                experience,
                loot,
            }
        })
    }

    pub fn experience_of(&self, unit_id: UnitId) -> Experience {
        self.experience.get(&unit_id).copied().unwrap_or(0)
    }

    pub fn pending_loot(&self) -> &[LootDrop] {
        &self.loot
    }

    pub fn summary(&self) -> Option<&RewardSummary> {
        self.summary.as_ref()
    }
}
