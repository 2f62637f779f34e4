//! 單位登錄表
//!
//! 擁有所有單位（含已擊倒者）。被擊倒只是旗標，單位不會被移除。

use crate::alias::{Rounds, SkillName, TypeName, UnitId};
use crate::core_types::{Faction, Position};
use crate::error::{Result, TargetIssue, UnitError};
use crate::loader_schema::{StatBlock, UnitType};
use crate::logic::unit_attributes::{EffectiveStats, StatusEffect, effective_stats};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// 戰鬥中的單位
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub type_name: TypeName,
    pub faction: Faction,
    pub stats: StatBlock,
    pub hp: i32,
    /// 被擊倒後為 None
    pub position: Option<Position>,
    pub statuses: Vec<StatusEffect>,
    pub skills: Vec<SkillName>,
    /// 技能名稱 -> 剩餘冷卻輪數（0 的項目會被移除）
    pub skill_cooldowns: BTreeMap<SkillName, Rounds>,
    pub counters_this_round: u32,
    pub counter_cooldown: Rounds,
    pub defeated: bool,
}

impl Unit {
    pub fn from_type(id: UnitId, unit_type: &UnitType, faction: Faction, position: Position) -> Self {
        Unit {
            id,
            type_name: unit_type.name.clone(),
            faction,
            stats: unit_type.stats.clone(),
            hp: unit_type.stats.max_hp,
            position: Some(position),
            statuses: Vec::new(),
            skills: unit_type.skills.clone(),
            skill_cooldowns: BTreeMap::new(),
            counters_this_round: 0,
            counter_cooldown: 0,
            defeated: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.defeated
    }

    pub fn effective(&self) -> EffectiveStats {
        effective_stats(&self.stats, &self.statuses)
    }

    pub fn cooldown_of(&self, skill_name: &str) -> Rounds {
        self.skill_cooldowns.get(skill_name).copied().unwrap_or(0)
    }

    /// 輪末遞減技能與反擊冷卻
    pub fn tick_cooldowns(&mut self) {
        self.skill_cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
        self.counter_cooldown = self.counter_cooldown.saturating_sub(1);
    }
}

/// 單位登錄表：Vec 保留登錄順序，index 提供 id 查詢
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: Vec<Unit>,
    index: HashMap<UnitId, usize>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, unit: Unit) -> Result<()> {
        if self.index.contains_key(&unit.id) {
            return Err(UnitError::DuplicateId { unit_id: unit.id }.into());
        }
        self.index.insert(unit.id, self.units.len());
        self.units.push(unit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains(&self, unit_id: UnitId) -> bool {
        self.index.contains_key(&unit_id)
    }

    pub fn get(&self, unit_id: UnitId) -> Result<&Unit> {
        self.index
            .get(&unit_id)
            .map(|&i| &self.units[i])
            .ok_or_else(|| UnitError::NotFound { unit_id }.into())
    }

    pub fn get_mut(&mut self, unit_id: UnitId) -> Result<&mut Unit> {
        match self.index.get(&unit_id) {
            Some(&i) => Ok(&mut self.units[i]),
            None => Err(UnitError::NotFound { unit_id }.into()),
        }
    }

    /// 取得存活單位，已擊倒時回傳 `TargetIssue::TargetDefeated`
    pub fn living(&self, unit_id: UnitId) -> Result<&Unit> {
        let unit = self.get(unit_id)?;
        if unit.defeated {
            return Err(TargetIssue::TargetDefeated(unit_id).into());
        }
        Ok(unit)
    }

    /// 依登錄表記錄的位置查詢存活單位
    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.living_units().find(|u| u.position == Some(pos))
    }

    /// 登錄順序
    pub fn registration_order(&self, unit_id: UnitId) -> Option<usize> {
        self.index.get(&unit_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_alive())
    }

    /// 仍有存活單位的陣營
    pub fn living_factions(&self) -> BTreeSet<Faction> {
        self.living_units().map(|u| u.faction).collect()
    }

    pub fn faction_of(&self, unit_id: UnitId) -> Option<Faction> {
        self.get(unit_id).ok().map(|u| u.faction)
    }
}
