//! 戰鬥結算：命中、傷害、擊倒與反擊
//!
//! - 一次攻擊只骰一次 random
//! - 驗證全部通過才開始修改狀態
//! - 反擊以 `is_counter` 限制遞迴深度，反擊不會再引發反擊

use crate::alias::{EventSeq, SkillName, UnitId};
use crate::constants::HIT_ROLL_SIDES;
use crate::core_types::Reach;
use crate::error::{Result, TargetIssue};
use crate::loader_schema::Rules;
use crate::logic::grid::Grid;
use crate::logic::registry::{Unit, UnitRegistry};
use crate::logic::unit_attributes::apply_status;
use serde::{Deserialize, Serialize};
use skills_lib::{SkillKind, SkillType, StatusTemplate};

/// 一次攻擊的參數（基本攻擊或 Strike 技能）
#[derive(Debug, Clone, PartialEq)]
pub struct Strike {
    pub skill: Option<SkillName>,
    pub reach: Reach,
    pub power: i32,
    pub accuracy_bonus: i32,
    pub provokes_counter: bool,
    pub inflicts: Option<StatusTemplate>,
}

impl Strike {
    /// 單位的基本攻擊
    pub fn basic(unit: &Unit) -> Self {
        Strike {
            skill: None,
            reach: unit.stats.attack_range,
            power: 0,
            accuracy_bonus: 0,
            provokes_counter: true,
            inflicts: None,
        }
    }

    /// Strike 類技能；其他種類回傳 None
    pub fn from_skill(skill: &SkillType) -> Option<Self> {
        match &skill.kind {
            SkillKind::Strike {
                power,
                accuracy_bonus,
                provokes_counter,
                inflicts,
            } => Some(Strike {
                skill: Some(skill.name.clone()),
                reach: Reach::from(skill.range()),
                power: *power,
                accuracy_bonus: *accuracy_bonus,
                provokes_counter: *provokes_counter,
                inflicts: inflicts.clone(),
            }),
            SkillKind::Teleport => None,
        }
    }
}

/// 一次攻擊的完整紀錄（稽核與獎勵計算的單位）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub seq: EventSeq,
    pub attacker: UnitId,
    pub defender: UnitId,
    pub skill: Option<SkillName>,
    pub is_counter: bool,
    pub roll: u32,
    pub hit_chance: u32,
    pub hit: bool,
    pub damage: i32,
    pub defender_hp: i32,
    pub defeated: bool,
    pub inflicted: Option<String>,
    pub counter: Option<Box<CombatEvent>>,
}

impl CombatEvent {
    /// 依因果順序走訪本事件與巢狀反擊
    pub fn chain(&self) -> impl Iterator<Item = &CombatEvent> {
        std::iter::successors(Some(self), |event| event.counter.as_deref())
    }
}

/// 命中判定 context，所有修正來源（技能、狀態、地形）需由呼叫端加總完畢
#[derive(Debug, Clone, Copy)]
pub struct HitContext {
    pub accuracy: i32,
    pub evasion: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResult {
    pub roll: u32,
    pub chance: u32,
    pub hit: bool,
}

/// 命中率 = base + 命中 - 閃避，限制在 [min, max]
pub fn hit_chance(ctx: &HitContext, rules: &Rules) -> u32 {
    let combat = rules.combat;
    let raw = combat.base_hit_chance + ctx.accuracy - ctx.evasion;
    let min = combat.min_hit_chance.min(combat.max_hit_chance) as i32;
    let max = combat.max_hit_chance as i32;
    raw.clamp(min, max) as u32
}

/// 命中機制：只骰一次 random，骰值小於命中率即命中
pub fn resolve_hit<R: rand::Rng>(ctx: &HitContext, rules: &Rules, rng: &mut R) -> HitResult {
    let chance = hit_chance(ctx, rules);
    let roll = rng.random_range(0..HIT_ROLL_SIDES);
    HitResult {
        roll,
        chance,
        hit: roll < chance,
    }
}

/// 傷害 = max(0, 攻擊 + 威力 - 防禦)
pub fn damage(attack: i32, power: i32, defense: i32) -> i32 {
    (attack + power - defense).max(0)
}

/// 驗證攻擊是否合法（不修改狀態）
pub fn validate_strike(
    grid: &Grid,
    registry: &UnitRegistry,
    rules: &Rules,
    attacker_id: UnitId,
    defender_id: UnitId,
    reach: Reach,
) -> Result<()> {
    let attacker = registry.get(attacker_id)?;
    if attacker.defeated {
        return Err(TargetIssue::AttackerDefeated(attacker_id).into());
    }
    if attacker_id == defender_id {
        return Err(TargetIssue::SelfTarget.into());
    }
    let defender = registry.living(defender_id)?;
    if attacker.faction == defender.faction {
        return Err(TargetIssue::SameFaction.into());
    }

    let (Some(from), Some(to)) = (attacker.position, defender.position) else {
        return Err(TargetIssue::TargetDefeated(defender_id).into());
    };
    let distance = rules.movement.metric().distance(from, to);
    if !grid.within_range(from, to, reach, rules.movement.metric()) {
        return Err(TargetIssue::OutOfRange {
            distance,
            min: reach.min,
            max: reach.max,
        }
        .into());
    }
    if rules.combat.line_of_sight && !grid.line_of_sight(from, to) {
        return Err(TargetIssue::NoLineOfSight.into());
    }
    Ok(())
}

/// 戰鬥結算器：持有本次結算所需的棋盤、登錄表與亂數
pub struct CombatResolver<'a, R: rand::Rng> {
    pub grid: &'a mut Grid,
    pub registry: &'a mut UnitRegistry,
    pub rules: &'a Rules,
    pub rng: &'a mut R,
    pub next_seq: &'a mut EventSeq,
}

impl<R: rand::Rng> CombatResolver<'_, R> {
    /// 結算一次攻擊
    ///
    /// 防守方存活且符合反擊條件時，會以 `is_counter = true` 再結算一次反擊。
    pub fn resolve(
        &mut self,
        attacker_id: UnitId,
        defender_id: UnitId,
        strike: &Strike,
        is_counter: bool,
    ) -> Result<CombatEvent> {
        validate_strike(
            self.grid,
            self.registry,
            self.rules,
            attacker_id,
            defender_id,
            strike.reach,
        )?;

        let attacker = self.registry.get(attacker_id)?;
        let defender = self.registry.get(defender_id)?;
        let attacker_stats = attacker.effective();
        let defender_stats = defender.effective();
        let terrain = match defender.position {
            Some(pos) => self.grid.cell_at(pos.x, pos.y)?.profile,
            None => return Err(TargetIssue::TargetDefeated(defender_id).into()),
        };

        let hit_ctx = HitContext {
            accuracy: attacker_stats.accuracy + strike.accuracy_bonus,
            evasion: defender_stats.evasion + terrain.evasion_bonus,
        };
        let hit = resolve_hit(&hit_ctx, self.rules, self.rng);
        let dealt = if hit.hit {
            damage(
                attacker_stats.attack,
                strike.power,
                defender_stats.defense + terrain.defense_bonus,
            )
        } else {
            0
        };

        // 以下開始修改狀態
        let seq = *self.next_seq;
        *self.next_seq += 1;

        let defender = self.registry.get_mut(defender_id)?;
        defender.hp = (defender.hp - dealt).max(0);
        let defeated = defender.hp <= 0;
        let mut inflicted = None;
        if defeated {
            defender.defeated = true;
            defender.position = None;
            self.grid.remove(defender_id);
        } else if hit.hit {
            if let Some(template) = strike.inflicts.as_ref().filter(|t| t.duration > 0) {
                apply_status(&mut defender.statuses, template);
                inflicted = Some(template.name.clone());
            }
        }
        let defender_hp = defender.hp;

        tracing::debug!(
            seq,
            attacker = attacker_id,
            defender = defender_id,
            roll = hit.roll,
            chance = hit.chance,
            damage = dealt,
            defeated,
            is_counter,
            "攻擊結算"
        );

        let counter = if !is_counter && !defeated && strike.provokes_counter {
            self.try_counter(defender_id, attacker_id)?
        } else {
            None
        };

        Ok(CombatEvent {
            seq,
            attacker: attacker_id,
            defender: defender_id,
            skill: strike.skill.clone(),
            is_counter,
            roll: hit.roll,
            hit_chance: hit.chance,
            hit: hit.hit,
            damage: dealt,
            defender_hp,
            defeated,
            inflicted,
            counter: counter.map(Box::new),
        })
    }

    /// 反擊條件：
    /// - 規則啟用且單位具備反擊能力
    /// - 反擊不在冷卻中，且未超過每輪次數上限
    /// - 原攻擊者在反擊方的攻擊射程內（含視線）
    fn try_counter(&mut self, counter_id: UnitId, target_id: UnitId) -> Result<Option<CombatEvent>> {
        let counter_rules = self.rules.counter;
        let unit = self.registry.get(counter_id)?;
        if !counter_rules.enabled || !unit.stats.can_counter || unit.counter_cooldown > 0 {
            return Ok(None);
        }
        if counter_rules
            .max_per_round
            .is_some_and(|cap| unit.counters_this_round >= cap)
        {
            return Ok(None);
        }
        let strike = Strike::basic(unit);
        if validate_strike(
            self.grid,
            self.registry,
            self.rules,
            counter_id,
            target_id,
            strike.reach,
        )
        .is_err()
        {
            return Ok(None);
        }

        let unit = self.registry.get_mut(counter_id)?;
        unit.counters_this_round += 1;
        unit.counter_cooldown = counter_rules.cooldown;
        self.resolve(counter_id, target_id, &strike, true).map(Some)
    }
}
