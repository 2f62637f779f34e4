//! 一場戰鬥
//!
//! 擁有棋盤、單位登錄表、回合排程、亂數與獎勵計算。外部只能：
//! - 透過 `select_unit` / `propose` / `withdraw` / `commit`（或 `commit_action`）送出行動
//! - 讀取事件紀錄與唯讀狀態
//!
//! 每次行動結算後都會檢查棋盤與登錄表是否一致，不一致時戰鬥中止。

use crate::action::{Action, ActionKind, LegalActions, SkillOption, Target};
use crate::alias::{EventSeq, MovementCost, SkillName, TypeName, UnitId};
use crate::constants::LOOT_RNG_STREAM;
use crate::core_types::{Faction, Position, Reach};
use crate::error::{
    ActionError, ConsistencyError, Context, Error, PathError, Result, TargetIssue, TurnError,
    UnitError,
};
use crate::event::BattleEvent;
use crate::loader::{parse_encounter_toml, parse_terrain_rows};
use crate::loader_schema::{EncounterConfig, Rules, UnitType};
use crate::logic::combat::{CombatResolver, Strike, validate_strike};
use crate::logic::grid::Grid;
use crate::logic::movement::{Mover, path, reachable_set};
use crate::logic::registry::{Unit, UnitRegistry};
use crate::logic::reward::{RewardEngine, RewardSummary};
use crate::logic::scheduler::{Outcome, Phase, TurnScheduler};
use crate::logic::teleport;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skills_lib::SkillType;
use std::collections::HashMap;

/// 非玩家單位的決策介面
///
/// 只拿到唯讀的戰鬥狀態；回傳 None 代表「尚未決定」，戰鬥停在這裡等待。
pub trait DecisionMaker {
    fn decide(&mut self, encounter: &Encounter, legal: &LegalActions) -> Option<Action>;
}

/// `drive_turn` 的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnProgress {
    /// 決策者尚未決定
    Suspended,
    TurnEnded,
    EncounterOver,
}

#[derive(Debug, Clone)]
pub struct Encounter {
    name: String,
    rules: Rules,
    grid: Grid,
    registry: UnitRegistry,
    scheduler: TurnScheduler,
    skills: HashMap<SkillName, SkillType>,
    unit_types: HashMap<TypeName, UnitType>,
    rng: ChaCha8Rng,
    rewards: RewardEngine,
    next_seq: EventSeq,
    events: Vec<BattleEvent>,
    pending: Option<Action>,
    selected: Option<UnitId>,
    halted: Option<String>,
}

impl Encounter {
    /// 由配置建立戰鬥
    ///
    /// 驗證：地形符號、單位類型、技能名稱、單位 ID 重複、配置位置（邊界、重疊、不可通行）。
    /// 未指定 ID 的單位依配置順序編號（從 1 開始）。
    pub fn from_config(config: &EncounterConfig) -> Result<Self> {
        let terrain = parse_terrain_rows(&config.board).context("解析棋盤地形")?;
        let mut grid = Grid::from_terrain(&terrain, &config.terrain);

        let skills: HashMap<SkillName, SkillType> = config
            .skills
            .iter()
            .map(|skill| (skill.name.clone(), skill.clone()))
            .collect();
        let unit_types: HashMap<TypeName, UnitType> = config
            .unit_types
            .iter()
            .map(|unit_type| (unit_type.name.clone(), unit_type.clone()))
            .collect();
        for unit_type in &config.unit_types {
            // 最大生命值必須為正，否則單位開場即倒地
            if unit_type.stats.max_hp <= 0 {
                return Err(Error::from(UnitError::InvalidMaxHp {
                    type_name: unit_type.name.clone(),
                    max_hp: unit_type.stats.max_hp,
                })
                .context(format!("單位類型 {}", unit_type.name)));
            }
            for skill_name in &unit_type.skills {
                if !skills.contains_key(skill_name) {
                    return Err(Error::from(UnitError::SkillNotFound {
                        skill_name: skill_name.clone(),
                    })
                    .context(format!("單位類型 {}", unit_type.name)));
                }
            }
        }

        let mut registry = UnitRegistry::new();
        for (i, placement) in config.units.iter().enumerate() {
            let unit_type = unit_types.get(&placement.unit_type_name).ok_or_else(|| {
                UnitError::UnknownUnitType {
                    type_name: placement.unit_type_name.clone(),
                }
            })?;
            let id = placement.id.unwrap_or(i as UnitId + 1);
            registry.register(Unit::from_type(
                id,
                unit_type,
                placement.faction,
                placement.position,
            ))?;
            grid.place(id, placement.position)
                .context(format!("配置單位 {id}"))?;
        }

        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut loot_rng = ChaCha8Rng::seed_from_u64(config.seed);
        loot_rng.set_stream(LOOT_RNG_STREAM);

        tracing::info!(
            name = %config.name,
            seed = config.seed,
            width = grid.width(),
            height = grid.height(),
            units = registry.len(),
            "戰鬥建立"
        );

        Ok(Encounter {
            name: config.name.clone(),
            rules: config.rules,
            grid,
            registry,
            scheduler: TurnScheduler::new(),
            skills,
            unit_types,
            rng,
            rewards: RewardEngine::new(config.rules.reward, loot_rng),
            next_seq: 0,
            events: Vec::new(),
            pending: None,
            selected: None,
            halted: None,
        })
    }

    pub fn from_toml(encounter_toml: &str) -> Result<Self> {
        let config = parse_encounter_toml(encounter_toml)?;
        Self::from_config(&config)
    }

    /// 開始戰鬥：進入第一輪並輪到第一個單位
    pub fn start(&mut self) -> Result<()> {
        self.ensure_running()?;
        if self.scheduler.phase() != Phase::Setup {
            return Err(TurnError::AlreadyStarted.into());
        }
        tracing::info!(name = %self.name, "戰鬥開始");
        if self.check_encounter_over() {
            return Ok(());
        }
        self.next_round();
        Ok(())
    }

    // ------------------------------------------------------------------
    // 唯讀狀態
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub fn unit(&self, unit_id: UnitId) -> Result<&Unit> {
        self.registry.get(unit_id)
    }

    pub fn skill(&self, skill_name: &str) -> Option<&SkillType> {
        self.skills.get(skill_name)
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn round(&self) -> u32 {
        self.scheduler.round()
    }

    pub fn turn_order(&self) -> &[UnitId] {
        self.scheduler.turn_order()
    }

    pub fn active_unit(&self) -> Option<UnitId> {
        self.scheduler.active_unit()
    }

    pub fn movement_left(&self) -> Option<MovementCost> {
        self.scheduler.turn().map(|turn| turn.movement_left)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.scheduler.phase() {
            Phase::EncounterOver { outcome } => Some(outcome),
            _ => None,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// 取出並清空事件紀錄
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn rewards(&self) -> &RewardEngine {
        &self.rewards
    }

    pub fn reward_summary(&self) -> Option<&RewardSummary> {
        self.rewards.summary()
    }

    pub fn pending(&self) -> Option<&Action> {
        self.pending.as_ref()
    }

    pub fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    // ------------------------------------------------------------------
    // 輸入
    // ------------------------------------------------------------------

    /// 選取某格上的單位（只記錄選取，不改變戰鬥狀態）
    pub fn select_unit(&mut self, pos: Position) -> Option<UnitId> {
        self.selected = self.grid.occupant_of(pos);
        self.selected
    }

    /// 行動中單位目前的合法行動
    pub fn legal_actions(&self, unit_id: UnitId) -> Result<LegalActions> {
        self.ensure_running()?;
        self.scheduler.check_active(unit_id)?;
        let unit = self.registry.get(unit_id)?;
        let movement_left = self.movement_left().unwrap_or(0);

        let moves = if movement_left > 0 {
            let mut moves: Vec<Position> = reachable_set(
                &self.grid,
                self.mover(unit, movement_left)?,
                self.rules.movement,
                |pos| self.occupant_faction(pos),
            )?
            .into_keys()
            .collect();
            moves.sort();
            moves
        } else {
            Vec::new()
        };

        let enemies: Vec<UnitId> = self
            .registry
            .living_units()
            .filter(|u| u.faction != unit.faction)
            .map(|u| u.id)
            .collect();
        let targets_in_reach = |reach: Reach| -> Vec<UnitId> {
            enemies
                .iter()
                .copied()
                .filter(|&target| {
                    validate_strike(&self.grid, &self.registry, &self.rules, unit_id, target, reach)
                        .is_ok()
                })
                .collect()
        };

        let attack_targets = targets_in_reach(unit.stats.attack_range);

        let mut skills = Vec::new();
        for skill_name in &unit.skills {
            let Ok(skill) = self.usable_skill(unit, skill_name) else {
                continue;
            };
            let targets: Vec<Target> = if skill.targets_cell() {
                self.teleport_destinations(unit, skill)
            } else {
                targets_in_reach(Reach::from(skill.range()))
                    .into_iter()
                    .map(Target::Unit)
                    .collect()
            };
            if !targets.is_empty() {
                skills.push(SkillOption {
                    skill: skill_name.clone(),
                    targets,
                });
            }
        }

        Ok(LegalActions {
            unit_id,
            movement_left,
            moves,
            attack_targets,
            skills,
        })
    }

    /// 暫存行動（已驗證，尚未生效），會取代先前暫存的行動
    pub fn propose(&mut self, action: Action) -> Result<()> {
        self.ensure_running()?;
        if let Err(e) = self.validate(&action) {
            tracing::warn!(unit = action.unit_id, kind = ?action.kind, error = %e, "行動不合法");
            return Err(e);
        }
        self.pending = Some(action);
        Ok(())
    }

    /// 撤回暫存的行動
    pub fn withdraw(&mut self) -> Result<Action> {
        self.pending
            .take()
            .ok_or_else(|| TurnError::NothingPending.into())
    }

    /// 確認暫存的行動，回傳本次結算產生的事件
    pub fn commit(&mut self) -> Result<Vec<BattleEvent>> {
        self.ensure_running()?;
        let action = self.pending.take().ok_or(TurnError::NothingPending)?;
        self.execute(action)
    }

    /// `propose` + `commit`
    pub fn commit_action(&mut self, action: Action) -> Result<Vec<BattleEvent>> {
        self.propose(action)?;
        self.commit()
    }

    /// 外部勝利訊號（劇情、投降等）
    pub fn signal_victory(&mut self, faction: Faction) -> Result<()> {
        self.ensure_running()?;
        if self.scheduler.is_over() {
            return Err(TurnError::EncounterOver.into());
        }
        self.pending = None;
        self.finish(Outcome::Victory { faction });
        Ok(())
    }

    /// 由決策者推進行動中單位的回合，直到回合結束或決策者暫停
    pub fn drive_turn(&mut self, decider: &mut dyn DecisionMaker) -> Result<TurnProgress> {
        self.ensure_running()?;
        if self.scheduler.is_over() {
            return Ok(TurnProgress::EncounterOver);
        }
        let Some(unit_id) = self.scheduler.active_unit() else {
            return Err(TurnError::NotStarted.into());
        };
        let round = self.round();
        loop {
            let legal = self.legal_actions(unit_id)?;
            let Some(action) = decider.decide(self, &legal) else {
                return Ok(TurnProgress::Suspended);
            };
            self.commit_action(action)?;
            if self.scheduler.is_over() {
                return Ok(TurnProgress::EncounterOver);
            }
            if self.round() != round || self.active_unit() != Some(unit_id) {
                return Ok(TurnProgress::TurnEnded);
            }
        }
    }

    // ------------------------------------------------------------------
    // 驗證
    // ------------------------------------------------------------------

    fn ensure_running(&self) -> Result<()> {
        match &self.halted {
            Some(reason) => Err(TurnError::Halted {
                reason: reason.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// 驗證行動（不修改狀態）
    fn validate(&self, action: &Action) -> Result<()> {
        let unit_id = action.unit_id;
        self.scheduler.check_active(unit_id)?;
        let unit = self.registry.get(unit_id)?;
        match &action.kind {
            ActionKind::Move { to } => {
                self.plan_move(unit, *to)?;
            }
            ActionKind::Attack { target } => {
                validate_strike(
                    &self.grid,
                    &self.registry,
                    &self.rules,
                    unit_id,
                    *target,
                    unit.stats.attack_range,
                )?;
            }
            ActionKind::UseSkill { skill, target } => {
                let skill = self.usable_skill(unit, skill)?;
                match (Strike::from_skill(skill), target) {
                    (Some(strike), Target::Unit(defender)) => {
                        validate_strike(
                            &self.grid,
                            &self.registry,
                            &self.rules,
                            unit_id,
                            *defender,
                            strike.reach,
                        )?;
                    }
                    (None, Target::Cell(pos)) => {
                        teleport::validate(
                            &self.grid,
                            &self.registry,
                            unit_id,
                            *pos,
                            Reach::from(skill.range()),
                            self.rules.movement.metric(),
                        )?;
                    }
                    _ => {
                        return Err(ActionError::SkillTargetMismatch {
                            skill_name: skill.name.clone(),
                        }
                        .into());
                    }
                }
            }
            ActionKind::Wait => {}
        }
        Ok(())
    }

    fn usable_skill<'a>(&'a self, unit: &Unit, skill_name: &str) -> Result<&'a SkillType> {
        if !unit.skills.iter().any(|s| s == skill_name) {
            return Err(ActionError::SkillNotKnown {
                unit_id: unit.id,
                skill_name: skill_name.to_string(),
            }
            .into());
        }
        let skill = self
            .skills
            .get(skill_name)
            .ok_or_else(|| UnitError::SkillNotFound {
                skill_name: skill_name.to_string(),
            })?;
        let remaining = unit.cooldown_of(skill_name);
        if remaining > 0 {
            return Err(ActionError::SkillOnCooldown {
                skill_name: skill_name.to_string(),
                remaining,
            }
            .into());
        }
        Ok(skill)
    }

    fn teleport_destinations(&self, unit: &Unit, skill: &SkillType) -> Vec<Target> {
        let Some(origin) = unit.position else {
            return Vec::new();
        };
        let reach = Reach::from(skill.range());
        let metric = self.rules.movement.metric();
        self.grid
            .positions_within(origin, reach, metric)
            .into_iter()
            .filter(|pos| {
                teleport::validate(&self.grid, &self.registry, unit.id, *pos, reach, metric).is_ok()
            })
            .map(Target::Cell)
            .collect()
    }

    /// 以剩餘移動力計算到目的地的路徑；原地不動視為不可到達
    fn plan_move(&self, unit: &Unit, to: Position) -> Result<(Vec<Position>, MovementCost)> {
        let budget = self.movement_left().unwrap_or(0);
        if budget == 0 {
            return Err(ActionError::NoMovementLeft { unit_id: unit.id }.into());
        }
        let mover = self.mover(unit, budget)?;
        if to == mover.pos {
            return Err(PathError::Unreachable { x: to.x, y: to.y }.into());
        }
        path(&self.grid, mover, to, self.rules.movement, |pos| {
            self.occupant_faction(pos)
        })
    }

    fn mover(&self, unit: &Unit, budget: MovementCost) -> Result<Mover> {
        let pos = unit
            .position
            .ok_or(TargetIssue::AttackerDefeated(unit.id))?;
        Ok(Mover {
            unit_id: unit.id,
            pos,
            faction: unit.faction,
            budget,
        })
    }

    fn occupant_faction(&self, pos: Position) -> Option<Faction> {
        self.grid
            .occupant_of(pos)
            .and_then(|unit_id| self.registry.faction_of(unit_id))
    }

    // ------------------------------------------------------------------
    // 結算
    // ------------------------------------------------------------------

    fn execute(&mut self, action: Action) -> Result<Vec<BattleEvent>> {
        let unit_id = action.unit_id;
        self.scheduler.begin_resolving(unit_id)?;
        let first_event = self.events.len();

        if let Err(e) = self.apply(&action) {
            self.scheduler.finish_resolving(false);
            tracing::warn!(unit = unit_id, kind = ?action.kind, error = %e, "行動結算失敗");
            return Err(e);
        }
        tracing::debug!(unit = unit_id, kind = ?action.kind, "行動結算");

        if let Err(e) = self.check_consistency() {
            self.halt(&e);
            return Err(e);
        }

        let turn_over = action.kind.ends_turn();
        self.scheduler.finish_resolving(turn_over);
        if !self.check_encounter_over() && turn_over {
            self.next_turn();
        }
        Ok(self.events[first_event..].to_vec())
    }

    fn apply(&mut self, action: &Action) -> Result<()> {
        let unit_id = action.unit_id;
        match &action.kind {
            ActionKind::Move { to } => {
                let (steps, cost) = self.plan_move(self.registry.get(unit_id)?, *to)?;
                self.grid.place(unit_id, *to)?;
                self.registry.get_mut(unit_id)?.position = Some(*to);
                self.scheduler.spend_movement(cost);
                self.events.push(BattleEvent::UnitMoved {
                    unit: unit_id,
                    path: steps,
                    cost,
                });
            }
            ActionKind::Attack { target } => {
                let strike = Strike::basic(self.registry.get(unit_id)?);
                self.resolve_strike(unit_id, *target, &strike)?;
            }
            ActionKind::UseSkill { skill, target } => {
                let unit = self.registry.get(unit_id)?;
                let skill = self.usable_skill(unit, skill)?.clone();
                tracing::debug!(unit = unit_id, skill = %skill.name, kind = %skill.kind, "施放技能");
                match (Strike::from_skill(&skill), target) {
                    (Some(strike), Target::Unit(defender)) => {
                        self.resolve_strike(unit_id, *defender, &strike)?;
                    }
                    (None, Target::Cell(pos)) => {
                        let (from, to) = teleport::apply(
                            &mut self.grid,
                            &mut self.registry,
                            unit_id,
                            *pos,
                            Reach::from(skill.range()),
                            self.rules.movement.metric(),
                        )?;
                        self.events.push(BattleEvent::UnitTeleported {
                            unit: unit_id,
                            from,
                            to,
                        });
                    }
                    _ => {
                        return Err(ActionError::SkillTargetMismatch {
                            skill_name: skill.name.clone(),
                        }
                        .into());
                    }
                }
                if skill.cooldown > 0 {
                    self.registry
                        .get_mut(unit_id)?
                        .skill_cooldowns
                        .insert(skill.name.clone(), skill.cooldown);
                }
            }
            ActionKind::Wait => {
                self.events.push(BattleEvent::UnitWaited { unit: unit_id });
            }
        }
        Ok(())
    }

    /// 結算攻擊（含反擊），並將擊倒交給獎勵計算
    fn resolve_strike(&mut self, attacker: UnitId, defender: UnitId, strike: &Strike) -> Result<()> {
        let event = CombatResolver {
            grid: &mut self.grid,
            registry: &mut self.registry,
            rules: &self.rules,
            rng: &mut self.rng,
            next_seq: &mut self.next_seq,
        }
        .resolve(attacker, defender, strike, false)?;

        self.events.push(BattleEvent::CombatResolved {
            event: event.clone(),
        });
        for step in event.chain().filter(|e| e.defeated) {
            let defeated = self.registry.get(step.defender)?;
            let victor = self.registry.get(step.attacker)?;
            let defeated_type = self.unit_types.get(&defeated.type_name).ok_or_else(|| {
                UnitError::UnknownUnitType {
                    type_name: defeated.type_name.clone(),
                }
            })?;
            self.rewards.on_defeat(defeated, victor, defeated_type, step);
            tracing::info!(unit = step.defender, by = step.attacker, "單位被擊倒");
            self.events.push(BattleEvent::UnitDefeated {
                unit: step.defender,
                by: step.attacker,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // 流程
    // ------------------------------------------------------------------

    /// 開新的一輪並輪到第一個單位
    fn next_round(&mut self) {
        match self.scheduler.begin_round(&self.registry) {
            Some(round) => {
                tracing::info!(round, order = ?self.scheduler.turn_order(), "新的一輪");
                self.events.push(BattleEvent::RoundAdvanced { round });
                self.next_turn();
            }
            None => self.finish(Outcome::Draw),
        }
    }

    /// 輪到下一個存活單位；本輪結束時執行輪末處理並開新的一輪
    fn next_turn(&mut self) {
        if let Some(unit) = self.scheduler.advance(&self.registry) {
            self.events.push(BattleEvent::TurnStarted { unit });
            return;
        }
        for (unit, status) in self.scheduler.end_round(&mut self.registry) {
            tracing::debug!(unit, %status, "狀態結束");
            self.events.push(BattleEvent::StatusExpired { unit, status });
        }
        self.next_round();
    }

    /// 存活陣營少於兩個時結束戰鬥
    fn check_encounter_over(&mut self) -> bool {
        let factions = self.registry.living_factions();
        if factions.len() >= 2 {
            return false;
        }
        let outcome = match factions.first() {
            Some(&faction) => Outcome::Victory { faction },
            None => Outcome::Draw,
        };
        self.finish(outcome);
        true
    }

    fn finish(&mut self, outcome: Outcome) {
        self.scheduler.finish(outcome);
        self.events.push(BattleEvent::EncounterEnded { outcome });
        let summary = self.rewards.on_encounter_end(outcome, &self.registry);
        tracing::info!(?outcome, drops = summary.loot.len(), "戰鬥結束");
    }

    /// 棋盤佔據與登錄表位置必須完全一致
    fn check_consistency(&self) -> Result<()> {
        for unit in self.registry.iter() {
            let on_grid = self.grid.position_of(unit.id);
            if unit.defeated {
                if let Some(pos) = on_grid {
                    return Err(ConsistencyError::DefeatedOccupant {
                        unit_id: unit.id,
                        pos,
                    }
                    .into());
                }
            }
            let expected = if unit.defeated { None } else { on_grid };
            if on_grid.is_none() != unit.defeated || unit.position != expected {
                return Err(ConsistencyError::PositionMismatch {
                    unit_id: unit.id,
                    recorded: unit.position,
                    on_grid,
                }
                .into());
            }
        }
        for (unit_id, pos) in self.grid.occupants() {
            if !self.registry.contains(unit_id) {
                return Err(ConsistencyError::UnknownOccupant { unit_id }.into());
            }
            if self.grid.position_of(unit_id) != Some(pos) {
                return Err(ConsistencyError::PositionMismatch {
                    unit_id,
                    recorded: self.grid.position_of(unit_id),
                    on_grid: Some(pos),
                }
                .into());
            }
        }
        Ok(())
    }

    fn halt(&mut self, error: &Error) {
        tracing::error!(error = %error, "棋盤與單位狀態不一致，戰鬥中止");
        self.pending = None;
        self.halted = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::loader_schema::{BoardConfig, StatBlock, UnitPlacement};

    fn duel() -> EncounterConfig {
        EncounterConfig {
            name: "duel".to_string(),
            seed: 42,
            board: BoardConfig {
                width: 3,
                height: 3,
                terrain_rows: vec![],
            },
            unit_types: vec![UnitType {
                name: "soldier".to_string(),
                stats: StatBlock::default(),
                ..Default::default()
            }],
            units: vec![
                UnitPlacement {
                    id: None,
                    unit_type_name: "soldier".to_string(),
                    faction: Faction(0),
                    position: Position::new(0, 0),
                },
                UnitPlacement {
                    id: None,
                    unit_type_name: "soldier".to_string(),
                    faction: Faction(1),
                    position: Position::new(2, 2),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_consistency_failure_halts() {
        let mut encounter = Encounter::from_config(&duel()).unwrap();
        encounter.start().unwrap();
        assert_eq!(encounter.active_unit(), Some(1));

        // 直接破壞棋盤，模擬內部錯誤
        encounter.grid.remove(2);
        let err = encounter.commit_action(Action::wait(1)).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err.kind(),
            ErrorKind::Consistency(ConsistencyError::PositionMismatch { unit_id: 2, .. })
        ));
        assert!(encounter.is_halted());

        let err = encounter.commit_action(Action::wait(1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Turn(TurnError::Halted { .. })));
        assert!(encounter.legal_actions(1).is_err());
    }

    #[test]
    fn test_unknown_occupant_detected() {
        let mut encounter = Encounter::from_config(&duel()).unwrap();
        encounter.start().unwrap();
        encounter.grid.place(99, Position::new(1, 1)).unwrap();
        let err = encounter.commit_action(Action::wait(1)).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::Consistency(ConsistencyError::UnknownOccupant { unit_id: 99 })
        ));
    }

    #[test]
    fn test_failed_action_keeps_turn() {
        let mut encounter = Encounter::from_config(&duel()).unwrap();
        encounter.start().unwrap();
        let events_before = encounter.events().len();
        assert!(encounter.commit_action(Action::attack(1, 2)).is_err());
        assert_eq!(encounter.phase(), Phase::UnitTurn { active: 1 });
        assert_eq!(encounter.events().len(), events_before);
        assert!(!encounter.is_halted());
    }
}
