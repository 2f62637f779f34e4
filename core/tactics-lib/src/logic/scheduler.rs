//! 回合排程：行動順序與階段狀態機
//!
//! ```text
//! Setup → RoundStart → UnitTurn ⇄ ResolvingAction → … → RoundEnd → RoundStart
//!                                                   ↘ EncounterOver
//! ```

use crate::alias::{MovementCost, UnitId};
use crate::core_types::Faction;
use crate::error::{Result, TurnError};
use crate::logic::registry::UnitRegistry;
use crate::logic::unit_attributes::tick_statuses;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;

/// 戰鬥結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Victory { faction: Faction },
    /// 所有陣營同時全滅
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    RoundStart,
    UnitTurn { active: UnitId },
    ResolvingAction { active: UnitId },
    RoundEnd,
    EncounterOver { outcome: Outcome },
}

/// 行動中單位的回合狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    pub unit_id: UnitId,
    pub movement_left: MovementCost,
}

/// 計算行動順序：存活單位依速度遞減，同速依登錄順序
pub fn compute_turn_order(registry: &UnitRegistry) -> Vec<UnitId> {
    let mut living: Vec<(i32, UnitId)> = registry
        .living_units()
        .map(|u| (u.effective().speed, u.id))
        .collect();
    // 穩定排序，保留登錄順序
    living.sort_by_key(|(speed, _)| Reverse(*speed));
    living.into_iter().map(|(_, id)| id).collect()
}

#[derive(Debug, Clone)]
pub struct TurnScheduler {
    round: u32,
    order: Vec<UnitId>,
    cursor: usize,
    acted: HashSet<UnitId>,
    phase: Phase,
    turn: Option<TurnState>,
}

impl Default for TurnScheduler {
    fn default() -> Self {
        TurnScheduler {
            round: 0,
            order: Vec::new(),
            cursor: 0,
            acted: HashSet::new(),
            phase: Phase::Setup,
            turn: None,
        }
    }
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn turn_order(&self) -> &[UnitId] {
        &self.order
    }

    pub fn turn(&self) -> Option<TurnState> {
        self.turn
    }

    pub fn active_unit(&self) -> Option<UnitId> {
        match self.phase {
            Phase::UnitTurn { active } | Phase::ResolvingAction { active } => Some(active),
            _ => None,
        }
    }

    pub fn has_acted(&self, unit_id: UnitId) -> bool {
        self.acted.contains(&unit_id)
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::EncounterOver { .. })
    }

    /// 開新的一輪；沒有存活單位時回傳 None
    pub fn begin_round(&mut self, registry: &UnitRegistry) -> Option<u32> {
        self.phase = Phase::RoundStart;
        self.order = compute_turn_order(registry);
        self.cursor = 0;
        self.acted.clear();
        self.turn = None;
        if self.order.is_empty() {
            return None;
        }
        self.round += 1;
        Some(self.round)
    }

    /// 輪到下一個存活單位；本輪已無單位時進入 RoundEnd 並回傳 None
    ///
    /// 本輪中途被擊倒的單位會被跳過。
    pub fn advance(&mut self, registry: &UnitRegistry) -> Option<UnitId> {
        while let Some(&unit_id) = self.order.get(self.cursor) {
            self.cursor += 1;
            let Ok(unit) = registry.get(unit_id) else {
                continue;
            };
            if !unit.is_alive() {
                continue;
            }
            self.phase = Phase::UnitTurn { active: unit_id };
            self.turn = Some(TurnState {
                unit_id,
                movement_left: unit.effective().movement,
            });
            return Some(unit_id);
        }
        self.phase = Phase::RoundEnd;
        self.turn = None;
        None
    }

    /// 檢查是否輪到該單位，並進入 ResolvingAction
    pub fn begin_resolving(&mut self, unit_id: UnitId) -> Result<()> {
        match self.phase {
            Phase::UnitTurn { active } if active == unit_id => {
                self.phase = Phase::ResolvingAction { active };
                Ok(())
            }
            // 結算中不可重入
            Phase::ResolvingAction { .. } => Err(TurnError::AlreadyActed { unit_id }.into()),
            _ => Err(self.not_your_turn(unit_id).into()),
        }
    }

    /// 結束結算；`turn_over` 為 true 時本單位回合結束
    pub fn finish_resolving(&mut self, turn_over: bool) {
        let Phase::ResolvingAction { active } = self.phase else {
            return;
        };
        if turn_over {
            self.acted.insert(active);
            self.turn = None;
            self.phase = Phase::RoundStart;
        } else {
            self.phase = Phase::UnitTurn { active };
        }
    }

    /// 扣除剩餘移動力
    pub fn spend_movement(&mut self, cost: MovementCost) {
        if let Some(turn) = self.turn.as_mut() {
            turn.movement_left = turn.movement_left.saturating_sub(cost);
        }
    }

    /// 驗證某單位現在能否提交行動（不改變狀態）
    pub fn check_active(&self, unit_id: UnitId) -> Result<()> {
        match self.phase {
            Phase::UnitTurn { active } if active == unit_id => Ok(()),
            Phase::ResolvingAction { .. } => Err(TurnError::AlreadyActed { unit_id }.into()),
            _ => Err(self.not_your_turn(unit_id).into()),
        }
    }

    /// 輪末：狀態持續時間遞減、冷卻遞減、重置每輪反擊次數
    ///
    /// 回傳到期的 (單位, 狀態名稱)。
    pub fn end_round(&mut self, registry: &mut UnitRegistry) -> Vec<(UnitId, String)> {
        self.phase = Phase::RoundEnd;
        self.turn = None;
        let mut expired = Vec::new();
        for unit in registry.iter_mut().filter(|u| u.is_alive()) {
            for name in tick_statuses(&mut unit.statuses) {
                expired.push((unit.id, name));
            }
            unit.tick_cooldowns();
            unit.counters_this_round = 0;
        }
        expired
    }

    pub fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::EncounterOver { outcome };
        self.turn = None;
    }

    fn not_your_turn(&self, unit_id: UnitId) -> TurnError {
        match self.phase {
            Phase::Setup => TurnError::NotStarted,
            Phase::EncounterOver { .. } => TurnError::EncounterOver,
            _ if self.acted.contains(&unit_id) => TurnError::AlreadyActed { unit_id },
            _ => TurnError::NotActiveUnit {
                unit_id,
                active: self.active_unit(),
            },
        }
    }
}
