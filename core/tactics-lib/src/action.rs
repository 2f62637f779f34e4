//! 行動意圖與合法行動列表

use crate::alias::{MovementCost, SkillName, UnitId};
use crate::core_types::Position;
use serde::{Deserialize, Serialize};

/// 技能目標
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Target {
    Unit(UnitId),
    Cell(Position),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// 不結束回合，消耗移動力
    Move { to: Position },
    Attack { target: UnitId },
    UseSkill { skill: SkillName, target: Target },
    Wait,
}

impl ActionKind {
    /// 主要行動會結束該單位的回合
    pub fn ends_turn(&self) -> bool {
        !matches!(self, ActionKind::Move { .. })
    }
}

/// 綁定行動單位的行動
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub unit_id: UnitId,
    pub kind: ActionKind,
}

impl Action {
    pub fn new(unit_id: UnitId, kind: ActionKind) -> Self {
        Action { unit_id, kind }
    }

    pub fn move_to(unit_id: UnitId, to: Position) -> Self {
        Self::new(unit_id, ActionKind::Move { to })
    }

    pub fn attack(unit_id: UnitId, target: UnitId) -> Self {
        Self::new(unit_id, ActionKind::Attack { target })
    }

    pub fn use_skill(unit_id: UnitId, skill: impl Into<SkillName>, target: Target) -> Self {
        Self::new(
            unit_id,
            ActionKind::UseSkill {
                skill: skill.into(),
                target,
            },
        )
    }

    pub fn wait(unit_id: UnitId) -> Self {
        Self::new(unit_id, ActionKind::Wait)
    }
}

/// 技能與其合法目標
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillOption {
    pub skill: SkillName,
    pub targets: Vec<Target>,
}

/// 行動中單位目前可選的行動
///
/// 列表皆已排序；Wait 永遠合法。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalActions {
    pub unit_id: UnitId,
    pub movement_left: MovementCost,
    pub moves: Vec<Position>,
    pub attack_targets: Vec<UnitId>,
    pub skills: Vec<SkillOption>,
}

impl LegalActions {
    pub fn can_move(&self) -> bool {
        !self.moves.is_empty()
    }

    pub fn can_attack(&self) -> bool {
        !self.attack_targets.is_empty()
    }

    /// 列表中是否包含此行動
    pub fn permits(&self, kind: &ActionKind) -> bool {
        match kind {
            ActionKind::Move { to } => self.moves.contains(to),
            ActionKind::Attack { target } => self.attack_targets.contains(target),
            ActionKind::UseSkill { skill, target } => self
                .skills
                .iter()
                .any(|option| &option.skill == skill && option.targets.contains(target)),
            ActionKind::Wait => true,
        }
    }
}
