//! 戰鬥事件紀錄（依因果順序，可序列化重播）

use crate::alias::{MovementCost, UnitId};
use crate::core_types::Position;
use crate::logic::combat::CombatEvent;
use crate::logic::scheduler::Outcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEvent {
    RoundAdvanced {
        round: u32,
    },
    TurnStarted {
        unit: UnitId,
    },
    UnitMoved {
        unit: UnitId,
        path: Vec<Position>,
        cost: MovementCost,
    },
    UnitTeleported {
        unit: UnitId,
        from: Position,
        to: Position,
    },
    CombatResolved {
        event: CombatEvent,
    },
    UnitDefeated {
        unit: UnitId,
        by: UnitId,
    },
    UnitWaited {
        unit: UnitId,
    },
    StatusExpired {
        unit: UnitId,
        status: String,
    },
    EncounterEnded {
        outcome: Outcome,
    },
}
