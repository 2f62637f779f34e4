//! 瞬間移動：不走路徑、不計地形成本，但仍遵守佔據與射程

use crate::alias::UnitId;
use crate::core_types::{DistanceMetric, Position, Reach};
use crate::error::{GridError, Result, TargetIssue};
use crate::logic::grid::Grid;
use crate::logic::registry::UnitRegistry;

/// 驗證瞬移目標（不修改狀態），回傳起點
pub fn validate(
    grid: &Grid,
    registry: &UnitRegistry,
    unit_id: UnitId,
    target: Position,
    reach: Reach,
    metric: DistanceMetric,
) -> Result<Position> {
    let unit = registry.get(unit_id)?;
    let from = match (unit.defeated, unit.position) {
        (false, Some(pos)) => pos,
        _ => return Err(TargetIssue::AttackerDefeated(unit_id).into()),
    };

    let cell = grid.cell_at(target.x, target.y)?;
    if let Some(occupant) = cell.occupant {
        return Err(GridError::Occupied {
            x: target.x,
            y: target.y,
            occupant,
        }
        .into());
    }
    if !cell.is_passable() {
        return Err(GridError::Impassable {
            x: target.x,
            y: target.y,
        }
        .into());
    }
    if !grid.within_range(from, target, reach, metric) {
        return Err(TargetIssue::OutOfRange {
            distance: metric.distance(from, target),
            min: reach.min,
            max: reach.max,
        }
        .into());
    }
    Ok(from)
}

/// 將單位瞬移到目標格，棋盤與登錄表同步更新，回傳 (起點, 終點)
pub fn apply(
    grid: &mut Grid,
    registry: &mut UnitRegistry,
    unit_id: UnitId,
    target: Position,
    reach: Reach,
    metric: DistanceMetric,
) -> Result<(Position, Position)> {
    let from = validate(grid, registry, unit_id, target, reach, metric)?;
    grid.place(unit_id, target)?;
    registry.get_mut(unit_id)?.position = Some(target);
    tracing::debug!(unit = unit_id, %from, to = %target, "瞬間移動");
    Ok((from, target))
}
