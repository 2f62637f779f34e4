//! 移動邏輯（路徑搜尋）
//!
//! 純函數，不修改棋盤或單位。

use crate::alias::{MovementCost, UnitId};
use crate::core_types::{Faction, Position};
use crate::error::{GridError, PathError, Result};
use crate::loader_schema::MovementRules;
use crate::logic::grid::Grid;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// 移動者（位置 + 陣營 + 剩餘移動力）
#[derive(Debug, Clone, Copy)]
pub struct Mover {
    pub unit_id: UnitId,
    pub pos: Position,
    pub faction: Faction,
    pub budget: MovementCost,
}

/// 可到達位置的資訊（含成本與前驅節點）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReachableInfo {
    pub cost: MovementCost,
    pub prev: Position, // 上一個位置（可能是起點）
}

/// 計算給定移動力預算內可到達的所有位置
///
/// 使用 Dijkstra 算法探索所有可到達位置
/// 1. 從起點開始擴展，邊權重 = 進入格的地形成本
/// 2. 檢查每一步是否可通行（地形與碰撞）
/// 3. 只包含消耗成本 <= 預算的位置
/// 4. 返回所有可停留位置及其成本與前驅節點（不包含起點）
///
/// # Fail fast 驗證：
/// - 起點必須在棋盤內
///
/// # 碰撞規則：
/// - 友軍（相同 Faction）在 `allied_pass_through` 時可穿越，但不能停留
/// - 敵軍（不同 Faction）不可穿越
///
/// # 同成本路徑：
/// - 先進入 frontier 者優先，鄰格順序固定為上、下、左、右（斜向排在最後）
pub fn reachable_set<F>(
    grid: &Grid,
    mover: Mover,
    rules: MovementRules,
    get_occupant_faction: F,
) -> Result<HashMap<Position, ReachableInfo>>
where
    F: Fn(Position) -> Option<Faction> + Copy,
{
    let (dist, prev) = dijkstra(grid, mover, rules, get_occupant_faction)?;

    // 分離結果收集邏輯
    let reachable = dist
        .into_iter()
        .filter_map(|(pos, cost)| {
            if pos == mover.pos || get_occupant_faction(pos).is_some() {
                return None;
            }
            Some((
                pos,
                ReachableInfo {
                    cost,
                    prev: prev[&pos],
                },
            ))
        })
        .collect();

    Ok(reachable)
}

/// 起點到終點的最低成本路徑（含兩端）
///
/// 終點不可停留或超出預算時回傳 `PathError::Unreachable`。
pub fn path<F>(
    grid: &Grid,
    mover: Mover,
    destination: Position,
    rules: MovementRules,
    get_occupant_faction: F,
) -> Result<(Vec<Position>, MovementCost)>
where
    F: Fn(Position) -> Option<Faction> + Copy,
{
    grid.cell_at(destination.x, destination.y)?;
    if destination == mover.pos {
        return Ok((vec![mover.pos], 0));
    }

    let unreachable = || PathError::Unreachable {
        x: destination.x,
        y: destination.y,
    };
    if get_occupant_faction(destination).is_some() {
        return Err(unreachable().into());
    }

    let (dist, prev) = dijkstra(grid, mover, rules, get_occupant_faction)?;
    let cost = *dist.get(&destination).ok_or_else(unreachable)?;
    Ok((reconstruct_path(&prev, mover.pos, destination), cost))
}

/// 由前驅表回推路徑
fn reconstruct_path(
    prev: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match prev.get(&current) {
            Some(&p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

type SearchResult = (
    HashMap<Position, MovementCost>,
    HashMap<Position, Position>,
);

fn dijkstra<F>(
    grid: &Grid,
    mover: Mover,
    rules: MovementRules,
    get_occupant_faction: F,
) -> Result<SearchResult>
where
    F: Fn(Position) -> Option<Faction> + Copy,
{
    let from = mover.pos;

    // Fail fast：驗證起點在棋盤內
    if !grid.contains(from) {
        return Err(GridError::OutOfBounds {
            x: from.x,
            y: from.y,
            width: grid.width(),
            height: grid.height(),
        }
        .into());
    }

    let mut dist: HashMap<Position, MovementCost> = HashMap::new();
    let mut prev: HashMap<Position, Position> = HashMap::new();
    // (成本, 進入順序, 位置)：同成本時先進入者先出隊
    let mut queue: BinaryHeap<Reverse<(MovementCost, u64, Position)>> = BinaryHeap::new();
    let mut seq = 0u64;

    dist.insert(from, 0);
    queue.push(Reverse((0, seq, from)));

    while let Some(Reverse((cost, _, pos))) = queue.pop() {
        // 跳過過時的隊列項（已有更優路徑）
        if cost > dist.get(&pos).copied().unwrap_or(MovementCost::MAX) {
            continue;
        }

        for next_pos in grid.neighbors(pos, rules.diagonal) {
            let cell = grid.cell_at(next_pos.x, next_pos.y)?;
            if !cell.is_passable() {
                continue;
            }

            // 地形成本可由設定任意指定，溢位視同不可到達
            let Some(new_cost) = cost.checked_add(cell.movement_cost()) else {
                continue;
            };
            if new_cost > mover.budget {
                continue;
            }

            let occupant_faction = get_occupant_faction(next_pos);
            if !is_passable(mover.faction, occupant_faction, rules.allied_pass_through) {
                continue;
            }

            // 只有嚴格更優才更新，保留先找到的前驅
            let best_cost = dist.get(&next_pos).copied().unwrap_or(MovementCost::MAX);
            if new_cost < best_cost {
                dist.insert(next_pos, new_cost);
                prev.insert(next_pos, pos);
                seq += 1;
                queue.push(Reverse((new_cost, seq, next_pos)));
            }
        }
    }

    Ok((dist, prev))
}

/// 碰撞檢測：檢查位置是否可通行
fn is_passable(mover_faction: Faction, occupant: Option<Faction>, allied_pass_through: bool) -> bool {
    match occupant {
        None => true,
        Some(faction) => allied_pass_through && faction == mover_faction,
    }
}
