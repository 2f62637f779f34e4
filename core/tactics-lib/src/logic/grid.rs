//! 棋盤：格子、地形成本、佔據索引與射程查詢
//!
//! 只會修改佔據狀態，不碰任何單位數值。

use crate::alias::{Coord, MovementCost, UnitId};
use crate::core_types::{DistanceMetric, Position, Reach, Terrain};
use crate::error::{GridError, Result};
use crate::loader_schema::{TerrainProfile, default_terrain_profile};
use crate::logic::algo::bresenham_line;
use std::collections::{BTreeMap, HashMap};

/// 四方向鄰格（固定順序，保證路徑搜尋結果可重現）
const ORTHOGONAL: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
/// 斜向鄰格，排在四方向之後
const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// 棋盤上的一格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub position: Position,
    pub terrain: Terrain,
    pub profile: TerrainProfile,
    pub occupant: Option<UnitId>,
}

impl Cell {
    pub fn movement_cost(&self) -> MovementCost {
        self.profile.movement_cost
    }

    pub fn is_passable(&self) -> bool {
        self.profile.is_passable()
    }
}

/// 棋盤
///
/// 同時維護兩個方向的佔據索引，確保兩者永遠同步：
/// - `Cell::occupant`：某位置上的單位
/// - `unit_to_pos`：某單位所在的位置
#[derive(Debug, Clone)]
pub struct Grid {
    width: Coord,
    height: Coord,
    cells: Vec<Cell>,
    unit_to_pos: HashMap<UnitId, Position>,
}

impl Grid {
    /// 以地形矩陣（`[y][x]`）建立棋盤，地形表未列出的地形使用預設值
    pub fn from_terrain(
        terrain: &[Vec<Terrain>],
        overrides: &BTreeMap<Terrain, TerrainProfile>,
    ) -> Self {
        let height = terrain.len();
        let width = terrain.first().map_or(0, |row| row.len());
        let cells = terrain
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter().enumerate().map(move |(x, terrain)| Cell {
                    position: Position { x, y },
                    terrain: *terrain,
                    profile: overrides
                        .get(terrain)
                        .copied()
                        .unwrap_or_else(|| default_terrain_profile(*terrain)),
                    occupant: None,
                })
            })
            .collect();
        Grid {
            width,
            height,
            cells,
            unit_to_pos: HashMap::new(),
        }
    }

    /// 全平地棋盤
    pub fn plain(width: Coord, height: Coord) -> Self {
        Self::from_terrain(&vec![vec![Terrain::Plain; width]; height], &BTreeMap::new())
    }

    pub fn width(&self) -> Coord {
        self.width
    }

    pub fn height(&self) -> Coord {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn cell_at(&self, x: Coord, y: Coord) -> Result<&Cell> {
        let index = self.index_of(Position { x, y })?;
        Ok(&self.cells[index])
    }

    pub fn occupant_of(&self, pos: Position) -> Option<UnitId> {
        self.cell_at(pos.x, pos.y).ok().and_then(|cell| cell.occupant)
    }

    pub fn position_of(&self, unit_id: UnitId) -> Option<Position> {
        self.unit_to_pos.get(&unit_id).copied()
    }

    /// 所有佔據者（依座標排序）
    pub fn occupants(&self) -> impl Iterator<Item = (UnitId, Position)> + '_ {
        self.cells
            .iter()
            .filter_map(|cell| cell.occupant.map(|unit_id| (unit_id, cell.position)))
    }

    /// 將單位放到指定位置，同時清掉舊位置
    ///
    /// 所有檢查都在修改前完成，不會出現單位同時佔兩格或不佔任何格的中間狀態。
    /// 回傳單位原本的位置。
    pub fn place(&mut self, unit_id: UnitId, pos: Position) -> Result<Option<Position>> {
        let index = self.index_of(pos)?;
        let cell = &self.cells[index];
        match cell.occupant {
            Some(occupant) if occupant == unit_id => return Ok(Some(pos)),
            Some(occupant) => {
                return Err(GridError::Occupied {
                    x: pos.x,
                    y: pos.y,
                    occupant,
                }
                .into());
            }
            None => {}
        }
        if !cell.is_passable() {
            return Err(GridError::Impassable { x: pos.x, y: pos.y }.into());
        }

        let previous = self.unit_to_pos.insert(unit_id, pos);
        if let Some(prev) = previous {
            // 舊位置一定在棋盤內（放入時已驗證）
            let prev_index = prev.y * self.width + prev.x;
            self.cells[prev_index].occupant = None;
        }
        self.cells[index].occupant = Some(unit_id);
        Ok(previous)
    }

    /// 移除單位的佔據（被擊倒時使用），回傳原本的位置
    pub fn remove(&mut self, unit_id: UnitId) -> Option<Position> {
        let pos = self.unit_to_pos.remove(&unit_id)?;
        let index = pos.y * self.width + pos.x;
        self.cells[index].occupant = None;
        Some(pos)
    }

    /// 射程查詢，不考慮移動成本
    pub fn within_range(
        &self,
        origin: Position,
        target: Position,
        reach: Reach,
        metric: DistanceMetric,
    ) -> bool {
        self.contains(origin) && self.contains(target) && reach.contains(metric.distance(origin, target))
    }

    /// 射程內所有位置（依 y、x 排序）
    pub fn positions_within(
        &self,
        origin: Position,
        reach: Reach,
        metric: DistanceMetric,
    ) -> Vec<Position> {
        let min_y = origin.y.saturating_sub(reach.max);
        let max_y = (origin.y + reach.max).min(self.height.saturating_sub(1));
        let min_x = origin.x.saturating_sub(reach.max);
        let max_x = (origin.x + reach.max).min(self.width.saturating_sub(1));
        (min_y..=max_y)
            .flat_map(|y| (min_x..=max_x).map(move |x| Position { x, y }))
            .filter(|pos| self.within_range(origin, *pos, reach, metric))
            .collect()
    }

    /// 兩點之間（不含兩端）沒有阻擋視線的地形
    pub fn line_of_sight(&self, from: Position, to: Position) -> bool {
        bresenham_line(from, to)
            .into_iter()
            .filter(|pos| *pos != from && *pos != to)
            .all(|pos| {
                self.cell_at(pos.x, pos.y)
                    .map(|cell| !cell.profile.blocks_sight)
                    .unwrap_or(false)
            })
    }

    /// 鄰格（棋盤內），順序固定
    pub fn neighbors(&self, pos: Position, diagonal: bool) -> Vec<Position> {
        let extra: &[(isize, isize)] = if diagonal { &DIAGONAL } else { &[] };
        ORTHOGONAL
            .iter()
            .chain(extra)
            .filter_map(|(dx, dy)| {
                let x = pos.x.checked_add_signed(*dx)?;
                let y = pos.y.checked_add_signed(*dy)?;
                let next = Position { x, y };
                self.contains(next).then_some(next)
            })
            .collect()
    }

    fn index_of(&self, pos: Position) -> Result<usize> {
        if !self.contains(pos) {
            return Err(GridError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.width,
                height: self.height,
            }
            .into());
        }
        Ok(pos.y * self.width + pos.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn walled() -> Grid {
        let terrain = vec![
            vec![Terrain::Plain, Terrain::Plain, Terrain::Plain],
            vec![Terrain::Plain, Terrain::Wall, Terrain::Plain],
            vec![Terrain::Plain, Terrain::Plain, Terrain::Forest],
        ];
        Grid::from_terrain(&terrain, &BTreeMap::new())
    }

    #[test]
    fn test_cell_at_out_of_bounds() {
        let grid = walled();
        assert_eq!(grid.cell_at(2, 2).unwrap().terrain, Terrain::Forest);
        let err = grid.cell_at(3, 0).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::Grid(GridError::OutOfBounds {
                x: 3,
                y: 0,
                width: 3,
                height: 3
            })
        ));
    }

    #[test]
    fn test_place_moves_occupancy() {
        let mut grid = walled();
        assert_eq!(grid.place(7, Position::new(0, 0)).unwrap(), None);
        assert_eq!(grid.place(7, Position::new(2, 0)).unwrap(), Some(Position::new(0, 0)));
        assert_eq!(grid.occupant_of(Position::new(0, 0)), None);
        assert_eq!(grid.occupant_of(Position::new(2, 0)), Some(7));
        assert_eq!(grid.position_of(7), Some(Position::new(2, 0)));
        assert_eq!(grid.occupants().count(), 1);
    }

    #[test]
    fn test_place_rejects_occupied_and_wall() {
        let mut grid = walled();
        grid.place(1, Position::new(0, 0)).unwrap();
        grid.place(2, Position::new(1, 0)).unwrap();

        let err = grid.place(2, Position::new(0, 0)).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::Grid(GridError::Occupied { occupant: 1, .. })
        ));
        let err = grid.place(2, Position::new(1, 1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Grid(GridError::Impassable { .. })));

        // 失敗後狀態不變
        assert_eq!(grid.position_of(2), Some(Position::new(1, 0)));
        assert_eq!(grid.occupant_of(Position::new(0, 0)), Some(1));
    }

    #[test]
    fn test_remove() {
        let mut grid = walled();
        grid.place(1, Position::new(0, 2)).unwrap();
        assert_eq!(grid.remove(1), Some(Position::new(0, 2)));
        assert_eq!(grid.remove(1), None);
        assert_eq!(grid.occupant_of(Position::new(0, 2)), None);
    }

    #[test]
    fn test_within_range_metrics() {
        let grid = Grid::plain(5, 5);
        let origin = Position::new(2, 2);
        let reach = Reach::new(1, 1);
        assert!(grid.within_range(origin, Position::new(2, 3), reach, DistanceMetric::Manhattan));
        assert!(!grid.within_range(origin, Position::new(3, 3), reach, DistanceMetric::Manhattan));
        assert!(grid.within_range(origin, Position::new(3, 3), reach, DistanceMetric::Chebyshev));
        assert!(!grid.within_range(origin, origin, reach, DistanceMetric::Chebyshev));

        let ring = grid.positions_within(origin, reach, DistanceMetric::Manhattan);
        assert_eq!(
            ring,
            vec![
                Position::new(2, 1),
                Position::new(1, 2),
                Position::new(3, 2),
                Position::new(2, 3)
            ]
        );
        assert_eq!(
            grid.positions_within(Position::new(0, 0), Reach::new(0, 1), DistanceMetric::Chebyshev)
                .len(),
            4
        );
    }

    #[test]
    fn test_line_of_sight() {
        let grid = walled();
        // 牆在 (1,1)
        assert!(!grid.line_of_sight(Position::new(0, 0), Position::new(2, 2)));
        assert!(!grid.line_of_sight(Position::new(1, 0), Position::new(1, 2)));
        assert!(grid.line_of_sight(Position::new(0, 0), Position::new(2, 0)));
        // 終點的森林不擋自己
        assert!(grid.line_of_sight(Position::new(2, 0), Position::new(2, 2)));
    }

    #[test]
    fn test_neighbors_order() {
        let grid = Grid::plain(3, 3);
        assert_eq!(
            grid.neighbors(Position::new(0, 0), false),
            vec![Position::new(0, 1), Position::new(1, 0)]
        );
        assert_eq!(grid.neighbors(Position::new(1, 1), false).len(), 4);
        assert_eq!(grid.neighbors(Position::new(1, 1), true).len(), 8);
    }
}
