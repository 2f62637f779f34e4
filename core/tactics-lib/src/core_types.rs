//! 基本資料類型定義

use crate::alias::{Coord, ID};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// 棋盤位置（座標）
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: Coord,
    pub y: Coord,
}

impl Position {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 陣營（用於區分友軍/敵軍）
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Faction(pub ID);

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

/// 地形種類，實際成本由地形表決定
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Terrain {
    #[default]
    Plain,
    Hill,
    Forest,
    ShallowWater,
    DeepWater,
    Wall,
}

impl Terrain {
    /// ASCII 地圖中使用的符號
    pub fn symbol(self) -> &'static str {
        match self {
            Terrain::Plain => ".",
            Terrain::Hill => "^",
            Terrain::Forest => "T",
            Terrain::ShallowWater => "~",
            Terrain::DeepWater => "=",
            Terrain::Wall => "#",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "." => Some(Terrain::Plain),
            "^" => Some(Terrain::Hill),
            "T" => Some(Terrain::Forest),
            "~" => Some(Terrain::ShallowWater),
            "=" => Some(Terrain::DeepWater),
            "#" => Some(Terrain::Wall),
            _ => None,
        }
    }
}

/// 距離計算方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// 四方向棋盤
    #[default]
    Manhattan,
    /// 允許斜向移動的棋盤
    Chebyshev,
}

impl DistanceMetric {
    pub fn distance(self, a: Position, b: Position) -> Coord {
        let dx = a.x.abs_diff(b.x);
        let dy = a.y.abs_diff(b.y);
        match self {
            DistanceMetric::Manhattan => dx + dy,
            DistanceMetric::Chebyshev => dx.max(dy),
        }
    }
}

/// 射程區間（含兩端）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reach {
    pub min: Coord,
    pub max: Coord,
}

impl Reach {
    pub const fn new(min: Coord, max: Coord) -> Self {
        Reach { min, max }
    }

    pub fn contains(&self, distance: Coord) -> bool {
        self.min <= distance && distance <= self.max
    }
}

impl Default for Reach {
    fn default() -> Self {
        Reach::new(1, 1)
    }
}

impl From<(usize, usize)> for Reach {
    fn from((min, max): (usize, usize)) -> Self {
        Reach::new(min, max)
    }
}
