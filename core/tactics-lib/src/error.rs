//! 錯誤處理系統
//!
//! 分類：
//! - 驗證錯誤（座標、射程、佔據、回合狀態）：可恢復，狀態不變，呼叫端修正後重送
//! - `ConsistencyError`：棋盤與單位登錄表不一致，屬於程式錯誤，戰鬥直接中止
//! - `PathError::Unreachable`：一般的否定結果，不是例外路徑

use crate::alias::{Coord, Rounds, SkillName, TypeName, UnitId};
use crate::core_types::Position;
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 頂層錯誤，包含原始錯誤和 context 鏈
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    contexts: Vec<String>,
}

/// 錯誤種類
#[derive(Debug, ThisError)]
pub enum ErrorKind {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

/// 棋盤錯誤
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum GridError {
    #[error("位置超出棋盤邊界: ({x}, {y}) 邊界 ({width}, {height})")]
    OutOfBounds {
        x: Coord,
        y: Coord,
        width: Coord,
        height: Coord,
    },
    #[error("位置 ({x}, {y}) 已被單位 {occupant} 佔據")]
    Occupied { x: Coord, y: Coord, occupant: UnitId },
    #[error("位置 ({x}, {y}) 無法通行")]
    Impassable { x: Coord, y: Coord },
}

/// 路徑搜尋結果
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PathError {
    #[error("目標 ({x}, {y}) 不可到達")]
    Unreachable { x: Coord, y: Coord },
}

/// 單位相關錯誤
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum UnitError {
    #[error("找不到單位 {unit_id}")]
    NotFound { unit_id: UnitId },
    #[error("單位 {unit_id} 已被擊倒")]
    Defeated { unit_id: UnitId },
    #[error("單位 ID 重複: {unit_id}")]
    DuplicateId { unit_id: UnitId },
    #[error("單位類型未找到: {type_name}")]
    UnknownUnitType { type_name: TypeName },
    #[error("技能未找到: {skill_name}")]
    SkillNotFound { skill_name: SkillName },
    #[error("單位類型 {type_name} 的最大生命值必須大於 0，實際為 {max_hp}")]
    InvalidMaxHp { type_name: TypeName, max_hp: i32 },
}

/// 行動驗證錯誤
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ActionError {
    #[error("目標不合法: {reason}")]
    InvalidTarget { reason: TargetIssue },
    #[error("單位 {unit_id} 沒有技能 {skill_name}")]
    SkillNotKnown {
        unit_id: UnitId,
        skill_name: SkillName,
    },
    #[error("技能 {skill_name} 冷卻中，剩餘 {remaining} 輪")]
    SkillOnCooldown {
        skill_name: SkillName,
        remaining: Rounds,
    },
    #[error("技能 {skill_name} 的目標種類不符")]
    SkillTargetMismatch { skill_name: SkillName },
    #[error("單位 {unit_id} 已無剩餘移動力")]
    NoMovementLeft { unit_id: UnitId },
}

/// 目標不合法的原因
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum TargetIssue {
    #[error("攻擊者 {0} 已被擊倒")]
    AttackerDefeated(UnitId),
    #[error("目標 {0} 已被擊倒")]
    TargetDefeated(UnitId),
    #[error("距離 {distance} 不在射程 {min}..={max} 內")]
    OutOfRange {
        distance: Coord,
        min: Coord,
        max: Coord,
    },
    #[error("目標與攻擊者同陣營")]
    SameFaction,
    #[error("不能以自己為目標")]
    SelfTarget,
    #[error("視線被阻擋")]
    NoLineOfSight,
}

/// 回合流程錯誤
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum TurnError {
    #[error("戰鬥尚未開始")]
    NotStarted,
    #[error("戰鬥已經開始")]
    AlreadyStarted,
    #[error("單位 {unit_id} 本回合已行動")]
    AlreadyActed { unit_id: UnitId },
    #[error("現在不是單位 {unit_id} 的回合，行動中單位: {active:?}")]
    NotActiveUnit {
        unit_id: UnitId,
        active: Option<UnitId>,
    },
    #[error("戰鬥已結束")]
    EncounterOver,
    #[error("沒有待確認的行動")]
    NothingPending,
    #[error("戰鬥已因狀態不一致而中止: {reason}")]
    Halted { reason: String },
}

/// 格式載入錯誤
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum LoadError {
    #[error("解析失敗: {0}")]
    ParseError(String),
    #[error("{format} 反序列化失敗: {reason}")]
    DeserializeError { format: String, reason: String },
}

/// 棋盤與單位登錄表不一致
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ConsistencyError {
    #[error("單位 {unit_id} 記錄位置 {recorded:?} 與棋盤 {on_grid:?} 不符")]
    PositionMismatch {
        unit_id: UnitId,
        recorded: Option<Position>,
        on_grid: Option<Position>,
    },
    #[error("已擊倒的單位 {unit_id} 仍佔據 {pos}")]
    DefeatedOccupant { unit_id: UnitId, pos: Position },
    #[error("棋盤上的單位 {unit_id} 不在登錄表中")]
    UnknownOccupant { unit_id: UnitId },
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    /// 狀態不一致屬於致命錯誤，其餘皆可由呼叫端修正後重試
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Consistency(_))
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self.kind, ErrorKind::Path(PathError::Unreachable { .. }))
    }

    /// 添加錯誤上下文，自動記錄呼叫位置
    #[track_caller]
    pub fn context<C: Into<String>>(mut self, context: C) -> Self {
        let loc = std::panic::Location::caller();
        let msg = format!("{} [{}:{}]", context.into(), loc.file(), loc.line());
        self.contexts.push(msg);
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        for ctx in &self.contexts {
            write!(f, "\n  {}", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl<E: Into<ErrorKind>> From<E> for Error {
    fn from(error: E) -> Self {
        Self {
            kind: error.into(),
            contexts: Vec::new(),
        }
    }
}

impl From<TargetIssue> for ErrorKind {
    fn from(reason: TargetIssue) -> Self {
        ErrorKind::Action(ActionError::InvalidTarget { reason })
    }
}

/// Result 擴展 trait，用於添加錯誤上下文
pub trait Context<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    #[track_caller]
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(e) => Err(e.context(context)),
        }
    }
}
