//! 棋盤與戰鬥配置載入器

use crate::core_types::{Position, Terrain};
use crate::error::{LoadError, Result};
use crate::loader_schema::{BoardConfig, EncounterConfig};
use std::collections::HashMap;

/// 從 ASCII 格式載入棋盤
///
/// ASCII 格式：每行用空格分隔的符號
/// - 地形符號（`.` 平地、`^` 山丘、`T` 森林、`~` 淺水、`=` 深水、`#` 牆）
/// - 其他字符串（`A`、`D` 等）= 標記位置，地形視為平地
/// - 相同的標記會全部收集成 Vec
///
/// 返回：(棋盤設定, 標記映射)
///
/// 例如：
/// ```text
/// A . #
/// . ^ D
/// ```
pub fn load_from_ascii(ascii: &str) -> Result<(BoardConfig, HashMap<String, Vec<Position>>)> {
    let lines: Vec<&str> = ascii
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(LoadError::ParseError("棋盤為空".to_string()).into());
    }

    // 推導寬度（第一行的符號數）
    let width = lines[0].split_whitespace().count();
    let height = lines.len();

    let mut terrain_rows = Vec::with_capacity(height);
    let mut markers: HashMap<String, Vec<Position>> = HashMap::new();

    for (y, line) in lines.iter().enumerate() {
        let cells: Vec<&str> = line.split_whitespace().collect();
        if cells.len() != width {
            return Err(LoadError::ParseError(format!(
                "第 {y} 行有 {} 格，預期 {width} 格",
                cells.len()
            ))
            .into());
        }

        let mut row = Vec::with_capacity(width);
        for (x, cell) in cells.into_iter().enumerate() {
            match Terrain::from_symbol(cell) {
                Some(terrain) => row.push(terrain.symbol()),
                None => {
                    markers
                        .entry(cell.to_string())
                        .or_default()
                        .push(Position { x, y });
                    row.push(Terrain::Plain.symbol());
                }
            }
        }
        terrain_rows.push(row.join(" "));
    }

    let board = BoardConfig {
        width,
        height,
        terrain_rows,
    };
    Ok((board, markers))
}

/// 將 `BoardConfig` 展開成地形矩陣（`[y][x]`）
pub fn parse_terrain_rows(board: &BoardConfig) -> Result<Vec<Vec<Terrain>>> {
    if board.width == 0 || board.height == 0 {
        return Err(LoadError::ParseError(format!(
            "棋盤尺寸不合法: {}x{}",
            board.width, board.height
        ))
        .into());
    }

    if board.terrain_rows.is_empty() {
        return Ok(vec![vec![Terrain::Plain; board.width]; board.height]);
    }

    if board.terrain_rows.len() != board.height {
        return Err(LoadError::ParseError(format!(
            "地形有 {} 列，預期 {} 列",
            board.terrain_rows.len(),
            board.height
        ))
        .into());
    }

    board
        .terrain_rows
        .iter()
        .enumerate()
        .map(|(y, line)| -> Result<Vec<Terrain>> {
            let row = line
                .split_whitespace()
                .map(|symbol| {
                    Terrain::from_symbol(symbol).ok_or_else(|| {
                        LoadError::ParseError(format!("第 {y} 列有未知地形符號 `{symbol}`"))
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            if row.len() != board.width {
                return Err(LoadError::ParseError(format!(
                    "第 {y} 列有 {} 格，預期 {} 格",
                    row.len(),
                    board.width
                ))
                .into());
            }
            Ok(row)
        })
        .collect()
}

/// 反序列化戰鬥配置 TOML
pub fn parse_encounter_toml(encounter_toml: &str) -> Result<EncounterConfig> {
    toml::from_str(encounter_toml).map_err(|e| {
        LoadError::DeserializeError {
            format: "encounter.toml".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
