//! 本檔案僅收錄「有名且有固定公式」的演算法。
//! 專案自訂的判定邏輯請勿放於此處。

use crate::core_types::Position;

// https://en.wikipedia.org/wiki/Bresenham%27s_line_algorithm
/// 由 from 畫線到 to，回傳經過的格子（含兩端）
pub fn bresenham_line(from: Position, to: Position) -> Vec<Position> {
    let mut points = Vec::new();

    let dx = (to.x as isize - from.x as isize).abs();
    let dy = (to.y as isize - from.y as isize).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };

    let mut err = dx - dy;
    let mut x = from.x as isize;
    let mut y = from.y as isize;

    loop {
        points.push(Position {
            x: x as usize,
            y: y as usize,
        });
        if x as usize == to.x && y as usize == to.y {
            break;
        }

        let e2 = err * 2;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bresenham_line() {
        let test_data = [
            (
                Position::new(0, 0),
                Position::new(3, 3),
                vec![
                    Position::new(0, 0),
                    Position::new(1, 1),
                    Position::new(2, 2),
                    Position::new(3, 3),
                ],
            ),
            (
                Position::new(0, 0),
                Position::new(3, 1),
                vec![
                    Position::new(0, 0),
                    Position::new(1, 0),
                    Position::new(2, 1),
                    Position::new(3, 1),
                ],
            ),
            (
                Position::new(2, 4),
                Position::new(2, 1),
                vec![
                    Position::new(2, 4),
                    Position::new(2, 3),
                    Position::new(2, 2),
                    Position::new(2, 1),
                ],
            ),
            (Position::new(1, 1), Position::new(1, 1), vec![Position::new(1, 1)]),
        ];
        for (from, to, expected) in test_data {
            assert_eq!(bresenham_line(from, to), expected, "{from} -> {to}");
        }
    }
}
