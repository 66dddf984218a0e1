use serde::{Deserialize, Serialize};

/// A polyomino as a set of grid cells, `y` pointing down.
///
/// Cells are always normalised: translated so the minimum `x` and `y` are
/// zero, then sorted. Two shapes are equal exactly when they cover the same
/// cells in the same orientation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    cells: Vec<(i8, i8)>,
}

impl Shape {
    pub fn new(cells: impl IntoIterator<Item = (i8, i8)>) -> Self {
        let mut cells: Vec<(i8, i8)> = cells.into_iter().collect();
        let min_x = cells.iter().map(|c| c.0).min().unwrap_or(0);
        let min_y = cells.iter().map(|c| c.1).min().unwrap_or(0);
        for c in &mut cells {
            c.0 -= min_x;
            c.1 -= min_y;
        }
        cells.sort_unstable();
        cells.dedup();
        Self { cells }
    }

    pub fn cells(&self) -> &[(i8, i8)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Rotates clockwise by `quarter_turns` × 90°.
    pub fn rotated(&self, quarter_turns: u8) -> Self {
        let mut cells = self.cells.clone();
        for _ in 0..quarter_turns % 4 {
            for c in &mut cells {
                *c = (-c.1, c.0);
            }
        }
        Self::new(cells)
    }

    /// Left-right reflection.
    pub fn mirrored(&self) -> Self {
        Self::new(self.cells.iter().map(|&(x, y)| (-x, y)))
    }

    /// True when the reflection differs from the shape itself.
    pub fn is_chiral(&self) -> bool {
        self.mirrored() != *self
    }
}

/// Nearest quarter-turn count for an angle in degrees.
pub fn quarter_turns(angle: u16) -> u8 {
    ((angle as f64 / 90.0).round() as u32 % 4) as u8
}

/// Angular distance from the upright orientation, 0..=180.
pub fn angular_distance(angle: u16) -> u16 {
    let a = angle % 360;
    a.min(360 - a)
}

/// Named base shapes the generator draws from.
pub fn shape_bank() -> Vec<(&'static str, Shape)> {
    vec![
        ("L4", Shape::new([(0, 0), (0, 1), (0, 2), (1, 2)])),
        ("T4", Shape::new([(0, 0), (1, 0), (2, 0), (1, 1)])),
        ("S4", Shape::new([(1, 0), (2, 0), (0, 1), (1, 1)])),
        ("F5", Shape::new([(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)])),
        ("P5", Shape::new([(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)])),
        ("N5", Shape::new([(1, 0), (1, 1), (1, 2), (0, 2), (0, 3)])),
        ("Y5", Shape::new([(1, 0), (0, 1), (1, 1), (1, 2), (1, 3)])),
        ("W5", Shape::new([(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)])),
        ("U5", Shape::new([(0, 0), (2, 0), (0, 1), (1, 1), (2, 1)])),
        ("V5", Shape::new([(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)])),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalisation_ignores_offset_and_order() {
        let a = Shape::new([(5, 5), (5, 6), (6, 6)]);
        let b = Shape::new([(1, 1), (0, 0), (0, 1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn four_quarter_turns_is_identity() {
        for (_, shape) in shape_bank() {
            assert_eq!(shape.rotated(4), shape);
            assert_eq!(shape.rotated(1).rotated(3), shape);
            assert_eq!(shape.rotated(2).len(), shape.len());
        }
    }

    #[test]
    fn rotation_is_clockwise() {
        // horizontal bar with a nub at the right end, pointing down
        let shape = Shape::new([(0, 0), (1, 0), (2, 0), (2, 1)]);
        // after a clockwise quarter turn the bar is vertical and the nub sits bottom-left
        let turned = Shape::new([(1, 0), (1, 1), (1, 2), (0, 2)]);
        assert_eq!(shape.rotated(1), turned);
    }

    #[test]
    fn chirality() {
        let bank = shape_bank();
        let chiral: Vec<&str> = bank
            .iter()
            .filter(|(_, s)| s.is_chiral())
            .map(|(n, _)| *n)
            .collect();
        assert!(chiral.contains(&"L4"));
        assert!(chiral.contains(&"F5"));
        assert!(!chiral.contains(&"T4"));
        assert!(!chiral.contains(&"U5"));
    }

    #[test]
    fn angles_snap_to_nearest_quarter() {
        assert_eq!(quarter_turns(0), 0);
        assert_eq!(quarter_turns(60), 1);
        assert_eq!(quarter_turns(120), 1);
        assert_eq!(quarter_turns(150), 2);
        assert_eq!(quarter_turns(210), 2);
        assert_eq!(quarter_turns(240), 3);
        assert_eq!(quarter_turns(300), 3);
        assert_eq!(quarter_turns(330), 0);
        assert_eq!(angular_distance(300), 60);
        assert_eq!(angular_distance(180), 180);
    }
}
