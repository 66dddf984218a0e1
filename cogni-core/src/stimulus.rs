use serde::Serialize;

/// Arena coordinates, in the host's logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeRole {
    /// The shape to transform, and the clockwise angle the player should apply.
    Reference { rotate_by: u16 },
    Option(usize),
}

/// What the host should draw for one visible element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualClass {
    ColorPad { index: usize, lit: bool },
    Target,
    Distractor,
    /// A colour name (`word`) printed in another palette colour (`ink`).
    ColorWord { word: usize, ink: usize },
    Peg {
        index: usize,
        disks: Vec<u8>,
        selected: bool,
    },
    Shape {
        cells: Vec<(i8, i8)>,
        role: ShapeRole,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleStimulus {
    pub id: u64,
    pub position: Position,
    pub class: VisualClass,
}

/// Read-only render feed, rebuilt after every processed event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: &'static str,
    pub stimuli: Vec<VisibleStimulus>,
    /// 1-based number of the trial or round in progress.
    pub trial: usize,
    pub trial_budget: Option<usize>,
    pub lives: Option<u8>,
    pub time_remaining_ms: Option<u64>,
    pub running_score: u64,
    pub paused: bool,
}

impl Snapshot {
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            stimuli: Vec::new(),
            trial: 0,
            trial_budget: None,
            lives: None,
            time_remaining_ms: None,
            running_score: 0,
            paused: false,
        }
    }

    pub fn find(&self, id: u64) -> Option<&VisibleStimulus> {
        self.stimuli.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(30.0, 40.0);
        assert!((a.distance(&b) - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn visual_class_serializes_with_kind_tag() {
        let v = VisualClass::ColorPad {
            index: 2,
            lit: true,
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "color_pad");
        assert_eq!(json["index"], 2);
    }
}
