use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Type tag of every registered object. The name doubles as the element tag
/// used by the persistence format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    KeyPoint,
    Line,
    Quadratic,
    Cubic,
    Group,
    PanelPolygon,
    Sewing,
}

impl ObjectType {
    pub const ALL: [ObjectType; 7] = [
        ObjectType::KeyPoint,
        ObjectType::Line,
        ObjectType::Quadratic,
        ObjectType::Cubic,
        ObjectType::Group,
        ObjectType::PanelPolygon,
        ObjectType::Sewing,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            ObjectType::KeyPoint => "KeyPoint",
            ObjectType::Line => "Line",
            ObjectType::Quadratic => "Quadratic",
            ObjectType::Cubic => "Cubic",
            ObjectType::Group => "Group",
            ObjectType::PanelPolygon => "PanelPolygon",
            ObjectType::Sewing => "Sewing",
        }
    }

    pub fn from_type_name(name: &str) -> Option<ObjectType> {
        ObjectType::ALL.iter().copied().find(|t| t.type_name() == name)
    }

    pub fn is_curve(self) -> bool {
        matches!(self, ObjectType::Line | ObjectType::Quadratic | ObjectType::Cubic)
    }

    /// Fixed key point count of the curve variants.
    pub fn arity(self) -> Option<usize> {
        match self {
            ObjectType::Line => Some(2),
            ObjectType::Quadratic => Some(3),
            ObjectType::Cubic => Some(4),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectOp {
    /// Exactly the targets end up selected.
    SelectThis,
    /// Targets are added to the current selection.
    SelectUnion,
    /// Targets flip; the rest is left alone.
    SelectUnionInverse,
    SelectAll,
    SelectNone,
    /// Every flag flips.
    SelectInverse,
}

/// Axis-aligned bounding box. The empty box is inverted (`min = +inf`,
/// `max = -inf`) so that a union with any point yields that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Bound {
    fn default() -> Self {
        Bound::EMPTY
    }
}

impl Bound {
    pub const EMPTY: Bound = Bound {
        min: Vec2::splat(f32::INFINITY),
        max: Vec2::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Bound { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn union_point(&mut self, p: Vec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&mut self, other: &Bound) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn size(&self) -> Vec2 {
        if self.is_empty() {
            Vec2::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Option<Vec2> {
        (!self.is_empty()).then(|| (self.min + self.max) * 0.5)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
