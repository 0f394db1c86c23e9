//! Enumerated codes of the hydraulic model.

use std::fmt;

/// Shape of a cross-section definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrossSectionShape {
    ClosedRectangle,
    Rectangle,
    Circle,
    Egg,
    TabulatedRectangle,
    TabulatedTrapezium,
    TabulatedYz,
    InvertedEgg,
}

impl CrossSectionShape {
    /// Every shape, ordered by code.
    pub const ALL: [CrossSectionShape; 8] = [
        CrossSectionShape::ClosedRectangle,
        CrossSectionShape::Rectangle,
        CrossSectionShape::Circle,
        CrossSectionShape::Egg,
        CrossSectionShape::TabulatedRectangle,
        CrossSectionShape::TabulatedTrapezium,
        CrossSectionShape::TabulatedYz,
        CrossSectionShape::InvertedEgg,
    ];

    /// Stored integer code.
    pub fn code(self) -> i64 {
        match self {
            CrossSectionShape::ClosedRectangle => 0,
            CrossSectionShape::Rectangle => 1,
            CrossSectionShape::Circle => 2,
            CrossSectionShape::Egg => 3,
            CrossSectionShape::TabulatedRectangle => 5,
            CrossSectionShape::TabulatedTrapezium => 6,
            CrossSectionShape::TabulatedYz => 7,
            CrossSectionShape::InvertedEgg => 8,
        }
    }

    /// Looks up a shape by its stored code.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Shapes described by a list of widths and heights.
    pub fn is_tabulated(self) -> bool {
        matches!(
            self,
            CrossSectionShape::TabulatedRectangle
                | CrossSectionShape::TabulatedTrapezium
                | CrossSectionShape::TabulatedYz
        )
    }

    /// Shapes that are closed regardless of their dimensions.
    pub fn is_closed_by_definition(self) -> bool {
        matches!(
            self,
            CrossSectionShape::ClosedRectangle
                | CrossSectionShape::Circle
                | CrossSectionShape::Egg
                | CrossSectionShape::InvertedEgg
        )
    }

    /// Ratio of derived height to width, for shapes whose height follows
    /// from their width.
    pub fn height_ratio(self) -> Option<f64> {
        match self {
            CrossSectionShape::Circle => Some(1.0),
            CrossSectionShape::Egg | CrossSectionShape::InvertedEgg => Some(1.5),
            _ => None,
        }
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            CrossSectionShape::ClosedRectangle => "closed rectangle",
            CrossSectionShape::Rectangle => "rectangle",
            CrossSectionShape::Circle => "circle",
            CrossSectionShape::Egg => "egg",
            CrossSectionShape::TabulatedRectangle => "tabulated rectangle",
            CrossSectionShape::TabulatedTrapezium => "tabulated trapezium",
            CrossSectionShape::TabulatedYz => "tabulated YZ",
            CrossSectionShape::InvertedEgg => "inverted egg",
        }
    }

    /// Codes of a group of shapes, for use in predicates.
    pub fn codes(shapes: &[CrossSectionShape]) -> Vec<i64> {
        shapes.iter().map(|s| s.code()).collect()
    }
}

impl fmt::Display for CrossSectionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a channel exchanges water with the 2D domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationType {
    Embedded,
    Isolated,
    Connected,
    DoubleConnected,
}

impl CalculationType {
    /// Every calculation type.
    pub const ALL: [CalculationType; 4] = [
        CalculationType::Embedded,
        CalculationType::Isolated,
        CalculationType::Connected,
        CalculationType::DoubleConnected,
    ];

    /// Stored integer code.
    pub fn code(self) -> i64 {
        match self {
            CalculationType::Embedded => 100,
            CalculationType::Isolated => 101,
            CalculationType::Connected => 102,
            CalculationType::DoubleConnected => 105,
        }
    }
}

/// Kind of boundary condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryType {
    WaterLevel,
    Velocity,
    Discharge,
    Sommerfeld,
}

impl BoundaryType {
    /// Every boundary type.
    pub const ALL: [BoundaryType; 4] = [
        BoundaryType::WaterLevel,
        BoundaryType::Velocity,
        BoundaryType::Discharge,
        BoundaryType::Sommerfeld,
    ];

    /// Stored integer code.
    pub fn code(self) -> i64 {
        match self {
            BoundaryType::WaterLevel => 1,
            BoundaryType::Velocity => 2,
            BoundaryType::Discharge => 3,
            BoundaryType::Sommerfeld => 5,
        }
    }
}

/// Friction formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrictionType {
    Chezy,
    Manning,
}

impl FrictionType {
    /// Every friction type.
    pub const ALL: [FrictionType; 2] = [FrictionType::Chezy, FrictionType::Manning];

    /// Stored integer code.
    pub fn code(self) -> i64 {
        match self {
            FrictionType::Chezy => 1,
            FrictionType::Manning => 2,
        }
    }
}

/// Crest shape of weirs and orifices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrestType {
    BroadCrested,
    ShortCrested,
}

impl CrestType {
    /// Every crest type.
    pub const ALL: [CrestType; 2] = [CrestType::BroadCrested, CrestType::ShortCrested];

    /// Stored integer code.
    pub fn code(self) -> i64 {
        match self {
            CrestType::BroadCrested => 3,
            CrestType::ShortCrested => 4,
        }
    }
}
