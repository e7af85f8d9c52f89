//! 5-4-3-2-1 grounding exercise

use serde::Serialize;

/// One step of the exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroundingStep {
    pub count: u8,
    pub sense: &'static str,
    pub instruction: &'static str,
}

pub const GROUNDING_STEPS: [GroundingStep; 5] = [
    GroundingStep {
        count: 5,
        sense: "see",
        instruction: "Name 5 things you can see around you right now.",
    },
    GroundingStep {
        count: 4,
        sense: "feel",
        instruction: "Name 4 things you can physically feel (your feet on the floor, clothes on your skin).",
    },
    GroundingStep {
        count: 3,
        sense: "hear",
        instruction: "Name 3 things you can hear in this moment.",
    },
    GroundingStep {
        count: 2,
        sense: "smell",
        instruction: "Name 2 things you can smell, or 2 smells you enjoy.",
    },
    GroundingStep {
        count: 1,
        sense: "taste",
        instruction: "Name 1 thing you can taste, or 1 thing you're grateful for right now.",
    },
];
