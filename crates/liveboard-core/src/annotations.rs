//! Arrows and square highlights
//!
//! Client-local annotation state with deterministic toggle rules, mirrored
//! across the room by full-replace snapshots. Incremental add/remove cannot be
//! reconciled across clients without a shared ordering; resending the whole
//! set every time is idempotent and converges no matter which update lands
//! last.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::types::Square;

/// Color drawn for every arrow
pub const ARROW_COLOR: &str = "#e67e22";

/// Square highlight palette slot; absence of an entry is the "none" state
///
/// Together with "none" the click cycle has five states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkSlot {
    Green,
    Red,
    Blue,
    Yellow,
}

impl MarkSlot {
    fn next(slot: Option<MarkSlot>) -> Option<MarkSlot> {
        match slot {
            None => Some(MarkSlot::Green),
            Some(MarkSlot::Green) => Some(MarkSlot::Red),
            Some(MarkSlot::Red) => Some(MarkSlot::Blue),
            Some(MarkSlot::Blue) => Some(MarkSlot::Yellow),
            Some(MarkSlot::Yellow) => None,
        }
    }

    pub fn background_color(self) -> &'static str {
        match self {
            MarkSlot::Green => "#2ecc71",
            MarkSlot::Red => "#e74c3c",
            MarkSlot::Blue => "#3498db",
            MarkSlot::Yellow => "#f1c40f",
        }
    }
}

/// One drawn arrow, keyed by its (from, to) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    pub from: Square,
    pub to: Square,
    pub color: String,
}

/// Rendering style carried per highlighted square
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareStyle {
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
}

/// Full-replace snapshot exchanged over the sync channel
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnotationSnapshot {
    pub arrows: Vec<Arrow>,
    pub squares: BTreeMap<Square, SquareStyle>,
}

/// Local annotation state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationLayer {
    arrows: Vec<Arrow>,
    marks: BTreeMap<Square, MarkSlot>,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty() && self.marks.is_empty()
    }

    /// Advance the highlight of a square one palette step, wrapping to none
    pub fn cycle_mark(&mut self, square: Square) {
        match MarkSlot::next(self.marks.get(&square).copied()) {
            Some(slot) => {
                self.marks.insert(square, slot);
            }
            None => {
                self.marks.remove(&square);
            }
        }
    }

    /// Toggle an arrow: an identical (from, to) pair removes the existing one
    pub fn toggle_arrow(&mut self, from: Square, to: Square) {
        if let Some(index) = self
            .arrows
            .iter()
            .position(|a| a.from == from && a.to == to)
        {
            self.arrows.remove(index);
        } else {
            self.arrows.push(Arrow {
                from,
                to,
                color: ARROW_COLOR.to_string(),
            });
        }
    }

    /// Route a right-drag release: same-square drags are highlight clicks
    pub fn pointer_release(&mut self, from: Square, to: Square) {
        if from == to {
            self.cycle_mark(from);
        } else {
            self.toggle_arrow(from, to);
        }
    }

    /// Drop everything; called on every applied real move and chapter load
    pub fn clear(&mut self) {
        self.arrows.clear();
        self.marks.clear();
    }

    pub fn mark_at(&self, square: Square) -> Option<MarkSlot> {
        self.marks.get(&square).copied()
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    /// The full-replace snapshot to broadcast after any local change
    pub fn snapshot(&self) -> AnnotationSnapshot {
        AnnotationSnapshot {
            arrows: self.arrows.clone(),
            squares: self
                .marks
                .iter()
                .map(|(square, slot)| {
                    (
                        *square,
                        SquareStyle {
                            background_color: slot.background_color().to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Adopt a snapshot received from the room, replacing local state
    pub fn replace(&mut self, snapshot: &AnnotationSnapshot) {
        self.arrows = snapshot.arrows.clone();
        self.marks = snapshot
            .squares
            .iter()
            .filter_map(|(square, style)| {
                slot_for_color(&style.background_color).map(|slot| (*square, slot))
            })
            .collect();
    }
}

fn slot_for_color(color: &str) -> Option<MarkSlot> {
    [
        MarkSlot::Green,
        MarkSlot::Red,
        MarkSlot::Blue,
        MarkSlot::Yellow,
    ]
    .into_iter()
    .find(|slot| slot.background_color() == color)
}
