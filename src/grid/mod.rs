pub mod perpetual;
pub mod week;

pub use perpetual::{PerpetualGrid, PerpetualSlot};
pub use week::{GridDay, WeekGrid, WeekRow};

use serde::Serialize;

/// Position of a year-bound grid day relative to the displayed month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Previous,
    Current,
    Next,
}

impl Membership {
    pub fn is_overflow(&self) -> bool {
        !matches!(self, Membership::Current)
    }
}
