use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A concrete bookable interval derived from a rule on a specific date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    #[serde(rename = "start_utc")]
    pub start: DateTime<Utc>,
    #[serde(rename = "end_utc")]
    pub end: DateTime<Utc>,
}

impl Slot {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Query window for slot listing and booking listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowQuery {
    pub from: Option<DateTime<FixedOffset>>,
    pub to: Option<DateTime<FixedOffset>>,
}
