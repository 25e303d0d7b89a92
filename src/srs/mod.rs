pub mod queue;
pub mod sm2;

pub use queue::{QueueCandidate, RankedQueue, rank_guest, rank_queue, rank_upcoming};
pub use sm2::{IntervalPreview, Sm2Result, advance, format_interval, preview_intervals, status_for};
