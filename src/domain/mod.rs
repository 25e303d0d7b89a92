pub mod problem;
pub mod progress;
pub mod review;

pub use problem::{Difficulty, Problem, ProblemId, ProblemSet, SetMembership, UserId};
pub use progress::{Rating, SchedulingState, Status};
pub use review::ReviewEvent;
