// Time attribution for iteration analytics
//
// Objective: attribute logged seconds to members and iterations, not just
// count issues. A single long log entry on one issue may outweigh dozens of
// small ones spread across a sprint.
//
// Three views share one split rule:
// - windowed attribution (per member per iteration, per iteration)
// - unwindowed member totals
// - sprint load (planned weight vs logged time per scheduled iteration)

mod attribution;
mod member_totals;
mod sprint_load;

pub use attribution::{attribute, MemberIntervalSeconds, TimeAttribution};
pub use member_totals::{member_totals, MemberTotal};
pub use sprint_load::{sprint_load, SprintLoad};
