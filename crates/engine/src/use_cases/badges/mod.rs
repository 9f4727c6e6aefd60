//! Badge unlock operations.

mod unlock;

pub use unlock::{BadgeError, BadgeService};
