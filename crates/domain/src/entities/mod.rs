//! Domain entities - Core business objects with identity

mod quest_template;
mod user_badges;

pub use quest_template::{QuestTemplate, StepDefinition};
pub use user_badges::{BadgeUnlock, GrantOutcome, UserBadges};
