//! Value objects - Immutable objects defined by their attributes

mod badge;
mod step;

pub use badge::{Badge, BadgeCatalog, BadgeRarity};
pub use step::{StepCategory, StepState, StepStatus};
