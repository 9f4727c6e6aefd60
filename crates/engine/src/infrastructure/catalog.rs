//! Startup catalog loading - badges and quest templates.
//!
//! Both catalogs are immutable reference data: they are read once here,
//! validated, and injected into the services that need them. Authoring
//! happens in an external tool; the engine only consumes JSON exports of
//! it, falling back to the built-in defaults for local development.

use anyhow::Context;
use chrono::{DateTime, Utc};

use questline_domain::{
    Badge, BadgeCatalog, BadgeId, BadgeRarity, QuestTemplate, StepCategory, StepDefinition,
    StepId, TemplateId,
};

/// Load the badge catalog from a JSON export, or fall back to the built-in
/// defaults when no path is configured.
pub fn load_badge_catalog(path: Option<&str>) -> anyhow::Result<BadgeCatalog> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading badge catalog from {path}"))?;
            let catalog: BadgeCatalog =
                serde_json::from_str(&raw).with_context(|| format!("parsing badge catalog {path}"))?;
            tracing::info!(path, badges = catalog.len(), "Loaded badge catalog");
            Ok(catalog)
        }
        None => {
            let catalog = default_badge_catalog()?;
            tracing::info!(badges = catalog.len(), "Using built-in badge catalog");
            Ok(catalog)
        }
    }
}

/// Load quest templates from a JSON export (an array of templates), or fall
/// back to the built-in default quest. Returns the templates together with
/// the designated default template id.
pub fn load_templates(
    path: Option<&str>,
    now: DateTime<Utc>,
) -> anyhow::Result<(Vec<QuestTemplate>, Option<TemplateId>)> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading templates from {path}"))?;
            let templates: Vec<QuestTemplate> =
                serde_json::from_str(&raw).with_context(|| format!("parsing templates {path}"))?;
            tracing::info!(path, templates = templates.len(), "Loaded quest templates");
            // Newest active export is the designated default
            Ok((templates, None))
        }
        None => {
            let template = default_template(now)?;
            let default_id = template.id().clone();
            tracing::info!(template = %default_id, "Using built-in quest template");
            Ok((vec![template], Some(default_id)))
        }
    }
}

fn badge_id(raw: &str) -> anyhow::Result<BadgeId> {
    BadgeId::new(raw).with_context(|| format!("invalid built-in badge id {raw}"))
}

fn step_id(raw: &str) -> anyhow::Result<StepId> {
    StepId::new(raw).with_context(|| format!("invalid built-in step id {raw}"))
}

/// Built-in badges for local development and tests.
pub fn default_badge_catalog() -> anyhow::Result<BadgeCatalog> {
    let badges = vec![
        Badge::new(
            badge_id("explorer")?,
            "Explorer",
            "Took the workspace tour",
            BadgeRarity::Common,
        ),
        Badge::new(
            badge_id("connector")?,
            "Connector",
            "Invited a teammate to collaborate",
            BadgeRarity::Rare,
        ),
        Badge::new(
            badge_id("graduate")?,
            "Graduate",
            "Finished every onboarding quest step",
            BadgeRarity::Epic,
        ),
        Badge::new(
            badge_id("legend")?,
            "Legend",
            "Reserved for community milestones",
            BadgeRarity::Legendary,
        ),
    ];
    BadgeCatalog::new(badges).context("building built-in badge catalog")
}

/// Built-in onboarding quest for local development and tests.
pub fn default_template(now: DateTime<Utc>) -> anyhow::Result<QuestTemplate> {
    let steps = vec![
        StepDefinition::new(step_id("complete-profile")?, "Complete your profile", 1, 50, true)
            .with_description("Add a display name and avatar so teammates can find you")
            .with_category(StepCategory::Setup),
        StepDefinition::new(step_id("tour-workspace")?, "Tour the workspace", 2, 25, false)
            .with_description("Walk through the main areas of the product")
            .with_category(StepCategory::Exploration)
            .with_badge(badge_id("explorer")?),
        StepDefinition::new(step_id("first-post")?, "Publish your first post", 3, 75, true)
            .with_description("Share something with your team")
            .with_category(StepCategory::Content),
        StepDefinition::new(step_id("invite-teammate")?, "Invite a teammate", 4, 50, false)
            .with_description("Onboarding is better together")
            .with_category(StepCategory::Networking)
            .with_badge(badge_id("connector")?),
        StepDefinition::new(step_id("finish-tutorial")?, "Finish the tutorial", 5, 100, true)
            .with_description("Complete the guided walkthrough")
            .with_category(StepCategory::Mastery)
            .with_badge(badge_id("graduate")?),
    ];

    let template = QuestTemplate::new(
        TemplateId::new("default-onboarding").context("invalid built-in template id")?,
        "Getting Started",
        steps,
        now,
    )
    .context("building built-in quest template")?
    .with_description("The default onboarding quest for new users");
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_template_references_built_in_badges() {
        let catalog = default_badge_catalog().expect("catalog builds");
        let template = default_template(Utc::now()).expect("template builds");

        for step in template.steps() {
            if let Some(badge_id) = &step.badge_id {
                assert!(
                    catalog.contains(badge_id),
                    "step {} references unknown badge {}",
                    step.id,
                    badge_id
                );
            }
        }
    }

    #[test]
    fn built_in_template_is_active_with_required_steps() {
        let template = default_template(Utc::now()).expect("template builds");
        assert!(template.is_active());
        assert!(template.steps().iter().any(|s| s.is_required));
        assert_eq!(template.first_step().map(|s| s.order), Some(1));
    }
}
