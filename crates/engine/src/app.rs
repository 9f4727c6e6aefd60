//! Application state and composition.

use std::sync::Arc;

use questline_domain::BadgeCatalog;

use crate::infrastructure::notifier::ProgressNotifier;
use crate::infrastructure::ports::{
    AnalyticsPort, BadgeRepo, ClockPort, ProgressNotifierPort, ProgressRepo, TemplateRepo,
};
use crate::use_cases::{
    BadgeService, CompleteStep, ProgressQueries, SkipStep, StartOnboarding, TemplateStore,
    TransitionEffects,
};

/// Main application state.
///
/// Holds all repositories and use cases. Passed to HTTP/WebSocket handlers
/// via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    /// Concrete hub so the WebSocket layer can subscribe to snapshots.
    pub notifier: Arc<ProgressNotifier>,
}

/// Container for the injected persistence ports.
pub struct Repositories {
    pub template: Arc<dyn TemplateRepo>,
    pub progress: Arc<dyn ProgressRepo>,
    pub badge: Arc<dyn BadgeRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub start: StartOnboarding,
    pub complete_step: CompleteStep,
    pub skip_step: SkipStep,
    pub queries: ProgressQueries,
    pub templates: Arc<TemplateStore>,
    pub badges: Arc<BadgeService>,
}

impl App {
    pub fn new(
        template_repo: Arc<dyn TemplateRepo>,
        progress_repo: Arc<dyn ProgressRepo>,
        badge_repo: Arc<dyn BadgeRepo>,
        badge_catalog: Arc<BadgeCatalog>,
        clock: Arc<dyn ClockPort>,
        analytics: Arc<dyn AnalyticsPort>,
    ) -> Self {
        let notifier = Arc::new(ProgressNotifier::new());
        let notifier_port: Arc<dyn ProgressNotifierPort> = notifier.clone();
        let effects = TransitionEffects::new(analytics, notifier_port);

        let templates = Arc::new(TemplateStore::new(template_repo.clone()));
        let badges = Arc::new(BadgeService::new(
            badge_catalog,
            badge_repo.clone(),
            clock.clone(),
        ));

        let use_cases = UseCases {
            start: StartOnboarding::new(
                templates.clone(),
                progress_repo.clone(),
                clock.clone(),
                effects.clone(),
            ),
            complete_step: CompleteStep::new(
                templates.clone(),
                progress_repo.clone(),
                badges.clone(),
                clock.clone(),
                effects.clone(),
            ),
            skip_step: SkipStep::new(
                templates.clone(),
                progress_repo.clone(),
                clock,
                effects,
            ),
            queries: ProgressQueries::new(progress_repo.clone(), templates.clone()),
            templates,
            badges,
        };

        Self {
            repositories: Repositories {
                template: template_repo,
                progress: progress_repo,
                badge: badge_repo,
            },
            use_cases,
            notifier,
        }
    }
}
