//! Onboarding progress state machine and the async driver that persists it.

use std::collections::BTreeSet;
use std::sync::Arc;

use scout_shared::onboarding::{OnboardingProgress, OnboardingStep};
use scout_shared::types::UserId;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::backend::{OnboardingBackend, RequestPolicy};
use crate::error::ChatError;
use crate::events::{emit_notice, Notice, NoticeSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum OnboardingState {
    NotStarted,
    InProgress(OnboardingStep),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Current,
    Locked,
}

/// One row of the progress sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepEntry {
    pub step: OnboardingStep,
    pub label: &'static str,
    pub path: &'static str,
    pub status: StepStatus,
    pub clickable: bool,
}

#[derive(Debug, Clone)]
pub struct OnboardingFlow {
    state: OnboardingState,
    completed: BTreeSet<OnboardingStep>,
}

impl Default for OnboardingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self {
            state: OnboardingState::NotStarted,
            completed: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> OnboardingState {
        self.state
    }

    /// Sync with stored progress. The current step becomes the first
    /// incomplete one.
    pub fn load(&mut self, progress: &OnboardingProgress) -> OnboardingState {
        self.completed = OnboardingStep::ALL
            .into_iter()
            .filter(|s| progress.is_completed(*s))
            .collect();
        self.state = match self.first_incomplete_from(0) {
            Some(step) => OnboardingState::InProgress(step),
            None => OnboardingState::Completed,
        };
        self.state
    }

    /// Advance after `step` was saved: the next incomplete step after it,
    /// else the first incomplete step overall, else `Completed`.
    pub fn step_saved(&mut self, step: OnboardingStep) -> OnboardingState {
        self.completed.insert(step);
        let next = self
            .first_incomplete_from(step.index() + 1)
            .or_else(|| self.first_incomplete_from(0));
        self.state = match next {
            Some(step) => OnboardingState::InProgress(step),
            None => OnboardingState::Completed,
        };
        self.state
    }

    pub fn is_completed(&self, step: OnboardingStep) -> bool {
        self.completed.contains(&step)
    }

    /// Only the current step and completed steps are reachable.
    pub fn can_navigate(&self, step: OnboardingStep) -> bool {
        self.is_completed(step) || self.state == OnboardingState::InProgress(step)
    }

    pub fn steps(&self) -> Vec<StepEntry> {
        OnboardingStep::ALL
            .into_iter()
            .map(|step| {
                let status = if self.is_completed(step) {
                    StepStatus::Completed
                } else if self.state == OnboardingState::InProgress(step) {
                    StepStatus::Current
                } else {
                    StepStatus::Locked
                };
                StepEntry {
                    step,
                    label: step.label(),
                    path: step.path(),
                    status,
                    clickable: status != StepStatus::Locked,
                }
            })
            .collect()
    }

    pub fn progress(&self) -> OnboardingProgress {
        OnboardingProgress::from_completed(self.completed.iter().copied())
    }

    fn first_incomplete_from(&self, start: usize) -> Option<OnboardingStep> {
        OnboardingStep::ALL
            .into_iter()
            .skip(start)
            .find(|s| !self.completed.contains(s))
    }
}

const ADMINISTRATION_LIST_FIELDS: [&str; 10] = [
    "healthcare_quality",
    "insurance_importance",
    "safety_importance",
    "emergency_services",
    "political_stability",
    "tax_preference",
    "government_efficiency",
    "visa_preference",
    "stay_duration",
    "residency_path",
];

/// Shape a step payload the way the store expects it.
///
/// Administration answers are rebuilt with only the known fields: list
/// fields are coerced to arrays and `health_considerations` gets an empty
/// default. Other steps pass through.
pub fn normalize_step_data(step: OnboardingStep, data: Value) -> Value {
    if step != OnboardingStep::Administration {
        return data;
    }

    let mut out = Map::new();
    for field in ADMINISTRATION_LIST_FIELDS {
        let value = match data.get(field) {
            Some(Value::Array(items)) => Value::Array(items.clone()),
            _ => Value::Array(Vec::new()),
        };
        out.insert(field.to_string(), value);
    }
    let health = match data.get("health_considerations") {
        Some(v) if !v.is_null() => v.clone(),
        _ => json!({
            "healthcare_access": "",
            "ongoing_treatment": "",
            "environmental_health": "",
        }),
    };
    out.insert("health_considerations".to_string(), health);
    Value::Object(out)
}

/// Drives an [`OnboardingFlow`] against the collaborator.
pub struct OnboardingSession {
    user: UserId,
    backend: Arc<dyn OnboardingBackend>,
    policy: RequestPolicy,
    notices: NoticeSender,
    flow: OnboardingFlow,
}

impl OnboardingSession {
    pub fn new(
        user: UserId,
        backend: Arc<dyn OnboardingBackend>,
        policy: RequestPolicy,
        notices: NoticeSender,
    ) -> Self {
        Self {
            user,
            backend,
            policy,
            notices,
            flow: OnboardingFlow::new(),
        }
    }

    pub fn flow(&self) -> &OnboardingFlow {
        &self.flow
    }

    pub async fn load(&mut self) -> Result<OnboardingState, ChatError> {
        let backend = &self.backend;
        let user = &self.user;
        let progress = self
            .policy
            .read("get_onboarding_progress", move || backend.get_onboarding_progress(user))
            .await
            .map_err(|e| {
                emit_notice(
                    &self.notices,
                    Notice::error("Failed to load onboarding progress"),
                );
                e
            })?;

        let state = self.flow.load(&progress);
        tracing::info!(
            user = %self.user,
            ?state,
            completed = progress.completed_count,
            "Onboarding loaded"
        );
        Ok(state)
    }

    /// Persist answers for `step` and advance. A failed save leaves the
    /// state unchanged.
    pub async fn save_step(
        &mut self,
        step: OnboardingStep,
        data: Value,
    ) -> Result<OnboardingState, ChatError> {
        if !self.flow.can_navigate(step) {
            return Err(ChatError::StepLocked(step));
        }

        let data = normalize_step_data(step, data);
        if let Err(e) = self
            .policy
            .write(
                "save_onboarding_step",
                self.backend.save_onboarding_step(&self.user, step, data),
            )
            .await
        {
            let text = format!("Failed to save {}", step.label());
            emit_notice(&self.notices, Notice::error(text));
            return Err(e.into());
        }

        let state = self.flow.step_saved(step);
        tracing::debug!(user = %self.user, %step, ?state, "Onboarding step saved");

        if state == OnboardingState::Completed {
            if let Err(e) = self
                .policy
                .write("complete_onboarding", self.backend.complete_onboarding(&self.user))
                .await
            {
                tracing::warn!(user = %self.user, error = %e, "Failed to mark onboarding complete");
                emit_notice(
                    &self.notices,
                    Notice::warning("Could not finish onboarding, please try again"),
                );
            } else {
                emit_notice(&self.notices, Notice::success("Onboarding complete"));
            }
        }
        Ok(state)
    }
}
