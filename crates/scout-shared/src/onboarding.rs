use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SharedError;

/// Onboarding questionnaire steps, in the order the user walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    CurrentStatus,
    RegionPreferences,
    ClimatePreferences,
    CulturePreferences,
    Hobbies,
    Administration,
    Costs,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 7] = [
        OnboardingStep::CurrentStatus,
        OnboardingStep::RegionPreferences,
        OnboardingStep::ClimatePreferences,
        OnboardingStep::CulturePreferences,
        OnboardingStep::Hobbies,
        OnboardingStep::Administration,
        OnboardingStep::Costs,
    ];

    pub fn first() -> Self {
        Self::ALL[0]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Column / payload key used by the collaborator.
    pub fn key(self) -> &'static str {
        match self {
            OnboardingStep::CurrentStatus => "current_status",
            OnboardingStep::RegionPreferences => "region_preferences",
            OnboardingStep::ClimatePreferences => "climate_preferences",
            OnboardingStep::CulturePreferences => "culture_preferences",
            OnboardingStep::Hobbies => "hobbies",
            OnboardingStep::Administration => "administration",
            OnboardingStep::Costs => "costs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OnboardingStep::CurrentStatus => "Current Status",
            OnboardingStep::RegionPreferences => "Region Preferences",
            OnboardingStep::ClimatePreferences => "Climate Preferences",
            OnboardingStep::CulturePreferences => "Culture Preferences",
            OnboardingStep::Hobbies => "Hobbies & Interests",
            OnboardingStep::Administration => "Administration",
            OnboardingStep::Costs => "Budget & Costs",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            OnboardingStep::CurrentStatus => "/onboarding/current-status",
            OnboardingStep::RegionPreferences => "/onboarding/region",
            OnboardingStep::ClimatePreferences => "/onboarding/climate",
            OnboardingStep::CulturePreferences => "/onboarding/culture",
            OnboardingStep::Hobbies => "/onboarding/hobbies",
            OnboardingStep::Administration => "/onboarding/administration",
            OnboardingStep::Costs => "/onboarding/costs",
        }
    }
}

impl FromStr for OnboardingStep {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.key() == s)
            .ok_or_else(|| SharedError::UnknownStep(s.to_string()))
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Snapshot of which steps a user has saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnboardingProgress {
    pub completed_steps: BTreeMap<OnboardingStep, bool>,
    pub completed_count: usize,
    pub total_steps: usize,
    pub percentage: u8,
}

impl OnboardingProgress {
    pub fn from_completed<I>(completed: I) -> Self
    where
        I: IntoIterator<Item = OnboardingStep>,
    {
        let mut completed_steps: BTreeMap<OnboardingStep, bool> =
            OnboardingStep::ALL.iter().map(|s| (*s, false)).collect();
        for step in completed {
            completed_steps.insert(step, true);
        }

        let completed_count = completed_steps.values().filter(|done| **done).count();
        let total_steps = OnboardingStep::ALL.len();
        let percentage = ((completed_count as f64 / total_steps as f64) * 100.0).round() as u8;

        Self {
            completed_steps,
            completed_count,
            total_steps,
            percentage,
        }
    }

    pub fn empty() -> Self {
        Self::from_completed(std::iter::empty())
    }

    pub fn is_completed(&self, step: OnboardingStep) -> bool {
        self.completed_steps.get(&step).copied().unwrap_or(false)
    }

    pub fn is_finished(&self) -> bool {
        self.completed_count == self.total_steps
    }

    pub fn first_incomplete(&self) -> Option<OnboardingStep> {
        OnboardingStep::ALL
            .into_iter()
            .find(|step| !self.is_completed(*step))
    }
}
