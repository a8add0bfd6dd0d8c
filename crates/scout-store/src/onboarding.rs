//! Onboarding answers: one JSON document per step column.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use scout_shared::onboarding::{OnboardingProgress, OnboardingStep};
use scout_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;
use crate::rows::ts;

impl Database {
    /// Store the answers for one step, keeping every other step untouched.
    pub fn save_onboarding_step(
        &self,
        user: &UserId,
        step: OnboardingStep,
        data: &serde_json::Value,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let json = serde_json::to_string(data)?;
        // `step.key()` is one of a closed set of column names.
        let sql = format!(
            "INSERT INTO onboarding_responses (user_id, {col}, submitted_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET {col} = excluded.{col},
                                               submitted_at = excluded.submitted_at",
            col = step.key()
        );
        self.conn()
            .execute(&sql, params![user.as_str(), json, ts(&at)])?;
        Ok(())
    }

    /// Saved answers of every completed step.
    pub fn get_onboarding_answers(
        &self,
        user: &UserId,
    ) -> Result<BTreeMap<OnboardingStep, serde_json::Value>> {
        let columns: Vec<&str> = OnboardingStep::ALL.iter().map(|s| s.key()).collect();
        let sql = format!(
            "SELECT {} FROM onboarding_responses WHERE user_id = ?1",
            columns.join(", ")
        );

        let raw: Option<Vec<Option<String>>> = self
            .conn()
            .query_row(&sql, params![user.as_str()], |row| {
                (0..OnboardingStep::ALL.len())
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect()
            })
            .optional()?;

        let mut answers = BTreeMap::new();
        for (step, value) in OnboardingStep::ALL.into_iter().zip(raw.unwrap_or_default()) {
            if let Some(json) = value {
                answers.insert(step, serde_json::from_str(&json)?);
            }
        }
        Ok(answers)
    }

    pub fn get_onboarding_progress(&self, user: &UserId) -> Result<OnboardingProgress> {
        let answers = self.get_onboarding_answers(user)?;
        Ok(OnboardingProgress::from_completed(answers.into_keys()))
    }

    pub fn complete_onboarding(&self, user: &UserId, at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "INSERT INTO onboarding_status (user_id, completed, completed_at) VALUES (?1, 1, ?2)
             ON CONFLICT(user_id) DO UPDATE
             SET completed = 1, completed_at = excluded.completed_at",
            params![user.as_str(), ts(&at)],
        )?;
        Ok(())
    }

    pub fn is_onboarding_completed(&self, user: &UserId) -> Result<bool> {
        let completed: Option<bool> = self
            .conn()
            .query_row(
                "SELECT completed FROM onboarding_status WHERE user_id = ?1",
                params![user.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(completed.unwrap_or(false))
    }

    /// Drop all answers and reset the completed flag.
    pub fn clear_onboarding(&self, user: &UserId) -> Result<()> {
        self.conn().execute(
            "DELETE FROM onboarding_responses WHERE user_id = ?1",
            params![user.as_str()],
        )?;
        self.conn().execute(
            "DELETE FROM onboarding_status WHERE user_id = ?1",
            params![user.as_str()],
        )?;
        Ok(())
    }
}
