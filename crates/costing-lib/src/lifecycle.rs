//! Profile review workflow and validation
//!
//! Profiles move draft → in_review → published, and published → draft to
//! withdraw them. Publishing requires a valid profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::{CostModel, CostProfile, ProfileStatus};

impl ProfileStatus {
    pub fn can_transition_to(&self, target: ProfileStatus) -> bool {
        matches!(
            (self, target),
            (ProfileStatus::Draft, ProfileStatus::InReview)
                | (ProfileStatus::InReview, ProfileStatus::Published)
                | (ProfileStatus::Published, ProfileStatus::Draft)
        )
    }
}

/// Move a profile to `target`, returning the updated copy
pub fn transition(
    profile: &CostProfile,
    target: ProfileStatus,
    now: DateTime<Utc>,
) -> Result<CostProfile> {
    if !profile.status.can_transition_to(target) {
        return Err(EngineError::InvalidTransition {
            profile: profile.name.clone(),
            from: profile.status,
            to: target,
        });
    }

    if target == ProfileStatus::Published {
        validate(profile)?;
    }

    let mut updated = profile.clone();
    updated.status = target;
    updated.modified_date = Some(now);
    if updated.created_date.is_none() {
        updated.created_date = Some(now);
    }
    Ok(updated)
}

/// Turn an edited profile into a new draft with the given id
///
/// Saving requires a valid profile. Any status or dates on the input are
/// replaced.
pub fn create_profile(
    profile: &CostProfile,
    id: impl Into<String>,
    now: DateTime<Utc>,
) -> Result<CostProfile> {
    validate(profile)?;

    let mut created = profile.clone();
    created.id = id.into();
    created.status = ProfileStatus::Draft;
    created.created_date = Some(now);
    created.modified_date = Some(now);
    Ok(created)
}

/// Apply an edit to a stored profile
///
/// The stored id, status and creation date win over whatever the edit
/// carries; status only changes through [`transition`].
pub fn update_profile(
    stored: &CostProfile,
    edited: &CostProfile,
    now: DateTime<Utc>,
) -> Result<CostProfile> {
    validate(edited)?;

    let mut updated = edited.clone();
    updated.id = stored.id.clone();
    updated.status = stored.status;
    updated.created_date = stored.created_date.or(Some(now));
    updated.modified_date = Some(now);
    Ok(updated)
}

/// Every problem that keeps a profile from being published
pub fn validation_problems(profile: &CostProfile) -> Vec<String> {
    let mut problems = Vec::new();

    if profile.name.trim().is_empty() {
        problems.push("name is required".to_string());
    }
    if profile.description.trim().is_empty() {
        problems.push("description is required".to_string());
    }
    if profile.rules.condition_count() == 0 {
        problems.push("at least one rule condition is required".to_string());
    }

    match profile.cost_model {
        CostModel::Simple => {
            if profile.cost_components.is_empty() {
                problems.push("at least one cost component is required".to_string());
            }
            for (idx, component) in profile.cost_components.iter().enumerate() {
                if component.name.trim().is_empty() {
                    problems.push(format!("cost component {} needs a name", idx + 1));
                }
                if component.value <= 0.0 {
                    problems.push(format!(
                        "cost component {} needs a value greater than 0",
                        idx + 1
                    ));
                }
            }
        }
        CostModel::Advanced => {
            let advanced = &profile.advanced_cost_components;
            if advanced.is_empty() {
                problems.push("at least one advanced cost component is required".to_string());
            }
            for (idx, hardware) in advanced.hardware.iter().enumerate() {
                if hardware.name.trim().is_empty() {
                    problems.push(format!("hardware item {} needs a name", idx + 1));
                }
                if hardware.purchase_price <= 0.0 {
                    problems.push(format!(
                        "hardware item {} needs a purchase price greater than 0",
                        idx + 1
                    ));
                }
            }
            for (list, items) in advanced.opex_lists() {
                for (idx, item) in items.iter().enumerate() {
                    if item.name.trim().is_empty() {
                        problems.push(format!("{} item {} needs a name", list, idx + 1));
                    }
                    if item.monthly_cost <= 0.0 {
                        problems.push(format!(
                            "{} item {} needs a monthly cost greater than 0",
                            list,
                            idx + 1
                        ));
                    }
                }
            }
        }
    }

    problems
}

pub fn validate(profile: &CostProfile) -> Result<()> {
    let problems = validation_problems(profile);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(EngineError::InvalidProfile {
            profile: profile.name.clone(),
            problems,
        })
    }
}

/// Profile counts per review state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub draft: usize,
    pub in_review: usize,
    pub published: usize,
}

impl StatusCounts {
    pub fn from_profiles(profiles: &[CostProfile]) -> Self {
        profiles.iter().fold(Self::default(), |mut acc, profile| {
            match profile.status {
                ProfileStatus::Draft => acc.draft += 1,
                ProfileStatus::InReview => acc.in_review += 1,
                ProfileStatus::Published => acc.published += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.draft + self.in_review + self.published
    }
}
