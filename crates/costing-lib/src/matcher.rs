//! First-match-wins profile selection
//!
//! Only published profiles take part. They are tried in ascending priority
//! order (ties keep input order) and evaluation stops at the first profile
//! whose rules match; lower-priority profiles are never evaluated.

use crate::models::{CostProfile, Resource};
use crate::rules::{RuleEvaluator, RuleTree};

/// Published profiles in evaluation order
pub fn published_in_priority_order(profiles: &[CostProfile]) -> Vec<&CostProfile> {
    let mut ordered: Vec<&CostProfile> = profiles.iter().filter(|p| p.is_published()).collect();
    // sort_by_key is stable, so equal priorities keep insertion order
    ordered.sort_by_key(|p| p.priority);
    ordered
}

/// Selects the single profile that prices a resource
#[derive(Debug, Clone, Default)]
pub struct ProfileMatcher<E = RuleTree> {
    evaluator: E,
}

impl ProfileMatcher<RuleTree> {
    pub fn new() -> Self {
        Self { evaluator: RuleTree }
    }
}

impl<E: RuleEvaluator> ProfileMatcher<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Match a resource against an unordered profile set
    pub fn match_profile<'p>(
        &self,
        resource: &Resource,
        profiles: &'p [CostProfile],
    ) -> Option<&'p CostProfile> {
        let ordered = published_in_priority_order(profiles);
        self.match_ordered(resource, &ordered)
    }

    /// Match against profiles already filtered and ordered by
    /// [`published_in_priority_order`]
    pub fn match_ordered<'p>(
        &self,
        resource: &Resource,
        ordered: &[&'p CostProfile],
    ) -> Option<&'p CostProfile> {
        self.match_position(resource, ordered).map(|idx| ordered[idx])
    }

    /// Index of the winning profile within `ordered`
    pub fn match_position(&self, resource: &Resource, ordered: &[&CostProfile]) -> Option<usize> {
        let position = ordered
            .iter()
            .position(|profile| self.evaluator.evaluate(resource, &profile.rules));

        match position {
            Some(idx) => tracing::debug!(
                resource_id = %resource.id,
                profile = %ordered[idx].name,
                priority = ordered[idx].priority,
                "Resource matched cost profile"
            ),
            None => tracing::debug!(
                resource_id = %resource.id,
                candidates = ordered.len(),
                "No published profile matched resource"
            ),
        }

        position
    }
}

/// Match with the default rule evaluator
pub fn match_profile<'p>(resource: &Resource, profiles: &'p [CostProfile]) -> Option<&'p CostProfile> {
    ProfileMatcher::new().match_profile(resource, profiles)
}
