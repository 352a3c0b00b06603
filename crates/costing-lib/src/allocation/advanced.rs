//! Advanced model: depreciated hardware (CapEx) and recurring OpEx pools
//!
//! Hardware pools are `purchase_price / (depreciation_years × 12)` per
//! month. Operations, facilities and software pools are their flat
//! monthly cost. Each pool is charged to the resource by its share.

use tracing::warn;

use super::share::{PoolBasis, Share, WeightedScore};
use crate::models::{
    display_number, CostBreakdown, CostClass, CostModel, CostProfile, HardwareComponent, LineItem,
    OperationsComponent, Resource,
};

const MONTHS_PER_YEAR: f64 = 12.0;

pub(super) fn advanced_breakdown(
    resource: &Resource,
    profile: &CostProfile,
    basis: &PoolBasis,
    weights: &WeightedScore,
) -> CostBreakdown {
    let mut breakdown = CostBreakdown {
        cost_model: Some(CostModel::Advanced),
        applied_profiles: vec![profile.name.clone()],
        ..CostBreakdown::uncosted(resource)
    };
    let components = &profile.advanced_cost_components;

    for hardware in &components.hardware {
        let item = hardware_item(resource, hardware, basis, weights);
        report_degraded(resource, profile, &item);
        breakdown.capex_total += item.value;
        breakdown.line_items.push(item);
    }

    for (list, items) in components.opex_lists() {
        for component in items {
            let item = opex_item(resource, list, component, basis, weights);
            report_degraded(resource, profile, &item);
            breakdown.opex_total += item.value;
            breakdown.line_items.push(item);
        }
    }

    breakdown.monthly_total = breakdown.capex_total + breakdown.opex_total;
    breakdown
}

fn hardware_item(
    resource: &Resource,
    component: &HardwareComponent,
    basis: &PoolBasis,
    weights: &WeightedScore,
) -> LineItem {
    let usable_years = component.depreciation_years > 0.0;
    let years = if usable_years {
        component.depreciation_years
    } else {
        1.0
    };

    let pool = component.purchase_price / (years * MONTHS_PER_YEAR);
    let share = basis.share(component.allocation_method, resource, weights);
    let value = pool * share.fraction;

    let calculation = format!(
        "{:.2} ÷ ({} years × 12) = {:.2}/month × {} = {:.2}",
        component.purchase_price,
        display_number(years),
        pool,
        describe_share(&share),
        value
    );

    LineItem {
        name: component.name.clone(),
        component_type: "hardware".to_string(),
        category: category_or(&component.category, "hardware"),
        cost_class: Some(CostClass::CapEx),
        value,
        pool_total: Some(pool),
        share: Some(share.fraction),
        calculation,
        degraded: share.degraded || !usable_years,
    }
}

fn opex_item(
    resource: &Resource,
    list: &str,
    component: &OperationsComponent,
    basis: &PoolBasis,
    weights: &WeightedScore,
) -> LineItem {
    let pool = component.monthly_cost;
    let share = basis.share(component.allocation_method, resource, weights);
    let value = pool * share.fraction;

    LineItem {
        name: component.name.clone(),
        component_type: list.to_string(),
        category: category_or(&component.category, list),
        cost_class: Some(CostClass::OpEx),
        value,
        pool_total: Some(pool),
        share: Some(share.fraction),
        calculation: format!("{:.2}/month × {} = {:.2}", pool, describe_share(&share), value),
        degraded: share.degraded,
    }
}

fn describe_share(share: &Share) -> String {
    format!(
        "{:.2}% ({}, {})",
        share.fraction * 100.0,
        share.method.as_str(),
        share.basis
    )
}

fn category_or(category: &str, fallback: &str) -> String {
    if category.is_empty() {
        fallback.to_string()
    } else {
        category.to_string()
    }
}

fn report_degraded(resource: &Resource, profile: &CostProfile, item: &LineItem) {
    if item.degraded {
        warn!(
            event = "line_item_degraded",
            resource_id = %resource.id,
            profile = %profile.name,
            component = %item.name,
            calculation = %item.calculation,
            "Component data unusable, default allocation applied"
        );
    }
}
