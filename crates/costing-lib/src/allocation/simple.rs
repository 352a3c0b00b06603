//! Simple model: per-resource unit prices
//!
//! One-time charges are amortized over the configured number of periods
//! and added to the monthly total. There is no CapEx/OpEx split.

use tracing::warn;

use crate::models::{
    display_number, ComponentType, CostBreakdown, CostComponent, CostModel, CostProfile, LineItem,
    Resource,
};

pub(super) fn simple_breakdown(
    resource: &Resource,
    profile: &CostProfile,
    amortization_periods: u32,
) -> CostBreakdown {
    let periods = amortization_periods.max(1);
    let mut breakdown = CostBreakdown {
        cost_model: Some(CostModel::Simple),
        applied_profiles: vec![profile.name.clone()],
        ..CostBreakdown::uncosted(resource)
    };

    for component in &profile.cost_components {
        let item = price_component(resource, component, periods);

        if item.degraded {
            warn!(
                event = "line_item_degraded",
                resource_id = %resource.id,
                profile = %profile.name,
                component = %component.name,
                "Unrecognized component type, charged as flat monthly value"
            );
        }
        if component.component_type == ComponentType::OneTime {
            breakdown.one_time_total += component.value;
        }

        breakdown.monthly_total += item.value;
        breakdown.line_items.push(item);
    }

    breakdown
}

fn price_component(resource: &Resource, component: &CostComponent, periods: u32) -> LineItem {
    let rate = component.value;
    let (value, calculation) = match component.component_type {
        ComponentType::PerCpu => {
            let cost = rate * resource.cpu_count;
            let text = format!("{} CPUs × {:.2} = {:.2}", display_number(resource.cpu_count), rate, cost);
            (cost, text)
        }
        ComponentType::PerMemory => {
            let cost = rate * resource.memory_gb;
            let text = format!(
                "{} GB memory × {:.2} = {:.2}",
                display_number(resource.memory_gb),
                rate,
                cost
            );
            (cost, text)
        }
        ComponentType::PerStorage => {
            let cost = rate * resource.storage_gb;
            let text = format!(
                "{} GB storage × {:.2} = {:.2}",
                display_number(resource.storage_gb),
                rate,
                cost
            );
            (cost, text)
        }
        ComponentType::FixedMonthly => (rate, format!("Fixed monthly = {:.2}", rate)),
        ComponentType::OneTime => {
            let cost = rate / f64::from(periods);
            (cost, format!("One-time {:.2} ÷ {} months = {:.2}", rate, periods, cost))
        }
        ComponentType::Unknown => (rate, format!("Unrecognized type, flat monthly = {:.2}", rate)),
    };

    let category = if component.category.is_empty() {
        component.component_type.default_category().to_string()
    } else {
        component.category.clone()
    };

    LineItem {
        name: component.name.clone(),
        component_type: component.component_type.as_str().to_string(),
        category,
        cost_class: None,
        value,
        pool_total: None,
        share: None,
        calculation,
        degraded: component.component_type == ComponentType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm() -> Resource {
        Resource::new("vm-1", "cerau023adh00").with_capacity(8.0, 32.0, 500.0)
    }

    fn profile(components: Vec<CostComponent>) -> CostProfile {
        components
            .into_iter()
            .fold(CostProfile::new("p", "Basic Infrastructure").published(), |p, c| {
                p.with_component(c)
            })
    }

    #[test]
    fn test_per_cpu_component() {
        let p = profile(vec![CostComponent::new("CPU Cost", ComponentType::PerCpu, 10.0)]);
        let breakdown = simple_breakdown(&vm(), &p, 12);

        assert_eq!(breakdown.monthly_total, 80.0);
        let sum: f64 = breakdown.line_items.iter().map(|i| i.value).sum();
        assert_eq!(sum, 80.0);
        assert_eq!(breakdown.line_items[0].calculation, "8 CPUs × 10.00 = 80.00");
        assert_eq!(breakdown.line_items[0].category, "hardware");
        assert_eq!(breakdown.applied_profiles, vec!["Basic Infrastructure".to_string()]);
    }

    #[test]
    fn test_basic_infrastructure_template() {
        let p = profile(vec![
            CostComponent::new("CPU Cost", ComponentType::PerCpu, 10.0),
            CostComponent::new("Memory Cost", ComponentType::PerMemory, 5.0),
            CostComponent::new("Storage Cost", ComponentType::PerStorage, 0.1),
            CostComponent::new("Monitoring & Support", ComponentType::FixedMonthly, 25.0),
        ]);
        let breakdown = simple_breakdown(&vm(), &p, 12);

        // 80 + 160 + 50 + 25
        assert!((breakdown.monthly_total - 315.0).abs() < 1e-9);
        assert_eq!(breakdown.capex_total, 0.0);
        assert_eq!(breakdown.opex_total, 0.0);
        assert_eq!(breakdown.line_items.len(), 4);
        assert_eq!(breakdown.line_items[3].category, "operations");
    }

    #[test]
    fn test_one_time_is_amortized() {
        let p = profile(vec![CostComponent::new("Setup", ComponentType::OneTime, 1200.0)]);
        let breakdown = simple_breakdown(&vm(), &p, 12);

        assert_eq!(breakdown.monthly_total, 100.0);
        assert_eq!(breakdown.one_time_total, 1200.0);
        assert_eq!(breakdown.line_items[0].calculation, "One-time 1200.00 ÷ 12 months = 100.00");
    }

    #[test]
    fn test_zero_periods_are_treated_as_one() {
        let p = profile(vec![CostComponent::new("Setup", ComponentType::OneTime, 300.0)]);
        let breakdown = simple_breakdown(&vm(), &p, 0);
        assert_eq!(breakdown.monthly_total, 300.0);
    }

    #[test]
    fn test_unknown_type_degrades_to_flat_value() {
        let p = profile(vec![
            CostComponent::new("GPU", ComponentType::Unknown, 7.5),
            CostComponent::new("CPU Cost", ComponentType::PerCpu, 1.0),
        ]);
        let breakdown = simple_breakdown(&vm(), &p, 12);

        assert_eq!(breakdown.monthly_total, 15.5);
        assert!(breakdown.line_items[0].degraded);
        assert!(!breakdown.line_items[1].degraded);
        assert_eq!(breakdown.degraded_items(), 1);
    }

    #[test]
    fn test_explicit_category_is_kept() {
        let mut component = CostComponent::new("Licence", ComponentType::FixedMonthly, 40.0);
        component.category = "software".into();
        let breakdown = simple_breakdown(&vm(), &profile(vec![component]), 12);
        assert_eq!(breakdown.line_items[0].category, "software");
    }
}
