//! CSV export of per-resource breakdowns
//!
//! One row per line item. Resource totals are written on the first row of
//! each resource only; an uncosted resource gets a single marker row.

use csv::Writer;
use std::io;

use crate::error::{EngineError, Result};
use crate::models::{display_number, CostBreakdown, Resource};

pub const CSV_HEADER: [&str; 14] = [
    "VM Name",
    "Owner",
    "CPU",
    "Memory",
    "Storage",
    "Matched Profile",
    "Component",
    "Type",
    "Category",
    "Cost",
    "Total Monthly",
    "Total One-Time",
    "CapEx",
    "OpEx",
];

const UNMATCHED_PROFILE: &str = "None";
const UNMATCHED_COMPONENT: &str = "No cost profile matched";

/// Write breakdowns as CSV; `resources` and `breakdowns` are paired by position
pub fn write_csv<W: io::Write>(
    writer: W,
    resources: &[Resource],
    breakdowns: &[CostBreakdown],
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for (resource, breakdown) in resources.iter().zip(breakdowns) {
        let capacity = [
            resource.name.clone(),
            resource.owner.clone(),
            display_number(resource.cpu_count),
            display_number(resource.memory_gb),
            display_number(resource.storage_gb),
        ];

        let Some(profile) = breakdown.matched_profile() else {
            wtr.write_record(capacity.iter().map(String::as_str).chain([
                UNMATCHED_PROFILE,
                UNMATCHED_COMPONENT,
                "",
                "",
                "0.00",
                "0.00",
                "0.00",
                "0.00",
                "0.00",
            ]))?;
            continue;
        };

        if breakdown.line_items.is_empty() {
            // matched a profile with no components
            wtr.write_record(capacity.iter().cloned().chain([
                profile.to_string(),
                String::new(),
                String::new(),
                String::new(),
                "0.00".to_string(),
                money(breakdown.monthly_total),
                money(breakdown.one_time_total),
                money(breakdown.capex_total),
                money(breakdown.opex_total),
            ]))?;
            continue;
        }

        for (idx, item) in breakdown.line_items.iter().enumerate() {
            let totals = if idx == 0 {
                [
                    money(breakdown.monthly_total),
                    money(breakdown.one_time_total),
                    money(breakdown.capex_total),
                    money(breakdown.opex_total),
                ]
            } else {
                Default::default()
            };

            wtr.write_record(
                capacity
                    .iter()
                    .cloned()
                    .chain([
                        profile.to_string(),
                        item.name.clone(),
                        item.component_type.clone(),
                        item.category.clone(),
                        money(item.value),
                    ])
                    .chain(totals),
            )?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Render the export into a string
pub fn to_csv_string(resources: &[Resource], breakdowns: &[CostBreakdown]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, resources, breakdowns)?;
    String::from_utf8(buffer)
        .map_err(|err| EngineError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::allocate_all;
    use crate::models::{
        ComponentType, Condition, ConditionOperator, CostComponent, CostProfile, RuleGroup,
    };

    fn fixture() -> (Vec<Resource>, Vec<CostProfile>) {
        let resources = vec![
            Resource::new("1", "cerau023adh00")
                .with_owner("alice")
                .with_capacity(8.0, 32.0, 500.0)
                .with_tag("environment", "production"),
            Resource::new("2", "pihole")
                .with_owner("bob, jr")
                .with_capacity(1.0, 0.5, 16.0),
        ];
        let profiles = vec![CostProfile::new("p", "Production")
            .published()
            .with_rules(RuleGroup::all(vec![Condition::new(
                "tag.environment",
                ConditionOperator::Equals,
                "production",
            )]))
            .with_component(CostComponent::new("CPU Cost", ComponentType::PerCpu, 15.0))
            .with_component(CostComponent::new("HA & Backup", ComponentType::FixedMonthly, 50.0))];
        (resources, profiles)
    }

    #[test]
    fn test_csv_export_empty() {
        let csv = to_csv_string(&[], &[]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("VM Name,Owner,CPU"));
        assert!(lines[0].ends_with("CapEx,OpEx"));
    }

    #[test]
    fn test_csv_rows_per_line_item() {
        let (resources, profiles) = fixture();
        let breakdowns = allocate_all(&resources, &profiles);
        let csv = to_csv_string(&resources, &breakdowns).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "cerau023adh00,alice,8,32,500,Production,CPU Cost,per-cpu,hardware,120.00,170.00,0.00,0.00,0.00"
        );
        // totals only on the first row of a resource
        assert_eq!(
            lines[2],
            "cerau023adh00,alice,8,32,500,Production,HA & Backup,fixed-monthly,operations,50.00,,,,"
        );
    }

    #[test]
    fn test_csv_uncosted_resource() {
        let (resources, profiles) = fixture();
        let breakdowns = allocate_all(&resources, &profiles);
        let csv = to_csv_string(&resources, &breakdowns).unwrap();
        let last = csv.lines().last().unwrap();

        // owner with a comma is quoted
        assert_eq!(
            last,
            "pihole,\"bob, jr\",1,0.5,16,None,No cost profile matched,,,0.00,0.00,0.00,0.00,0.00"
        );
    }
}
