//! Indicator aggregation and statistics.
//!
//! Every function here is a grouped reduction over validated rows. Sums
//! are rounded to two decimals only after accumulation, and every
//! descending sort is stable so ties keep their first-seen order.

use crate::models::{
    AverageConsumption, CompanyAverage, CompanyEmissions, Row, SectorSummary, YearlyEmissions,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Group rows by a string key, keeping groups in first-seen order.
fn group_ordered<'a, A, K, F>(rows: &'a [Row], key: K, mut fold: F) -> Vec<(&'a str, A)>
where
    A: Default,
    K: Fn(&'a Row) -> &'a str,
    F: FnMut(&mut A, &Row),
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, A)> = Vec::new();

    for row in rows {
        let k = key(row);
        let slot = *index.entry(k).or_insert_with(|| {
            groups.push((k, A::default()));
            groups.len() - 1
        });
        fold(&mut groups[slot].1, row);
    }

    groups
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Total emissions per year, ascending by year.
pub fn emissions_by_year(rows: &[Row]) -> Vec<YearlyEmissions> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();

    for row in rows {
        *totals.entry(row.year).or_default() += row.co2_emissions_tonnes;
    }

    totals
        .into_iter()
        .map(|(year, emissions)| YearlyEmissions {
            year,
            emissions: round2(emissions),
        })
        .collect()
}

#[derive(Default)]
struct ConsumptionTotals {
    total: f64,
    count: usize,
}

/// Consumption averages.
///
/// The overall figure is the mean of per-company totals, not of rows.
pub fn average_consumption(rows: &[Row]) -> AverageConsumption {
    let groups = group_ordered(
        rows,
        |row| row.company.as_str(),
        |acc: &mut ConsumptionTotals, row| {
            acc.total += row.energy_consumption_mwh;
            acc.count += 1;
        },
    );

    if groups.is_empty() {
        return AverageConsumption::default();
    }

    let grand_total: f64 = groups.iter().map(|(_, acc)| acc.total).sum();
    let overall_average = round2(grand_total / groups.len() as f64);

    let mut by_company: Vec<CompanyAverage> = groups
        .into_iter()
        .map(|(company, acc)| CompanyAverage {
            company: company.to_string(),
            average: round2(acc.total / acc.count as f64),
        })
        .collect();
    by_company.sort_by(|a, b| descending(a.average, b.average));

    AverageConsumption {
        overall_average,
        by_company,
    }
}

/// The `limit` companies with the highest total emissions.
pub fn top_companies(rows: &[Row], limit: usize) -> Vec<CompanyEmissions> {
    let groups = group_ordered(
        rows,
        |row| row.company.as_str(),
        |total: &mut f64, row| *total += row.co2_emissions_tonnes,
    );

    let mut companies: Vec<CompanyEmissions> = groups
        .into_iter()
        .map(|(company, total)| CompanyEmissions {
            company: company.to_string(),
            total_emissions: round2(total),
        })
        .collect();

    companies.sort_by(|a, b| descending(a.total_emissions, b.total_emissions));
    companies.truncate(limit);
    companies
}

#[derive(Default)]
struct SectorTotals {
    emissions: f64,
    consumption: f64,
    rows: usize,
}

/// Emission and consumption totals by sector, highest emissions first.
///
/// `companies` counts rows, so a company listed twice in a sector is
/// counted twice.
pub fn sector_analysis(rows: &[Row]) -> Vec<SectorSummary> {
    let groups = group_ordered(
        rows,
        |row| row.sector.as_str(),
        |acc: &mut SectorTotals, row| {
            acc.emissions += row.co2_emissions_tonnes;
            acc.consumption += row.energy_consumption_mwh;
            acc.rows += 1;
        },
    );

    let mut sectors: Vec<SectorSummary> = groups
        .into_iter()
        .map(|(sector, acc)| SectorSummary {
            sector: sector.to_string(),
            total_emissions: round2(acc.emissions),
            total_consumption: round2(acc.consumption),
            companies: acc.rows,
        })
        .collect();

    sectors.sort_by(|a, b| descending(a.total_emissions, b.total_emissions));
    sectors
}

/// Distinct years, ascending.
pub fn distinct_years(rows: &[Row]) -> Vec<i32> {
    rows.iter()
        .map(|row| row.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
