use crate::aggregate::{count_by, join, sum_by, JoinKind};
use crate::loader::LoadReport;
use crate::metrics::{charger_type_label, ratio};
use crate::types::{
    ChargerType, ChargerTypeSummaryRow, ChargingStation, CombinedStateRow, EvSale,
    PopulationRow, RunSummary, StatePopulation, SupplyDemandRow,
};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Charger supply vs EV demand at (state, charger type) granularity.
///
/// Stations without a usable state or charger type are left out; states
/// with no sales record get `EV_Sales_Quantity = 0` and an undefined ratio.
/// Those states are also returned so the run summary can list them.
pub fn generate_supply_demand(
    stations: &[ChargingStation],
    sales: &[EvSale],
) -> (Vec<SupplyDemandRow>, BTreeSet<String>) {
    let counts: HashMap<(String, ChargerType), usize> =
        count_by(stations, |s| Some((s.state.clone()?, s.charger_type?)));
    let sales_by_state = sum_by(sales, |s| s.state.clone(), |s| s.quantity);

    let mut left: Vec<((String, ChargerType), usize)> = counts.into_iter().collect();
    left.sort_by(|a, b| a.0.cmp(&b.0));

    let mut without_sales = BTreeSet::new();
    let rows = join(left, &sales_by_state, JoinKind::Left, |l| &l.0 .0)
        .into_iter()
        .map(|j| {
            let ((state, charger_type), charger_count) = j.left;
            if !j.matched {
                without_sales.insert(state.clone());
            }
            let code = charger_type.code();
            SupplyDemandRow {
                state,
                charger_type: charger_type.value(),
                charger_count,
                ev_sales_quantity: j.right,
                charger_to_demand_ratio: ratio(charger_count as f64, Some(j.right)),
                charger_type_name: charger_type_label(Some(&code)).to_string(),
                type_str: code,
            }
        })
        .collect::<Vec<_>>();
    (rows, without_sales)
}

/// Population records with a parseable total, in input order.
pub fn generate_population(population: &[StatePopulation]) -> Vec<PopulationRow> {
    population
        .iter()
        .filter_map(|p| {
            Some(PopulationRow {
                state: p.state.clone(),
                total_population: p.total_population?,
            })
        })
        .collect()
}

/// Per-state stations, sales and per-capita metrics.
///
/// Only states present in both the station and sales data are kept;
/// population is left-joined (0 when absent, which leaves per-capita
/// undefined). States with no population record are returned alongside.
pub fn generate_state_summary(
    stations: &[ChargingStation],
    sales: &[EvSale],
    population: &[StatePopulation],
) -> (Vec<CombinedStateRow>, BTreeSet<String>) {
    let stations_by_state = count_by(stations, |s| s.state.clone());
    let sales_by_state = sum_by(sales, |s| s.state.clone(), |s| s.quantity);
    // summed so a state listed twice cannot duplicate joined rows
    let population_by_state = sum_by(population, |p| p.state.clone(), |p| p.total_population);

    let mut left: Vec<(String, usize)> = stations_by_state.into_iter().collect();
    left.sort();

    let mut without_population = BTreeSet::new();
    let with_sales = join(left, &sales_by_state, JoinKind::Inner, |l| &l.0);
    let rows = join(with_sales, &population_by_state, JoinKind::Left, |j| &j.left.0)
        .into_iter()
        .map(|j| {
            let total_population = j.right;
            let ev_sales_quantity = j.left.right;
            let (state, stations_count) = j.left.left;
            if !j.matched {
                without_population.insert(state.clone());
            }
            CombinedStateRow {
                state,
                stations_count,
                ev_sales_quantity,
                total_population,
                stations_per_capita: ratio(stations_count as f64, Some(total_population)),
                sales_per_capita: ratio(ev_sales_quantity, Some(total_population)),
            }
        })
        .collect::<Vec<_>>();
    (rows, without_population)
}

/// Totals per charger-type label, largest charger count first.
pub fn generate_charger_type_summary(rows: &[SupplyDemandRow]) -> Vec<ChargerTypeSummaryRow> {
    let mut map: HashMap<&str, (usize, f64)> = HashMap::new();
    for r in rows.iter().filter(|r| r.charger_count > 0) {
        let e = map.entry(r.charger_type_name.as_str()).or_insert((0, 0.0));
        e.0 += r.charger_count;
        e.1 += r.ev_sales_quantity;
    }
    let mut out: Vec<ChargerTypeSummaryRow> = map
        .into_iter()
        .map(|(name, (charger_count, ev_sales_quantity))| ChargerTypeSummaryRow {
            charger_type_name: name.to_string(),
            charger_count,
            ev_sales_quantity,
        })
        .collect();
    out.sort_by(|a, b| {
        b.charger_count
            .cmp(&a.charger_count)
            .then_with(|| a.charger_type_name.cmp(&b.charger_type_name))
    });
    out
}

/// States ordered by station count, most stations first.
pub fn rank_states_by_stations(rows: &[CombinedStateRow]) -> Vec<CombinedStateRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| {
        b.stations_count
            .cmp(&a.stations_count)
            .then_with(|| {
                b.ev_sales_quantity
                    .partial_cmp(&a.ev_sales_quantity)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.state.cmp(&b.state))
    });
    ranked
}

/// States ordered by EV sales, best-selling state first.
pub fn rank_states_by_sales(rows: &[CombinedStateRow]) -> Vec<CombinedStateRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| {
        b.ev_sales_quantity
            .partial_cmp(&a.ev_sales_quantity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.state.cmp(&b.state))
    });
    ranked
}

pub fn generate_summary(
    sources: &[LoadReport],
    stations: &[ChargingStation],
    supply_demand: &[SupplyDemandRow],
    states: &[CombinedStateRow],
    states_without_sales: BTreeSet<String>,
    states_without_population: BTreeSet<String>,
) -> RunSummary {
    RunSummary {
        generated_at: Utc::now(),
        sources: sources.to_vec(),
        total_stations: stations.len(),
        supply_demand_rows: supply_demand.len(),
        undefined_ratio_rows: supply_demand
            .iter()
            .filter(|r| r.charger_to_demand_ratio.is_none())
            .count(),
        combined_state_rows: states.len(),
        states_without_sales,
        states_without_population,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(state: Option<&str>, t: Option<f64>) -> ChargingStation {
        ChargingStation {
            state: state.map(str::to_string),
            charger_type: t.and_then(ChargerType::new),
        }
    }

    fn sale(state: &str, q: Option<f64>) -> EvSale {
        EvSale {
            state: Some(state.to_string()),
            quantity: q,
        }
    }

    fn pop(state: &str, p: Option<f64>) -> StatePopulation {
        StatePopulation {
            state: Some(state.to_string()),
            total_population: p,
        }
    }

    #[test]
    fn supply_demand_counts_joins_and_labels() {
        let stations = vec![
            station(Some("maharashtra"), Some(7.0)),
            station(Some("maharashtra"), Some(7.0)),
            station(Some("maharashtra"), Some(99.0)),
            station(Some("delhi"), Some(10.0)),
            station(Some("delhi"), None),
            station(None, Some(7.0)),
        ];
        let sales = vec![sale("maharashtra", Some(60.0)), sale("maharashtra", Some(40.0))];
        let (rows, without_sales) = generate_supply_demand(&stations, &sales);
        assert_eq!(rows.len(), 3);
        assert_eq!(without_sales, BTreeSet::from(["delhi".to_string()]));

        let by_key: HashMap<(&str, &str), &SupplyDemandRow> = rows
            .iter()
            .map(|r| ((r.state.as_str(), r.type_str.as_str()), r))
            .collect();

        let m7 = by_key[&("maharashtra", "7.0")];
        assert_eq!(m7.charger_count, 2);
        assert_eq!(m7.ev_sales_quantity, 100.0);
        assert!((m7.charger_to_demand_ratio.unwrap() - 0.02).abs() < 1e-9);
        assert_eq!(m7.charger_type_name, "Level 2 AC (Fast Charger)");

        assert_eq!(by_key[&("maharashtra", "99.0")].charger_type_name, "Unknown");

        let d10 = by_key[&("delhi", "10.0")];
        assert_eq!(d10.charger_count, 1);
        assert_eq!(d10.ev_sales_quantity, 0.0);
        assert_eq!(d10.charger_to_demand_ratio, None);
        assert_eq!(d10.charger_type_name, "Level 3 DC (Rapid Charger)");
    }

    #[test]
    fn population_rows_drop_unparseable_totals() {
        let rows = generate_population(&[
            pop("goa", Some(1_500_000.0)),
            pop("kerala", None),
            StatePopulation {
                state: None,
                total_population: Some(10.0),
            },
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state.as_deref(), Some("goa"));
        assert_eq!(rows[1].state, None);
    }

    #[test]
    fn state_summary_inner_joins_sales_and_left_joins_population() {
        let stations = vec![
            station(Some("goa"), Some(7.0)),
            station(Some("goa"), None),
            station(Some("kerala"), Some(6.0)),
            station(Some("assam"), Some(6.0)),
        ];
        let sales = vec![
            sale("goa", Some(50.0)),
            sale("kerala", Some(10.0)),
            sale("bihar", Some(5.0)),
        ];
        let population = vec![pop("goa", Some(1000.0)), pop("goa", Some(1000.0))];
        let (rows, without_population) = generate_state_summary(&stations, &sales, &population);
        assert_eq!(without_population, BTreeSet::from(["kerala".to_string()]));

        let states: Vec<&str> = rows.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(states, vec!["goa", "kerala"]);

        let goa = &rows[0];
        assert_eq!(goa.stations_count, 2);
        assert_eq!(goa.total_population, 2000.0);
        assert!((goa.stations_per_capita.unwrap() - 0.001).abs() < 1e-9);
        assert!((goa.sales_per_capita.unwrap() - 0.025).abs() < 1e-9);

        let kerala = &rows[1];
        assert_eq!(kerala.total_population, 0.0);
        assert_eq!(kerala.stations_per_capita, None);
        assert_eq!(kerala.sales_per_capita, None);
    }

    #[test]
    fn charger_type_summary_sorts_by_count() {
        let stations = vec![
            station(Some("goa"), Some(6.0)),
            station(Some("kerala"), Some(6.0)),
            station(Some("kerala"), Some(10.0)),
            station(Some("kerala"), Some(6.0)),
        ];
        let sales = vec![sale("goa", Some(5.0)), sale("kerala", Some(20.0))];
        let (rows, _) = generate_supply_demand(&stations, &sales);
        let summary = generate_charger_type_summary(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].charger_type_name, "Level 1 AC (Slow Charger)");
        assert_eq!(summary[0].charger_count, 3);
        assert_eq!(summary[0].ev_sales_quantity, 25.0);
        assert_eq!(summary[1].charger_count, 1);
    }

    #[test]
    fn ranking_puts_busiest_state_first() {
        let stations = vec![
            station(Some("goa"), None),
            station(Some("kerala"), None),
            station(Some("kerala"), None),
        ];
        let sales = vec![sale("goa", Some(1.0)), sale("kerala", Some(1.0))];
        let (rows, _) = generate_state_summary(&stations, &sales, &[]);
        let ranked = rank_states_by_stations(&rows);
        assert_eq!(ranked[0].state, "kerala");
        assert_eq!(ranked[1].state, "goa");
    }

    #[test]
    fn sales_ranking_puts_best_selling_state_first() {
        let stations = vec![
            station(Some("goa"), None),
            station(Some("kerala"), None),
            station(Some("kerala"), None),
            station(Some("assam"), None),
        ];
        let sales = vec![
            sale("goa", Some(900.0)),
            sale("kerala", Some(10.0)),
            sale("assam", Some(10.0)),
        ];
        let (rows, _) = generate_state_summary(&stations, &sales, &[]);
        let ranked = rank_states_by_sales(&rows);
        let order: Vec<&str> = ranked.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(order, vec!["goa", "assam", "kerala"]);
    }
}
