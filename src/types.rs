use crate::loader::LoadReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use tabled::Tabled;

// ---- raw rows, one struct per source; headers are case-sensitive ----

#[derive(Debug, Deserialize)]
pub struct RawChargingRow {
    #[serde(rename = "state")]
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub charger_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawSalesRow {
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "EV_Sales_Quantity")]
    pub ev_sales_quantity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPopulationRow {
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "total_population")]
    pub total_population: Option<String>,
}

// ---- typed records after parsing and normalization ----

/// Numeric charger-type code as found in the station dataset (`7`, `7.0`, ...).
///
/// Finite by construction, so it can be used as a hash key.
#[derive(Debug, Clone, Copy)]
pub struct ChargerType(f64);

impl ChargerType {
    pub fn new(v: f64) -> Option<Self> {
        if !v.is_finite() {
            return None;
        }
        // fold -0.0 into 0.0 so both hash alike
        Some(Self(if v == 0.0 { 0.0 } else { v }))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Lookup code with exactly one decimal place, e.g. `6.0`.
    pub fn code(self) -> String {
        format!("{:.1}", self.0)
    }
}

impl PartialEq for ChargerType {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for ChargerType {}

impl Hash for ChargerType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for ChargerType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChargerType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargingStation {
    /// Normalized state key; `None` when the row has no usable region.
    pub state: Option<String>,
    pub charger_type: Option<ChargerType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvSale {
    pub state: Option<String>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatePopulation {
    pub state: Option<String>,
    pub total_population: Option<f64>,
}

// ---- output rows ----

fn display_metric(v: &Option<f64>) -> String {
    crate::util::format_metric(*v, 6)
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct SupplyDemandRow {
    #[serde(rename = "state_clean")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "type")]
    #[tabled(rename = "Type")]
    pub charger_type: f64,
    #[serde(rename = "charger_count")]
    #[tabled(rename = "Chargers")]
    pub charger_count: usize,
    #[serde(rename = "EV_Sales_Quantity")]
    #[tabled(rename = "EVSales")]
    pub ev_sales_quantity: f64,
    #[serde(rename = "charger_to_demand_ratio")]
    #[tabled(rename = "ChargerToDemand", display_with = "display_metric")]
    pub charger_to_demand_ratio: Option<f64>,
    #[serde(rename = "type_str")]
    #[tabled(skip)]
    pub type_str: String,
    #[serde(rename = "charger_type_name")]
    #[tabled(rename = "ChargerType")]
    pub charger_type_name: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PopulationRow {
    #[serde(rename = "state_clean")]
    pub state: Option<String>,
    #[serde(rename = "total_population")]
    pub total_population: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CombinedStateRow {
    #[serde(rename = "state")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "stations_count")]
    #[tabled(rename = "Stations")]
    pub stations_count: usize,
    #[serde(rename = "EV_Sales_Quantity")]
    #[tabled(rename = "EVSales")]
    pub ev_sales_quantity: f64,
    #[serde(rename = "total_population")]
    #[tabled(rename = "Population")]
    pub total_population: f64,
    #[serde(rename = "stations_per_capita")]
    #[tabled(rename = "StationsPerCapita", display_with = "display_metric")]
    pub stations_per_capita: Option<f64>,
    #[serde(rename = "sales_per_capita")]
    #[tabled(rename = "SalesPerCapita", display_with = "display_metric")]
    pub sales_per_capita: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ChargerTypeSummaryRow {
    #[serde(rename = "charger_type_name")]
    #[tabled(rename = "ChargerType")]
    pub charger_type_name: String,
    #[serde(rename = "charger_count")]
    #[tabled(rename = "Chargers")]
    pub charger_count: usize,
    #[serde(rename = "EV_Sales_Quantity")]
    #[tabled(rename = "EVSales")]
    pub ev_sales_quantity: f64,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<LoadReport>,
    pub total_stations: usize,
    pub supply_demand_rows: usize,
    pub undefined_ratio_rows: usize,
    pub combined_state_rows: usize,
    /// States with chargers but no EV sales record; their ratios are undefined.
    pub states_without_sales: BTreeSet<String>,
    pub states_without_population: BTreeSet<String>,
}
