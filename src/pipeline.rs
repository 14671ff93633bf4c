// One run of the analysis: load, normalize, aggregate, join, derive, write.
//
// Every stage is a plain function over owned/borrowed data; this module only
// wires them together in order.
use crate::config::Config;
use crate::error::EdaResult;
use crate::loader::{self, LoadReport};
use crate::output;
use crate::reports;
use crate::types::{
    ChargerTypeSummaryRow, CombinedStateRow, PopulationRow, RawChargingRow, RawPopulationRow,
    RawSalesRow, RunSummary, SupplyDemandRow,
};
use crate::util::{format_int, format_number};
use tracing::info;

#[derive(Debug)]
pub struct RunOutput {
    pub supply_demand: Vec<SupplyDemandRow>,
    pub population: Vec<PopulationRow>,
    pub states: Vec<CombinedStateRow>,
    pub charger_types: Vec<ChargerTypeSummaryRow>,
    pub summary: RunSummary,
}

/// Run the whole pipeline once. Any load or write failure aborts the run.
pub fn run(config: &Config) -> EdaResult<RunOutput> {
    let normalizer = config.normalizer();
    info!(
        threshold = normalizer.threshold,
        unmatched = ?normalizer.policy,
        "starting EV charging analysis"
    );

    let (stations, stations_report) =
        loader::load::<RawChargingRow>(&config.inputs.charging_stations, &normalizer)?;
    let (sales, sales_report) =
        loader::load::<RawSalesRow>(&config.inputs.ev_sales, &normalizer)?;
    let (population, population_report) =
        loader::load::<RawPopulationRow>(&config.inputs.population, &normalizer)?;
    let reports_in: Vec<LoadReport> = vec![stations_report, sales_report, population_report];

    let (supply_demand, without_sales) = reports::generate_supply_demand(&stations, &sales);
    let population_rows = reports::generate_population(&population);
    let (states, without_population) =
        reports::generate_state_summary(&stations, &sales, &population);
    let charger_types = reports::generate_charger_type_summary(&supply_demand);
    let summary = reports::generate_summary(
        &reports_in,
        &stations,
        &supply_demand,
        &states,
        without_sales,
        without_population,
    );

    let out = &config.outputs;
    output::write_csv(&out.supply_demand, &supply_demand)?;
    output::write_csv(&out.population, &population_rows)?;
    output::write_csv(&out.state_summary, &states)?;
    output::write_csv(&out.charger_type_summary, &charger_types)?;
    output::write_json(&out.summary_json, &summary)?;
    info!(
        supply_demand_rows = supply_demand.len(),
        undefined_ratios = summary.undefined_ratio_rows,
        state_rows = states.len(),
        "outputs written"
    );

    Ok(RunOutput {
        supply_demand,
        population: population_rows,
        states,
        charger_types,
        summary,
    })
}

/// Console report in the same spirit as the written files.
pub fn print_report(config: &Config, run: &RunOutput) {
    let n = config.preview.rows;
    for src in &run.summary.sources {
        println!(
            "{}: {} rows ({} skipped), {} canonical, {} unmatched, {} missing state",
            src.source,
            format_int(src.total_rows),
            format_int(src.parse_errors),
            format_int(src.canonical),
            format_int(src.unmatched),
            format_int(src.missing),
        );
    }
    println!();

    output::preview_table(
        "Charger Supply vs EV Demand by State and Charger Type",
        Some("ratio undefined where a state has no EV sales"),
        &run.supply_demand,
        n,
    );
    println!(
        "(Full table exported to {})\n",
        config.outputs.supply_demand.display()
    );

    output::preview_table(
        "Total Charging Stations by Charger Type",
        None,
        &run.charger_types,
        n,
    );
    println!(
        "(Full table exported to {})\n",
        config.outputs.charger_type_summary.display()
    );

    let ranked = reports::rank_states_by_stations(&run.states);
    output::preview_table(
        "Charging Stations Count by State",
        Some("states with both station and sales data"),
        &ranked,
        n,
    );
    println!(
        "(Full table exported to {})\n",
        config.outputs.state_summary.display()
    );

    let by_sales = reports::rank_states_by_sales(&run.states);
    output::preview_table(
        "EV Sales by State",
        Some("states with both station and sales data"),
        &by_sales,
        n,
    );

    let total_sales: f64 = run.states.iter().map(|r| r.ev_sales_quantity).sum();
    println!("Summary Stats ({}):", config.outputs.summary_json.display());
    println!(
        "{{\"total_stations\": {}, \"undefined_ratio_rows\": {}, \"joined_state_sales\": {}}}\n",
        format_int(run.summary.total_stations),
        format_int(run.summary.undefined_ratio_rows),
        format_number(total_sales, 0)
    );
}
