use crate::error::{EdaError, EdaResult};
use crate::normalize::{Normalized, StateNormalizer};
use crate::types::{
    ChargerType, ChargingStation, EvSale, RawChargingRow, RawPopulationRow, RawSalesRow,
    StatePopulation,
};
use crate::util::parse_f64_safe;
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub source: String,
    pub total_rows: usize,
    pub parse_errors: usize,
    pub canonical: usize,
    pub unmatched: usize,
    pub missing: usize,
    /// Distinct cleaned names that did not clear the match threshold.
    pub unmatched_names: BTreeSet<String>,
}

impl LoadReport {
    fn record(&mut self, outcome: &Normalized) {
        match outcome {
            Normalized::Canonical(_) => self.canonical += 1,
            Normalized::Unmatched(name) => {
                self.unmatched += 1;
                self.unmatched_names.insert(name.clone());
            }
            Normalized::Missing => self.missing += 1,
        }
    }
}

/// A raw CSV row shape that carries a region column.
pub trait SourceRow: DeserializeOwned {
    type Record;

    const SOURCE: &'static str;
    const REGION_COLUMN: &'static str;

    fn region(&self) -> Option<&str>;

    /// Turn the raw row into its typed record given the normalized state key.
    fn into_record(self, state: Option<String>) -> Self::Record;
}

impl SourceRow for RawChargingRow {
    type Record = ChargingStation;

    const SOURCE: &'static str = "charging_stations";
    const REGION_COLUMN: &'static str = "state";

    fn region(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn into_record(self, state: Option<String>) -> ChargingStation {
        ChargingStation {
            state,
            charger_type: parse_f64_safe(self.charger_type.as_deref()).and_then(ChargerType::new),
        }
    }
}

impl SourceRow for RawSalesRow {
    type Record = EvSale;

    const SOURCE: &'static str = "ev_sales";
    const REGION_COLUMN: &'static str = "State";

    fn region(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn into_record(self, state: Option<String>) -> EvSale {
        EvSale {
            state,
            quantity: parse_f64_safe(self.ev_sales_quantity.as_deref()),
        }
    }
}

impl SourceRow for RawPopulationRow {
    type Record = StatePopulation;

    const SOURCE: &'static str = "population";
    const REGION_COLUMN: &'static str = "State";

    fn region(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn into_record(self, state: Option<String>) -> StatePopulation {
        StatePopulation {
            state,
            total_population: parse_f64_safe(self.total_population.as_deref()),
        }
    }
}

/// Deserialize every row of `reader`, normalizing the region column as we go.
///
/// Rows that fail to deserialize are counted in `parse_errors` and skipped.
pub fn load_from_reader<T, R>(
    reader: R,
    normalizer: &StateNormalizer,
) -> Result<(Vec<T::Record>, LoadReport), csv::Error>
where
    T: SourceRow,
    R: Read,
{
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    if !rdr.headers()?.iter().any(|h| h == T::REGION_COLUMN) {
        warn!(
            source = T::SOURCE,
            column = T::REGION_COLUMN,
            "region column not found; every row will have a missing state"
        );
    }

    let mut report = LoadReport {
        source: T::SOURCE.to_string(),
        ..LoadReport::default()
    };
    let mut records = Vec::new();
    for result in rdr.deserialize::<T>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            // a failed read is not a bad row; the load itself is broken
            Err(e) if e.is_io_error() => return Err(e),
            Err(_) => {
                report.parse_errors += 1;
                continue;
            }
        };
        let outcome = normalizer.normalize(row.region());
        report.record(&outcome);
        let key = outcome.key(normalizer.policy);
        records.push(row.into_record(key));
    }
    Ok((records, report))
}

/// Open and load one source file. Failing to open or read it is fatal.
pub fn load<T: SourceRow>(
    path: &Path,
    normalizer: &StateNormalizer,
) -> EdaResult<(Vec<T::Record>, LoadReport)> {
    let file = std::fs::File::open(path).map_err(|e| EdaError::io(path, e))?;
    let (records, report) =
        load_from_reader::<T, _>(file, normalizer).map_err(|e| EdaError::csv(path, e))?;

    info!(
        source = T::SOURCE,
        path = %path.display(),
        rows = report.total_rows,
        skipped = report.parse_errors,
        canonical = report.canonical,
        unmatched = report.unmatched,
        missing = report.missing,
        "loaded source"
    );
    for name in &report.unmatched_names {
        warn!(source = T::SOURCE, name = %name, "state name did not match any canonical state");
    }
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::UnmatchedPolicy;

    #[test]
    fn charging_rows_are_normalized_and_typed() {
        let data = "uid,state,type,city\n\
                    1,Maharashtra ,7,Pune\n\
                    2,maharashtra,7.0,Mumbai\n\
                    3,Atlantis,abc,Nowhere\n\
                    4,,10,Unknown\n";
        let (rows, report) =
            load_from_reader::<RawChargingRow, _>(data.as_bytes(), &StateNormalizer::default())
                .unwrap();
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.canonical, 2);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.missing, 1);
        assert!(report.unmatched_names.contains("atlantis"));

        assert_eq!(rows[0].state.as_deref(), Some("maharashtra"));
        assert_eq!(rows[0].charger_type, ChargerType::new(7.0));
        assert_eq!(rows[1].charger_type, ChargerType::new(7.0));
        assert_eq!(rows[2].state.as_deref(), Some("atlantis"));
        assert_eq!(rows[2].charger_type, None);
        assert_eq!(rows[3].state, None);
    }

    #[test]
    fn discard_policy_drops_unmatched_keys() {
        let data = "State,EV_Sales_Quantity\nAtlantis,5\nGoa,\n";
        let normalizer = StateNormalizer::new(80.0, UnmatchedPolicy::Discard);
        let (rows, _) = load_from_reader::<RawSalesRow, _>(data.as_bytes(), &normalizer).unwrap();
        assert_eq!(rows[0].state, None);
        assert_eq!(rows[0].quantity, Some(5.0));
        assert_eq!(rows[1].state.as_deref(), Some("goa"));
        assert_eq!(rows[1].quantity, None);
    }

    /// Serves `data` once, then fails every read.
    struct FailingReader {
        data: &'static [u8],
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
            }
            self.served = true;
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            Ok(n)
        }
    }

    #[test]
    fn read_failure_mid_file_aborts_the_load() {
        let reader = FailingReader {
            data: b"state,type\nGoa,7\n",
            served: false,
        };
        let result = load_from_reader::<RawChargingRow, _>(reader, &StateNormalizer::default());
        let err = result.unwrap_err();
        assert!(err.is_io_error());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load::<RawPopulationRow>(
            Path::new("definitely/not/here.csv"),
            &StateNormalizer::default(),
        );
        assert!(matches!(err, Err(EdaError::Io { .. })));
    }
}
