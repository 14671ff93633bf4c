use crate::error::{EdaError, EdaResult};
use crate::normalize::{StateNormalizer, UnmatchedPolicy, DEFAULT_THRESHOLD};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Optional config file looked up in the working directory.
pub const CONFIG_FILE: &str = "ev_charging_eda.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    #[serde(default = "default_charging_stations")]
    pub charging_stations: PathBuf,
    #[serde(default = "default_ev_sales")]
    pub ev_sales: PathBuf,
    #[serde(default = "default_population")]
    pub population: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputsConfig {
    #[serde(default = "default_supply_demand_out")]
    pub supply_demand: PathBuf,
    #[serde(default = "default_population_out")]
    pub population: PathBuf,
    #[serde(default = "default_state_summary_out")]
    pub state_summary: PathBuf,
    #[serde(default = "default_charger_type_summary_out")]
    pub charger_type_summary: PathBuf,
    #[serde(default = "default_summary_json_out")]
    pub summary_json: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizeConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_rows")]
    pub rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_inputs")]
    pub inputs: InputsConfig,
    #[serde(default = "default_outputs")]
    pub outputs: OutputsConfig,
    #[serde(default = "default_normalize")]
    pub normalize: NormalizeConfig,
    #[serde(default = "default_preview")]
    pub preview: PreviewConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: default_inputs(),
            outputs: default_outputs(),
            normalize: default_normalize(),
            preview: default_preview(),
        }
    }
}

impl Config {
    pub fn normalizer(&self) -> StateNormalizer {
        StateNormalizer::new(self.normalize.threshold, self.normalize.unmatched)
    }

    /// Point every input and output at `dir` while keeping the file names.
    pub fn rooted_at(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        for p in [
            &mut self.inputs.charging_stations,
            &mut self.inputs.ev_sales,
            &mut self.inputs.population,
            &mut self.outputs.supply_demand,
            &mut self.outputs.population,
            &mut self.outputs.state_summary,
            &mut self.outputs.charger_type_summary,
            &mut self.outputs.summary_json,
        ] {
            if let Some(name) = p.file_name() {
                *p = dir.join(name);
            }
        }
        self
    }

    fn validate(&self, path: &Path) -> EdaResult<()> {
        let t = self.normalize.threshold;
        if !(0.0..=100.0).contains(&t) {
            return Err(EdaError::config(
                path,
                format!("normalize.threshold must be within 0..=100, got {t}"),
            ));
        }
        Ok(())
    }
}

pub fn parse_config(path: &Path, content: &str) -> EdaResult<Config> {
    let cfg: Config =
        toml::from_str(content).map_err(|e| EdaError::config(path, e.to_string()))?;
    cfg.validate(path)?;
    Ok(cfg)
}

/// Read `path` if it exists; otherwise fall back to defaults.
pub fn load_config(path: impl AsRef<Path>) -> EdaResult<Config> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| EdaError::io(path, e))?;
    let cfg = parse_config(path, &content)?;
    info!(path = %path.display(), "loaded config");
    Ok(cfg)
}

fn default_inputs() -> InputsConfig {
    InputsConfig {
        charging_stations: default_charging_stations(),
        ev_sales: default_ev_sales(),
        population: default_population(),
    }
}

fn default_outputs() -> OutputsConfig {
    OutputsConfig {
        supply_demand: default_supply_demand_out(),
        population: default_population_out(),
        state_summary: default_state_summary_out(),
        charger_type_summary: default_charger_type_summary_out(),
        summary_json: default_summary_json_out(),
    }
}

fn default_normalize() -> NormalizeConfig {
    NormalizeConfig {
        threshold: default_threshold(),
        unmatched: UnmatchedPolicy::default(),
    }
}

fn default_preview() -> PreviewConfig {
    PreviewConfig {
        rows: default_preview_rows(),
    }
}

fn default_charging_stations() -> PathBuf {
    PathBuf::from("data/ev-charging-stations-india.csv")
}

fn default_ev_sales() -> PathBuf {
    PathBuf::from("data/EV_Dataset.csv")
}

fn default_population() -> PathBuf {
    PathBuf::from("data/state_wise_population__2019.csv")
}

fn default_supply_demand_out() -> PathBuf {
    PathBuf::from("data/cleaned_supply_demand_by_charger_type.csv")
}

fn default_population_out() -> PathBuf {
    PathBuf::from("data/cleaned_population_by_state.csv")
}

fn default_state_summary_out() -> PathBuf {
    PathBuf::from("data/ev_analysis_combined.csv")
}

fn default_charger_type_summary_out() -> PathBuf {
    PathBuf::from("data/charger_type_summary.csv")
}

fn default_summary_json_out() -> PathBuf {
    PathBuf::from("data/summary.json")
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_preview_rows() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse_config(Path::new("x.toml"), "").unwrap();
        assert_eq!(cfg.normalize.threshold, 80.0);
        assert_eq!(cfg.normalize.unmatched, UnmatchedPolicy::KeepOriginal);
        assert_eq!(cfg.inputs.ev_sales, PathBuf::from("data/EV_Dataset.csv"));
        assert_eq!(cfg.preview.rows, 5);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse_config(
            Path::new("x.toml"),
            "[normalize]\nthreshold = 90.0\nunmatched = \"mark_unmatched\"\n",
        )
        .unwrap();
        assert_eq!(cfg.normalize.threshold, 90.0);
        assert_eq!(cfg.normalize.unmatched, UnmatchedPolicy::MarkUnmatched);
        assert_eq!(
            cfg.outputs.summary_json,
            PathBuf::from("data/summary.json")
        );
    }

    #[test]
    fn rejects_bad_threshold_and_unknown_keys() {
        assert!(parse_config(Path::new("x.toml"), "[normalize]\nthreshold = 120.0\n").is_err());
        assert!(parse_config(Path::new("x.toml"), "[normalize]\nthreshhold = 80.0\n").is_err());
    }

    #[test]
    fn rooted_at_rewrites_directories() {
        let cfg = Config::default().rooted_at("/tmp/run");
        assert_eq!(
            cfg.inputs.charging_stations,
            PathBuf::from("/tmp/run/ev-charging-stations-india.csv")
        );
        assert_eq!(cfg.outputs.summary_json, PathBuf::from("/tmp/run/summary.json"));
    }
}
