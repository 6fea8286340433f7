//! `Experiment`: top-level simulation parameters and log-output requests.

use std::collections::BTreeMap;

/// The integration scheme named in `<Simulation>`. Only `EulerIntegration`
/// is accepted; any other scheme name is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerIntegration {
    /// Integration time step, in milliseconds.
    pub dt: f64,
}

/// One `<LogOutput>` request: which component/port to record, over what
/// window, and at which indices.
#[derive(Debug, Clone, PartialEq)]
pub struct LogOutput {
    /// Log artefact name.
    pub name: String,
    /// Component being logged.
    pub target: String,
    /// Port being logged.
    pub port: String,
    /// Optional start time, in milliseconds.
    pub start_time: Option<f64>,
    /// Optional end time, in milliseconds.
    pub end_time: Option<f64>,
    /// Optional subset of indices to record; `None` means "all".
    pub indices: Option<Vec<u32>>,
}

/// Top-level experiment parameters parsed from the experiment XML's
/// `FullPass` (the experiment file is always read in a single, non-InfoPass
/// pass since it carries no connection data of its own).
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    /// Total simulated duration, in milliseconds.
    pub duration: f64,
    /// Integration scheme and time step.
    pub time_step: EulerIntegration,
    /// URL of the referenced network file, relative to the experiment file.
    pub network_layer_url: String,
    /// Log-output requests, keyed by target component name (a multimap: a
    /// single target may be logged from more than one `<LogOutput>`).
    pub log_outputs: BTreeMap<String, Vec<LogOutput>>,
}

impl Experiment {
    /// Construct a new experiment with no log outputs.
    pub fn new(duration: f64, time_step: EulerIntegration, network_layer_url: impl Into<String>) -> Self {
        Experiment {
            duration,
            time_step,
            network_layer_url: network_layer_url.into(),
            log_outputs: BTreeMap::new(),
        }
    }

    /// Register a log output under its target component.
    pub fn add_log_output(&mut self, output: LogOutput) {
        self.log_outputs
            .entry(output.target.clone())
            .or_default()
            .push(output);
    }
}

/// Parse a comma-separated integer list, as used for `<LogOutput indices=…>`.
pub fn parse_indices(raw: &str) -> Result<Vec<u32>, std::num::ParseIntError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_indices_handles_spacing() {
        assert_eq!(parse_indices("1, 2,3 , 4").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn log_outputs_are_a_multimap() {
        let mut exp = Experiment::new(
            1000.0,
            EulerIntegration { dt: 0.1 },
            "network.xml",
        );
        exp.add_log_output(LogOutput {
            name: "a".into(),
            target: "PopA".into(),
            port: "v".into(),
            start_time: None,
            end_time: None,
            indices: None,
        });
        exp.add_log_output(LogOutput {
            name: "b".into(),
            target: "PopA".into(),
            port: "spike".into(),
            start_time: None,
            end_time: None,
            indices: None,
        });
        assert_eq!(exp.log_outputs.get("PopA").unwrap().len(), 2);
    }
}
