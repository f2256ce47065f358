/// A "flat" configuration object of a [`crate::simulation::Simulation`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Cancel a reduction if it exceeds the specified number of passes (default:
    /// `usize::MAX`).
    ///
    /// Independently of this value, a reduction is never allowed more passes than the
    /// graph has nodes and edges combined: every pass except the last one either prunes
    /// an edge or shrinks the frontier.
    pub max_passes: usize,
    /// Override the data bound of the cost model (default: derived from the attack
    /// parameters).
    pub data_bound: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig::new()
    }
}

impl SimulationConfig {
    pub fn new() -> SimulationConfig {
        SimulationConfig {
            max_passes: usize::MAX,
            data_bound: None,
        }
    }
}
