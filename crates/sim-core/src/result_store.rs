use sim_devices::noise::{ChannelId, NoiseSink};
use sim_devices::{DeviceError, Result as DeviceResult};

use crate::error::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub usize);

/// Values written during one pass, keyed by frequency
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRow {
    pub freq: f64,
    pub values: Vec<f64>,
}

/// Named channels and the rows written into them
#[derive(Debug, Clone, Default)]
pub struct NoisePlot {
    pub name: String,
    pub channels: Vec<String>,
    pub rows: Vec<PlotRow>,
    /// Refuse allocations beyond this many channels
    pub channel_limit: Option<usize>,
    current: Option<PlotRow>,
}

impl NoisePlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_channel_limit(mut self, limit: usize) -> Self {
        self.channel_limit = Some(limit);
        self
    }

    pub fn begin_row(&mut self, freq: f64) {
        self.current = Some(PlotRow {
            freq,
            values: Vec::with_capacity(self.channels.len()),
        });
    }

    /// Store the open row. Rows nothing was written to are dropped.
    pub fn end_row(&mut self) {
        if let Some(row) = self.current.take() {
            if !row.values.is_empty() {
                self.rows.push(row);
            }
        }
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c == name)
    }

    /// Every stored value of channel `name`, one per row
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.channel_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.values.get(idx).copied())
                .collect(),
        )
    }
}

impl NoiseSink for NoisePlot {
    fn allocate_channel(&mut self, name: &str) -> DeviceResult<ChannelId> {
        let full = self
            .channel_limit
            .is_some_and(|limit| self.channels.len() >= limit);
        if full || self.channels.try_reserve(1).is_err() {
            return Err(DeviceError::OutOfMemory {
                channel: name.to_string(),
            });
        }
        self.channels.push(name.to_string());
        Ok(ChannelId(self.channels.len() - 1))
    }

    fn append_output(&mut self, value: f64) {
        self.current
            .get_or_insert_with(|| PlotRow {
                freq: 0.0,
                values: Vec::new(),
            })
            .values
            .push(value);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSummary {
    pub frequencies: Vec<f64>,
    /// Output noise integrated over the sweep [V^2]
    pub out_noise: f64,
    /// Input-referred noise integrated over the sweep
    pub in_noise: f64,
}

#[derive(Debug, Clone)]
pub struct NoiseRun {
    pub id: RunId,
    pub spectrum: NoisePlot,
    pub integrated: NoisePlot,
    pub summary: NoiseSummary,
}

#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    pub runs: Vec<NoiseRun>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self { runs: Vec::new() }
    }

    pub fn add_run(&mut self, mut run: NoiseRun) -> RunId {
        let id = RunId(self.runs.len());
        run.id = id;
        self.runs.push(run);
        id
    }

    pub fn get(&self, id: RunId) -> Result<&NoiseRun> {
        self.runs.get(id.0).ok_or(SimError::RunNotFound(id.0))
    }

    pub fn write_psf_text(&self, id: RunId, path: &std::path::Path) -> Result<()> {
        let run = self.get(id)?;
        crate::psf::write_noise_psf(run, path)?;
        Ok(())
    }
}
