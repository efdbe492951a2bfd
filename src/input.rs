//! Loading observations and aggregate snapshots from disk
//!
//! The pipeline itself never touches the filesystem; these helpers serve the
//! `poolstats` binary and callers that keep snapshots as files.

use crate::aggregate::RunningAggregate;
use crate::errors::{Result, StatsError};
use crate::types::PoolObservation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;
use tracing::debug;

/// CSV row format for pool observations
///
/// Header: `pool,project,projectName,chain,apy`. An empty `projectName` cell
/// means the project is unlisted.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvPoolObservation {
    pub pool: String,
    pub project: String,
    #[serde(rename = "projectName", default)]
    pub project_name: Option<String>,
    pub chain: String,
    pub apy: f64,
}

impl From<CsvPoolObservation> for PoolObservation {
    fn from(row: CsvPoolObservation) -> Self {
        Self {
            pool_id: row.pool,
            project_slug: row.project,
            project_name: row
                .project_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            chain: row.chain,
            apy_percent: row.apy,
        }
    }
}

/// Aggregate row carrying its own pool id
#[derive(Debug, Clone, Deserialize)]
struct PriorRecord {
    pool: String,
    #[serde(flatten)]
    aggregate: RunningAggregate,
}

/// Either `{ "<pool>": {..} }` or `[{ "pool": "<pool>", .. }]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriorSnapshot {
    Keyed(HashMap<String, RunningAggregate>),
    Rows(Vec<PriorRecord>),
}

/// Read observations from a CSV reader
pub fn read_observations_csv<R: Read>(reader: R) -> Result<Vec<PoolObservation>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut observations = Vec::new();
    for result in csv_reader.deserialize() {
        let row: CsvPoolObservation = result?;
        observations.push(PoolObservation::from(row));
    }

    Ok(observations)
}

/// Read observations from a JSON array
pub fn read_observations_json<R: Read>(reader: R) -> Result<Vec<PoolObservation>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Load observations, choosing the format from the file extension
pub fn load_observations<P: AsRef<Path>>(path: P) -> Result<Vec<PoolObservation>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let observations = match extension(path).as_deref() {
        Some("csv") => read_observations_csv(reader)?,
        Some("json") => read_observations_json(reader)?,
        other => {
            return Err(StatsError::invalid_input(format!(
                "unsupported observation file extension {:?} for {}",
                other,
                path.display()
            )));
        }
    };

    debug!(path = %path.display(), count = observations.len(), "loaded observations");
    Ok(observations)
}

/// Read a prior-aggregate snapshot in either keyed or row form
pub fn read_priors<R: Read>(reader: R) -> Result<HashMap<String, RunningAggregate>> {
    let snapshot: PriorSnapshot = serde_json::from_reader(reader)?;

    let priors = match snapshot {
        PriorSnapshot::Keyed(map) => map,
        PriorSnapshot::Rows(rows) => rows
            .into_iter()
            .map(|row| (row.pool, row.aggregate))
            .collect(),
    };

    if let Some((pool, agg)) = priors.iter().find(|(_, agg)| agg.count == 0) {
        return Err(StatsError::invalid_input(format!(
            "prior aggregate for {pool} has count {}",
            agg.count
        )));
    }

    Ok(priors)
}

/// Load a prior-aggregate snapshot from a JSON file
pub fn load_priors<P: AsRef<Path>>(path: P) -> Result<HashMap<String, RunningAggregate>> {
    let path = path.as_ref();
    let priors = read_priors(BufReader::new(File::open(path)?))?;

    debug!(path = %path.display(), count = priors.len(), "loaded prior aggregates");
    Ok(priors)
}

/// Write aggregates as a JSON map keyed by pool id, in key order
pub fn write_aggregates<P: AsRef<Path>>(
    path: P,
    aggregates: &HashMap<String, RunningAggregate>,
) -> Result<()> {
    let ordered: BTreeMap<&String, &RunningAggregate> = aggregates.iter().collect();
    write_json(path, &ordered)
}

/// Pretty-print any serializable value to a file
pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(path: P, value: &T) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
