use log::info;

use super::error::TraceError;
use super::types::HopSequence;

/// Reads a JSON array of traces, each an array of `{ "node", "time", "type" }` hops.
pub fn parse_traces(raw: &str) -> Result<Vec<HopSequence>, TraceError> {
	let traces: Vec<HopSequence> = serde_json::from_str(raw)?;
	if let Some(index) = traces.iter().position(|trace| trace.is_empty()) {
		return Err(TraceError::EmptyTrace { index });
	}
	info!("loaded {} traces", traces.len());
	Ok(traces)
}
