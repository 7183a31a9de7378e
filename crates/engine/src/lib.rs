//! One scan, five stages: enumerate transports, classify each, collect
//! tool evidence once, correlate per transport, assemble records.
//! Stateless; every call starts from zero.

use anyhow::Result;
use pandora_core::{
    Classification, ConfirmedDeviceRecord, DeviceMode, EvidenceBundle, ScanReport,
    ToolEvidenceSet, TransportEvidence,
};
use pandora_tools::{CommandRunner, ToolSelection, DEFAULT_TOOL_TIMEOUT};
use std::time::Duration;

/// The pipeline's only configuration: which tools to probe and how long
/// each probe may take.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub tools: ToolSelection,
    pub tool_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            tools: ToolSelection::default(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

/// Run one full scan and wrap the records in a report envelope.
///
/// A USB initialization failure degrades to "no transports observed";
/// tool probing still runs so the CLI's `tools` view stays truthful,
/// but with zero transports there is nothing to correlate.
pub fn run_scan(options: &ScanOptions, runner: &dyn CommandRunner) -> Result<ScanReport> {
    let transports = pandora_transport::probe_transports().unwrap_or_default();
    let tools = pandora_tools::probe_enabled_tools(runner, &options.tools, options.tool_timeout);
    let devices = correlate_transports(transports, &tools);
    Ok(ScanReport::new(devices))
}

/// Stages 2, 4 and 5 over an already-enumerated transport set. Pure:
/// deterministic in its inputs, no I/O, so the whole correlation path
/// is testable without hardware or processes.
pub fn correlate_transports(
    transports: Vec<TransportEvidence>,
    tools: &ToolEvidenceSet,
) -> Vec<ConfirmedDeviceRecord> {
    let classifications: Vec<Classification> = transports
        .iter()
        .map(pandora_classify::classify)
        .collect();
    let scan_modes: Vec<DeviceMode> = classifications
        .iter()
        .map(|classification| classification.mode)
        .collect();

    transports
        .into_iter()
        .zip(classifications)
        .map(|(transport, classification)| {
            let (classification, matched_ids) =
                pandora_resolve::resolve(&transport, classification, &scan_modes, tools);
            assemble(transport, classification, matched_ids, tools)
        })
        .collect()
}

/// Bundle one transport's evidence into the final record.
///
/// device_uid is the USB serial verbatim when present (stable across
/// reconnect), else the synthesized transport key. The evidence bundle
/// embeds all three tool probes unfiltered so downstream consumers keep
/// full audit context.
pub fn assemble(
    transport: TransportEvidence,
    classification: Classification,
    matched_ids: Vec<String>,
    tools: &ToolEvidenceSet,
) -> ConfirmedDeviceRecord {
    let device_uid = match transport.serial.as_deref() {
        Some(serial) => serial.to_string(),
        None => transport.transport_key(),
    };

    ConfirmedDeviceRecord {
        device_uid,
        platform_hint: classification.mode.platform_hint(),
        mode: classification.mode,
        confidence: classification.confidence,
        evidence: EvidenceBundle {
            transport,
            tools: tools.clone(),
        },
        notes: classification.notes,
        matched_tool_ids: matched_ids,
    }
}
