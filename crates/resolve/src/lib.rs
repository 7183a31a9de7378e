//! Identity resolver: cross-references one classified transport against
//! the per-scan tool evidence. The only place confidence is raised
//! after initial classification.

use pandora_core::{
    Classification, DeviceMode, PlatformHint, ToolEvidence, ToolEvidenceSet, TransportEvidence,
};

/// Fixed increment for a direct serial match, applied once per
/// correlation pass no matter how many tools matched.
pub const SERIAL_MATCH_BOOST: f32 = 0.15;

/// Absolute confidence when the single-candidate heuristic pairs an
/// Android transport with the sole adb/fastboot device id.
pub const ANDROID_SOLE_CANDIDATE_CONFIDENCE: f32 = 0.90;

/// Absolute confidence for the iOS variant. UDIDs are globally unique
/// and idevice_id's enumeration is trusted above adb/fastboot serials.
pub const IOS_SOLE_CANDIDATE_CONFIDENCE: f32 = 0.95;

/// Correlate one transport's classification with the scan's tool
/// evidence.
///
/// Precedence is fixed: a direct serial match is attempted first; the
/// single-candidate heuristic only runs when no serial match fired, so
/// a transport never collects both adjustments. `scan_modes` carries
/// the pre-correlation mode of every transport in the scan (this one
/// included) for the candidate count. No match is the common case and
/// passes the classification through untouched.
pub fn resolve(
    transport: &TransportEvidence,
    classification: Classification,
    scan_modes: &[DeviceMode],
    tools: &ToolEvidenceSet,
) -> (Classification, Vec<String>) {
    let mut classification = classification;

    let matched = correlate_serial(transport, &mut classification, tools);
    if !matched.is_empty() {
        return (classification, matched);
    }

    let matched = correlate_sole_candidate(&mut classification, scan_modes, tools);
    (classification, matched)
}

/// Highest-precedence rule: the transport's USB serial appears verbatim
/// in a tool's device-id list. Fires per tool, boosts once.
fn correlate_serial(
    transport: &TransportEvidence,
    classification: &mut Classification,
    tools: &ToolEvidenceSet,
) -> Vec<String> {
    let Some(serial) = transport.serial.as_deref() else {
        return Vec::new();
    };

    let mut matched: Vec<String> = Vec::new();

    if tool_lists_id(&tools.adb, serial) {
        classification
            .notes
            .push("Correlated: adb device id matches USB serial".to_string());
        if classification.mode == DeviceMode::UnknownUsb {
            classification.mode = DeviceMode::AndroidAdbConfirmed;
        }
        push_unique(&mut matched, serial);
    }

    if tool_lists_id(&tools.fastboot, serial) {
        classification
            .notes
            .push("Correlated: fastboot device id matches USB serial".to_string());
        classification.mode = DeviceMode::AndroidFastbootConfirmed;
        push_unique(&mut matched, serial);
    }

    if tool_lists_id(&tools.idevice_id, serial) {
        classification
            .notes
            .push("Correlated: idevice_id UDID matches USB serial".to_string());
        push_unique(&mut matched, serial);
    }

    if !matched.is_empty() {
        classification.boost(SERIAL_MATCH_BOOST);
    }

    matched
}

/// Fallback when no serial match occurred: exactly one transport of the
/// tool's platform family in the scan and exactly one reported id are
/// treated as the same device, at a fixed override confidence. Explicitly
/// a heuristic, not a certainty.
fn correlate_sole_candidate(
    classification: &mut Classification,
    scan_modes: &[DeviceMode],
    tools: &ToolEvidenceSet,
) -> Vec<String> {
    let family = classification.mode.platform_hint();
    let family_count = scan_modes
        .iter()
        .filter(|mode| mode.platform_hint() == family)
        .count();
    if family_count != 1 {
        return Vec::new();
    }

    match family {
        PlatformHint::Android => {
            for (evidence, tool_name) in [(&tools.adb, "adb"), (&tools.fastboot, "fastboot")] {
                if let Some(sole_id) = sole_device_id(evidence) {
                    classification.notes.push(format!(
                        "Heuristic: sole Android candidate paired with sole {} device id {}",
                        tool_name, sole_id
                    ));
                    classification.override_confidence(ANDROID_SOLE_CANDIDATE_CONFIDENCE);
                    return vec![sole_id];
                }
            }
            Vec::new()
        }
        PlatformHint::Ios => {
            if let Some(sole_id) = sole_device_id(&tools.idevice_id) {
                classification.notes.push(format!(
                    "Heuristic: sole iOS candidate paired with sole idevice_id UDID {}",
                    sole_id
                ));
                classification.override_confidence(IOS_SOLE_CANDIDATE_CONFIDENCE);
                return vec![sole_id];
            }
            Vec::new()
        }
        PlatformHint::Unknown => Vec::new(),
    }
}

fn tool_lists_id(evidence: &ToolEvidence, id: &str) -> bool {
    evidence.present && evidence.device_ids.iter().any(|candidate| candidate == id)
}

fn sole_device_id(evidence: &ToolEvidence) -> Option<String> {
    match evidence.device_ids.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    }
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}
