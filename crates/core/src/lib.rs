use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

pub const SCAN_SCHEMA_VERSION: &str = "1.0.0";

/// One physical USB connection observed during a single enumeration pass.
/// Created fresh on every scan, never mutated, never persisted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransportEvidence {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus: u8,
    pub address: u8,
    pub serial: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub interfaces: Vec<InterfaceTriplet>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceTriplet {
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

impl TransportEvidence {
    /// Fallback identity when the device exposes no serial string.
    /// Unstable across reconnect: bus/address change on replug.
    pub fn transport_key(&self) -> String {
        format!(
            "usb:{:04x}:{:04x}:bus{}:addr{}",
            self.vendor_id, self.product_id, self.bus, self.address
        )
    }

    pub fn has_interface_class(&self, class: u8) -> bool {
        self.interfaces.iter().any(|iface| iface.class == class)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    AndroidAdbConfirmed,
    AndroidFastbootConfirmed,
    AndroidRecoveryAdbConfirmed,
    IosNormalLikely,
    IosDfuLikely,
    IosRecoveryLikely,
    UnknownUsb,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlatformHint {
    Android,
    Ios,
    Unknown,
}

impl DeviceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMode::AndroidAdbConfirmed => "android_adb_confirmed",
            DeviceMode::AndroidFastbootConfirmed => "android_fastboot_confirmed",
            DeviceMode::AndroidRecoveryAdbConfirmed => "android_recovery_adb_confirmed",
            DeviceMode::IosNormalLikely => "ios_normal_likely",
            DeviceMode::IosDfuLikely => "ios_dfu_likely",
            DeviceMode::IosRecoveryLikely => "ios_recovery_likely",
            DeviceMode::UnknownUsb => "unknown_usb",
        }
    }

    pub fn platform_hint(&self) -> PlatformHint {
        match self {
            DeviceMode::AndroidAdbConfirmed
            | DeviceMode::AndroidFastbootConfirmed
            | DeviceMode::AndroidRecoveryAdbConfirmed => PlatformHint::Android,
            DeviceMode::IosNormalLikely
            | DeviceMode::IosDfuLikely
            | DeviceMode::IosRecoveryLikely => PlatformHint::Ios,
            DeviceMode::UnknownUsb => PlatformHint::Unknown,
        }
    }
}

impl PlatformHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformHint::Android => "android",
            PlatformHint::Ios => "ios",
            PlatformHint::Unknown => "unknown",
        }
    }
}

/// Platform/mode verdict for one transport. Created by the classifier,
/// adjusted at most once more by the resolver, frozen at assembly.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Classification {
    pub mode: DeviceMode,
    pub confidence: f32,
    pub notes: Vec<String>,
}

impl Classification {
    pub fn new(mode: DeviceMode, confidence: f32, notes: Vec<String>) -> Self {
        Self {
            mode,
            confidence: confidence.clamp(0.0, 1.0),
            notes,
        }
    }

    /// Add a confidence increment, keeping the result inside [0.0, 1.0].
    pub fn boost(&mut self, delta: f32) {
        self.confidence = (self.confidence + delta).clamp(0.0, 1.0);
    }

    /// Replace the confidence outright (single-candidate overrides).
    pub fn override_confidence(&mut self, value: f32) {
        self.confidence = value.clamp(0.0, 1.0);
    }
}

/// Result of probing one external tool for attached devices.
/// Three instances exist per scan (adb, fastboot, idevice_id), shared
/// read-only across all transports during correlation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolEvidence {
    pub present: bool,
    pub seen: bool,
    pub raw: String,
    pub device_ids: Vec<String>,
}

impl ToolEvidence {
    /// Tool binary not resolvable on the system path.
    pub fn missing() -> Self {
        Self {
            present: false,
            seen: false,
            raw: "missing".to_string(),
            device_ids: Vec::new(),
        }
    }

    /// Tool exists but errored, timed out, or reported nothing usable.
    pub fn present_not_seen(raw: String) -> Self {
        Self {
            present: true,
            seen: false,
            raw,
            device_ids: Vec::new(),
        }
    }

    pub fn confirmed(raw: String, device_ids: Vec<String>) -> Self {
        let seen = !device_ids.is_empty();
        Self {
            present: true,
            seen,
            raw,
            device_ids,
        }
    }
}

/// The three per-scan tool probes, keyed by tool name in the output.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolEvidenceSet {
    pub adb: ToolEvidence,
    pub fastboot: ToolEvidence,
    pub idevice_id: ToolEvidence,
}

impl ToolEvidenceSet {
    pub fn all_missing() -> Self {
        Self {
            adb: ToolEvidence::missing(),
            fastboot: ToolEvidence::missing(),
            idevice_id: ToolEvidence::missing(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EvidenceBundle {
    pub transport: TransportEvidence,
    pub tools: ToolEvidenceSet,
}

/// The pipeline's output unit: one classified, correlated, scored device.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConfirmedDeviceRecord {
    pub device_uid: String,
    pub platform_hint: PlatformHint,
    pub mode: DeviceMode,
    pub confidence: f32,
    pub evidence: EvidenceBundle,
    pub notes: Vec<String>,
    pub matched_tool_ids: Vec<String>,
}

/// Envelope around one scan's records. Nothing here persists between
/// scans; every call produces a fresh report.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub schema_version: String,
    pub generated_at_utc: String,
    pub devices: Vec<ConfirmedDeviceRecord>,
}

impl ScanReport {
    pub fn new(devices: Vec<ConfirmedDeviceRecord>) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            schema_version: SCAN_SCHEMA_VERSION.to_string(),
            generated_at_utc: now_utc_rfc3339(),
            devices,
        }
    }
}

pub fn now_utc_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_key_is_padded_lowercase_hex() {
        let transport = TransportEvidence {
            vendor_id: 0x18d1,
            product_id: 0x4ee7,
            bus: 1,
            address: 7,
            serial: None,
            manufacturer: None,
            product: None,
            interfaces: vec![],
        };
        assert_eq!(transport.transport_key(), "usb:18d1:4ee7:bus1:addr7");
    }

    #[test]
    fn transport_key_pads_short_ids() {
        let transport = TransportEvidence {
            vendor_id: 0x04e8,
            product_id: 0x001f,
            bus: 2,
            address: 3,
            serial: None,
            manufacturer: None,
            product: None,
            interfaces: vec![],
        };
        assert_eq!(transport.transport_key(), "usb:04e8:001f:bus2:addr3");
    }

    #[test]
    fn boost_clamps_to_one() {
        let mut classification = Classification::new(DeviceMode::AndroidAdbConfirmed, 0.95, vec![]);
        classification.boost(0.15);
        assert_eq!(classification.confidence, 1.0);
    }

    #[test]
    fn override_clamps_into_unit_interval() {
        let mut classification = Classification::new(DeviceMode::UnknownUsb, 0.5, vec![]);
        classification.override_confidence(1.4);
        assert_eq!(classification.confidence, 1.0);
        classification.override_confidence(-0.2);
        assert_eq!(classification.confidence, 0.0);
    }

    #[test]
    fn missing_tool_evidence_is_not_present_and_not_seen() {
        let evidence = ToolEvidence::missing();
        assert!(!evidence.present);
        assert!(!evidence.seen);
        assert!(evidence.device_ids.is_empty());
    }

    #[test]
    fn confirmed_with_no_ids_is_present_but_not_seen() {
        let evidence = ToolEvidence::confirmed("STDOUT:\n\nSTDERR:\n".to_string(), vec![]);
        assert!(evidence.present);
        assert!(!evidence.seen);
    }

    #[test]
    fn mode_strings_are_lower_snake_case() {
        assert_eq!(DeviceMode::AndroidAdbConfirmed.as_str(), "android_adb_confirmed");
        assert_eq!(DeviceMode::IosDfuLikely.as_str(), "ios_dfu_likely");
        assert_eq!(DeviceMode::UnknownUsb.as_str(), "unknown_usb");
    }

    #[test]
    fn platform_hint_families() {
        assert_eq!(DeviceMode::AndroidFastbootConfirmed.platform_hint(), PlatformHint::Android);
        assert_eq!(DeviceMode::IosRecoveryLikely.platform_hint(), PlatformHint::Ios);
        assert_eq!(DeviceMode::UnknownUsb.platform_hint(), PlatformHint::Unknown);
    }

    #[test]
    fn record_serializes_with_snake_case_mode() {
        let transport = TransportEvidence {
            vendor_id: 0x05ac,
            product_id: 0x1227,
            bus: 1,
            address: 4,
            serial: None,
            manufacturer: Some("Apple Inc.".to_string()),
            product: None,
            interfaces: vec![],
        };
        let record = ConfirmedDeviceRecord {
            device_uid: transport.transport_key(),
            platform_hint: PlatformHint::Ios,
            mode: DeviceMode::IosDfuLikely,
            confidence: 0.86,
            evidence: EvidenceBundle {
                transport,
                tools: ToolEvidenceSet::all_missing(),
            },
            notes: vec![],
            matched_tool_ids: vec![],
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["mode"], "ios_dfu_likely");
        assert_eq!(json["platform_hint"], "ios");
        assert_eq!(json["evidence"]["tools"]["adb"]["present"], false);
    }
}
