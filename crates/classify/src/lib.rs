use pandora_core::{Classification, DeviceMode, TransportEvidence};

const APPLE_VID: u16 = 0x05ac;
const APPLE_PID_DFU: u16 = 0x1227;
const APPLE_PID_RECOVERY: u16 = 0x1281;
const APPLE_PIDS_NORMAL: [u16; 2] = [0x12a8, 0x12ab];
const GOOGLE_PID_FASTBOOT: u16 = 0x4ee0;

/// USB interface class 0xFF (vendor-specific) is how Android devices
/// expose ADB and Fastboot endpoints.
const VENDOR_SPECIFIC_CLASS: u8 = 0xff;

/// Known Android OEM vendor ids, mapped to names for rationale notes.
const ANDROID_VENDORS: [(u16, &str); 15] = [
    (0x18d1, "Google"),
    (0x04e8, "Samsung"),
    (0x2a70, "OnePlus"),
    (0x2717, "Xiaomi"),
    (0x0bb4, "HTC"),
    (0x12d1, "Huawei"),
    (0x0fce, "Sony"),
    (0x19d2, "ZTE"),
    (0x1004, "LG"),
    (0x0e8d, "MediaTek"),
    (0x2a45, "Meizu"),
    (0x1ebf, "ASUS"),
    (0x0502, "Acer"),
    (0x1782, "Lenovo"),
    (0x22b8, "Motorola"),
];

pub fn android_vendor_name(vendor_id: u16) -> Option<&'static str> {
    ANDROID_VENDORS
        .iter()
        .find(|(vid, _)| *vid == vendor_id)
        .map(|(_, name)| *name)
}

/// Map one transport to a platform/mode verdict with a confidence score.
///
/// Deterministic and total: an unrecognized device yields `unknown_usb`
/// at low confidence, never an error. Confidence bands: known
/// vendor+product 0.80-0.90, vendor plus interface hint 0.70-0.85,
/// nothing recognized 0.50-0.60; ambiguity resolves to the low end.
pub fn classify(transport: &TransportEvidence) -> Classification {
    if transport.vendor_id == APPLE_VID {
        return classify_apple(transport);
    }
    if let Some(oem) = android_vendor_name(transport.vendor_id) {
        return classify_android(transport, oem);
    }
    Classification::new(
        DeviceMode::UnknownUsb,
        0.50,
        vec!["USB device detected but not recognized as a mobile device".to_string()],
    )
}

fn classify_apple(transport: &TransportEvidence) -> Classification {
    let pid = transport.product_id;
    match pid {
        APPLE_PID_DFU => Classification::new(
            DeviceMode::IosDfuLikely,
            0.86,
            vec![
                "USB signature matches Apple DFU mode (VID:05AC PID:1227)".to_string(),
                "Confirm visually: screen stays black in DFU".to_string(),
            ],
        ),
        APPLE_PID_RECOVERY => Classification::new(
            DeviceMode::IosRecoveryLikely,
            0.86,
            vec![
                "USB signature matches Apple Recovery mode (VID:05AC PID:1281)".to_string(),
                "Device should show the recovery screen".to_string(),
            ],
        ),
        pid if APPLE_PIDS_NORMAL.contains(&pid) => Classification::new(
            DeviceMode::IosNormalLikely,
            0.80,
            vec![
                format!("USB signature matches iOS device in normal mode (VID:05AC PID:{:04x})", pid),
                "Use idevice_id to confirm the connection".to_string(),
            ],
        ),
        _ => {
            let ios_product = transport
                .product
                .as_deref()
                .map(|p| p.contains("iPhone") || p.contains("iPad"))
                .unwrap_or(false);
            if ios_product {
                Classification::new(
                    DeviceMode::IosNormalLikely,
                    0.70,
                    vec![format!(
                        "Apple device with unknown PID:{:04x} but product string suggests iOS",
                        pid
                    )],
                )
            } else {
                Classification::new(
                    DeviceMode::UnknownUsb,
                    0.55,
                    vec![format!("Apple device with unrecognized PID:{:04x}", pid)],
                )
            }
        }
    }
}

fn classify_android(transport: &TransportEvidence, oem: &str) -> Classification {
    let product = transport.product.as_deref().unwrap_or("");
    let fastboot_product = product.to_ascii_lowercase().contains("fastboot");

    if fastboot_product
        || (transport.vendor_id == 0x18d1 && transport.product_id == GOOGLE_PID_FASTBOOT)
    {
        return Classification::new(
            DeviceMode::AndroidFastbootConfirmed,
            0.80,
            vec![
                format!("{} device advertising fastboot", oem),
                "Confirm with 'fastboot devices'".to_string(),
            ],
        );
    }

    if transport.has_interface_class(VENDOR_SPECIFIC_CLASS) {
        if product.to_ascii_lowercase().contains("recovery") {
            return Classification::new(
                DeviceMode::AndroidRecoveryAdbConfirmed,
                0.72,
                vec![
                    format!("{} device in recovery exposing an ADB interface", oem),
                    "Confirm with 'adb devices' (state: recovery)".to_string(),
                ],
            );
        }
        return Classification::new(
            DeviceMode::AndroidAdbConfirmed,
            0.75,
            vec![
                "USB interface class 0xFF suggests ADB interface".to_string(),
                format!("Vendor id matches {}", oem),
                "Confirm with 'adb devices'".to_string(),
            ],
        );
    }

    Classification::new(
        DeviceMode::UnknownUsb,
        0.60,
        vec![format!(
            "{} vendor id detected but mode unclear; run adb/fastboot to confirm",
            oem
        )],
    )
}
