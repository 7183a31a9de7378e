use pandora_core::{InterfaceTriplet, TransportEvidence};
use rusb::{Context, Device, UsbContext};
use thiserror::Error;

/// The only fatal failure of this stage: the USB enumeration facility
/// itself could not be brought up. Callers treat this as "no transports
/// observed", not as a crash.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("usb subsystem initialization failed: {0}")]
    Init(#[from] rusb::Error),
}

/// Enumerate attached USB devices and extract raw transport evidence.
///
/// Per-device failures are non-fatal: a device whose core descriptor
/// cannot be read is skipped; a device whose string descriptors cannot
/// be read is kept with those fields absent. Read-only, no device state
/// is altered.
pub fn probe_transports() -> Result<Vec<TransportEvidence>, TransportError> {
    let context = Context::new()?;
    let devices = context.devices()?;

    let mut results = Vec::new();
    for device in devices.iter() {
        if let Some(evidence) = extract_transport_evidence(&device) {
            results.push(evidence);
        }
    }
    Ok(results)
}

fn extract_transport_evidence<T: UsbContext>(device: &Device<T>) -> Option<TransportEvidence> {
    let descriptor = device.device_descriptor().ok()?;
    let bus = device.bus_number();
    let address = device.address();

    // String descriptors need an open handle; devices we cannot open
    // still yield evidence, just without the optional strings.
    let handle = device.open().ok();

    let serial = handle
        .as_ref()
        .and_then(|h| h.read_serial_number_string_ascii(&descriptor).ok())
        .filter(|s| !s.is_empty());
    let manufacturer = handle
        .as_ref()
        .and_then(|h| h.read_manufacturer_string_ascii(&descriptor).ok())
        .filter(|s| !s.is_empty());
    let product = handle
        .as_ref()
        .and_then(|h| h.read_product_string_ascii(&descriptor).ok())
        .filter(|s| !s.is_empty());

    let interfaces = read_interfaces(device);

    Some(TransportEvidence {
        vendor_id: descriptor.vendor_id(),
        product_id: descriptor.product_id(),
        bus,
        address,
        serial,
        manufacturer,
        product,
        interfaces,
    })
}

/// All interface descriptor triplets of the active configuration, in
/// descriptor order. Missing configuration descriptors yield an empty
/// sequence, not a skipped device.
fn read_interfaces<T: UsbContext>(device: &Device<T>) -> Vec<InterfaceTriplet> {
    let Ok(config) = device.config_descriptor(0) else {
        return Vec::new();
    };
    let mut triplets = Vec::new();
    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            triplets.push(InterfaceTriplet {
                class: descriptor.class_code(),
                subclass: descriptor.sub_class_code(),
                protocol: descriptor.protocol_code(),
            });
        }
    }
    triplets
}
