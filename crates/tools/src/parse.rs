//! Fixed line-oriented parsers for the three tool invocations.
//! The contracts are not user-configurable: `adb devices -l`,
//! `fastboot devices`, `idevice_id -l`.

/// Serials from `adb devices -l` output. The header line is skipped;
/// a line counts only when its state token is one adb reports for a
/// reachable device (device, recovery, sideload). `unauthorized` and
/// `offline` devices are deliberately excluded: their serials are shown
/// but the device is not usable for correlation.
pub fn parse_adb_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with("List of devices") {
                return None;
            }
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            match state {
                "device" | "recovery" | "sideload" => Some(serial.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Serials from `fastboot devices` output: first whitespace-delimited
/// token of each non-empty line.
pub fn parse_fastboot_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            line.split_whitespace().next().map(|token| token.to_string())
        })
        .collect()
}

/// UDIDs from `idevice_id -l` output: one per non-empty line, verbatim.
pub fn parse_idevice_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}
