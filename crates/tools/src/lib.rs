pub mod parse;
pub mod runner;

use pandora_core::{ToolEvidence, ToolEvidenceSet};
use std::time::Duration;

pub use runner::{CommandOutput, CommandRunner, SystemRunner};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Which external tools a scan is allowed to probe. A disabled tool is
/// reported as the missing state.
#[derive(Debug, Clone, Copy)]
pub struct ToolSelection {
    pub adb: bool,
    pub fastboot: bool,
    pub idevice_id: bool,
}

impl Default for ToolSelection {
    fn default() -> Self {
        Self {
            adb: true,
            fastboot: true,
            idevice_id: true,
        }
    }
}

/// Probe `adb devices -l` for attached device serials.
pub fn probe_adb(runner: &dyn CommandRunner, timeout: Duration) -> ToolEvidence {
    probe_tool(runner, "adb", &["devices", "-l"], timeout, parse::parse_adb_ids)
}

/// Probe `fastboot devices` for attached device serials.
pub fn probe_fastboot(runner: &dyn CommandRunner, timeout: Duration) -> ToolEvidence {
    probe_tool(runner, "fastboot", &["devices"], timeout, parse::parse_fastboot_ids)
}

/// Probe `idevice_id -l` for attached iOS UDIDs.
pub fn probe_idevice_id(runner: &dyn CommandRunner, timeout: Duration) -> ToolEvidence {
    probe_tool(runner, "idevice_id", &["-l"], timeout, parse::parse_idevice_ids)
}

/// Collect the full per-scan tool evidence set. The three probes share
/// no state; each runs under its own timeout. Failures degrade the
/// individual tool's evidence, never the scan.
pub fn probe_enabled_tools(
    runner: &dyn CommandRunner,
    selection: &ToolSelection,
    timeout: Duration,
) -> ToolEvidenceSet {
    ToolEvidenceSet {
        adb: if selection.adb {
            probe_adb(runner, timeout)
        } else {
            ToolEvidence::missing()
        },
        fastboot: if selection.fastboot {
            probe_fastboot(runner, timeout)
        } else {
            ToolEvidence::missing()
        },
        idevice_id: if selection.idevice_id {
            probe_idevice_id(runner, timeout)
        } else {
            ToolEvidence::missing()
        },
    }
}

fn probe_tool(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    timeout: Duration,
    parser: fn(&str) -> Vec<String>,
) -> ToolEvidence {
    if !runner.locate(program) {
        return ToolEvidence::missing();
    }

    match runner.run(program, args, timeout) {
        Ok(output) => {
            let raw = format!(
                "STDOUT:\n{}\nSTDERR:\n{}",
                output.stdout.trim(),
                output.stderr.trim()
            );
            if output.timed_out {
                return ToolEvidence::present_not_seen(format!(
                    "timed out after {}s\n{}",
                    timeout.as_secs(),
                    raw
                ));
            }
            if !output.success {
                return ToolEvidence::present_not_seen(raw);
            }
            ToolEvidence::confirmed(raw, parser(&output.stdout))
        }
        Err(err) => ToolEvidence::present_not_seen(format!("error: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    /// Fake runner: canned availability and outputs, no processes.
    struct FakeRunner {
        outputs: HashMap<&'static str, CommandOutput>,
    }

    impl FakeRunner {
        fn new() -> Self {
            Self {
                outputs: HashMap::new(),
            }
        }

        fn with_output(mut self, program: &'static str, stdout: &str) -> Self {
            self.outputs.insert(
                program,
                CommandOutput {
                    success: true,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    timed_out: false,
                },
            );
            self
        }

        fn with_raw(mut self, program: &'static str, output: CommandOutput) -> Self {
            self.outputs.insert(program, output);
            self
        }
    }

    impl CommandRunner for FakeRunner {
        fn locate(&self, program: &str) -> bool {
            self.outputs.contains_key(program)
        }

        fn run(
            &self,
            program: &str,
            _args: &[&str],
            _timeout: Duration,
        ) -> io::Result<CommandOutput> {
            self.outputs
                .get(program)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "not installed"))
        }
    }

    #[test]
    fn missing_tool_yields_missing_state() {
        let runner = FakeRunner::new();
        let evidence = probe_adb(&runner, DEFAULT_TOOL_TIMEOUT);
        assert!(!evidence.present);
        assert!(!evidence.seen);
        assert!(evidence.device_ids.is_empty());
    }

    #[test]
    fn adb_listing_is_parsed_into_evidence() {
        let runner =
            FakeRunner::new().with_output("adb", "List of devices attached\nABC123\tdevice\n");
        let evidence = probe_adb(&runner, DEFAULT_TOOL_TIMEOUT);
        assert!(evidence.present);
        assert!(evidence.seen);
        assert_eq!(evidence.device_ids, vec!["ABC123"]);
        assert!(evidence.raw.contains("ABC123"));
    }

    #[test]
    fn empty_listing_is_present_but_not_seen() {
        let runner = FakeRunner::new().with_output("fastboot", "");
        let evidence = probe_fastboot(&runner, DEFAULT_TOOL_TIMEOUT);
        assert!(evidence.present);
        assert!(!evidence.seen);
        assert!(evidence.device_ids.is_empty());
    }

    #[test]
    fn nonzero_exit_degrades_to_present_not_seen() {
        let runner = FakeRunner::new().with_raw(
            "adb",
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: "daemon not running".to_string(),
                timed_out: false,
            },
        );
        let evidence = probe_adb(&runner, DEFAULT_TOOL_TIMEOUT);
        assert!(evidence.present);
        assert!(!evidence.seen);
        assert!(evidence.raw.contains("daemon not running"));
    }

    #[test]
    fn timeout_degrades_to_present_not_seen() {
        let runner = FakeRunner::new().with_raw(
            "idevice_id",
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: String::new(),
                timed_out: true,
            },
        );
        let evidence = probe_idevice_id(&runner, DEFAULT_TOOL_TIMEOUT);
        assert!(evidence.present);
        assert!(!evidence.seen);
        assert!(evidence.raw.contains("timed out"));
    }

    #[test]
    fn disabled_tools_report_missing() {
        let runner =
            FakeRunner::new().with_output("adb", "List of devices attached\nABC123\tdevice\n");
        let selection = ToolSelection {
            adb: false,
            fastboot: false,
            idevice_id: false,
        };
        let set = probe_enabled_tools(&runner, &selection, DEFAULT_TOOL_TIMEOUT);
        assert!(!set.adb.present);
        assert!(!set.fastboot.present);
        assert!(!set.idevice_id.present);
    }

    #[test]
    fn enabled_tools_probe_independently() {
        let runner = FakeRunner::new()
            .with_output("adb", "List of devices attached\nABC123\tdevice\n")
            .with_output("idevice_id", "00008030-001A3D2A1E38001E\n");
        let set = probe_enabled_tools(&runner, &ToolSelection::default(), DEFAULT_TOOL_TIMEOUT);
        assert!(set.adb.seen);
        assert!(!set.fastboot.present);
        assert_eq!(set.idevice_id.device_ids.len(), 1);
    }
}
