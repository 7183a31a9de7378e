use anyhow::Result;
use pandora_engine::{run_scan, ScanOptions};
use pandora_tools::{probe_enabled_tools, SystemRunner, ToolSelection};
use std::time::Duration;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "scan" => {
            let pretty = args.iter().any(|arg| arg == "--pretty");
            let options = scan_options(&args);
            let report = run_scan(&options, &SystemRunner)?;
            if pretty {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", serde_json::to_string(&report)?);
            }
            Ok(())
        }
        "tools" => {
            let options = scan_options(&args);
            let set = probe_enabled_tools(&SystemRunner, &options.tools, options.tool_timeout);
            println!("{}", serde_json::to_string_pretty(&set)?);
            Ok(())
        }
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn scan_options(args: &[String]) -> ScanOptions {
    let tools = ToolSelection {
        adb: !args.iter().any(|arg| arg == "--no-adb"),
        fastboot: !args.iter().any(|arg| arg == "--no-fastboot"),
        idevice_id: !args.iter().any(|arg| arg == "--no-idevice"),
    };
    let tool_timeout = arg_value(args, "--timeout-secs")
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(pandora_tools::DEFAULT_TOOL_TIMEOUT);
    ScanOptions { tools, tool_timeout }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

fn print_help() {
    eprintln!("Pandora CLI");
    eprintln!("  scan [--pretty] [--no-adb] [--no-fastboot] [--no-idevice] [--timeout-secs <n>]");
    eprintln!("  tools [--no-adb] [--no-fastboot] [--no-idevice] [--timeout-secs <n>]");
}
