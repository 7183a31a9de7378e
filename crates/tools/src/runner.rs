use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Captured result of one bounded external command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Injected capability for locating and executing external tools, so
/// the collector can be tested without spawning real processes.
/// Arguments are fixed by the probes; nothing user-derived reaches a
/// shell through this seam.
pub trait CommandRunner {
    /// Whether the program is resolvable on the system path.
    fn locate(&self, program: &str) -> bool;

    /// Execute the program with the given arguments, abandoning it once
    /// the timeout expires.
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> io::Result<CommandOutput>;
}

/// Production runner backed by std::process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

impl CommandRunner for SystemRunner {
    fn locate(&self, program: &str) -> bool {
        #[cfg(target_os = "windows")]
        let which_cmd = "where";
        #[cfg(not(target_os = "windows"))]
        let which_cmd = "which";

        Command::new(which_cmd)
            .arg(program)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> io::Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes while the child runs. A tool whose output
        // exceeds the OS pipe buffer would otherwise block on write,
        // hit the deadline, and be misreported as timed out.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let (success, timed_out) = loop {
            if let Some(status) = child.try_wait()? {
                break (status.success(), false);
            }
            if Instant::now() >= deadline {
                // Abandon the probe: an unresponsive tool must not
                // block the scan.
                let _ = child.kill();
                let _ = child.wait();
                break (false, true);
            }
            thread::sleep(POLL_INTERVAL);
        };

        // The readers finish once the child's pipe ends close (exit or
        // kill), so these joins cannot hang.
        let stdout = join_pipe_reader(stdout_reader);
        let stderr = join_pipe_reader(stderr_reader);
        Ok(CommandOutput {
            success,
            stdout,
            stderr,
            timed_out,
        })
    }
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> Option<thread::JoinHandle<String>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = String::new();
            let _ = pipe.read_to_string(&mut buffer);
            buffer
        })
    })
}

fn join_pipe_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
