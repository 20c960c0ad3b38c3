use super::metrics::{parse_value, EXPECTED_ARGUMENT_COUNT};
use super::Simulator;
use crate::types::RenderMode;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Executable name the simulator build produces on this platform.
pub fn default_program() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("./strategy-simulation.exe")
    } else {
        PathBuf::from("./strategy-simulation")
    }
}

/// Command that rebuilds the simulator from source before the run.
#[derive(Clone, Debug)]
pub struct SimulatorBuild {
    command: Vec<String>,
    working_dir: PathBuf,
}

impl SimulatorBuild {
    pub fn new(command: Vec<String>, working_dir: impl AsRef<Path>) -> Self {
        Self {
            command,
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    /// Run the build. Failure is reported but never fatal: a previously built
    /// executable is used instead.
    pub fn run(&self) -> bool {
        let Some((program, args)) = self.command.split_first() else {
            return false;
        };

        info!(command = %self.command.join(" "), "building simulator");
        match Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .output()
        {
            Ok(output) if output.status.success() => {
                info!("✓ Simulator built");
                true
            }
            Ok(output) => {
                warn!(
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "simulator build failed, using existing binary"
                );
                false
            }
            Err(e) => {
                warn!(
                    "could not run '{}' ({}), ensure the toolchain is installed; \
                     using existing binary",
                    program, e
                );
                false
            }
        }
    }
}

/// Simulator running as a child process, one launch per evaluation.
#[derive(Clone, Debug)]
pub struct ProcessSimulator {
    program: PathBuf,
    leading_args: Vec<String>,
    working_dir: PathBuf,
}

impl ProcessSimulator {
    pub fn new(program: impl AsRef<Path>, working_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            leading_args: Vec::new(),
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    /// Tokens placed before the parameter vector (e.g. `run .` for `go run .`).
    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    /// Launch with the given tokens and capture stdout, blocking until exit.
    fn run(&self, args: &[String]) -> String {
        let output = match Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .current_dir(&self.working_dir)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to execute {}: {}", self.program.display(), e);
                return String::new();
            }
        };

        if !output.status.success() {
            warn!(
                status = %output.status,
                "simulator exited abnormally"
            );
        }

        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

impl Simulator for ProcessSimulator {
    fn invoke(&self, params: &[f64], render: &RenderMode) -> String {
        let mut args: Vec<String> = params.iter().map(|v| v.to_string()).collect();
        args.push(render.as_arg().to_string());
        self.run(&args)
    }

    fn expected_args(&self) -> Result<usize, String> {
        let output = self.run(&[]);
        parse_value::<usize>(EXPECTED_ARGUMENT_COUNT, &output).map_err(|e| {
            format!(
                "Could not determine the expected argument count from {}: {}",
                self.program.display(),
                e
            )
        })
    }
}
