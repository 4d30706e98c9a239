use crate::core::error::SubprocessError;
use std::path::Path;
use std::process::Command;

/// Captured result of an external program.
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the pipeline and the operating system's process table.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SubprocessError>;
}

pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SubprocessError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| SubprocessError::new(program, format!("could not start: {}", e)))?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Downloads a remote asset to a local path.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), SubprocessError>;
}

pub struct WgetFetcher<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> WgetFetcher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> Fetcher for WgetFetcher<R> {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), SubprocessError> {
        let dest_str = dest.to_string_lossy();
        let out = self
            .runner
            .run("wget", &["--quiet", "-O", dest_str.as_ref(), url])?;
        if !out.success {
            return Err(SubprocessError::new(
                "wget",
                format!("could not download {}: {}", url, out.stderr.trim()),
            ));
        }
        Ok(())
    }
}
