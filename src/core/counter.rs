use crate::core::error::SubprocessError;
use crate::core::external::CommandRunner;
use crate::core::model::YesNo;
use std::path::{Path, PathBuf};

/// Bit flag of secondary alignments in the SAM FLAG field.
pub const SECONDARY_FLAG: &str = "0x100";

pub trait AlignmentCounter {
    /// Number of primary alignments in `alignments`.
    fn count_primary(&self, alignments: &Path) -> Result<u64, SubprocessError>;
}

pub struct SamtoolsCounter<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> SamtoolsCounter<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> AlignmentCounter for SamtoolsCounter<R> {
    fn count_primary(&self, alignments: &Path) -> Result<u64, SubprocessError> {
        let path = alignments.to_string_lossy();
        let out = self.runner.run(
            "samtools",
            &["view", "-c", "-S", "-F", SECONDARY_FLAG, path.as_ref()],
        )?;
        if !out.success {
            return Err(SubprocessError::new(
                "samtools",
                format!("view exited with an error: {}", out.stderr.trim()),
            ));
        }
        parse_count(&out.stdout)
    }
}

pub fn parse_count(stdout: &str) -> Result<u64, SubprocessError> {
    let s = stdout.trim();
    s.parse::<u64>().map_err(|_| {
        SubprocessError::new(
            "samtools",
            format!("could not parse total alignment count from '{}'", s),
        )
    })
}

/// The SAM file that holds the alignments to count.
///
/// BAM input, and galaxy runs whose conversion happened upstream, were
/// already converted to `<tmp_folder>/input.sam`.
pub fn resolve_sam(input: &Path, galaxy: YesNo, galaxysam: YesNo, tmp_folder: &Path) -> PathBuf {
    let is_bam = input
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext == "bam");
    if is_bam || (galaxy.is_yes() && !galaxysam.is_yes()) {
        tmp_folder.join("input.sam")
    } else {
        input.to_path_buf()
    }
}
