use crate::cli::args::Cli;
use crate::core::error::ConfigError;
use crate::core::model::{OffsetSource, RpfPlotTool, YesNo};
use std::path::{Path, PathBuf};

pub const DEFAULT_SAMFILE: &str = "STAR/fastq1/untreat.sam";
pub const DEFAULT_OUTFOLDER: &str = "mappingQC_output";
pub const DEFAULT_OUTHTML: &str = "mQC.html";
pub const DEFAULT_OUTZIP: &str = "mQC.zip";
pub const DEFAULT_ARCHIVE: &str = "mQC_archive";

/// Fully resolved run configuration. Every path is absolute or relative to
/// the process working directory; no stage looks at raw arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    pub work_dir: PathBuf,
    pub input_samfile: PathBuf,
    /// The sam/bam argument as given, shown in the report.
    pub input_samfile_label: String,
    pub exp_name: String,
    pub outfolder: PathBuf,
    pub outhtml: PathBuf,
    pub outzip: PathBuf,
    pub archive_name: String,
    pub offset_source: OffsetSource,
    pub plastid_img: Option<PathBuf>,
    pub ensembl_db: String,
    pub ensembl_version: String,
    pub unique: YesNo,
    pub rpf_tool: RpfPlotTool,
    pub tmp_folder: PathBuf,
    pub species: String,
    pub galaxy: YesNo,
    pub galaxysam: YesNo,
}

impl ReportConfig {
    /// Validates `cli`, resolving relative paths against the working
    /// directory (itself relative to `cwd`).
    pub fn from_cli(cli: &Cli, cwd: &Path) -> Result<Self, ConfigError> {
        let galaxy = yes_no("galaxy", set(&cli.galaxy), YesNo::No)?;
        let galaxysam = yes_no("galaxysam", set(&cli.galaxysam), YesNo::Yes)?;

        let work_dir = match set(&cli.work_dir) {
            Some(w) => cwd.join(w),
            None => cwd.to_path_buf(),
        };
        let resolve = |v: &Option<String>, default: &str| -> PathBuf {
            work_dir.join(set(v).unwrap_or(default))
        };

        let tmp_folder = resolve(&cli.tmp_folder, "tmp");
        let input_samfile = resolve(&cli.input_samfile, DEFAULT_SAMFILE);
        let input_samfile_label = set(&cli.input_samfile)
            .unwrap_or(DEFAULT_SAMFILE)
            .to_string();
        let exp_name = required("exp_name", &cli.exp_name)?;
        let outfolder = resolve(&cli.outfolder, DEFAULT_OUTFOLDER);

        let outhtml = resolve(&cli.outhtml, DEFAULT_OUTHTML);
        match file_name(&outhtml) {
            Some(name) if name.ends_with(".html") || name.ends_with(".dat") => {}
            _ => {
                return Err(ConfigError::Invalid {
                    field: "outhtml",
                    message: format!(
                        "could not extract html file name out of given path ({})",
                        outhtml.display()
                    ),
                });
            }
        }

        let outzip = resolve(&cli.outzip, DEFAULT_OUTZIP);
        let zip_name = file_name(&outzip).ok_or_else(|| ConfigError::Invalid {
            field: "outzip",
            message: format!(
                "could not extract zip file name out of given path ({})",
                outzip.display()
            ),
        })?;
        let archive_name = archive_name(&zip_name);

        let offset_source = match set(&cli.plastid_option) {
            None | Some("standard") => OffsetSource::Standard,
            Some("plastid") => OffsetSource::Plastid,
            Some("from_file") => OffsetSource::FromFile,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    field: "plastid_option",
                    message: format!(
                        "'{}' should be 'plastid', 'standard' or 'from_file'",
                        other
                    ),
                });
            }
        };
        let plastid_img = match (offset_source, set(&cli.plastid_img)) {
            (OffsetSource::Plastid, None) => return Err(ConfigError::Missing("plastid_img")),
            (OffsetSource::Plastid, Some(p)) => Some(work_dir.join(p)),
            _ => None,
        };

        let ensembl_db = required("ensembl_db", &cli.ensembl_db)?;
        let ensembl_version = required("ensembl_version", &cli.ensembl_version)?;
        let unique = yes_no("unique", set(&cli.unique), YesNo::Yes)?;

        let rpf_tool = match set(&cli.plotrpftool) {
            None | Some("grouped2D") => RpfPlotTool::Grouped2D,
            Some("pyplot3D") => RpfPlotTool::Cartesian3D,
            Some("mayavi") => RpfPlotTool::Isometric3D,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    field: "plotrpftool",
                    message: format!(
                        "'{}' should be 'grouped2D', 'pyplot3D' or 'mayavi'",
                        other
                    ),
                });
            }
        };

        let species = required("species", &cli.species)?;

        Ok(Self {
            work_dir,
            input_samfile,
            input_samfile_label,
            exp_name,
            outfolder,
            outhtml,
            outzip,
            archive_name,
            offset_source,
            plastid_img,
            ensembl_db,
            ensembl_version,
            unique,
            rpf_tool,
            tmp_folder,
            species,
            galaxy,
            galaxysam,
        })
    }
}

/// Top-level folder inside the zip: the archive's file name without `.zip`.
pub fn archive_name(zip_file_name: &str) -> String {
    match zip_file_name.strip_suffix(".zip") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => DEFAULT_ARCHIVE.to_string(),
    }
}

fn set(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn required(field: &'static str, v: &Option<String>) -> Result<String, ConfigError> {
    set(v)
        .map(str::to_string)
        .ok_or(ConfigError::Missing(field))
}

fn yes_no(field: &'static str, v: Option<&str>, default: YesNo) -> Result<YesNo, ConfigError> {
    match v {
        None => Ok(default),
        Some("Y") => Ok(YesNo::Yes),
        Some("N") => Ok(YesNo::No),
        Some(other) => Err(ConfigError::Invalid {
            field,
            message: format!("'{}' should be Y or N", other),
        }),
    }
}

fn file_name(p: &Path) -> Option<String> {
    p.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
