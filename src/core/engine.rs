use crate::core::config::ReportConfig;
use crate::core::counter::{self, AlignmentCounter};
use crate::core::external::Fetcher;
use crate::core::io;
use crate::core::model::{OffsetSource, ReportMetadata};
use crate::report::assets;
use crate::report::charts::{phase_position, rpf_phase, total_phase, triplet};
use crate::report::html;
use crate::report::zip::Archiver;
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const LOGO_URL: &str = "http://www.nxtgnt.ugent.be/images/img/logos/BIOBIX_logo.png";

/// External effects the pipeline depends on.
pub struct Collaborators<'a> {
    pub counter: &'a dyn AlignmentCounter,
    pub fetcher: &'a dyn Fetcher,
    pub archiver: &'a dyn Archiver,
}

#[derive(Debug)]
pub struct RunOutput {
    pub total_alignments: Option<u64>,
    pub report: PathBuf,
    pub archive: PathBuf,
    pub elapsed: Duration,
}

pub fn run(cfg: &ReportConfig, deps: &Collaborators<'_>) -> Result<RunOutput> {
    let t0 = Instant::now();
    let out = &cfg.outfolder;

    stage("mkdir", || {
        fs::create_dir_all(out)
            .with_context(|| format!("failed to create output dir {}", out.display()))
    })?;

    stage("logo", || {
        deps.fetcher
            .fetch(LOGO_URL, &out.join(html::LOGO))
            .context("failed to download the report logo")
    })?;

    let t_load = Instant::now();
    let data = io::load(&cfg.tmp_folder).context("failed to load summary tables")?;
    stage_done("load", t_load);

    let t_count = Instant::now();
    let sam = counter::resolve_sam(&cfg.input_samfile, cfg.galaxy, cfg.galaxysam, &cfg.tmp_folder);
    let total_alignments = match deps.counter.count_primary(&sam) {
        Ok(n) => Some(n),
        Err(e) => {
            warn!(sam = %sam.display(), error = %e, "total alignment count unavailable");
            None
        }
    };
    stage_done("count", t_count);

    stage("charts", || {
        total_phase::render(
            &data.total_phase,
            total_phase::DEFAULT_EXPONENT,
            &out.join(total_phase::FILE_NAME),
        )
        .context("failed to plot total phase distribution")?;

        let renderer = rpf_phase::renderer_for(cfg.rpf_tool);
        debug!(backend = renderer.name(), "plotting RPF phase distribution");
        renderer
            .render(&data.phase_by_length, &out.join(rpf_phase::FILE_NAME))
            .context("failed to plot RPF phase distribution")?;

        phase_position::render(&data.positions, &out.join(phase_position::FILE_NAME))
            .context("failed to plot phase relative position distribution")?;
        triplet::render(&data.triplets, &out.join(triplet::FILE_NAME))
            .context("failed to plot triplet identities")?;
        Ok(())
    })?;

    stage("images", || {
        let plastid_img = match cfg.offset_source {
            OffsetSource::Plastid => cfg.plastid_img.as_deref(),
            _ => None,
        };
        assets::copy_images(&io::summary_dir(&cfg.tmp_folder), plastid_img, out)
    })?;

    let meta = ReportMetadata {
        exp_name: cfg.exp_name.clone(),
        species: cfg.species.clone(),
        input_samfile: cfg.input_samfile_label.clone(),
        ensembl_db: cfg.ensembl_db.clone(),
        ensembl_version: cfg.ensembl_version.clone(),
        offset_source: cfg.offset_source,
        unique: cfg.unique,
        total_alignments,
        generated: chrono::Local::now(),
    };
    stage("html", || html::write_report(&cfg.outhtml, &meta, &data.offsets))?;

    let report = stage_value("place-html", || place_html(cfg))?;

    stage("zip", || {
        deps.archiver
            .archive(out, &cfg.archive_name, &cfg.outzip)
            .with_context(|| format!("failed to create {}", cfg.outzip.display()))
    })?;

    Ok(RunOutput {
        total_alignments,
        report,
        archive: cfg.outzip.clone(),
        elapsed: t0.elapsed(),
    })
}

/// Moves the HTML into the output folder, or copies it in galaxy mode where
/// the original path is itself a declared output.
fn place_html(cfg: &ReportConfig) -> Result<PathBuf> {
    let name = cfg
        .outhtml
        .file_name()
        .ok_or_else(|| anyhow!("no file name in {}", cfg.outhtml.display()))?;
    let dest = cfg.outfolder.join(name);
    if same_file(&cfg.outhtml, &dest) {
        return Ok(dest);
    }
    if cfg.galaxy.is_yes() {
        fs::copy(&cfg.outhtml, &dest)
            .with_context(|| format!("failed to copy report to {}", dest.display()))?;
    } else if fs::rename(&cfg.outhtml, &dest).is_err() {
        // rename fails across filesystems
        fs::copy(&cfg.outhtml, &dest)
            .with_context(|| format!("failed to move report to {}", dest.display()))?;
        fs::remove_file(&cfg.outhtml)
            .with_context(|| format!("failed to remove {}", cfg.outhtml.display()))?;
    }
    Ok(dest)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn stage<F>(name: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    stage_value(name, f)
}

fn stage_value<T, F>(name: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let t = Instant::now();
    let res = f();
    stage_done(name, t);
    res
}

fn stage_done(name: &str, t: Instant) {
    debug!(stage = name, time = %fmt_dur(t.elapsed()), "stage finished");
}

pub fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SubprocessError;
    use crate::core::model::{RpfPlotTool, YesNo};
    use crate::report::zip::ZipArchiver;
    use std::cell::RefCell;
    use std::io::Read;

    struct FixedCount(Option<u64>);

    impl AlignmentCounter for FixedCount {
        fn count_primary(&self, _: &Path) -> Result<u64, SubprocessError> {
            self.0
                .ok_or_else(|| SubprocessError::new("samtools", "could not start"))
        }
    }

    struct FakeFetcher {
        fail: bool,
        urls: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str, dest: &Path) -> Result<(), SubprocessError> {
            self.urls.borrow_mut().push(url.to_string());
            if self.fail {
                return Err(SubprocessError::new("wget", "network unreachable"));
            }
            fs::write(dest, b"logo").map_err(|e| SubprocessError::new("wget", e.to_string()))
        }
    }

    fn seed_tmp(tmp: &Path) {
        let dir = io::summary_dir(tmp);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(io::RPF_PHASE_FILE), "28,100,40,10\n29,80,30,20\n").unwrap();
        fs::write(dir.join(io::POSITION_FILE), "0,0.1\n1,0.5\n2,1.0\n0,0.95\n").unwrap();
        fs::write(dir.join(io::TRIPLET_FILE), "ATG,0,50\nATG,1,10\nTAA,2,5\n").unwrap();
        fs::write(dir.join(io::OFFSETS_FILE), "28,12\n30,13\n").unwrap();
        for name in assets::PASS_THROUGH {
            fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
    }

    fn config(work: &Path, source: OffsetSource, galaxy: YesNo) -> ReportConfig {
        ReportConfig {
            work_dir: work.to_path_buf(),
            input_samfile: work.join("STAR/fastq1/untreat.sam"),
            input_samfile_label: "STAR/fastq1/untreat.sam".to_string(),
            exp_name: "test run".to_string(),
            outfolder: work.join("mappingQC_output"),
            outhtml: work.join("mQC.html"),
            outzip: work.join("mQC.zip"),
            archive_name: "mQC".to_string(),
            offset_source: source,
            plastid_img: match source {
                OffsetSource::Plastid => Some(work.join("plastid.png")),
                _ => None,
            },
            ensembl_db: "ENS_hsa_82.db".to_string(),
            ensembl_version: "82".to_string(),
            unique: YesNo::Yes,
            rpf_tool: RpfPlotTool::Grouped2D,
            tmp_folder: work.join("tmp"),
            species: "human".to_string(),
            galaxy,
            galaxysam: YesNo::Yes,
        }
    }

    fn zip_entry(archive: &Path, name: &str) -> Vec<u8> {
        let mut zip = ::zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
        let mut entry = zip.by_name(name).unwrap();
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn full_run_produces_report_and_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path();
        seed_tmp(&work.join("tmp"));
        let cfg = config(work, OffsetSource::Standard, YesNo::No);
        let fetcher = FakeFetcher::new(false);
        let deps = Collaborators {
            counter: &FixedCount(Some(1_234_567)),
            fetcher: &fetcher,
            archiver: &ZipArchiver,
        };

        let output = run(&cfg, &deps).unwrap();
        assert_eq!(output.total_alignments, Some(1_234_567));
        assert_eq!(output.archive, cfg.outzip);
        assert_eq!(fetcher.urls.borrow().as_slice(), [LOGO_URL.to_string()]);

        let out = &cfg.outfolder;
        for name in [
            total_phase::FILE_NAME,
            rpf_phase::FILE_NAME,
            phase_position::FILE_NAME,
            triplet::FILE_NAME,
        ] {
            assert_eq!(&fs::read(out.join(name)).unwrap()[..4], b"\x89PNG", "{name}");
        }
        for name in assets::PASS_THROUGH {
            assert_eq!(fs::read(out.join(name)).unwrap(), name.as_bytes());
        }

        // moved, not copied
        assert!(!cfg.outhtml.exists());
        assert_eq!(output.report, out.join("mQC.html"));
        let html = fs::read_to_string(&output.report).unwrap();
        assert!(html.contains("<td>1 234 567</td>"));
        assert!(html.contains("<td>STAR/fastq1/untreat.sam</td>"));
        assert!(!html.contains(&work.display().to_string()));
        assert!(html.contains("Offsets overview"));
        assert!(html.contains("<tr><td>29</td><td>12</td></tr>"));

        assert_eq!(
            zip_entry(&cfg.outzip, "mQC/mappingQC_output/mQC.html"),
            html.as_bytes()
        );
        assert_eq!(
            zip_entry(&cfg.outzip, "mQC/mappingQC_output/tot_phase.png"),
            fs::read(out.join(total_phase::FILE_NAME)).unwrap()
        );
    }

    #[test]
    fn failed_count_degrades_to_na() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path();
        seed_tmp(&work.join("tmp"));
        fs::write(work.join("plastid.png"), b"plastid").unwrap();
        let cfg = config(work, OffsetSource::Plastid, YesNo::Yes);
        let fetcher = FakeFetcher::new(false);
        let deps = Collaborators {
            counter: &FixedCount(None),
            fetcher: &fetcher,
            archiver: &ZipArchiver,
        };

        let output = run(&cfg, &deps).unwrap();
        assert_eq!(output.total_alignments, None);
        // galaxy keeps the original
        assert!(cfg.outhtml.exists());
        let html = fs::read_to_string(&output.report).unwrap();
        assert!(html.contains("<td>NA</td>"));
        assert!(html.contains("src=\"offsets.png\""));
        assert_eq!(
            fs::read(cfg.outfolder.join(assets::OFFSETS_IMAGE)).unwrap(),
            b"plastid"
        );
    }

    #[test]
    fn logo_download_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path();
        seed_tmp(&work.join("tmp"));
        let cfg = config(work, OffsetSource::Standard, YesNo::No);
        let deps = Collaborators {
            counter: &FixedCount(Some(1)),
            fetcher: &FakeFetcher::new(true),
            archiver: &ZipArchiver,
        };
        let err = run(&cfg, &deps).unwrap_err();
        assert!(format!("{err:#}").contains("logo"));
        assert!(!cfg.outzip.exists());
    }

    #[test]
    fn missing_input_table_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path();
        seed_tmp(&work.join("tmp"));
        fs::remove_file(io::summary_dir(&work.join("tmp")).join(io::TRIPLET_FILE)).unwrap();
        let cfg = config(work, OffsetSource::Standard, YesNo::No);
        let deps = Collaborators {
            counter: &FixedCount(Some(1)),
            fetcher: &FakeFetcher::new(false),
            archiver: &ZipArchiver,
        };
        let err = run(&cfg, &deps).unwrap_err();
        assert!(format!("{err:#}").contains(io::TRIPLET_FILE));
    }

    #[test]
    fn durations() {
        assert_eq!(fmt_dur(Duration::from_millis(12)), "12ms");
        assert_eq!(fmt_dur(Duration::from_millis(1500)), "1.500s");
    }
}
