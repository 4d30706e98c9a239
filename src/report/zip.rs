use anyhow::{Context, Result, anyhow};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Packages a finished output directory for distribution.
pub trait Archiver {
    /// Writes every file under `folder` into `dest`, nested as
    /// `<archive_name>/<folder name>/...`.
    fn archive(&self, folder: &Path, archive_name: &str, dest: &Path) -> Result<()>;
}

pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive(&self, folder: &Path, archive_name: &str, dest: &Path) -> Result<()> {
        let folder_name = folder
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("output folder {} has no name", folder.display()))?;
        let root = format!("{}/{}", archive_name, folder_name);

        let mut tmp_name = dest.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let file = File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        let skip = own_paths(dest, &tmp_path);
        let mut zip = ZipWriter::new(file);
        let result = write_entries(&mut zip, folder, archive_name, &root, &skip);

        match result.and_then(|_| zip.finish().with_context(|| "failed to finalize zip")) {
            Ok(_) => {
                fs::rename(&tmp_path, dest)
                    .with_context(|| format!("failed to move zip to {}", dest.display()))?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }
}

/// Canonical locations of the archive and its staging file, which must not
/// be packed into themselves when `dest` lies inside the folder.
fn own_paths(dest: &Path, tmp_path: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::canonicalize(tmp_path).into_iter().collect();
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let (Ok(dir), Some(name)) = (fs::canonicalize(parent), dest.file_name()) {
        paths.push(dir.join(name));
    }
    paths
}

fn write_entries(
    zip: &mut ZipWriter<File>,
    folder: &Path,
    archive_name: &str,
    root: &str,
    skip: &[PathBuf],
) -> Result<()> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    zip.add_directory(format!("{}/", archive_name), options)
        .with_context(|| "failed to add directory entry to zip")?;
    add_tree(zip, folder, root, options, skip)
}

fn add_tree(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
    skip: &[PathBuf],
) -> Result<()> {
    zip.add_directory(format!("{}/", prefix), options)
        .with_context(|| format!("failed to add {}/ to zip", prefix))?;

    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .collect::<io::Result<_>>()
        .with_context(|| format!("failed to list {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if fs::canonicalize(&path).is_ok_and(|p| skip.contains(&p)) {
            continue;
        }
        let name = entry.file_name();
        let name = name
            .to_str()
            .ok_or_else(|| anyhow!("non UTF-8 file name {}", path.display()))?;
        let zip_path = format!("{}/{}", prefix, name);
        if path.is_dir() {
            add_tree(zip, &path, &zip_path, options, skip)?;
        } else {
            add_file(zip, &path, &zip_path, options)
                .with_context(|| format!("failed to add {} to zip", path.display()))?;
        }
    }
    Ok(())
}

fn add_file(
    zip: &mut ZipWriter<File>,
    src_path: &Path,
    zip_path: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut file =
        File::open(src_path).with_context(|| format!("failed to open {}", src_path.display()))?;
    zip.start_file(zip_path, options)?;
    io::copy(&mut file, zip)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_entry(archive: &Path, name: &str) -> Vec<u8> {
        let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
        let mut entry = zip.by_name(name).unwrap();
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn extracted_files_are_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("mappingQC_output");
        fs::create_dir_all(&out).unwrap();
        let png: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        fs::write(out.join("tot_phase.png"), &png).unwrap();
        fs::write(out.join("mQC.html"), "<html>report</html>").unwrap();

        let dest = tmp.path().join("mQC.zip");
        ZipArchiver.archive(&out, "mQC", &dest).unwrap();

        assert!(dest.exists());
        assert!(!tmp.path().join("mQC.zip.tmp").exists());
        assert_eq!(read_entry(&dest, "mQC/mappingQC_output/tot_phase.png"), png);
        assert_eq!(
            read_entry(&dest, "mQC/mappingQC_output/mQC.html"),
            b"<html>report</html>"
        );
    }

    #[test]
    fn replaces_existing_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("a.png"), b"a").unwrap();
        let dest = tmp.path().join("run.zip");
        fs::write(&dest, b"stale").unwrap();

        ZipArchiver.archive(&out, "run", &dest).unwrap();
        assert_eq!(read_entry(&dest, "run/out/a.png"), b"a");
    }

    #[test]
    fn archive_inside_folder_is_not_packed_into_itself() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("a.png"), b"a").unwrap();
        let dest = out.join("run.zip");
        fs::write(&dest, b"stale").unwrap();

        ZipArchiver.archive(&out, "run", &dest).unwrap();

        let zip = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<&str> = zip.file_names().collect();
        assert!(names.contains(&"run/out/a.png"), "{names:?}");
        assert!(names.iter().all(|n| !n.ends_with(".zip") && !n.ends_with(".tmp")), "{names:?}");
        assert!(!out.join("run.zip.tmp").exists());
    }

    #[test]
    fn missing_folder_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("mQC.zip");
        let err = ZipArchiver
            .archive(&tmp.path().join("absent"), "mQC", &dest)
            .unwrap_err();
        assert!(format!("{err:#}").contains("absent"));
        assert!(!dest.exists());
        assert!(!tmp.path().join("mQC.zip.tmp").exists());
    }
}
