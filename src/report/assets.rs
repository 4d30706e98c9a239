use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Images produced upstream and shown in the report unchanged.
pub const PASS_THROUGH: [&str; 5] = [
    "rankedgenes.png",
    "cumulative.png",
    "density.png",
    "annotation_coding.png",
    "annotation_noncoding.png",
];

pub const OFFSETS_IMAGE: &str = "offsets.png";

/// Copies every pass-through image from `summary_dir` into `out_dir`, plus
/// the plastid reference image as `offsets.png` when one is given.
pub fn copy_images(summary_dir: &Path, plastid_img: Option<&Path>, out_dir: &Path) -> Result<()> {
    for name in PASS_THROUGH {
        copy(&summary_dir.join(name), &out_dir.join(name))?;
    }
    if let Some(img) = plastid_img {
        copy(img, &out_dir.join(OFFSETS_IMAGE))?;
    }
    Ok(())
}

fn copy(src: &Path, dest: &Path) -> Result<()> {
    let bytes = fs::copy(src, dest).with_context(|| {
        format!("failed to copy {} to {}", src.display(), dest.display())
    })?;
    debug!(src = %src.display(), bytes, "copied image");
    Ok(())
}
