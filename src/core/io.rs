use crate::core::error::ParseError;
use crate::core::model::codon;
use crate::core::model::{
    OffsetTable, Phase, PhaseByLength, PhaseCounts, PhasePosition, TripletDistribution,
};
use flate2::read::MultiGzDecoder;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

pub const RPF_PHASE_FILE: &str = "rpf_phase.csv";
pub const POSITION_FILE: &str = "pos_table_all.csv";
pub const TRIPLET_FILE: &str = "total_triplet.csv";
pub const OFFSETS_FILE: &str = "mappingqc_offsets.csv";

/// Everything the charts and the report need from the upstream pipeline.
#[derive(Debug)]
pub struct PlotData {
    pub phase_by_length: PhaseByLength,
    pub total_phase: PhaseCounts,
    pub positions: Vec<PhasePosition>,
    pub triplets: TripletDistribution,
    pub offsets: OffsetTable,
}

/// Directory of upstream intermediate results, `<tmp_folder>/mappingqc`.
pub fn summary_dir(tmp_folder: &Path) -> PathBuf {
    tmp_folder.join("mappingqc")
}

pub fn load(tmp_folder: &Path) -> Result<PlotData, ParseError> {
    let dir = summary_dir(tmp_folder);
    let rpf_path = dir.join(RPF_PHASE_FILE);
    let phase_by_length = read_phase_by_length(&rpf_path)?;
    let total_phase = phase_by_length
        .aggregate()
        .ok_or_else(|| ParseError::new(&rpf_path, "total phase count overflows u64"))?;
    let positions = read_positions(&dir.join(POSITION_FILE))?;
    let triplets = read_triplets(&dir.join(TRIPLET_FILE))?;
    let offsets = read_offsets(&dir.join(OFFSETS_FILE))?;
    debug!(
        lengths = phase_by_length.len(),
        positions = positions.len(),
        triplets = triplets.len(),
        offsets = offsets.entries().len(),
        "loaded summary tables"
    );
    Ok(PlotData {
        phase_by_length,
        total_phase,
        positions,
        triplets,
        offsets,
    })
}

pub fn read_phase_by_length(path: &Path) -> Result<PhaseByLength, ParseError> {
    let mut distr = PhaseByLength::new();
    for_each_record(path, 4, |line, fields| {
        let length: u32 = field(path, line, fields[0], "RPF length")?;
        let mut counts = PhaseCounts::default();
        for (i, raw) in fields[1..].iter().enumerate() {
            counts.0[i] = field(path, line, raw, "phase count")?;
        }
        distr.add(length, counts).ok_or_else(|| {
            ParseError::at_line(
                path,
                line,
                format!("phase count for RPF length {} overflows u64", length),
            )
        })
    })?;
    if distr.is_empty() {
        return Err(ParseError::new(path, "no RPF lengths found"));
    }
    Ok(distr)
}

pub fn read_positions(path: &Path) -> Result<Vec<PhasePosition>, ParseError> {
    let mut out = Vec::new();
    for_each_record(path, 2, |line, fields| {
        let phase = phase_field(path, line, fields[0])?;
        let rel_position: f64 = field(path, line, fields[1], "relative position")?;
        out.push(PhasePosition {
            phase,
            rel_position,
        });
        Ok(())
    })?;
    Ok(out)
}

pub fn read_triplets(path: &Path) -> Result<TripletDistribution, ParseError> {
    let mut distr = TripletDistribution::new();
    for_each_record(path, 3, |line, fields| {
        let triplet = fields[0];
        if codon::amino_acid(triplet).is_none() {
            return Err(ParseError::at_line(
                path,
                line,
                format!("'{}' is not a codon", triplet),
            ));
        }
        let phase = phase_field(path, line, fields[1])?;
        let count: u64 = field(path, line, fields[2], "triplet count")?;
        distr.add(triplet, phase, count).ok_or_else(|| {
            ParseError::at_line(
                path,
                line,
                format!("count for triplet {} overflows u64", triplet),
            )
        })
    })?;
    Ok(distr)
}

pub fn read_offsets(path: &Path) -> Result<OffsetTable, ParseError> {
    let mut observed = Vec::new();
    let mut seen = HashSet::new();
    for_each_record(path, 2, |line, fields| {
        let length: u32 = field(path, line, fields[0], "RPF length")?;
        let offset: i64 = field(path, line, fields[1], "offset")?;
        if !seen.insert(length) {
            return Err(ParseError::at_line(
                path,
                line,
                format!("duplicate offset for RPF length {}", length),
            ));
        }
        observed.push((length, offset));
        Ok(())
    })?;
    let (table, filled) = OffsetTable::from_observed(&observed)
        .map_err(|e| ParseError::new(path, e.to_string()))?;
    for length in filled {
        warn!(
            length,
            "no offset listed for RPF length; using offset of the next shorter length"
        );
    }
    Ok(table)
}

fn for_each_record<F>(path: &Path, columns: usize, mut f: F) -> Result<(), ParseError>
where
    F: FnMut(usize, &[&str]) -> Result<(), ParseError>,
{
    let reader = open_text(path)?;
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| ParseError::at_line(path, line_no, e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != columns {
            return Err(ParseError::at_line(
                path,
                line_no,
                format!("expected {} columns, found {}", columns, fields.len()),
            ));
        }
        f(line_no, &fields)?;
    }
    Ok(())
}

fn field<T: FromStr>(path: &Path, line: usize, raw: &str, what: &str) -> Result<T, ParseError> {
    raw.parse::<T>().map_err(|_| {
        ParseError::at_line(path, line, format!("invalid {} '{}'", what, raw))
    })
}

fn phase_field(path: &Path, line: usize, raw: &str) -> Result<Phase, ParseError> {
    let v: u64 = field(path, line, raw, "phase")?;
    Phase::from_index(v)
        .ok_or_else(|| ParseError::at_line(path, line, format!("phase {} is not 0, 1 or 2", v)))
}

fn open_text(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let gz = is_gzip(path)?;
    let file = File::open(path).map_err(|e| ParseError::new(path, e.to_string()))?;
    let reader: Box<dyn BufRead> = if gz {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

fn is_gzip(path: &Path) -> Result<bool, ParseError> {
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        if ext.eq_ignore_ascii_case("gz") {
            return Ok(true);
        }
    }
    let mut file = File::open(path).map_err(|e| ParseError::new(path, e.to_string()))?;
    let mut magic = [0u8; 2];
    let n = file
        .read(&mut magic)
        .map_err(|e| ParseError::new(path, e.to_string()))?;
    Ok(n == 2 && magic == [0x1f, 0x8b])
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::Write;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, content).unwrap();
        p
    }

    fn fixture(tmp: &Path) {
        let dir = summary_dir(tmp);
        fs::create_dir_all(&dir).unwrap();
        write(&dir, RPF_PHASE_FILE, "28,10,20,5\n29,1,2,3\n");
        write(&dir, POSITION_FILE, "0,0.1\n1,0.5\n2,1.0\n");
        write(&dir, TRIPLET_FILE, "ATG,0,100\nATG,1,20\nTAA,2,7\n");
        write(&dir, OFFSETS_FILE, "28,12\n29,12\n30,13\n");
    }

    #[test]
    fn loads_all_tables() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path());
        let data = load(tmp.path()).unwrap();
        assert_eq!(data.total_phase, PhaseCounts([11, 22, 8]));
        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.positions[2].phase, Phase::Two);
        assert_eq!(data.triplets.get("ATG"), Some(&PhaseCounts([100, 20, 0])));
        assert_eq!(data.offsets.entries().len(), 3);
    }

    #[test]
    fn missing_file_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_positions(&tmp.path().join("nope.csv")).unwrap_err();
        assert!(err.line.is_none());
    }

    #[test]
    fn wrong_column_count_reports_line() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write(tmp.path(), "rpf.csv", "28,1,2,3\n\n29,1,2\n");
        let err = read_phase_by_length(&p).unwrap_err();
        assert_eq!(err.line, Some(3));
        assert!(err.message.contains("expected 4 columns"));
    }

    #[test]
    fn rejects_bad_phase_and_triplet() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write(tmp.path(), "pos.csv", "3,0.5\n");
        assert!(read_positions(&p).is_err());
        let p = write(tmp.path(), "trip.csv", "ANG,0,1\n");
        let err = read_triplets(&p).unwrap_err();
        assert!(err.message.contains("not a codon"));
    }

    #[test]
    fn offsets_without_gaps_and_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write(tmp.path(), "off.csv", "26,12\n29,13\n");
        let table = read_offsets(&p).unwrap();
        let lengths: Vec<u32> = table.entries().iter().map(|e| e.length).collect();
        assert_eq!(lengths, vec![26, 27, 28, 29]);

        let p = write(tmp.path(), "dup.csv", "26,12\n26,13\n");
        assert!(read_offsets(&p).unwrap_err().message.contains("duplicate"));

        let p = write(tmp.path(), "empty.csv", "");
        assert!(read_offsets(&p).is_err());
    }

    #[test]
    fn reads_gzip_input() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("rpf_phase.csv.gz");
        let mut enc = GzEncoder::new(fs::File::create(&p).unwrap(), Compression::default());
        enc.write_all(b"30,4,5,6\n").unwrap();
        enc.finish().unwrap();
        let d = read_phase_by_length(&p).unwrap();
        assert_eq!(d.aggregate(), Some(PhaseCounts([4, 5, 6])));
    }

    #[test]
    fn empty_phase_table_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write(tmp.path(), "rpf.csv", "\n\n");
        let err = read_phase_by_length(&p).unwrap_err();
        assert!(err.message.contains("no RPF lengths"));
    }

    #[test]
    fn overflowing_counts_report_line() {
        let tmp = tempfile::tempdir().unwrap();
        let max = u64::MAX;
        let p = write(tmp.path(), "rpf.csv", &format!("28,{max},0,0\n28,1,0,0\n"));
        let err = read_phase_by_length(&p).unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.contains("overflows"));

        let p = write(tmp.path(), "trip.csv", &format!("ATG,0,{max}\nATG,0,1\n"));
        let err = read_triplets(&p).unwrap_err();
        assert_eq!(err.line, Some(2));

        let dir = summary_dir(tmp.path());
        fixture(tmp.path());
        write(&dir, RPF_PHASE_FILE, &format!("28,{max},0,0\n29,1,0,0\n"));
        let err = load(tmp.path()).unwrap_err();
        assert!(err.message.contains("overflows"));
    }

    #[test]
    fn offsets_with_absurd_span_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write(tmp.path(), "off.csv", "0,12\n4294967295,13\n");
        let err = read_offsets(&p).unwrap_err();
        assert!(err.message.contains("span more than"));
    }
}
