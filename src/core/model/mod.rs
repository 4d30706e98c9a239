use std::collections::BTreeMap;
use std::fmt;

pub mod codon;

pub const PHASES: [Phase; 3] = [Phase::Zero, Phase::One, Phase::Two];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Phase {
    Zero,
    One,
    Two,
}

impl Phase {
    pub fn from_index(v: u64) -> Option<Self> {
        match v {
            0 => Some(Phase::Zero),
            1 => Some(Phase::One),
            2 => Some(Phase::Two),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Phase::Zero => 0,
            Phase::One => 1,
            Phase::Two => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Zero => "Phase 0",
            Phase::One => "Phase 1",
            Phase::Two => "Phase 2",
        }
    }
}

/// Counts indexed by reading-frame phase.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PhaseCounts(pub [u64; 3]);

impl PhaseCounts {
    pub fn get(&self, phase: Phase) -> u64 {
        self.0[phase.index()]
    }

    /// Adds `count` to one phase; `None` (and no change) on overflow.
    pub fn checked_add(&mut self, phase: Phase, count: u64) -> Option<()> {
        let i = phase.index();
        self.0[i] = self.0[i].checked_add(count)?;
        Some(())
    }

    /// Column-wise sum; `None` (and no change) on overflow.
    pub fn checked_merge(&mut self, other: &PhaseCounts) -> Option<()> {
        let mut sum = *self;
        for i in 0..3 {
            sum.0[i] = sum.0[i].checked_add(other.0[i])?;
        }
        *self = sum;
        Some(())
    }

    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    pub fn max(&self) -> u64 {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

/// Per RPF length phase counts, ordered by length.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PhaseByLength {
    rows: BTreeMap<u32, PhaseCounts>,
}

impl PhaseByLength {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one line's contribution; repeated lengths accumulate. `None`
    /// when a count would overflow.
    pub fn add(&mut self, length: u32, counts: PhaseCounts) -> Option<()> {
        self.rows.entry(length).or_default().checked_merge(&counts)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &PhaseCounts)> {
        self.rows.iter().map(|(k, v)| (*k, v))
    }

    pub fn lengths(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column-wise sum over all lengths, `None` on overflow.
    pub fn aggregate(&self) -> Option<PhaseCounts> {
        let mut total = PhaseCounts::default();
        for counts in self.rows.values() {
            total.checked_merge(counts)?;
        }
        Some(total)
    }

    pub fn max_count(&self) -> u64 {
        self.rows.values().map(|c| c.max()).max().unwrap_or(0)
    }

    pub fn mean_count(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.rows.values().flat_map(|c| c.0).map(|c| c as f64).sum();
        sum / (self.rows.len() * 3) as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhasePosition {
    pub phase: Phase,
    pub rel_position: f64,
}

/// Phase counts keyed by codon.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TripletDistribution {
    rows: BTreeMap<String, PhaseCounts>,
}

impl TripletDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the count would overflow.
    pub fn add(&mut self, triplet: &str, phase: Phase, count: u64) -> Option<()> {
        self.rows
            .entry(triplet.to_string())
            .or_default()
            .checked_add(phase, count)
    }

    pub fn get(&self, triplet: &str) -> Option<&PhaseCounts> {
        self.rows.get(triplet)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OffsetEntry {
    pub length: u32,
    pub offset: i64,
}

/// Widest range of RPF lengths an offset table may cover.
pub const MAX_LENGTH_SPAN: u64 = 1000;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OffsetTableError {
    Empty,
    SpanTooWide { min: u32, max: u32 },
}

impl fmt::Display for OffsetTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetTableError::Empty => write!(f, "no offsets found"),
            OffsetTableError::SpanTooWide { min, max } => write!(
                f,
                "RPF lengths {}..{} span more than {} values",
                min, max, MAX_LENGTH_SPAN
            ),
        }
    }
}

impl std::error::Error for OffsetTableError {}

/// Offsets for every RPF length between the shortest and longest observed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OffsetTable {
    entries: Vec<OffsetEntry>,
}

impl OffsetTable {
    /// Builds a gap-free table from observed `(length, offset)` pairs.
    ///
    /// Pairs must be non-empty with unique lengths. A missing interior
    /// length takes the offset of the nearest shorter length; the filled
    /// lengths are returned alongside the table.
    pub fn from_observed(observed: &[(u32, i64)]) -> Result<(Self, Vec<u32>), OffsetTableError> {
        let sorted: BTreeMap<u32, i64> = observed.iter().copied().collect();
        let (Some((&min, &first)), Some((&max, _))) =
            (sorted.first_key_value(), sorted.last_key_value())
        else {
            return Err(OffsetTableError::Empty);
        };
        let span = u64::from(max) - u64::from(min) + 1;
        if span > MAX_LENGTH_SPAN {
            return Err(OffsetTableError::SpanTooWide { min, max });
        }
        let mut entries = Vec::with_capacity(span as usize);
        let mut filled = Vec::new();
        let mut last = first;
        for length in min..=max {
            match sorted.get(&length) {
                Some(&offset) => last = offset,
                None => filled.push(length),
            }
            entries.push(OffsetEntry {
                length,
                offset: last,
            });
        }
        Ok((Self { entries }, filled))
    }

    pub fn entries(&self) -> &[OffsetEntry] {
        &self.entries
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OffsetSource {
    Plastid,
    Standard,
    FromFile,
}

impl OffsetSource {
    pub fn as_str(self) -> &'static str {
        match self {
            OffsetSource::Plastid => "plastid",
            OffsetSource::Standard => "standard",
            OffsetSource::FromFile => "from_file",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "Y",
            YesNo::No => "N",
        }
    }

    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RpfPlotTool {
    Grouped2D,
    Cartesian3D,
    Isometric3D,
}

pub struct ReportMetadata {
    pub exp_name: String,
    pub species: String,
    pub input_samfile: String,
    pub ensembl_db: String,
    pub ensembl_version: String,
    pub offset_source: OffsetSource,
    pub unique: YesNo,
    pub total_alignments: Option<u64>,
    pub generated: chrono::DateTime<chrono::Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_is_column_sum() {
        let mut d = PhaseByLength::new();
        d.add(28, PhaseCounts([10, 20, 5]));
        d.add(29, PhaseCounts([1, 2, 3]));
        assert_eq!(d.aggregate(), Some(PhaseCounts([11, 22, 8])));
    }

    #[test]
    fn repeated_lengths_accumulate() {
        let mut d = PhaseByLength::new();
        d.add(30, PhaseCounts([1, 1, 1]));
        d.add(30, PhaseCounts([2, 0, 4]));
        assert_eq!(d.len(), 1);
        assert_eq!(d.iter().next(), Some((30, &PhaseCounts([3, 1, 5]))));
        assert_eq!(d.max_count(), 5);
    }

    #[test]
    fn offset_table_fills_interior_gaps() {
        let (table, filled) =
            OffsetTable::from_observed(&[(31, 13), (28, 12), (30, 12)]).unwrap();
        let lengths: Vec<u32> = table.entries().iter().map(|e| e.length).collect();
        assert_eq!(lengths, vec![28, 29, 30, 31]);
        assert_eq!(table.entries()[1].offset, 12);
        assert_eq!(table.entries()[3].offset, 13);
        assert_eq!(filled, vec![29]);
    }

    #[test]
    fn offset_table_empty_input() {
        assert_eq!(OffsetTable::from_observed(&[]), Err(OffsetTableError::Empty));
    }

    #[test]
    fn offset_table_rejects_huge_span() {
        assert_eq!(
            OffsetTable::from_observed(&[(0, 12), (u32::MAX, 13)]),
            Err(OffsetTableError::SpanTooWide {
                min: 0,
                max: u32::MAX
            })
        );
        let (table, _) = OffsetTable::from_observed(&[(20, 1), (1019, 2)]).unwrap();
        assert_eq!(table.entries().len(), 1000);
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let mut d = PhaseByLength::new();
        assert_eq!(d.add(28, PhaseCounts([u64::MAX, 0, 0])), Some(()));
        assert_eq!(d.add(28, PhaseCounts([1, 5, 5])), None);
        // a failed merge leaves the row untouched
        assert_eq!(d.iter().next(), Some((28, &PhaseCounts([u64::MAX, 0, 0]))));

        let mut d = PhaseByLength::new();
        d.add(28, PhaseCounts([u64::MAX, 0, 0]));
        d.add(29, PhaseCounts([1, 0, 0]));
        assert_eq!(d.aggregate(), None);

        let mut t = TripletDistribution::new();
        assert_eq!(t.add("ATG", Phase::Zero, u64::MAX), Some(()));
        assert_eq!(t.add("ATG", Phase::Zero, 1), None);
        assert_eq!(PhaseCounts([u64::MAX, 1, 0]).total(), u64::MAX);
    }

    #[test]
    fn phase_from_index_rejects_out_of_range() {
        assert_eq!(Phase::from_index(2), Some(Phase::Two));
        assert_eq!(Phase::from_index(3), None);
    }
}
