pub const START_CODON: &str = "ATG";
pub const STOP_CODONS: [&str; 3] = ["TAA", "TAG", "TGA"];

const CODON_TABLE: [(&str, &str); 64] = [
    ("ATA", "Ile"),
    ("ATC", "Ile"),
    ("ATT", "Ile"),
    ("ATG", "Met"),
    ("ACA", "Thr"),
    ("ACC", "Thr"),
    ("ACG", "Thr"),
    ("ACT", "Thr"),
    ("AAC", "Asn"),
    ("AAT", "Asn"),
    ("AAA", "Lys"),
    ("AAG", "Lys"),
    ("AGC", "Ser"),
    ("AGT", "Ser"),
    ("AGA", "Arg"),
    ("AGG", "Arg"),
    ("CTA", "Leu"),
    ("CTC", "Leu"),
    ("CTG", "Leu"),
    ("CTT", "Leu"),
    ("CCA", "Pro"),
    ("CCC", "Pro"),
    ("CCG", "Pro"),
    ("CCT", "Pro"),
    ("CAC", "His"),
    ("CAT", "His"),
    ("CAA", "Gln"),
    ("CAG", "Gln"),
    ("CGA", "Arg"),
    ("CGC", "Arg"),
    ("CGG", "Arg"),
    ("CGT", "Arg"),
    ("GTA", "Val"),
    ("GTC", "Val"),
    ("GTG", "Val"),
    ("GTT", "Val"),
    ("GCA", "Ala"),
    ("GCC", "Ala"),
    ("GCG", "Ala"),
    ("GCT", "Ala"),
    ("GAC", "Asp"),
    ("GAT", "Asp"),
    ("GAA", "Glu"),
    ("GAG", "Glu"),
    ("GGA", "Gly"),
    ("GGC", "Gly"),
    ("GGG", "Gly"),
    ("GGT", "Gly"),
    ("TCA", "Ser"),
    ("TCC", "Ser"),
    ("TCG", "Ser"),
    ("TCT", "Ser"),
    ("TTC", "Phe"),
    ("TTT", "Phe"),
    ("TTA", "Leu"),
    ("TTG", "Leu"),
    ("TAC", "Tyr"),
    ("TAT", "Tyr"),
    ("TAA", "STOP"),
    ("TAG", "STOP"),
    ("TGC", "Cys"),
    ("TGT", "Cys"),
    ("TGA", "STOP"),
    ("TGG", "Trp"),
];

/// Standard genetic code translation; `None` for anything that is not a codon.
pub fn amino_acid(codon: &str) -> Option<&'static str> {
    CODON_TABLE
        .iter()
        .find(|(c, _)| *c == codon)
        .map(|(_, aa)| *aa)
}

pub fn is_start(codon: &str) -> bool {
    codon == START_CODON
}

pub fn is_stop(codon: &str) -> bool {
    STOP_CODONS.contains(&codon)
}

/// All 64 codons ordered by amino acid name, then by codon.
pub fn codons_by_amino_acid() -> Vec<(&'static str, &'static str)> {
    let mut v = CODON_TABLE.to_vec();
    v.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)));
    v
}
