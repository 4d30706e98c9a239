use clap::{ArgAction, Parser};

/// Raw command line. Empty strings count as unset; `ReportConfig` resolves
/// defaults and validates.
#[derive(Parser, Debug, Default)]
#[command(
    name = "mqc",
    version,
    about = "Mapping QC report for ribosome profiling alignments",
    disable_help_flag = true
)]
pub struct Cli {
    /// Working directory (default: current directory)
    #[arg(short = 'w', long = "work_dir")]
    pub work_dir: Option<String>,

    /// SAM/BAM file used as input (default: STAR/fastq1/untreat.sam)
    #[arg(short = 's', long = "input_samfile")]
    pub input_samfile: Option<String>,

    /// Name of the experiment, used as report title
    #[arg(short = 'n', long = "exp_name")]
    pub exp_name: Option<String>,

    /// Output directory (default: <work_dir>/mappingQC_output/)
    #[arg(short = 'o', long = "outfolder")]
    pub outfolder: Option<String>,

    /// Output HTML file (default: <work_dir>/mQC.html)
    #[arg(short = 'h', long = "outhtml")]
    pub outhtml: Option<String>,

    /// Output zip file (default: <work_dir>/mQC.zip)
    #[arg(short = 'z', long = "outzip")]
    pub outzip: Option<String>,

    /// Origin of offsets: plastid, standard or from_file (default: standard)
    #[arg(short = 'p', long = "plastid_option")]
    pub plastid_option: Option<String>,

    /// Plastid offset image (required with plastid_option=plastid)
    #[arg(short = 'i', long = "plastid_img")]
    pub plastid_img: Option<String>,

    /// Ensembl database
    #[arg(short = 'e', long = "ensembl_db")]
    pub ensembl_db: Option<String>,

    /// Ensembl database version
    #[arg(short = 'v', long = "ensembl_version")]
    pub ensembl_version: Option<String>,

    /// Only unique alignments were used: Y or N (default: Y)
    #[arg(short = 'u', long = "unique")]
    pub unique: Option<String>,

    /// RPF phase figure backend: grouped2D, pyplot3D or mayavi (default: grouped2D)
    #[arg(short = 'x', long = "plotrpftool")]
    pub plotrpftool: Option<String>,

    /// Folder with the upstream temporary results (default: <work_dir>/tmp)
    #[arg(short = 't', long = "tmp_folder")]
    pub tmp_folder: Option<String>,

    /// Species
    #[arg(short = 'd', long = "species")]
    pub species: Option<String>,

    /// Run inside galaxy: Y or N (default: N)
    #[arg(short = 'g', long = "galaxy")]
    pub galaxy: Option<String>,

    /// Galaxy already converted the input to SAM: Y or N (default: Y)
    #[arg(short = 'a', long = "galaxysam")]
    pub galaxysam: Option<String>,

    /// Print debug information to stderr
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors to stderr
    #[arg(long)]
    pub quiet: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}
