use std::path::PathBuf;

use chipcmp_core::matrix::Measure;
use chipcmp_core::plot::Colormap;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Parser)]
#[clap(name = "chipcmp", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Number of worker threads; 0 means all available cores
    #[clap(long, global = true, default_value_t = 0, value_parser)]
    pub cores: usize,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SimilarityMeasure {
    /// Pearson correlation of co-occupancy profiles over the union
    Correlation,
    /// Interval overlap ratio
    Overlap,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlotType {
    Heatmap,
    /// Lower-triangle heatmap
    LtHeatmap,
    /// Heatmap with rows/columns reordered by clustering
    Clustermap,
    /// Tab-delimited text instead of an image
    Matrix,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MeasureCli {
    Raw,
    Fpkm,
    Cpm,
}

impl From<MeasureCli> for Measure {
    fn from(m: MeasureCli) -> Self {
        match m {
            MeasureCli::Raw => Measure::Raw,
            MeasureCli::Fpkm => Measure::Fpkm,
            MeasureCli::Cpm => Measure::Cpm,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColormapCli {
    Reds,
    Blues,
    Greens,
    #[clap(name = "rdbu")]
    RdBu,
    #[clap(name = "ylorrd")]
    YlOrRd,
}

impl From<ColormapCli> for Colormap {
    fn from(c: ColormapCli) -> Self {
        match c {
            ColormapCli::Reds => Colormap::Reds,
            ColormapCli::Blues => Colormap::Blues,
            ColormapCli::Greens => Colormap::Greens,
            ColormapCli::RdBu => Colormap::RdBu,
            ColormapCli::YlOrRd => Colormap::YlOrRd,
        }
    }
}

#[derive(Args)]
pub struct HeatmapArgs {
    /// Plot variant, or `matrix` for a text table
    #[clap(long, arg_enum, default_value = "heatmap", value_parser)]
    pub plot: PlotType,

    /// Color scheme of the heatmap cells
    #[clap(long, arg_enum, default_value = "reds", value_parser)]
    pub colormap: ColormapCli,

    /// Lower bound of the color gradient
    #[clap(long, default_value_t = 0.0, value_parser)]
    pub grad_min: f64,

    /// Upper bound of the color gradient
    #[clap(long, default_value_t = 1.0, value_parser)]
    pub grad_max: f64,
}

#[derive(Args)]
pub struct CompareSitesArgs {
    /// Output image (or text matrix) path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Binding-site BED files
    #[clap(required = true, min_values = 2, value_parser)]
    pub beds: Vec<PathBuf>,

    /// Similarity between two interval sets
    #[clap(long, arg_enum, default_value = "correlation", value_parser)]
    pub measure: SimilarityMeasure,

    #[clap(flatten)]
    pub heatmap: HeatmapArgs,
}

#[derive(Args)]
pub struct CompareCoveragesArgs {
    /// Output image (or text matrix) path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Comma-separated BED files; their union defines the regions
    #[clap(value_parser)]
    pub beds: String,

    /// Alignment files, one sample each
    #[clap(required = true, min_values = 2, value_parser)]
    pub bams: Vec<PathBuf>,

    /// Comma-separated sample names; derived from file names when absent
    #[clap(long, value_parser)]
    pub labels: Option<String>,

    #[clap(flatten)]
    pub heatmap: HeatmapArgs,
}

#[derive(Args)]
pub struct ConsensusArgs {
    /// Output BED path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Binding-site BED files
    #[clap(required = true, min_values = 2, value_parser)]
    pub beds: Vec<PathBuf>,

    /// Keep union regions present in strictly more than this many input
    /// sets; half the number of inputs when absent
    #[clap(long, value_parser)]
    pub threshold: Option<u64>,
}

#[derive(Args)]
pub struct CoverageMatrixArgs {
    /// Output table path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Comma-separated BED files; their union defines the rows
    #[clap(value_parser)]
    pub beds: String,

    /// Alignment files, one column each
    #[clap(required = true, value_parser)]
    pub bams: Vec<PathBuf>,

    #[clap(long, arg_enum, default_value = "fpkm", value_parser)]
    pub measure: MeasureCli,

    /// Extend each read to this fragment length toward its 3' end
    #[clap(long, value_parser)]
    pub fragment: Option<u64>,
}

#[derive(Args)]
pub struct OccupancyMatrixArgs {
    /// Output table path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Reference regions (table rows)
    #[clap(value_parser)]
    pub reference: PathBuf,

    /// Binding-site BED files, one column each
    #[clap(required = true, value_parser)]
    pub beds: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CoverageSitesArgs {
    /// Regions whose midpoints anchor the windows
    #[clap(value_parser)]
    pub bed: PathBuf,

    /// Output array path (`.npy`)
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Alignment or bigWig files; with `--table`, tab-delimited tables
    /// whose ID column locates the data files
    #[clap(required = true, value_parser)]
    pub inputs: Vec<String>,

    /// Inputs are bigWig signal tracks instead of BAM files
    #[clap(long, value_parser)]
    pub bigwig: bool,

    /// Treat the positional inputs as sample tables instead of data files
    #[clap(long, value_parser)]
    pub table: bool,

    /// Column holding the sample IDs when `--table` is given
    #[clap(long, default_value = "IDs", value_parser)]
    pub id_column: String,

    /// Path prefix prepended to each table ID
    #[clap(long, value_parser)]
    pub prefix: Option<String>,

    /// Path suffix appended to each table ID
    #[clap(long, value_parser)]
    pub suffix: Option<String>,

    /// Half-width of the window around each region midpoint
    #[clap(long, default_value_t = 1000, value_parser)]
    pub window: u64,

    /// Summarize each window into this many bins; per-base when absent
    #[clap(long, value_parser)]
    pub bins: Option<usize>,

    /// Extend each read to this fragment length toward its 3' end
    #[clap(long, value_parser)]
    pub fragment: Option<u64>,

    /// Two-column chromosome sizes file used to clip windows; without it
    /// BAM inputs fall back to the sizes in the first file's header
    #[clap(long, value_parser)]
    pub chrom_sizes: Option<PathBuf>,
}

#[derive(Args)]
pub struct SnapshotArgs {
    /// Loci to display (the first five are drawn)
    #[clap(value_parser)]
    pub bed: PathBuf,

    /// Output image path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Alignment files, one row each
    #[clap(required = true, value_parser)]
    pub bams: Vec<PathBuf>,

    /// Red component of the track color, 0 to 1
    #[clap(long, default_value_t = 1.0, value_parser)]
    pub red: f64,

    /// Green component of the track color, 0 to 1
    #[clap(long, default_value_t = 0.0, value_parser)]
    pub green: f64,

    /// Blue component of the track color, 0 to 1
    #[clap(long, default_value_t = 0.0, value_parser)]
    pub blue: f64,

    /// Extend each read to this fragment length toward its 3' end
    #[clap(long, value_parser)]
    pub fragment: Option<u64>,
}

#[derive(Args)]
pub struct ExtendArgs {
    /// Input BED path
    #[clap(value_parser)]
    pub bed: PathBuf,

    /// Output BED path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Half-width of the window around each region midpoint
    #[clap(long, default_value_t = 1000, value_parser)]
    pub window: u64,

    /// Two-column chromosome sizes file used to clip windows
    #[clap(long, value_parser)]
    pub chrom_sizes: Option<PathBuf>,
}

#[derive(Args)]
pub struct VennArgs {
    /// Output image path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Two or three binding-site BED files
    #[clap(required = true, min_values = 2, max_values = 3, value_parser)]
    pub beds: Vec<PathBuf>,

    /// Comma-separated group names; derived from file names when absent
    #[clap(long, value_parser)]
    pub names: Option<String>,

    /// Comma-separated group colors (names or `#rrggbb`)
    #[clap(long, value_parser)]
    pub colors: Option<String>,
}

#[derive(Args)]
pub struct ScatterArgs {
    /// Output image path
    #[clap(value_parser)]
    pub output: PathBuf,

    /// Comma-separated BED files; their union defines the points
    #[clap(value_parser)]
    pub beds: String,

    /// Exactly two alignment files
    #[clap(required = true, min_values = 2, max_values = 2, value_parser)]
    pub bams: Vec<PathBuf>,

    #[clap(long, arg_enum, default_value = "fpkm", value_parser)]
    pub measure: MeasureCli,

    /// BED file of sites to highlight, grouped by their name column
    #[clap(long, value_parser)]
    pub highlight: Option<PathBuf>,

    /// 0-based column of `--highlight` holding the feature name
    #[clap(long, default_value_t = 3, value_parser)]
    pub name_index: usize,

    /// Draw the least-squares regression line
    #[clap(long, value_parser)]
    pub fit: bool,

    /// Plot title
    #[clap(long, value_parser)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct FetchAtlasArgs {
    /// Cell type to select from the experiment table
    #[clap(value_parser)]
    pub celltype: String,

    /// Output directory; receives `table.tab`, `bed/` and `bigwig/`
    #[clap(value_parser)]
    pub prefix: PathBuf,

    /// Experiment table URL
    #[clap(
        long,
        default_value_t = chipcmp_core::atlas::DEFAULT_TABLE_URL.to_string(),
        value_parser
    )]
    pub table: String,

    /// Which per-experiment files to download
    #[clap(long, default_value = "both", value_parser)]
    pub datatype: String,

    /// Peak list Q-value threshold exponent (e.g. `05` for 10e-5)
    #[clap(long, default_value = "05", value_parser)]
    pub threshold: String,

    /// Comma-separated strings; keep records whose metadata contains any
    #[clap(long, value_parser)]
    pub filter: Option<String>,
}

#[derive(Args)]
pub struct ScanRemoteArgs {
    /// HTTP directory listing URLs to scan
    #[clap(required = true, value_parser)]
    pub urls: Vec<String>,

    /// IDs that must each resolve to a file in one of the listings
    #[clap(long = "id", required = true, value_parser)]
    pub ids: Vec<String>,

    /// Required file name extension
    #[clap(long, default_value = "bam", value_parser)]
    pub ext: String,
}

#[derive(Args)]
pub struct AccessionArgs {
    /// GEO sample accessions (GSM)
    #[clap(required = true, value_parser)]
    pub accessions: Vec<String>,

    /// Directory holding the NCBI EDirect binaries; `$PATH` when absent
    #[clap(long, value_parser)]
    pub edirect: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Similarity heatmap of binding-site BED files
    CompareSites(CompareSitesArgs),
    /// Correlation heatmap of read coverages over a union of regions
    CompareCoverages(CompareCoveragesArgs),
    /// Consensus binding sites shared by a minimum number of input sets
    Consensus(ConsensusArgs),
    /// Region-by-sample read coverage table
    CoverageMatrix(CoverageMatrixArgs),
    /// Binary co-occupancy table against a reference region set
    OccupancyMatrix(OccupancyMatrixArgs),
    /// Windowed read-depth array around region midpoints, saved as `.npy`
    CoverageSites(CoverageSitesArgs),
    /// Grid of read-depth panels at the first few loci
    Snapshot(SnapshotArgs),
    /// Expand each region to a fixed-size window around its midpoint
    Extend(ExtendArgs),
    /// Venn diagram of interval overlap between two or three sets
    Venn(VennArgs),
    /// Two-sample coverage scatter plot
    Scatter(ScatterArgs),
    /// Download ChIP-Atlas metadata and matching peak/signal files
    FetchAtlas(FetchAtlasArgs),
    /// Resolve IDs to file URLs by scraping directory listings
    ScanRemote(ScanRemoteArgs),
    /// Map GEO sample accessions to SRX/SRR accessions via EDirect
    Accession(AccessionArgs),
}
