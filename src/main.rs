use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;

use blast_rs::align::{CancelToken, ScoringScheme, SearchOpt, Searcher};
use blast_rs::codec::{reduce_to_murphy10, Alphabet, SequenceEncoder};
use blast_rs::index::{Database, IndexMeta, SeedIndex};
use blast_rs::io::{fasta, report};
use blast_rs::util::dna;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "blast-rs", author, version, about = "BLAST-style similarity search", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the k-mer seed index of a reference FASTA and report its statistics
    Index {
        /// Reference FASTA file
        reference: String,
        #[arg(long, value_enum, default_value_t = AlphabetArg::Dna)]
        alphabet: AlphabetArg,
        #[arg(short = 'w', long = "word-size", default_value_t = 11)]
        word_size: usize,
        #[arg(short = 't', long = "threads", default_value_t = 0)]
        threads: usize,
    },
    /// Search query sequences against a reference FASTA (tabular output)
    Search {
        /// Reference FASTA file
        reference: String,
        /// Query FASTA file
        queries: String,
        /// Output path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        #[arg(long, value_enum, default_value_t = AlphabetArg::Dna)]
        alphabet: AlphabetArg,
        #[command(flatten)]
        scoring: ScoringArgs,
        #[arg(short = 't', long = "threads", default_value_t = 0)]
        threads: usize,
        /// Search only the query as given (no reverse complement)
        #[arg(long = "plus-only")]
        plus_only: bool,
    },
}

#[derive(Args, Debug)]
struct ScoringArgs {
    #[arg(short = 'w', long = "word-size", default_value_t = 11)]
    word_size: usize,
    #[arg(long = "match", default_value_t = 1)]
    match_score: i32,
    #[arg(long = "mismatch", default_value_t = 2)]
    mismatch_penalty: i32,
    #[arg(long = "xdrop", default_value_t = 20)]
    x_dropoff: i32,
    #[arg(short = 'e', long = "evalue", default_value_t = 10.0)]
    evalue: f64,
}

impl From<&ScoringArgs> for ScoringScheme {
    fn from(a: &ScoringArgs) -> Self {
        ScoringScheme {
            match_score: a.match_score,
            mismatch_penalty: a.mismatch_penalty,
            x_dropoff: a.x_dropoff,
            word_size: a.word_size,
            evalue_threshold: a.evalue,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum AlphabetArg {
    Dna,
    Protein,
    Murphy10,
}

impl AlphabetArg {
    fn alphabet(self) -> Alphabet {
        match self {
            AlphabetArg::Dna => Alphabet::nucleotide(),
            AlphabetArg::Protein => Alphabet::protein(),
            AlphabetArg::Murphy10 => Alphabet::murphy10(),
        }
    }

    /// 把 FASTA 原始序列整理成字母表内的符号
    fn prepare(self, alphabet: &Alphabet, seq: &[u8]) -> Vec<u8> {
        match self {
            AlphabetArg::Dna => dna::normalize_seq(seq),
            AlphabetArg::Protein => seq.iter().map(|&b| if alphabet.contains(b) { b } else { b'X' }).collect(),
            AlphabetArg::Murphy10 => reduce_to_murphy10(seq),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Index { reference, alphabet, word_size, threads } => {
            configure_threads(threads);
            run_index(&reference, alphabet, word_size)
        }
        Commands::Search { reference, queries, out, alphabet, scoring, threads, plus_only } => {
            configure_threads(threads);
            // 全局线程池已按 --threads 配置，检索直接使用
            let opt = SearchOpt { scheme: ScoringScheme::from(&scoring), threads: 0, both_strands: !plus_only };
            run_search(&reference, &queries, out.as_deref(), alphabet, opt)
        }
    }
}

fn configure_threads(threads: usize) {
    if threads == 0 {
        return;
    }
    if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
        log::warn!("Failed to configure thread pool: {} (may already be initialized)", e);
    }
}

fn load_reference(
    reference: &str,
    kind: AlphabetArg,
    alphabet: &Alphabet,
    word_size: usize,
) -> Result<(Database<u64>, SeedIndex<u64>)> {
    let records = fasta::read_fasta_file(reference)?;
    if records.is_empty() {
        anyhow::bail!("FASTA file '{}' contains no sequences", reference);
    }

    let encoder = SequenceEncoder::<u64>::full_width(alphabet)?;
    let mut db = Database::new();
    for rec in &records {
        let seq = kind.prepare(alphabet, &rec.seq);
        db.push(&encoder, &rec.name, &seq)
            .map_err(|e| anyhow::anyhow!("cannot encode reference '{}': {}", rec.name, e))?;
    }
    if db.total_len() == 0 {
        anyhow::bail!("FASTA file '{}' contains only empty sequences", reference);
    }

    let mut index = SeedIndex::build(&db, alphabet, word_size)?;
    index.set_meta(IndexMeta {
        reference_file: Some(reference.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });
    Ok((db, index))
}

fn run_index(reference: &str, kind: AlphabetArg, word_size: usize) -> Result<()> {
    let alphabet = kind.alphabet();
    let (db, index) = load_reference(reference, kind, &alphabet, word_size)?;

    println!("reference: {}", reference);
    println!("alphabet: {} ({} bits/symbol)", alphabet.name(), alphabet.bits());
    println!("sequences: {}", db.len());
    println!("total_len: {}", db.total_len());
    println!("word_size: {}", index.word_size());
    println!("distinct_keys: {}", index.num_keys());
    println!("occurrences: {}", index.num_occurrences());
    if let Some(ts) = &index.meta().build_timestamp {
        println!("built: {}", ts);
    }
    Ok(())
}

fn run_search(
    reference: &str,
    queries: &str,
    out_path: Option<&str>,
    kind: AlphabetArg,
    opt: SearchOpt,
) -> Result<()> {
    let alphabet = kind.alphabet();
    let (db, index) = load_reference(reference, kind, &alphabet, opt.scheme.word_size)?;
    log::info!(
        "Indexed {} sequences ({} symbols), {} distinct {}-mers",
        db.len(),
        db.total_len(),
        index.num_keys(),
        index.word_size()
    );

    let searcher = Searcher::new(&db, &index, &alphabet, opt)?;
    let cancel = CancelToken::new();

    let mut out: Box<dyn Write> = match out_path {
        Some(p) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(p).map_err(|e| anyhow::anyhow!("cannot create output '{}': {}", p, e))?,
        )),
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
    };
    writeln!(out, "{}", report::TABULAR_HEADER)?;

    let fh = std::fs::File::open(queries).map_err(|e| anyhow::anyhow!("cannot open query FASTA '{}': {}", queries, e))?;
    let reader = fasta::FastaReader::new(std::io::BufReader::new(fh));
    let (mut n_queries, mut n_hits) = (0usize, 0usize);
    for rec in reader {
        let rec = rec?;
        let seq = kind.prepare(&alphabet, &rec.seq);
        if seq.is_empty() {
            log::warn!("Skipping empty query '{}'", rec.name);
            continue;
        }
        let result = searcher
            .search(&seq, &cancel)
            .map_err(|e| anyhow::anyhow!("query '{}': {}", rec.name, e))?;
        n_queries += 1;
        n_hits += result.num_hits();
        report::write_tabular(&mut out, &rec.name, &result)?;
    }
    out.flush()?;

    log::info!("Searched {} queries, {} hits reported", n_queries, n_hits);
    Ok(())
}
