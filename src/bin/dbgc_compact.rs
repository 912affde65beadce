//! Streaming cDBG compactor CLI: reads FASTA/FASTQ records with
//! `needletail`, drives a `StreamingCompactor`, and writes the resulting
//! unitig/decision-node set as GFA1. Structured the way the teacher's
//! `src/bin/reference.rs` is (one `Cli` derive, a `run()` returning
//! `anyhow::Result`, `main()` just prints and exits on error).

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use dbgc::alphabet::Dna;
use dbgc::cdbg::Cdbg;
use dbgc::cli::{DiagnosticArgs, GraphArgs, IOArgs, StateArgs, StorageKind, Strand};
use dbgc::compactor::{CompactorConfig, CompactorStats, StreamingCompactor};
use dbgc::dbg::Dbg;
use dbgc::gfa::write_gfa1;
use dbgc::hashing::{CanLemire, FwdLemire, ShiftPolicy};
use dbgc::storage::{BitStorage, ByteStorage, HashSetStorage, NibbleStorage, Persistent, QfStorage, Storage};
use dbgc::traversal::bfs_distance;

#[derive(Parser)]
#[command(
    name = "dbgc-compact",
    about = "Stream reads into a compact de Bruijn graph and write GFA1",
    version
)]
struct Cli {
    #[command(flatten)]
    io: IOArgs,
    #[command(flatten)]
    graph: GraphArgs,
    #[command(flatten)]
    state: StateArgs,
    #[command(flatten)]
    diag: DiagnosticArgs,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    env_logger::init();
    let start_time = Instant::now();
    let cli = Cli::parse();

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.io.n_threads)
        .build_global()
        .context("building Rayon thread pool")?;

    let cdbg = match (cli.graph.storage, cli.graph.strand) {
        (StorageKind::Bit, Strand::Forward) => {
            run_with::<BitStorage, FwdLemire>(&cli, FwdLemire::new(cli.graph.k), make_bit(&cli))?
        }
        (StorageKind::Bit, Strand::Canonical) => {
            run_with::<BitStorage, CanLemire<Dna>>(&cli, CanLemire::new(cli.graph.k), make_bit(&cli))?
        }
        (StorageKind::Byte, Strand::Forward) => {
            run_with::<ByteStorage, FwdLemire>(&cli, FwdLemire::new(cli.graph.k), make_byte(&cli))?
        }
        (StorageKind::Byte, Strand::Canonical) => {
            run_with::<ByteStorage, CanLemire<Dna>>(&cli, CanLemire::new(cli.graph.k), make_byte(&cli))?
        }
        (StorageKind::Nibble, Strand::Forward) => {
            run_with::<NibbleStorage, FwdLemire>(&cli, FwdLemire::new(cli.graph.k), make_nibble(&cli))?
        }
        (StorageKind::Nibble, Strand::Canonical) => {
            run_with::<NibbleStorage, CanLemire<Dna>>(&cli, CanLemire::new(cli.graph.k), make_nibble(&cli))?
        }
        (StorageKind::Qf, Strand::Forward) => {
            run_with::<QfStorage, FwdLemire>(&cli, FwdLemire::new(cli.graph.k), make_qf(&cli))?
        }
        (StorageKind::Qf, Strand::Canonical) => {
            run_with::<QfStorage, CanLemire<Dna>>(&cli, CanLemire::new(cli.graph.k), make_qf(&cli))?
        }
        (StorageKind::HashSet, Strand::Forward) => {
            run_with::<HashSetStorage, FwdLemire>(&cli, FwdLemire::new(cli.graph.k), make_hashset(&cli))?
        }
        (StorageKind::HashSet, Strand::Canonical) => {
            run_with::<HashSetStorage, CanLemire<Dna>>(&cli, CanLemire::new(cli.graph.k), make_hashset(&cli))?
        }
    };

    log::info!(
        "compacted into {} unitigs, {} decision nodes",
        cdbg.unode_ids().count(),
        cdbg.dnode_ids().count()
    );

    let out = BufWriter::new(
        File::create(&cli.io.output_gfa).context("creating GFA output file")?,
    );
    write_gfa1(&cdbg, out).context("writing GFA1 output")?;

    println!("Elapsed time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn make_bit(cli: &Cli) -> BitStorage {
    BitStorage::new(cli.graph.k as u32, cli.graph.table_size, cli.graph.n_tables)
}

fn make_byte(cli: &Cli) -> ByteStorage {
    ByteStorage::new(cli.graph.k as u32, cli.graph.table_size, cli.graph.n_tables)
}

fn make_nibble(cli: &Cli) -> NibbleStorage {
    NibbleStorage::new(cli.graph.k as u32, cli.graph.table_size, cli.graph.n_tables)
}

fn make_qf(cli: &Cli) -> QfStorage {
    QfStorage::new(cli.graph.k as u32, cli.graph.table_size)
}

fn make_hashset(cli: &Cli) -> HashSetStorage {
    HashSetStorage::new(cli.graph.k as u32)
}

/// Build a `StreamingCompactor` over the chosen storage/policy pair, stream
/// every input file's records through it, and return the resulting `Cdbg`.
fn run_with<S, P>(cli: &Cli, policy: P, default_storage: S) -> Result<Cdbg>
where
    S: Storage + Persistent + Send,
    P: ShiftPolicy + Clone + Send + Sync,
    P::Hash: dbgc::hashing::value::HashValue,
{
    let storage = if let Some(path) = &cli.state.load_state {
        S::load(path).context("loading --load-state storage file")?
    } else {
        default_storage
    };

    let dbg = Dbg::new(storage, policy);
    let compactor = StreamingCompactor::new(
        dbg,
        CompactorConfig {
            k: cli.graph.k,
            max_unitig_len: cli.graph.max_unitig_len,
        },
    );

    let mut total = CompactorStats::default();
    let mut first_seed: Option<Vec<u8>> = None;

    for path in &cli.io.inputs {
        process_file(&compactor, path, cli.graph.k, &mut total, &mut first_seed)?;
    }
    log::debug!(
        "{} reads processed, {} k-mers inserted, {} unitigs built, {} extended, {} merged",
        total.reads_processed,
        total.kmers_inserted,
        total.unodes_built,
        total.unodes_extended,
        total.unodes_merged
    );

    if let Some(max_steps) = cli.diag.report_component_sizes {
        report_component_size(&compactor, first_seed.as_deref(), max_steps)?;
    }

    let (dbg, cdbg) = compactor.into_parts();
    if let Some(path) = &cli.state.save_state {
        dbg.storage()
            .save(path)
            .context("writing --save-state storage file")?;
    }
    Ok(cdbg)
}

fn process_file<S, P>(
    compactor: &StreamingCompactor<S, P>,
    path: &PathBuf,
    k: usize,
    total: &mut CompactorStats,
    first_seed: &mut Option<Vec<u8>>,
) -> Result<()>
where
    S: Storage,
    P: ShiftPolicy + Clone,
    P::Hash: dbgc::hashing::value::HashValue,
{
    let mut reader =
        needletail::parse_fastx_file(path).with_context(|| format!("opening {:?}", path))?;
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("compacting {:?}", path));

    let mut n = 0u64;
    while let Some(record) = reader.next() {
        let record = record.with_context(|| format!("reading a record from {:?}", path))?;
        let seq = record.seq();
        if seq.len() < k {
            continue;
        }
        if first_seed.is_none() {
            *first_seed = Some(seq[..k].to_vec());
        }
        match compactor.process_read(&seq) {
            Ok(stats) => *total += stats,
            Err(e) => log::debug!("skipping a read in {:?}: {}", path, e),
        }
        n += 1;
        if n % 1000 == 0 {
            pb.set_message(format!("compacting {:?} ({} reads)", path, n));
        }
    }
    pb.finish_with_message(format!("done with {:?} ({} reads)", path, n));
    Ok(())
}

fn report_component_size<S, P>(
    compactor: &StreamingCompactor<S, P>,
    seed: Option<&[u8]>,
    max_steps: usize,
) -> Result<()>
where
    S: Storage,
    P: ShiftPolicy + Clone,
    P::Hash: dbgc::hashing::value::HashValue,
{
    let Some(seed) = seed else {
        log::warn!("--report-component-sizes requested but no read was long enough to seed it");
        return Ok(());
    };
    let (dbg, _) = compactor.parts();
    let dbg = dbg.lock();
    let dist = bfs_distance(dbg.storage(), dbg.policy().clone(), seed, seed, max_steps)
        .context("running bounded BFS for --report-component-sizes")?;
    match dist {
        Some(d) => log::info!("seed k-mer revisited after {} bases within the bound", d),
        None => log::info!(
            "breadth-first search from the seed k-mer found no cycle within {} steps",
            max_steps
        ),
    }
    Ok(())
}
