#![allow(clippy::cast_precision_loss)]
//! `annidx` CLI — a small demonstration harness for the HNSW and IVFFlat
//! engines in `annidx-core`.
//!
//! Usage:
//!   `annidx hnsw --dim 128 --rows 5000 --queries 5`
//!   `annidx ivfflat --dim 128 --rows 5000 --lists 32 --probes 4`

mod dataset;
mod report;

use annidx_core::distance::OpClass;
use annidx_core::index::hnsw::{insert_element, HnswBuildParams, HnswGraph, LockStripes, SearchParams};
use annidx_core::index::ivfflat;
use annidx_core::storage::{HnswMeta, InMemoryBufferManager, InMemoryWal, ItemPointer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "annidx")]
#[command(author, version, about = "Demonstration harness for the annidx ANN index engines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an HNSW graph over a synthetic clustered dataset and run sample queries.
    Hnsw {
        /// Vector dimensionality.
        #[arg(long, default_value_t = 64)]
        dim: usize,
        /// Number of rows to insert.
        #[arg(long, default_value_t = 2000)]
        rows: usize,
        /// Number of synthetic clusters rows are drawn from.
        #[arg(long, default_value_t = 8)]
        clusters: usize,
        /// Bi-directional links per node.
        #[arg(long, default_value_t = 16)]
        m: usize,
        /// Candidate list size during construction.
        #[arg(long, default_value_t = 64)]
        ef_construction: usize,
        /// Candidate list size during search.
        #[arg(long, default_value_t = 40)]
        ef_search: usize,
        /// Number of sample queries to run after the build.
        #[arg(long, default_value_t = 5)]
        queries: usize,
        /// Results per query.
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// RNG seed, for reproducible datasets.
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Load rows from a JSONL file instead of generating synthetic data.
        #[arg(long)]
        input: Option<std::path::PathBuf>,
    },
    /// Build an IVFFlat index over a synthetic clustered dataset and run sample queries.
    Ivfflat {
        /// Vector dimensionality.
        #[arg(long, default_value_t = 64)]
        dim: usize,
        /// Number of rows to insert.
        #[arg(long, default_value_t = 2000)]
        rows: usize,
        /// Number of synthetic clusters rows are drawn from.
        #[arg(long, default_value_t = 8)]
        clusters: usize,
        /// Number of centroid lists to train.
        #[arg(long, default_value_t = 16)]
        lists: usize,
        /// Number of lists probed per query.
        #[arg(long, default_value_t = 2)]
        probes: usize,
        /// Number of sample queries to run after the build.
        #[arg(long, default_value_t = 5)]
        queries: usize,
        /// Results per query.
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// RNG seed, for reproducible datasets.
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Load rows from a JSONL file instead of generating synthetic data.
        #[arg(long)]
        input: Option<std::path::PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Hnsw {
            dim,
            rows,
            clusters,
            m,
            ef_construction,
            ef_search,
            queries,
            k,
            seed,
            input,
        } => run_hnsw(dim, rows, clusters, m, ef_construction, ef_search, queries, k, seed, input),
        Commands::Ivfflat {
            dim,
            rows,
            clusters,
            lists,
            probes,
            queries,
            k,
            seed,
            input,
        } => run_ivfflat(dim, rows, clusters, lists, probes, queries, k, seed, input),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_hnsw(
    dim: usize,
    rows: usize,
    clusters: usize,
    m: usize,
    ef_construction: usize,
    ef_search: usize,
    queries: usize,
    k: usize,
    seed: u64,
    input: Option<std::path::PathBuf>,
) -> Result<()> {
    let opclass = OpClass::l2(dim);
    let params = HnswBuildParams::new(m, ef_construction).context("invalid HNSW build params")?;
    let search_params = SearchParams::new(ef_search).context("invalid HNSW search params")?;

    let mut rng = StdRng::seed_from_u64(seed);
    let data = match &input {
        Some(path) => dataset::from_jsonl(path)?,
        None => dataset::clustered(dim, rows, clusters, &mut rng),
    };

    let buffer = InMemoryBufferManager::new();
    let wal = InMemoryWal::new();
    let locks = LockStripes::new(1024);
    let mut meta = HnswMeta::new(
        u32::try_from(dim).context("dimension too large")?,
        u16::try_from(m).context("m too large")?,
        u16::try_from(ef_construction).context("ef_construction too large")?,
    );

    let bar = ProgressBar::new(data.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} rows inserted ({eta})")
            .unwrap(),
    );
    let start = Instant::now();
    for (tid, vector) in &data {
        insert_element(
            &buffer, &wal, &locks, &opclass, &params, &mut meta, *tid, vector.clone(), &mut rng,
        )?;
        bar.inc(1);
    }
    bar.finish();
    let build_elapsed = start.elapsed();

    println!(
        "{}",
        report::build_summary("HNSW", data.len(), dim, build_elapsed)
    );

    let Some(entry) = meta.entry else {
        println!("index is empty, nothing to query");
        return Ok(());
    };
    let graph = HnswGraph::new(&buffer, &opclass);
    let entry_ptr = ItemPointer::new(entry.blkno, entry.offno);

    for i in 0..queries {
        let (_, query) = &data[i % data.len()];
        let start = Instant::now();
        let results = graph.knn_search(query, k, search_params.ef_search, entry_ptr, usize::from(entry.level))?;
        let elapsed = start.elapsed();
        let mut scored = Vec::with_capacity(results.len());
        for (ptr, dist) in results {
            scored.push((graph.load(ptr)?.tid, dist));
        }
        println!("{}", report::query_table(i, elapsed, &scored));
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_ivfflat(
    dim: usize,
    rows: usize,
    clusters: usize,
    lists: usize,
    probes: usize,
    queries: usize,
    k: usize,
    seed: u64,
    input: Option<std::path::PathBuf>,
) -> Result<()> {
    let opclass = OpClass::l2(dim);
    let mut rng = StdRng::seed_from_u64(seed);
    let data = match &input {
        Some(path) => dataset::from_jsonl(path)?,
        None => dataset::clustered(dim, rows, clusters, &mut rng),
    };

    let buffer = InMemoryBufferManager::new();

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} training IVFFlat lists...").unwrap());
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    let start = Instant::now();
    let (mut directory, kmeans) = ivfflat::build_index(
        &buffer,
        &opclass,
        lists,
        data.iter().cloned(),
        0,
        &mut rng,
    )?;
    bar.finish_and_clear();
    let build_elapsed = start.elapsed();

    println!(
        "{}",
        report::build_summary("IVFFlat", data.len(), dim, build_elapsed)
    );
    println!(
        "trained {} lists in {} iterations (inertia {:.2})",
        lists, kmeans.iterations, kmeans.inertia
    );

    for i in 0..queries {
        let (_, query) = &data[i % data.len()];
        let start = Instant::now();
        let results = ivfflat::scan_index(&buffer, &opclass, &directory, query, k, probes)?;
        let elapsed = start.elapsed();
        println!("{}", report::query_table(i, elapsed, &results));
    }

    let extra_tid = data.len() as u64;
    let (_, extra_vector) = &data[0];
    ivfflat::insert_row(&buffer, &opclass, &mut directory, extra_tid, extra_vector.clone())?;

    Ok(())
}
