use clap::Parser;
use gfamap::gfa::{Gfa, GfaConfig};
use log::info;
use rayon::ThreadPoolBuilder;
use std::io;
use std::num::NonZeroUsize;

/// Command-line tool for loading GFA assembly graphs.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
struct Args {
    /// Path to the GFA file (v1.0 or v1.1)
    #[clap(value_parser)]
    gfa_file: String,

    /// Skip segment sequences (vertex labels)
    #[clap(long, action)]
    no_sequences: bool,

    /// Skip P/W reference lines
    #[clap(long, action)]
    no_references: bool,

    /// Number of threads for parallel processing.
    #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(num_cpus::get().max(1)).unwrap())]
    num_threads: NonZeroUsize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    ThreadPoolBuilder::new()
        .num_threads(args.num_threads.into())
        .build_global()
        .unwrap();

    let config = GfaConfig {
        include_vertex_labels: !args.no_sequences,
        include_references: !args.no_references,
    };

    info!("Parsing {}", args.gfa_file);
    let gfa = Gfa::from_file(&args.gfa_file, &config).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to parse GFA from {}: {}", args.gfa_file, e),
        )
    })?;

    print_stats(&gfa);

    Ok(())
}

fn print_stats(gfa: &Gfa) {
    if let Some(version) = gfa.version {
        println!("GFA version: {}", version.as_tag());
    }
    println!("Number of vertices: {}", gfa.vertex_count());
    println!("Number of edges: {}", gfa.edge_count());
    println!(
        "Vertex ID range: {}-{}",
        gfa.min_vertex_id, gfa.max_vertex_id
    );
    println!("Number of references: {}", gfa.reference_count());

    for reference in &gfa.references {
        info!(
            "{}\t{} line\t{} steps\t{} bp",
            reference.tag(),
            reference.line_kind,
            reference.step_count(),
            reference.hap_len()
        );
    }
}
