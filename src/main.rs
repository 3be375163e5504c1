use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use vargraph::graph::VariationGraph;

/// Vargraph: succinct dynamic variation graph toolkit
#[derive(Parser)]
#[command(
    name = "vargraph",
    about = "Build, inspect, and export dynamic variation graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a binary graph from a GFA file
    Build {
        /// Path to the input GFA file
        #[arg(short, long)]
        input: String,
        /// Path to the output graph file
        #[arg(short, long, default_value = "graph.vg")]
        output: String,
        /// Write progress to stderr
        #[arg(short, long, default_value_t = false)]
        progress: bool,
    },
    /// Write a graph back out as GFA
    View {
        /// Path to the graph file (binary, or GFA for on-the-fly conversion)
        #[arg(short, long)]
        input: String,
    },
    /// Print summary statistics for a graph
    Stats {
        /// Path to the graph file
        #[arg(short, long)]
        input: String,
    },
    /// Interrogate the embedded paths of a graph
    Paths {
        /// Path to the graph file
        #[arg(short, long)]
        input: String,
        /// Print the paths in the graph to stdout, one per line
        #[arg(short = 'L', long, default_value_t = false)]
        list: bool,
        /// Print paths in FASTA format to stdout
        #[arg(short, long, default_value_t = false)]
        fasta: bool,
    },
}

/// Load a graph from a binary snapshot, or convert a `.gfa` file on the fly.
fn load_graph(path: &str, progress: bool) -> io::Result<VariationGraph> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    if path.ends_with(".gfa") {
        VariationGraph::from_gfa(reader, progress)
    } else {
        VariationGraph::load(&mut reader)
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Build {
            input,
            output,
            progress,
        } => {
            let mut graph = load_graph(input, *progress)?;
            eprintln!(
                "[INFO] Built graph with {} nodes, {} edges, {} paths",
                graph.node_size(),
                graph.get_edge_count(),
                graph.get_path_count()
            );
            let file = File::create(output)?;
            let mut writer = BufWriter::new(file);
            graph.serialize(&mut writer)?;
            writer.flush()?;
            eprintln!("[INFO] Wrote graph to {}", output);
        }
        Commands::View { input } => {
            let graph = load_graph(input, false)?;
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            graph.to_gfa(&mut out)?;
            out.flush()?;
        }
        Commands::Stats { input } => {
            let graph = load_graph(input, false)?;
            println!("nodes\t{}", graph.node_size());
            println!("edges\t{}", graph.get_edge_count());
            println!("paths\t{}", graph.get_path_count());
            println!("length\t{}", graph.total_sequence_length());
            if graph.node_size() > 0 {
                println!("min-id\t{}", graph.min_node_id());
                println!("max-id\t{}", graph.max_node_id());
            }
        }
        Commands::Paths { input, list, fasta } => {
            if !list && !fasta {
                eprintln!(
                    "[ERROR] please specify one of -L,--list or -f,--fasta"
                );
                std::process::exit(1);
            }
            let graph = load_graph(input, false)?;
            let mut paths = Vec::new();
            graph.for_each_path_handle(|p| paths.push(p));
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for path in paths {
                if *list {
                    writeln!(
                        out,
                        "{}\t{}",
                        graph.get_path_name(path),
                        graph.get_occurrence_count(path)
                    )?;
                }
                if *fasta {
                    writeln!(out, ">{}", graph.get_path_name(path))?;
                    let seq = graph.path_sequence(path);
                    for chunk in seq.as_bytes().chunks(60) {
                        writeln!(out, "{}", std::str::from_utf8(chunk).unwrap())?;
                    }
                }
            }
            out.flush()?;
        }
    }
    Ok(())
}
