use anyhow::Context;
use clap::Parser;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ibm4_core::{parse_plaintext, parse_word_classes, write_moses, Model4, SeedTables, TrainOptions};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short='s', long="source", default_value="-")]
    source: String,
    #[arg(short='t', long="target", default_value="-")]
    target: String,
    #[arg(long="source-classes")]
    source_classes: String,
    #[arg(long="target-classes")]
    target_classes: String,
    #[arg(short='i', long="iterations", default_value_t=5)]
    iterations: usize,
    #[arg(long, default_value_t=false)]
    parallel: bool,
    /// JSON tables to start from instead of running Models 1 to 3.
    #[arg(long="tables")]
    tables: Option<String>,
    #[arg(long="save-tables")]
    save_tables: Option<String>,
    #[arg(short='o', long="output", default_value="-")]
    output: String,
    #[arg(long="log-level", default_value="info")]
    log_level: String,
}

fn read_all(path: &str) -> std::io::Result<String> {
    if path == "-" {
        use std::io::Read;
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s)?;
        Ok(s)
    } else {
        fs::read_to_string(path)
    }
}

fn write_all(path: &str, data: &str) -> std::io::Result<()> {
    if path == "-" { print!("{data}"); }
    else { fs::write(path, data)?; }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if args.source == "-" && args.target == "-" {
        anyhow::bail!("source and target cannot both be read from stdin");
    }
    let src_s = read_all(&args.source).with_context(|| format!("reading {}", args.source))?;
    let trg_s = read_all(&args.target).with_context(|| format!("reading {}", args.target))?;
    let mut corpus = parse_plaintext(&src_s, &trg_s)?;

    let source_classes = read_all(&args.source_classes)
        .with_context(|| format!("reading {}", args.source_classes))?;
    let source_classes = parse_word_classes(&source_classes)
        .with_context(|| format!("parsing {}", args.source_classes))?;
    let target_classes = read_all(&args.target_classes)
        .with_context(|| format!("reading {}", args.target_classes))?;
    let target_classes = parse_word_classes(&target_classes)
        .with_context(|| format!("parsing {}", args.target_classes))?;

    let seed = match args.tables.as_ref() {
        Some(p) => {
            let json = read_all(p).with_context(|| format!("reading {p}"))?;
            let tables: SeedTables = serde_json::from_str(&json).with_context(|| format!("parsing {p}"))?;
            Some(tables)
        }
        None => None,
    };

    let opts = TrainOptions { iterations: args.iterations, parallel: args.parallel };
    info!(sentences = corpus.len(), iterations = opts.iterations, "training IBM Model 4");
    let model = Model4::fit(&mut corpus, &source_classes, &target_classes, opts, seed)?;

    write_all(&args.output, &write_moses(&corpus))?;
    if let Some(p) = args.save_tables.as_ref() {
        let json = serde_json::to_string(model.tables())?;
        write_all(p, &json).with_context(|| format!("writing {p}"))?;
    }

    Ok(())
}
