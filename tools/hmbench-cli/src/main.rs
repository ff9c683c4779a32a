//! hmbench command-line tool
//!
//! Runs the dataset-specific preprocessing on HIPE-2022 files, prints the
//! sweep grid and drives sweeps through the manifest backend.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hmbench_core::{DatasetId, DatasetSpec, NormalizeOptions, NormalizerRegistry};
use hmbench_trainer::data::default_data_dir;
use hmbench_trainer::trainer::config_stem;
use hmbench_trainer::{CorpusPreparer, ManifestBackend, SweepConfig, SweepRunner};
use tracing::{Level, info, warn};

/// CLI arguments
#[derive(Parser)]
#[command(name = "hmbench")]
#[command(about = "Historical NER corpus preprocessing and fine-tuning sweeps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

/// Options of the shared preprocessing steps.
#[derive(Args, Debug, Clone)]
struct PreprocessArgs {
    /// Do not insert `-DOCSTART-` boundaries
    #[arg(long)]
    no_document_separator: bool,

    /// Marker that ends a sentence in the metadata column
    #[arg(long)]
    eos_marker: Option<String>,

    /// Line prefix that opens a new document
    #[arg(long)]
    document_separator: Option<String>,

    /// 0-based index of the metadata column
    #[arg(long)]
    metadata_column: Option<usize>,
}

impl PreprocessArgs {
    fn options(self) -> NormalizeOptions {
        let mut options =
            NormalizeOptions::default().with_document_boundaries(!self.no_document_separator);
        if let Some(marker) = self.eos_marker {
            options = options.with_eos_marker(marker);
        }
        if let Some(separator) = self.document_separator {
            options = options.with_document_separator(separator);
        }
        if let Some(column) = self.metadata_column {
            options = options.with_metadata_column(column);
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the preprocessing of one dataset to a single file
    Normalize {
        /// Dataset and language, e.g. `newseye/de`
        #[arg(short, long)]
        dataset: DatasetSpec,

        /// Raw HIPE-2022 TSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Destination of the corrected file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },
    /// List the datasets and their preprocessing
    Datasets,
    /// Preprocess every split of the datasets named in a sweep config
    Prepare {
        /// Sweep configuration (JSON)
        #[arg(short, long, env = "CONFIG")]
        config: PathBuf,

        /// Root of the raw corpora
        #[arg(short = 'D', long, env = "HMBENCH_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Where the corrected files are written
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },
    /// Print the run grid as JSON lines
    Plan {
        /// Sweep configuration (JSON)
        #[arg(short, long, env = "CONFIG")]
        config: PathBuf,

        /// Hub organisation for repository ids
        #[arg(long, env = "HUB_ORG_NAME")]
        org: Option<String>,
    },
    /// Run a sweep, writing a manifest per run
    Sweep {
        /// Sweep configuration (JSON)
        #[arg(short, long, env = "CONFIG")]
        config: PathBuf,

        /// Root of the raw corpora
        #[arg(short = 'D', long, env = "HMBENCH_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Root of the run directories
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Hub organisation for repository ids
        #[arg(long, env = "HUB_ORG_NAME")]
        org: Option<String>,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },
}

fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::WARN;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Work directory for corrected files when none is given.
fn default_out_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("preprocessed")
}

fn datasets_table(registry: &NormalizerRegistry) -> Vec<String> {
    let mut rows = Vec::new();
    for &dataset in DatasetId::all() {
        let mut found = false;
        for (id, language, normalizer) in registry.entries() {
            if id == dataset {
                found = true;
                rows.push(format!("{id}/{}\t{normalizer}", language.unwrap_or("*")));
            }
        }
        if !found {
            let any = DatasetSpec::new(dataset, "*");
            match registry.resolve(&any) {
                Some(normalizer) => rows.push(format!("{any}\t{normalizer}")),
                None => rows.push(format!("{any}\t-")),
            }
        }
    }
    rows
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose, cli.quiet))
        .with_writer(std::io::stderr)
        .init();

    let registry = NormalizerRegistry::hipe2022();

    match cli.command {
        Commands::Normalize {
            dataset,
            input,
            output,
            preprocess,
        } => {
            let Some(normalizer) = registry.resolve(&dataset) else {
                anyhow::bail!("No preprocessing for {dataset}, it is loaded as distributed");
            };
            let options = preprocess.options();
            let report = normalizer
                .normalize_file(&input, &output, &options)
                .with_context(|| format!("Failed to normalize {}", input.display()))?;
            info!(merges = report.merges, "wrote {}", output.display());
        }
        Commands::Datasets => {
            for row in datasets_table(&registry) {
                println!("{row}");
            }
        }
        Commands::Prepare {
            config,
            data_dir,
            out_dir,
            preprocess,
        } => {
            let config = SweepConfig::from_path(&config)?;
            let data_dir = data_dir.unwrap_or_else(default_data_dir);
            let out_dir = out_dir.unwrap_or_else(|| default_out_dir(&data_dir));
            let preparer =
                CorpusPreparer::new(&data_dir, &out_dir).with_options(preprocess.options());

            for spec in &config.hipe_datasets {
                for prepared in preparer.prepare(spec)? {
                    match prepared.report {
                        Some(report) => info!(
                            dataset = %spec,
                            split = %prepared.split,
                            merges = report.merges,
                            "prepared {}",
                            prepared.path.display()
                        ),
                        None => warn!(
                            dataset = %spec,
                            split = %prepared.split,
                            "no preprocessing, using {}",
                            prepared.path.display()
                        ),
                    }
                    println!("{}", prepared.path.display());
                }
            }
        }
        Commands::Plan { config, org } => {
            let stem = config_stem(&config);
            let config = SweepConfig::from_path(&config)?;
            for run in config.runs() {
                let hub = org.as_deref().map(|org| run.hub_target(org, &stem));
                let line = serde_json::json!({
                    "output_path": run.output_path(),
                    "repo_name": run.repo_name(&stem),
                    "hub": hub,
                    "run": run,
                });
                println!("{line}");
            }
        }
        Commands::Sweep {
            config,
            data_dir,
            out_dir,
            org,
            preprocess,
        } => {
            let stem = config_stem(&config);
            let config = SweepConfig::from_path(&config)?;
            let data_dir = data_dir.unwrap_or_else(default_data_dir);
            let preparer = CorpusPreparer::new(&data_dir, default_out_dir(&data_dir))
                .with_options(preprocess.options());

            let mut backend = ManifestBackend::new(stem);
            if let Some(org) = org {
                backend = backend.with_organisation(org);
            }

            let mut runner = SweepRunner::new(config, preparer, backend).with_output_root(out_dir);
            for run_dir in runner.run()? {
                println!("{}", run_dir.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, false), Level::INFO);
        assert_eq!(log_level(2, false), Level::TRACE);
        assert_eq!(log_level(0, true), Level::WARN);
    }

    #[test]
    fn test_preprocess_options() {
        let args = PreprocessArgs {
            no_document_separator: true,
            eos_marker: Some("EOS".into()),
            document_separator: None,
            metadata_column: Some(3),
        };
        let options = args.options();
        let expected = NormalizeOptions::default()
            .with_document_boundaries(false)
            .with_eos_marker("EOS")
            .with_metadata_column(3);
        assert_eq!(options, expected);
    }

    #[test]
    fn test_datasets_table() {
        let rows = datasets_table(&NormalizerRegistry::hipe2022());
        assert!(rows.contains(&"ajmc/*\tajmc".to_owned()));
        assert!(rows.contains(&"newseye/fi\tnewseye-fi-sv".to_owned()));
        assert!(rows.contains(&"letemps/*\thipe-2022".to_owned()));
        assert!(rows.contains(&"icdar/*\t-".to_owned()));
    }

    #[test]
    fn test_cli_parses_dataset_spec() {
        let cli = Cli::try_parse_from([
            "hmbench", "normalize", "-d", "hipe2020/fr", "-i", "in.tsv", "-o", "out.tsv",
        ])
        .unwrap();
        match cli.command {
            Commands::Normalize { dataset, .. } => assert_eq!(dataset.to_string(), "hipe2020/fr"),
            _ => panic!("expected normalize"),
        }
    }

    #[test]
    fn test_sweep_accepts_preprocess_flags() {
        let cli = Cli::try_parse_from([
            "hmbench",
            "sweep",
            "-c",
            "hmbert.json",
            "--no-document-separator",
            "--eos-marker",
            "EOS",
        ])
        .unwrap();
        match cli.command {
            Commands::Sweep { preprocess, .. } => {
                let options = preprocess.options();
                assert_eq!(
                    options,
                    NormalizeOptions::default()
                        .with_document_boundaries(false)
                        .with_eos_marker("EOS")
                );
            }
            _ => panic!("expected sweep"),
        }
    }
}
