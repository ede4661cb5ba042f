use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use gocobertura::cli::{self, CoverageOptions};
use gocobertura::ignore::IgnoreConfig;
use gocobertura::report::Format;

/// gocobertura: convert Go coverage profiles into Cobertura reports.
#[derive(Parser)]
#[command(name = "gocobertura", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a `go test -coverprofile` file into a coverage report.
    Coverage {
        /// Coverage profile to read (default: stdin).
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Where to write the report (default: stdout).
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Directory containing the module's go.mod.
        #[arg(long, default_value = ".")]
        module_root: PathBuf,

        /// Code coverage by file, not by receiver type.
        #[arg(long)]
        by_files: bool,

        /// Ignore files carrying a "Code generated ... DO NOT EDIT." banner.
        #[arg(long)]
        ignore_gen_files: bool,

        /// Ignore files whose directory matches this regexp.
        #[arg(long)]
        ignore_dirs: Option<String>,

        /// Ignore files whose name matches this regexp.
        #[arg(long)]
        ignore_files: Option<String>,

        /// Ignore files whose module-relative path matches this regexp.
        #[arg(long)]
        ignore_paths: Option<String>,

        /// Ignore files whose content matches this regexp.
        #[arg(long)]
        ignore_content: Option<String>,

        /// Report format.
        #[arg(long, value_enum, default_value = "xml")]
        format: Format,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Coverage {
            input,
            output,
            module_root,
            by_files,
            ignore_gen_files,
            ignore_dirs,
            ignore_files,
            ignore_paths,
            ignore_content,
            format,
        } => {
            let opts = CoverageOptions {
                module_root,
                by_files,
                ignore: IgnoreConfig {
                    paths: ignore_paths,
                    dirs: ignore_dirs,
                    files: ignore_files,
                    content: ignore_content,
                    generated: ignore_gen_files,
                },
                format,
                timestamp: None,
            };

            let profile = match &input {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read coverage profile from stdin")?;
                    buf
                }
            };

            let report = cli::cmd_coverage(&profile, &opts)?;

            match &output {
                Some(path) => std::fs::write(path, report)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{}", report),
            }
            Ok(())
        }
    }
}
