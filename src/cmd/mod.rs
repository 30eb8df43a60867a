mod convert;
mod glob_util;
mod inspect;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "db-converter")]
#[command(version)]
#[command(
    about = "Convert MyISAM SQL dumps to InnoDB with inferred foreign keys",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite a dump for another storage engine and add foreign key constraints
    Convert {
        /// Input SQL file or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Output SQL file (default: <stem>_innodb<ext> next to the input, single file only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML config file (engines, suffix, substitutions)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source storage engine (default: MyISAM)
        #[arg(long)]
        from: Option<String>,

        /// Target storage engine (default: InnoDB)
        #[arg(long)]
        to: Option<String>,

        /// Suffix inserted before the output file extension (default: _innodb)
        #[arg(long)]
        suffix: Option<String>,

        /// Keep composite primary keys instead of adding a surrogate `id` column
        #[arg(long)]
        keep_composite_keys: bool,

        /// Where foreign keys go: alter, inline (default: alter)
        #[arg(long)]
        foreign_keys: Option<String>,

        /// Drop foreign keys with no owning table instead of failing
        #[arg(long)]
        skip_unresolved: bool,

        /// Preview without writing files (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// List tables, primary keys and inferred foreign keys of a dump
    Inspect {
        /// Input SQL file (supports .gz, .bz2, .xz, .zst compression)
        file: PathBuf,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Convert {
            file,
            output,
            config,
            from,
            to,
            suffix,
            keep_composite_keys,
            foreign_keys,
            skip_unresolved,
            dry_run,
            json,
            verbose,
            fail_fast,
        } => convert::run(convert::ConvertArgs {
            file,
            output,
            config,
            from,
            to,
            suffix,
            keep_composite_keys,
            foreign_keys,
            skip_unresolved,
            dry_run,
            json,
            verbose,
            fail_fast,
        }),
        Commands::Inspect { file, json } => inspect::run(file, json),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "db-converter",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
