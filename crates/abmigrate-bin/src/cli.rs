use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "abmigrate")]
#[command(version)]
#[command(about = "Migrate .ab script trees to the prefixed stdlib naming scheme")]
#[command(
    long_about = "A one-shot migration tool that rewrites .ab scripts against a symbol-renaming table: imports and call sites are updated to the new prefixed names, and script files can be renamed to match."
)]
pub struct Cli {
    #[arg(short, long, help = "Rewrite imports and call sites in file contents")]
    pub modify: bool,

    #[arg(short, long, help = "Rename script files to their mapped names")]
    pub rename: bool,

    #[arg(short, long, help = "Report intended changes without touching the filesystem")]
    pub dry_run: bool,

    #[arg(help = "Root directory to migrate (defaults to current directory)")]
    pub target: Option<PathBuf>,

    #[arg(long, help = "Mapping file (defaults to abmigrate.txt in the target directory)")]
    pub mappings: Option<PathBuf>,

    #[arg(long, help = "Rename with a plain filesystem move instead of 'git mv'")]
    pub no_git: bool,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
