// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::commands::{cat, log, mv, rm, save, serve};
use cmd::common::{ConfigOverrides, RevsContext};
use tokio::io::BufReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "revs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace directory (defaults to REVS_WORKSPACE, then the current directory)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// JSON file with root, suffix and firstSave settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the revision logs, relative to the workspace
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Extension of every log file
    #[arg(long, global = true)]
    suffix: Option<String>,

    /// What the first save of an untracked file stores: seed-only or seed-then-append
    #[arg(long, global = true)]
    first_save: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the current content of a file as a new revision
    Save {
        /// Workspace-relative file path
        path: String,
    },
    /// List the stored revisions of a file
    Log {
        /// Workspace-relative file path
        path: String,
    },
    /// Print a file as of a stored revision
    Cat {
        /// Workspace-relative file path
        path: String,
        /// Timestamp of the revision to stop at (default: latest)
        #[arg(long)]
        at: Option<i64>,
    },
    /// Move the stored history of a file or folder
    Mv {
        from: String,
        to: String,
        /// Treat the paths as folders and move the whole subtree
        #[arg(long)]
        folder: bool,
    },
    /// Delete the stored history of a file or folder
    Rm {
        path: String,
        /// Treat the path as a folder and delete the whole subtree
        #[arg(long)]
        folder: bool,
    },
    /// Answer revisions messages read as JSON lines from stdin
    Serve {
        /// Identity of the user the messages come from
        #[arg(long, default_value = "local")]
        user: String,
    },
}

#[allow(clippy::print_stdout)]
fn stdout_line(output: String) {
    print!("{output}");
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init();

    let cli = Cli::parse();
    let ctx = RevsContext::new(cli.workspace)
        .with_config_file(cli.config)
        .with_overrides(ConfigOverrides {
            root: cli.root,
            suffix: cli.suffix,
            first_save: cli.first_save,
        });

    match cli.command {
        Commands::Save { path } => save::save_command(&ctx, &path, stdout_line).await,
        Commands::Log { path } => log::log_command(&ctx, &path, stdout_line).await,
        Commands::Cat { path, at } => cat::cat_command(&ctx, &path, at, stdout_line).await,
        Commands::Mv { from, to, folder } => mv::mv_command(&ctx, &from, &to, folder, stdout_line).await,
        Commands::Rm { path, folder } => rm::rm_command(&ctx, &path, folder, stdout_line).await,
        Commands::Serve { user } => {
            let stdin = BufReader::new(tokio::io::stdin());
            serve::serve_command(&ctx, &user, stdin, stdout_line).await
        }
    }
}
