use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Helpers for the surfaceview compute engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a surfaceview.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub subcommand: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// POST a JSON document and print the JSON response
    PostJson {
        #[arg(long)]
        url: String,
        /// JSON body, or `@path` to read it from a file
        data: String,
    },
    /// Upload a file to a bucket
    Upload {
        /// Defaults to `storage.bucket` from the config file
        #[arg(long)]
        bucket: Option<String>,
        #[arg(long)]
        name: String,
        file: PathBuf,
        /// Leave an existing blob untouched
        #[arg(long)]
        no_replace: bool,
    },
    /// Convert a legacy .vtk mesh into mesh JSON
    VtkToMeshJson {
        vtk_path: PathBuf,
        json_path: PathBuf,
    },
}
