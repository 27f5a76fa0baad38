//! CLI for the facecat photo catalogue.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use facecat_core::catalog::Catalog;
use facecat_core::config;
use std::path::PathBuf;

use commands::{
    run_enroll, run_forget, run_group, run_identify, run_persons, run_scan, run_status, run_train,
};

/// Top-level CLI for facecat.
#[derive(Debug, Parser)]
#[command(name = "facecat")]
#[command(about = "facecat: catalogue photo folders with a face-recognition service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Detect faces in every new image of a folder and record them.
    Scan {
        /// Folder containing images.
        dir: PathBuf,
        /// Person group the images are catalogued against.
        #[arg(long, value_name = "ID")]
        group: String,
        /// Descend into subfolders.
        #[arg(long, short = 'r')]
        recursive: bool,
        /// Requests in flight at once (default from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Create a person and add one face per image in a folder.
    Enroll {
        /// Person group identifier.
        group: String,
        /// Display name of the new person.
        name: String,
        /// Folder of single-face images of that person.
        dir: PathBuf,
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Train the group once all faces are added.
        #[arg(long)]
        train: bool,
    },

    /// Enrol one person per subfolder of a folder, named after the subfolder.
    EnrollTree {
        group: String,
        /// Folder whose subfolders each hold one person's images.
        root: PathBuf,
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        #[arg(long)]
        train: bool,
    },

    /// Manage person groups.
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Train a person group and wait for it to finish.
    Train {
        group: String,
    },

    /// List persons enrolled in a group.
    Persons {
        group: String,
    },

    /// Identify the faces in one image against a trained group.
    Identify {
        group: String,
        image: PathBuf,
        /// Candidates to return per face.
        #[arg(long, default_value = "1", value_name = "N")]
        candidates: u32,
    },

    /// Show catalogued files.
    Status,

    /// Remove a file from the catalogue so the next scan picks it up again.
    Forget {
        path: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum GroupAction {
    /// Create a person group.
    Create {
        group: String,
        /// Display name (defaults to the id).
        #[arg(long)]
        name: Option<String>,
    },
    /// List person groups.
    List,
    /// Delete a group and forget its catalogued files.
    Delete {
        group: String,
    },
    /// Delete one person from a group.
    RemovePerson {
        group: String,
        person: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!(
            endpoint = %cfg.endpoint,
            retry = ?cfg.retry,
            dispatch = ?cfg.dispatch,
            "loaded config"
        );

        match cli.command {
            CliCommand::Scan {
                dir,
                group,
                recursive,
                jobs,
            } => {
                let catalog = Catalog::open_default().await?;
                run_scan(&catalog, &cfg, &dir, &group, recursive, jobs).await?;
            }
            CliCommand::Enroll {
                group,
                name,
                dir,
                jobs,
                train,
            } => run_enroll(&cfg, &group, Some(&name), &dir, jobs, train).await?,
            CliCommand::EnrollTree {
                group,
                root,
                jobs,
                train,
            } => run_enroll(&cfg, &group, None, &root, jobs, train).await?,
            CliCommand::Group { action } => run_group(&cfg, action).await?,
            CliCommand::Train { group } => run_train(&cfg, &group).await?,
            CliCommand::Persons { group } => run_persons(&cfg, &group).await?,
            CliCommand::Identify {
                group,
                image,
                candidates,
            } => run_identify(&cfg, &group, &image, candidates).await?,
            CliCommand::Status => {
                let catalog = Catalog::open_default().await?;
                run_status(&catalog).await?;
            }
            CliCommand::Forget { path } => {
                let catalog = Catalog::open_default().await?;
                run_forget(&catalog, &path).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
