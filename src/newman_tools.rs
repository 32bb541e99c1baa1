use std::io::{self, Write};
use structopt::StructOpt;

use crate::es_cluster::{Cluster, EsError};

pub const DATASET_STATS_INDEX: &str = "dataset_stats";

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "newman-es-tools",
    about = "Manage Newman web UI labels and the dataset statistics index in Elasticsearch.",
    no_version
)]
pub struct Options {
    /// enable verbose reporting
    #[structopt(long)]
    pub verbose: bool,
    /// display version information
    #[structopt(long)]
    pub version: bool,
    /// Name of Elastic Search Cluster
    #[structopt(long = "esCluster", env = "ES_CLUSTER", default_value = "localhost")]
    pub es_cluster: String,
    /// list Elasticsearch indices and the corresponding Newman Web UI labels
    #[structopt(long)]
    pub list: bool,
    /// Change label of an index. Must be used with --esIndex
    #[structopt(long = "changeLabel")]
    pub change_label: Option<String>,
    /// ES index to change the Newman label of. Must be used with --changeLabel
    #[structopt(long = "esIndex")]
    pub es_index: Option<String>,
    /// Delete the dataset statistics ES index so it is rebuilt on next web UI refresh
    #[structopt(long = "deleteStatsIndex")]
    pub delete_stats_index: Option<String>,
}

impl Options {
    /// Any non-empty value asks for deletion.
    pub fn wants_stats_deletion(&self) -> bool {
        self.delete_stats_index.as_deref().map_or(false, |v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    ChangeLabel { index: String, label: String },
    DeleteStatsIndex,
    Nothing,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum UsageError {
    #[error("Error:  No elasticsearch index id specified!")]
    MissingIndex,
    #[error("Error:  Label is not specified")]
    MissingLabel,
}

impl Command {
    /// First match wins: list, label change, stats deletion.
    pub fn from_options(opts: &Options) -> Result<Command, UsageError> {
        if opts.list {
            return Ok(Command::List);
        }
        if opts.change_label.is_some() || opts.es_index.is_some() {
            let index = opts.es_index.clone().ok_or(UsageError::MissingIndex)?;
            let label = opts.change_label.clone().ok_or(UsageError::MissingLabel)?;
            return Ok(Command::ChangeLabel { index, label });
        }
        if opts.wants_stats_deletion() {
            return Ok(Command::DeleteStatsIndex);
        }
        Ok(Command::Nothing)
    }
}

/// Runs the one command `opts` selects. Cluster failures are logged and never abort.
pub fn run(opts: &Options, cluster: &impl Cluster, out: &mut impl Write) -> io::Result<()> {
    let command = match Command::from_options(opts) {
        Ok(command) => command,
        Err(err) => {
            log::error!("{}", err);
            return Ok(());
        }
    };
    match command {
        Command::List => list_indices(cluster, out)?,
        Command::ChangeLabel { index, label } => {
            log::info!("ES Cluster:  {}", opts.es_cluster);
            log::info!("ES Index:  {}", index);
            log::info!("ES Label:  {}", label);
            if let Err(err) = change_label(cluster, &index, &label) {
                log::error!("Error:  Unable to update Elasticsearch index label.  \
                    Please verify that this ES index is a newman index. {}", err);
            }
            delete_stats(cluster);
        }
        Command::DeleteStatsIndex => delete_stats(cluster),
        Command::Nothing => {}
    }
    Ok(())
}

/// Writes `\t<index>\t=>\t<label>` for every index whose label lookup succeeds.
pub fn list_indices(cluster: &impl Cluster, out: &mut impl Write) -> io::Result<()> {
    log::info!("Index => Newman Label Map:");
    let indices = match cluster.index_names() {
        Ok(indices) => indices,
        Err(err) => {
            log::error!("Error:  Unable to list Elasticsearch indices. {}", err);
            return Ok(());
        }
    };
    for index in indices {
        match cluster.first_label(&index) {
            Ok(label) => writeln!(out, "\t{}\t=>\t{}", index, label)?,
            Err(err) => log::debug!("skipping index {}: {}", index, err),
        }
    }
    Ok(())
}

pub fn change_label(cluster: &impl Cluster, index: &str, label: &str) -> Result<(), EsError> {
    cluster.update_label(index, label)?;
    log::info!("index {} label set to {:?}", index, label);
    Ok(())
}

pub fn delete_stats_index(cluster: &impl Cluster) -> Result<(), EsError> {
    cluster.delete_index(DATASET_STATS_INDEX)
}

fn delete_stats(cluster: &impl Cluster) {
    log::info!("Dropping ES Dataset statistics index");
    if let Err(err) = delete_stats_index(cluster) {
        log::error!("Error deleting dataset stats -- make sure it exists \
            and you have permission to do so! {}", err);
    }
    log::info!("{} index should now be deleted!  Please check your ES cluster to verify",
        DATASET_STATS_INDEX);
}
