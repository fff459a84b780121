//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the cybsi binary.

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

/// Cybsi API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "cybsi", about = "Cybsi API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get a single resource by UUID.
    Get {
        /// The type of resource to get.
        resource: Resource,

        /// The resource UUID.
        uuid: Uuid,
    },

    /// List resources page by page.
    List {
        /// The type of resource to list.
        collection: Collection,

        /// Number of items per page.
        #[arg(long)]
        limit: Option<u32>,

        /// Cursor of the page to start from.
        #[arg(long)]
        cursor: Option<String>,

        /// Follow every page instead of printing the first one.
        #[arg(long)]
        all: bool,
    },

    /// Download the entity snapshot of a replist and print its change cursor.
    Entities {
        /// The replist UUID.
        replist: Uuid,

        /// Number of entities per request.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Read replist changes after a cursor.
    Changes {
        /// The replist UUID.
        replist: Uuid,

        /// Change cursor to start from.
        #[arg(long)]
        cursor: String,

        /// Number of changes per request.
        #[arg(long)]
        limit: Option<u32>,

        /// Keep polling and print every batch as it arrives.
        #[arg(long)]
        follow: bool,

        /// Seconds to wait after catching up, with --follow.
        #[arg(long, default_value = "10")]
        interval: u64,
    },
}

/// Resources that can be fetched individually.
#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    /// A reputation list.
    Replist,
    /// An observable entity.
    Entity,
    /// A user.
    User,
    /// A stored search query.
    #[value(alias = "query")]
    StoredQuery,
}

/// Collections that can be listed.
#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum Collection {
    /// Reputation lists.
    #[value(alias = "replist")]
    Replists,
    /// Users.
    #[value(alias = "user")]
    Users,
    /// Stored search queries.
    #[value(alias = "queries")]
    StoredQueries,
}
