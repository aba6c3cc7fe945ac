//! Command-line surface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Query the Tripline catalogue through the resilient fetch layer.
#[derive(Debug, Parser)]
#[command(name = "tripline", version)]
pub struct Cli {
    /// Config file (TOML or JSON); otherwise tripline.toml/json is probed
    #[arg(long, global = true, env = "TRIPLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List or look up destinations
    Destinations(ListingArgs),
    /// List or look up events
    Events(ListingArgs),
    /// Feedback left for one event
    Feedback {
        #[arg(long)]
        event_id: String,
    },
    /// Recorded booking transactions
    Transactions,
    /// Request metrics, cache occupancy and queue gauges
    Stats,
    /// Clear local caches and ask the backend to purge its own
    Purge {
        #[arg(value_enum, default_value_t = PurgeTarget::All)]
        target: PurgeTarget,
    },
}

/// At most one selector; none lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
#[group(multiple = false)]
pub struct ListingArgs {
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub slug: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
    /// Full-text search (never cached)
    #[arg(long)]
    pub search: Option<String>,
}

/// Which lookup a [`ListingArgs`] asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector<'a> {
    All,
    Id(&'a str),
    Slug(&'a str),
    Category(&'a str),
    Limit(usize),
    Search(&'a str),
}

impl ListingArgs {
    pub fn selector(&self) -> Selector<'_> {
        if let Some(id) = &self.id {
            Selector::Id(id)
        } else if let Some(slug) = &self.slug {
            Selector::Slug(slug)
        } else if let Some(category) = &self.category {
            Selector::Category(category)
        } else if let Some(limit) = self.limit {
            Selector::Limit(limit)
        } else if let Some(search) = &self.search {
            Selector::Search(search)
        } else {
            Selector::All
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PurgeTarget {
    Destinations,
    Events,
    All,
}
