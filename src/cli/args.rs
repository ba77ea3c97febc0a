//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Category hierarchy manager: acyclic category forest with paths, trees and safe deletes
#[derive(Parser, Debug)]
#[command(name = "catree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Store file (overrides config `store_path`)
    #[arg(long, global = true, env = "CATREE_STORE", value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a category
    Create {
        /// Display name (1-50 chars, unique ignoring case)
        name: String,
        /// Description (up to 500 chars)
        #[arg(short, long)]
        description: Option<String>,
        /// Parent category (id or name); omit for a root
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Update name, description, parent or active flag
    Update {
        /// Category id or name
        category: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description; empty clears it
        #[arg(short, long)]
        description: Option<String>,
        /// Move under this parent (id or name)
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<String>,
        /// Move to the top level
        #[arg(long)]
        root: bool,
        /// Activate or deactivate
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a category; its children move up one level
    Delete {
        /// Category id or name
        category: String,
    },

    /// Show a category with path, item count and subcategories
    Show {
        /// Category id or name
        category: String,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List categories by name
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
        /// Include inactive categories
        #[arg(short, long)]
        all: bool,
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Page size (default: config `page_size`)
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Active root categories
    Roots,

    /// Categories with the most items
    Top {
        /// Number of entries (default: config `top_limit`)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the root-first path of a category
    Path {
        /// Category id or name
        category: String,
    },

    /// Show the active hierarchy as a tree
    Tree {
        /// Subtree root (id or name)
        #[arg(short, long)]
        parent: Option<String>,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List all descendants, depth-first
    Descendants {
        /// Category id or name
        category: String,
    },

    /// Check stored data for broken references and cycles
    Verify,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Create a template config file
    Init {
        /// Write the global config instead of ./.catree.toml
        #[arg(short, long)]
        global: bool,
    },
    /// Show config file locations
    Path,
}
