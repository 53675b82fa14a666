mod checkout;
mod commands;
mod commit;
mod delta;
mod error;
mod object;
mod pack;
mod protocol;
mod repo;
mod store;
mod tree;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use object::Kind;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty Git repository
    Init,

    /// Provide content or type and size information for repository objects
    CatFile {
        /// Show object type
        #[arg(short, conflicts_with = "size_only")]
        type_only: bool,

        /// Show object size
        #[arg(short, conflicts_with = "type_only")]
        size_only: bool,

        /// Pretty-print object's content
        #[arg(short, conflicts_with_all = ["size_only", "type_only"])]
        pretty_print: bool,

        /// Object hash
        #[arg(id = "object")]
        hash: String,
    },

    /// Compute object ID and optionally create an object from a file
    HashObject {
        /// Actually write the object into the object database
        #[arg(short)]
        write: bool,

        /// Object type
        #[arg(short, id = "type", default_value = "blob")]
        typ: String,

        #[arg(id = "file")]
        file: String,
    },

    /// List the contents of a tree object
    LsTree {
        /// List only filenames
        #[arg(long)]
        name_only: bool,

        /// Recurse into sub-trees
        #[arg(long)]
        recurse: bool,

        #[arg(id = "tree-ish")]
        hash: String,
    },

    /// Create a tree object from the current directory
    WriteTree,

    /// Create a new commit object
    CommitTree {
        #[arg(id = "tree")]
        tree: String,

        /// Id of a parent commit (may be repeated)
        #[arg(short = 'p')]
        parent: Vec<String>,

        /// Commit message
        #[arg(short = 'm')]
        message: String,
    },

    /// Clone a repository over the smart HTTP v2 protocol
    Clone {
        url: String,

        #[arg(id = "dir")]
        dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    match args.command {
        Commands::Init => commands::init::invoke(Path::new(".")),
        Commands::CatFile {
            type_only,
            size_only,
            pretty_print,
            hash,
        } => commands::cat_file::invoke(&hash.parse()?, type_only, size_only, pretty_print),
        Commands::HashObject { write, typ, file } => {
            commands::hash_object::invoke(Path::new(&file), write, typ.parse::<Kind>()?).map(|_| ())
        }
        Commands::LsTree {
            name_only,
            recurse,
            hash,
        } => commands::ls_tree::invoke(&hash.parse()?, name_only, recurse),
        Commands::WriteTree => commands::write_tree::invoke(),
        Commands::CommitTree {
            tree,
            parent,
            message,
        } => {
            let tree = tree.parse()?;
            let parents = parent
                .iter()
                .map(|p| p.parse())
                .collect::<anyhow::Result<Vec<_>>>()?;
            commands::commit_tree::invoke(&tree, &parents, &message)
        }
        Commands::Clone { url, dir } => commands::clone::invoke(&url, dir.as_deref()),
    }
}
