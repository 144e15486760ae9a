//! Local bookmark edits.

use clap::{Args, Subcommand};

use marksync_core::models::BookmarkShape;
use marksync_core::{Category, CreateNode, Kind, LocalNode, LocalTree, NodeId};

use crate::config::Config;
use crate::session::Session;

/// View and edit the local bookmark tree
#[derive(Args)]
pub struct TreeCommand {
    #[command(subcommand)]
    command: TreeSubcommand,
}

#[derive(Subcommand)]
enum TreeSubcommand {
    /// Print the tree with node ids
    Show {
        /// Only this category
        category: Option<Category>,
    },

    /// Add a bookmark, folder or separator
    Add {
        /// Category to add to (toolbar, other, mobile, menu)
        category: Category,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, conflicts_with_all = ["folder", "separator"])]
        url: Option<String>,

        #[arg(long, conflicts_with = "separator")]
        folder: bool,

        #[arg(long)]
        separator: bool,

        /// Parent folder id (default: the category root)
        #[arg(long)]
        parent: Option<String>,

        /// Position among the parent's children (default: last)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Remove a node and everything under it
    Remove { id: String },

    /// Change a node's title and/or url
    Rename {
        id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        url: Option<String>,
    },

    /// Move a node under another folder
    Move {
        id: String,

        #[arg(long)]
        parent: String,

        #[arg(long)]
        index: Option<usize>,
    },
}

impl TreeCommand {
    pub async fn run(
        &self,
        session: &Session,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TreeSubcommand::Show { category } => {
                let categories = match category {
                    Some(c) => vec![*c],
                    None => session.tree.categories(),
                };
                for category in categories {
                    let root = session.tree.category_root(category).await?;
                    println!("{} [{}]", category, root.id);
                    for child in root.children() {
                        print_node(child, 1);
                    }
                }
                return Ok(());
            }
            TreeSubcommand::Add {
                category,
                title,
                url,
                folder,
                separator,
                parent,
                index,
            } => {
                let kind = if *separator {
                    Kind::Separator
                } else if *folder {
                    Kind::Folder
                } else if url.is_some() {
                    Kind::Bookmark
                } else {
                    return Err("a bookmark needs --url (or use --folder / --separator)".into());
                };
                let parent_id = match parent {
                    Some(id) => NodeId::from(id.as_str()),
                    None => session.tree.category_root(*category).await?.id,
                };
                let node = session
                    .tree
                    .create(CreateNode {
                        parent_id,
                        index: index.unwrap_or(usize::MAX),
                        kind,
                        title: title.clone(),
                        url: url.clone(),
                    })
                    .await?;
                println!("✓ Added {} [{}]", kind, node.id);
            }
            TreeSubcommand::Remove { id } => {
                let id = NodeId::from(id.as_str());
                session.tree.remove_subtree(&id).await?;
                println!("✓ Removed [{}]", id);
            }
            TreeSubcommand::Rename { id, title, url } => {
                let id = NodeId::from(id.as_str());
                session.tree.update(&id, Some(title.clone()), url.clone())?;
                println!("✓ Renamed [{}]", id);
            }
            TreeSubcommand::Move { id, parent, index } => {
                let id = NodeId::from(id.as_str());
                let parent = NodeId::from(parent.as_str());
                session
                    .tree
                    .move_node(&id, &parent, index.unwrap_or(usize::MAX))?;
                println!("✓ Moved [{}] under [{}]", id, parent);
            }
        }

        session.after_edit(config).await
    }
}

fn print_node(node: &LocalNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.kind() {
        Kind::Folder => {
            println!("{}{}/ [{}]", indent, node.title, node.id);
            for child in node.children() {
                print_node(child, depth + 1);
            }
        }
        Kind::Bookmark => println!(
            "{}{} <{}> [{}]",
            indent,
            node.title,
            node.url.as_deref().unwrap_or_default(),
            node.id
        ),
        Kind::Separator => println!("{}---- [{}]", indent, node.id),
    }
}
