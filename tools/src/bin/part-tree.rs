use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use partmap::file_format::catalog::PartCatalog;
use partmap::gltf_loader::load_scene_graph_from_path;
use partmap::logging::init_logging;
use partmap::normalize::normalize_key;
use partmap::resolver::NameResolver;
use partmap::sidebar::{SidebarOptions, SidebarRegrouper};
use partmap::tree::{render_outline, TreeBuilder};

/// Inspect how a glTF asset's parts get named and grouped.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CatalogArgs {
    /// Part catalog TOML; the built-in engine catalog is used if omitted
    #[arg(long, env = "PARTMAP_CATALOG")]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the component tree with unique paths and display names
    Tree {
        asset: PathBuf,
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Emit JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Print the side panel groups
    Sidebar {
        asset: PathBuf,
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Child count that makes a level "dense"; defaults to the catalog's
        #[arg(long)]
        min_children: Option<usize>,
        /// Single-child hops allowed while looking for the dense level
        #[arg(long)]
        max_depth: Option<usize>,
        /// Append the catalog's spec sheet as an extra group
        #[arg(long)]
        spec_sheet: bool,
        #[arg(long)]
        json: bool,
    },
    /// Resolve a bare label against the catalog
    Resolve {
        label: String,
        #[command(flatten)]
        catalog: CatalogArgs,
        #[arg(long)]
        json: bool,
    },
    /// Print the normalized comparison key for each argument
    Normalize {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Tree {
            asset,
            catalog,
            json,
        } => {
            let catalog = PartCatalog::load_with_default(catalog.catalog.as_deref())?;
            let mut graph = load_scene_graph_from_path(&asset)?;
            let built = TreeBuilder::from_catalog(&catalog)?.build(&mut graph);
            if json {
                println!("{}", serde_json::to_string_pretty(&built.tree)?);
            } else {
                print!("{}", render_outline(&built.tree, &graph));
            }
        }
        Command::Sidebar {
            asset,
            catalog,
            min_children,
            max_depth,
            spec_sheet,
            json,
        } => {
            let catalog = PartCatalog::load_with_default(catalog.catalog.as_deref())?;
            let resolver = NameResolver::new(&catalog);
            let mut graph = load_scene_graph_from_path(&asset)?;
            let built = TreeBuilder::from_catalog(&catalog)?.build(&mut graph);

            let mut options = SidebarOptions::from_catalog(&resolver);
            if let Some(min_children) = min_children {
                options.min_children = min_children;
            }
            if let Some(max_depth) = max_depth {
                options.max_depth = max_depth;
            }
            options.include_spec_sheet = spec_sheet;

            let sidebar = SidebarRegrouper::new(&resolver, options).regroup(&built.tree, &graph);
            if json {
                println!("{}", serde_json::to_string_pretty(&sidebar)?);
            } else {
                print!("{}", render_outline(&sidebar, &graph));
            }
        }
        Command::Resolve {
            label,
            catalog,
            json,
        } => {
            let catalog = PartCatalog::load_with_default(catalog.catalog.as_deref())?;
            let resolver = NameResolver::new(&catalog);
            let info = resolver.describe_part(&label, None);
            if json {
                let mut value = serde_json::to_value(&info)?;
                value["display_name"] = resolver.resolve_display_name(&label, None).into();
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("display name:  {}", resolver.resolve_display_name(&label, None));
                println!("canonical key: {}", info.canonical_key);
                println!("description:   {}", info.description);
                println!("document:      {}", info.document.as_deref().unwrap_or("-"));
            }
        }
        Command::Normalize { text } => {
            for t in text {
                println!("{}", normalize_key(&t));
            }
        }
    }

    Ok(())
}
