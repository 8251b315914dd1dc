//! Bramble CLI entry point.

use std::io::Read;
use std::path::Path;

use bramble_tree::{
    Atom, MetaConfig, Node, clause_vars, fold_literal, meta, pat_vars, subtrees, tree_size,
    unfold_literal, validate,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bramble")]
#[command(about = "Inspect and quote Core IR trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a tree as constructor calls that rebuild it
    Meta {
        /// Input tree file (or - for stdin)
        file: String,

        /// TOML file with quoting settings
        #[arg(short, long)]
        config: Option<String>,

        /// Module owning the constructor functions
        #[arg(long)]
        module: Option<String>,

        /// Annotation marking meta variables
        #[arg(long)]
        marker: Option<String>,
    },

    /// Print the children of the root node, grouped into slots
    Subtrees {
        /// Input tree file (or - for stdin)
        file: String,
    },

    /// List the variables bound by a pattern or clause
    PatVars {
        /// Input tree file (or - for stdin)
        file: String,
    },

    /// Collapse literal cons and tuple skeletons at the root
    Fold {
        /// Input tree file (or - for stdin)
        file: String,
    },

    /// Expand a literal list or tuple at the root into skeleton form
    Unfold {
        /// Input tree file (or - for stdin)
        file: String,
    },

    /// Check a tree for structural correctness
    Validate {
        /// Input tree file (or - for stdin)
        file: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("bramble=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Meta {
            file,
            config,
            module,
            marker,
        } => {
            let mut settings = match config {
                Some(path) => load_config(Path::new(&path))?,
                None => MetaConfig::default(),
            };
            if let Some(module) = module {
                settings.module = Atom::new(module);
            }
            if let Some(marker) = marker {
                settings.marker = Atom::new(marker);
            }
            debug!(module = %settings.module, marker = %settings.marker, "meta settings");

            let tree = read_tree(&file)?;
            let quoted = meta(&tree, &settings);
            info!(input = tree_size(&tree), output = tree_size(&quoted), "quoted tree");
            print_json(&quoted)?;
        }

        Commands::Subtrees { file } => {
            let tree = read_tree(&file)?;
            let report = json!({
                "kind": tree.kind(),
                "slots": subtrees(&tree),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::PatVars { file } => {
            let tree = read_tree(&file)?;
            let vars = if tree.as_clause().is_ok() {
                clause_vars(&tree)?
            } else {
                pat_vars(&tree)?
            };
            for var in vars {
                println!("{}", var.as_var()?.name);
            }
        }

        Commands::Fold { file } => {
            let tree = read_tree(&file)?;
            print_json(&fold_literal(&tree))?;
        }

        Commands::Unfold { file } => {
            let tree = read_tree(&file)?;
            print_json(&unfold_literal(&tree))?;
        }

        Commands::Validate { file } => {
            let tree = read_tree(&file)?;
            validate(&tree)?;
            println!("{}: ok ({} nodes)", file, tree_size(&tree));
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<MetaConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}

/// Reads a JSON tree and checks it before handing it to the library.
fn read_tree(file: &str) -> Result<Node, Box<dyn std::error::Error>> {
    let input = if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };
    parse_tree(&input)
}

/// Every cons cell nests a few JSON objects deep, so long lists need the
/// recursion limit lifted and the stack grown on demand.
fn parse_tree(input: &str) -> Result<Node, Box<dyn std::error::Error>> {
    let mut json = serde_json::Deserializer::from_str(input);
    json.disable_recursion_limit();
    let tree = Node::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    validate(&tree)?;
    Ok(tree)
}

fn render_tree(tree: &Node) -> Result<String, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    {
        let mut json = serde_json::Serializer::pretty(&mut out);
        tree.serialize(serde_stacker::Serializer::new(&mut json))?;
    }
    Ok(String::from_utf8(out)?)
}

fn print_json(tree: &Node) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_tree(tree)?);
    Ok(())
}
