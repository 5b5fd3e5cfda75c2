//! toolbridge: inspect the resolution graph
//!
//! ## Example Usage
//!
//! ```bash
//! # Dump the built-in graph as node-link JSON
//! toolbridge graph --json
//!
//! # Show how a path becomes a command argument
//! toolbridge route --from PathBuf --to CommandArg
//!
//! # Route an output marker through a declared file kind
//! toolbridge route --kind app.maps.Volume:.mrc --scope app --from Output --to Volume
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use toolbridge::inspect::{lookup_type, parse_kind, RouteReport};
use toolbridge::logging::init_logging;
use toolbridge_resolver::common::COMMON_NAMESPACE;
use toolbridge_resolver::{Registry, Scope};
use toolbridge_types::{BridgeConfig, Specificity};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "toolbridge",
    author,
    version,
    about = "Inspect the toolbridge resolution graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Namespace tie-break policy (deepest, shallowest, ignore)
    #[arg(long, global = true)]
    prefer: Option<Specificity>,

    /// Verbose output (debug logging)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the resolution graph
    Graph(GraphCmd),

    /// Show the resolver chain between two types
    Route(RouteCmd),
}

#[derive(Args)]
struct GraphCmd {
    /// Declare a proxy kind first (namespace.Name[:ext])
    #[arg(long = "kind")]
    kinds: Vec<String>,
}

#[derive(Args)]
struct RouteCmd {
    /// Origin type (full key or short name)
    #[arg(long)]
    from: String,

    /// Target type (full key or short name)
    #[arg(long)]
    to: String,

    /// Intermediate type the route must pass through
    #[arg(long)]
    via: Option<String>,

    /// Namespace the lookup is made from
    #[arg(long, default_value = "toolbridge.cli")]
    scope: String,

    /// Additional namespaces to import
    #[arg(long = "import")]
    imports: Vec<String>,

    /// Declare a proxy kind first (namespace.Name[:ext])
    #[arg(long = "kind")]
    kinds: Vec<String>,
}

impl GraphCmd {
    fn execute(self, registry: &Registry, json: bool) -> Result<()> {
        for kind in &self.kinds {
            parse_kind(registry, kind)?;
        }
        let graph = registry.export_node_link();
        if json {
            println!("{}", graph.to_json_pretty()?);
            return Ok(());
        }

        println!(
            "{} types, {} resolvers",
            graph.nodes.len(),
            graph.links.len()
        );
        for link in &graph.links {
            println!(
                "{:<40} {:<24} {} -> {} (weight {})",
                link.resolver, link.namespace, link.source, link.target, link.weight
            );
        }
        Ok(())
    }
}

impl RouteCmd {
    fn execute(self, registry: &Registry, json: bool) -> Result<()> {
        for kind in &self.kinds {
            parse_kind(registry, kind)?;
        }
        let origin = lookup_type(registry, &self.from)?;
        let target = lookup_type(registry, &self.to)?;
        let via = self
            .via
            .as_deref()
            .map(|name| lookup_type(registry, name))
            .transpose()?;

        let scope = self
            .imports
            .iter()
            .fold(Scope::new(self.scope.as_str()), |scope, ns| scope.import(ns.as_str()))
            .import(toolbridge_proxy::PROXY_NAMESPACE)
            .import(COMMON_NAMESPACE);
        debug!(scope = %scope.namespace(), imports = ?scope.imports(), "planning route");

        let route = registry.route(&scope, &origin, &target, via.as_ref())?;
        let report = RouteReport::from(&route);
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report.render());
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let Cli {
        command,
        json,
        prefer,
        verbose,
    } = Cli::parse();

    let config = BridgeConfig::from_env();
    init_logging(&config, verbose)?;

    let registry = toolbridge_proxy::registry();
    if let Some(specificity) = prefer {
        registry.set_specificity(specificity);
    }

    match command {
        Commands::Graph(cmd) => cmd.execute(registry, json),
        Commands::Route(cmd) => cmd.execute(registry, json),
    }
}
