//! `roadmap` command-line client

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use roadmap_core::{default_prefs_path, ClientConfig, RoadmapWorkspace, UserPrefs};
use roadmap_graph::{Graph, RoadmapId};
use roadmap_layout::{Direction, Layout};
use roadmap_stream::IngestStatus;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let id = || Arg::new("id").required(true).help("Saved roadmap id");
    let json = || {
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Output as JSON")
    };

    Command::new("roadmap")
        .version(roadmap_core::VERSION)
        .about("Generate, lay out and save concept roadmaps")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("prefs")
                .long("prefs")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("User preferences file"),
        )
        .arg(
            Arg::new("stream-url")
                .long("stream-url")
                .global(true)
                .help("Generation service base URL"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .help("Saved-roadmap API base URL"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .help("Bearer token for both services"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("generate")
                .about("Stream a roadmap for a query and print it")
                .arg(Arg::new("query").required(true).num_args(1..).help("What to learn"))
                .arg(
                    Arg::new("save")
                        .long("save")
                        .action(ArgAction::SetTrue)
                        .help("Save the finished roadmap"),
                )
                .arg(
                    Arg::new("direction")
                        .long("direction")
                        .value_parser(["tb", "lr"])
                        .help("Layout direction"),
                )
                .arg(json()),
        )
        .subcommand(Command::new("list").about("List saved roadmaps").arg(json()))
        .subcommand(
            Command::new("show")
                .about("Load a saved roadmap and print it")
                .arg(id())
                .arg(json()),
        )
        .subcommand(Command::new("delete").about("Delete a saved roadmap").arg(id()))
        .subcommand(
            Command::new("key")
                .about("Manage the stored user API key")
                .subcommand_required(true)
                .subcommand(
                    Command::new("set")
                        .about("Store a key")
                        .arg(Arg::new("key").required(true)),
                )
                .subcommand(Command::new("clear").about("Remove the stored key"))
                .subcommand(Command::new("show").about("Show the stored key, masked")),
        )
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn string_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument <{name}>"))
}

/// Config file, then environment, then stored key, then flags
fn load_config(matches: &ArgMatches, prefs: &UserPrefs) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if config.user_api_key.is_none() {
        config.user_api_key.clone_from(&prefs.user_api_key);
    }
    if let Some(url) = matches.get_one::<String>("stream-url") {
        config.stream_base_url.clone_from(url);
    }
    if let Some(url) = matches.get_one::<String>("api-url") {
        config.persistence_base_url.clone_from(url);
    }
    if let Some(token) = matches.get_one::<String>("token") {
        config.access_token = Some(token.clone());
    }
    config.validate()?;
    Ok(config)
}

async fn follow(workspace: &RoadmapWorkspace) -> IngestStatus {
    let mut rx = workspace.subscribe();
    loop {
        let status = rx.borrow_and_update().clone();
        if !status.is_generating {
            return status;
        }
        tracing::debug!(state = %status.state, applied = status.counters.applied, "generating");
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return workspace.status();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("interrupted; keeping partial roadmap");
                workspace.cancel();
            }
        }
    }
}

fn print_roadmap(graph: &Graph, layout: &Layout) {
    let title = graph.meta.title.as_deref().or(graph.first_label()).unwrap_or("Untitled Roadmap");
    println!("{title}");
    println!("{}", "=".repeat(title.chars().count()));
    for (rank, ids) in layout.order.iter().enumerate() {
        let labels: Vec<&str> = ids
            .iter()
            .filter_map(|id| graph.node(id))
            .map(|node| node.label.as_str())
            .collect();
        println!("{rank:>3}  {}", labels.join("  |  "));
    }
    println!();
    println!(
        "{} concepts, {} links, {} crossings",
        graph.node_count(),
        graph.edge_count(),
        layout.crossings
    );
    if !layout.deferred_edges.is_empty() {
        println!("{} links reference missing concepts", layout.deferred_edges.len());
    }
}

fn print_json(graph: &Graph, layout: &Layout) -> Result<()> {
    let body = roadmap_core::document::new_roadmap(graph, Some(layout));
    let out = serde_json::json!({ "roadmap": body, "layout": layout });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn generate(mut config: ClientConfig, args: &ArgMatches) -> Result<()> {
    let query = args
        .get_many::<String>("query")
        .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    match args.get_one::<String>("direction").map(String::as_str) {
        Some("lr") => config.layout.direction = Direction::LeftToRight,
        Some("tb") => config.layout.direction = Direction::TopToBottom,
        _ => {}
    }

    let workspace = RoadmapWorkspace::connect(config)?;
    let session = workspace.generate(&query)?;
    tracing::info!(session = %session, query = %query, "generating roadmap");

    let status = follow(&workspace).await;
    let counters = status.counters;
    tracing::info!(
        state = %status.state,
        applied = counters.applied,
        rejected = counters.rejected,
        ignored = counters.ignored,
        "generation finished"
    );

    let graph = workspace.snapshot();
    let refresh = workspace.layout();
    if args.get_flag("json") {
        print_json(&graph, &refresh.layout)?;
    } else {
        print_roadmap(&graph, &refresh.layout);
    }

    if let Some(err) = status.last_error {
        if err.is_rate_limited() {
            bail!("rate limited by the generation service; set your own key with `roadmap key set`");
        }
        bail!("generation failed: {err}");
    }

    if args.get_flag("save") {
        let outcome = workspace.persist().await?;
        println!("saved as {}", outcome.id());
    }
    Ok(())
}

async fn list(config: ClientConfig, args: &ArgMatches) -> Result<()> {
    let workspace = RoadmapWorkspace::connect(config)?;
    let roadmaps = workspace.list().await?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&roadmaps)?);
        return Ok(());
    }
    if roadmaps.is_empty() {
        println!("no saved roadmaps");
    }
    for roadmap in roadmaps {
        println!("{:<28} {:<26} {}", roadmap.id, roadmap.created_at, roadmap.title);
    }
    Ok(())
}

async fn show(config: ClientConfig, args: &ArgMatches) -> Result<()> {
    let id = RoadmapId::new(string_arg(args, "id")?);
    let workspace = RoadmapWorkspace::connect(config)?;
    let loaded = workspace
        .load(&id)
        .await
        .with_context(|| format!("failed to load roadmap {id}"))?;
    if loaded.rejected > 0 {
        tracing::warn!(rejected = loaded.rejected, "skipped invalid entries");
    }

    let graph = workspace.snapshot();
    let refresh = workspace.layout();
    if args.get_flag("json") {
        print_json(&graph, &refresh.layout)
    } else {
        print_roadmap(&graph, &refresh.layout);
        Ok(())
    }
}

async fn delete(config: ClientConfig, args: &ArgMatches) -> Result<()> {
    let id = RoadmapId::new(string_arg(args, "id")?);
    let workspace = RoadmapWorkspace::connect(config)?;
    workspace.delete(&id).await?;
    println!("deleted {id}");
    Ok(())
}

fn key(mut prefs: UserPrefs, path: &std::path::Path, args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("set", sub)) => {
            prefs.set_user_api_key(Some(string_arg(sub, "key")?.to_string()));
            prefs.save(path)?;
            println!("key stored in {}", path.display());
        }
        Some(("clear", _)) => {
            prefs.set_user_api_key(None);
            prefs.save(path)?;
            println!("key cleared");
        }
        Some(("show", _)) => match prefs.masked_key() {
            Some(masked) => println!("{masked}"),
            None => println!("no key stored"),
        },
        _ => bail!("unknown key command"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"))?;

    let prefs_path = matches
        .get_one::<PathBuf>("prefs")
        .cloned()
        .unwrap_or_else(default_prefs_path);
    let prefs = UserPrefs::load(&prefs_path)?;

    match matches.subcommand() {
        Some(("key", args)) => key(prefs, &prefs_path, args),
        Some((name, args)) => {
            let config = load_config(&matches, &prefs)?;
            match name {
                "generate" => generate(config, args).await,
                "list" => list(config, args).await,
                "show" => show(config, args).await,
                "delete" => delete(config, args).await,
                other => bail!("unknown command {other}"),
            }
        }
        None => bail!("no command given"),
    }
}
