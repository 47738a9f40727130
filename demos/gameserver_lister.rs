use agon::{
    core::Selector,
    listers::GameServerLister,
    runtime::{reflector, watcher::Event},
    GameServer, ResourceExt,
};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::*;

/// Load GameServer manifests into a local store and query it
#[derive(Parser, Debug)]
struct Args {
    /// Multi-document yaml file with the GameServers to load
    #[arg(long, env = "AGON_FIXTURE", default_value = "demos/gameservers.yaml")]
    fixture: PathBuf,
    /// Restrict to a namespace; required to get by name
    #[arg(short, long, env = "AGON_NAMESPACE")]
    namespace: Option<String>,
    /// Label selector, e.g. `tier=a` or `tier in (a,b),!canary`
    #[arg(short = 'l', long, env = "AGON_SELECTOR", default_value = "")]
    selector: Selector,
    /// Get a single GameServer by name instead of listing
    name: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let manifests = std::fs::read_to_string(&args.fixture)?;
    let (reader, mut writer) = reflector::store::<GameServer>();
    writer.apply_watcher_event(&Event::Init);
    for doc in serde_yaml::Deserializer::from_str(&manifests) {
        writer.apply_watcher_event(&Event::InitApply(GameServer::deserialize(doc)?));
    }
    writer.apply_watcher_event(&Event::InitDone);
    info!("Loaded {} GameServers from {}", reader.len(), args.fixture.display());

    let lister = GameServerLister::new(reader);
    if let Some(name) = &args.name {
        let namespace = args.namespace.as_deref().unwrap_or("default");
        match lister.namespace(namespace).get(name) {
            Ok(gs) => println!("{}", serde_yaml::to_string(gs.as_ref())?),
            Err(err) if err.is_not_found() => {
                warn!("{err}");
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        }
        return Ok(());
    }

    let listed = match &args.namespace {
        Some(namespace) => lister.namespace(namespace).list(&args.selector)?,
        None => lister.list(&args.selector)?,
    };
    info!("{} GameServers match {:?}", listed.len(), args.selector.to_string());
    for gs in listed {
        println!(
            "{}/{}\t{:?}",
            gs.namespace().unwrap_or_default(),
            gs.name_any(),
            gs.state().unwrap_or_default()
        );
    }
    Ok(())
}
