use keylight_control::{KeepAwakeScheduler, KeylightClient, LightRegistry};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let address = args.next().ok_or("usage: keep_awake <address> [name]")?;
    let name = args.next().unwrap_or_else(|| address.clone());

    let registry = Arc::new(LightRegistry::load("lights.json")?);
    let scheduler = KeepAwakeScheduler::new(registry.clone(), KeylightClient::new());

    registry.add(&address, &name, true)?;
    scheduler.reconcile().await;

    println!("Keeping {} ({}) awake; press Ctrl-C to stop.", name, address);
    tokio::signal::ctrl_c().await?;

    scheduler.stop_all().await;
    Ok(())
}
