use keylight_control::KeylightClient;
use std::env;

const USAGE: &str = "usage: control <address> [status|toggle|on|off|brightness <n>|temperature <n>]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let address = args.next().ok_or(USAGE)?;
    let command = args.next().unwrap_or_else(|| "status".to_string());

    let client = KeylightClient::new();
    match command.as_str() {
        "status" => {
            let state = client.fetch_state(&address).await?;
            println!(
                "{}: {} brightness={} temperature={}",
                state.address,
                if state.powered { "on" } else { "off" },
                state.brightness,
                state.temperature,
            );
        }
        "toggle" => {
            let now_on = client.toggle_power(&address).await?;
            println!("{}: {}", address, if now_on { "on" } else { "off" });
        }
        "on" => client.set_power(&address, true).await?,
        "off" => client.set_power(&address, false).await?,
        "brightness" => {
            let value = args.next().ok_or("brightness requires a value")?.parse()?;
            client.set_brightness(&address, value).await?;
        }
        "temperature" => {
            let value = args.next().ok_or("temperature requires a value")?.parse()?;
            client.set_temperature(&address, value).await?;
        }
        other => return Err(format!("unknown command: {}\n{}", other, USAGE).into()),
    }

    Ok(())
}
