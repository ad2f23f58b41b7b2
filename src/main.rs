use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use gamepad_state::config::ServiceConfig;
use gamepad_state::port::{GilrsInputPort, MemoryInputPort, RawFrame, RawInputPort};
use gamepad_state::{ControllerState, JoystickRegistry, JoystickService};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "gamepad-state")]
#[command(about = "Query the state of game controllers connected to the system")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Path to a config.toml")]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info", help = "trace, debug, info, warn or error")]
    log_level: Level,

    #[arg(long, global = true, help = "Use one virtual Xbox pad instead of real hardware")]
    simulate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the controllers currently connected
    List,

    /// List controller types and the platforms they support
    Compatible,

    /// Print the state of one controller until Ctrl-C
    Watch {
        #[arg(long, default_value_t = 0)]
        joystick: u32,

        #[arg(long, help = "Controller type, e.g. xbox_controller")]
        controller: Option<String>,

        #[arg(long, help = "Platform override: win, linux or darwin")]
        platform: Option<String>,

        #[arg(long)]
        interval_ms: Option<u64>,

        #[arg(long, help = "Print path=value pairs instead of nested JSON")]
        flat: bool,
    },

    /// Print raw axes, buttons and hats of one device until Ctrl-C
    Explore {
        #[arg(long, default_value_t = 0)]
        device: usize,

        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.log_level)?;

    let config = ServiceConfig::load(cli.config.as_deref())?;
    let port = open_port(cli.simulate)?;
    let service = JoystickService::new(JoystickRegistry::new(port.clone(), config.driver));

    match cli.command {
        Commands::List => {
            let details = service.list_connected().await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Commands::Compatible => {
            println!("{}", serde_json::to_string_pretty(&service.list_compatible())?);
        }
        Commands::Watch {
            joystick,
            controller,
            platform,
            interval_ms,
            flat,
        } => {
            let controller = controller.unwrap_or(config.controller.controller_type.clone());
            let platform = platform.or(config.controller.platform.clone());
            let interval = poll_interval(interval_ms, &config)?;
            watch(&service, joystick, controller, platform, interval, flat).await?;
        }
        Commands::Explore {
            device,
            interval_ms,
        } => {
            let interval = poll_interval(interval_ms, &config)?;
            explore(port, device, interval).await?;
        }
    }

    Ok(())
}

fn setup(level: Level) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(level);
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .pretty()
        .init();
}

fn open_port(simulate: bool) -> Result<Arc<dyn RawInputPort>> {
    if simulate {
        info!("Using simulated input port");
        let port = MemoryInputPort::new();
        // wide enough for every Xbox table, including the macOS d-pad buttons
        port.attach(
            "Simulated Xbox Controller",
            RawFrame::new(vec![0.0, 0.0, -1.0, 0.0, 0.0, -1.0], vec![false; 15], vec![(0, 0)]),
        );
        return Ok(Arc::new(port));
    }
    let port = GilrsInputPort::new().map_err(|e| eyre!("Failed to open input backend: {}", e))?;
    Ok(Arc::new(port))
}

fn poll_interval(interval_ms: Option<u64>, config: &ServiceConfig) -> Result<Duration> {
    let interval = Duration::from_millis(interval_ms.unwrap_or(config.watch.poll_interval_ms));
    if interval.is_zero() {
        return Err(eyre!("--interval-ms must be greater than zero"));
    }
    Ok(interval)
}

/// Token cancelled on Ctrl-C
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {}", e);
        }
        ctrl_c_token.cancel();
    });
    token
}

async fn watch(
    service: &JoystickService,
    joystick: u32,
    controller: String,
    platform: Option<String>,
    interval: Duration,
    flat: bool,
) -> Result<()> {
    service
        .create(joystick, controller.clone(), platform)
        .await
        .map_err(|e| eyre!("Failed to create joystick {}: {}", joystick, e))?;
    info!("Watching joystick {} as {}", joystick, controller);

    let token = shutdown_token();
    let mut ticker = tokio::time::interval(interval);
    let outcome = loop {
        tokio::select! {
            _ = token.cancelled() => break Ok(()),
            _ = ticker.tick() => {
                match service.get_state(joystick).await {
                    Ok(state) => print_state(&state, flat)?,
                    Err(e) => {
                        error!("Reading joystick {} failed: {}", joystick, e);
                        break Err(eyre!(e));
                    }
                }
            }
        }
    };

    if let Err(e) = service.remove(joystick).await {
        warn!("Removing joystick {} failed: {}", joystick, e);
    }
    outcome
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S.%3f").to_string()
}

fn print_state(state: &ControllerState, flat: bool) -> Result<()> {
    if flat {
        println!("{} {}", timestamp(), state.to_flat_line());
        return Ok(());
    }
    let line = json!({
        "timestamp": timestamp(),
        "pressed": state.buttons().pressed_buttons(),
        "d_pad_active": state.d_pad().active(),
        "state": serde_json::to_value(state)?,
    });
    println!("{}", line);
    Ok(())
}

/// Dumps undecoded input, used to work out the mapping table of a new pad
async fn explore(port: Arc<dyn RawInputPort>, device: usize, interval: Duration) -> Result<()> {
    let handle = port
        .open(device)
        .map_err(|e| eyre!("Failed to open device {}: {}", device, e))?;
    match port.describe(handle) {
        Ok(descriptor) => info!(
            "Exploring {} ({} axes, {} buttons, {} hats)",
            descriptor.name, descriptor.num_axes, descriptor.num_buttons, descriptor.num_hats
        ),
        Err(e) => warn!("Unable to describe device {}: {}", device, e),
    }

    let token = shutdown_token();
    let mut ticker = tokio::time::interval(interval);
    let outcome = loop {
        tokio::select! {
            _ = token.cancelled() => break Ok(()),
            _ = ticker.tick() => {
                port.pump_events();
                match port.read_frame(handle) {
                    Ok(frame) => {
                        let line = json!({ "timestamp": timestamp(), "raw": frame });
                        println!("{}", line);
                    }
                    Err(e) => {
                        error!("Reading device {} failed: {}", device, e);
                        break Err(eyre!(e));
                    }
                }
            }
        }
    };

    port.close(handle);
    outcome
}
