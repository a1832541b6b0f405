use anyhow::Context;
use clap::{Parser, Subcommand};
use ffjoystick::{EffectKind, HapticDriver, HapticError, JoystickManager, Scenario};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ffjoystick")]
#[command(about = "Joystick and force feedback tool - inspect devices, play effects, watch input", long_about = None)]
struct Cli {
    /// Log SDL calls and effect translation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected joysticks
    List,
    /// Show force feedback capabilities of a joystick
    Info {
        /// Joystick index as shown by `list`
        #[arg(short, long, default_value_t = 0)]
        device: usize,
    },
    /// Play a scenario of effects on a joystick
    Play {
        #[arg(short, long, default_value_t = 0)]
        device: usize,

        /// Path to scenario YAML file
        #[arg(short, long)]
        scenario: PathBuf,
    },
    /// Print input events from a joystick
    Monitor {
        #[arg(short, long, default_value_t = 0)]
        device: usize,

        /// Stop after this many events
        #[arg(short, long)]
        events: Option<usize>,
    },
}

fn setup_logging(verbose: bool) {
    FmtSubscriber::builder()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();
}

fn list(manager: &mut JoystickManager) -> anyhow::Result<()> {
    let count = manager.num_joysticks();
    if count == 0 {
        println!("No joysticks found");
        return Ok(());
    }

    for index in 0..count {
        let name = manager.joystick_name(index)?;
        manager.open_joystick(index)?;
        let force_feedback = match manager.open_haptic(index) {
            Ok(_) => "yes",
            Err(HapticError::NoForceFeedback(_)) => "no",
            Err(e) => {
                warn!(index, "haptic open failed: {}", e);
                "error"
            }
        };
        println!(
            "{}: {} (axes: {}, buttons: {}, hats: {}, balls: {}, force feedback: {})",
            index,
            name,
            manager.num_axes(index)?,
            manager.num_buttons(index)?,
            manager.num_hats(index)?,
            manager.num_balls(index)?,
            force_feedback
        );
        manager.close_joystick(index);
    }
    Ok(())
}

fn open_force_feedback(manager: &mut JoystickManager, device: usize) -> anyhow::Result<usize> {
    manager
        .open_joystick(device)
        .with_context(|| format!("opening joystick {}", device))?;
    let haptic = manager
        .open_haptic(device)
        .with_context(|| format!("opening force feedback on joystick {}", device))?;
    Ok(haptic)
}

fn info(manager: &mut JoystickManager, device: usize) -> anyhow::Result<()> {
    let haptic = open_force_feedback(manager, device)?;
    let capabilities = manager.capabilities(haptic)?;

    println!("Haptic device {} (joystick {}: {})", haptic, device, manager.joystick_name(device)?);
    println!("  Axes: {}", manager.haptic_axes(haptic)?);
    println!("  Effect slots: {}", manager.max_effects_stored(haptic)?);
    println!("  Simultaneous effects: {}", manager.max_effects_playing(haptic)?);
    for line in capabilities.to_string().lines() {
        println!("  {}", line);
    }
    Ok(())
}

fn play(manager: &mut JoystickManager, device: usize, scenario: PathBuf) -> anyhow::Result<()> {
    if !scenario.exists() {
        anyhow::bail!("Scenario file not found: {}", scenario.display());
    }
    info!("Loading scenario: {}", scenario.display());
    let scenario = Scenario::load_from_file(&scenario)?;

    let haptic = open_force_feedback(manager, device)?;
    let name = manager.joystick_name(device)?;
    let capabilities = manager.capabilities(haptic)?;
    for step in &scenario.steps {
        let kind: EffectKind = step.effect.kind();
        if !capabilities.supports(kind) {
            warn!(%kind, "device does not advertise this effect");
        }
    }

    let outcomes = {
        let mut driver = HapticDriver::new(manager, haptic, name);
        scenario.play(&mut driver)?
    };

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    if failed == 0 {
        println!("OK: all {} steps played", outcomes.len());
    } else {
        println!("FAIL: {} of {} steps failed", failed, outcomes.len());
        for outcome in outcomes.iter().filter(|o| o.error.is_some()) {
            println!(
                "  Step {} ({}): {}",
                outcome.step_index,
                outcome.kind,
                outcome.error.as_deref().unwrap_or_default()
            );
        }
    }

    manager.destroy_all(haptic)?;
    Ok(())
}

fn monitor(manager: &mut JoystickManager, device: usize, limit: Option<usize>) -> anyhow::Result<()> {
    manager.init_events()?;
    manager
        .open_joystick(device)
        .with_context(|| format!("opening joystick {}", device))?;
    manager.enable_event_polling()?;
    info!("Watching joystick {}. Press Ctrl+C to stop.", device);

    let mut seen = 0;
    while limit.map_or(true, |limit| seen < limit) {
        let record = manager.poll_event()?;
        if record.present {
            println!("{:?}", record.to_array());
            seen += 1;
        } else {
            thread::sleep(Duration::from_millis(5));
        }
    }

    manager.disable_event_polling()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut manager = JoystickManager::init()?;

    match cli.command {
        Commands::List => list(&mut manager)?,
        Commands::Info { device } => info(&mut manager, device)?,
        Commands::Play { device, scenario } => play(&mut manager, device, scenario)?,
        Commands::Monitor { device, events } => monitor(&mut manager, device, events)?,
    }

    Ok(())
}
