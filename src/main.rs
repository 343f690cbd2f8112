//! Caboose - headless locomotion runner
//!
//! Drives the test yard with a scripted input timeline at a render-like
//! frame rate and logs telemetry and events.
//!
//! ```text
//! caboose [config.json]      run, optionally with a JSON SimulationConfig
//! caboose --print-config     print the default config as JSON
//! ```
//!
//! Set `RUST_LOG=debug` to see state changes and ladder/hazard activity.

use std::error::Error;
use std::fs;

use caboose_game::input::{ActionInput, MovementInput};
use caboose_game::{Level, PlayerInput, Simulation, SimulationConfig};

/// Render frame time; deliberately not a multiple of the tick.
const FRAME_TIME: f32 = 1.0 / 144.0;

/// Frames between telemetry lines.
const TELEMETRY_INTERVAL: u32 = 36;

/// One stretch of held input.
struct Phase {
    name: &'static str,
    seconds: f32,
    input: PlayerInput,
}

fn held(movement: MovementInput, actions: ActionInput) -> PlayerInput {
    PlayerInput {
        movement,
        actions,
        frame: 0,
    }
}

fn right() -> MovementInput {
    MovementInput {
        right: true,
        ..Default::default()
    }
}

fn left() -> MovementInput {
    MovementInput {
        left: true,
        ..Default::default()
    }
}

/// Walk over the hazard pad into the ladder, climb onto the platform, jump
/// off, then crawl through the tunnel.
fn timeline() -> Vec<Phase> {
    let none = ActionInput::default();
    let up = MovementInput {
        up: true,
        ..Default::default()
    };
    let jump = ActionInput {
        jump: true,
        ..Default::default()
    };
    let crouch = ActionInput {
        crouch: true,
        ..Default::default()
    };

    vec![
        Phase {
            name: "settle",
            seconds: 0.5,
            input: PlayerInput::default(),
        },
        Phase {
            name: "walk to ladder",
            seconds: 3.0,
            input: held(right(), none),
        },
        Phase {
            name: "climb",
            seconds: 2.5,
            input: held(up, none),
        },
        Phase {
            name: "walk platform",
            seconds: 1.0,
            input: held(right(), none),
        },
        Phase {
            name: "jump off",
            seconds: 0.3,
            input: held(right(), jump),
        },
        Phase {
            name: "fall",
            seconds: 1.5,
            input: PlayerInput::default(),
        },
        Phase {
            name: "walk back",
            seconds: 4.0,
            input: held(left(), none),
        },
        Phase {
            name: "crawl",
            seconds: 5.0,
            input: held(left(), crouch),
        },
        Phase {
            name: "stand in tunnel",
            seconds: 0.5,
            input: PlayerInput::default(),
        },
    ]
}

fn load_config(path: Option<&str>) -> Result<SimulationConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let text = fs::read_to_string(path)?;
    let config = serde_json::from_str(&text)?;
    log::info!("Loaded config from {path}");
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("--print-config") {
        println!("{}", serde_json::to_string_pretty(&SimulationConfig::default())?);
        return Ok(());
    }

    let config = load_config(arg.as_deref())?;
    let mut simulation = Simulation::new(config, Level::test_yard())?;

    let mut frame = 0u32;
    for phase in timeline() {
        log::info!("Phase: {}", phase.name);

        let frames = (phase.seconds / FRAME_TIME).round() as u32;
        for _ in 0..frames {
            let input = PlayerInput {
                frame,
                ..phase.input.clone()
            };
            simulation.advance(FRAME_TIME, &input);

            for event in simulation.events() {
                log::info!("  {:?}", event);
            }

            if frame % TELEMETRY_INTERVAL == 0 {
                let telemetry = simulation.controller().telemetry();
                let position = simulation.position();
                log::info!(
                    "  pos=({:.2}, {:.2}) state={:?} speed={:.2} vy={:.2} surface={:?} scale={:.2}",
                    position.x,
                    position.y,
                    telemetry.current_state,
                    telemetry.horizontal_speed_normalized,
                    telemetry.vertical_velocity,
                    telemetry.current_surface,
                    telemetry.visual_scale,
                );
            }
            frame += 1;
        }
    }

    let telemetry = simulation.controller().telemetry();
    println!("{}", serde_json::to_string_pretty(telemetry)?);
    Ok(())
}
