//! Sarathi daemon entry point.
//!
//! Opens the serial links, starts the pipeline, and runs the keyboard
//! loop until something requests shutdown: the `x` key, SIGINT/SIGTERM,
//! the watchdog, or a failed serial link.

use sarathi::config::Config;
use sarathi::error::Result;
use sarathi::pipeline::Pipeline;
use sarathi::protocol::command::RobotCommand;
use sarathi::strategy::StopStrategy;
use sarathi::transport::SerialTransport;
use std::env;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `sarathi <path>` (positional)
/// - `sarathi --config <path>` (flag-based)
/// - `sarathi -c <path>` (short flag)
///
/// Defaults to `/etc/sarathi.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/sarathi.toml".to_string()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Sarathi starting...");

    let config_path = parse_config_path();
    log::info!("Using config: {}", config_path);
    let config = Config::load(&config_path)?;

    let controller = SerialTransport::open(
        &config.hardware.odometry_port,
        config.hardware.baud_rate,
    )?;
    let controller_writer = controller.try_clone()?;
    let lidar = SerialTransport::open(&config.hardware.lidar_port, config.hardware.baud_rate)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))
        .map_err(|e| sarathi::Error::Other(format!("Failed to register SIGINT: {}", e)))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&interrupted))
        .map_err(|e| sarathi::Error::Other(format!("Failed to register SIGTERM: {}", e)))?;

    let pipeline = Pipeline::start(
        &config,
        Box::new(controller),
        Box::new(controller_writer),
        Box::new(lidar),
        Box::new(StopStrategy),
    )?;

    let lifecycle = pipeline.lifecycle();
    spawn_keyboard_loop(&pipeline, &config);

    log::info!("Sarathi running. Press 'x' or Ctrl-C to stop.");

    while !lifecycle.is_shutting_down() {
        if interrupted.load(Ordering::Relaxed) {
            log::info!("Received shutdown signal");
            lifecycle.request_shutdown();
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    pipeline.shutdown();
    log::info!("Sarathi stopped");
    Ok(())
}

/// Read stdin byte by byte. `x` requests shutdown; in manual mode a small
/// set of keys drives the robot directly; everything else goes to the
/// strategy. The thread is not joined: a blocking stdin read can outlive
/// the pipeline and that is fine for a detached reader.
fn spawn_keyboard_loop(pipeline: &Pipeline, config: &Config) {
    let lifecycle = pipeline.lifecycle();
    let commands = pipeline.commands();
    let chars = pipeline.char_sender();
    let manual = config.pipeline.manual;
    let max_speed = config.robot.max_forward_speed;

    let _ = thread::Builder::new()
        .name("keyboard".to_string())
        .spawn(move || {
            let mut stdin = std::io::stdin();
            let mut byte = [0u8; 1];

            while !lifecycle.is_shutting_down() {
                match stdin.read(&mut byte) {
                    Ok(1) => {}
                    _ => break,
                }

                match byte[0] {
                    b'x' => {
                        log::info!("Keyboard shutdown requested");
                        lifecycle.request_shutdown();
                        break;
                    }
                    ch if manual => {
                        let command = match ch {
                            b'e' => Some(RobotCommand::forward_left(max_speed)),
                            b'r' => Some(RobotCommand::forward(max_speed)),
                            b't' => Some(RobotCommand::forward_right(max_speed)),
                            b'd' => Some(RobotCommand::left_turn(max_speed)),
                            b'g' => Some(RobotCommand::right_turn(max_speed)),
                            b'c' => Some(RobotCommand::backward_left(max_speed)),
                            b'v' => Some(RobotCommand::backward(max_speed)),
                            b'b' => Some(RobotCommand::backward_right(max_speed)),
                            _ => None,
                        };
                        match command {
                            Some(command) => commands.send(command),
                            None => {
                                let _ = chars.send(ch);
                            }
                        }
                    }
                    ch => {
                        let _ = chars.send(ch);
                    }
                }
            }
        });
}
