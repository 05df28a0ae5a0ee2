//! Pipeline orchestration.
//!
//! Thread layout:
//! - `odometry-reader`: accumulates fixed 8-byte records, folds them into
//!   the shared scan line, feeds the watchdog.
//! - `lidar-reader`: reads one rotation-sized chunk at a time, re-frames
//!   it, appends decoded samples and wakes the worker.
//! - `worker`: consumes scan-line hand-offs, integrates the pose, updates
//!   the grid, asks the driving strategy for the next command.
//! - `cmd-writer`: sole owner of the outbound command link.
//! - `watchdog`: forces shutdown when odometry goes silent.
//! - `http` (manual mode): remote-control listener.
//!
//! Readers poll the lifecycle between reads instead of being cancelled;
//! a hand-off in flight when shutdown starts is dropped, not flushed.

mod command_writer;
mod handoff;
mod lifecycle;
mod watchdog;

pub use command_writer::{spawn_writer, CommandSender};
pub use handoff::ScanLineSlot;
pub use lifecycle::Lifecycle;
pub use watchdog::Watchdog;

use crate::config::Config;
use crate::core::geometry::{Displacement, Point, Pose};
use crate::error::Result;
use crate::mapping::{export, Footprint, OccupancyGrid};
use crate::protocol::{command::RobotCommand, lidar, odometry, odometry::OdometrySample};
use crate::sensor_log::SensorLog;
use crate::strategy::DriveStrategy;
use crate::transport::Transport;
use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type SharedSensorLog = Option<Arc<Mutex<SensorLog<std::fs::File>>>>;

/// A panic in any pipeline thread must not leave the rest of the
/// pipeline running headless. Each thread holds one of these; if the
/// thread unwinds, the drop handler turns the panic into a shutdown
/// request so the main loop tears everything down.
struct PanicGuard {
    lifecycle: Lifecycle,
    slot: Arc<ScanLineSlot>,
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!(
                "Thread {:?} panicked, shutting down",
                thread::current().name().unwrap_or("?")
            );
            self.lifecycle.request_shutdown();
            self.slot.notify();
        }
    }
}

pub struct Pipeline {
    lifecycle: Lifecycle,
    slot: Arc<ScanLineSlot>,
    commands: Option<CommandSender>,
    chars: Sender<u8>,
    watchdog: Option<Arc<Watchdog>>,
    handles: Vec<JoinHandle<()>>,
    writer_handle: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Open the data paths and spawn every pipeline thread.
    ///
    /// `odometry` and `commands` are the read and write halves of the
    /// microcontroller link; `lidar` is read-only. The startup handshake
    /// (reset, pause, connect) goes out before any reader starts.
    pub fn start(
        config: &Config,
        odometry: Box<dyn Transport>,
        commands: Box<dyn Transport>,
        lidar: Box<dyn Transport>,
        strategy: Box<dyn DriveStrategy>,
    ) -> Result<Self> {
        let lifecycle = Lifecycle::new();
        let slot = Arc::new(ScanLineSlot::new());
        let started_at = Instant::now();

        let sensor_log: SharedSensorLog = match &config.pipeline.sensor_log_path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Arc::new(Mutex::new(SensorLog::new(file))))
            }
            None => None,
        };

        let (sender, writer_handle) = spawn_writer(commands, lifecycle.clone());

        // Handshake: put the controller in a known state, give it time to
        // settle, then open the telemetry session.
        sender.send(RobotCommand::reset());
        thread::sleep(Duration::from_millis(config.pipeline.startup_pause_ms));
        sender.send(RobotCommand::connect());

        lifecycle.set_running();
        log::info!("Pipeline running");

        let watchdog = {
            let lifecycle = lifecycle.clone();
            let slot = slot.clone();
            Arc::new(Watchdog::spawn(
                Duration::from_secs(config.pipeline.watchdog_timeout_secs),
                move || {
                    if lifecycle.request_shutdown() {
                        slot.notify();
                    }
                },
            ))
        };

        let mut handles = Vec::new();

        handles.push(spawn_odometry_reader(
            odometry,
            lifecycle.clone(),
            slot.clone(),
            watchdog.clone(),
            sensor_log.clone(),
            started_at,
            config,
        ));

        handles.push(spawn_lidar_reader(
            lidar,
            lifecycle.clone(),
            slot.clone(),
            sensor_log,
            started_at,
        ));

        let (chars_tx, chars_rx) = unbounded::<u8>();
        handles.push(spawn_worker(
            strategy,
            lifecycle.clone(),
            slot.clone(),
            sender.clone(),
            chars_rx,
            config,
        ));

        if config.pipeline.manual {
            if let Some(port) = config.pipeline.http_port {
                handles.push(crate::http::spawn(
                    port,
                    sender.clone(),
                    config.robot.max_forward_speed,
                    lifecycle.clone(),
                )?);
            }
        }

        Ok(Self {
            lifecycle,
            slot,
            commands: Some(sender),
            chars: chars_tx,
            watchdog: Some(watchdog),
            handles,
            writer_handle: Some(writer_handle),
        })
    }

    /// Lifecycle handle for signal handlers and the keyboard loop.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Producer handle for manual-drive commands.
    pub fn commands(&self) -> CommandSender {
        self.commands.as_ref().expect("pipeline already shut down").clone()
    }

    /// Forward a keyboard character to the driving strategy.
    pub fn send_char(&self, ch: u8) {
        let _ = self.chars.send(ch);
    }

    /// Clonable sender for keyboard characters, for the detached stdin
    /// reader.
    pub fn char_sender(&self) -> Sender<u8> {
        self.chars.clone()
    }

    /// Drain and stop: queue the final reset, let the readers wind down,
    /// join everything. Safe to call whether or not shutdown was already
    /// requested.
    pub fn shutdown(mut self) {
        self.lifecycle.request_shutdown();
        self.slot.notify();

        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }

        // With the producers joined, a final reset leaves the robot
        // stationary and is guaranteed to be the last thing on the wire.
        if let Some(commands) = self.commands.take() {
            commands.send(RobotCommand::reset());
            commands.stop();
        }
        self.watchdog = None;
        if let Some(handle) = self.writer_handle.take() {
            let _ = handle.join();
        }

        debug_assert!(self.handles.is_empty());
        self.lifecycle.set_stopped();
        log::info!("Pipeline stopped");
    }
}

fn spawn_odometry_reader(
    mut transport: Box<dyn Transport>,
    lifecycle: Lifecycle,
    slot: Arc<ScanLineSlot>,
    watchdog: Arc<Watchdog>,
    sensor_log: SharedSensorLog,
    started_at: Instant,
    config: &Config,
) -> JoinHandle<()> {
    let kin = config.robot.kinematics();

    thread::Builder::new()
        .name("odometry-reader".to_string())
        .spawn(move || {
            let _guard = PanicGuard {
                lifecycle: lifecycle.clone(),
                slot: slot.clone(),
            };
            let mut record = [0u8; odometry::RECORD_LEN];
            let mut filled = 0;

            while !lifecycle.is_shutting_down() {
                let n = match transport.read(&mut record[filled..]) {
                    Ok(0) => {
                        thread::sleep(Duration::from_millis(1));
                        continue;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        log::error!("Odometry read failed: {}", e);
                        if lifecycle.request_shutdown() {
                            slot.notify();
                        }
                        break;
                    }
                };
                filled += n;
                if filled < odometry::RECORD_LEN {
                    continue;
                }
                filled = 0;

                let sample = OdometrySample::decode(&record);
                log::trace!("Odometry: {:?}", sample);

                if let Some(sensor_log) = &sensor_log {
                    let secs = started_at.elapsed().as_secs_f64();
                    if let Err(e) = sensor_log.lock().odometry(secs, &sample) {
                        log::warn!("Sensor log write failed: {}", e);
                    }
                }

                slot.add_odometry(&sample, &kin);
                watchdog.reset();
            }
        })
        .expect("failed to spawn odometry reader thread")
}

fn spawn_lidar_reader(
    mut transport: Box<dyn Transport>,
    lifecycle: Lifecycle,
    slot: Arc<ScanLineSlot>,
    sensor_log: SharedSensorLog,
    started_at: Instant,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("lidar-reader".to_string())
        .spawn(move || {
            let _guard = PanicGuard {
                lifecycle: lifecycle.clone(),
                slot: slot.clone(),
            };
            let mut chunk = vec![0u8; lidar::FULL_ROTATION_LEN];
            let mut filled = 0;

            while !lifecycle.is_shutting_down() {
                let n = match transport.read(&mut chunk[filled..]) {
                    Ok(0) => {
                        thread::sleep(Duration::from_millis(1));
                        continue;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        log::error!("Lidar read failed: {}", e);
                        if lifecycle.request_shutdown() {
                            slot.notify();
                        }
                        break;
                    }
                };
                filled += n;
                if filled < lidar::FULL_ROTATION_LEN {
                    continue;
                }
                filled = 0;

                let samples = lidar::decode_rotation(&chunk);
                log::trace!("Lidar rotation: {} valid samples", samples.len());

                if let Some(sensor_log) = &sensor_log {
                    let secs = started_at.elapsed().as_secs_f64();
                    if let Err(e) = sensor_log.lock().lidar(secs, &samples) {
                        log::warn!("Sensor log write failed: {}", e);
                    }
                }

                slot.append_scans(samples);
            }
        })
        .expect("failed to spawn lidar reader thread")
}

fn spawn_worker(
    mut strategy: Box<dyn DriveStrategy>,
    lifecycle: Lifecycle,
    slot: Arc<ScanLineSlot>,
    commands: CommandSender,
    chars: crossbeam_channel::Receiver<u8>,
    config: &Config,
) -> JoinHandle<()> {
    let mut grid = OccupancyGrid::new(
        config.grid.clone(),
        Footprint {
            width_mm: config.robot.width_mm,
            length_mm: config.robot.length_mm,
        },
    );
    let manual = config.pipeline.manual;
    let map_path = config.pipeline.map_output_path.clone();

    thread::Builder::new()
        .name("worker".to_string())
        .spawn(move || {
            let _guard = PanicGuard {
                lifecycle: lifecycle.clone(),
                slot: slot.clone(),
            };
            let mut pose = Pose::origin();
            // Only a repeat of a motionless hand-off is suppressed; the
            // first one has no predecessor and is always processed.
            let mut previous_zero = false;

            while let Some(line) = slot.wait_for_scans(|| lifecycle.is_shutting_down()) {
                for ch in chars.try_iter() {
                    strategy.on_char(ch);
                }

                let zero = line.is_zero_movement();
                if zero && previous_zero {
                    log::trace!("Suppressing motionless hand-off");
                    continue;
                }
                previous_zero = zero;

                pose = pose.advanced(line.translation, line.rotation);
                log::debug!(
                    "Pose: ({:.0}, {:.0}) mm, heading {:.3} rad, {} scans",
                    pose.position.x,
                    pose.position.y,
                    pose.heading,
                    line.scans.len()
                );

                // A 14-bit range can reach past the mapped area; such
                // samples carry no mappable endpoint and are dropped
                // before they can trip the grid's bounds contract.
                let mut out_of_range = 0usize;
                let points: Vec<Point> = line
                    .scans
                    .iter()
                    .filter(|s| s.distance > 0)
                    .filter_map(|s| {
                        let bearing = pose.heading + f64::from(s.angle).to_radians();
                        let point = pose.position
                            + Displacement::from_angle_and_distance(
                                bearing,
                                f64::from(s.distance),
                            );
                        if grid.in_bounds(grid.to_grid(point)) {
                            Some(point)
                        } else {
                            out_of_range += 1;
                            None
                        }
                    })
                    .collect();
                if out_of_range > 0 {
                    log::debug!("Dropped {} samples beyond the mapped area", out_of_range);
                }
                grid.update_from_points(&pose, &points);

                let command = strategy.on_sensor_data(&line, &mut grid);
                if !manual {
                    commands.send(command);
                }

                if let Some(path) = &map_path {
                    if let Err(e) = export::write_pgm(&grid, path) {
                        log::warn!("Map export failed: {}", e);
                    }
                }
            }
        })
        .expect("failed to spawn worker thread")
}
