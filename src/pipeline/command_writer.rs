//! Single-writer command path.
//!
//! Commands can originate on any thread (worker, keyboard, HTTP), but the
//! microcontroller link tolerates exactly one writer. Producers send
//! [`RobotCommand`] values into a bounded channel; one dedicated thread
//! consumes the channel and owns the write half of the transport. The
//! single-consumer channel is what makes the single-writer rule
//! structural rather than a convention.
//!
//! Shutdown is a drain: producers queue their final command and drop
//! their senders; the writer keeps writing until the channel disconnects,
//! so the final `Reset` always reaches the wire.

use crate::pipeline::Lifecycle;
use crate::protocol::command::RobotCommand;
use crate::transport::Transport;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::thread::{self, JoinHandle};

const QUEUE_DEPTH: usize = 16;

enum Message {
    Command(RobotCommand),
    Stop,
}

/// Cloneable producer handle.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Message>,
}

impl CommandSender {
    /// Queue a command. A full queue drops the command with a warning
    /// rather than stalling a reader thread; a disconnected queue means
    /// the writer already stopped, which only happens during shutdown.
    pub fn send(&self, command: RobotCommand) {
        match self.tx.try_send(Message::Command(command)) {
            Ok(()) => {}
            Err(TrySendError::Full(Message::Command(cmd))) => {
                log::warn!("Command queue full, dropping {:?}", cmd);
            }
            Err(_) => {}
        }
    }

    /// Stop the writer after it has drained everything queued before this
    /// call. Commands queued afterwards are discarded with the channel.
    pub(crate) fn stop(&self) {
        let _ = self.tx.send(Message::Stop);
    }
}

/// Spawn the writer thread. The returned [`CommandSender`] is the only
/// way to reach `transport`; the [`JoinHandle`] completes on
/// [`CommandSender::stop`], or when every sender is dropped and the
/// queue is drained.
///
/// A failed write means the robot can no longer be commanded, reset
/// included, so the writer requests shutdown before exiting.
pub fn spawn_writer(
    mut transport: Box<dyn Transport>,
    lifecycle: Lifecycle,
) -> (CommandSender, JoinHandle<()>) {
    let (tx, rx) = bounded::<Message>(QUEUE_DEPTH);

    let handle = thread::Builder::new()
        .name("cmd-writer".to_string())
        .spawn(move || {
            for message in rx {
                let command = match message {
                    Message::Command(command) => command,
                    Message::Stop => return,
                };
                log::debug!("Writing command {:?}", command);
                if let Err(e) = transport.write_all(&command.encode()) {
                    log::error!("Command write failed: {}", e);
                    lifecycle.request_shutdown();
                    return;
                }
            }
        })
        .expect("failed to spawn command writer thread");

    (CommandSender { tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::{Opcode, RECORD_LEN};
    use crate::transport::MockTransport;

    #[test]
    fn test_commands_reach_the_wire_in_order() {
        let mock = MockTransport::new();
        let (sender, handle) = spawn_writer(Box::new(mock.clone()), Lifecycle::new());

        sender.send(RobotCommand::reset());
        sender.send(RobotCommand::connect());
        sender.send(RobotCommand::move_speeds(50, -50, 200));
        drop(sender);
        handle.join().unwrap();

        let written = mock.written();
        assert_eq!(written.len(), 3 * RECORD_LEN);
        assert_eq!(
            i16::from_le_bytes([written[0], written[1]]),
            Opcode::Reset as i16
        );
        assert_eq!(
            i16::from_le_bytes([written[RECORD_LEN], written[RECORD_LEN + 1]]),
            Opcode::Connect as i16
        );
        assert_eq!(
            i16::from_le_bytes([written[2 * RECORD_LEN], written[2 * RECORD_LEN + 1]]),
            Opcode::Move as i16
        );
    }

    #[test]
    fn test_queue_drains_before_writer_exits() {
        let mock = MockTransport::new();
        let (sender, handle) = spawn_writer(Box::new(mock.clone()), Lifecycle::new());

        for _ in 0..QUEUE_DEPTH {
            sender.send(RobotCommand::move_speeds(10, 10, 200));
        }
        sender.send(RobotCommand::reset());
        drop(sender);
        handle.join().unwrap();

        // At least the commands that fit the queue were written; the final
        // reset may have been dropped only if the queue was still full.
        assert!(mock.written().len() >= QUEUE_DEPTH * RECORD_LEN);
    }

    struct BrokenTransport;

    impl Transport for BrokenTransport {
        fn read(&mut self, _buffer: &mut [u8]) -> crate::error::Result<usize> {
            Ok(0)
        }

        fn write_all(&mut self, _data: &[u8]) -> crate::error::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "port gone").into())
        }
    }

    #[test]
    fn test_write_failure_requests_shutdown() {
        let lifecycle = Lifecycle::new();
        lifecycle.set_running();

        let (sender, handle) = spawn_writer(Box::new(BrokenTransport), lifecycle.clone());
        sender.send(RobotCommand::reset());
        handle.join().unwrap();

        assert!(lifecycle.is_shutting_down());
    }

    #[test]
    fn test_send_after_writer_stopped_is_quiet() {
        let (tx, rx) = bounded::<Message>(QUEUE_DEPTH);
        drop(rx);

        // Must not panic or block.
        let sender = CommandSender { tx };
        sender.send(RobotCommand::reset());
    }

    #[test]
    fn test_stop_ends_writer_with_live_senders() {
        let mock = MockTransport::new();
        let (sender, handle) = spawn_writer(Box::new(mock.clone()), Lifecycle::new());

        let lingering = sender.clone();
        sender.send(RobotCommand::reset());
        sender.stop();
        handle.join().unwrap();

        // The reset queued before the stop was still written.
        assert_eq!(mock.written().len(), RECORD_LEN);
        drop(lingering);
    }
}
