//! Remote manual control over HTTP.
//!
//! A deliberately small server for driving the robot from a browser on
//! the same network: `GET /command?left=<speed>&right=<speed>` queues a
//! move command and returns 200. Malformed parameters get 400, unknown
//! paths 404, and anything but GET 405. Every response names the client
//! in `Access-Control-Allow-Origin` so a page served from the robot's
//! address can call it cross-origin.
//!
//! One thread accepts connections and answers each one to completion;
//! requests are tiny and the client count is one human.

use crate::error::Result;
use crate::pipeline::{CommandSender, Lifecycle};
use crate::protocol::command::RobotCommand;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Bind `port` and spawn the accept loop. The loop exits when the
/// lifecycle reaches shutdown.
pub fn spawn(
    port: u16,
    commands: CommandSender,
    max_speed: i16,
    lifecycle: Lifecycle,
) -> Result<JoinHandle<()>> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    log::info!("HTTP control listening on port {}", port);
    spawn_on(listener, commands, max_speed, lifecycle)
}

fn spawn_on(
    listener: TcpListener,
    commands: CommandSender,
    max_speed: i16,
    lifecycle: Lifecycle,
) -> Result<JoinHandle<()>> {
    listener.set_nonblocking(true)?;

    let handle = thread::Builder::new()
        .name("http".to_string())
        .spawn(move || {
            while !lifecycle.is_shutting_down() {
                match listener.accept() {
                    Ok((stream, _)) => {
                        if let Err(e) = handle_connection(stream, &commands, max_speed) {
                            log::warn!("HTTP connection failed: {}", e);
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(50));
                    }
                    Err(e) => {
                        log::warn!("HTTP accept failed: {}", e);
                        thread::sleep(Duration::from_millis(50));
                    }
                }
            }
        })?;

    Ok(handle)
}

fn handle_connection(
    mut stream: TcpStream,
    commands: &CommandSender,
    max_speed: i16,
) -> std::io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_millis(500)))?;

    let mut buf = [0u8; 1024];
    let n = stream.read(&mut buf)?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let origin = stream
        .peer_addr()
        .map(|a| a.ip().to_string())
        .unwrap_or_else(|_| "*".to_string());

    let (status, body) = match parse_request_line(&request) {
        Some(("GET", target)) => match split_target(target) {
            ("/command", query) => match parse_speeds(query) {
                Some((left, right)) => {
                    commands.send(RobotCommand::move_speeds(left, right, max_speed));
                    ("200 OK", "ok")
                }
                None => ("400 Bad Request", "expected left=<int>&right=<int>"),
            },
            _ => ("404 Not Found", "unknown path"),
        },
        Some(_) => ("405 Method Not Allowed", "GET only"),
        None => ("400 Bad Request", "malformed request"),
    };

    write!(
        stream,
        "HTTP/1.1 {}\r\n\
         Access-Control-Allow-Origin: {}\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        origin,
        body.len(),
        body
    )
}

/// Method and request target from the first request line.
fn parse_request_line(request: &str) -> Option<(&str, &str)> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    Some((method, target))
}

/// Split a request target into path and query string.
fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

/// Extract `left` and `right` integer parameters from a query string.
fn parse_speeds(query: &str) -> Option<(i16, i16)> {
    let mut left = None;
    let mut right = None;

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=')?;
        match key {
            "left" => left = Some(value.parse().ok()?),
            "right" => right = Some(value.parse().ok()?),
            _ => {}
        }
    }

    Some((left?, right?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::spawn_writer;
    use crate::protocol::command::{Opcode, RECORD_LEN};
    use crate::transport::MockTransport;

    #[test]
    fn test_parse_speeds() {
        assert_eq!(parse_speeds("left=100&right=-100"), Some((100, -100)));
        assert_eq!(parse_speeds("right=5&left=7"), Some((7, 5)));
        assert_eq!(parse_speeds("left=100"), None);
        assert_eq!(parse_speeds("left=abc&right=1"), None);
        assert_eq!(parse_speeds(""), None);
        assert_eq!(parse_speeds("left=1&right=2&extra=3"), Some((1, 2)));
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("/command?left=1"), ("/command", "left=1"));
        assert_eq!(split_target("/"), ("/", ""));
    }

    #[test]
    fn test_request_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mock = MockTransport::new();
        let lifecycle = Lifecycle::new();
        lifecycle.set_running();
        let (sender, writer) = spawn_writer(Box::new(mock.clone()), lifecycle.clone());

        let handle = spawn_on(listener, sender.clone(), 200, lifecycle.clone()).unwrap();

        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET /command?left=90&right=-90 HTTP/1.1\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("Access-Control-Allow-Origin: 127.0.0.1"));

        lifecycle.request_shutdown();
        handle.join().unwrap();
        drop(sender);
        writer.join().unwrap();

        let written = mock.written();
        assert_eq!(written.len(), RECORD_LEN);
        assert_eq!(
            i16::from_le_bytes([written[0], written[1]]),
            Opcode::Move as i16
        );
        assert_eq!(i16::from_le_bytes([written[2], written[3]]), 90);
        assert_eq!(i16::from_le_bytes([written[4], written[5]]), -90);
    }

    #[test]
    fn test_unknown_path_is_404() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mock = MockTransport::new();
        let lifecycle = Lifecycle::new();
        lifecycle.set_running();
        let (sender, writer) = spawn_writer(Box::new(mock.clone()), lifecycle.clone());
        let handle = spawn_on(listener, sender.clone(), 200, lifecycle.clone()).unwrap();

        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET /nope HTTP/1.1\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        assert!(response.starts_with("HTTP/1.1 404"));

        lifecycle.request_shutdown();
        handle.join().unwrap();
        drop(sender);
        writer.join().unwrap();
        assert!(mock.written().is_empty());
    }
}
