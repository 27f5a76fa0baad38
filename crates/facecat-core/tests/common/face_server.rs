//! Minimal HTTP/1.1 server that replays scripted responses for client tests.
//!
//! Each accepted request pops the next `(status, body)` pair; once the script
//! is exhausted the last response repeats. Request lines are recorded.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<String>>>);

impl Recorded {
    /// Request lines ("POST /face/v1.0/detect?returnFaceId=true HTTP/1.1") seen so far.
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Starts the server in a background thread. Returns the API root URL
/// (e.g. "http://127.0.0.1:12345/face/v1.0") and the request log.
pub fn start(script: Vec<(u32, &'static str)>) -> (String, Recorded) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let script = Arc::new(Mutex::new(VecDeque::from(script)));
    let recorded = Recorded::default();
    let log = recorded.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let next = {
                let mut s = script.lock().unwrap();
                if s.len() > 1 {
                    s.pop_front()
                } else {
                    s.front().cloned()
                }
            };
            let (status, body) = next.unwrap_or((500, ""));
            let log = log.clone();
            thread::spawn(move || handle(stream, status, body, &log));
        }
    });
    (format!("http://127.0.0.1:{}/face/v1.0", port), recorded)
}

fn handle(mut stream: TcpStream, status: u32, body: &str, log: &Recorded) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    // Read headers, then the declared body, before answering.
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head
        .lines()
        .find_map(|l| {
            let (k, v) = l.split_once(':')?;
            k.eq_ignore_ascii_case("content-length")
                .then(|| v.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    if let Some(line) = head.lines().next() {
        log.0.lock().unwrap().push(line.to_string());
    }

    let reason = match status {
        200 => "OK",
        202 => "Accepted",
        404 => "Not Found",
        409 => "Conflict",
        429 => "Too Many Requests",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
