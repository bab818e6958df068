// src/source/daemon.rs
//! Miner daemon status API adapter
//!
//! Speaks the cgminer/BFGMiner API: connect, send a bare command such as
//! `summary`, read the reply until the daemon closes the socket. Replies come
//! either as JSON or as `key=value` pairs separated by `,` and `|`.

use super::{HashrateSource, no_data};
use crate::config::Config;
use crate::types::SampleSource;
use crate::utils::error::TelemetryError;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const LABEL: &str = "Miner API";

/// Largest reply read from the daemon
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Rate keys in order of preference; the first one present and numeric wins
const RATE_KEYS: [&str; 10] = [
    "MHS av", "MHS 5s", "MHS 1m", "MHS 5m", "MHS 15m", "GHS av", "KHS 5s", "KHS av", "KHS", "GHS",
];

/// Polls the miner's status API over a short-lived TCP connection
#[derive(Debug, Clone)]
pub struct DaemonApiSource {
    host: String,
    port: u16,
    command: String,
    timeout: Duration,
}

impl DaemonApiSource {
    /// Creates an adapter for `host:port`
    ///
    /// # Arguments
    /// * `host` - Daemon host name or IP
    /// * `port` - Daemon API port
    /// * `command` - Command written to the socket, usually `summary`
    pub fn new(host: impl Into<String>, port: u16, command: impl Into<String>) -> Self {
        DaemonApiSource {
            host: host.into(),
            port,
            command: command.into(),
            timeout: Duration::from_secs(1),
        }
    }

    /// Creates an adapter from the `api_*` configuration keys
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_host.clone(), config.api_port, config.api_command.clone())
    }

    /// Overrides the 1 second budget for a whole query
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends the command and returns the raw reply
    ///
    /// Resolution, connect, write and every read share one deadline, so a
    /// daemon trickling its reply can't hold the caller past the timeout.
    ///
    /// # Errors
    /// Returns `TelemetryError` if no address accepts the connection, the
    /// write fails, or nothing arrives before the deadline.
    pub fn query(&self) -> Result<String, TelemetryError> {
        let deadline = Instant::now() + self.timeout;
        let mut stream = self.connect(deadline)?;
        stream.set_write_timeout(Some(remaining(deadline)?))?;
        stream.write_all(self.command.as_bytes())?;

        let mut data = Vec::with_capacity(4096);
        let mut chunk = [0u8; 4096];
        while data.len() < MAX_RESPONSE_BYTES {
            let left = match remaining(deadline) {
                Ok(left) => left,
                Err(_) if !data.is_empty() => break,
                Err(e) => return Err(e),
            };
            stream.set_read_timeout(Some(left))?;
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => data.extend_from_slice(&chunk[..n]),
                // Keep what arrived if the daemon leaves the socket open
                Err(e)
                    if !data.is_empty()
                        && matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        data.truncate(MAX_RESPONSE_BYTES);

        Ok(String::from_utf8_lossy(&data).replace('\0', ""))
    }

    fn connect(&self, deadline: Instant) -> Result<TcpStream, TelemetryError> {
        let mut last_err = None;
        for addr in self.resolve(deadline)? {
            match TcpStream::connect_timeout(&addr, remaining(deadline)?) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(TelemetryError::ConnectionError(match last_err {
            Some(e) => format!("{}:{}: {}", self.host, self.port, e),
            None => format!("{}:{} did not resolve", self.host, self.port),
        }))
    }

    /// Resolves the host, giving up at `deadline`
    ///
    /// IP literals skip the resolver. Names are looked up on a helper thread
    /// since `to_socket_addrs` has no timeout of its own; a lookup still
    /// running at the deadline is abandoned.
    fn resolve(&self, deadline: Instant) -> Result<Vec<SocketAddr>, TelemetryError> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, self.port)]);
        }

        let (tx, rx) = mpsc::channel();
        let target = (self.host.clone(), self.port);
        thread::Builder::new()
            .name("api-resolve".into())
            .spawn(move || {
                let _ = tx.send(target.to_socket_addrs().map(|addrs| addrs.collect::<Vec<_>>()));
            })?;

        match rx.recv_timeout(remaining(deadline)?) {
            Ok(addrs) => Ok(addrs?),
            Err(_) => Err(TelemetryError::ConnectionError(format!(
                "{}: name lookup timed out",
                self.host
            ))),
        }
    }
}

/// Time left before `deadline`; an error once it has passed
fn remaining(deadline: Instant) -> Result<Duration, TelemetryError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(TelemetryError::ConnectionError("timed out".into()))
    } else {
        Ok(left)
    }
}

impl HashrateSource for DaemonApiSource {
    fn kind(&self) -> SampleSource {
        SampleSource::DaemonApi
    }

    fn poll(&self) -> (f64, String) {
        match self.query() {
            Ok(raw) => match extract_rate(&raw) {
                Some(hz) => (hz, LABEL.to_string()),
                None => {
                    log::debug!("Miner API reply carried no hashrate: {:.120}", raw);
                    (0.0, no_data(LABEL))
                }
            },
            Err(e) => {
                log::debug!("Miner API query failed: {}", e);
                (0.0, no_data(LABEL))
            }
        }
    }
}

/// Finds the hashrate in a daemon reply, in H/s
///
/// JSON replies are searched at the top level first, then in the first
/// `SUMMARY` entry where cgminer actually puts its figures.
pub fn extract_rate(raw: &str) -> Option<f64> {
    parse_reply(raw).iter().find_map(rate_from_fields)
}

/// Splits a reply into candidate field maps, in search order
fn parse_reply(raw: &str) -> Vec<HashMap<String, String>> {
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(Value::Object(top)) = serde_json::from_str::<Value>(&raw[start..=end]) {
                let mut maps = vec![json_fields(&top)];
                if let Some(Value::Object(summary)) =
                    top.get("SUMMARY").and_then(|s| s.as_array()).and_then(|a| a.first())
                {
                    maps.push(json_fields(summary));
                }
                return maps;
            }
        }
    }

    let fields = text_fields(raw);
    if fields.is_empty() { vec![] } else { vec![fields] }
}

fn json_fields(object: &serde_json::Map<String, Value>) -> HashMap<String, String> {
    object
        .iter()
        .filter_map(|(k, v)| match v {
            Value::Number(n) => Some((k.clone(), n.to_string())),
            Value::String(s) => Some((k.clone(), s.clone())),
            _ => None,
        })
        .collect()
}

fn text_fields(raw: &str) -> HashMap<String, String> {
    raw.split([',', '|'])
        .filter_map(|part| part.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn rate_from_fields(fields: &HashMap<String, String>) -> Option<f64> {
    RATE_KEYS.iter().find_map(|&key| {
        let value: f64 = fields.get(key)?.trim().parse().ok()?;
        if value.is_finite() && value >= 0.0 {
            Some(value * unit_scale(key))
        } else {
            None
        }
    })
}

fn unit_scale(key: &str) -> f64 {
    if key.starts_with("MHS") {
        1e6
    } else if key.starts_with("GHS") {
        1e9
    } else {
        1e3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Instant;

    /// Serves one canned reply on an ephemeral port
    fn serve_once(reply: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 64];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(reply.as_bytes());
            }
        });
        port
    }

    #[test]
    fn test_priority_prefers_mhs_5s_over_khs_av() {
        let raw = "STATUS=S,Msg=Summary|SUMMARY,KHS av=900,MHS 5s=1.5,Elapsed=60|";
        assert_eq!(extract_rate(raw), Some(1.5e6));
    }

    #[test]
    fn test_text_reply_with_units() {
        assert_eq!(extract_rate("GHS av=2.5"), Some(2.5e9));
        assert_eq!(extract_rate("a=1|KHS=250"), Some(250e3));
        assert_eq!(extract_rate("GHS=0.5,foo=bar"), Some(0.5e9));
        assert_eq!(extract_rate("Elapsed=5,Accepted=3"), None);
        assert_eq!(extract_rate(""), None);
    }

    #[test]
    fn test_unparseable_key_falls_through() {
        let raw = "MHS av=n/a,MHS 5s=,KHS av=120.5";
        assert_eq!(extract_rate(raw), Some(120.5e3));
    }

    #[test]
    fn test_json_top_level() {
        let raw = r#"{"MHS 5s": 3.25, "KHS av": "10"}"#;
        assert_eq!(extract_rate(raw), Some(3.25e6));
        // numeric strings work too
        assert_eq!(extract_rate(r#"{"KHS 5s": "42"}"#), Some(42e3));
    }

    #[test]
    fn test_json_nested_summary() {
        let raw = "{\"STATUS\":[{\"STATUS\":\"S\",\"Code\":11}],\"SUMMARY\":[{\"Elapsed\":93,\"MHS av\":0.25,\"MHS 5s\":0.3}],\"id\":1}\0";
        assert_eq!(extract_rate(raw), Some(0.25e6));
    }

    #[test]
    fn test_broken_json_falls_back_to_text() {
        let raw = "junk {not json},MHS 1m=2";
        assert_eq!(extract_rate(raw), Some(2e6));
    }

    #[test]
    fn test_poll_over_tcp() {
        let port = serve_once("STATUS=S,When=1|SUMMARY,MHS 5s=1.5,KHS av=900|\0");
        let source = DaemonApiSource::new("127.0.0.1", port, "summary");
        let (hz, label) = source.poll();
        assert_eq!(hz, 1.5e6);
        assert_eq!(label, "Miner API");
    }

    #[test]
    fn test_refused_connection_yields_no_data() {
        // bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let source = DaemonApiSource::new("127.0.0.1", port, "summary")
            .with_timeout(Duration::from_millis(200));
        let (hz, label) = source.poll();
        assert_eq!(hz, 0.0);
        assert_eq!(label, "Miner API (no data)");
    }

    #[test]
    fn test_trickling_reply_is_cut_at_deadline() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 64];
                let _ = stream.read(&mut buf);
                for _ in 0..8 {
                    if stream.write_all(b"S").is_err() {
                        return;
                    }
                    thread::sleep(Duration::from_millis(600));
                }
                let _ = stream.write_all(b",MHS 5s=1");
            }
        });

        let started = Instant::now();
        let (hz, label) = DaemonApiSource::new("127.0.0.1", port, "summary").poll();
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_millis(1500), "poll blocked {:?}", elapsed);
        assert_eq!(hz, 0.0);
        assert_eq!(label, "Miner API (no data)");
    }

    #[test]
    fn test_silent_daemon_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(3));
                drop(stream);
            }
        });

        let started = Instant::now();
        let result = DaemonApiSource::new("127.0.0.1", port, "summary")
            .with_timeout(Duration::from_millis(300))
            .query();
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_millis(800));
    }

    #[test]
    fn test_reply_without_rate_yields_no_data() {
        let port = serve_once("STATUS=E,Msg=Invalid command|");
        let (hz, label) = DaemonApiSource::new("127.0.0.1", port, "summary").poll();
        assert_eq!(hz, 0.0);
        assert!(label.ends_with("(no data)"));
    }
}
