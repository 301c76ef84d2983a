use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use roverlink_wire::{Command, CommandWriter, Direction, WaypointPath};
use tracing::{debug, info, warn};

use crate::config::{ConfigStore, RobotConfig};
use crate::error::{ClientError, Result};
use crate::observer::RobotObserver;
use crate::receiver::TelemetryReceiver;

/// Message shown for any connect failure. Unreachable, refused, and timed
/// out are deliberately collapsed: the operator can't act on the difference.
const CONNECT_FAILED: &str = "Connection failed.";

/// The live link: exists if and only if the session is connected.
struct Link {
    writer: CommandWriter<TcpStream>,
    receiver: TelemetryReceiver,
}

/// A control session with one robot.
///
/// The session owns the socket's write half and the connection state;
/// a [`TelemetryReceiver`] owns the read half while connected. Command
/// methods are best-effort fire-and-forget: they silently do nothing when
/// disconnected, and a failed write is reported to the observer without
/// tearing the session down; the broken link is reconciled on the next
/// explicit disconnect or connect.
///
/// All methods take `&self`; the session is safe to share across threads
/// (e.g. a UI thread issuing commands while a signal handler disconnects).
/// A command call racing a disconnect observes either a fully connected or
/// a fully disconnected session, never a half-closed socket.
pub struct Session {
    observer: Arc<dyn RobotObserver>,
    store: Option<Box<dyn ConfigStore>>,
    link: Mutex<Option<Link>>,
}

impl Session {
    /// Create a disconnected session reporting to `observer`, with no
    /// configuration store ("configs unsupported").
    pub fn new(observer: Arc<dyn RobotObserver>) -> Self {
        Self {
            observer,
            store: None,
            link: Mutex::new(None),
        }
    }

    /// Attach a configuration store.
    pub fn with_config_store(mut self, store: Box<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Connect to the robot, blocking for the platform's default connect
    /// duration. Returns false (reporting to the observer where there is
    /// something to act on) if already connected or the socket cannot be
    /// opened.
    pub fn connect(&self, host: &str, port: u16) -> bool {
        self.establish(host, port, |addr| {
            TcpStream::connect(addr).map_err(|source| ClientError::Connect {
                addr: addr.to_string(),
                source,
            })
        })
    }

    /// Connect with a bound on the connect attempt. A timeout is reported
    /// identically to any other connect failure.
    pub fn connect_timeout(&self, host: &str, port: u16, timeout: Duration) -> bool {
        self.establish(host, port, |addr| {
            let mut last = None;
            let resolved = addr.to_socket_addrs().map_err(|source| ClientError::Connect {
                addr: addr.to_string(),
                source,
            })?;
            for candidate in resolved {
                match TcpStream::connect_timeout(&candidate, timeout) {
                    Ok(stream) => return Ok(stream),
                    Err(err) => last = Some(err),
                }
            }
            Err(ClientError::Connect {
                addr: addr.to_string(),
                source: last.unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::NotFound, "address did not resolve")
                }),
            })
        })
    }

    fn establish<F>(&self, host: &str, port: u16, dial: F) -> bool
    where
        F: FnOnce(&str) -> Result<TcpStream>,
    {
        let mut guard = self.lock_link();
        if guard.is_some() {
            // Silent refusal: state is unchanged and the caller sees false.
            debug!(host, port, "connect refused: already connected");
            return false;
        }

        let addr = format!("{host}:{port}");
        match dial(&addr).and_then(|stream| self.open_link(stream)) {
            Ok(link) => {
                *guard = Some(link);
                info!(%addr, "connected to robot");
                true
            }
            Err(err) => {
                warn!(%addr, error = %err, "connect failed");
                self.observer.set_message(CONNECT_FAILED);
                false
            }
        }
    }

    fn open_link(&self, stream: TcpStream) -> Result<Link> {
        // Commands are tiny and latency-sensitive; never batch them.
        stream.set_nodelay(true)?;
        let read_half = stream.try_clone()?;
        let receiver = TelemetryReceiver::spawn(read_half, Arc::clone(&self.observer))?;
        Ok(Link {
            writer: CommandWriter::new(stream),
            receiver,
        })
    }

    /// Tear the link down. A no-op when already disconnected; otherwise
    /// closes the socket, waits for the telemetry receiver to terminate,
    /// and clears the state. Close and termination errors are reported but
    /// never leave the session half-connected. Idempotent.
    ///
    /// After this returns, no further observer callback fires from the
    /// previously active receiver.
    pub fn disconnect(&self) {
        let mut guard = self.lock_link();
        let Some(link) = guard.take() else {
            return;
        };

        // Shutting the socket down unblocks the receiver's pending read.
        if let Err(err) = link.writer.get_ref().shutdown(Shutdown::Both) {
            warn!(error = %err, "socket shutdown failed");
            self.observer.set_message(&format!("disconnect error: {err}"));
        }
        if let Err(err) = link.receiver.stop() {
            warn!(error = %err, "telemetry receiver did not stop cleanly");
            self.observer.set_message(&err.to_string());
        }
        info!("disconnected from robot");
    }

    /// True iff the session is connected. O(1).
    pub fn is_connected(&self) -> bool {
        self.lock_link().is_some()
    }

    /// Drive in `direction`. No-op when disconnected.
    pub fn move_robot(&self, direction: Direction) {
        self.send_command(&Command::Move(direction));
    }

    /// Stop all motion. No-op when disconnected.
    pub fn stop_robot(&self) {
        self.send_command(&Command::Stop);
    }

    /// Hand the robot a waypoint path. No-op when disconnected.
    pub fn send_waypoints(&self, path: &WaypointPath) {
        self.send_command(&Command::SendPath(path.clone()));
    }

    /// Push a configuration's drive geometry to the robot. No-op when
    /// disconnected.
    pub fn send_config(&self, config: &RobotConfig) {
        self.send_command(&Command::SendConfig {
            diameter: config.diameter,
            offset: config.offset,
        });
    }

    fn send_command(&self, command: &Command) {
        let mut guard = self.lock_link();
        let Some(link) = guard.as_mut() else {
            return;
        };
        if let Err(err) = link.writer.send(command) {
            // Reported, not retried, and the session stays "connected":
            // the broken pipe is reconciled on the next connect/disconnect.
            warn!(error = %err, ?command, "command write failed");
            self.observer.set_message(&format!("command failed: {err}"));
        }
    }

    /// Read all stored configurations.
    ///
    /// `None` means configurations are unsupported (no store attached) or
    /// the store failed; a store failure is additionally reported to the
    /// observer. Never panics.
    pub fn configs(&self) -> Option<Vec<RobotConfig>> {
        let store = self.store.as_ref()?;
        match store.read_configs() {
            Ok(configs) => Some(configs),
            Err(err) => {
                warn!(error = %err, "config store read failed");
                self.observer.set_message(&format!("config store error: {err}"));
                None
            }
        }
    }

    /// Persist a configuration. No-op without a store; store failures are
    /// reported to the observer.
    pub fn save_config(&self, config: &RobotConfig) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(err) = store.create_config(config) {
            warn!(error = %err, "config store write failed");
            self.observer.set_message(&format!("config store error: {err}"));
        }
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Link>> {
        // The guarded state is a plain Option; a panic mid-update cannot
        // leave it torn, so a poisoned lock is still usable.
        match self.link.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use bytes::{Buf, Bytes, BytesMut};
    use roverlink_wire::codec::{encode_telemetry, Pose, Telemetry};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Event {
        Message(String),
        Pose(Pose),
        Video(usize),
    }

    struct ChannelObserver {
        tx: Mutex<mpsc::Sender<Event>>,
    }

    impl ChannelObserver {
        fn new() -> (Arc<Self>, mpsc::Receiver<Event>) {
            let (tx, rx) = mpsc::channel();
            (Arc::new(Self { tx: Mutex::new(tx) }), rx)
        }
    }

    impl RobotObserver for ChannelObserver {
        fn set_message(&self, text: &str) {
            let _ = self
                .tx
                .lock()
                .unwrap()
                .send(Event::Message(text.to_string()));
        }

        fn update_map(&self, pose: Pose) {
            let _ = self.tx.lock().unwrap().send(Event::Pose(pose));
        }

        fn update_video(&self, frame: Bytes) {
            let _ = self.tx.lock().unwrap().send(Event::Video(frame.len()));
        }
    }

    /// A scripted robot: accepts one connection, optionally sends telemetry,
    /// then reads the command stream to EOF and returns the received bytes.
    fn fake_robot(telemetry: Vec<u8>) -> (String, u16, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut socket, _) = listener.accept().expect("robot should accept");
            if !telemetry.is_empty() {
                use std::io::Write;
                socket.write_all(&telemetry).expect("telemetry should send");
            }
            let mut received = Vec::new();
            let _ = socket.read_to_end(&mut received);
            received
        });
        ("127.0.0.1".to_string(), port, handle)
    }

    #[test]
    fn lifecycle_connect_then_disconnect() {
        let (host, port, robot) = fake_robot(Vec::new());
        let (observer, _rx) = ChannelObserver::new();
        let session = Session::new(observer);

        assert!(!session.is_connected());
        assert!(session.connect(&host, port));
        assert!(session.is_connected());

        session.disconnect();
        assert!(!session.is_connected());
        robot.join().unwrap();
    }

    #[test]
    fn connect_while_connected_is_refused_silently() {
        let (host, port, robot) = fake_robot(Vec::new());
        let (observer, rx) = ChannelObserver::new();
        let session = Session::new(observer);

        assert!(session.connect(&host, port));
        assert!(!session.connect(&host, port));
        assert!(session.is_connected());
        // Refusal is silent: no observer message.
        assert!(rx.try_recv().is_err());

        session.disconnect();
        robot.join().unwrap();
    }

    #[test]
    fn disconnect_when_disconnected_is_noop() {
        let (observer, rx) = ChannelObserver::new();
        let session = Session::new(observer);

        session.disconnect();
        session.disconnect();

        assert!(!session.is_connected());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn double_disconnect_after_connect_is_safe() {
        let (host, port, robot) = fake_robot(Vec::new());
        let (observer, _rx) = ChannelObserver::new();
        let session = Session::new(observer);

        assert!(session.connect(&host, port));
        session.disconnect();
        session.disconnect();
        assert!(!session.is_connected());
        robot.join().unwrap();
    }

    #[test]
    fn connect_timeout_to_unreachable_host_fails_with_message() {
        let (observer, rx) = ChannelObserver::new();
        let session = Session::new(observer);

        // TEST-NET-3 address: never routable. Depending on the network this
        // fails fast (refused/unreachable) or hits the timeout; both must
        // surface the same way.
        let connected =
            session.connect_timeout("203.0.113.1", 9, Duration::from_millis(300));

        assert!(!connected);
        assert!(!session.is_connected());
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            Event::Message("Connection failed.".to_string())
        );
    }

    #[test]
    fn commands_while_disconnected_are_silent_noops() {
        let (observer, rx) = ChannelObserver::new();
        let session = Session::new(observer);

        session.move_robot(Direction::Forward);
        session.stop_robot();
        session.send_waypoints(&WaypointPath::new());
        session.send_config(&RobotConfig::new("default", 4.15, 6.49));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn commands_reach_the_wire_in_order() {
        let (host, port, robot) = fake_robot(Vec::new());
        let (observer, _rx) = ChannelObserver::new();
        let session = Session::new(observer);

        assert!(session.connect(&host, port));
        session.move_robot(Direction::Forward);
        session.stop_robot();
        session.disconnect();

        let received = robot.join().unwrap();
        assert_eq!(received, vec![0, 0, 0, 1, 0, 0, 0, 5]);
    }

    #[test]
    fn send_config_writes_exactly_sixteen_bytes() {
        let (host, port, robot) = fake_robot(Vec::new());
        let (observer, _rx) = ChannelObserver::new();
        let session = Session::new(observer);

        assert!(session.connect(&host, port));
        session.send_config(&RobotConfig::new("default", 4.15, 6.49));
        session.disconnect();

        let received = robot.join().unwrap();
        assert_eq!(received.len(), 16);
        assert_eq!(&received[0..8], &4.15_f64.to_be_bytes());
        assert_eq!(&received[8..16], &6.49_f64.to_be_bytes());
    }

    #[test]
    fn send_waypoints_delegates_path_encoding() {
        let path = WaypointPath::from(vec![
            roverlink_wire::Waypoint {
                x: 1.0,
                y: 2.0,
                heading: 0.0,
            },
            roverlink_wire::Waypoint {
                x: 3.0,
                y: 4.0,
                heading: 90.0,
            },
        ]);

        let (host, port, robot) = fake_robot(Vec::new());
        let (observer, _rx) = ChannelObserver::new();
        let session = Session::new(observer);

        assert!(session.connect(&host, port));
        session.send_waypoints(&path);
        session.disconnect();

        let received = robot.join().unwrap();
        let mut buf = BytesMut::from(received.as_slice());
        assert_eq!(buf.get_i32(), 6);
        let decoded = WaypointPath::decode(&mut buf).expect("path should decode");
        assert_eq!(decoded, path);
    }

    #[test]
    fn telemetry_is_dispatched_to_observer() {
        let pose = Pose {
            x: 20.0,
            y: 20.0,
            heading: 0.0,
        };
        let mut telemetry = BytesMut::new();
        encode_telemetry(&Telemetry::Pose(pose), &mut telemetry).unwrap();
        encode_telemetry(&Telemetry::Status("ready".to_string()), &mut telemetry).unwrap();
        encode_telemetry(&Telemetry::Video(Bytes::from(vec![9u8; 128])), &mut telemetry).unwrap();

        let (host, port, robot) = fake_robot(telemetry.to_vec());
        let (observer, rx) = ChannelObserver::new();
        let session = Session::new(observer);

        assert!(session.connect(&host, port));
        let timeout = Duration::from_secs(2);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), Event::Pose(pose));
        assert_eq!(
            rx.recv_timeout(timeout).unwrap(),
            Event::Message("ready".to_string())
        );
        assert_eq!(rx.recv_timeout(timeout).unwrap(), Event::Video(128));

        session.disconnect();
        robot.join().unwrap();
    }

    #[test]
    fn malformed_telemetry_mid_stream_reports_and_recovers() {
        let pose = Pose {
            x: 1.0,
            y: 2.0,
            heading: 3.0,
        };
        let mut telemetry = BytesMut::new();
        use bytes::BufMut;
        telemetry.put_i32(1234);
        encode_telemetry(&Telemetry::Pose(pose), &mut telemetry).unwrap();

        let (host, port, robot) = fake_robot(telemetry.to_vec());
        let (observer, rx) = ChannelObserver::new();
        let session = Session::new(observer);

        assert!(session.connect(&host, port));
        let timeout = Duration::from_secs(2);
        match rx.recv_timeout(timeout).unwrap() {
            Event::Message(text) => assert!(text.contains("telemetry decode error")),
            other => panic!("expected decode error message, got {other:?}"),
        }
        assert_eq!(rx.recv_timeout(timeout).unwrap(), Event::Pose(pose));

        session.disconnect();
        robot.join().unwrap();
    }

    #[test]
    fn no_observer_callback_after_disconnect_returns() {
        // The robot streams poses continuously until its socket drops.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let robot = thread::spawn(move || {
            use std::io::Write;
            let (mut socket, _) = listener.accept().unwrap();
            let mut wire = BytesMut::new();
            encode_telemetry(
                &Telemetry::Pose(Pose {
                    x: 0.0,
                    y: 0.0,
                    heading: 0.0,
                }),
                &mut wire,
            )
            .unwrap();
            while socket.write_all(&wire).is_ok() {
                thread::sleep(Duration::from_millis(1));
            }
        });

        let (observer, rx) = ChannelObserver::new();
        let session = Session::new(observer);
        assert!(session.connect("127.0.0.1", port));

        // Let some telemetry flow, then tear down.
        let _ = rx.recv_timeout(Duration::from_secs(2));
        session.disconnect();

        // Drain anything dispatched before disconnect completed, then
        // verify the old receiver produces nothing further.
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());

        robot.join().unwrap();
    }

    #[test]
    fn dropped_connection_is_not_auto_reconciled() {
        // Fire-and-forget model: the robot vanishing does not flip the
        // session to disconnected; only an explicit disconnect does.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let robot = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            drop(socket);
        });

        let (observer, _rx) = ChannelObserver::new();
        let session = Session::new(observer);
        assert!(session.connect("127.0.0.1", port));
        robot.join().unwrap();

        // Give the receiver time to observe EOF; the session still reports
        // connected until the caller reconciles it.
        thread::sleep(Duration::from_millis(100));
        assert!(session.is_connected());

        session.disconnect();
        assert!(!session.is_connected());
    }

    #[test]
    fn configs_without_store_is_none() {
        let (observer, _rx) = ChannelObserver::new();
        let session = Session::new(observer);
        assert!(session.configs().is_none());
        // And saving is a silent no-op.
        session.save_config(&RobotConfig::new("default", 4.15, 6.49));
    }

    #[test]
    fn configs_roundtrip_through_store() {
        let dir = std::env::temp_dir().join(format!(
            "roverlink-session-store-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let store = crate::config::JsonConfigStore::open(dir.join("configs.json")).unwrap();

        let (observer, _rx) = ChannelObserver::new();
        let session = Session::new(observer).with_config_store(Box::new(store));

        session.save_config(&RobotConfig::new("default", 4.15, 6.49));
        let configs = session.configs().expect("store should be attached");
        assert_eq!(configs, vec![RobotConfig::new("default", 4.15, 6.49)]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
