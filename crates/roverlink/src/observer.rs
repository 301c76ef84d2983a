use std::sync::mpsc;
use std::sync::Mutex;

use bytes::Bytes;
use roverlink_client::{Pose, RobotObserver};

use crate::output::{self, OutputFormat};

/// Observer for one-shot and teleop commands: status lines go to stderr,
/// telemetry is discarded (those commands don't watch the robot).
pub struct StderrObserver;

impl RobotObserver for StderrObserver {
    fn set_message(&self, text: &str) {
        eprintln!("{text}");
    }

    fn update_map(&self, _pose: Pose) {}

    fn update_video(&self, _frame: Bytes) {}
}

/// Observer for `watch`: prints every telemetry message to stdout in the
/// selected format and ticks a channel so the main thread can count.
/// When the telemetry stream ends the sender is dropped, which the main
/// thread sees as a disconnected channel.
pub struct PrintingObserver {
    format: OutputFormat,
    tick: Mutex<Option<mpsc::Sender<()>>>,
}

impl PrintingObserver {
    pub fn new(format: OutputFormat) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                format,
                tick: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    fn tick(&self) {
        if let Ok(guard) = self.tick.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(());
            }
        }
    }
}

impl RobotObserver for PrintingObserver {
    fn set_message(&self, text: &str) {
        output::print_status(text, self.format);
        self.tick();
    }

    fn update_map(&self, pose: Pose) {
        output::print_pose(pose, self.format);
        self.tick();
    }

    fn update_video(&self, frame: Bytes) {
        output::print_video(frame.len(), self.format);
        self.tick();
    }

    fn stream_ended(&self) {
        if let Ok(mut guard) = self.tick.lock() {
            guard.take();
        }
    }
}
