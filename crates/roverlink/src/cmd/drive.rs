use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use roverlink_client::{Direction, Session};

use crate::cmd::{parse_duration, parse_endpoint, DriveArgs};
use crate::exit::{CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::observer::StderrObserver;

pub fn run(args: DriveArgs) -> CliResult<i32> {
    let (host, port) = parse_endpoint(&args.endpoint)?;
    let timeout = parse_duration(&args.timeout)?;

    let session = Session::new(Arc::new(StderrObserver));
    if !session.connect_timeout(&host, port, timeout) {
        return Err(CliError::new(
            FAILURE,
            format!("could not connect to {host}:{port}"),
        ));
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    eprintln!("driving {host}:{port} (forward/back/left/right/stop, quit to exit)");

    // Stdin is read on its own thread so Ctrl-C does not have to wait for
    // the next Enter; the loop polls the flag between channel timeouts.
    let lines = spawn_stdin_reader()?;
    while running.load(Ordering::SeqCst) {
        let line = match lines.recv_timeout(Duration::from_millis(200)) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match line.trim() {
            "" => {}
            "forward" | "f" => session.move_robot(Direction::Forward),
            "back" | "backward" | "b" => session.move_robot(Direction::Backward),
            "left" | "l" => session.move_robot(Direction::Left),
            "right" | "r" => session.move_robot(Direction::Right),
            "stop" | "s" => session.stop_robot(),
            "quit" | "q" => break,
            other => eprintln!("unknown input {other:?} (forward/back/left/right/stop/quit)"),
        }
    }

    // Always leave the robot stationary before dropping the link.
    session.stop_robot();
    session.disconnect();
    Ok(SUCCESS)
}

/// Forward stdin lines over a channel. The thread exits on stdin EOF or
/// when the receiving side is gone; a read left blocking at process exit
/// is torn down with the process.
fn spawn_stdin_reader() -> CliResult<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("roverlink-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .map_err(|err| CliError::new(INTERNAL, format!("stdin reader setup failed: {err}")))?;
    Ok(rx)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
