use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use roverlink_client::Session;

use crate::cmd::{parse_duration, parse_endpoint, WatchArgs};
use crate::exit::{CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::observer::PrintingObserver;
use crate::output::OutputFormat;

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let (host, port) = parse_endpoint(&args.endpoint)?;
    let timeout = parse_duration(&args.timeout)?;

    let (observer, ticks) = PrintingObserver::new(format);
    let session = Session::new(Arc::new(observer));
    if !session.connect_timeout(&host, port, timeout) {
        return Err(CliError::new(
            FAILURE,
            format!("could not connect to {host}:{port}"),
        ));
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        match ticks.recv_timeout(Duration::from_millis(200)) {
            Ok(()) => {
                printed = printed.saturating_add(1);
                if let Some(count) = args.count {
                    if printed >= count {
                        break;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    session.disconnect();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
