use std::sync::Arc;

use roverlink_client::{JsonConfigStore, Session};
use roverlink_wire::WaypointPath;

use crate::cmd::{parse_duration, parse_endpoint, SendArgs};
use crate::exit::{config_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS};
use crate::observer::StderrObserver;

pub fn run(args: SendArgs) -> CliResult<i32> {
    let (host, port) = parse_endpoint(&args.endpoint)?;
    let timeout = parse_duration(&args.timeout)?;

    let mut session = Session::new(Arc::new(StderrObserver));
    if let Some(store_path) = &args.store {
        let store = JsonConfigStore::open(store_path)
            .map_err(|err| config_error("failed opening config store", err))?;
        session = session.with_config_store(Box::new(store));
    }

    if !session.connect_timeout(&host, port, timeout) {
        return Err(CliError::new(
            FAILURE,
            format!("could not connect to {host}:{port}"),
        ));
    }

    if let Some(dir) = args.r#move {
        session.move_robot(dir.into());
    } else if args.stop {
        session.stop_robot();
    } else if let Some(name) = &args.config {
        let configs = session.configs().unwrap_or_default();
        let config = configs.iter().find(|c| &c.name == name).ok_or_else(|| {
            CliError::new(DATA_INVALID, format!("no configuration named {name:?}"))
        })?;
        session.send_config(config);
    } else if let Some(path_file) = &args.path {
        let path = load_path(path_file)?;
        session.send_waypoints(&path);
    }

    session.disconnect();
    Ok(SUCCESS)
}

fn load_path(file: &std::path::Path) -> CliResult<WaypointPath> {
    let raw = std::fs::read_to_string(file)
        .map_err(|err| crate::exit::io_error(&format!("failed reading {}", file.display()), err))?;
    serde_json::from_str(&raw).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("{} is not a valid waypoint path: {err}", file.display()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_path_parses_waypoint_json() {
        let dir = std::env::temp_dir().join(format!(
            "roverlink-send-path-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("path.json");
        std::fs::write(
            &file,
            r#"[{"x": 1.0, "y": 2.0, "heading": 90.0}, {"x": 3.0, "y": 4.0, "heading": 0.0}]"#,
        )
        .unwrap();

        let path = load_path(&file).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.waypoints()[0].x, 1.0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_path_rejects_invalid_json() {
        let dir = std::env::temp_dir().join(format!(
            "roverlink-send-badpath-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("bad.json");
        std::fs::write(&file, "{not json").unwrap();

        let err = load_path(&file).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
