use roverlink_client::{ConfigStore, JsonConfigStore, RobotConfig};

use crate::cmd::{ConfigsAction, ConfigsArgs};
use crate::exit::{config_error, CliResult, SUCCESS};
use crate::output::{print_configs, OutputFormat};

pub fn run(args: ConfigsArgs, format: OutputFormat) -> CliResult<i32> {
    match args.action {
        ConfigsAction::List { store } => {
            let store = JsonConfigStore::open(&store)
                .map_err(|err| config_error("failed opening config store", err))?;
            let configs = store
                .read_configs()
                .map_err(|err| config_error("failed reading configs", err))?;
            print_configs(&configs, format);
        }
        ConfigsAction::Add {
            store,
            name,
            diameter,
            offset,
        } => {
            let store = JsonConfigStore::open(&store)
                .map_err(|err| config_error("failed opening config store", err))?;
            store
                .create_config(&RobotConfig::new(name, diameter, offset))
                .map_err(|err| config_error("failed writing config", err))?;
        }
    }
    Ok(SUCCESS)
}
