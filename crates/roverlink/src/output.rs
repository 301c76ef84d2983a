use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use roverlink_client::{Pose, RobotConfig};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TelemetryOutput<'a> {
    Pose { x: f32, y: f32, heading: f32 },
    Status { text: &'a str },
    Video { size: usize },
}

fn print_json(out: &TelemetryOutput<'_>) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_pose(pose: Pose, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&TelemetryOutput::Pose {
            x: pose.x,
            y: pose.y,
            heading: pose.heading,
        }),
        // A streaming table is unreadable; fall through to one-line output.
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("pose x={} y={} heading={}", pose.x, pose.y, pose.heading);
        }
    }
}

pub fn print_status(text: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&TelemetryOutput::Status { text }),
        OutputFormat::Table | OutputFormat::Pretty => println!("status {text}"),
    }
}

pub fn print_video(size: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&TelemetryOutput::Video { size }),
        OutputFormat::Table | OutputFormat::Pretty => println!("video frame ({size} bytes)"),
    }
}

pub fn print_configs(configs: &[RobotConfig], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(configs).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "DIAMETER", "OFFSET"]);
            for config in configs {
                table.add_row(vec![
                    config.name.clone(),
                    config.diameter.to_string(),
                    config.offset.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for config in configs {
                println!(
                    "{} diameter={} offset={}",
                    config.name, config.diameter, config.offset
                );
            }
        }
    }
}
