mod commands;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use iris_client_rs::logging::setup_console_logging;

#[derive(Subcommand, Debug, Clone)]
enum LightCommands {
    List,
    Toggle {
        /// Light ids, may be repeated
        #[arg(long, required = true)]
        id: Vec<String>,
    },
    Set {
        #[arg(long)]
        id: String,
        /// Brightness, 1 to 254
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=254))]
        brightness: Option<u8>,
        /// Color as #rrggbb
        #[arg(long)]
        color: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum RoomCommands {
    List,
    Classes,
    Toggle {
        #[arg(long, required = true)]
        id: Vec<String>,
    },
    Set {
        #[arg(long)]
        id: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=254))]
        brightness: Option<u8>,
        #[arg(long)]
        color: Option<String>,
    },
    Create {
        #[arg(long)]
        name: String,
        /// Member light ids, comma separated
        #[arg(long, value_delimiter = ',')]
        lights: Vec<String>,
        #[arg(long = "class")]
        room_class: Option<String>,
    },
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Replaces the member lights, comma separated
        #[arg(long, value_delimiter = ',')]
        lights: Option<Vec<String>>,
        #[arg(long = "class")]
        room_class: Option<String>,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Shows whether the service is connected to a bridge
    Status,
    Connect {
        #[arg(long)]
        ip: String,
    },
    Lights {
        #[command(subcommand)]
        command: LightCommands,
    },
    Rooms {
        #[command(subcommand)]
        command: RoomCommands,
    },
    /// Converts a #rrggbb color to the bridge's hue and saturation
    Color {
        hex: String,
    },
}

#[derive(Parser, Debug)]
struct Params {
    /// Base URL of the bridge-control service (default from settings)
    #[clap(long, env = "IRIS_API_URL")]
    api_url: Option<String>,
    /// Settings file path (if not set, default settings are used)
    #[clap(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = setup_console_logging();
    let params = Params::parse();

    match &params.command.clone() {
        Commands::Status => commands::status(params).await?,
        Commands::Connect { ip } => commands::connect(params, ip).await?,
        Commands::Color { hex } => commands::convert_color(hex),
        Commands::Lights { command } => match command {
            LightCommands::List => commands::list_lights(params).await?,
            LightCommands::Toggle { id } => commands::toggle_lights(params, id).await?,
            LightCommands::Set {
                id,
                brightness,
                color,
            } => commands::set_light(params, id, *brightness, color.as_deref()).await?,
        },
        Commands::Rooms { command } => match command {
            RoomCommands::List => commands::list_rooms(params).await?,
            RoomCommands::Classes => commands::list_room_classes(params).await?,
            RoomCommands::Toggle { id } => commands::toggle_rooms(params, id).await?,
            RoomCommands::Set {
                id,
                brightness,
                color,
            } => commands::set_room(params, id, *brightness, color.as_deref()).await?,
            RoomCommands::Create {
                name,
                lights,
                room_class,
            } => commands::create_room(params, name, lights, room_class.as_deref()).await?,
            RoomCommands::Edit {
                id,
                name,
                lights,
                room_class,
            } => {
                commands::edit_room(
                    params,
                    id,
                    name.as_deref(),
                    lights.as_deref(),
                    room_class.as_deref(),
                )
                .await?
            }
            RoomCommands::Delete { id } => commands::delete_room(params, id).await?,
        },
    }

    Ok(())
}
