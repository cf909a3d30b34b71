//! Hex map viewer: generates a map, triangulates it and lets you edit cells.

use bevy::app::AppExit;
use bevy::prelude::*;
#[cfg(feature = "native")]
use bevy::remote::{RemotePlugin, http::RemoteHttpPlugin};
use bevy_inspector_egui::quick::WorldInspectorPlugin;

use hex_map::hex_map::{HexMapPlugin, MapConfig};
use hex_map::viewer::{ViewerConfig, ViewerPlugin};
use hex_map::{GameState, MapFocus};

#[cfg(feature = "native")]
#[derive(clap::Parser, Debug)]
#[command(about = "Generate and view a hex map")]
struct Cli {
    /// Seed for terrain and rivers.
    #[arg(long)]
    seed: Option<u32>,
    /// Number of hex rings around the origin.
    #[arg(long)]
    radius: Option<u32>,
    /// Number of rivers to grow.
    #[arg(long)]
    rivers: Option<usize>,
}

fn map_config() -> MapConfig {
    #[allow(unused_mut)]
    let mut cfg = MapConfig::default();
    #[cfg(feature = "native")]
    {
        use clap::Parser;
        let cli = Cli::parse();
        if let Some(seed) = cli.seed {
            cfg.grid.seed = seed;
        }
        if let Some(radius) = cli.radius {
            cfg.grid.radius = radius;
        }
        if let Some(rivers) = cli.rivers {
            cfg.grid.river_count = rivers;
        }
    }
    cfg
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Hex Map".into(),
            ..default()
        }),
        ..default()
    }))
    .register_type::<GameState>()
    .register_type::<MapFocus>()
    .init_state::<GameState>()
    .init_resource::<MapFocus>();

    #[cfg(feature = "native")]
    app.add_plugins(RemotePlugin::default())
        .add_plugins(RemoteHttpPlugin::default());

    app.add_plugins(bevy_egui::EguiPlugin::default())
        .add_plugins(HexMapPlugin(map_config()))
        .add_plugins(ViewerPlugin(ViewerConfig::default()))
        .add_systems(Update, exit_on_esc)
        .add_systems(Update, toggle_inspector)
        .add_plugins(WorldInspectorPlugin::new().run_if(in_state(GameState::Debugging)));

    app.run();
}

fn toggle_inspector(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::Tab) {
        let new_state = match state.get() {
            GameState::Running => GameState::Debugging,
            GameState::Debugging => GameState::Running,
        };
        next.set(new_state);
    }
}

fn exit_on_esc(keys: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
