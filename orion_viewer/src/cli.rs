use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Interactive viewer for the Orion guide scene", version)]
pub struct Args {
    /// Number of background stars to scatter across the sky
    #[arg(long, default_value_t = 500)]
    pub star_count: usize,

    /// Seed for the starfield so repeated runs produce the same sky
    #[arg(long)]
    pub star_seed: Option<u64>,

    /// Free-camera movement applied per rendered frame while a key is held
    #[arg(long, default_value_t = 0.1)]
    pub move_speed: f32,

    /// When set, write a JSON summary of the built scene before launching
    #[arg(long)]
    pub dump_scene: Option<PathBuf>,

    /// Skip creating a winit window/event loop; useful for headless automation
    #[arg(long)]
    pub headless: bool,
}
