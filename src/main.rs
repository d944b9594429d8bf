use clap::Parser;
use image::{ImageBuffer, Luma};

use terra_core::biome::{BiomeKind, BiomeRegistry};
use terra_core::config::GenConfig;
use terra_core::generator::TerrainGenerator;

#[derive(Parser, Debug)]
#[command(name = "terra-gen")]
#[command(about = "Generate a deterministic procedural terrain atlas")]
struct Args {
    /// Number of tile rows.
    #[arg(long, default_value = "2")]
    rows: usize,

    /// Number of tile columns.
    #[arg(long, default_value = "2")]
    cols: usize,

    /// Side length of one tile, overlap margin included.
    #[arg(long, default_value = "512")]
    tile_size: usize,

    /// Overlap margin shared by all four sides of a tile.
    #[arg(long, default_value = "32")]
    overlap: usize,

    /// Side length of the smallest pyramid level.
    #[arg(long, default_value = "64")]
    base_size: usize,

    /// Number of pyramid levels. Omit to derive it from log2 of the atlas
    /// size, per the documented default in `GenConfig::effective_steps`.
    #[arg(long)]
    steps: Option<u32>,

    /// Master seed.
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Named biome preset: temperate, alpine, or desert.
    #[arg(short, long, default_value = "temperate")]
    biome: String,

    /// Simulated geological erosion time, in years.
    #[arg(long, default_value = "2500")]
    erosion_years: f64,

    /// Output directory for the atlas and mask PNGs.
    #[arg(short, long, default_value = "out")]
    out_dir: String,
}

fn parse_biome(name: &str) -> BiomeKind {
    match name.to_ascii_lowercase().as_str() {
        "alpine" => BiomeKind::Alpine,
        "desert" => BiomeKind::Desert,
        _ => BiomeKind::Temperate,
    }
}

fn write_heightfield_png(path: &std::path::Path, field: &terra_core::heightfield::HeightField) {
    let (w, h) = (field.width as u32, field.height as u32);
    let min = field.as_slice().iter().cloned().fold(f32::MAX, f32::min);
    let max = field.as_slice().iter().cloned().fold(f32::MIN, f32::max);
    let span = (max - min).max(1e-6);

    let img = ImageBuffer::from_fn(w, h, |x, y| {
        let v = field.get(x as i64, y as i64);
        let norm = ((v - min) / span * 255.0).clamp(0.0, 255.0) as u8;
        Luma([norm])
    });
    if let Err(e) = img.save(path) {
        eprintln!("failed to write {}: {e}", path.display());
    }
}

fn main() {
    let args = Args::parse();

    let cfg = GenConfig {
        rows: args.rows,
        cols: args.cols,
        tile_size: args.tile_size,
        overlap: args.overlap,
        base_size: args.base_size,
        steps: args.steps,
        seed: args.seed,
        erosion_years: args.erosion_years,
        ..GenConfig::default()
    };

    let biome = BiomeRegistry::get(parse_biome(&args.biome));

    let generator = TerrainGenerator::new();
    let result = match generator.generate(&cfg, &biome) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    std::fs::create_dir_all(&args.out_dir).expect("failed to create output directory");
    let out_dir = std::path::Path::new(&args.out_dir);

    write_heightfield_png(&out_dir.join("atlas.png"), &result.atlas);
    if let Some(water) = &result.water_features {
        write_heightfield_png(&out_dir.join("water_mask.png"), &water.water_mask);
        write_heightfield_png(&out_dir.join("river_mask.png"), &water.river_mask);
        write_heightfield_png(&out_dir.join("beach_mask.png"), &water.beach_mask);
        write_heightfield_png(&out_dir.join("flow_accumulation.png"), &water.flow_accumulation);
    }
    write_heightfield_png(&out_dir.join("hardness.png"), &result.hardness);

    println!(
        "generated {} tiles, atlas {}x{}, written to {}",
        result.tiles.len(),
        result.atlas_size.0,
        result.atlas_size.1,
        args.out_dir
    );
}
