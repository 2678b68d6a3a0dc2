// Build a multi-page TIFF, query it, and extract each page into a canvas

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use imquery::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "imquery-demo")]
#[command(about = "Query multi-page containers before decoding them", long_about = None)]
struct Args {
    /// Background image the pages are extracted into
    #[arg(long)]
    background: Option<PathBuf>,

    /// Source image resized into each page
    #[arg(long)]
    source: Option<PathBuf>,

    #[arg(short, long, default_value = "./imquery-out")]
    output: PathBuf,

    #[arg(short, long, default_value = "10")]
    pages: usize,

    /// Downsample factor used when extracting (1, 2, 4 or 8)
    #[arg(short, long, default_value = "2")]
    reduction: u32,

    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "imquery=info,imquery_demo=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let background_path = match args.background {
        Some(path) => path,
        None => synthesize(&args.output.join("background.png"), 1024, 768, [30, 60, 90])?,
    };
    let source_path = match args.source {
        Some(path) => path,
        None => synthesize(&args.output.join("source.png"), 640, 480, [200, 120, 40])?,
    };

    let background_info = Inspector::open(&background_path);
    let source_info = Inspector::open(&source_path);

    if background_info.page_count() == 0 || source_info.page_count() == 0 {
        println!(
            "there is a problem opening files, result code 1: {}, result code 2: {}",
            background_info.result_code(),
            source_info.result_code()
        );
        println!("Done");
        return Ok(());
    }

    let mut canvas = read(&background_path, ReadMode::color())?;
    let source = read(&source_path, ReadMode::color())?;
    let source = RgbImage::from_raw(source.width(), source.height(), source.data)
        .context("source buffer does not match its dimensions")?;

    let mut pages = Vec::with_capacity(args.pages);
    for i in 0..args.pages {
        let width = rng.gen_range(240..=480);
        let height = rng.gen_range(200..=400);
        let resized = imageops::resize(&source, width, height, FilterType::Triangle);

        let page = if i > 5 {
            let gray = DynamicImage::ImageRgb8(resized).into_luma8();
            Image::from_raw(Dimensions::new(width, height), ColorChannels::Gray, gray.into_raw())?
        } else {
            Image::from_raw(Dimensions::new(width, height), ColorChannels::RGB, resized.into_raw())?
        };
        pages.push(page);
    }

    let container = args.output.join("images.tif");
    write_pages(&container, &pages, WriterOptions::default())?;

    let container_info = Inspector::open(&container);
    if container_info.page_count() != pages.len() {
        bail!(
            "{} reports {} pages, wrote {} (result code {})",
            container.display(),
            container_info.page_count(),
            pages.len(),
            container_info.result_code()
        );
    }

    let canvas_size = canvas.dimensions;
    for i in 0..container_info.page_count() {
        let page_size = container_info.dimensions(i)?;
        println!(
            "image dimensions of page #{} {} {}",
            i, page_size.width, page_size.height
        );

        let Some(region) = Rect::centered(canvas_size, page_size) else {
            warn!(page = i, "page larger than background, skipped");
            continue;
        };

        let (written, rect) = {
            let mut roi = canvas.roi_mut(region)?;
            extract(&container, &mut roi, args.reduction, i)?
        };
        if !written {
            warn!(page = i, ?region, "region too small for reduced page");
            continue;
        }

        let roi_path = args.output.join(format!("roi_{}.png", i));
        write(&roi_path, &canvas.crop(rect)?)?;
        info!(page = i, ?rect, path = %roi_path.display(), "extracted page");
    }

    let composite = args.output.join("imread_into_roi.png");
    write(&composite, &canvas)?;
    info!(path = %composite.display(), "saved composite");

    println!("Done");
    Ok(())
}

/// Write a gradient image to `path` and return the path
fn synthesize(path: &Path, width: u32, height: u32, tint: [u8; 3]) -> Result<PathBuf> {
    let mut image = Image::new(Dimensions::new(width, height), ColorChannels::RGB)?;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            image.data[idx] = tint[0].wrapping_add(((x * 255) / width) as u8);
            image.data[idx + 1] = tint[1].wrapping_add(((y * 255) / height) as u8);
            image.data[idx + 2] = tint[2];
        }
    }
    write(path, &image)?;
    Ok(path.to_path_buf())
}
