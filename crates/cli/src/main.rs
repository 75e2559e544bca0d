//! Terrashift CLI - land-cover change and disaster damage analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use terrashift_analysis::change::{
    analyze_changes, analyze_changes_batch, summary_report, ChangeAnalyzerParams,
};
use terrashift_analysis::cluster::{cluster_detections, ClusterParams, GroupKind};
use terrashift_analysis::disaster::{
    analyze_disaster, DisasterAnalyzerParams, DisasterType, RgbImage, ZoneParams,
};
use terrashift_analysis::export::{GeoJsonExporter, KmlExporter};
use terrashift_core::io::{read_geo_bounds, read_geotiff, read_rgb_geotiff, write_geotiff};
use terrashift_core::{GeoBounds, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "terrashift")]
#[command(author, version, about = "Land-cover change and disaster damage analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Analyze two land-cover label grids for typed changes
    Change {
        /// Before label grid (GeoTIFF)
        before: PathBuf,
        /// After label grid (GeoTIFF)
        after: PathBuf,
        /// Optional per-pixel confidence map (GeoTIFF, values in 0..1)
        #[arg(long)]
        confidence: Option<PathBuf>,
        /// GeoJSON output file
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// KML output file
        #[arg(long)]
        kml: Option<PathBuf>,
        /// Summary report output file (JSON)
        #[arg(long)]
        report: Option<PathBuf>,
        /// Geographic bounds as "north,south,east,west" (overrides file tags)
        #[arg(long)]
        bounds: Option<String>,
        /// Hectares covered by one pixel
        #[arg(long, default_value = "0.01")]
        pixel_hectares: f64,
        /// Minimum detection area in hectares
        #[arg(long, default_value = "0.1")]
        min_area: f64,
        /// Group nearby detections within this many meters
        #[arg(long)]
        cluster_distance: Option<f64>,
        /// Ground sample distance in meters per pixel (for clustering)
        #[arg(long, default_value = "10.0")]
        gsd: f64,
    },
    /// Analyze before/after RGB imagery for disaster damage zones
    Disaster {
        /// Pre-event RGB imagery (GeoTIFF)
        pre: PathBuf,
        /// Post-event RGB imagery (GeoTIFF)
        post: PathBuf,
        /// Disaster type: flood, fire, earthquake, hurricane, landslide, tornado
        /// (auto-detected when omitted)
        #[arg(short = 't', long)]
        disaster_type: Option<DisasterType>,
        /// GeoJSON output file
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// KML output file
        #[arg(long)]
        kml: Option<PathBuf>,
        /// Evacuation priority raster output (GeoTIFF)
        #[arg(long)]
        evacuation: Option<PathBuf>,
        /// Relief access raster output (GeoTIFF)
        #[arg(long)]
        access: Option<PathBuf>,
        /// Damage assessment output file (JSON)
        #[arg(long)]
        assessment: Option<PathBuf>,
        /// Geographic bounds as "north,south,east,west" (overrides file tags)
        #[arg(long)]
        bounds: Option<String>,
        /// Square meters covered by one pixel
        #[arg(long, default_value = "1.0")]
        pixel_meters: f64,
    },
    /// Analyze a directory of grid pairs (*_before.tif / *_after.tif)
    Batch {
        /// Directory containing the label grid pairs
        input_dir: PathBuf,
        /// Directory for the GeoJSON outputs
        output_dir: PathBuf,
        /// Hectares covered by one pixel
        #[arg(long, default_value = "0.01")]
        pixel_hectares: f64,
        /// Minimum detection area in hectares
        #[arg(long, default_value = "0.1")]
        min_area: f64,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_labels(path: &Path) -> Result<Raster<u16>> {
    let pb = spinner("Reading label grid...");
    let raster: Raster<u16> = read_geotiff(path)
        .with_context(|| format!("Failed to read label grid {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_rgb(path: &Path) -> Result<RgbImage> {
    let pb = spinner("Reading RGB imagery...");
    let (red, green, blue) = read_rgb_geotiff(path)
        .with_context(|| format!("Failed to read RGB imagery {}", path.display()))?;
    pb.finish_and_clear();
    let image = RgbImage::new(red, green, blue).context("Inconsistent band shapes")?;
    info!("Input: {} x {}", image.shape().1, image.shape().0);
    Ok(image)
}

/// Parse "north,south,east,west" into bounds
fn parse_bounds(s: &str) -> Result<GeoBounds> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().context("Invalid bounds component"))
        .collect::<Result<_>>()?;
    if parts.len() != 4 {
        anyhow::bail!("Bounds must be 'north,south,east,west', got: {}", s);
    }
    Ok(GeoBounds::new(parts[0], parts[1], parts[2], parts[3]))
}

/// Bounds from the CLI argument, the file's GeoTIFF tags, or a unit fallback
fn resolve_bounds(arg: &Option<String>, file: &Path) -> Result<GeoBounds> {
    if let Some(s) = arg {
        return parse_bounds(s);
    }
    if let Some(bounds) = read_geo_bounds(file)
        .with_context(|| format!("Failed to read georeferencing from {}", file.display()))?
    {
        return Ok(bounds);
    }
    warn!("No georeferencing found; exports use a unit bounding box");
    Ok(GeoBounds::new(1.0, 0.0, 1.0, 0.0))
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn write_raster_u8(raster: &Raster<u8>, path: &Path, bounds: &GeoBounds) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path, Some(bounds))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Collect (before, after, stem) path triples from a directory
fn collect_pairs(dir: &Path) -> Result<Vec<(PathBuf, PathBuf, String)>> {
    let mut pairs = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if let Some(stem) = name.strip_suffix("_before.tif") {
            let after = dir.join(format!("{stem}_after.tif"));
            if after.exists() {
                pairs.push((path.clone(), after, stem.to_string()));
            } else {
                warn!("No after grid for {}", path.display());
            }
        }
    }
    pairs.sort_by(|a, b| a.2.cmp(&b.2));
    Ok(pairs)
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster: Raster<f64> = read_geotiff(&input)
                .with_context(|| format!("Failed to read raster {}", input.display()))?;
            let (rows, cols) = raster.shape();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            if let Some(bounds) = read_geo_bounds(&input)? {
                println!(
                    "Bounds: N {:.6} S {:.6} E {:.6} W {:.6}",
                    bounds.north, bounds.south, bounds.east, bounds.west
                );
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }

        // ── Change ───────────────────────────────────────────────────
        Commands::Change {
            before,
            after,
            confidence,
            geojson,
            kml,
            report,
            bounds,
            pixel_hectares,
            min_area,
            cluster_distance,
            gsd,
        } => {
            let before_grid = read_labels(&before)?;
            let after_grid = read_labels(&after)?;
            let confidence_map = match &confidence {
                Some(path) => Some(
                    read_geotiff::<f64, _>(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let geo = resolve_bounds(&bounds, &before)?;

            let params = ChangeAnalyzerParams {
                pixel_to_hectare_ratio: pixel_hectares,
                min_area_hectares: min_area,
            };

            let start = Instant::now();
            let pb = spinner("Analyzing changes...");
            let analysis =
                analyze_changes(&before_grid, &after_grid, confidence_map.as_ref(), &params)
                    .context("Change analysis failed")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            let stats = &analysis.statistics;
            println!("Detections: {}", stats.total_detections);
            println!(
                "Changed area: {:.2} ha ({:.2}% of image)",
                stats.total_changed_area_hectares, stats.overall_change_percentage
            );
            for (name, breakdown) in &stats.change_type_breakdown {
                println!(
                    "  {}: {} ({:.2} ha)",
                    name, breakdown.count, breakdown.total_area_hectares
                );
            }
            println!("  Processing time: {:.2?}", elapsed);

            if let Some(distance) = cluster_distance {
                let groups = cluster_detections(
                    &analysis.detections,
                    &ClusterParams {
                        max_distance_meters: distance,
                        ground_sample_distance: gsd,
                    },
                );
                println!("\nSpatial groups: {}", groups.len());
                for group in &groups {
                    let kind = match group.kind {
                        GroupKind::Cluster => "cluster",
                        GroupKind::Individual => "individual",
                    };
                    println!(
                        "  {} of {} ({}, {:.2} ha, max severity {})",
                        kind,
                        group.count,
                        group.dominant_type,
                        group.total_area,
                        group.max_severity.as_str()
                    );
                }
            }

            let shape = before_grid.shape();
            if let Some(path) = geojson {
                let fc = GeoJsonExporter::new(geo).export(&analysis.detections, shape);
                write_json(&fc, &path)?;
                done("GeoJSON", &path, elapsed);
            }
            if let Some(path) = kml {
                let doc = KmlExporter::new(geo).export(&analysis.detections, shape);
                std::fs::write(&path, doc)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                done("KML", &path, elapsed);
            }
            if let Some(path) = report {
                write_json(&summary_report(&analysis), &path)?;
                done("Summary report", &path, elapsed);
            }
        }

        // ── Disaster ─────────────────────────────────────────────────
        Commands::Disaster {
            pre,
            post,
            disaster_type,
            geojson,
            kml,
            evacuation,
            access,
            assessment,
            bounds,
            pixel_meters,
        } => {
            let pre_image = read_rgb(&pre)?;
            let post_image = read_rgb(&post)?;
            let geo = resolve_bounds(&bounds, &pre)?;

            let params = DisasterAnalyzerParams {
                zones: ZoneParams {
                    pixel_to_meter_ratio: pixel_meters,
                    ..Default::default()
                },
                ..Default::default()
            };

            let start = Instant::now();
            let pb = spinner("Analyzing damage...");
            let analysis = analyze_disaster(&pre_image, &post_image, disaster_type, &params)
                .context("Disaster analysis failed")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            println!("Disaster type: {}", analysis.disaster_type);
            println!("Damage zones: {}", analysis.assessment.total_damage_zones);
            println!(
                "Damaged area: {:.0} m2 ({:.2}% of image)",
                analysis.assessment.total_damaged_area_sq_meters,
                analysis.assessment.damage_percentage
            );
            println!(
                "Structures affected: {}",
                analysis.assessment.structures_affected
            );
            println!(
                "Emergency priority: {}",
                analysis.assessment.emergency_priority.as_str()
            );
            println!("  Processing time: {:.2?}", elapsed);

            let shape = pre_image.shape();
            if let Some(path) = geojson {
                let fc = GeoJsonExporter::new(geo).export(&analysis.zones, shape);
                write_json(&fc, &path)?;
                done("GeoJSON", &path, elapsed);
            }
            if let Some(path) = kml {
                let doc = KmlExporter::new(geo).export(&analysis.zones, shape);
                std::fs::write(&path, doc)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                done("KML", &path, elapsed);
            }
            if let Some(path) = evacuation {
                write_raster_u8(&analysis.evacuation_map, &path, &geo)?;
                done("Evacuation priority map", &path, elapsed);
            }
            if let Some(path) = access {
                write_raster_u8(&analysis.access_map, &path, &geo)?;
                done("Relief access map", &path, elapsed);
            }
            if let Some(path) = assessment {
                write_json(&analysis.assessment, &path)?;
                done("Damage assessment", &path, elapsed);
            }
        }

        // ── Batch ────────────────────────────────────────────────────
        Commands::Batch {
            input_dir,
            output_dir,
            pixel_hectares,
            min_area,
        } => {
            let triples = collect_pairs(&input_dir)?;
            if triples.is_empty() {
                anyhow::bail!("No *_before.tif / *_after.tif pairs in {}", input_dir.display());
            }
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;

            let mut pairs = Vec::with_capacity(triples.len());
            for (before, after, _) in &triples {
                pairs.push((read_labels(before)?, read_labels(after)?));
            }

            let params = ChangeAnalyzerParams {
                pixel_to_hectare_ratio: pixel_hectares,
                min_area_hectares: min_area,
            };

            let start = Instant::now();
            let pb = ProgressBar::new(pairs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{bar:40.green} {pos}/{len} {msg}")
                    .unwrap(),
            );
            let results = analyze_changes_batch(&pairs, &params);

            let mut failures = 0usize;
            for (((before, _, stem), pair), result) in
                triples.iter().zip(&pairs).zip(results)
            {
                pb.inc(1);
                let analysis = match result {
                    Ok(a) => a,
                    Err(e) => {
                        warn!("{}: {}", stem, e);
                        failures += 1;
                        continue;
                    }
                };
                let geo = resolve_bounds(&None, before)?;
                let fc = GeoJsonExporter::new(geo).export(&analysis.detections, pair.0.shape());
                let out = output_dir.join(format!("{stem}_changes.geojson"));
                write_json(&fc, &out)?;
                info!(
                    "{}: {} detections, {:.2} ha changed",
                    stem,
                    analysis.statistics.total_detections,
                    analysis.statistics.total_changed_area_hectares
                );
            }
            pb.finish_and_clear();

            println!(
                "Processed {} pairs ({} failed) in {:.2?}",
                triples.len(),
                failures,
                start.elapsed()
            );
            println!("Outputs in: {}", output_dir.display());
        }
    }

    Ok(())
}
