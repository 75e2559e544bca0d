//! End-to-end pipeline tests over small synthetic scenes

use approx::assert_relative_eq;
use terrashift_analysis::prelude::*;
use terrashift_core::geo::BoundsTransform;

fn bounds() -> GeoBounds {
    GeoBounds::new(40.0, 39.0, -73.0, -74.0)
}

fn uniform_rgb(rows: usize, cols: usize, r: f64, g: f64, b: f64) -> RgbImage {
    RgbImage::new(
        Raster::filled(rows, cols, r),
        Raster::filled(rows, cols, g),
        Raster::filled(rows, cols, b),
    )
    .unwrap()
}

fn paint(band: &mut Raster<f64>, r0: usize, r1: usize, c0: usize, c1: usize, value: f64) {
    for r in r0..r1 {
        for c in c0..c1 {
            band.set(r, c, value).unwrap();
        }
    }
}

#[test]
fn identical_grids_produce_no_detections() {
    let grid: Raster<u16> = Raster::filled(50, 50, 1);
    let result = analyze_changes(&grid, &grid, None, &ChangeAnalyzerParams::default()).unwrap();

    assert!(result.detections.is_empty());
    assert_eq!(result.statistics.total_detections, 0);
    assert_relative_eq!(result.statistics.overall_change_percentage, 0.0);
}

#[test]
fn forest_to_urban_grid_yields_one_urbanization_detection() {
    let before: Raster<u16> = Raster::filled(50, 50, 1);
    let after: Raster<u16> = Raster::filled(50, 50, 2);
    let result = analyze_changes(&before, &after, None, &ChangeAnalyzerParams::default()).unwrap();

    assert_eq!(result.detections.len(), 1);
    let d = &result.detections[0];
    assert_eq!(d.change_type, ChangeType::Urbanization);
    // 2500 pixels at 0.01 hectares each
    assert_relative_eq!(d.area_hectares, 25.0);
    assert!(d.confidence >= 0.3 && d.confidence <= 0.95);
    // 25 ha urbanization at confidence 0.95 scores into the severe tier
    assert_eq!(d.severity, Severity::Severe);

    // The whole grid changed
    assert_relative_eq!(result.statistics.overall_change_percentage, 100.0);
}

#[test]
fn severity_rises_with_region_area() {
    let small = analyze_changes(
        &Raster::filled(50, 50, 1),
        &Raster::filled(50, 50, 2),
        None,
        &ChangeAnalyzerParams::default(),
    )
    .unwrap();
    // 1600 hectares clears the top area tier
    let large = analyze_changes(
        &Raster::filled(400, 400, 1),
        &Raster::filled(400, 400, 2),
        None,
        &ChangeAnalyzerParams::default(),
    )
    .unwrap();

    assert_eq!(small.detections[0].severity, Severity::Severe);
    assert_eq!(large.detections[0].severity, Severity::Catastrophic);
    assert!(large.detections[0].severity > small.detections[0].severity);
}

#[test]
fn large_flood_is_catastrophic() {
    let pre = uniform_rgb(300, 300, 120.0, 110.0, 90.0);
    let mut post = pre.clone();
    // A 200x200 block floods: 40000 pixels at 1 square meter each
    paint(&mut post.red, 50, 250, 50, 250, 40.0);
    paint(&mut post.green, 50, 250, 50, 250, 160.0);
    paint(&mut post.blue, 50, 250, 50, 250, 180.0);

    let result = analyze_disaster(&pre, &post, None, &DisasterAnalyzerParams::default()).unwrap();

    assert_eq!(result.disaster_type, DisasterType::Flood);
    assert_eq!(result.zones.len(), 1);

    let zone = &result.zones[0];
    assert_eq!(zone.zone_type, DamageZoneType::Flooded);
    assert_relative_eq!(zone.area_sq_meters, 40_000.0);
    assert_eq!(zone.severity, Severity::Catastrophic);
    assert_relative_eq!(zone.confidence, 0.8);

    // Catastrophic zones stamp the evacuation raster with the top value
    assert_eq!(result.evacuation_map.get(150, 150).unwrap(), 255);
    assert_eq!(result.access_map.get(150, 150).unwrap(), 255);
}

#[test]
fn nearby_detections_form_one_cluster() {
    let mut before: Raster<u16> = Raster::filled(200, 200, 1);
    let mut after = before.clone();

    // Ten 4x4 urbanized patches along a row, 16 pixels apart. With the
    // default 50-pixel eps every neighbor is reachable.
    for i in 0..10 {
        let c0 = 8 + i * 16;
        for r in 8..12 {
            for c in c0..c0 + 4 {
                before.set(r, c, 1).unwrap();
                after.set(r, c, 2).unwrap();
            }
        }
    }

    let params = ChangeAnalyzerParams {
        min_area_hectares: 0.0,
        ..Default::default()
    };
    let analysis = analyze_changes(&before, &after, None, &params).unwrap();
    assert_eq!(analysis.detections.len(), 10);

    let groups = cluster_detections(&analysis.detections, &ClusterParams::default());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, GroupKind::Cluster);
    assert_eq!(groups[0].count, 10);
    assert_eq!(groups[0].dominant_type, "urbanization");

    // Group area equals the sum of member areas
    let member_area: f64 = analysis.detections.iter().map(|d| d.area_hectares).sum();
    assert_relative_eq!(groups[0].total_area, member_area);
}

#[test]
fn pixel_origin_georeferences_to_north_west_corner() {
    let t = BoundsTransform::new(bounds(), 100, 100);
    let c = t.pixel_to_geo(0.0, 0.0);
    assert_relative_eq!(c.latitude, 40.0);
    assert_relative_eq!(c.longitude, -74.0);

    let (px, py) = t.geo_to_pixel(c);
    assert_relative_eq!(px, 0.0, epsilon = 1e-9);
    assert_relative_eq!(py, 0.0, epsilon = 1e-9);
}

#[test]
fn geojson_rings_are_closed_and_count_matches() {
    let before: Raster<u16> = Raster::filled(60, 60, 1);
    let mut after = before.clone();
    for r in 10..30 {
        for c in 10..30 {
            after.set(r, c, 2).unwrap();
        }
    }
    for r in 40..55 {
        for c in 40..55 {
            after.set(r, c, 4).unwrap();
        }
    }

    let analysis = analyze_changes(&before, &after, None, &ChangeAnalyzerParams::default()).unwrap();
    assert_eq!(analysis.detections.len(), 2);

    let fc = GeoJsonExporter::new(bounds()).export(&analysis.detections, (60, 60));
    assert_eq!(fc.metadata.feature_count, 2);
    for feature in &fc.features {
        let ring = &feature.geometry.coordinates[0];
        assert_eq!(ring.first(), ring.last());
        assert!(ring.len() >= 4);

        let p = &feature.properties;
        assert!(p.confidence >= 0.0 && p.confidence <= 1.0);
        assert!(p.area >= 0.1);
    }
}

#[test]
fn exported_ring_extents_match_the_region() {
    // Wide, short region: rows 10..15, cols 10..50. A transposed ring
    // would swap the lon/lat extents.
    let before: Raster<u16> = Raster::filled(60, 60, 1);
    let mut after = before.clone();
    for r in 10..15 {
        for c in 10..50 {
            after.set(r, c, 2).unwrap();
        }
    }

    let analysis = analyze_changes(&before, &after, None, &ChangeAnalyzerParams::default()).unwrap();
    assert_eq!(analysis.detections.len(), 1);

    let fc = GeoJsonExporter::new(bounds()).export(&analysis.detections, (60, 60));
    let ring = &fc.features[0].geometry.coordinates[0];

    let lon_min = ring.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
    let lon_max = ring.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
    let lat_min = ring.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
    let lat_max = ring.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);

    // Boundary pixel centers span cols 10..=49 and rows 10..=14
    let t = BoundsTransform::new(bounds(), 60, 60);
    let nw = t.pixel_to_geo(10.0, 10.0);
    let se = t.pixel_to_geo(49.0, 14.0);
    assert_relative_eq!(lon_min, nw.longitude);
    assert_relative_eq!(lon_max, se.longitude);
    assert_relative_eq!(lat_max, nw.latitude);
    assert_relative_eq!(lat_min, se.latitude);
}

#[test]
fn kml_export_carries_every_detection() {
    let before: Raster<u16> = Raster::filled(40, 40, 3);
    let after: Raster<u16> = Raster::filled(40, 40, 2);

    let analysis = analyze_changes(&before, &after, None, &ChangeAnalyzerParams::default()).unwrap();
    let kml = KmlExporter::new(bounds()).export(&analysis.detections, (40, 40));

    assert_eq!(kml.matches("<Placemark>").count(), analysis.detections.len());
    assert!(kml.contains("<styleUrl>#urbanization</styleUrl>"));
}

#[test]
fn clustering_same_input_twice_is_identical() {
    let pre = uniform_rgb(60, 60, 120.0, 110.0, 90.0);
    let mut post = pre.clone();
    paint(&mut post.red, 5, 25, 5, 25, 40.0);
    paint(&mut post.blue, 5, 25, 5, 25, 180.0);
    paint(&mut post.red, 35, 55, 35, 55, 40.0);
    paint(&mut post.blue, 35, 55, 35, 55, 180.0);

    let zones = detect_flood_zones(&pre, &post, &ZoneParams::default()).unwrap();
    assert_eq!(zones.len(), 2);

    let params = ClusterParams {
        max_distance_meters: 100.0,
        ground_sample_distance: 10.0,
    };
    let first = cluster_detections(&zones, &params);
    let second = cluster_detections(&zones, &params);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.members, b.members);
        assert_eq!(a.count, b.count);
    }
}

#[test]
fn zone_areas_respect_type_floors() {
    let pre = uniform_rgb(80, 80, 120.0, 110.0, 90.0);
    let mut post = pre.clone();
    // 30x30 flood = 900 square meters, above the 100 floor
    paint(&mut post.red, 10, 40, 10, 40, 40.0);
    paint(&mut post.blue, 10, 40, 10, 40, 180.0);

    let zones = detect_flood_zones(&pre, &post, &ZoneParams::default()).unwrap();
    for z in &zones {
        assert!(z.area_sq_meters >= 100.0);
        assert!(z.confidence >= 0.0 && z.confidence <= 1.0);
    }
}
