//! Emergency-response priority rasters
//!
//! Two u8 rasters derived from the zone list: evacuation priority keyed on
//! zone severity, and relief-access difficulty keyed on zone type. Zones are
//! stamped with a scanline polygon fill (bbox fill when no outline was
//! traced) and overlaps keep the maximum value.

use terrashift_core::Raster;

use crate::disaster::zones::{DamageZone, DamageZoneType};

fn stamp(map: &mut Raster<u8>, row: usize, col: usize, value: u8) {
    let (rows, cols) = map.shape();
    if row < rows && col < cols {
        let current = unsafe { map.get_unchecked(row, col) };
        if value > current {
            unsafe { map.set_unchecked(row, col, value) };
        }
    }
}

/// Even-odd scanline fill of a closed pixel-coordinate ring.
///
/// Boundary pixels are stamped as well, so thin zones still appear.
fn fill_polygon(map: &mut Raster<u8>, ring: &[(usize, usize)], value: u8) {
    if ring.len() < 2 {
        return;
    }

    for &(x, y) in ring {
        stamp(map, y, x, value);
    }

    let min_y = ring.iter().map(|&(_, y)| y).min().unwrap_or(0);
    let max_y = ring.iter().map(|&(_, y)| y).max().unwrap_or(0);

    for y in min_y..=max_y {
        let yf = y as f64;
        let mut crossings: Vec<f64> = Vec::new();

        for window in ring.windows(2) {
            let (x0, y0) = (window[0].0 as f64, window[0].1 as f64);
            let (x1, y1) = (window[1].0 as f64, window[1].1 as f64);
            if (y0 - y1).abs() < f64::EPSILON {
                continue;
            }
            // Half-open span so shared vertices count once
            if (y0 <= yf && yf < y1) || (y1 <= yf && yf < y0) {
                crossings.push(x0 + (yf - y0) * (x1 - x0) / (y1 - y0));
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let start = pair[0].ceil() as usize;
            let end = pair[1].floor() as usize;
            for x in start..=end.max(start) {
                if (x as f64) <= pair[1] {
                    stamp(map, y, x, value);
                }
            }
        }
    }
}

fn fill_zone(map: &mut Raster<u8>, zone: &DamageZone, value: u8) {
    match &zone.polygon {
        Some(ring) if ring.len() > 2 => fill_polygon(map, ring, value),
        _ => {
            let b = zone.bbox;
            for row in b.y..b.y + b.height {
                for col in b.x..b.x + b.width {
                    stamp(map, row, col, value);
                }
            }
        }
    }
}

/// Evacuation priority raster.
///
/// Background 0; zones filled with 255/200/150/100 by descending severity.
pub fn evacuation_priority_map(zones: &[DamageZone], shape: (usize, usize)) -> Raster<u8> {
    let mut map = Raster::new(shape.0, shape.1);
    for zone in zones {
        fill_zone(&mut map, zone, zone.severity.priority_fill());
    }
    map
}

/// Relief-access difficulty raster.
///
/// Background 100 (accessible); flooded and collapsed zones fill with 255,
/// debris with 200, other damage with 150.
pub fn relief_access_map(zones: &[DamageZone], shape: (usize, usize)) -> Raster<u8> {
    let mut map = Raster::filled(shape.0, shape.1, 100);
    for zone in zones {
        let difficulty = match zone.zone_type {
            DamageZoneType::Flooded | DamageZoneType::Collapsed => 255,
            DamageZoneType::Debris => 200,
            _ => 150,
        };
        fill_zone(&mut map, zone, difficulty);
    }
    map
}
