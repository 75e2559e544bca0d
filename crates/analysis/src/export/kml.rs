//! KML export
//!
//! Hand-built document: a shared style palette keyed by detection type name
//! followed by one Placemark per detection with an HTML description balloon.
//! KML colors are aabbggrr.

use std::fmt::Write;

use chrono::Utc;
use terrashift_core::geo::{BoundsTransform, GeoBounds};

use crate::detection::Detection;
use crate::export::{default_bounds, geo_ring, title_case};

/// (style id, fill color) palette; outline is always black
const STYLES: [(&str, &str); 10] = [
    ("deforestation", "ff0000ff"),
    ("urbanization", "ff808080"),
    ("water_increase", "ffff0000"),
    ("water_decrease", "ff00ffff"),
    ("disaster_damage", "ff0000ff"),
    ("reforestation", "ff00c800"),
    ("burned", "ff0080ff"),
    ("flooded", "ffff0000"),
    ("collapsed", "ff8000ff"),
    ("debris", "ff009696"),
];

const DEFAULT_STYLE: (&str, &str) = ("default", "ff00ff00");

fn style_id_for(type_name: &str) -> &str {
    STYLES
        .iter()
        .find(|(id, _)| *id == type_name)
        .map(|(id, _)| *id)
        .unwrap_or(DEFAULT_STYLE.0)
}

/// Builds KML documents from detection lists
#[derive(Debug, Clone)]
pub struct KmlExporter {
    pub bounds: GeoBounds,
    pub document_name: String,
}

impl Default for KmlExporter {
    fn default() -> Self {
        Self {
            bounds: default_bounds(),
            document_name: "Change Detection Results".to_string(),
        }
    }
}

impl KmlExporter {
    pub fn new(bounds: GeoBounds) -> Self {
        Self {
            bounds,
            ..Default::default()
        }
    }

    /// Render detections as a KML string.
    ///
    /// `image_shape` is (rows, cols) of the analyzed imagery.
    pub fn export<D: Detection>(&self, detections: &[D], image_shape: (usize, usize)) -> String {
        let transform = BoundsTransform::new(self.bounds, image_shape.0, image_shape.1);
        let now = Utc::now();

        let mut kml = String::new();
        kml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        kml.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
        kml.push_str("  <Document>\n");
        let _ = writeln!(kml, "    <name>{}</name>", self.document_name);
        let _ = writeln!(
            kml,
            "    <description>Change detection results generated on {}</description>",
            now.to_rfc3339()
        );

        for (id, color) in STYLES.iter().chain(std::iter::once(&DEFAULT_STYLE)) {
            write_style(&mut kml, id, color);
        }

        for (i, detection) in detections.iter().enumerate() {
            self.write_placemark(&mut kml, i, detection, &transform, &now);
        }

        kml.push_str("  </Document>\n");
        kml.push_str("</kml>\n");
        kml
    }

    fn write_placemark<D: Detection>(
        &self,
        kml: &mut String,
        index: usize,
        detection: &D,
        transform: &BoundsTransform,
        now: &chrono::DateTime<Utc>,
    ) {
        let type_name = detection.type_name();
        let title = title_case(type_name);

        kml.push_str("    <Placemark>\n");
        let _ = writeln!(kml, "      <name>{} #{}</name>", title, index + 1);

        let _ = writeln!(
            kml,
            "      <description><![CDATA[\n\
             <h3>Change Detection</h3>\n\
             <table>\n\
             <tr><td><b>Type:</b></td><td>{}</td></tr>\n\
             <tr><td><b>Confidence:</b></td><td>{:.1}%</td></tr>\n\
             <tr><td><b>Severity:</b></td><td>{}</td></tr>\n\
             <tr><td><b>Area:</b></td><td>{:.2}</td></tr>\n\
             <tr><td><b>Detected:</b></td><td>{}</td></tr>\n\
             </table>\n\
             ]]></description>",
            title,
            detection.confidence() * 100.0,
            title_case(detection.severity().as_str()),
            detection.area(),
            now.format("%Y-%m-%d %H:%M"),
        );

        let _ = writeln!(kml, "      <styleUrl>#{}</styleUrl>", style_id_for(type_name));

        kml.push_str("      <Polygon>\n");
        kml.push_str("        <outerBoundaryIs>\n");
        kml.push_str("          <LinearRing>\n");
        kml.push_str("            <coordinates>");
        let ring = geo_ring(detection, transform);
        let coords: Vec<String> = ring
            .iter()
            .map(|[lon, lat]| format!("{lon},{lat},0"))
            .collect();
        kml.push_str(&coords.join(" "));
        kml.push_str("</coordinates>\n");
        kml.push_str("          </LinearRing>\n");
        kml.push_str("        </outerBoundaryIs>\n");
        kml.push_str("      </Polygon>\n");
        kml.push_str("    </Placemark>\n");
    }
}

fn write_style(kml: &mut String, id: &str, color: &str) {
    let _ = writeln!(kml, "    <Style id=\"{id}\">");
    kml.push_str("      <PolyStyle>\n");
    let _ = writeln!(kml, "        <color>{color}</color>");
    kml.push_str("        <fill>1</fill>\n");
    kml.push_str("      </PolyStyle>\n");
    kml.push_str("      <LineStyle>\n");
    kml.push_str("        <color>ff000000</color>\n");
    kml.push_str("        <width>2</width>\n");
    kml.push_str("      </LineStyle>\n");
    kml.push_str("    </Style>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeDetection, ChangeType};
    use crate::detection::{BoundingBox, Severity};

    fn bounds() -> GeoBounds {
        GeoBounds::new(40.0, 39.0, -73.0, -74.0)
    }

    fn detection() -> ChangeDetection {
        ChangeDetection {
            change_type: ChangeType::WaterIncrease,
            confidence: 0.9,
            bbox: BoundingBox::new(0, 0, 10, 10),
            area_hectares: 2.5,
            severity: Severity::Moderate,
            polygon: None,
        }
    }

    #[test]
    fn test_document_structure() {
        let kml = KmlExporter::new(bounds()).export(&[detection()], (100, 100));

        assert!(kml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(kml.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\">"));
        assert!(kml.contains("<name>Change Detection Results</name>"));
        assert!(kml.contains("<name>Water Increase #1</name>"));
        assert!(kml.contains("<styleUrl>#water_increase</styleUrl>"));
        assert!(kml.ends_with("</kml>\n"));
    }

    #[test]
    fn test_styles_present() {
        let kml = KmlExporter::new(bounds()).export::<ChangeDetection>(&[], (10, 10));
        for (id, _) in STYLES {
            assert!(kml.contains(&format!("<Style id=\"{id}\">")), "missing {id}");
        }
        assert!(kml.contains("<Style id=\"default\">"));
    }

    #[test]
    fn test_coordinates_closed_lon_lat_alt() {
        let kml = KmlExporter::new(bounds()).export(&[detection()], (100, 100));

        // bbox corner (0, 0) is the NW corner of the bounds
        assert!(kml.contains("-74,40,0"));
        let coords_start = kml.find("<coordinates>").unwrap() + "<coordinates>".len();
        let coords_end = kml.find("</coordinates>").unwrap();
        let coords: Vec<&str> = kml[coords_start..coords_end].split(' ').collect();
        assert_eq!(coords.first(), coords.last());
    }

    #[test]
    fn test_unknown_type_uses_default_style() {
        let mut d = detection();
        d.change_type = ChangeType::Recovery;
        let kml = KmlExporter::new(bounds()).export(&[d], (100, 100));
        assert!(kml.contains("<styleUrl>#default</styleUrl>"));
    }
}
