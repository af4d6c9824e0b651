use anyhow::{anyhow, Result};
use geojson::{Feature, GeoJson, Value};
use log::*;

use crate::geometry::{self, Bounds, LonLat, Ring};

/// PSGC code of a barangay, kept as the string it arrives as
pub type RegionId = String;

/// Philippine Area of Responsibility outline
pub const PAR_OUTLINE: [[f64; 2]; 7] = [
    [115.0, 5.0],
    [115.0, 15.0],
    [120.0, 21.0],
    [120.0, 25.0],
    [135.0, 25.0],
    [135.0, 5.0],
    [115.0, 5.0],
];

/// Box used to accept storm positions
pub const PAR_BOX: Bounds = Bounds {
    min_lon: 115.0,
    max_lon: 135.0,
    min_lat: 5.0,
    max_lat: 25.0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub psgc: RegionId,
    pub name: String,
    pub geometry: Value,
    pub ring: Ring,
    pub centroid: LonLat,
}

/// Framing targets computed once at load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    /// Every loaded region
    pub default: Bounds,
    /// The area of responsibility
    pub wide: Bounds,
}

impl ViewBounds {
    pub fn compute(regions: &[Region]) -> Self {
        let mut default = Bounds::empty();
        for region in regions {
            geometry::accumulate_bounds(&mut default, &region.geometry);
        }

        let outline = Value::Polygon(vec![PAR_OUTLINE.iter().map(|p| p.to_vec()).collect()]);
        let mut wide = Bounds::empty();
        geometry::accumulate_bounds(&mut wide, &outline);

        Self { default, wide }
    }
}

fn property_text(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn region_from_feature(feature: &Feature) -> Option<Region> {
    let psgc = property_text(feature, "adm4_psgc")?;
    let geometry = feature.geometry.as_ref()?.value.clone();
    let ring = geometry::extract_ring(&geometry);
    if ring.len() < 3 {
        return None;
    }

    let name = property_text(feature, "adm4_en").unwrap_or_else(|| psgc.clone());
    let centroid = geometry::label_point(&ring);

    Some(Region {
        psgc,
        name,
        geometry,
        ring,
        centroid,
    })
}

/// Parse a boundary FeatureCollection. Features without an identifier or a
/// polygonal geometry are skipped.
pub fn load_regions(geojson_text: &str) -> Result<Vec<Region>> {
    let geojson: GeoJson = geojson_text.parse()?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => return Err(anyhow!("boundary document is a bare geometry, expected features")),
    };

    let total = features.len();
    let regions: Vec<Region> = features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let region = region_from_feature(feature);
            if region.is_none() {
                warn!("Skipping boundary feature #{}: missing adm4_psgc or polygon geometry", index);
            }
            region
        })
        .collect();

    info!("Loaded {} of {} boundary features", regions.len(), total);
    Ok(regions)
}

pub fn load_regions_from_file(path: &str) -> Result<Vec<Region>> {
    let text = std::fs::read_to_string(path).map_err(|e| anyhow!("cannot read boundary file {}: {}", path, e))?;
    load_regions(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BARANGAYS: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {
          "type": "Feature",
          "properties": { "adm4_psgc": 1381500001, "adm4_en": "Bagumbayan" },
          "geometry": { "type": "Polygon", "coordinates": [[[121.0, 14.5], [121.02, 14.5], [121.02, 14.52], [121.0, 14.52], [121.0, 14.5]]] }
        },
        {
          "type": "Feature",
          "properties": { "adm4_psgc": "1381500002", "adm4_en": "Bambang" },
          "geometry": { "type": "MultiPolygon", "coordinates": [[[[121.05, 14.55], [121.07, 14.55], [121.07, 14.57], [121.05, 14.55]]], [[[121.1, 14.6], [121.11, 14.6], [121.11, 14.61], [121.1, 14.6]]]] }
        },
        {
          "type": "Feature",
          "properties": { "adm4_en": "No code" },
          "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] }
        },
        {
          "type": "Feature",
          "properties": { "adm4_psgc": "1381500003", "adm4_en": "Label" },
          "geometry": { "type": "Point", "coordinates": [121.0, 14.5] }
        }
      ]
    }"#;

    #[test]
    fn test_load_regions_skips_malformed() {
        let regions = load_regions(TWO_BARANGAYS).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].psgc, "1381500001");
        assert_eq!(regions[0].name, "Bagumbayan");
        assert_eq!(regions[1].psgc, "1381500002");
        assert_eq!(regions[1].ring.len(), 4);
    }

    #[test]
    fn test_region_centroid() {
        let regions = load_regions(TWO_BARANGAYS).unwrap();
        let c = regions[0].centroid;
        assert!((c.lon - 121.01).abs() < 1e-9);
        assert!((c.lat - 14.51).abs() < 1e-9);
    }

    #[test]
    fn test_view_bounds() {
        let regions = load_regions(TWO_BARANGAYS).unwrap();
        let bounds = ViewBounds::compute(&regions);

        assert_eq!(bounds.default.min_lon, 121.0);
        assert_eq!(bounds.default.max_lon, 121.11);
        assert_eq!(bounds.default.min_lat, 14.5);
        assert_eq!(bounds.default.max_lat, 14.61);

        assert_eq!(bounds.wide, Bounds::new(115.0, 135.0, 5.0, 25.0));
    }

    #[test]
    fn test_invalid_document() {
        assert!(load_regions("{").is_err());
        assert!(load_regions(r#"{"type":"Point","coordinates":[1.0,2.0]}"#).is_err());
    }
}
