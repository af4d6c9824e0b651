use geojson::Value;
use serde::{Deserialize, Serialize};

/// A `[lon, lat]` vertex list; the closing vertex is kept as it comes from the source
pub type Ring = Vec<[f64; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// An inverted box that any `extend` call will replace
    pub fn empty() -> Self {
        Self::new(f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY)
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn contains(&self, point: LonLat) -> bool {
        point.lon >= self.min_lon && point.lon <= self.max_lon && point.lat >= self.min_lat && point.lat <= self.max_lat
    }

    pub fn center(&self) -> LonLat {
        LonLat::new((self.min_lon + self.max_lon) / 2.0, (self.min_lat + self.max_lat) / 2.0)
    }
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| [p[0], p[1]])
        .collect()
}

/// Outer ring of a Polygon, or of the first polygon of a MultiPolygon.
/// Any other geometry yields an empty ring.
pub fn extract_ring(geometry: &Value) -> Ring {
    match geometry {
        Value::Polygon(rings) => rings.first().map(|r| ring_from_positions(r)).unwrap_or_default(),
        Value::MultiPolygon(polygons) => polygons
            .first()
            .and_then(|rings| rings.first())
            .map(|r| ring_from_positions(r))
            .unwrap_or_default(),
        _ => Ring::new(),
    }
}

/// Arithmetic mean of the ring's vertices, not counting a closing vertex
/// that repeats the first one
pub fn centroid_average(ring: &[[f64; 2]]) -> LonLat {
    let open = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    if open.is_empty() {
        return LonLat::new(0.0, 0.0);
    }
    let (lon_sum, lat_sum) = open
        .iter()
        .fold((0.0, 0.0), |(lon, lat), p| (lon + p[0], lat + p[1]));
    let n = open.len() as f64;
    LonLat::new(lon_sum / n, lat_sum / n)
}

/// Area-weighted (shoelace) centroid.
///
/// Falls back to the bounding-box midpoint when the polygon is degenerate
/// or the computed point lands outside the ring.
pub fn centroid_signed(ring: &[[f64; 2]]) -> LonLat {
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for i in 0..ring.len() {
        let [x0, y0] = ring[i];
        let [x1, y1] = ring[(i + 1) % ring.len()];
        let cross = x0 * y1 - x1 * y0;
        area2 += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }

    if area2.abs() > f64::EPSILON {
        let candidate = LonLat::new(cx / (3.0 * area2), cy / (3.0 * area2));
        if point_in_polygon(candidate, ring) {
            return candidate;
        }
    }

    ring_bounds(ring).center()
}

/// Even-odd ray casting
pub fn point_in_polygon(point: LonLat, ring: &[[f64; 2]]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > point.lat) != (yj > point.lat)
            && point.lon < (xj - xi) * (point.lat - yi) / (yj - yi) + xi
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Label point for a region: the plain average, or the signed centroid when
/// the average falls outside a concave ring.
pub fn label_point(ring: &[[f64; 2]]) -> LonLat {
    let average = centroid_average(ring);
    if point_in_polygon(average, ring) {
        average
    } else {
        centroid_signed(ring)
    }
}

pub fn ring_bounds(ring: &[[f64; 2]]) -> Bounds {
    let mut bounds = Bounds::empty();
    for p in ring {
        bounds.extend(p[0], p[1]);
    }
    bounds
}

/// Extend `bounds` with a feature's vertices: the outer ring of a Polygon,
/// every ring of every polygon of a MultiPolygon.
pub fn accumulate_bounds(bounds: &mut Bounds, geometry: &Value) {
    match geometry {
        Value::Polygon(rings) => {
            if let Some(outer) = rings.first() {
                for p in outer.iter().filter(|p| p.len() >= 2) {
                    bounds.extend(p[0], p[1]);
                }
            }
        }
        Value::MultiPolygon(polygons) => {
            for p in polygons.iter().flatten().flatten().filter(|p| p.len() >= 2) {
                bounds.extend(p[0], p[1]);
            }
        }
        _ => {}
    }
}
