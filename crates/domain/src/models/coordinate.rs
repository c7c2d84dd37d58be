//! Geographic coordinate and bounding-box helpers.

use geo::{BoundingRect, Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

/// A WGS84 point expressed as latitude/longitude degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the `[lng, lat]` position used by GeoJSON.
    pub fn to_position(self) -> Vec<f64> {
        vec![self.longitude, self.latitude]
    }

    /// Parses a GeoJSON `[lng, lat, ...]` position.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Coord {
            x: c.longitude,
            y: c.latitude,
        }
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(c: Coord<f64>) -> Self {
        Self::new(c.y, c.x)
    }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl Bounds {
    /// Smallest bounds containing every vertex. `None` for an empty slice.
    pub fn from_vertices(vertices: &[Coordinate]) -> Option<Self> {
        bounding_rect(vertices).map(|rect| Self {
            south_west: rect.min().into(),
            north_east: rect.max().into(),
        })
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
        )
    }
}

fn bounding_rect(vertices: &[Coordinate]) -> Option<Rect<f64>> {
    let line: LineString<f64> = vertices.iter().map(|v| Coord::from(*v)).collect();
    line.bounding_rect()
}

/// Center of the smallest axis-aligned rectangle containing all vertices.
pub fn bounding_box_center(vertices: &[Coordinate]) -> Option<Coordinate> {
    bounding_rect(vertices).map(|rect| rect.center().into())
}
