//! Local projected coordinate frame for parcel-scale measurements
//!
//! Storage geometry arrives in WGS84 degrees, where linear distance is
//! latitude-dependent and useless for setback arithmetic. Each parcel gets
//! its own azimuthal-equidistant frame centered on the parcel centroid,
//! projecting to international feet. Over parcel-scale extents (a few
//! hundred feet) the distortion of the spherical projection is far below
//! 0.1%, so downstream stages can treat coordinates as plain Euclidean
//! feet.
//!
//! The frame is a value: two center coordinates and a fixed projection
//! identifier. Projecting is idempotent and side-effect-free.

use geo::Centroid;
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::core::error::{BacklotError, Result};
use crate::core::units::EARTH_RADIUS_FT;
use crate::spatial::repair;

/// Identifier recorded alongside projected output
pub const PROJECTION_ID: &str = "aeqd-sphere-ft";

/// A local azimuthal-equidistant frame centered on one parcel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalFrame {
    /// Center longitude, degrees
    pub center_lon: f64,
    /// Center latitude, degrees
    pub center_lat: f64,
}

impl LocalFrame {
    /// Build a frame centered on the polygon's centroid
    ///
    /// Fails with `InvalidGeometry` if the polygon is empty, degenerate,
    /// or has coordinates outside the valid WGS84 range.
    pub fn for_polygon(polygon: &Polygon<f64>) -> Result<Self> {
        validate_wgs84(polygon)?;
        let repaired = repair::repair(polygon)?;
        let centroid = repaired.centroid().ok_or_else(|| {
            BacklotError::InvalidGeometry("polygon has no centroid".into())
        })?;
        Ok(Self {
            center_lon: centroid.x(),
            center_lat: centroid.y(),
        })
    }

    /// Project one WGS84 coordinate (degrees) to local feet
    pub fn forward(&self, coord: Coord<f64>) -> Coord<f64> {
        let lam0 = self.center_lon.to_radians();
        let phi0 = self.center_lat.to_radians();
        let lam = coord.x.to_radians();
        let phi = coord.y.to_radians();

        let dlam = lam - lam0;
        let cos_c = phi0.sin() * phi.sin() + phi0.cos() * phi.cos() * dlam.cos();
        let c = cos_c.clamp(-1.0, 1.0).acos();

        // At the tangent point k -> 1 in the limit
        let k = if c.abs() < 1e-12 { 1.0 } else { c / c.sin() };

        Coord {
            x: EARTH_RADIUS_FT * k * phi.cos() * dlam.sin(),
            y: EARTH_RADIUS_FT
                * k
                * (phi0.cos() * phi.sin() - phi0.sin() * phi.cos() * dlam.cos()),
        }
    }

    /// Invert a local-feet coordinate back to WGS84 degrees
    pub fn inverse(&self, coord: Coord<f64>) -> Coord<f64> {
        let rho = (coord.x * coord.x + coord.y * coord.y).sqrt();
        if rho < 1e-12 {
            return Coord {
                x: self.center_lon,
                y: self.center_lat,
            };
        }

        let phi0 = self.center_lat.to_radians();
        let c = rho / EARTH_RADIUS_FT;
        let (sin_c, cos_c) = c.sin_cos();

        let phi = (cos_c * phi0.sin() + coord.y * sin_c * phi0.cos() / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lam = self.center_lon.to_radians()
            + (coord.x * sin_c).atan2(rho * phi0.cos() * cos_c - coord.y * phi0.sin() * sin_c);

        Coord {
            x: lam.to_degrees(),
            y: phi.to_degrees(),
        }
    }

    /// Project a WGS84 polygon into the local frame
    ///
    /// The input is validated and repaired first; downstream stages may
    /// assume the result is boolean-op safe.
    pub fn project(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        validate_wgs84(polygon)?;
        let repaired = repair::repair(polygon)?;
        Ok(map_polygon(&repaired, |c| self.forward(c)))
    }

    /// Convert a local polygon back to WGS84 degrees
    pub fn unproject(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        map_polygon(polygon, |c| self.inverse(c))
    }

    /// Convert a local MultiPolygon back to WGS84 degrees
    pub fn unproject_multi(&self, multi: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon(multi.0.iter().map(|p| self.unproject(p)).collect())
    }
}

fn map_polygon<F>(polygon: &Polygon<f64>, f: F) -> Polygon<f64>
where
    F: Fn(Coord<f64>) -> Coord<f64> + Copy,
{
    let map_ring = |ring: &LineString<f64>| -> LineString<f64> {
        LineString(ring.0.iter().map(|&c| f(c)).collect())
    };
    Polygon::new(
        map_ring(polygon.exterior()),
        polygon.interiors().iter().map(map_ring).collect(),
    )
}

fn validate_wgs84(polygon: &Polygon<f64>) -> Result<()> {
    if polygon.exterior().0.is_empty() {
        return Err(BacklotError::InvalidGeometry("empty polygon".into()));
    }
    for coord in polygon.exterior().0.iter().chain(
        polygon
            .interiors()
            .iter()
            .flat_map(|ring| ring.0.iter()),
    ) {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(BacklotError::InvalidGeometry(
                "non-finite coordinate".into(),
            ));
        }
        if coord.x < -180.0 || coord.x > 180.0 || coord.y < -90.0 || coord.y > 90.0 {
            return Err(BacklotError::InvalidGeometry(format!(
                "coordinate ({}, {}) outside WGS84 range",
                coord.x, coord.y
            )));
        }
    }
    Ok(())
}
