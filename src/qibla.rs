use crate::models::{CompassOctant, GeoCoordinate, QiblaDirection, KAABA_LATITUDE, KAABA_LONGITUDE};

const DEG: f64 = std::f64::consts::PI / 180.0;
const RAD: f64 = 180.0 / std::f64::consts::PI;

/// Great-circle initial bearing from the observer toward the Kaaba,
/// normalized to [0, 360) with its compass octant.
///
/// An observer standing exactly at the Kaaba is a zero-distance degenerate
/// case: `atan2(0, 0)` is 0, so the bearing reads as due north.
pub fn qibla_direction(coordinate: &GeoCoordinate) -> QiblaDirection {
    let lat = coordinate.latitude * DEG;
    let kaaba_lat = KAABA_LATITUDE * DEG;
    let d_lon = (KAABA_LONGITUDE - coordinate.longitude) * DEG;

    let x = d_lon.sin() * kaaba_lat.cos();
    let y = lat.cos() * kaaba_lat.sin() - lat.sin() * kaaba_lat.cos() * d_lon.cos();

    let degrees = (x.atan2(y) * RAD).rem_euclid(360.0);
    QiblaDirection {
        degrees,
        compass: octant(degrees),
    }
}

/// 45-degree compass bands, the north band spanning [337.5, 22.5).
fn octant(degrees: f64) -> CompassOctant {
    const ROSE: [CompassOctant; 8] = [
        CompassOctant::N,
        CompassOctant::NE,
        CompassOctant::E,
        CompassOctant::SE,
        CompassOctant::S,
        CompassOctant::SW,
        CompassOctant::W,
        CompassOctant::NW,
    ];
    let band = ((degrees + 22.5).rem_euclid(360.0) / 45.0) as usize;
    ROSE[band.min(7)]
}
