//! Tokyo datum (EPSG:4301) to WGS84 (EPSG:4326) conversion.
//!
//! Uses the EPSG "Tokyo to WGS 84 (108)" geocentric translation (EPSG:15484, area of use Japan):
//! geographic coordinates on the Bessel 1841 ellipsoid are lifted to earth-centred cartesian
//! coordinates, shifted by a fixed translation and projected back onto the WGS84 ellipsoid.

#[derive(Copy, Clone, Debug)]
pub struct Ellipsoid {
    /// Semi-major axis in metres
    pub semi_major_axis: f64,
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const BESSEL_1841: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_377_397.155,
        inverse_flattening: 299.152_812_8,
    };

    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_223_563,
    };

    /// First eccentricity squared
    fn eccentricity_squared(&self) -> f64 {
        let f = 1.0 / self.inverse_flattening;
        f * (2.0 - f)
    }

    /// Radius of curvature in the prime vertical
    fn prime_vertical_radius(&self, sin_lat: f64) -> f64 {
        self.semi_major_axis / (1.0 - self.eccentricity_squared() * sin_lat * sin_lat).sqrt()
    }
}

/// Translation in metres (dX, dY, dZ) from Tokyo to WGS84
pub const TOKYO_TO_WGS84_TRANSLATION: [f64; 3] = [-146.414, 507.337, 680.507];

const MAX_ITERATIONS: usize = 10;
const LATITUDE_EPSILON: f64 = 1e-14;

/// Converts a Tokyo datum `(longitude, latitude)` pair in degrees to a WGS84
/// `(latitude, longitude)` pair in degrees. Heights are taken as zero.
///
/// Note the swapped order of the output, the station records store latitude first.
pub fn tokyo_to_wgs84(longitude: f64, latitude: f64) -> (f64, f64) {
    let [x, y, z] = geodetic_to_geocentric(latitude, longitude, &Ellipsoid::BESSEL_1841);
    let [dx, dy, dz] = TOKYO_TO_WGS84_TRANSLATION;

    geocentric_to_geodetic(x + dx, y + dy, z + dz, &Ellipsoid::WGS84)
}

fn geodetic_to_geocentric(latitude: f64, longitude: f64, ellipsoid: &Ellipsoid) -> [f64; 3] {
    let (sin_lat, cos_lat) = latitude.to_radians().sin_cos();
    let (sin_lon, cos_lon) = longitude.to_radians().sin_cos();
    let n = ellipsoid.prime_vertical_radius(sin_lat);

    [
        n * cos_lat * cos_lon,
        n * cos_lat * sin_lon,
        n * (1.0 - ellipsoid.eccentricity_squared()) * sin_lat,
    ]
}

/// Returns (latitude, longitude) in degrees. The height is iterated on but dropped.
fn geocentric_to_geodetic(x: f64, y: f64, z: f64, ellipsoid: &Ellipsoid) -> (f64, f64) {
    let e2 = ellipsoid.eccentricity_squared();
    let longitude = y.atan2(x);
    let p = x.hypot(y);

    let mut latitude = z.atan2(p * (1.0 - e2));
    for _ in 0..MAX_ITERATIONS {
        let n = ellipsoid.prime_vertical_radius(latitude.sin());
        let height = p / latitude.cos() - n;
        let next = z.atan2(p * (1.0 - e2 * n / (n + height)));
        let delta = (next - latitude).abs();
        latitude = next;
        if delta < LATITUDE_EPSILON {
            break;
        }
    }

    (latitude.to_degrees(), longitude.to_degrees())
}
