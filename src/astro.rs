//! Spherical astronomy on top of loaded positions: apparent size, separation
//! and elongation.

use crate::ephemeris::{EphemerisError, EphemerisTable};
use chrono::{DateTime, Duration, Utc};

/// Mean obliquity of the ecliptic at J2000, degrees.
const OBLIQUITY_J2000: f64 = 23.439_291_1;

/// Golden-section refinement stops below this bracket width.
const REFINE_TOLERANCE_SECS: i64 = 60;

/// Angular diameter in arcseconds of a sphere of `radius_km` seen from `distance_km`.
pub(crate) fn angular_diameter_arcsec(radius_km: f64, distance_km: f64) -> f64 {
    ((radius_km / distance_km).asin() * 2.0).to_degrees() * 3600.0
}

/// Great-circle angle between two RA/Dec directions, degrees.
pub(crate) fn separation_deg(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (ra1, dec1, ra2, dec2) = (ra1.to_radians(), dec1.to_radians(), ra2.to_radians(), dec2.to_radians());
    let dra = ra2 - ra1;
    // Vincenty form, stable for both tiny and near-antipodal separations
    let num = ((dec2.cos() * dra.sin()).powi(2)
        + (dec1.cos() * dec2.sin() - dec1.sin() * dec2.cos() * dra.cos()).powi(2))
    .sqrt();
    let den = dec1.sin() * dec2.sin() + dec1.cos() * dec2.cos() * dra.cos();
    num.atan2(den).to_degrees()
}

/// Ecliptic longitude of an equatorial direction, degrees in `[0, 360)`.
pub(crate) fn ecliptic_longitude_deg(ra: f64, dec: f64) -> f64 {
    let (ra, dec, eps) = (ra.to_radians(), dec.to_radians(), OBLIQUITY_J2000.to_radians());
    let y = ra.sin() * eps.cos() + dec.tan() * eps.sin();
    let x = ra.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    East,
    West,
}

impl Direction {
    /// East when `other` lies less than half a turn ahead of `body` in ecliptic longitude.
    pub(crate) fn of(body_lon: f64, other_lon: f64) -> Self {
        if (other_lon - body_lon).rem_euclid(360.0) < 180.0 {
            Direction::East
        } else {
            Direction::West
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

/// Separation between `a` and `b` at `t`, degrees.
pub(crate) fn elongation_at(
    table: &EphemerisTable,
    a: &str,
    b: &str,
    t: DateTime<Utc>,
) -> Result<f64, EphemerisError> {
    let oa = table.observe(a, t)?;
    let ob = table.observe(b, t)?;
    Ok(separation_deg(oa.ra_deg, oa.dec_deg, ob.ra_deg, ob.dec_deg))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Elongation {
    pub(crate) time: DateTime<Utc>,
    pub(crate) degrees: f64,
    pub(crate) direction: Direction,
}

/// Elongation sampled every `step` over `[start, end]`, clipped to the table.
pub(crate) fn elongation_series(
    table: &EphemerisTable,
    a: &str,
    b: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<Vec<(DateTime<Utc>, f64)>, EphemerisError> {
    let end = end.min(table.end());
    let step = step.max(Duration::seconds(1));
    let mut out = Vec::new();
    let mut t = start;
    while t <= end {
        out.push((t, elongation_at(table, a, b, t)?));
        t = match t.checked_add_signed(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(out)
}

fn refine_maximum(
    table: &EphemerisTable,
    a: &str,
    b: &str,
    mut lo: DateTime<Utc>,
    mut hi: DateTime<Utc>,
) -> Result<DateTime<Utc>, EphemerisError> {
    const INV_PHI: f64 = 0.618_033_988_749_895;
    let probe = |lo: DateTime<Utc>, hi: DateTime<Utc>, f: f64| {
        lo + Duration::milliseconds(((hi - lo).num_milliseconds() as f64 * f) as i64)
    };
    while (hi - lo).num_seconds() > REFINE_TOLERANCE_SECS {
        let m1 = probe(lo, hi, 1.0 - INV_PHI);
        let m2 = probe(lo, hi, INV_PHI);
        if elongation_at(table, a, b, m1)? < elongation_at(table, a, b, m2)? {
            lo = m1;
        } else {
            hi = m2;
        }
    }
    Ok(probe(lo, hi, 0.5))
}

/// Greatest elongations of `b` from `a` within `days` of `start`.
///
/// Samples every `step_days`, keeps interior local maxima and refines each to
/// about a minute. The search window is clipped to the end of the table.
pub(crate) fn greatest_elongations(
    table: &EphemerisTable,
    a: &str,
    b: &str,
    start: DateTime<Utc>,
    days: i64,
    step_days: f64,
) -> Result<Vec<Elongation>, EphemerisError> {
    let step = Duration::milliseconds((step_days * 86_400_000.0) as i64);
    let series = elongation_series(table, a, b, start, start + Duration::days(days), step)?;

    let mut found = Vec::new();
    for w in series.windows(3) {
        let (prev, mid, next) = (w[0], w[1], w[2]);
        if mid.1 > prev.1 && mid.1 >= next.1 {
            let time = refine_maximum(table, a, b, prev.0, next.0)?;
            let oa = table.observe(a, time)?;
            let ob = table.observe(b, time)?;
            found.push(Elongation {
                time,
                degrees: separation_deg(oa.ra_deg, oa.dec_deg, ob.ra_deg, ob.dec_deg),
                direction: Direction::of(
                    ecliptic_longitude_deg(oa.ra_deg, oa.dec_deg),
                    ecliptic_longitude_deg(ob.ra_deg, ob.dec_deg),
                ),
            });
        }
    }
    Ok(found)
}
