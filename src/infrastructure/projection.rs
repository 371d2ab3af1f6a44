// Geographic to planar projection for the survey reference point
use serde::Deserialize;
use std::f64::consts::FRAC_PI_4;

/// US survey feet per meter
pub const US_SURVEY_FEET_PER_METER: f64 = 3937.0 / 1200.0;

pub trait Projection: Send + Sync {
    /// Longitude and latitude in degrees to easting and northing
    fn project(&self, lon: f64, lat: f64) -> (f64, f64);
}

/// Lambert Conformal Conic parameters, angles in decimal degrees.
///
/// Defaults describe NAD27 Texas Central in US survey feet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    pub semi_major: f64,
    pub semi_minor: f64,
    pub lat_1: f64,
    pub lat_2: f64,
    pub lat_0: f64,
    pub lon_0: f64,
    pub false_easting_m: f64,
    pub false_northing_m: f64,
    pub units_per_meter: f64,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            // Clarke 1866
            semi_major: 6_378_206.4,
            semi_minor: 6_356_583.8,
            lat_1: 31.0 + 53.0 / 60.0,
            lat_2: 30.0 + 7.0 / 60.0,
            lat_0: 29.0 + 40.0 / 60.0,
            lon_0: -(100.0 + 20.0 / 60.0),
            false_easting_m: 609_601.2192,
            false_northing_m: 0.0,
            units_per_meter: US_SURVEY_FEET_PER_METER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LambertConformalConic {
    params: ProjectionParams,
    e: f64,
    n: f64,
    f: f64,
    rho_0: f64,
}

impl LambertConformalConic {
    pub fn new(params: ProjectionParams) -> Self {
        let a = params.semi_major;
        let e = (1.0 - (params.semi_minor / a).powi(2)).sqrt();
        let (phi_1, phi_2) = (params.lat_1.to_radians(), params.lat_2.to_radians());

        let (m1, m2) = (m(phi_1, e), m(phi_2, e));
        let (t1, t2) = (t(phi_1, e), t(phi_2, e));
        // equal parallels collapse to the one-parallel cone
        let n = if (phi_1 - phi_2).abs() < 1e-12 {
            phi_1.sin()
        } else {
            (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
        };
        let f = m1 / (n * t1.powf(n));
        let rho_0 = a * f * t(params.lat_0.to_radians(), e).powf(n);

        Self { params, e, n, f, rho_0 }
    }
}

impl Projection for LambertConformalConic {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let p = &self.params;
        let rho = p.semi_major * self.f * t(lat.to_radians(), self.e).powf(self.n);
        let theta = self.n * (lon - p.lon_0).to_radians();
        let easting = p.false_easting_m + rho * theta.sin();
        let northing = p.false_northing_m + self.rho_0 - rho * theta.cos();
        (easting * p.units_per_meter, northing * p.units_per_meter)
    }
}

fn m(phi: f64, e: f64) -> f64 {
    phi.cos() / (1.0 - (e * phi.sin()).powi(2)).sqrt()
}

fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}
