// Named color palettes shared by the 3D scene and the waterfall image
use crate::domain::error::ConfigError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Viridis,
    Plasma,
    RdBu,
    Spectral,
    Coolwarm,
    Seismic,
    Berlin,
}

impl Palette {
    pub const ALL: [Palette; 7] = [
        Palette::Viridis,
        Palette::Plasma,
        Palette::RdBu,
        Palette::Spectral,
        Palette::Coolwarm,
        Palette::Seismic,
        Palette::Berlin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Palette::Viridis => "Viridis",
            Palette::Plasma => "Plasma",
            Palette::RdBu => "RdBu",
            Palette::Spectral => "Spectral",
            Palette::Coolwarm => "Coolwarm",
            Palette::Seismic => "Seismic",
            Palette::Berlin => "Berlin",
        }
    }

    fn hex_stops(&self) -> &'static [u32] {
        match self {
            Palette::Viridis => &[
                0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58, 0xb5de2b,
                0xfde725,
            ],
            Palette::Plasma => &[
                0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a, 0xfdca26,
                0xf0f921,
            ],
            Palette::RdBu => &[
                0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3,
                0x2166ac, 0x053061,
            ],
            Palette::Spectral => &[
                0x9e0142, 0xd53e4f, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xe6f598, 0xabdda4, 0x66c2a5,
                0x3288bd, 0x5e4fa2,
            ],
            Palette::Coolwarm => &[
                0x3b4cc0, 0x688aef, 0x9abbff, 0xc9d7f0, 0xedd1c2, 0xf7a889, 0xe26952, 0xb40426,
            ],
            Palette::Seismic => &[0x00004c, 0x0000ff, 0xffffff, 0xff0000, 0x7f0000],
            Palette::Berlin => &[
                0x9eb0ff, 0x5aa2dd, 0x2a6c8e, 0x11303f, 0x1a0c06, 0x4f1603, 0x8e3b26, 0xcf7b6f, 0xffadad,
            ],
        }
    }
}

/// A palette, optionally reversed (`_r` suffix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colorscale {
    pub palette: Palette,
    pub reversed: bool,
}

impl Colorscale {
    pub const fn new(palette: Palette, reversed: bool) -> Self {
        Self { palette, reversed }
    }

    /// Names offered by the colorscale selector.
    pub fn names() -> Vec<String> {
        let mut names: Vec<String> = Palette::ALL.iter().map(|p| p.name().to_string()).collect();
        names.insert(3, "RdBu_r".to_string());
        names
    }

    /// Evenly spaced stops in [0, 1].
    pub fn stops(&self) -> Vec<(f64, [u8; 3])> {
        let hex = self.palette.hex_stops();
        let last = (hex.len() - 1) as f64;
        let colors: Box<dyn Iterator<Item = &u32>> = if self.reversed {
            Box::new(hex.iter().rev())
        } else {
            Box::new(hex.iter())
        };
        colors
            .enumerate()
            .map(|(i, rgb)| (i as f64 / last, split_rgb(*rgb)))
            .collect()
    }

    /// Stops in the `[[position, "rgb(r,g,b)"], ...]` form Plotly accepts.
    pub fn plotly_stops(&self) -> Vec<(f64, String)> {
        self.stops()
            .into_iter()
            .map(|(pos, [r, g, b])| (pos, format!("rgb({r},{g},{b})")))
            .collect()
    }

    /// Color at `t` in [0, 1], linearly interpolated between stops.
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let upper = stops.partition_point(|(pos, _)| *pos < t).clamp(1, stops.len() - 1);
        let (p0, c0) = stops[upper - 1];
        let (p1, c1) = stops[upper];
        let frac = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])]
    }
}

impl FromStr for Colorscale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (base, reversed) = match trimmed.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (trimmed, false),
        };
        Palette::ALL
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(base))
            .map(|p| Colorscale::new(*p, reversed))
            .ok_or_else(|| ConfigError::UnknownColorscale(s.to_string()))
    }
}

impl fmt::Display for Colorscale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.palette.name(), if self.reversed { "_r" } else { "" })
    }
}

fn split_rgb(rgb: u32) -> [u8; 3] {
    [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]
}
