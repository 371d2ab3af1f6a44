// Axis extents for scene layout
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Extent of the finite values, `None` if there are none.
    pub fn of<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Extent>, v| match acc {
                None => Some(Extent { min: v, max: v }),
                Some(e) => Some(Extent {
                    min: e.min.min(v),
                    max: e.max.max(v),
                }),
            })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds3 {
    pub x: Extent,
    pub y: Extent,
    pub z: Extent,
}

impl Bounds3 {
    pub fn from_columns(xs: &[f64], ys: &[f64], zs: &[f64]) -> Option<Self> {
        Some(Self {
            x: Extent::of(xs.iter().copied())?,
            y: Extent::of(ys.iter().copied())?,
            z: Extent::of(zs.iter().copied())?,
        })
    }

    pub fn union(&self, other: &Bounds3) -> Bounds3 {
        Bounds3 {
            x: self.x.union(&other.x),
            y: self.y.union(&other.y),
            z: self.z.union(&other.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_ignores_non_finite() {
        let extent = Extent::of([3.0, f64::NAN, -1.0, f64::INFINITY, 2.0]).unwrap();
        assert_eq!(extent, Extent { min: -1.0, max: 3.0 });
        assert!(Extent::of([f64::NAN]).is_none());
    }

    #[test]
    fn test_extent_new_orders_bounds() {
        assert_eq!(Extent::new(5.0, 1.0), Extent { min: 1.0, max: 5.0 });
    }
}
