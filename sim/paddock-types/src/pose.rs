//! Pose and velocity types.
//!
//! A [`Pose`] is a planar position plus a height and a heading. Poses double
//! as coordinate frames: [`Pose::compose`] expresses a pose given in this
//! frame in world terms, and [`Pose::to_local`] inverts that.

use nalgebra::{Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Normalizes an angle into the interval (-pi, pi].
///
/// # Example
///
/// ```
/// use paddock_types::normalize_angle;
/// use std::f64::consts::PI;
///
/// assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
/// assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
/// assert!((normalize_angle(0.25) - 0.25).abs() < 1e-12);
/// ```
#[must_use]
pub fn normalize_angle(a: f64) -> f64 {
    let r = a.rem_euclid(std::f64::consts::TAU);
    if r > std::f64::consts::PI {
        r - std::f64::consts::TAU
    } else {
        r
    }
}

/// Position and orientation of a model: planar position, height, heading.
///
/// Headings are radians. All engine operations keep headings normalized to
/// (-pi, pi]; poses built by hand can be normalized with
/// [`Pose::normalized`].
///
/// # Example
///
/// ```
/// use paddock_types::Pose;
/// use std::f64::consts::FRAC_PI_2;
///
/// let frame = Pose::new(1.0, 0.0, 0.0, FRAC_PI_2);
/// let local = Pose::new(1.0, 0.0, 0.0, 0.0);
///
/// // Composition places `local` (expressed in `frame`) into the world.
/// let global = frame.compose(&local);
/// assert!((global.y - 1.0).abs() < 1e-12);
///
/// // `to_local` inverts the composition.
/// let back = frame.to_local(&global);
/// assert!((back.x - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// X position in meters.
    pub x: f64,
    /// Y position in meters.
    pub y: f64,
    /// Height in meters.
    pub z: f64,
    /// Heading in radians.
    pub a: f64,
}

impl Pose {
    /// Create a pose from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, a: f64) -> Self {
        Self { x, y, z, a }
    }

    /// The identity pose (origin, zero heading).
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Create a pose at a planar position with zero height and heading.
    #[must_use]
    pub fn from_xy(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    /// Create a pose that is a pure rotation.
    #[must_use]
    pub fn from_heading(a: f64) -> Self {
        Self::new(0.0, 0.0, 0.0, a)
    }

    /// The planar position of this pose.
    #[must_use]
    pub fn xy(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Returns this pose with the heading normalized to (-pi, pi].
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            a: normalize_angle(self.a),
            ..*self
        }
    }

    /// Compose `other`, expressed in this pose's frame, into the parent
    /// frame of `self`.
    ///
    /// The planar part rotates by this pose's heading; heights add; the
    /// resulting heading is normalized.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        let (sin, cos) = self.a.sin_cos();
        Self {
            x: self.x + other.x * cos - other.y * sin,
            y: self.y + other.x * sin + other.y * cos,
            z: self.z + other.z,
            a: normalize_angle(self.a + other.a),
        }
    }

    /// Express `global`, given in this pose's parent frame, in this pose's
    /// own frame. Inverse of [`Pose::compose`].
    #[must_use]
    pub fn to_local(&self, global: &Self) -> Self {
        let (sin, cos) = self.a.sin_cos();
        let dx = global.x - self.x;
        let dy = global.y - self.y;
        Self {
            x: dx * cos + dy * sin,
            y: -dx * sin + dy * cos,
            z: global.z - self.z,
            a: normalize_angle(global.a - self.a),
        }
    }

    /// Transform a planar point from this pose's frame to its parent frame.
    #[must_use]
    pub fn transform_point(&self, local: &Point2<f64>) -> Point2<f64> {
        let (sin, cos) = self.a.sin_cos();
        Point2::new(
            self.x + local.x * cos - local.y * sin,
            self.y + local.x * sin + local.y * cos,
        )
    }

    /// Rotate a planar vector from this pose's frame to its parent frame.
    #[must_use]
    pub fn transform_vector(&self, local: &Vector2<f64>) -> Vector2<f64> {
        let (sin, cos) = self.a.sin_cos();
        Vector2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
    }

    /// Check that every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.a.is_finite()
    }
}

/// Body-frame velocity of a model.
///
/// Linear components are meters per second along the model's own axes; `a`
/// is the angular rate in radians per second.
///
/// # Example
///
/// ```
/// use paddock_types::Velocity;
///
/// let v = Velocity::linear(0.5, 0.0);
/// assert!(!v.is_zero());
/// assert!(Velocity::zero().is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Velocity {
    /// Forward velocity (m/s).
    pub x: f64,
    /// Lateral velocity (m/s).
    pub y: f64,
    /// Vertical velocity (m/s).
    pub z: f64,
    /// Angular velocity (rad/s).
    pub a: f64,
}

impl Velocity {
    /// Create a velocity from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, a: f64) -> Self {
        Self { x, y, z, a }
    }

    /// A velocity at rest.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// A planar linear velocity with no rotation.
    #[must_use]
    pub fn linear(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    /// A pure angular velocity.
    #[must_use]
    pub fn angular(a: f64) -> Self {
        Self::new(0.0, 0.0, 0.0, a)
    }

    /// True when every component is exactly zero.
    ///
    /// This is the predicate that decides membership on the world's
    /// velocity list, so it is an exact comparison on purpose.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0 && self.a == 0.0
    }

    /// Check that every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.a.is_finite()
    }

    /// The pose change this velocity produces over `dt` seconds.
    #[must_use]
    pub fn integrate(&self, dt: f64) -> Pose {
        Pose::new(self.x * dt, self.y * dt, self.z * dt, self.a * dt)
    }
}
