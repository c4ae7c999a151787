//! Sphere-surface geometry on top of glam's f64 vector and quaternion types.
//! Functions taking `dir_*` arguments expect unit vectors relative to a sphere center;
//! everything else works on world-space points.

use glam::{DQuat, DVec3};

/// Squared length under which a cross product of unit vectors is rounding noise.
const CROSS_NOISE_SQ: f64 = 1e-20;

/// Squared length under which an orthogonalized axis is considered degenerate.
const AXIS_DEGENERATE_SQ: f64 = 0.001;

/// Squared distance under which a point is treated as sitting on the center.
const CENTER_EPSILON_SQ: f64 = 1e-20;

/// Local "up" of every body before it is aligned to a surface.
pub const BODY_UP: DVec3 = DVec3::Y;

/// Normalize, falling back to +Y for zero-length or non-finite input.
pub fn normalize_or_up(v: DVec3) -> DVec3 {
    let n = v.normalize_or_zero();
    if n == DVec3::ZERO {
        DVec3::Y
    } else {
        n
    }
}

/// Outward unit normal of the sphere at `center` passing through `p`.
/// A point exactly on the center has no direction; +Y is used instead.
pub fn surface_normal(p: DVec3, center: DVec3) -> DVec3 {
    let offset = p - center;
    let len_sq = offset.length_squared();
    if len_sq < CENTER_EPSILON_SQ || !len_sq.is_finite() {
        return DVec3::Y;
    }
    offset / len_sq.sqrt()
}

/// Project `p` onto the surface of the sphere at `center` with `radius`.
pub fn project_to_surface(p: DVec3, center: DVec3, radius: f64) -> DVec3 {
    center + surface_normal(p, center) * radius
}

/// How far `p` sits off the surface (absolute, same units as `radius`).
pub fn surface_error(p: DVec3, center: DVec3, radius: f64) -> f64 {
    ((p - center).length() - radius).abs()
}

/// Find an arbitrary unit vector orthogonal to v.
/// Crosses with whichever of world X / world Y is least aligned with v.
pub fn arbitrary_orthogonal(v: DVec3) -> DVec3 {
    let reference = if v.x.abs() < v.y.abs() {
        DVec3::X
    } else {
        DVec3::Y
    };
    let orth = v.cross(reference).normalize_or_zero();
    if orth == DVec3::ZERO {
        DVec3::Z
    } else {
        orth
    }
}

/// Axis that rotates `a` toward `b`.
/// Parallel and antiparallel inputs still get a valid axis orthogonal to `a`.
pub fn rotation_axis_between(a: DVec3, b: DVec3) -> DVec3 {
    let a = normalize_or_up(a);
    let cross = a.cross(normalize_or_up(b));
    if !(cross.length_squared() >= CROSS_NOISE_SQ) {
        return arbitrary_orthogonal(a);
    }
    // near-antiparallel crosses are mostly noise; strip what leans along `a`
    let axis = cross.normalize();
    let axis = (axis - a * a.dot(axis)).normalize_or_zero();
    if axis.length_squared() < AXIS_DEGENERATE_SQ {
        return arbitrary_orthogonal(a);
    }
    axis
}

/// Angle between two unit vectors (radians).
pub fn angular_distance(a: DVec3, b: DVec3) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Rotate `dir_a` about `axis` by `angle * t`, renormalized.
/// t >= 1 returns `dir_b` itself so the far end never accumulates rotation error.
pub fn slerp_on_sphere(dir_a: DVec3, dir_b: DVec3, axis: DVec3, t: f64, angle: f64) -> DVec3 {
    if t >= 1.0 {
        return normalize_or_up(dir_b);
    }
    let rotated = DQuat::from_axis_angle(axis, angle * t) * dir_a;
    normalize_or_up(rotated)
}

/// Shortest-arc rotation taking `BODY_UP` onto `normal`.
pub fn align_up_to(normal: DVec3) -> DQuat {
    DQuat::from_rotation_arc(BODY_UP, normalize_or_up(normal))
}

/// Rotate a point rigidly about `center`.
pub fn rotate_about(point: DVec3, center: DVec3, rotation: DQuat) -> DVec3 {
    center + rotation * (point - center)
}

/// Uniformly distributed unit vector from two samples in [0, 1).
pub fn unit_from_samples(u: f64, v: f64) -> DVec3 {
    let z = 1.0 - 2.0 * u;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = std::f64::consts::TAU * v;
    DVec3::new(r * phi.cos(), r * phi.sin(), z)
}
