use glam::{Quat, Vec3};
use std::f32::consts::PI;

/// Rotation around the up axis (+Y). Positive angles turn +Z towards +X, i.e. to the left when
/// looking down +Z.
#[inline]
pub fn yaw_rotation(yaw_radians: f32) -> Quat {
    Quat::from_rotation_y(yaw_radians)
}

/// Yaw of the forward (+Z) axis after applying `rotation`, in radians.
#[inline]
pub fn heading_of(rotation: Quat) -> f32 {
    let forward = rotation * Vec3::Z;
    forward.x.atan2(forward.z)
}

/// Wraps an angle into (-PI, PI].
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = angle % (2.0 * PI);
    if wrapped <= -PI {
        wrapped += 2.0 * PI;
    } else if wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    wrapped
}

/// The rotation a node ends up with when its parent space is mirrored on the X axis
/// (i.e. scaled by (-1, 1, 1)).
#[inline]
pub fn mirror_rotation_x(rotation: Quat) -> Quat {
    Quat::from_xyzw(rotation.x, -rotation.y, -rotation.z, rotation.w)
}

/// Samples the XZ midline between `start` and `end` every `spacing` units.
///
/// The curve is reconstructed as a circular arc from the chord length and the signed heading change
/// `turn` (radians, positive = left), starting with heading `start_heading`. For an (almost) zero
/// turn this degenerates into the straight line. The end point is always part of the result, Y is
/// interpolated linearly.
pub fn sample_arc_xz(start: Vec3, start_heading: f32, end: Vec3, turn: f32, spacing: f32) -> Vec<Vec3> {
    let chord = Vec3::new(end.x - start.x, 0.0, end.z - start.z).length();
    if chord <= f32::EPSILON {
        return vec![start];
    }

    let spacing = spacing.max(0.01);
    let arc_length = if turn.abs() < 1.0e-4 {
        chord
    } else {
        let radius = chord / (2.0 * (turn.abs() * 0.5).sin());
        radius * turn.abs()
    };

    let steps = (arc_length / spacing).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 1);

    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let point = if turn.abs() < 1.0e-4 {
            start.lerp(end, t)
        } else {
            let curvature = turn / arc_length;
            let s = arc_length * t;
            let heading = start_heading + curvature * s;
            let x = (start_heading.cos() - heading.cos()) / curvature;
            let z = (heading.sin() - start_heading.sin()) / curvature;
            Vec3::new(start.x + x, start.y + (end.y - start.y) * t, start.z + z)
        };
        points.push(point);
    }

    // Floating point drift along the arc, the end has to match the socket exactly.
    if let Some(last) = points.last_mut() {
        *last = end;
    }

    points
}
