//! Keyframe interpolation shared by the scene providers

/// Linear interpolation of a keyframed vec3 at time `t`, clamped at both ends
pub(crate) fn interpolate_vec3(times: &[f32], values: &[[f32; 3]], t: f32) -> Option<[f32; 3]> {
    let (i, factor) = locate(times, values.len(), t)?;
    if factor <= 0.0 || i + 1 >= values.len() {
        return Some(values[i]);
    }

    let v0 = values[i];
    let v1 = values[i + 1];

    Some([
        v0[0] + (v1[0] - v0[0]) * factor,
        v0[1] + (v1[1] - v0[1]) * factor,
        v0[2] + (v1[2] - v0[2]) * factor,
    ])
}

/// Spherical interpolation of a keyframed quaternion at time `t`
pub(crate) fn interpolate_quat(times: &[f32], values: &[[f32; 4]], t: f32) -> Option<[f32; 4]> {
    let (i, factor) = locate(times, values.len(), t)?;
    if factor <= 0.0 || i + 1 >= values.len() {
        return Some(values[i]);
    }

    Some(slerp(values[i], values[i + 1], factor))
}

/// Keyframe index at or before `t` and the blend factor toward the next one
fn locate(times: &[f32], value_count: usize, t: f32) -> Option<(usize, f32)> {
    let count = times.len().min(value_count);
    if count == 0 {
        return None;
    }

    let mut i = 0;
    while i < count - 1 && times[i + 1] <= t {
        i += 1;
    }

    if i >= count - 1 {
        return Some((count - 1, 0.0));
    }

    let t0 = times[i];
    let t1 = times[i + 1];
    let factor = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };

    Some((i, factor.clamp(0.0, 1.0)))
}

fn slerp(q0: [f32; 4], q1: [f32; 4], t: f32) -> [f32; 4] {
    let mut dot = q0[0] * q1[0] + q0[1] * q1[1] + q0[2] * q1[2] + q0[3] * q1[3];

    // Shortest path
    let mut q1 = q1;
    if dot < 0.0 {
        q1 = [-q1[0], -q1[1], -q1[2], -q1[3]];
        dot = -dot;
    }

    if dot > 0.9995 {
        let result = [
            q0[0] + t * (q1[0] - q0[0]),
            q0[1] + t * (q1[1] - q0[1]),
            q0[2] + t * (q1[2] - q0[2]),
            q0[3] + t * (q1[3] - q0[3]),
        ];
        return normalize_quat(result);
    }

    let theta_0 = dot.acos();
    let theta = theta_0 * t;
    let sin_theta = theta.sin();
    let sin_theta_0 = theta_0.sin();

    let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
    let s1 = sin_theta / sin_theta_0;

    [
        s0 * q0[0] + s1 * q1[0],
        s0 * q0[1] + s1 * q1[1],
        s0 * q0[2] + s1 * q1[2],
        s0 * q0[3] + s1 * q1[3],
    ]
}

fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if len > 0.0 {
        [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
    } else {
        [0.0, 0.0, 0.0, 1.0]
    }
}
