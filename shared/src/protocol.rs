use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId};
use crate::path::Path;
use crate::sphere::{Sphere, SphereId};

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Full world state for visualisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub protocol_version: u32,
    pub tick: u64,
    pub spheres: Vec<SphereWire>,
    pub bodies: Vec<BodyWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SphereWire {
    pub id: u32,
    pub center: [f64; 3],
    pub radius: f64,
    /// x, y, z, w
    pub orientation: [f64; 4],
    #[serde(default)]
    pub dragging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyWire {
    pub id: u32,
    pub sphere: Option<u32>,
    pub pos: [f64; 3],
    pub orientation: [f64; 4],
    #[serde(default)]
    pub moving: bool,
    #[serde(default)]
    pub sleeping: bool,
}

/// Planned route, sent once when navigation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathWire {
    pub body: u32,
    pub points: Vec<[f64; 3]>,
}

// === Conversion helpers ===

/// Round to 4 decimal places (sufficient for unit vectors, saves ~50% JSON size)
#[inline]
pub fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}

pub fn vec_to_wire(v: DVec3) -> [f64; 3] {
    [round4(v.x), round4(v.y), round4(v.z)]
}

pub fn quat_to_wire(q: DQuat) -> [f64; 4] {
    [round4(q.x), round4(q.y), round4(q.z), round4(q.w)]
}

impl SphereWire {
    pub fn from_sphere(sphere: &Sphere, dragging: bool) -> Self {
        Self {
            id: sphere.id.0,
            center: vec_to_wire(sphere.center),
            radius: round4(sphere.radius()),
            orientation: quat_to_wire(sphere.orientation),
            dragging,
        }
    }
}

impl BodyWire {
    pub fn from_body(body: &Body, moving: bool) -> Self {
        Self {
            id: body.id.0,
            sphere: body.owner.map(|SphereId(id)| id),
            pos: vec_to_wire(body.position),
            orientation: quat_to_wire(body.orientation),
            moving,
            sleeping: body.sleeping,
        }
    }
}

impl PathWire {
    pub fn from_path(body: BodyId, path: &Path) -> Self {
        Self {
            body: body.0,
            points: path.points().iter().map(|p| vec_to_wire(*p)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyKind;

    #[test]
    fn round4_truncates_noise() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(-2.00004), -2.0);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let sphere = Sphere::new(SphereId(3), DVec3::new(1.0, 2.0, 3.0), 15.0, 9.81).unwrap();
        let mut body = Body::new(BodyId(9), DVec3::new(0.1234567, 15.0, 0.0), BodyKind::Dynamic);
        body.owner = Some(sphere.id);

        let snapshot = WorldSnapshot {
            protocol_version: PROTOCOL_VERSION,
            tick: 120,
            spheres: vec![SphereWire::from_sphere(&sphere, true)],
            bodies: vec![BodyWire::from_body(&body, false)],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"protocolVersion\":1"));
        assert!(json.contains("\"pos\":[0.1235,15.0,0.0]"));
        assert!(json.contains("\"orientation\":[0.0,0.0,0.0,1.0]"));

        let parsed: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tick, 120);
        assert!(parsed.spheres[0].dragging);
        assert_eq!(parsed.bodies[0].sphere, Some(3));
    }

    #[test]
    fn body_wire_defaults_missing_flags() {
        let parsed: BodyWire = serde_json::from_str(
            r#"{"id":1,"sphere":null,"pos":[0,1,0],"orientation":[0,0,0,1]}"#,
        )
        .unwrap();
        assert!(!parsed.moving);
        assert!(!parsed.sleeping);
        assert_eq!(parsed.sphere, None);
    }

    #[test]
    fn path_wire_keeps_point_order() {
        let path = Path::from(vec![DVec3::X, DVec3::Y, DVec3::Z]);
        let wire = PathWire::from_path(BodyId(4), &path);
        assert_eq!(wire.body, 4);
        assert_eq!(wire.points, vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
    }
}
