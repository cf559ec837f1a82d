//! Scenes built for mirrored-surface layers, and the vertex snapshots that
//! carry their animation state through export.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::FssConfig;

/// A 3-component vector.
///
/// Accepts both `[x, y, z]` and the index-keyed object that typed arrays
/// serialize to (`{"0": x, "1": y, "2": z}`); always written as an array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec3Repr", into = "[f64; 3]")]
pub struct Vec3(pub [f64; 3]);

#[derive(Deserialize)]
#[serde(untagged)]
enum Vec3Repr {
    Array([f64; 3]),
    Indexed {
        #[serde(rename = "0")]
        x: f64,
        #[serde(rename = "1")]
        y: f64,
        #[serde(rename = "2")]
        z: f64,
    },
}

impl From<Vec3Repr> for Vec3 {
    fn from(repr: Vec3Repr) -> Self {
        match repr {
            Vec3Repr::Array(xyz) => Vec3(xyz),
            Vec3Repr::Indexed { x, y, z } => Vec3([x, y, z]),
        }
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        v.0
    }
}

/// Point-in-time animation state of one mesh vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub v0: Vec3,
    pub time: f64,
    pub anchor: Vec3,
    pub gradient: f64,
}

/// A mesh vertex. Only the animation fields are typed; whatever else the
/// builder attached is kept in `extra` and forwarded with the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub v0: Vec3,
    pub time: f64,
    pub anchor: Vec3,
    pub gradient: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Vertex {
    pub fn snapshot(&self) -> VertexSnapshot {
        VertexSnapshot {
            v0: self.v0,
            time: self.time,
            anchor: self.anchor,
            gradient: self.gradient,
        }
    }
}

impl From<&VertexSnapshot> for Vertex {
    fn from(s: &VertexSnapshot) -> Self {
        Vertex {
            v0: s.v0,
            time: s.time,
            anchor: s.anchor,
            gradient: s.gradient,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub geometry: Geometry,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scene as produced by the builder.
///
/// Lights, materials, triangles and anything else beyond the vertex
/// animation state live in the `extra` maps, so the scene reaches the host
/// exactly as it was built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scene {
    /// Single-mesh scene whose vertices sit at their snapshot rest positions.
    pub fn from_snapshot(fuzz: &[VertexSnapshot]) -> Self {
        Scene {
            meshes: vec![Mesh {
                geometry: Geometry {
                    vertices: fuzz.iter().map(Vertex::from).collect(),
                    extra: Map::new(),
                },
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }

    /// Snapshot every vertex of the first mesh. `None` if the scene has no mesh.
    pub fn snapshot(&self) -> Option<Vec<VertexSnapshot>> {
        let mesh = self.meshes.first()?;
        Some(mesh.geometry.vertices.iter().map(Vertex::snapshot).collect())
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.first().map_or(0, |m| m.geometry.vertices.len())
    }
}

/// Builds the scene of a mirrored-surface layer from its config and an
/// optional fuzz seed (a previous vertex snapshot to resume from).
pub trait SceneBuilder {
    fn build(&self, config: &FssConfig, fuzz: Option<&[VertexSnapshot]>) -> Option<Scene>;
}

impl<F> SceneBuilder for F
where
    F: Fn(&FssConfig, Option<&[VertexSnapshot]>) -> Option<Scene>,
{
    fn build(&self, config: &FssConfig, fuzz: Option<&[VertexSnapshot]>) -> Option<Scene> {
        self(config, fuzz)
    }
}

/// Restores scenes purely from their fuzz seed. Without a seed there is
/// nothing to restore and no scene is produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotSceneBuilder;

impl SceneBuilder for SnapshotSceneBuilder {
    fn build(&self, _config: &FssConfig, fuzz: Option<&[VertexSnapshot]>) -> Option<Scene> {
        fuzz.map(Scene::from_snapshot)
    }
}
