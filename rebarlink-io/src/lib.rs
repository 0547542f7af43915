use std::fs;
use std::path::{Path, PathBuf};

use rebarlink_core::attribute::{AttributeId, AttributeKind, AttributeRecord};
use rebarlink_core::document::{
    BarPlacement, BarShape, Drawing, DrawingElement, ElementId, ElementType,
};
use rebarlink_core::geometry::{Placement, Point3, Vector3};
use rebarlink_core::solid::{Face, Solid};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scene snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid scene structure: {0}")]
    InvalidScene(String),
}

pub trait SceneLoader {
    fn load(&self, path: &Path) -> Result<Drawing, IoError>;
}

/// JSON 场景快照的读取入口。
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSceneFacade;

impl JsonSceneFacade {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, source: &str) -> Result<Drawing, IoError> {
        let snapshot: SceneSnapshot = serde_json::from_str(source)?;
        snapshot.into_drawing()
    }
}

impl SceneLoader for JsonSceneFacade {
    fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let drawing = self.parse(&data)?;
        debug!(path = %path.display(), elements = drawing.len(), "场景快照已加载");
        Ok(drawing)
    }
}

type Coord = [f64; 3];

fn point(coord: Coord) -> Point3 {
    Point3::new(coord[0], coord[1], coord[2])
}

/// 快照的顶层结构。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneSnapshot {
    /// 宿主属性目录中声明了类型的属性。
    #[serde(default)]
    pub attribute_kinds: Vec<AttributeKindRecord>,
    pub elements: Vec<ElementRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttributeKindRecord {
    pub id: i32,
    pub kind: AttributeKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElementRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default)]
    pub attributes: Vec<AttributeRecord>,
    #[serde(default)]
    pub solid: Option<SolidRecord>,
    #[serde(default)]
    pub bar: Option<BarRecord>,
}

/// 实体的三种写法：长方体、直棱柱或显式面表。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolidRecord {
    Cuboid { min: Coord, max: Coord },
    Extrusion { base: Vec<Coord>, height: f64 },
    Faces(Vec<Vec<Coord>>),
}

impl SolidRecord {
    fn into_solid(self, element: u64) -> Result<Solid, IoError> {
        let solid = match self {
            SolidRecord::Cuboid { min, max } => Solid::cuboid(point(min), point(max)),
            SolidRecord::Extrusion { base, height } => {
                if base.len() < 3 {
                    return Err(IoError::InvalidScene(format!(
                        "element {element}: extrusion base needs at least 3 points"
                    )));
                }
                let base: Vec<Point3> = base.into_iter().map(point).collect();
                Solid::extruded(&base, height)
            }
            SolidRecord::Faces(faces) => Solid::from_faces(
                faces
                    .into_iter()
                    .map(|face| Face::new(face.into_iter().map(point))),
            ),
        };
        Ok(solid)
    }
}

/// 钢筋放置。`outline` 缺省表示宿主无法解析该弯曲形状。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BarRecord {
    pub mark: String,
    #[serde(default)]
    pub outline: Option<Vec<Coord>>,
    #[serde(default)]
    pub placement: Option<PlacementRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlacementRecord {
    pub origin: Coord,
    #[serde(default = "PlacementRecord::default_x_axis")]
    pub x_axis: Coord,
    #[serde(default = "PlacementRecord::default_z_axis")]
    pub z_axis: Coord,
}

impl PlacementRecord {
    fn default_x_axis() -> Coord {
        [1.0, 0.0, 0.0]
    }

    fn default_z_axis() -> Coord {
        [0.0, 0.0, 1.0]
    }

    fn into_placement(self, element: u64) -> Result<Placement, IoError> {
        Placement::from_axes(
            point(self.origin),
            Vector3::new(self.x_axis[0], self.x_axis[1], self.x_axis[2]),
            Vector3::new(self.z_axis[0], self.z_axis[1], self.z_axis[2]),
        )
        .ok_or_else(|| {
            IoError::InvalidScene(format!("element {element}: degenerate placement axes"))
        })
    }
}

impl SceneSnapshot {
    pub fn into_drawing(self) -> Result<Drawing, IoError> {
        let mut drawing = Drawing::new();
        for record in self.attribute_kinds {
            drawing.declare_attribute(AttributeId::new(record.id), record.kind);
        }

        for record in self.elements {
            let id = record.id;
            let mut element =
                DrawingElement::new(record.element_type).with_attributes(record.attributes);
            element.solid = record
                .solid
                .map(|solid| solid.into_solid(id))
                .transpose()?;
            if let Some(bar) = record.bar {
                let shape = match bar.outline {
                    Some(outline) => Some(BarShape {
                        local_outline: outline.into_iter().map(point).collect(),
                        placement: bar
                            .placement
                            .map(|placement| placement.into_placement(id))
                            .transpose()?
                            .unwrap_or_default(),
                    }),
                    None => None,
                };
                element.bar = Some(BarPlacement {
                    mark: bar.mark,
                    shape,
                });
            }
            let element_id = ElementId::new(id);
            if !drawing.insert_element(element_id, element) {
                let message = if drawing.element(element_id).is_some() {
                    format!("duplicate element id {id}")
                } else {
                    format!("element id {id} is out of range")
                };
                return Err(IoError::InvalidScene(message));
            }
        }
        Ok(drawing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_outline_means_unsupported_shape() {
        let drawing = JsonSceneFacade::new()
            .parse(
                r#"{"elements": [
                    {"id": 3, "type": "BarsSpiralPlacement", "bar": {"mark": "12"}}
                ]}"#,
            )
            .unwrap();
        let bar = drawing.element(ElementId::new(3)).unwrap().bar.as_ref().unwrap();
        assert_eq!(bar.mark, "12");
        assert!(bar.shape.is_none());
    }

    #[test]
    fn omitted_placement_is_identity() {
        let drawing = JsonSceneFacade::new()
            .parse(
                r#"{"elements": [
                    {"id": 1, "type": "BarsLinearPlacement",
                     "bar": {"mark": "1", "outline": [[0, 0, 0], [1, 0, 0]]}}
                ]}"#,
            )
            .unwrap();
        let shape = drawing.element(ElementId::new(1)).unwrap().bar.as_ref().unwrap();
        assert_eq!(shape.shape.as_ref().unwrap().placement, Placement::identity());
    }

    #[test]
    fn short_extrusion_base_is_rejected() {
        let err = JsonSceneFacade::new()
            .parse(
                r#"{"elements": [
                    {"id": 1, "type": "Volume3D",
                     "solid": {"extrusion": {"base": [[0, 0, 0], [1, 0, 0]], "height": 1}}}
                ]}"#,
            )
            .unwrap_err();
        assert!(matches!(err, IoError::InvalidScene(message) if message.contains("extrusion")));
    }

    #[test]
    fn unknown_element_type_is_malformed() {
        let err = JsonSceneFacade::new()
            .parse(r#"{"elements": [{"id": 1, "type": "Staircase"}]}"#)
            .unwrap_err();
        assert!(matches!(err, IoError::Malformed(_)));
    }
}
