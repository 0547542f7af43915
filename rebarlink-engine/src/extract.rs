use rebarlink_core::document::{BarShape, ElementId};
use rebarlink_core::geometry::{Bounds3D, Point3};
use rebarlink_core::solid::Solid;
use tracing::{debug, warn};

use crate::host::HostDocument;

const UNKNOWN_MARK: &str = "?";

/// 钢筋候选及其世界坐标下的弯曲形状折线。
#[derive(Debug, Clone, PartialEq)]
pub struct ReinforcementElement {
    pub id: ElementId,
    pub mark: String,
    /// `None` 表示形状无法解析或变换，该元素不参与匹配。
    pub global_outline: Option<Vec<Point3>>,
    assigned: bool,
}

impl ReinforcementElement {
    pub fn new(id: ElementId, mark: impl Into<String>, global_outline: Option<Vec<Point3>>) -> Self {
        Self {
            id,
            mark: mark.into(),
            global_outline,
            assigned: false,
        }
    }

    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    /// 标记为已分配。一轮运行内不可撤销。
    #[inline]
    pub(crate) fn mark_assigned(&mut self) {
        self.assigned = true;
    }

    #[inline]
    pub fn is_supported(&self) -> bool {
        self.global_outline.is_some()
    }
}

/// 几何候选及其实体边界；`assigned_reinforcement` 在匹配阶段只追加。
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryElement {
    pub id: ElementId,
    /// 宿主无法提供实体时为 `None`，此时不会匹配到任何钢筋。
    pub solid: Option<Solid>,
    bounds: Option<Bounds3D>,
    assigned: Vec<ElementId>,
}

impl GeometryElement {
    pub fn new(id: ElementId, solid: Option<Solid>) -> Self {
        let bounds = solid.as_ref().map(Solid::bounds);
        Self {
            id,
            solid,
            bounds,
            assigned: Vec::new(),
        }
    }

    #[inline]
    pub fn bounds(&self) -> Option<&Bounds3D> {
        self.bounds.as_ref()
    }

    #[inline]
    pub fn assigned_reinforcement(&self) -> &[ElementId] {
        &self.assigned
    }

    #[inline]
    pub(crate) fn assign(&mut self, id: ElementId) {
        self.assigned.push(id);
    }
}

/// 形状不受支持的钢筋诊断项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedShape {
    pub id: ElementId,
    pub mark: String,
}

/// 将局部折线经放置矩阵变换到世界坐标。矩阵或结果含非有限值时视为退化形状。
pub fn global_outline(shape: &BarShape) -> Option<Vec<Point3>> {
    if !shape.placement.is_finite() {
        return None;
    }
    shape
        .local_outline
        .iter()
        .map(|point| {
            let global = shape.placement.transform_point(*point);
            global.is_finite().then_some(global)
        })
        .collect()
}

pub fn extract_reinforcement(
    document: &dyn HostDocument,
    ids: &[ElementId],
) -> Vec<ReinforcementElement> {
    ids.iter()
        .map(|&id| {
            let mark = document.rebar_mark(id).unwrap_or_else(|err| {
                debug!(element = id.get(), error = %err, "无法读取钢筋编号");
                UNKNOWN_MARK.to_string()
            });
            let outline = match document.bar_shape(id) {
                Ok(shape) => global_outline(&shape),
                Err(err) => {
                    debug!(element = id.get(), error = %err, "无法读取弯曲形状");
                    None
                }
            };
            if outline.is_none() {
                warn!(element = id.get(), mark = %mark, "钢筋形状不受支持，已排除");
            }
            ReinforcementElement::new(id, mark, outline)
        })
        .collect()
}

pub fn extract_geometry(document: &dyn HostDocument, ids: &[ElementId]) -> Vec<GeometryElement> {
    ids.iter()
        .map(|&id| {
            let solid = match document.solid(id) {
                Ok(solid) => Some(solid),
                Err(err) => {
                    warn!(element = id.get(), error = %err, "无法读取几何实体");
                    None
                }
            };
            GeometryElement::new(id, solid)
        })
        .collect()
}

pub fn unsupported_shapes(reinforcement: &[ReinforcementElement]) -> Vec<UnsupportedShape> {
    reinforcement
        .iter()
        .filter(|element| !element.is_supported())
        .map(|element| UnsupportedShape {
            id: element.id,
            mark: element.mark.clone(),
        })
        .collect()
}
