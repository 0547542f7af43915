use std::collections::HashSet;

use rebarlink_core::attribute::AttributeId;
use rebarlink_core::document::{ElementId, ElementType};
use tracing::debug;

use crate::errors::SelectionError;
use crate::host::{HostDocument, SelectionFilter};

/// 可作为包围几何的体量/结构构件类型。
pub const GEOMETRY_TYPES: [ElementType; 8] = [
    ElementType::Slab,
    ElementType::Column,
    ElementType::Beam,
    ElementType::WallTier,
    ElementType::Volume3D,
    ElementType::BRep3DVolume,
    ElementType::Cylinder3D,
    ElementType::Sphere3D,
];

/// 钢筋放置类型。
pub const BAR_PLACEMENT_TYPES: [ElementType; 9] = [
    ElementType::BarsLinearPlacement,
    ElementType::BarsLinearMultiPlacement,
    ElementType::BarsAreaPlacement,
    ElementType::BarsSpiralPlacement,
    ElementType::BarsCircularPlacement,
    ElementType::BarsRotationalSolidPlacement,
    ElementType::BarsRotationalPlacement,
    ElementType::BarsTangentialPlacement,
    ElementType::BarsEndBendingPlacement,
];

/// 存放 IFC 实体类名的属性。
pub const IFC_CLASS_ATTRIBUTE: AttributeId = AttributeId::new(684);
pub const REINFORCING_BAR_CLASS: &str = "IfcReinforcingBar";

#[inline]
pub fn is_geometry_type(element_type: ElementType) -> bool {
    GEOMETRY_TYPES.contains(&element_type)
}

#[inline]
pub fn is_bar_placement_type(element_type: ElementType) -> bool {
    BAR_PLACEMENT_TYPES.contains(&element_type)
}

/// 选择请求使用的过滤器：两份类型清单的并集。
pub fn selection_filter() -> SelectionFilter {
    SelectionFilter::new(GEOMETRY_TYPES.into_iter().chain(BAR_PLACEMENT_TYPES))
}

/// 分类结果，两个集合互不相交，均保持选择顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub geometry: Vec<ElementId>,
    pub reinforcement: Vec<ElementId>,
}

impl Classification {
    /// 任一集合为空时给出对应的选择错误。
    pub fn check(&self) -> Result<(), SelectionError> {
        match (self.geometry.is_empty(), self.reinforcement.is_empty()) {
            (true, true) => Err(SelectionError::Nothing),
            (true, false) => Err(SelectionError::NoGeometry),
            (false, true) => Err(SelectionError::NoReinforcement),
            (false, false) => Ok(()),
        }
    }
}

/// 将混合选择拆分为几何候选与钢筋候选。
///
/// 钢筋候选必须同时满足：类型属于钢筋放置清单，且 IFC 类属性等于 `IfcReinforcingBar`。
/// 类型或属性无法读取的元素直接忽略；重复出现的元素只计一次。
pub fn classify_selection(document: &dyn HostDocument, selection: &[ElementId]) -> Classification {
    let mut seen = HashSet::with_capacity(selection.len());
    let mut classification = Classification::default();

    for &id in selection {
        if !seen.insert(id) {
            continue;
        }
        let element_type = match document.element_type(id) {
            Ok(element_type) => element_type,
            Err(err) => {
                debug!(element = id.get(), error = %err, "无法读取元素类型，跳过");
                continue;
            }
        };

        if is_geometry_type(element_type) {
            classification.geometry.push(id);
        } else if is_bar_placement_type(element_type) && is_reinforcing_bar(document, id) {
            classification.reinforcement.push(id);
        }
    }

    debug!(
        geometry = classification.geometry.len(),
        reinforcement = classification.reinforcement.len(),
        "选择集分类完成"
    );
    classification
}

fn is_reinforcing_bar(document: &dyn HostDocument, id: ElementId) -> bool {
    match document.attributes(id) {
        Ok(attributes) => attributes
            .get(IFC_CLASS_ATTRIBUTE)
            .and_then(|record| record.value.as_text())
            .is_some_and(|class| class == REINFORCING_BAR_CLASS),
        Err(err) => {
            debug!(element = id.get(), error = %err, "无法读取钢筋属性，跳过");
            false
        }
    }
}
