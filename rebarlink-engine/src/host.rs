use rebarlink_core::attribute::{AttributeId, AttributeKind, AttributeRecord, AttributeSet};
use rebarlink_core::document::{BarShape, Drawing, ElementId, ElementType};
use rebarlink_core::geometry::Point3;
use rebarlink_core::solid::{PointPosition, Solid};

use crate::errors::HostError;

/// 宿主图纸的查询与属性写入接口。所有调用视为同步调用。
pub trait HostDocument {
    fn element_type(&self, id: ElementId) -> Result<ElementType, HostError>;

    /// 读取元素的完整属性集合。
    fn attributes(&self, id: ElementId) -> Result<AttributeSet, HostError>;

    /// 宿主属性目录中声明的值类型，未声明时返回 `None`。
    fn attribute_kind(&self, id: AttributeId) -> Option<AttributeKind>;

    /// 几何元素的边界表示，已处于世界坐标系。
    fn solid(&self, id: ElementId) -> Result<Solid, HostError>;

    /// 钢筋放置的局部弯曲形状与放置矩阵。
    fn bar_shape(&self, id: ElementId) -> Result<BarShape, HostError>;

    /// 钢筋编号（取自父级钢筋组），仅用于诊断输出。
    fn rebar_mark(&self, id: ElementId) -> Result<String, HostError>;

    /// 批量写入：同一组记录写入全部目标元素，要么全部成功要么不写。
    fn write_attributes(
        &mut self,
        records: &[AttributeRecord],
        targets: &[ElementId],
    ) -> Result<(), HostError>;
}

/// 多选请求使用的类型过滤器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionFilter {
    types: Vec<ElementType>,
}

impl SelectionFilter {
    pub fn new(types: impl IntoIterator<Item = ElementType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    #[inline]
    pub fn types(&self) -> &[ElementType] {
        &self.types
    }

    #[inline]
    pub fn accepts(&self, element_type: ElementType) -> bool {
        self.types.contains(&element_type)
    }
}

/// 宿主的异步选择服务。请求后立即返回，选择结果通过后续事件送回状态机。
pub trait SelectionService {
    fn request_multi_select(&mut self, filter: &SelectionFilter, prompt: &str);
    fn cancel(&mut self);
}

/// 宿主界面：锁定控件、模态提示、状态栏与进度指示。
pub trait UserInterface {
    fn set_locked(&mut self, locked: bool);
    fn show_message(&mut self, text: &str);
    fn show_status(&mut self, text: &str);

    fn progress_start(&mut self, _title: &str, _description: &str) {}
    fn progress_stop(&mut self) {}
}

/// 点与实体的位置判定谓词。
pub trait PointClassifier {
    fn classify(&self, point: Point3, solid: &Solid, epsilon: f64) -> PointPosition;
}

/// 基于射线法的默认判定实现。
#[derive(Debug, Default, Clone, Copy)]
pub struct RayCastClassifier;

impl PointClassifier for RayCastClassifier {
    #[inline]
    fn classify(&self, point: Point3, solid: &Solid, epsilon: f64) -> PointPosition {
        solid.position_of(point, epsilon)
    }
}

/// 一次会话内各组件共享的宿主上下文，显式传递给状态机。
pub struct SessionContext<'a> {
    pub document: &'a mut dyn HostDocument,
    pub selection: &'a mut dyn SelectionService,
    pub ui: &'a mut dyn UserInterface,
    pub classifier: &'a dyn PointClassifier,
}

impl HostDocument for Drawing {
    fn element_type(&self, id: ElementId) -> Result<ElementType, HostError> {
        self.element(id)
            .map(|element| element.element_type)
            .ok_or(HostError::ElementNotFound(id.get()))
    }

    fn attributes(&self, id: ElementId) -> Result<AttributeSet, HostError> {
        self.element(id)
            .map(|element| element.attributes.clone())
            .ok_or(HostError::ElementNotFound(id.get()))
    }

    fn attribute_kind(&self, id: AttributeId) -> Option<AttributeKind> {
        Drawing::attribute_kind(self, id)
    }

    fn solid(&self, id: ElementId) -> Result<Solid, HostError> {
        let element = self
            .element(id)
            .ok_or(HostError::ElementNotFound(id.get()))?;
        element
            .solid
            .clone()
            .ok_or(HostError::SolidUnavailable(id.get()))
    }

    fn bar_shape(&self, id: ElementId) -> Result<BarShape, HostError> {
        let element = self
            .element(id)
            .ok_or(HostError::ElementNotFound(id.get()))?;
        let bar = element
            .bar
            .as_ref()
            .ok_or(HostError::NotBarPlacement(id.get()))?;
        bar.shape
            .clone()
            .ok_or(HostError::ShapeUnavailable(id.get()))
    }

    fn rebar_mark(&self, id: ElementId) -> Result<String, HostError> {
        let element = self
            .element(id)
            .ok_or(HostError::ElementNotFound(id.get()))?;
        element
            .bar
            .as_ref()
            .map(|bar| bar.mark.clone())
            .ok_or(HostError::NotBarPlacement(id.get()))
    }

    fn write_attributes(
        &mut self,
        records: &[AttributeRecord],
        targets: &[ElementId],
    ) -> Result<(), HostError> {
        // 先整体校验再写入，保证批量写入的原子性。
        for target in targets {
            if self.element(*target).is_none() {
                return Err(HostError::ElementNotFound(target.get()));
            }
        }
        for record in records {
            if let Some(expected) = Drawing::attribute_kind(self, record.id) {
                let actual = record.value.kind();
                if expected != actual {
                    return Err(HostError::AttributeTypeMismatch {
                        id: record.id,
                        expected,
                        actual,
                    });
                }
            }
        }
        for target in targets {
            if let Some(element) = self.element_mut(*target) {
                for record in records {
                    element.attributes.set(record.clone());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rebarlink_core::attribute::AttributeValue;
    use rebarlink_core::document::DrawingElement;

    use super::*;

    #[test]
    fn drawing_write_is_atomic_on_missing_target() {
        let mut drawing = Drawing::new();
        let bar = drawing.add_element(DrawingElement::new(ElementType::BarsLinearPlacement));
        let records = [AttributeRecord::text(20, "F90")];
        let err = drawing
            .write_attributes(&records, &[bar, ElementId::new(99)])
            .unwrap_err();
        assert_eq!(err, HostError::ElementNotFound(99));
        assert!(drawing.element(bar).unwrap().attributes.is_empty());
    }

    #[test]
    fn drawing_write_checks_declared_kinds() {
        let mut drawing = Drawing::new();
        drawing.declare_attribute(AttributeId::new(20), AttributeKind::Integer);
        let bar = drawing.add_element(DrawingElement::new(ElementType::BarsLinearPlacement));

        let err = drawing
            .write_attributes(&[AttributeRecord::text(20, "5")], &[bar])
            .unwrap_err();
        assert!(matches!(err, HostError::AttributeTypeMismatch { .. }));

        drawing
            .write_attributes(&[AttributeRecord::integer(20, 5)], &[bar])
            .expect("typed write");
        let written = drawing.element(bar).unwrap().attributes.get(AttributeId::new(20));
        assert_eq!(written.map(|r| &r.value), Some(&AttributeValue::Integer(5)));
    }

    #[test]
    fn drawing_reports_missing_shape_and_solid() {
        let mut drawing = Drawing::new();
        let bar = drawing.add_bar_placement(ElementType::BarsAreaPlacement, "7", None, []);
        assert_eq!(drawing.bar_shape(bar), Err(HostError::ShapeUnavailable(bar.get())));
        assert_eq!(drawing.rebar_mark(bar).as_deref(), Ok("7"));
        assert_eq!(drawing.solid(bar), Err(HostError::SolidUnavailable(bar.get())));
    }

    #[test]
    fn selection_filter_accepts_listed_types() {
        let filter = SelectionFilter::new([ElementType::Slab, ElementType::BarsLinearPlacement]);
        assert!(filter.accepts(ElementType::Slab));
        assert!(!filter.accepts(ElementType::Text));
        assert_eq!(filter.types().len(), 2);
    }
}
