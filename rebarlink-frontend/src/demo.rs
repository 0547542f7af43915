use rebarlink_core::attribute::{AttributeId, AttributeKind, AttributeRecord};
use rebarlink_core::document::{BarShape, Drawing, DrawingElement, ElementId, ElementType};
use rebarlink_core::geometry::{Placement, Point3, Vector3};
use rebarlink_core::solid::Solid;
use rebarlink_engine::classify::{IFC_CLASS_ATTRIBUTE, REINFORCING_BAR_CLASS};

/// 内置示例中各元素的 ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoElements {
    pub slab: ElementId,
    pub column: ElementId,
    pub beam: ElementId,
    pub slab_bar: ElementId,
    pub column_bar: ElementId,
    pub beam_bar: ElementId,
    pub spiral: ElementId,
    pub stray_bar: ElementId,
    pub note: ElementId,
}

/// 楼板编号，示例中声明为整数属性。
pub const STOREY_ATTRIBUTE: i32 = 508;

fn rebar_tag() -> [AttributeRecord; 1] {
    [AttributeRecord::text(IFC_CLASS_ATTRIBUTE.get(), REINFORCING_BAR_CLASS)]
}

fn straight_bar(length: f64, placement: Placement) -> Option<BarShape> {
    Some(BarShape {
        local_outline: vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(length * 0.5, 0.0, 0.0),
            Point3::new(length, 0.0, 0.0),
        ],
        placement,
    })
}

/// 构建一份包含楼板、柱、梁及若干钢筋的示例图纸。
pub fn populate_demo(drawing: &mut Drawing) -> DemoElements {
    drawing.declare_attribute(AttributeId::new(STOREY_ATTRIBUTE), AttributeKind::Integer);

    let slab = drawing.add_volume(
        ElementType::Slab,
        Solid::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(6.0, 4.0, 0.25)),
        [
            AttributeRecord::text(10, "D-01"),
            AttributeRecord::text(20, "C30/37"),
            AttributeRecord::text(STOREY_ATTRIBUTE, "1"),
        ],
    );
    let column = drawing.add_volume(
        ElementType::Column,
        Solid::extruded(
            &[
                Point3::new(8.0, 0.0, 0.0),
                Point3::new(8.4, 0.0, 0.0),
                Point3::new(8.4, 0.4, 0.0),
                Point3::new(8.0, 0.4, 0.0),
            ],
            3.0,
        ),
        [
            AttributeRecord::text(10, "S-01"),
            AttributeRecord::text(20, "C35/45"),
            AttributeRecord::integer(STOREY_ATTRIBUTE, 1),
        ],
    );
    let beam = drawing.add_volume(
        ElementType::Beam,
        Solid::cuboid(Point3::new(0.0, 4.0, -0.5), Point3::new(6.0, 4.3, 0.25)),
        [AttributeRecord::text(10, "U-01"), AttributeRecord::text(20, "C30/37")],
    );

    let slab_bar = drawing.add_bar_placement(
        ElementType::BarsAreaPlacement,
        "1",
        straight_bar(5.5, Placement::from_translation(Vector3::new(0.25, 0.5, 0.05))),
        rebar_tag(),
    );
    let column_bar = drawing.add_bar_placement(
        ElementType::BarsLinearPlacement,
        "2",
        straight_bar(
            2.8,
            Placement::from_axes(
                Point3::new(8.2, 0.2, 0.1),
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(1.0, 0.0, 0.0),
            )
            .unwrap_or_default(),
        ),
        rebar_tag(),
    );
    let beam_bar = drawing.add_bar_placement(
        ElementType::BarsLinearPlacement,
        "3",
        straight_bar(5.8, Placement::from_translation(Vector3::new(0.1, 4.15, -0.4))),
        rebar_tag(),
    );
    let spiral = drawing.add_bar_placement(ElementType::BarsSpiralPlacement, "4", None, rebar_tag());
    let stray_bar = drawing.add_bar_placement(
        ElementType::BarsLinearPlacement,
        "5",
        straight_bar(1.0, Placement::from_translation(Vector3::new(20.0, 20.0, 20.0))),
        rebar_tag(),
    );
    let note = drawing.add_element(
        DrawingElement::new(ElementType::Text)
            .with_attributes([AttributeRecord::text(10, "Bewehrung EG")]),
    );

    DemoElements {
        slab,
        column,
        beam,
        slab_bar,
        column_bar,
        beam_bar,
        spiral,
        stray_bar,
        note,
    }
}
