use rebarlink_config::AppConfig;
use rebarlink_core::attribute::{AttributeId, AttributeValue};
use rebarlink_core::document::{Drawing, ElementId};
use rebarlink_engine::errors::SettingsError;
use rebarlink_engine::transfer::FinishStatus;
use rebarlink_engine::workflow::{AbortReason, EventOutcome};
use rebarlink_frontend::cli::{CliOptions, run_on};
use rebarlink_frontend::demo::STOREY_ATTRIBUTE;
use rebarlink_frontend::loader::{SceneSource, demo_scene};

fn configured() -> AppConfig {
    let mut config = AppConfig::default();
    config.transfer.tolerance = Some(0.5);
    config.transfer.attribute_ids = vec![10, 20, STOREY_ATTRIBUTE];
    config
}

fn quiet() -> CliOptions {
    CliOptions {
        quiet: true,
        ..CliOptions::default()
    }
}

fn value(drawing: &Drawing, element: ElementId, attribute: i32) -> Option<AttributeValue> {
    drawing
        .element(element)?
        .attributes
        .get(AttributeId::new(attribute))
        .map(|record| record.value.clone())
}

#[test]
fn demo_run_assigns_each_bar_to_its_host() {
    let scene = demo_scene();
    let ids = scene.demo_elements.unwrap();
    let run = run_on(&configured(), &quiet(), scene).expect("运行失败");

    assert_eq!(run.source, SceneSource::Demo);
    assert_eq!(run.outcome, EventOutcome::Finished(FinishStatus::Success));
    let report = run.report.expect("缺少运行报告");
    assert_eq!(report.assigned_to(ids.slab), Some(&[ids.slab_bar][..]));
    assert_eq!(report.assigned_to(ids.column), Some(&[ids.column_bar][..]));
    assert_eq!(report.assigned_to(ids.beam), Some(&[ids.beam_bar][..]));
    assert_eq!(report.matching.unassigned, vec![ids.stray_bar]);
    assert_eq!(report.unsupported.len(), 1);
    assert_eq!(report.unsupported[0].id, ids.spiral);

    let drawing = &run.drawing;
    assert_eq!(
        value(drawing, ids.slab_bar, 10),
        Some(AttributeValue::Text("D-01".to_string()))
    );
    // 文本 "1" 按声明写为整数。
    assert_eq!(
        value(drawing, ids.slab_bar, STOREY_ATTRIBUTE),
        Some(AttributeValue::Integer(1))
    );
    assert_eq!(
        value(drawing, ids.column_bar, 20),
        Some(AttributeValue::Text("C35/45".to_string()))
    );
    assert_eq!(value(drawing, ids.beam_bar, STOREY_ATTRIBUTE), None);
    assert_eq!(value(drawing, ids.stray_bar, 10), None);
    assert_eq!(value(drawing, ids.note, 20), None);

    assert!(!run.ui.is_locked());
    assert!(run.ui.progress().is_none());
    assert_eq!(run.ui.messages().len(), 2);
}

#[test]
fn missing_tolerance_aborts_before_selection() {
    let mut config = configured();
    config.transfer.tolerance = None;
    let run = run_on(&config, &quiet(), demo_scene()).unwrap();

    assert_eq!(
        run.outcome,
        EventOutcome::Aborted(AbortReason::Configuration(SettingsError::ToleranceMissing))
    );
    assert!(run.report.is_none());
    assert_eq!(run.ui.messages().len(), 1);
}

#[test]
fn command_line_overrides_configuration() {
    let options = CliOptions {
        tolerance: Some(1.0),
        attribute_ids: Some(vec![20]),
        ..quiet()
    };
    let scene = demo_scene();
    let ids = scene.demo_elements.unwrap();
    let run = run_on(&AppConfig::default(), &options, scene).unwrap();

    assert_eq!(run.outcome, EventOutcome::Finished(FinishStatus::Success));
    assert_eq!(
        value(&run.drawing, ids.slab_bar, 20),
        Some(AttributeValue::Text("C30/37".to_string()))
    );
    assert_eq!(value(&run.drawing, ids.slab_bar, 10), None);
}

#[test]
fn message_overrides_reach_the_console() {
    let mut config = configured();
    config
        .messages
        .insert("9008".to_string(), "Attribute übertragen".to_string());
    let run = run_on(&config, &quiet(), demo_scene()).unwrap();
    assert_eq!(
        run.ui.messages().last().map(String::as_str),
        Some("Attribute übertragen")
    );
}
