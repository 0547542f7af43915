use std::path::PathBuf;

use rebarlink_config::{AppConfig, TransferConfig};
use rebarlink_core::document::{Drawing, ElementId};
use rebarlink_engine::host::{RayCastClassifier, SessionContext};
use rebarlink_engine::matcher::MatchOptions;
use rebarlink_engine::messages::MessageCatalog;
use rebarlink_engine::pipeline::RunReport;
use rebarlink_engine::settings::TransferRequest;
use rebarlink_engine::transfer::{GeometryTransfer, LABEL_ATTRIBUTE};
use rebarlink_engine::workflow::{EventOutcome, TransferWorkflow, WorkflowEvent, WorkflowResponse};
use tracing::{info, warn};

use crate::console::{AutoSelection, ConsoleUi};
use crate::errors::FrontendError;
use crate::loader::{LoadedScene, SceneSource, load_scene};

/// 命令行覆盖项，优先于配置文件。
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub scene: Option<PathBuf>,
    pub tolerance: Option<f64>,
    pub attribute_ids: Option<Vec<i32>>,
    /// 不打印提示与报告。
    pub quiet: bool,
}

/// 一次 CLI 运行的结果，图纸为传递后的状态。
#[derive(Debug)]
pub struct CliRun {
    pub outcome: EventOutcome,
    pub report: Option<RunReport>,
    pub drawing: Drawing,
    pub source: SceneSource,
    pub ui: ConsoleUi,
}

pub fn transfer_request(config: &TransferConfig, options: &CliOptions) -> TransferRequest {
    let ids = options
        .attribute_ids
        .clone()
        .unwrap_or_else(|| config.attribute_ids.clone());
    TransferRequest::new(options.tolerance.or(config.tolerance), ids)
}

pub fn match_options(config: &TransferConfig) -> MatchOptions {
    MatchOptions {
        epsilon: config.point_epsilon,
        bounds_prefilter: config.bounds_prefilter,
    }
}

pub fn message_catalog(config: &AppConfig) -> Result<MessageCatalog, FrontendError> {
    Ok(MessageCatalog::with_overrides(config.message_overrides()?))
}

/// 加载图纸并执行一轮完整的属性传递。
pub fn run(config: &AppConfig, options: &CliOptions) -> Result<CliRun, FrontendError> {
    let loaded = load_scene(config, options.scene.as_deref())?;
    run_on(config, options, loaded)
}

pub fn run_on(
    config: &AppConfig,
    options: &CliOptions,
    loaded: LoadedScene,
) -> Result<CliRun, FrontendError> {
    let LoadedScene {
        mut drawing,
        source,
        ..
    } = loaded;
    match &source {
        SceneSource::Snapshot(path) => info!(path = %path.display(), "使用场景快照"),
        SceneSource::Demo => info!("使用内置示例图纸"),
    }

    let mut host = ConsoleHost {
        ui: if options.quiet {
            ConsoleUi::silent()
        } else {
            ConsoleUi::new()
        },
        selection: AutoSelection::new(),
        classifier: RayCastClassifier,
    };
    let mut workflow =
        TransferWorkflow::new(message_catalog(config)?, match_options(&config.transfer));

    workflow.announce_idle(&mut host.context(&mut drawing));
    let request = transfer_request(&config.transfer, options);
    let mut response = host.dispatch(&mut workflow, &mut drawing, WorkflowEvent::Trigger(request));

    if response.outcome == EventOutcome::SelectionRequested {
        let selected = host
            .selection
            .complete(&drawing)
            .ok_or(FrontendError::SelectionNotRequested)?;
        let event = if selected.is_empty() {
            warn!("图纸中没有可选的几何或钢筋，取消选择");
            WorkflowEvent::Cancel
        } else {
            WorkflowEvent::SelectionCompleted(selected)
        };
        response = host.dispatch(&mut workflow, &mut drawing, event);
    }

    if let Some(report) = &response.report {
        if !options.quiet {
            print_report(&drawing, report);
        }
    }

    Ok(CliRun {
        outcome: response.outcome,
        report: response.report,
        drawing,
        source,
        ui: host.ui,
    })
}

struct ConsoleHost {
    ui: ConsoleUi,
    selection: AutoSelection,
    classifier: RayCastClassifier,
}

impl ConsoleHost {
    fn context<'a>(&'a mut self, drawing: &'a mut Drawing) -> SessionContext<'a> {
        SessionContext {
            document: drawing,
            selection: &mut self.selection,
            ui: &mut self.ui,
            classifier: &self.classifier,
        }
    }

    fn dispatch(
        &mut self,
        workflow: &mut TransferWorkflow,
        drawing: &mut Drawing,
        event: WorkflowEvent,
    ) -> WorkflowResponse {
        let mut context = self.context(drawing);
        workflow.handle_event(event, &mut context)
    }
}

fn label_of(drawing: &Drawing, id: ElementId) -> String {
    drawing
        .element(id)
        .and_then(|element| element.attributes.get(LABEL_ATTRIBUTE))
        .map(|record| record.value.to_string())
        .unwrap_or_else(|| format!("#{}", id.get()))
}

fn mark_of(drawing: &Drawing, id: ElementId) -> String {
    drawing
        .element(id)
        .and_then(|element| element.bar.as_ref())
        .map(|bar| bar.mark.clone())
        .unwrap_or_else(|| "?".to_string())
}

fn marks(drawing: &Drawing, ids: &[ElementId]) -> String {
    let marks: Vec<String> = ids.iter().map(|id| mark_of(drawing, *id)).collect();
    marks.join(", ")
}

fn print_report(drawing: &Drawing, report: &RunReport) {
    println!("钢筋属性传递结果（{:?}）", report.status());
    println!(
        "共 {} 个几何、{} 根钢筋；比较 {} 对，包围盒排除 {} 对",
        report.assignments.len(),
        report.reinforcement_count,
        report.matching.tested_pairs,
        report.matching.pruned_pairs
    );

    for (geometry, rebars) in &report.assignments {
        let outcome = match report.transfer.outcome(*geometry) {
            Some(GeometryTransfer::Transferred { attributes, targets }) => {
                let ids: Vec<String> = attributes.iter().map(ToString::to_string).collect();
                format!("已写入属性 [{}] 到 {targets} 根钢筋", ids.join(", "))
            }
            Some(GeometryTransfer::NoAssignedReinforcement) | None => "无钢筋".to_string(),
            Some(GeometryTransfer::AttributesUnavailable(_)) => "读取属性失败".to_string(),
            Some(GeometryTransfer::NoRequestedAttributes) => "没有请求的属性".to_string(),
            Some(GeometryTransfer::TransferFailed(failure)) => format!("写入失败: {failure:?}"),
        };
        println!(
            "  - 几何 {} (ID={}): 钢筋 [{}]，{outcome}",
            label_of(drawing, *geometry),
            geometry.get(),
            marks(drawing, rebars)
        );
    }

    if !report.matching.unassigned.is_empty() {
        println!("未分配的钢筋：{}", marks(drawing, &report.matching.unassigned));
    }
    if !report.unsupported.is_empty() {
        let unsupported: Vec<&str> = report.unsupported.iter().map(|u| u.mark.as_str()).collect();
        println!("不支持的弯曲形状：{}", unsupported.join(", "));
    }
}
