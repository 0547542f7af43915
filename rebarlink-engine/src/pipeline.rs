use rebarlink_core::document::ElementId;
use tracing::info;

use crate::classify::classify_selection;
use crate::errors::SelectionError;
use crate::extract::{
    GeometryElement, ReinforcementElement, UnsupportedShape, extract_geometry,
    extract_reinforcement, unsupported_shapes,
};
use crate::host::{HostDocument, PointClassifier};
use crate::matcher::{ContainmentMatcher, MatchOptions, MatchSummary};
use crate::settings::TransferSettings;
use crate::transfer::{FinishStatus, TransferEngine, TransferReport};

/// 分类与参考几何提取完成后的一轮运行数据，仅在本轮内有效。
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub geometry: Vec<GeometryElement>,
    pub reinforcement: Vec<ReinforcementElement>,
    pub unsupported: Vec<UnsupportedShape>,
}

impl PreparedRun {
    /// 分类选择集并提取参考几何。选择组成不完整时返回对应错误。
    pub fn prepare(
        document: &dyn HostDocument,
        selection: &[ElementId],
    ) -> Result<Self, SelectionError> {
        let classification = classify_selection(document, selection);
        classification.check()?;

        let geometry = extract_geometry(document, &classification.geometry);
        let reinforcement = extract_reinforcement(document, &classification.reinforcement);
        let unsupported = unsupported_shapes(&reinforcement);
        info!(
            geometry = geometry.len(),
            reinforcement = reinforcement.len(),
            unsupported = unsupported.len(),
            "参考几何提取完成"
        );
        Ok(Self {
            geometry,
            reinforcement,
            unsupported,
        })
    }

    pub fn match_containment(&mut self, matcher: &ContainmentMatcher<'_>) -> MatchSummary {
        let summary = matcher.assign(&mut self.geometry, &mut self.reinforcement);
        info!(
            assigned = summary.assigned,
            unassigned = summary.unassigned.len(),
            "包含关系计算完成"
        );
        summary
    }

    pub fn transfer(&self, document: &mut dyn HostDocument, settings: &TransferSettings) -> TransferReport {
        TransferEngine::new(settings.attribute_ids()).run(document, &self.geometry, &self.reinforcement)
    }

    pub fn into_report(self, matching: MatchSummary, transfer: TransferReport) -> RunReport {
        RunReport {
            assignments: self
                .geometry
                .iter()
                .map(|element| (element.id, element.assigned_reinforcement().to_vec()))
                .collect(),
            reinforcement_count: self.reinforcement.len(),
            unsupported: self.unsupported,
            matching,
            transfer,
        }
    }
}

/// 一轮完整运行的汇总。
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// 按几何输入顺序列出每个几何及其分配到的钢筋。
    pub assignments: Vec<(ElementId, Vec<ElementId>)>,
    pub reinforcement_count: usize,
    pub unsupported: Vec<UnsupportedShape>,
    pub matching: MatchSummary,
    pub transfer: TransferReport,
}

impl RunReport {
    #[inline]
    pub fn status(&self) -> FinishStatus {
        self.transfer.status()
    }

    pub fn assigned_to(&self, geometry: ElementId) -> Option<&[ElementId]> {
        self.assignments
            .iter()
            .find_map(|(id, rebars)| (*id == geometry).then_some(rebars.as_slice()))
    }
}

/// 不经过状态机、一次性执行 分类 → 提取 → 匹配 → 传递。
pub fn run_transfer(
    document: &mut dyn HostDocument,
    classifier: &dyn PointClassifier,
    selection: &[ElementId],
    settings: &TransferSettings,
    options: MatchOptions,
) -> Result<RunReport, SelectionError> {
    let mut run = PreparedRun::prepare(&*document, selection)?;
    let matcher = ContainmentMatcher::new(classifier, settings.tolerance(), options);
    let matching = run.match_containment(&matcher);
    let transfer = run.transfer(document, settings);
    Ok(run.into_report(matching, transfer))
}
