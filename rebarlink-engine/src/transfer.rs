use std::collections::HashMap;

use rebarlink_core::attribute::{AttributeId, AttributeKind, AttributeRecord, AttributeSet, AttributeValue};
use rebarlink_core::document::ElementId;
use tracing::{debug, info, warn};

use crate::errors::{CoercionError, HostError};
use crate::extract::{GeometryElement, ReinforcementElement};
use crate::host::HostDocument;

/// 诊断输出时用来标识几何元素的属性。
pub const LABEL_ATTRIBUTE: AttributeId = AttributeId::new(10);

/// 写入前的值解释顺序：文本 → 浮点 → 整数。
pub const COERCION_ORDER: [AttributeKind; 3] = [
    AttributeKind::Text,
    AttributeKind::Float,
    AttributeKind::Integer,
];

/// 按 `COERCION_ORDER` 依次尝试解释源值，返回第一个宿主接受且解析成功的结果。
/// 宿主未声明类型时源值原样写入：文本仍是文本，已带类型的数值保持其类型。
pub fn coerce_value(value: &AttributeValue, declared: Option<AttributeKind>) -> Option<AttributeValue> {
    let Some(declared) = declared else {
        return Some(value.clone());
    };
    COERCION_ORDER
        .into_iter()
        .filter(|kind| *kind == declared)
        .find_map(|kind| value.convert(kind))
}

/// 依据宿主的属性声明准备待写入的记录。
pub fn prepare_records(
    document: &dyn HostDocument,
    records: &[AttributeRecord],
) -> Result<Vec<AttributeRecord>, CoercionError> {
    records
        .iter()
        .map(|record| {
            let declared = document.attribute_kind(record.id);
            coerce_value(&record.value, declared)
                .map(|value| AttributeRecord::new(record.id, value))
                .ok_or(CoercionError::Incompatible {
                    id: record.id,
                    expected: declared,
                })
        })
        .collect()
}

/// 按 `requested` 的顺序从属性集中挑出存在的记录，同时返回缺失的 ID。
pub fn filter_requested(
    attributes: &AttributeSet,
    requested: &[AttributeId],
) -> (Vec<AttributeRecord>, Vec<AttributeId>) {
    let mut found = Vec::with_capacity(requested.len());
    let mut missing = Vec::new();
    for id in requested {
        match attributes.get(*id) {
            Some(record) => found.push(record.clone()),
            None => missing.push(*id),
        }
    }
    (found, missing)
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferFailure {
    Coercion(CoercionError),
    Host(HostError),
}

/// 单个几何元素的传递结果。
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryTransfer {
    Transferred {
        attributes: Vec<AttributeId>,
        targets: usize,
    },
    /// 没有分配到钢筋，不读取也不写入。
    NoAssignedReinforcement,
    /// 属性读取失败或为空，`None` 表示读取成功但没有任何属性。
    AttributesUnavailable(Option<HostError>),
    /// 请求的属性均不存在于该元素上。
    NoRequestedAttributes,
    TransferFailed(TransferFailure),
}

/// 终态类型：由读错误与写错误集合是否为空决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishStatus {
    Success,
    ReadingErrors,
    WritingErrors,
    ReadingAndWritingErrors,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    pub outcomes: Vec<(ElementId, GeometryTransfer)>,
    pub reading_errors: Vec<ElementId>,
    pub writing_errors: Vec<ElementId>,
}

impl TransferReport {
    pub fn status(&self) -> FinishStatus {
        match (self.reading_errors.is_empty(), self.writing_errors.is_empty()) {
            (true, true) => FinishStatus::Success,
            (false, true) => FinishStatus::ReadingErrors,
            (true, false) => FinishStatus::WritingErrors,
            (false, false) => FinishStatus::ReadingAndWritingErrors,
        }
    }

    pub fn outcome(&self, geometry: ElementId) -> Option<&GeometryTransfer> {
        self.outcomes
            .iter()
            .find_map(|(id, outcome)| (*id == geometry).then_some(outcome))
    }

    fn record(&mut self, geometry: ElementId, outcome: GeometryTransfer) {
        match &outcome {
            GeometryTransfer::AttributesUnavailable(_) => self.reading_errors.push(geometry),
            GeometryTransfer::TransferFailed(_) => self.writing_errors.push(geometry),
            _ => {}
        }
        self.outcomes.push((geometry, outcome));
    }
}

/// 属性传递引擎：读取几何属性，按请求列表过滤，批量写入其分配的全部钢筋。
pub struct TransferEngine<'a> {
    requested: &'a [AttributeId],
}

impl<'a> TransferEngine<'a> {
    pub fn new(requested: &'a [AttributeId]) -> Self {
        Self { requested }
    }

    pub fn run(
        &self,
        document: &mut dyn HostDocument,
        geometry: &[GeometryElement],
        reinforcement: &[ReinforcementElement],
    ) -> TransferReport {
        let marks: HashMap<ElementId, &str> = reinforcement
            .iter()
            .map(|rebar| (rebar.id, rebar.mark.as_str()))
            .collect();
        let mut report = TransferReport::default();

        for element in geometry {
            let outcome = self.transfer_one(document, element, &marks);
            report.record(element.id, outcome);
        }

        info!(
            reading_errors = report.reading_errors.len(),
            writing_errors = report.writing_errors.len(),
            "属性传递完成"
        );
        report
    }

    fn transfer_one(
        &self,
        document: &mut dyn HostDocument,
        element: &GeometryElement,
        marks: &HashMap<ElementId, &str>,
    ) -> GeometryTransfer {
        let targets = element.assigned_reinforcement();
        if targets.is_empty() {
            return GeometryTransfer::NoAssignedReinforcement;
        }

        let attributes = match document.attributes(element.id) {
            Ok(attributes) if !attributes.is_empty() => attributes,
            Ok(_) => {
                warn!(geometry = element.id.get(), "几何元素没有任何属性");
                return GeometryTransfer::AttributesUnavailable(None);
            }
            Err(err) => {
                warn!(geometry = element.id.get(), error = %err, "无法读取几何元素属性");
                return GeometryTransfer::AttributesUnavailable(Some(err));
            }
        };
        let label = attributes
            .get(LABEL_ATTRIBUTE)
            .map(|record| record.value.to_string())
            .unwrap_or_else(|| element.id.get().to_string());

        let (found, missing) = filter_requested(&attributes, self.requested);
        if !missing.is_empty() {
            debug!(geometry = %label, missing = ?missing, "部分请求属性不存在");
        }
        if found.is_empty() {
            warn!(geometry = %label, "请求的属性在该几何元素上均不存在");
            return GeometryTransfer::NoRequestedAttributes;
        }

        let failure = match prepare_records(&*document, &found) {
            Ok(records) => match document.write_attributes(&records, targets) {
                Ok(()) => {
                    let attributes: Vec<AttributeId> = records.iter().map(|r| r.id).collect();
                    debug!(
                        geometry = %label,
                        attributes = ?attributes,
                        targets = targets.len(),
                        "属性已写入钢筋"
                    );
                    return GeometryTransfer::Transferred {
                        attributes,
                        targets: targets.len(),
                    };
                }
                Err(err) => TransferFailure::Host(err),
            },
            Err(err) => TransferFailure::Coercion(err),
        };

        for target in targets {
            let mark = marks.get(target).copied().unwrap_or("?");
            warn!(geometry = %label, mark, "钢筋属性写入失败");
        }
        GeometryTransfer::TransferFailed(failure)
    }
}
