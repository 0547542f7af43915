pub mod classify;
pub mod extract;
pub mod host;
pub mod matcher;
pub mod messages;
pub mod pipeline;
pub mod settings;
pub mod transfer;
pub mod workflow;

pub mod errors {
    use rebarlink_core::attribute::{AttributeId, AttributeKind};
    use thiserror::Error;

    /// 宿主协作方（元素查询、几何读取、属性写入）报告的失败。
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum HostError {
        #[error("element with id {0} not found")]
        ElementNotFound(u64),
        #[error("attributes of element {0} are not available")]
        AttributesUnavailable(u64),
        #[error("element {0} has no solid geometry")]
        SolidUnavailable(u64),
        #[error("element {0} is not a bar placement")]
        NotBarPlacement(u64),
        #[error("bending shape of element {0} cannot be resolved")]
        ShapeUnavailable(u64),
        #[error("attribute {id} expects a {expected:?} value, got {actual:?}")]
        AttributeTypeMismatch {
            id: AttributeId,
            expected: AttributeKind,
            actual: AttributeKind,
        },
        #[error("host rejected the request: {0}")]
        Rejected(String),
    }

    /// 配置错误：阻止开始选择，重新配置后可恢复。
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum SettingsError {
        #[error("transfer tolerance is not set")]
        ToleranceMissing,
        #[error("transfer tolerance {0} is outside (0, 1]")]
        ToleranceOutOfRange(f64),
        #[error("no attribute ids selected for transfer")]
        NoAttributeIds,
    }

    /// 选择组成错误：选择完成后发现缺少几何或钢筋，整轮中止。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum SelectionError {
        #[error("no geometry selected")]
        NoGeometry,
        #[error("no reinforcement selected")]
        NoReinforcement,
        #[error("nothing selected")]
        Nothing,
    }

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum CoercionError {
        #[error("value of attribute {id} cannot be written as {expected:?}")]
        Incompatible {
            id: AttributeId,
            expected: Option<AttributeKind>,
        },
    }
}
