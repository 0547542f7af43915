use std::collections::HashSet;

use rebarlink_core::attribute::AttributeId;

use crate::errors::SettingsError;

/// 包含容差：折线点落在实体内部的最低比例，取值范围 (0, 1]。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn new(value: f64) -> Result<Self, SettingsError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(SettingsError::ToleranceOutOfRange(value))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

/// 配置端提交的原始传递参数，尚未校验。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferRequest {
    pub tolerance: Option<f64>,
    pub attribute_ids: Vec<AttributeId>,
}

impl TransferRequest {
    pub fn new(tolerance: Option<f64>, attribute_ids: impl IntoIterator<Item = i32>) -> Self {
        Self {
            tolerance,
            attribute_ids: attribute_ids.into_iter().map(AttributeId::new).collect(),
        }
    }
}

/// 校验后的传递参数。
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSettings {
    tolerance: Tolerance,
    attribute_ids: Vec<AttributeId>,
}

impl TransferSettings {
    /// 容差必须给出且位于 (0, 1]；属性 ID 按首次出现去重，`0` 表示未设置。
    pub fn new(
        tolerance: Option<f64>,
        attribute_ids: impl IntoIterator<Item = AttributeId>,
    ) -> Result<Self, SettingsError> {
        let tolerance = Tolerance::new(tolerance.ok_or(SettingsError::ToleranceMissing)?)?;
        let mut seen = HashSet::new();
        let attribute_ids: Vec<AttributeId> = attribute_ids
            .into_iter()
            .filter(|id| id.get() != 0 && seen.insert(*id))
            .collect();
        if attribute_ids.is_empty() {
            return Err(SettingsError::NoAttributeIds);
        }
        Ok(Self {
            tolerance,
            attribute_ids,
        })
    }

    pub fn from_request(request: &TransferRequest) -> Result<Self, SettingsError> {
        Self::new(request.tolerance, request.attribute_ids.iter().copied())
    }

    #[inline]
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    #[inline]
    pub fn attribute_ids(&self) -> &[AttributeId] {
        &self.attribute_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_range_is_half_open() {
        assert!(Tolerance::new(1.0).is_ok());
        assert!(Tolerance::new(0.001).is_ok());
        assert_eq!(Tolerance::new(0.0), Err(SettingsError::ToleranceOutOfRange(0.0)));
        assert!(Tolerance::new(1.5).is_err());
        assert!(Tolerance::new(f64::NAN).is_err());
    }

    #[test]
    fn settings_require_tolerance_and_ids() {
        let missing = TransferSettings::from_request(&TransferRequest::new(None, [10]));
        assert_eq!(missing, Err(SettingsError::ToleranceMissing));

        let unset = TransferSettings::from_request(&TransferRequest::new(Some(0.5), [0]));
        assert_eq!(unset, Err(SettingsError::NoAttributeIds));

        let empty = TransferSettings::from_request(&TransferRequest::new(Some(0.5), []));
        assert_eq!(empty, Err(SettingsError::NoAttributeIds));
    }

    #[test]
    fn ids_keep_first_occurrence_order() {
        let settings =
            TransferSettings::from_request(&TransferRequest::new(Some(0.5), [20, 10, 20, 30]))
                .expect("valid settings");
        let ids: Vec<i32> = settings.attribute_ids().iter().map(|id| id.get()).collect();
        assert_eq!(ids, vec![20, 10, 30]);
        assert_eq!(settings.tolerance().get(), 0.5);
    }
}
