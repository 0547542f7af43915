use std::collections::HashMap;
use std::fmt::Display;

use crate::errors::SelectionError;

/// 消息编号的基数，字符串表中的键为 `MESSAGE_CODE_BASE + 状态值`。
pub const MESSAGE_CODE_BASE: u32 = 9000;

/// 面向用户的状态消息。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserMessage {
    InfoIdle,
    InfoSelection,
    NoGeometrySelected,
    NoReinforcementSelected,
    NothingSelected,
    ParametersNotSet,
    TransferringAttributes,
    ReadingAttributes,
    Finished,
    UnsupportedRebarShape,
}

impl UserMessage {
    pub const ALL: [UserMessage; 10] = [
        UserMessage::InfoIdle,
        UserMessage::InfoSelection,
        UserMessage::NoGeometrySelected,
        UserMessage::NoReinforcementSelected,
        UserMessage::NothingSelected,
        UserMessage::ParametersNotSet,
        UserMessage::TransferringAttributes,
        UserMessage::ReadingAttributes,
        UserMessage::Finished,
        UserMessage::UnsupportedRebarShape,
    ];

    #[inline]
    pub fn code(self) -> u32 {
        let index = match self {
            UserMessage::InfoIdle => 0,
            UserMessage::InfoSelection => 1,
            UserMessage::NoGeometrySelected => 2,
            UserMessage::NoReinforcementSelected => 3,
            UserMessage::NothingSelected => 4,
            UserMessage::ParametersNotSet => 5,
            UserMessage::TransferringAttributes => 6,
            UserMessage::ReadingAttributes => 7,
            UserMessage::Finished => 8,
            UserMessage::UnsupportedRebarShape => 9,
        };
        MESSAGE_CODE_BASE + index
    }

    pub fn name(self) -> &'static str {
        match self {
            UserMessage::InfoIdle => "INFO_IDLE",
            UserMessage::InfoSelection => "INFO_SELECTION",
            UserMessage::NoGeometrySelected => "ERROR_NO_GEOMETRY_SELECTED",
            UserMessage::NoReinforcementSelected => "ERROR_NO_REINFORCEMENT_SELECTED",
            UserMessage::NothingSelected => "ERROR_NOTHING_SELECTED",
            UserMessage::ParametersNotSet => "ERROR_PARAMETERS_NOT_SET",
            UserMessage::TransferringAttributes => "ERROR_TRANSFERRING_ATTRIBUTES",
            UserMessage::ReadingAttributes => "ERROR_READING_ATTRIBUTES",
            UserMessage::Finished => "INFO_FINISHED",
            UserMessage::UnsupportedRebarShape => "ERROR_UNSUPPORTED_REBAR_SHAPE",
        }
    }

    fn default_text(self) -> &'static str {
        match self {
            UserMessage::InfoIdle => "Start the transfer with the button in the palette.",
            UserMessage::InfoSelection => "Select geometry and reinforcement elements",
            UserMessage::NoGeometrySelected => {
                "No geometry was selected. Select at least one slab, column, beam, wall or 3D volume."
            }
            UserMessage::NoReinforcementSelected => {
                "No reinforcement was selected. Select bar placements classified as IfcReinforcingBar."
            }
            UserMessage::NothingSelected => "Neither geometry nor reinforcement was selected.",
            UserMessage::ParametersNotSet => {
                "Transfer parameters are not set. Choose a tolerance and at least one attribute."
            }
            UserMessage::TransferringAttributes => {
                "Attributes could not be written to some reinforcement. See the log for the affected marks."
            }
            UserMessage::ReadingAttributes => {
                "Attributes could not be read from some geometry elements."
            }
            UserMessage::Finished => "Attributes were transferred to the reinforcement.",
            UserMessage::UnsupportedRebarShape => {
                "Some reinforcement has an unsupported bending shape and was skipped."
            }
        }
    }
}

impl From<SelectionError> for UserMessage {
    fn from(value: SelectionError) -> Self {
        match value {
            SelectionError::NoGeometry => UserMessage::NoGeometrySelected,
            SelectionError::NoReinforcement => UserMessage::NoReinforcementSelected,
            SelectionError::Nothing => UserMessage::NothingSelected,
        }
    }
}

/// 按消息编号查找文本的字符串表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    entries: HashMap<u32, String>,
}

impl MessageCatalog {
    /// 不含任何条目的空表，所有查询都会落到 "String not found" 提示。
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// 内置默认文本，再用 `overrides` 覆盖同编号条目。
    pub fn with_overrides(overrides: impl IntoIterator<Item = (u32, String)>) -> Self {
        let mut catalog = Self::default();
        catalog.entries.extend(overrides);
        catalog
    }

    pub fn text(&self, message: UserMessage) -> String {
        self.entries
            .get(&message.code())
            .cloned()
            .unwrap_or_else(|| format!("String not found: {}", message.name()))
    }

    /// 在消息后追加一段说明文字。
    pub fn text_with(&self, message: UserMessage, data: &str) -> String {
        format!("{} {}", self.text(message), data)
    }

    /// 在消息后追加以 `-` 连接的列表。
    pub fn text_with_list<T: Display>(&self, message: UserMessage, items: &[T]) -> String {
        let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
        self.text_with(message, &joined.join("-"))
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            entries: UserMessage::ALL
                .iter()
                .map(|message| (message.code(), message.default_text().to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_state_order() {
        assert_eq!(UserMessage::InfoIdle.code(), 9000);
        assert_eq!(UserMessage::Finished.code(), 9008);
        assert_eq!(UserMessage::UnsupportedRebarShape.code(), 9009);
    }

    #[test]
    fn overrides_replace_defaults() {
        let catalog = MessageCatalog::with_overrides([(9008, "Fertig".to_string())]);
        assert_eq!(catalog.text(UserMessage::Finished), "Fertig");
        assert_eq!(
            catalog.text(UserMessage::InfoSelection),
            "Select geometry and reinforcement elements"
        );
    }

    #[test]
    fn missing_entries_name_the_message() {
        let catalog = MessageCatalog::empty();
        assert_eq!(
            catalog.text(UserMessage::ReadingAttributes),
            "String not found: ERROR_READING_ATTRIBUTES"
        );
    }

    #[test]
    fn data_is_appended() {
        let catalog = MessageCatalog::with_overrides([(9009, "Unsupported:".to_string())]);
        assert_eq!(
            catalog.text_with_list(UserMessage::UnsupportedRebarShape, &["12", "14"]),
            "Unsupported: 12-14"
        );
        assert_eq!(catalog.text_with(UserMessage::UnsupportedRebarShape, "x"), "Unsupported: x");
    }

    #[test]
    fn selection_errors_map_to_messages() {
        assert_eq!(UserMessage::from(SelectionError::Nothing), UserMessage::NothingSelected);
        assert_eq!(
            UserMessage::from(SelectionError::NoGeometry),
            UserMessage::NoGeometrySelected
        );
    }
}
