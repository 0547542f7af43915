use rebarlink_core::document::{Drawing, ElementId};
use rebarlink_engine::host::{SelectionFilter, SelectionService, UserInterface};
use tracing::{debug, info};

/// 控制台宿主界面：把提示写到标准输出，同时保留一份记录。
#[derive(Debug, Default)]
pub struct ConsoleUi {
    echo: bool,
    locked: bool,
    status: String,
    messages: Vec<String>,
    progress: Option<String>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// 不输出到终端，只做记录。
    pub fn silent() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[inline]
    pub fn status(&self) -> &str {
        &self.status
    }

    #[inline]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[inline]
    pub fn progress(&self) -> Option<&str> {
        self.progress.as_deref()
    }
}

impl UserInterface for ConsoleUi {
    fn set_locked(&mut self, locked: bool) {
        debug!(locked, "界面锁定状态变化");
        self.locked = locked;
    }

    fn show_message(&mut self, text: &str) {
        if self.echo {
            println!("[提示] {text}");
        }
        self.messages.push(text.to_string());
    }

    fn show_status(&mut self, text: &str) {
        if self.echo {
            println!("[状态] {text}");
        }
        self.status = text.to_string();
    }

    fn progress_start(&mut self, title: &str, description: &str) {
        info!(title, description, "开始计算");
        if self.echo {
            println!("[进度] {title}: {description}");
        }
        self.progress = Some(title.to_string());
    }

    fn progress_stop(&mut self) {
        if self.progress.take().is_some() {
            debug!("进度指示结束");
        }
    }
}

/// 自动选择服务：记录最近一次选择请求，由驱动方按过滤器选取图纸中的元素。
#[derive(Debug, Default)]
pub struct AutoSelection {
    pending: Option<SelectionFilter>,
    requests: usize,
    cancelled: bool,
}

impl AutoSelection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn request_count(&self) -> usize {
        self.requests
    }

    #[inline]
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// 以待处理请求的过滤器选取全部匹配元素（按图纸顺序），并清除该请求。
    pub fn complete(&mut self, drawing: &Drawing) -> Option<Vec<ElementId>> {
        let filter = self.pending.take()?;
        let selection: Vec<ElementId> = drawing
            .elements()
            .filter(|(_, element)| filter.accepts(element.element_type))
            .map(|(id, _)| *id)
            .collect();
        info!(selected = selection.len(), "自动选择完成");
        Some(selection)
    }
}

impl SelectionService for AutoSelection {
    fn request_multi_select(&mut self, filter: &SelectionFilter, prompt: &str) {
        debug!(prompt, types = filter.types().len(), "收到多选请求");
        self.pending = Some(filter.clone());
        self.requests += 1;
    }

    fn cancel(&mut self) {
        self.pending = None;
        self.cancelled = true;
    }
}

#[cfg(test)]
mod tests {
    use rebarlink_core::document::{DrawingElement, ElementType};
    use rebarlink_engine::classify::selection_filter;

    use super::*;

    #[test]
    fn auto_selection_applies_filter() {
        let mut drawing = Drawing::new();
        let slab = drawing.add_element(DrawingElement::new(ElementType::Slab));
        drawing.add_element(DrawingElement::new(ElementType::Text));
        let bar = drawing.add_element(DrawingElement::new(ElementType::BarsAreaPlacement));

        let mut selection = AutoSelection::new();
        assert!(selection.complete(&drawing).is_none());

        selection.request_multi_select(&selection_filter(), "select");
        assert!(selection.is_pending());
        assert_eq!(selection.complete(&drawing), Some(vec![slab, bar]));
        assert!(!selection.is_pending());
    }

    #[test]
    fn cancel_drops_pending_request() {
        let mut selection = AutoSelection::new();
        selection.request_multi_select(&selection_filter(), "select");
        selection.cancel();
        assert!(!selection.is_pending());
        assert!(selection.was_cancelled());
        assert!(selection.complete(&Drawing::new()).is_none());
    }

    #[test]
    fn console_ui_records_output() {
        let mut ui = ConsoleUi::silent();
        ui.set_locked(true);
        ui.show_status("busy");
        ui.show_message("done");
        ui.progress_start("t", "d");
        assert_eq!(ui.progress(), Some("t"));
        ui.progress_stop();
        assert!(ui.is_locked());
        assert_eq!(ui.status(), "busy");
        assert_eq!(ui.messages(), ["done".to_string()]);
        assert!(ui.progress().is_none());
    }
}
