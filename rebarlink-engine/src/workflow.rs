use rebarlink_core::document::ElementId;
use tracing::{debug, info, warn};

use crate::classify::selection_filter;
use crate::errors::{SelectionError, SettingsError};
use crate::host::SessionContext;
use crate::matcher::{ContainmentMatcher, MatchOptions};
use crate::messages::{MessageCatalog, UserMessage};
use crate::pipeline::{PreparedRun, RunReport};
use crate::settings::{TransferRequest, TransferSettings};
use crate::transfer::FinishStatus;

const PROGRESS_TITLE: &str = "Calculating Geometry Containment";
const PROGRESS_DESCRIPTION: &str = "This can take a while";

/// 状态机的状态。`Classifying`/`Matching`/`Transferring` 只在处理选择完成事件期间短暂出现。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Selecting,
    Classifying,
    Matching,
    Transferring,
    Finished(FinishStatus),
}

impl WorkflowState {
    /// 可以接受触发事件（开始新一轮）的状态。
    #[inline]
    pub fn accepts_trigger(self) -> bool {
        matches!(self, WorkflowState::Idle | WorkflowState::Finished(_))
    }
}

/// 外部驱动事件。
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// 用户按下开始按钮，附带当前配置。
    Trigger(TransferRequest),
    /// 宿主报告多选完成。
    SelectionCompleted(Vec<ElementId>),
    /// 用户取消选择。
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    Configuration(SettingsError),
    Selection(SelectionError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    SelectionRequested,
    SelectionRetried,
    Aborted(AbortReason),
    Finished(FinishStatus),
    Cancelled,
    Ignored,
}

/// 单个事件的处理结果。
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResponse {
    pub outcome: EventOutcome,
    pub state: WorkflowState,
    /// 本次事件中依次进入的状态。
    pub trace: Vec<WorkflowState>,
    /// 本次事件中弹出的模态消息。
    pub messages: Vec<UserMessage>,
    pub report: Option<RunReport>,
}

impl WorkflowResponse {
    fn new(state: WorkflowState) -> Self {
        Self {
            outcome: EventOutcome::Ignored,
            state,
            trace: Vec::new(),
            messages: Vec::new(),
            report: None,
        }
    }
}

/// 属性传递流程状态机，通过 `handle_event` 单一入口驱动。
#[derive(Debug)]
pub struct TransferWorkflow {
    state: WorkflowState,
    pending: Option<TransferSettings>,
    catalog: MessageCatalog,
    options: MatchOptions,
}

impl TransferWorkflow {
    pub fn new(catalog: MessageCatalog, options: MatchOptions) -> Self {
        Self {
            state: WorkflowState::Idle,
            pending: None,
            catalog,
            options,
        }
    }

    #[inline]
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    #[inline]
    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    /// 在状态栏显示空闲提示。
    pub fn announce_idle(&self, ctx: &mut SessionContext<'_>) {
        ctx.ui.show_status(&self.catalog.text(UserMessage::InfoIdle));
    }

    pub fn handle_event(
        &mut self,
        event: WorkflowEvent,
        ctx: &mut SessionContext<'_>,
    ) -> WorkflowResponse {
        let mut response = WorkflowResponse::new(self.state);
        match event {
            WorkflowEvent::Trigger(request) => self.on_trigger(&request, ctx, &mut response),
            WorkflowEvent::SelectionCompleted(selection) => {
                self.on_selection(&selection, ctx, &mut response)
            }
            WorkflowEvent::Cancel => self.on_cancel(ctx, &mut response),
        }
        response.state = self.state;
        response
    }

    fn on_trigger(
        &mut self,
        request: &TransferRequest,
        ctx: &mut SessionContext<'_>,
        response: &mut WorkflowResponse,
    ) {
        if !self.state.accepts_trigger() {
            debug!(state = ?self.state, "忽略触发事件");
            return;
        }
        let settings = match TransferSettings::from_request(request) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "传递参数未设置");
                self.notify(ctx, response, UserMessage::ParametersNotSet);
                self.enter(WorkflowState::Idle, response);
                response.outcome = EventOutcome::Aborted(AbortReason::Configuration(err));
                return;
            }
        };

        info!(
            tolerance = settings.tolerance().get(),
            attributes = settings.attribute_ids().len(),
            "开始选择几何与钢筋"
        );
        self.pending = Some(settings);
        ctx.ui.set_locked(true);
        self.enter(WorkflowState::Selecting, response);
        self.request_selection(ctx);
        response.outcome = EventOutcome::SelectionRequested;
    }

    fn on_selection(
        &mut self,
        selection: &[ElementId],
        ctx: &mut SessionContext<'_>,
        response: &mut WorkflowResponse,
    ) {
        if self.state != WorkflowState::Selecting {
            debug!(state = ?self.state, "忽略选择完成事件");
            return;
        }
        if selection.is_empty() {
            debug!("选择为空，重新请求选择");
            self.request_selection(ctx);
            response.outcome = EventOutcome::SelectionRetried;
            return;
        }
        let Some(settings) = self.pending.take() else {
            // 正常流程中进入 Selecting 时一定带有参数。
            self.unlock_to_idle(ctx, response);
            return;
        };

        self.enter(WorkflowState::Classifying, response);
        let mut run = match PreparedRun::prepare(&*ctx.document, selection) {
            Ok(run) => run,
            Err(err) => {
                warn!(error = %err, "选择集不完整，中止");
                self.unlock_to_idle(ctx, response);
                self.notify(ctx, response, UserMessage::from(err));
                response.outcome = EventOutcome::Aborted(AbortReason::Selection(err));
                return;
            }
        };

        if !run.unsupported.is_empty() {
            let marks: Vec<&str> = run.unsupported.iter().map(|u| u.mark.as_str()).collect();
            let text = self
                .catalog
                .text_with_list(UserMessage::UnsupportedRebarShape, &marks);
            self.notify_text(ctx, response, UserMessage::UnsupportedRebarShape, &text);
        }

        ctx.ui.progress_start(PROGRESS_TITLE, PROGRESS_DESCRIPTION);
        self.enter(WorkflowState::Matching, response);
        let matcher = ContainmentMatcher::new(ctx.classifier, settings.tolerance(), self.options);
        let matching = run.match_containment(&matcher);

        self.enter(WorkflowState::Transferring, response);
        let transfer = run.transfer(&mut *ctx.document, &settings);
        ctx.ui.progress_stop();

        let status = transfer.status();
        let report = run.into_report(matching, transfer);
        self.enter(WorkflowState::Finished(status), response);

        match status {
            FinishStatus::Success => {
                ctx.ui.set_locked(false);
                self.notify(ctx, response, UserMessage::Finished);
            }
            FinishStatus::ReadingErrors => {
                self.notify(ctx, response, UserMessage::ReadingAttributes);
                ctx.ui.set_locked(false);
            }
            FinishStatus::WritingErrors => {
                self.notify(ctx, response, UserMessage::TransferringAttributes);
                ctx.ui.set_locked(false);
            }
            FinishStatus::ReadingAndWritingErrors => {
                self.notify(ctx, response, UserMessage::ReadingAttributes);
                self.notify(ctx, response, UserMessage::TransferringAttributes);
                ctx.ui.set_locked(false);
            }
        }
        self.announce_idle(ctx);
        info!(status = ?status, "属性传递流程结束");
        response.outcome = EventOutcome::Finished(status);
        response.report = Some(report);
    }

    fn on_cancel(&mut self, ctx: &mut SessionContext<'_>, response: &mut WorkflowResponse) {
        if self.state != WorkflowState::Selecting {
            debug!(state = ?self.state, "忽略取消事件");
            return;
        }
        info!("选择已取消");
        ctx.selection.cancel();
        ctx.ui.progress_stop();
        self.pending = None;
        self.unlock_to_idle(ctx, response);
        response.outcome = EventOutcome::Cancelled;
    }

    fn request_selection(&self, ctx: &mut SessionContext<'_>) {
        let prompt = self.catalog.text(UserMessage::InfoSelection);
        ctx.ui.show_status(&prompt);
        ctx.selection.request_multi_select(&selection_filter(), &prompt);
    }

    fn unlock_to_idle(&mut self, ctx: &mut SessionContext<'_>, response: &mut WorkflowResponse) {
        self.pending = None;
        ctx.ui.set_locked(false);
        self.enter(WorkflowState::Idle, response);
        self.announce_idle(ctx);
    }

    fn enter(&mut self, state: WorkflowState, response: &mut WorkflowResponse) {
        debug!(from = ?self.state, to = ?state, "状态迁移");
        self.state = state;
        response.trace.push(state);
    }

    fn notify(
        &self,
        ctx: &mut SessionContext<'_>,
        response: &mut WorkflowResponse,
        message: UserMessage,
    ) {
        let text = self.catalog.text(message);
        self.notify_text(ctx, response, message, &text);
    }

    fn notify_text(
        &self,
        ctx: &mut SessionContext<'_>,
        response: &mut WorkflowResponse,
        message: UserMessage,
        text: &str,
    ) {
        ctx.ui.show_message(text);
        response.messages.push(message);
    }
}
