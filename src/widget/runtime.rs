//! widget::runtime
//!
//! Async driver for the widget reducer.
//!
//! The runtime owns a [`WidgetState`] and carries out the effects the
//! reducer returns: proposal requests and settle timers run as tokio tasks
//! that report back over a channel, emitted notices are collected, and the
//! side channel is kept current. All state changes still go through
//! [`apply`], one event at a time.
//!
//! [`WidgetRuntime::dispatch`] spawns tasks and therefore must be called
//! from within a tokio runtime.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::widget::render::{self, RenderModel};
use crate::widget::state::{apply, Effect, Notice, SideChannel, WidgetEvent, WidgetState};
use crate::widget::transport::ProposalTransport;
use crate::widget::WidgetConfig;

/// Drives one widget instance.
pub struct WidgetRuntime {
    state: WidgetState,
    transport: Arc<dyn ProposalTransport>,
    tx: mpsc::UnboundedSender<WidgetEvent>,
    rx: mpsc::UnboundedReceiver<WidgetEvent>,
    outstanding: usize,
    notices: Vec<Notice>,
    side_channel: SideChannel,
}

impl WidgetRuntime {
    pub fn new(config: WidgetConfig, transport: impl ProposalTransport + 'static) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = WidgetState::new(config);
        let side_channel = state.side_channel();
        Self {
            state,
            transport: Arc::new(transport),
            tx,
            rx,
            outstanding: 0,
            notices: Vec::new(),
            side_channel,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn render(&self) -> RenderModel {
        render::render(&self.state)
    }

    /// Latest side channel contents.
    pub fn side_channel(&self) -> &SideChannel {
        &self.side_channel
    }

    /// Drain notices emitted so far.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether requests or timers are still running.
    pub fn is_idle(&self) -> bool {
        self.outstanding == 0
    }

    /// Apply one event and start its effects.
    pub fn dispatch(&mut self, event: WidgetEvent) {
        let (state, effects) = apply(self.state.clone(), event);
        self.state = state;
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::RequestProposal { token, request } => {
                let transport = Arc::clone(&self.transport);
                let tx = self.tx.clone();
                self.outstanding += 1;
                tokio::spawn(async move {
                    let event = match transport.propose(&request).await {
                        Ok(response) => WidgetEvent::ProposalReceived { token, response },
                        Err(err) => WidgetEvent::ProposalFailed {
                            token,
                            error: err.to_string(),
                        },
                    };
                    // The receiver only goes away with the runtime.
                    let _ = tx.send(event);
                });
            }
            Effect::ScheduleSettle { generation } => {
                let settle = self.state.config.settle;
                let tx = self.tx.clone();
                self.outstanding += 1;
                tokio::spawn(async move {
                    tokio::time::sleep(settle).await;
                    let _ = tx.send(WidgetEvent::SettleElapsed { generation });
                });
            }
            Effect::Emit(notice) => {
                tracing::debug!(?notice, "widget notice");
                self.notices.push(notice);
            }
            Effect::WriteSideChannel(side_channel) => self.side_channel = side_channel,
        }
    }

    /// Wait for the next task result and apply it.
    ///
    /// Returns `false` when nothing is outstanding.
    pub async fn step(&mut self) -> bool {
        if self.outstanding == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(event) => {
                self.outstanding -= 1;
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Run until every request and timer has reported back.
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }
}

impl std::fmt::Debug for WidgetRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRuntime")
            .field("state", &self.state)
            .field("outstanding", &self.outstanding)
            .finish_non_exhaustive()
    }
}
