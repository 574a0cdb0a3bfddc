//! widget::state
//!
//! The editing widget as a pure reducer.
//!
//! # States
//!
//! ```text
//!            Activate (editable, not loading)
//!   View ------------------------------------> Edit
//!    ^  <--- Commit (manual proposal) ---------  |
//!    |  <--- Cancel (no request) ----------------+
//!    |
//!    +-- proposal with conflict --> Conflict --ResolveConflict--> View
//! ```
//!
//! [`apply`] never performs I/O: it returns [`Effect`]s for the runtime to
//! carry out. Every proposal request carries a token from a monotonically
//! increasing counter; only the response to the latest token is applied.

use std::collections::BTreeMap;

use crate::core::naming;
use crate::protocol::{
    ProposalContext, ProposalMode, ProposalRequest, ProposalResponse, MANUAL_VALUE,
};
use crate::widget::config::WidgetConfig;
use crate::widget::render;

/// Top-level widget mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Edit,
}

/// A conflict waiting for a forced choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The value that collided.
    pub conflicting: String,
    /// The unique alternative.
    pub suggestion: String,
    /// The value to revert to.
    pub origin: String,
}

/// How a conflict is resolved. There is no dismissal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    AcceptSuggestion,
    Revert,
}

/// Inputs to the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    Activate,
    Input(String),
    Commit,
    Cancel,
    ToggleSync,
    ToggleLock,
    ToggleFullPath,
    SourceFieldChanged { field: String, value: String },
    SettleElapsed { generation: u64 },
    ProposalReceived { token: u64, response: ProposalResponse },
    ProposalFailed { token: u64, error: String },
    ResolveConflict(Resolution),
}

/// Events emitted to the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Change { value: String, old_value: String },
    EditStart,
    EditCancel,
    RequestProposal {
        mode: ProposalMode,
        context: ProposalContext,
    },
}

/// Fields the hosting form reads at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SideChannel {
    pub slug: String,
    pub sync: bool,
    pub lock: bool,
    /// One-time full path override; never persisted.
    pub full_path_override: bool,
}

/// Work for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestProposal { token: u64, request: ProposalRequest },
    ScheduleSettle { generation: u64 },
    Emit(Notice),
    WriteSideChannel(SideChannel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    token: u64,
    mode: ProposalMode,
    origin: String,
}

/// Complete widget state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetState {
    pub config: WidgetConfig,
    pub mode: Mode,
    pub value: String,
    pub locked: bool,
    pub synced: bool,
    pub conflict: Option<Conflict>,
    pub loading: bool,
    pub full_path_mode: bool,
    pub pre_edit_value: String,
    pub edit_buffer: String,
    pub source_fields: BTreeMap<String, String>,
    value_before_sync: Option<String>,
    last_token: u64,
    pending: Option<Pending>,
    settle_generation: u64,
    auto_pending: bool,
}

impl WidgetState {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            mode: Mode::View,
            value: config.value.clone(),
            locked: config.is_locked,
            synced: config.is_synced,
            conflict: None,
            loading: false,
            full_path_mode: false,
            pre_edit_value: config.value.clone(),
            edit_buffer: String::new(),
            source_fields: BTreeMap::new(),
            value_before_sync: None,
            last_token: 0,
            pending: None,
            settle_generation: 0,
            auto_pending: false,
            config,
        }
    }

    /// Whether the slug can be edited by hand.
    pub fn is_editable(&self) -> bool {
        !self.locked && !self.synced
    }

    /// The latest issued request token.
    pub fn last_token(&self) -> u64 {
        self.last_token
    }

    /// The token of the request whose response would be applied.
    pub fn pending_token(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.token)
    }

    pub fn side_channel(&self) -> SideChannel {
        SideChannel {
            slug: self.value.clone(),
            sync: self.synced,
            lock: self.locked,
            full_path_override: self.full_path_mode,
        }
    }

    fn source_fields_filled(&self) -> bool {
        if self.config.required_source_fields.is_empty() {
            return self.source_fields.values().any(|v| !v.trim().is_empty());
        }
        self.config.required_source_fields.iter().all(|field| {
            self.source_fields
                .get(field)
                .is_some_and(|v| !v.trim().is_empty())
        })
    }

    fn request(&mut self, mode: ProposalMode, values: BTreeMap<String, String>) -> Vec<Effect> {
        let origin = match self.pending.take() {
            Some(superseded) => superseded.origin,
            None => self.value.clone(),
        };
        self.last_token += 1;
        let token = self.last_token;
        self.pending = Some(Pending {
            token,
            mode,
            origin,
        });
        self.loading = true;

        vec![
            Effect::RequestProposal {
                token,
                request: ProposalRequest {
                    mode,
                    context: self.config.context.clone(),
                    values,
                },
            },
            Effect::Emit(Notice::RequestProposal {
                mode,
                context: self.config.context.clone(),
            }),
        ]
    }

    /// Send the held-back auto proposal, if the source fields allow one.
    fn flush_auto(&mut self) -> Vec<Effect> {
        self.auto_pending = false;
        if self.synced && !self.locked && self.source_fields_filled() {
            let values = self.source_fields.clone();
            self.request(ProposalMode::Auto, values)
        } else {
            Vec::new()
        }
    }

    fn set_value(&mut self, value: String, old_value: &str, effects: &mut Vec<Effect>) {
        self.value = value;
        if self.value != old_value {
            effects.push(Effect::Emit(Notice::Change {
                value: self.value.clone(),
                old_value: old_value.to_string(),
            }));
        }
        effects.push(Effect::WriteSideChannel(self.side_channel()));
    }
}

/// Apply one event.
pub fn apply(mut state: WidgetState, event: WidgetEvent) -> (WidgetState, Vec<Effect>) {
    let mut effects = Vec::new();

    // A conflict blocks everything but its resolution and passive input.
    if state.conflict.is_some()
        && !matches!(
            event,
            WidgetEvent::ResolveConflict(_)
                | WidgetEvent::SourceFieldChanged { .. }
                | WidgetEvent::SettleElapsed { .. }
                | WidgetEvent::ProposalReceived { .. }
                | WidgetEvent::ProposalFailed { .. }
        )
    {
        tracing::debug!(?event, "ignored while a conflict is open");
        return (state, effects);
    }

    match event {
        WidgetEvent::Activate => {
            if state.mode == Mode::View && state.is_editable() && !state.loading {
                state.mode = Mode::Edit;
                state.pre_edit_value = state.value.clone();
                state.conflict = None;
                state.edit_buffer = render::split(&state).editable;
                effects.push(Effect::Emit(Notice::EditStart));
            }
        }

        WidgetEvent::Input(text) => {
            if state.mode == Mode::Edit {
                state.edit_buffer = text;
            }
        }

        WidgetEvent::Commit => {
            if state.mode == Mode::Edit {
                state.mode = Mode::View;
                let readonly = render::split_value(&state, &state.pre_edit_value).readonly;
                let candidate = naming::sanitize_path(
                    &naming::join_path(&readonly, &state.edit_buffer),
                    state.config.fallback_character,
                );
                state.edit_buffer.clear();

                // Post modifiers may rewrite even an unchanged value server side.
                if candidate != state.pre_edit_value || state.config.has_post_modifiers {
                    let values = BTreeMap::from([(MANUAL_VALUE.to_string(), candidate.clone())]);
                    effects.extend(state.request(ProposalMode::Manual, values));
                    state.value = candidate;
                }
            }
        }

        WidgetEvent::Cancel => {
            if state.mode == Mode::Edit {
                state.mode = Mode::View;
                state.edit_buffer.clear();
                state.value = state.pre_edit_value.clone();
                effects.push(Effect::Emit(Notice::EditCancel));
            }
        }

        WidgetEvent::ToggleSync => {
            if state.config.sync_feature && !state.locked && !state.loading {
                if state.synced {
                    state.synced = false;
                    let current = state.value.clone();
                    match state.value_before_sync.take() {
                        Some(previous) => state.set_value(previous, &current, &mut effects),
                        None => effects.push(Effect::WriteSideChannel(state.side_channel())),
                    }
                } else {
                    state.synced = true;
                    if state.mode == Mode::Edit {
                        state.mode = Mode::View;
                        state.edit_buffer.clear();
                        state.value = state.pre_edit_value.clone();
                        effects.push(Effect::Emit(Notice::EditCancel));
                    }
                    state.value_before_sync = Some(state.value.clone());
                    effects.push(Effect::WriteSideChannel(state.side_channel()));
                    if state.source_fields_filled() {
                        let values = state.source_fields.clone();
                        effects.extend(state.request(ProposalMode::Recreate, values));
                    }
                }
            }
        }

        WidgetEvent::ToggleLock => {
            if state.config.lock_feature && !state.synced && !state.loading {
                state.locked = !state.locked;
                if state.locked {
                    state.mode = Mode::View;
                    state.full_path_mode = false;
                }
                effects.push(Effect::WriteSideChannel(state.side_channel()));
            }
        }

        WidgetEvent::ToggleFullPath => {
            if state.config.full_path_feature && state.is_editable() && !state.loading {
                state.full_path_mode = !state.full_path_mode;
                if state.mode == Mode::Edit {
                    state.edit_buffer = render::split(&state).editable;
                }
                effects.push(Effect::WriteSideChannel(state.side_channel()));
            }
        }

        WidgetEvent::SourceFieldChanged { field, value } => {
            state.source_fields.insert(field, value);
            if state.synced && !state.locked {
                state.settle_generation += 1;
                state.auto_pending = true;
                effects.push(Effect::ScheduleSettle {
                    generation: state.settle_generation,
                });
            }
        }

        WidgetEvent::SettleElapsed { generation } => {
            // An open conflict holds the auto proposal until it is resolved.
            if generation == state.settle_generation
                && state.auto_pending
                && state.conflict.is_none()
            {
                effects.extend(state.flush_auto());
            }
        }

        WidgetEvent::ProposalReceived { token, response } => {
            match state.pending.take() {
                Some(pending) if pending.token == token => {
                    state.loading = false;
                    receive(&mut state, pending, response, &mut effects);
                }
                other => {
                    tracing::debug!(token, "discarding stale proposal response");
                    state.pending = other;
                }
            }
        }

        WidgetEvent::ProposalFailed { token, error } => match state.pending.take() {
            Some(pending) if pending.token == token => {
                tracing::warn!(token, %error, "proposal request failed, restoring value");
                state.loading = false;
                state.value = pending.origin;
                effects.push(Effect::WriteSideChannel(state.side_channel()));
            }
            other => state.pending = other,
        },

        WidgetEvent::ResolveConflict(resolution) => {
            if let Some(conflict) = state.conflict.take() {
                match resolution {
                    Resolution::AcceptSuggestion => {
                        state.set_value(conflict.suggestion, &conflict.origin, &mut effects)
                    }
                    Resolution::Revert => {
                        state.value = conflict.origin;
                        effects.push(Effect::WriteSideChannel(state.side_channel()));
                    }
                }
                if state.auto_pending {
                    effects.extend(state.flush_auto());
                }
            }
        }
    }

    (state, effects)
}

fn receive(
    state: &mut WidgetState,
    pending: Pending,
    response: ProposalResponse,
    effects: &mut Vec<Effect>,
) {
    if response.proposal.is_empty() {
        tracing::debug!(mode = %pending.mode, "empty proposal, keeping value");
        state.value = pending.origin;
        return;
    }

    if response.has_conflicts && pending.mode != ProposalMode::Auto {
        state.value = response.slug.clone();
        state.conflict = Some(Conflict {
            conflicting: response.slug,
            suggestion: response.proposal,
            origin: pending.origin,
        });
        return;
    }

    state.set_value(response.proposal, &pending.origin, effects);
}
