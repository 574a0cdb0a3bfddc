//! widget::render
//!
//! Pure render model. Everything here is a function of [`WidgetState`].

use crate::core::naming;
use crate::widget::state::{Mode, WidgetState};

/// A slug split into its read-only prefix and editable tail.
///
/// `readonly + editable` always reconstructs the split value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Split {
    pub readonly: String,
    pub editable: String,
}

/// Split a slug for display.
///
/// In full path mode only the locked prefix stays read-only. Otherwise
/// last-segment-only leaves the final segment editable, and a locked
/// prefix leaves everything below it editable.
///
/// ```
/// use slugsync::widget::render::split_slug;
///
/// let split = split_slug("/shop/shoes/red", "", true, false);
/// assert_eq!(split.readonly, "/shop/shoes");
/// assert_eq!(split.editable, "/red");
///
/// let split = split_slug("/shop/shoes/red", "/shop", false, false);
/// assert_eq!(split.readonly, "/shop");
/// assert_eq!(split.editable, "/shoes/red");
/// ```
pub fn split_slug(
    value: &str,
    locked_prefix: &str,
    last_segment_only: bool,
    full_path_mode: bool,
) -> Split {
    let locked_prefix = locked_prefix.trim_end_matches('/');

    let readonly = if last_segment_only && !full_path_mode {
        let parent = naming::parent_path(value);
        // A locked prefix deeper than the parent still wins.
        if locked_prefix.len() > parent.len() && naming::is_path_prefix(locked_prefix, value) {
            locked_prefix
        } else {
            parent
        }
    } else if !locked_prefix.is_empty() && naming::is_path_prefix(locked_prefix, value) {
        locked_prefix
    } else {
        ""
    };

    Split {
        readonly: readonly.to_string(),
        editable: value[readonly.len()..].to_string(),
    }
}

/// Split `value` with the policy currently active in `state`.
pub fn split_value(state: &WidgetState, value: &str) -> Split {
    split_slug(
        value,
        &state.config.locked_prefix,
        state.config.last_segment_only,
        state.full_path_mode,
    )
}

/// Split the current value.
pub fn split(state: &WidgetState) -> Split {
    split_value(state, &state.value)
}

/// One toggle control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Toggle {
    pub visible: bool,
    pub enabled: bool,
    pub on: bool,
}

/// What the conflict dialog shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictView {
    pub conflicting: String,
    pub suggestion: String,
}

/// Everything a surface needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderModel {
    pub mode: Mode,
    /// Display prefix such as the site base URL.
    pub prefix: String,
    pub split: Split,
    /// True when the slug is shown whole with nothing editable.
    pub unsplit: bool,
    pub edit_buffer: String,
    pub loading: bool,
    pub sync: Toggle,
    pub lock: Toggle,
    pub full_path: Toggle,
    pub conflict: Option<ConflictView>,
}

/// Build the render model.
pub fn render(state: &WidgetState) -> RenderModel {
    let config = &state.config;
    let busy = state.loading || state.conflict.is_some();
    let has_affordance = config.sync_feature || config.lock_feature;
    let unsplit = !has_affordance && (state.locked || state.synced);

    let parts = if unsplit {
        Split {
            readonly: state.value.clone(),
            editable: String::new(),
        }
    } else {
        split(state)
    };

    RenderModel {
        mode: state.mode,
        prefix: config.prefix.clone(),
        split: parts,
        unsplit,
        edit_buffer: match state.mode {
            Mode::Edit => state.edit_buffer.clone(),
            Mode::View => String::new(),
        },
        loading: state.loading,
        sync: Toggle {
            visible: config.sync_feature,
            enabled: config.sync_feature && !state.locked && !busy,
            on: state.synced,
        },
        lock: Toggle {
            visible: config.lock_feature,
            enabled: config.lock_feature && !state.synced && !busy,
            on: state.locked,
        },
        full_path: Toggle {
            visible: config.full_path_feature,
            enabled: config.full_path_feature && state.is_editable() && !busy,
            on: state.full_path_mode,
        },
        conflict: state.conflict.as_ref().map(|c| ConflictView {
            conflicting: c.conflicting.clone(),
            suggestion: c.suggestion.clone(),
        }),
    }
}
