use crate::config::Tool;
use crate::session::messages::{EditorMsg, KeyPress};

/// Percentage points the zoom keys step by
pub const ZOOM_KEY_STEP: i32 = 10;

pub fn handle_key_event(key: &KeyPress) -> Option<EditorMsg> {
    // Typing into a text control never triggers shortcuts
    if key.editing_text {
        return None;
    }

    let k = key.key.as_str();
    match k {
        // Undo/redo shortcuts
        "z" | "Z" if key.command() && !key.shift => Some(EditorMsg::Undo),
        "z" | "Z" if key.command() && key.shift => Some(EditorMsg::Redo),
        "y" | "Y" if key.command() => Some(EditorMsg::Redo),
        // Everything below is a bare key
        _ if key.command() || key.alt => None,
        "+" | "=" => Some(EditorMsg::NudgeZoom(ZOOM_KEY_STEP)),
        "-" => Some(EditorMsg::NudgeZoom(-ZOOM_KEY_STEP)),
        _ => {
            let mut chars = k.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Tool::from_key(c).map(EditorMsg::SetTool),
                _ => None,
            }
        }
    }
}
