//! Action enum — all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Player,
    Chat,
    LogPanel,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePlay,
    ToggleMute,

    // ── Chat ─────────────────────────────────────────────────────────────────
    /// Submit a prompt to the companion.  Blank text is dropped upstream.
    SendChat(String),
    /// Copy the most recent companion reply to the clipboard.
    CopyLastReply,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPane(ComponentId),

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleLogs,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
