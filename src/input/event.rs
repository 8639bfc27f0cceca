/// Application-level events (commands/actions)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    // App control
    Quit,

    // Focus control
    FocusFileTree,
    FocusEditor,
    FocusTerminal,
    CycleFocusForward,
    CycleFocusBackward,

    // Panels
    ToggleSidebar,
    ToggleTerminal,
    OpenPalette,
    OpenSettings,
    DarkMode,
    LightMode,

    // Editor toolbar
    NewFile,
    NewScratch,
    Save,
    SaveProject,
    Run,
    CopyCode,
    Download,
    Format,
    CloseTab,

    // Terminal header
    CopyTerminal,
    ClearTerminal,

    // Navigation
    NextTab,
    PreviousTab,
}
