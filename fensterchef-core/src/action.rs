//! The action list intermediate representation (spec.md §3 "Action List",
//! §4.E "Full action catalog").
//!
//! Grounded in `original_source/include/bits/actions.h` (the authoritative,
//! complete X-macro action catalog -- one variant per entry) and
//! `include/parse/data_type.h` (the `I`/`S`/`R`/`B`/`K` data-value kinds).
//! The C source represents an action list as a flat `items[]` + `data[]`
//! pair so it can live in a single heap allocation; that is a C
//! memory-layout concern, not a semantic one; the idiomatic Rust rendition
//! is a plain `Vec<Action>` where each item owns its data inline,
//! including nested `ActionList`s for `R`/`B`/`K` -- `#[derive(Clone)]`
//! gives the "recursively deep-copiable" requirement for free, and
//! `Vec::clear` gives "clearable".

/// An integer argument, sticky-percent per spec.md §4.E "Integer
/// expressions".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Int {
    pub value: i64,
    pub percent: bool,
}

impl Int {
    #[must_use]
    pub fn plain(value: i64) -> Self {
        Int { value, percent: false }
    }

    /// Resolves a (possibly percent) integer against `total`, per spec.md
    /// §4.E `move window by/to` "Percent integers are translated against
    /// the containing monitor's width/height".
    #[must_use]
    pub fn resolve(&self, total: u32) -> i64 {
        if self.percent {
            (self.value * i64::from(total)) / 100
        } else {
            self.value
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeyTarget {
    Keysym(u32),
    /// An explicit `[N]` keycode literal (spec.md §4.E grammar).
    Keycode(u8),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ButtonTarget {
    Index(u8),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub struct BindingFlags {
    pub is_release: bool,
    pub is_transparent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    pub instance_pattern: String,
    pub class_pattern: String,
    pub actions: ActionList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindingDef {
    pub modifiers: u32,
    pub key: KeyTarget,
    pub flags: BindingFlags,
    pub actions: ActionList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonBindingDef {
    pub modifiers: u32,
    pub button: ButtonTarget,
    pub flags: BindingFlags,
    pub actions: ActionList,
}

/// One entry of the authoritative action catalog
/// (`original_source/include/bits/actions.h`). Variant names mirror the
/// catalog's `X(IDENTIFIER, "template")` entries one-to-one.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Nop,
    Assign(Int),
    AssignWindow(Int),
    AutoEqualize(bool),
    AutoFillVoid(bool),
    AutoFindVoid(bool),
    AutoRemove(bool),
    AutoRemoveVoid(bool),
    AutoSplit(bool),
    Background(Int),
    BorderColorActive(Int),
    BorderColorCurrent(Int),
    BorderSizeCurrent(Int),
    BorderColorFocus(Int),
    BorderColor(Int),
    BorderSize(Int),
    Call(String),
    CenterWindow,
    CenterWindowTo(String),
    CloseWindow,
    CloseWindowI(Int),
    CursorHorizontal(String),
    CursorMoving(String),
    CursorRoot(String),
    CursorSizing(String),
    CursorVertical(String),
    DumpLayout(String),
    Empty,
    Equalize,
    ExchangeDown,
    ExchangeLeft,
    ExchangeRight,
    ExchangeUp,
    FocusChild,
    FocusChildI(Int),
    FocusDown,
    Focus,
    FocusI(Int),
    FocusLeaf,
    FocusLeft,
    FocusMonitor(String),
    FocusParent,
    FocusParentI(Int),
    FocusRight,
    FocusRoot,
    FocusRootS(String),
    FocusUp,
    FocusWindow,
    FocusWindowI(Int),
    Font(String),
    Foreground(Int),
    GapsInner(Int),
    GapsInnerII(Int, Int),
    GapsInnerIIII(Int, Int, Int, Int),
    GapsOuter(Int),
    GapsOuterII(Int, Int),
    GapsOuterIIII(Int, Int, Int, Int),
    HintSplitHorizontally,
    HintSplitVertically,
    Indicate,
    InitiateMove,
    InitiateResize,
    MinimizeWindow,
    MinimizeWindowI(Int),
    ModifiersIgnore(Int),
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveWindowBy(Int, Int),
    MoveWindowTo(Int, Int),
    NotificationDuration(Int),
    Overlap(Int),
    PopStash,
    Quit,
    ReloadConfiguration,
    Remove,
    RemoveI(Int),
    ResizeWindowBy(Int, Int),
    ResizeWindowTo(Int, Int),
    Run(String),
    SelectFocus,
    SelectPressed,
    SelectWindow(Int),
    SetDefaults,
    SetFloating,
    SetFullscreen,
    SetTiling,
    ShowList,
    ShowMessage(String),
    ShowNextWindow,
    ShowNextWindowI(Int),
    ShowPreviousWindow,
    ShowPreviousWindowI(Int),
    ShowRun(String),
    ShowWindow,
    ShowWindowI(Int),
    SplitHorizontally,
    SplitLeftHorizontally,
    SplitLeftVertically,
    SplitVertically,
    TextPadding(Int),
    ToggleFocus,
    ToggleFullscreen,
    ToggleTiling,

    // --- special-cased data-type-absorbing actions ---
    Relation(RelationDef),
    Unrelate,
    ButtonBinding(ButtonBindingDef),
    KeyBinding(KeyBindingDef),
    Ungroup(String),

    /// Not in the upstream catalog: the `unbind` top-level production
    /// has no standalone action counterpart there, but since this crate
    /// compiles *every* top-level statement (bindings included) to the
    /// same executable `ActionList` IR and runs it once at load time
    /// (see `config::parser`), `unbind` needs a runtime action to have
    /// any effect at all. Added for that reason; noted in DESIGN.md.
    UnbindKey { modifiers: u32, key: KeyTarget },
    UnbindButton { modifiers: u32, button: ButtonTarget },
}

/// The flat action-list IR (spec.md §3 "Action List").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionList(pub Vec<Action>);

impl ActionList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.0.push(action);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.0.iter()
    }
}

impl IntoIterator for ActionList {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
