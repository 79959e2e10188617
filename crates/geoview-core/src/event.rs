#![forbid(unsafe_code)]

//! Canonical display-engine event types.
//!
//! The rendering engine reports a stream of low-level notifications. This
//! module normalizes them into a single [`EngineEvent`] enum that view
//! coordinators reconcile into UI state.
//!
//! # Design Notes
//!
//! - Pointer events carry only the button; positions belong to the engine
//! - Busy/idle arrive from arbitrary engine threads and may be unbalanced
//! - `Modifiers` use bitflags for easy combination

use bitflags::bitflags;

/// Low-level event emitted by a display engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A pointer button went down over the scene.
    PointerDown(PointerButton),

    /// A pointer button was released.
    PointerUp(PointerButton),

    /// The pointer moved over the scene without a button held.
    PointerMoved,

    /// The engine finished rendering a frame.
    FrameRendered,

    /// The engine started a unit of background work.
    BusyBegin,

    /// The engine finished a unit of background work.
    BusyIdle,

    /// The component hosting the scene changed size.
    ComponentResized {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },

    /// A key was pressed while the scene had focus.
    Key(KeyEvent),
}

impl EngineEvent {
    /// Shorthand for a key press without modifiers.
    #[must_use]
    pub const fn key(code: KeyCode) -> Self {
        Self::Key(KeyEvent::new(code))
    }
}

/// Pointer button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,
    /// Modifier keys held during the press.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a new key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Set the modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this is a plain function-key press.
    #[must_use]
    pub fn is_plain_function(&self, n: u8) -> bool {
        self.code == KeyCode::F(n) && self.modifiers.is_empty()
    }
}

/// Key codes the coordinator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    /// Function key (F1-F24).
    F(u8),
    Escape,
    Enter,
    Up,
    Down,
    Left,
    Right,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}
