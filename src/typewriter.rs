use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::schedule::Scheduler;

pub const CARET: char = '|';
pub const DEFAULT_CHAR_INTERVAL_MILLIS: u32 = 100;
pub const DEFAULT_DELETE_INTERVAL_MILLIS: u32 = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleEntry {
    pub text: String,
    pub hold_millis: u32,
}

impl CycleEntry {
    pub fn new(text: impl Into<String>, hold_millis: u32) -> Self {
        Self {
            text: text.into(),
            hold_millis,
        }
    }
}

/// Displayed prefix with its trailing caret, kept apart so the caret can be styled on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub prefix: String,
    pub caret: char,
}

impl Rendered {
    pub fn empty() -> Self {
        Self {
            prefix: String::new(),
            caret: CARET,
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.caret)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CyclerConfig {
    pub char_interval_millis: u32,
    pub delete_interval_millis: u32,
    /// Pause on the empty string before the next entry starts typing. Zero skips it.
    pub empty_hold_millis: u32,
}

impl CyclerConfig {
    pub fn with_char_interval(char_interval_millis: u32) -> Self {
        Self {
            char_interval_millis,
            ..Self::default()
        }
    }
}

impl Default for CyclerConfig {
    fn default() -> Self {
        Self {
            char_interval_millis: DEFAULT_CHAR_INTERVAL_MILLIS,
            delete_interval_millis: DEFAULT_DELETE_INTERVAL_MILLIS,
            empty_hold_millis: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Typing,
    HoldingFull,
    Deleting,
    HoldingEmpty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclerError {
    EmptyEntries,
}

impl fmt::Display for CyclerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEntries => f.write_str("text cycler needs at least one entry"),
        }
    }
}

impl std::error::Error for CyclerError {}

/// Typing/deleting state machine. Lengths count `char`s, not bytes.
#[derive(Clone, Debug)]
pub struct CyclerState {
    entries: Vec<CycleEntry>,
    lengths: Vec<usize>,
    config: CyclerConfig,
    cursor_index: usize,
    displayed_prefix_length: usize,
    phase: Phase,
}

impl CyclerState {
    pub fn new(entries: Vec<CycleEntry>, config: CyclerConfig) -> Result<Self, CyclerError> {
        if entries.is_empty() {
            return Err(CyclerError::EmptyEntries);
        }

        let lengths = entries
            .iter()
            .map(|entry| entry.text.chars().count())
            .collect();
        let mut state = Self {
            entries,
            lengths,
            config,
            cursor_index: 0,
            displayed_prefix_length: 0,
            phase: Phase::Typing,
        };
        state.start_typing();
        Ok(state)
    }

    pub fn cursor_index(&self) -> usize {
        self.cursor_index
    }

    pub fn displayed_prefix_length(&self) -> usize {
        self.displayed_prefix_length
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> &CycleEntry {
        &self.entries[self.cursor_index]
    }

    fn current_length(&self) -> usize {
        self.lengths[self.cursor_index]
    }

    pub fn displayed_text(&self) -> String {
        self.current()
            .text
            .chars()
            .take(self.displayed_prefix_length)
            .collect()
    }

    pub fn rendered(&self) -> Rendered {
        Rendered {
            prefix: self.displayed_text(),
            caret: CARET,
        }
    }

    /// Wait before the next call to [`CyclerState::step`].
    pub fn next_delay(&self) -> u32 {
        match self.phase {
            Phase::Typing => self.config.char_interval_millis,
            Phase::HoldingFull => self.current().hold_millis,
            Phase::Deleting => self.config.delete_interval_millis,
            Phase::HoldingEmpty => self.config.empty_hold_millis,
        }
    }

    pub fn step(&mut self) {
        match self.phase {
            Phase::Typing => {
                self.displayed_prefix_length =
                    (self.displayed_prefix_length + 1).min(self.current_length());
                if self.displayed_prefix_length == self.current_length() {
                    self.phase = Phase::HoldingFull;
                }
            }
            Phase::HoldingFull => {
                self.phase = Phase::Deleting;
            }
            Phase::Deleting => {
                self.displayed_prefix_length = self.displayed_prefix_length.saturating_sub(1);
                if self.displayed_prefix_length == 0 {
                    self.cursor_index = (self.cursor_index + 1) % self.entries.len();
                    if self.config.empty_hold_millis > 0 {
                        self.phase = Phase::HoldingEmpty;
                    } else {
                        self.start_typing();
                    }
                }
            }
            Phase::HoldingEmpty => self.start_typing(),
        }
    }

    fn start_typing(&mut self) {
        self.displayed_prefix_length = 0;
        self.phase = if self.current_length() == 0 {
            Phase::HoldingFull
        } else {
            Phase::Typing
        };
    }
}

struct CyclerCore<S: Scheduler> {
    state: RefCell<CyclerState>,
    pending: RefCell<Option<S::Task>>,
    scheduler: S,
    on_change: Box<dyn Fn(Rendered)>,
}

/// Timer-driven [`CyclerState`]. Owns exactly one pending timeout; dropping cancels it.
pub struct TextCycler<S: Scheduler> {
    core: Rc<CyclerCore<S>>,
}

impl<S: Scheduler> TextCycler<S> {
    pub fn create<F>(
        entries: Vec<CycleEntry>,
        config: CyclerConfig,
        scheduler: S,
        on_change: F,
    ) -> Result<Self, CyclerError>
    where
        F: Fn(Rendered) + 'static,
    {
        let state = CyclerState::new(entries, config)?;
        let core = Rc::new(CyclerCore {
            state: RefCell::new(state),
            pending: RefCell::new(None),
            scheduler,
            on_change: Box::new(on_change),
        });
        schedule_next(&core);

        Ok(Self { core })
    }

    pub fn displayed_text(&self) -> String {
        self.core.state.borrow().displayed_text()
    }

    pub fn snapshot(&self) -> CyclerState {
        self.core.state.borrow().clone()
    }

    pub fn destroy(self) {}
}

impl<S: Scheduler> Drop for TextCycler<S> {
    fn drop(&mut self) {
        let pending = self.core.pending.borrow_mut().take();
        drop(pending);
    }
}

fn schedule_next<S: Scheduler>(core: &Rc<CyclerCore<S>>) {
    let delay = core.state.borrow().next_delay();
    let weak: Weak<CyclerCore<S>> = Rc::downgrade(core);
    let task = core.scheduler.timeout(delay, move || {
        if let Some(core) = weak.upgrade() {
            fire(&core);
        }
    });

    let previous = core.pending.borrow_mut().replace(task);
    drop(previous);
}

fn fire<S: Scheduler>(core: &Rc<CyclerCore<S>>) {
    let (changed, rendered) = {
        let mut state = core.state.borrow_mut();
        let before = state.displayed_prefix_length();
        let index_before = state.cursor_index();
        state.step();
        (
            before != state.displayed_prefix_length() || index_before != state.cursor_index(),
            state.rendered(),
        )
    };

    if changed {
        (core.on_change)(rendered);
    }
    schedule_next(core);
}
