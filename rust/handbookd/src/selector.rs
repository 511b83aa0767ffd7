use serde::Serialize;

pub const SECTION_COUNT: u8 = 20;

const ROMAN: [&str; SECTION_COUNT as usize] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV",
    "XV", "XVI", "XVII", "XVIII", "XIX", "XX",
];

/// A handbook section number, always in `1..=20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SectionId(u8);

impl SectionId {
    pub const FIRST: SectionId = SectionId(1);

    pub fn new(n: i64) -> Option<Self> {
        if (1..=SECTION_COUNT as i64).contains(&n) {
            Some(Self(n as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn roman(self) -> &'static str {
        ROMAN[self.index()]
    }

    pub fn all() -> impl Iterator<Item = SectionId> {
        (1..=SECTION_COUNT).map(SectionId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: SectionId,
    pub to: SectionId,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Runs after every selection, including re-selecting the active section.
pub trait SelectHook {
    fn after_select(&mut self, transition: &Transition);
}

#[derive(Debug, Clone)]
pub struct SectionSelector {
    current: SectionId,
}

impl Default for SectionSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionSelector {
    pub fn new() -> Self {
        Self {
            current: SectionId::FIRST,
        }
    }

    pub fn current(&self) -> SectionId {
        self.current
    }

    /// Applies unconditionally; there is no diffing against the current value.
    pub fn select(&mut self, to: SectionId, hook: &mut dyn SelectHook) -> Transition {
        let transition = Transition {
            from: self.current,
            to,
        };
        self.current = to;
        tracing::debug!(from = transition.from.get(), to = to.get(), "section selected");
        hook.after_select(&transition);
        transition
    }
}

/// Scroll state of the content pane.
#[derive(Debug, Clone, Default)]
pub struct ContentPane {
    offset: u32,
    resets: u64,
    reset_on_reselect: bool,
    pending_reset: bool,
}

impl ContentPane {
    pub fn new(reset_on_reselect: bool) -> Self {
        Self {
            reset_on_reselect,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn resets(&self) -> u64 {
        self.resets
    }

    pub fn scroll_to(&mut self, offset: u32) {
        self.offset = offset;
    }

    /// True once per reset, then false until the next one.
    pub fn take_pending_reset(&mut self) -> bool {
        std::mem::take(&mut self.pending_reset)
    }
}

impl SelectHook for ContentPane {
    fn after_select(&mut self, transition: &Transition) {
        if !transition.changed() && !self.reset_on_reselect {
            return;
        }
        self.offset = 0;
        self.resets += 1;
        self.pending_reset = true;
    }
}
