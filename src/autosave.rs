/// Delay between the last edit and the save it triggers.
pub const SAVE_DEBOUNCE_MS: u32 = 2_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
}

/// Load/save lifecycle of the exercise form, one per page.
///
/// Each (week, group) navigation begins a load under a fresh generation
/// number; a completion whose generation has been superseded is discarded so
/// a slow response cannot overwrite a newer list. A finished load arms a
/// one-shot suppression: the reset it causes restarts the debounce timer
/// like any edit would, and the next timer firing consumes the suppression
/// instead of saving.
#[derive(Debug)]
pub struct FormLifecycle {
    state: LoadState,
    generation: u64,
    suppress_next_save: bool,
}

impl Default for FormLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl FormLifecycle {
    pub fn new() -> Self {
        Self { state: LoadState::Idle, generation: 0, suppress_next_save: false }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Starts a load and returns its generation number.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.state = LoadState::Loading;
        self.suppress_next_save = false;
        self.generation
    }

    /// Returns false when a newer load superseded this completion; the
    /// caller must then drop the response.
    pub fn finish_load(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.state = LoadState::Loaded;
        self.suppress_next_save = true;
        true
    }

    /// A failed load still unblocks the form; the caller keeps the
    /// last-known-good list.
    pub fn fail_load(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.state = LoadState::Loaded;
        true
    }

    /// Edits only arm the debounce timer once a load has settled.
    pub fn edit_arms_timer(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// Called when the debounce timer fires. Consumes the post-load
    /// suppression on its first firing after a load.
    pub fn save_due(&mut self) -> bool {
        if self.state != LoadState::Loaded {
            return false;
        }
        if self.suppress_next_save {
            self.suppress_next_save = false;
            return false;
        }
        true
    }
}
