//! Playback exclusivity — at most one audio element plays at a time.
//!
//! The controller holds a single slot. When an element reports that it started
//! playing, whichever *other* element held the slot is paused and rewound to
//! the start, then the new element takes the slot. There is no registry of
//! elements; exclusivity falls out of the start events alone.

/// Stable identity of an audio element, independent of where it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// Anything the controller can silence.
///
/// Methods take `&self` because real elements are handles (a rodio sink, a
/// DOM node) whose state lives elsewhere.
pub trait AudioElement {
    fn element_id(&self) -> ElementId;
    fn pause(&self);
    /// Reset playback position to the beginning.
    fn rewind(&self);
}

/// The active audio handle.
#[derive(Debug)]
pub struct PlaybackExclusivity<E> {
    active: Option<E>,
}

impl<E> Default for PlaybackExclusivity<E> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<E: AudioElement> PlaybackExclusivity<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Playback-start hook. Returns the id of the element that was silenced,
    /// if any.
    pub fn on_play(&mut self, started: E) -> Option<ElementId> {
        let silenced = match self.active.take() {
            Some(prev) if prev.element_id() != started.element_id() => {
                prev.pause();
                prev.rewind();
                Some(prev.element_id())
            }
            _ => None,
        };
        self.active = Some(started);
        silenced
    }

    /// Pause and rewind the holder, then clear the slot.
    pub fn reset(&mut self) -> Option<ElementId> {
        let prev = self.active.take()?;
        prev.pause();
        prev.rewind();
        Some(prev.element_id())
    }

    pub fn active(&self) -> Option<&E> {
        self.active.as_ref()
    }

    pub fn active_id(&self) -> Option<ElementId> {
        self.active.as_ref().map(AudioElement::element_id)
    }
}
