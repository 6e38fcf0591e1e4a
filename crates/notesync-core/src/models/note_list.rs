//! Ordered note list, newest-created first.

use std::collections::HashSet;

use super::{Note, NoteId};

/// Ordered, id-unique sequence of notes.
///
/// Every operation returns a new list; the controller swaps it in only after
/// the snapshot write succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteList {
    notes: Vec<Note>,
}

impl NoteList {
    #[must_use]
    pub const fn new() -> Self {
        Self { notes: Vec::new() }
    }

    /// Build a list from an external source, keeping the first occurrence of
    /// each id.
    #[must_use]
    pub fn from_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let mut seen = HashSet::new();
        let notes = notes
            .into_iter()
            .filter(|note| {
                let fresh = seen.insert(note.id.clone());
                if !fresh {
                    tracing::debug!("Dropping duplicate note id {}", note.id);
                }
                fresh
            })
            .collect();
        Self { notes }
    }

    /// Prepend a note. The caller guarantees the id is not already present.
    #[must_use]
    pub fn created(&self, note: Note) -> Self {
        debug_assert!(!self.contains(&note.id));
        let mut notes = Vec::with_capacity(self.notes.len() + 1);
        notes.push(note);
        notes.extend(self.notes.iter().cloned());
        Self { notes }
    }

    /// Replace the text of the matching note. `None` when the id is absent.
    #[must_use]
    pub fn edited(&self, id: &NoteId, text: &str) -> Option<Self> {
        let index = self.position(id)?;
        let mut notes = self.notes.clone();
        notes[index].text = text.to_string();
        Some(Self { notes })
    }

    /// Remove the matching note. `None` when the id is absent.
    #[must_use]
    pub fn deleted(&self, id: &NoteId) -> Option<Self> {
        self.position(id)?;
        let notes = self
            .notes
            .iter()
            .filter(|note| &note.id != id)
            .cloned()
            .collect();
        Some(Self { notes })
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn position(&self, id: &NoteId) -> Option<usize> {
        self.notes.iter().position(|note| &note.id == id)
    }
}

impl<'a> IntoIterator for &'a NoteList {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> NoteList {
        NoteList::from_notes(vec![
            Note::new("b", "second"),
            Note::new("a", "first"),
        ])
    }

    #[test]
    fn created_prepends_and_keeps_tail() {
        let list = sample();
        let next = list.created(Note::new("c", "New note"));
        assert_eq!(next.len(), list.len() + 1);
        assert_eq!(next.as_slice()[0], Note::new("c", "New note"));
        assert_eq!(&next.as_slice()[1..], list.as_slice());
    }

    #[test]
    fn edited_changes_only_matching_text() {
        let list = sample();
        let next = list.edited(&NoteId::new("a"), "changed").unwrap();
        assert_eq!(
            next.as_slice(),
            &[Note::new("b", "second"), Note::new("a", "changed")]
        );
    }

    #[test]
    fn edited_missing_id_is_none() {
        assert!(sample().edited(&NoteId::new("zzz"), "x").is_none());
    }

    #[test]
    fn deleted_removes_matching_note() {
        let next = sample().deleted(&NoteId::new("b")).unwrap();
        assert_eq!(next.as_slice(), &[Note::new("a", "first")]);
    }

    #[test]
    fn deleted_missing_id_is_none() {
        assert!(sample().deleted(&NoteId::new("zzz")).is_none());
    }

    #[test]
    fn from_notes_drops_later_duplicates() {
        let list = NoteList::from_notes(vec![
            Note::new("a", "kept"),
            Note::new("b", "other"),
            Note::new("a", "dropped"),
        ]);
        assert_eq!(
            list.as_slice(),
            &[Note::new("a", "kept"), Note::new("b", "other")]
        );
    }
}
