use serde::{Deserialize, Serialize};

use crate::{AudioTrack, Clip};

/// Complete state of both lanes at one point in the edit history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub clips: Vec<Clip>,
    pub audio_tracks: Vec<AudioTrack>,
}

impl Snapshot {
    pub fn new(clips: Vec<Clip>, audio_tracks: Vec<AudioTrack>) -> Self {
        Self { clips, audio_tracks }
    }
}

/// Linear undo/redo log of whole snapshots.
///
/// Always holds at least one snapshot; `index` points at the one currently
/// shown. Pushing after an undo drops everything past `index`.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    snapshots: Vec<Snapshot>,
    index: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl HistoryBuffer {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        self.index = self.snapshots.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.snapshots.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Rewrite every stored snapshot in place without adding an entry.
    pub fn amend_all(&mut self, mut f: impl FnMut(&mut Snapshot)) {
        for snapshot in &mut self.snapshots {
            f(snapshot);
        }
    }

    pub fn clear(&mut self, initial: Snapshot) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(ends: &[f64]) -> Snapshot {
        let clips = ends
            .iter()
            .map(|&end| Clip::new("c", 0.0, end, None).unwrap())
            .collect();
        Snapshot::new(clips, Vec::new())
    }

    #[test]
    fn starts_with_single_snapshot() {
        let h = HistoryBuffer::default();
        assert_eq!(h.len(), 1);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert_eq!(h.current(), &Snapshot::default());
    }

    #[test]
    fn push_then_undo_restores_previous() {
        let a = snap(&[5.0]);
        let b = snap(&[5.0, 7.0]);
        let mut h = HistoryBuffer::new(a.clone());
        h.push(b.clone());
        assert_eq!(h.undo(), Some(&a));
        assert_eq!(h.redo(), Some(&b));
    }

    #[test]
    fn undo_and_redo_stop_at_the_ends() {
        let mut h = HistoryBuffer::default();
        assert_eq!(h.undo(), None);
        h.push(snap(&[1.0]));
        assert_eq!(h.redo(), None);
        assert!(h.undo().is_some());
        assert_eq!(h.undo(), None);
        assert_eq!(h.index(), 0);
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut h = HistoryBuffer::default();
        h.push(snap(&[1.0]));
        h.push(snap(&[2.0]));
        h.push(snap(&[3.0]));
        h.undo();
        h.undo();
        assert!(h.can_redo());

        let fresh = snap(&[9.0]);
        h.push(fresh.clone());
        assert!(!h.can_redo());
        assert_eq!(h.len(), 3);
        assert_eq!(h.current(), &fresh);
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn amend_keeps_position() {
        let mut h = HistoryBuffer::default();
        h.push(snap(&[0.0]));
        h.amend_all(|s| s.clips.iter_mut().for_each(|c| c.end = 8.0));
        assert_eq!(h.len(), 2);
        assert_eq!(h.index(), 1);
        assert_eq!(h.current().clips[0].end, 8.0);
    }

    #[test]
    fn clear_resets_to_one_entry() {
        let mut h = HistoryBuffer::default();
        h.push(snap(&[1.0]));
        h.clear(snap(&[4.0]));
        assert_eq!(h.len(), 1);
        assert_eq!(h.index(), 0);
        assert_eq!(h.current().clips[0].end, 4.0);
    }
}
