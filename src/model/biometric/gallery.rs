use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::identity::IdDigest;

use super::Metric;

/// A biometric fingerprint captured from an admitted voter.
///
/// Appended once per successful verification and never mutated; the only
/// removal path is the administrative override on the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Unique capture ID within the gallery.
    pub capture_id: u64,
    /// Pseudonymised owner identifier.
    pub owner: IdDigest,
    /// The feature vector.
    pub vector: Vec<f64>,
    pub captured_at: DateTime<Utc>,
    /// Hex SHA-256 of the raw sample bytes, when the sample was retained.
    pub sample_digest: Option<String>,
}

/// One line of the gallery journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GalleryEvent {
    Captured(Fingerprint),
    Deleted { capture_id: u64 },
}

/// The growing set of fingerprints from previously-admitted voters.
#[derive(Debug)]
pub struct Gallery {
    entries: Vec<Fingerprint>,
    next_capture_id: u64,
}

impl Gallery {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_capture_id: 1,
        }
    }

    /// Replay one journal event.
    pub fn apply(&mut self, event: GalleryEvent) {
        match event {
            GalleryEvent::Captured(fingerprint) => self.insert(fingerprint),
            GalleryEvent::Deleted { capture_id } => {
                self.remove(capture_id);
            }
        }
    }

    /// Allocate the next capture ID.
    pub fn next_capture_id(&mut self) -> u64 {
        let id = self.next_capture_id;
        self.next_capture_id += 1;
        id
    }

    pub fn insert(&mut self, fingerprint: Fingerprint) {
        self.next_capture_id = self.next_capture_id.max(fingerprint.capture_id + 1);
        self.entries.push(fingerprint);
    }

    /// Remove a capture by ID (administrative override only).
    pub fn remove(&mut self, capture_id: u64) -> Option<Fingerprint> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.capture_id == capture_id)?;
        Some(self.entries.remove(index))
    }

    /// Scan the gallery for the nearest entry to `query` and return it iff it
    /// clears the threshold.
    ///
    /// Entries whose dimensionality differs from the query are skipped, never
    /// compared. An empty gallery yields no match.
    pub fn find_match(
        &self,
        query: &[f64],
        metric: Metric,
        threshold: f64,
    ) -> Option<&Fingerprint> {
        let mut best: Option<(&Fingerprint, f64)> = None;
        for entry in &self.entries {
            if entry.vector.len() != query.len() {
                continue;
            }
            let score = metric.score(query, &entry.vector);
            match best {
                Some((_, best_score)) if !metric.closer(score, best_score) => {}
                _ => best = Some((entry, score)),
            }
        }
        best.and_then(|(entry, score)| metric.matches(score, threshold).then_some(entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::identity::Identifier;

    fn fingerprint(capture_id: u64, vector: Vec<f64>) -> Fingerprint {
        let identifier: Identifier = "123456789012".parse().unwrap();
        Fingerprint {
            capture_id,
            owner: IdDigest::new(&identifier, b"test-key"),
            vector,
            captured_at: Utc::now(),
            sample_digest: None,
        }
    }

    #[test]
    fn empty_gallery_has_no_match() {
        let gallery = Gallery::new();
        assert!(gallery
            .find_match(&[0.0, 0.0], Metric::Euclidean, 0.45)
            .is_none());
    }

    #[test]
    fn returns_nearest_not_first() {
        let mut gallery = Gallery::new();
        // Both entries are within the threshold; the second is nearer.
        gallery.insert(fingerprint(1, vec![0.25, 0.0]));
        gallery.insert(fingerprint(2, vec![0.125, 0.0]));

        let hit = gallery
            .find_match(&[0.0, 0.0], Metric::Euclidean, 0.5)
            .unwrap();
        assert_eq!(hit.capture_id, 2);
    }

    #[test]
    fn nearest_entry_must_still_clear_threshold() {
        let mut gallery = Gallery::new();
        gallery.insert(fingerprint(1, vec![3.0, 0.0]));
        assert!(gallery
            .find_match(&[0.0, 0.0], Metric::Euclidean, 0.5)
            .is_none());
    }

    #[test]
    fn mismatched_dimensionality_is_skipped() {
        let mut gallery = Gallery::new();
        gallery.insert(fingerprint(1, vec![0.0, 0.0, 0.0]));
        // Identical but three-dimensional; must not be compared at all.
        assert!(gallery
            .find_match(&[0.0, 0.0], Metric::Euclidean, 0.5)
            .is_none());
    }

    #[test]
    fn remove_and_capture_ids() {
        let mut gallery = Gallery::new();
        let a = gallery.next_capture_id();
        gallery.insert(fingerprint(a, vec![1.0]));
        let b = gallery.next_capture_id();
        gallery.insert(fingerprint(b, vec![2.0]));
        assert_eq!((a, b), (1, 2));
        assert_eq!(gallery.len(), 2);

        assert!(gallery.remove(a).is_some());
        assert!(gallery.remove(a).is_none());
        assert_eq!(gallery.len(), 1);
    }

    #[test]
    fn replay_restores_capture_id_sequence() {
        let mut gallery = Gallery::new();
        gallery.apply(GalleryEvent::Captured(fingerprint(7, vec![1.0])));
        gallery.apply(GalleryEvent::Deleted { capture_id: 7 });
        assert!(gallery.is_empty());
        // IDs keep counting past the highest replayed capture.
        assert_eq!(gallery.next_capture_id(), 8);
    }
}
