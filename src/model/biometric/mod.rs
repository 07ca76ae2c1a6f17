//! Biometric fingerprinting and duplicate detection.
//!
//! A raw captured sample (opaque bytes) is reduced to a fixed-dimensionality
//! feature vector; the gallery holds one vector per admitted voter and is
//! scanned for near-matches before a new voter is admitted.

mod fingerprint;
mod gallery;
mod metric;

pub use fingerprint::extract;
pub use gallery::{Fingerprint, Gallery, GalleryEvent};
pub use metric::Metric;
