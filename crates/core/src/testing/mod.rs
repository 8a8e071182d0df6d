//! Testing utilities and mock implementations.
//!
//! Mocks for the provider and synchronizer traits, so the orchestrator and
//! the HTTP layer can be exercised without network access or ffsubsync.
//!
//! # Example
//!
//! ```rust,ignore
//! use legenda_core::testing::{fixtures, MockCandidate, MockProvider, MockSynchronizer};
//!
//! let provider = MockProvider::new("podnapisi");
//! provider.set_candidates(vec![
//!     MockCandidate::new("en-1", LanguageTag::english()),
//! ]).await;
//!
//! let synchronizer = MockSynchronizer::skipping(SyncSkipReason::Disabled);
//! let movie_dir = fixtures::create_title_dir(library.path(), "101");
//! ```

mod mock_provider;
mod mock_synchronizer;

pub use mock_provider::{MockCandidate, MockProvider, RecordedSearch};
pub use mock_synchronizer::{MockSynchronizer, RecordedSync};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use serde_json::json;

    use crate::metadata::{MovieInfo, METADATA_FILE};

    /// Media file name written by [`create_title_dir`].
    pub const VIDEO_FILE: &str = "movie.mp4";

    /// Two-cue SubRip document with `text` as the first cue.
    pub fn srt_content(text: &str) -> Vec<u8> {
        format!(
            "1\r\n00:00:01,000 --> 00:00:03,500\r\n{}\r\n\r\n2\r\n00:01:02,250 --> 00:01:04,000\r\nSecond line\r\n\r\n",
            text
        )
        .into_bytes()
    }

    /// Movie info matching the document written by [`create_title_dir`].
    pub fn movie_info(id: &str) -> MovieInfo {
        MovieInfo::new(id, "Cidade de Deus")
            .with_original_title("City of God")
            .with_year(2002)
            .with_video_file(VIDEO_FILE)
    }

    /// Metadata document for [`movie_info`], with a field owned by another
    /// component.
    pub fn metadata_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": "Cidade de Deus",
            "original_title": "City of God",
            "year": 2002,
            "video_file": VIDEO_FILE,
            "overview": "Two boys grow up in a violent neighborhood of Rio de Janeiro.",
        })
    }

    /// Create `<root>/<id>/` holding a media file and `metadata.json`.
    ///
    /// # Panics
    ///
    /// Panics if the files cannot be written.
    pub fn create_title_dir(root: &Path, id: &str) -> PathBuf {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).expect("create title dir");
        std::fs::write(dir.join(VIDEO_FILE), b"not really a video").expect("write media");
        let document = serde_json::to_vec_pretty(&metadata_json(id)).expect("serialize metadata");
        std::fs::write(dir.join(METADATA_FILE), document).expect("write metadata");
        dir
    }
}
