//! Explicit state machine for one editing session.
//!
//! ```text
//! Empty -> VideoLoaded{duration} -> Extracting -> Ready -> Generating -> Ready
//!                                                       -> Saving     -> Ready
//! ```
//!
//! Network work never happens here. Long operations are split into
//! `begin_*` (validate, snapshot into a ticket, enter the busy phase) and
//! `complete_*` / [`EditorSession::abort`], so a failed round trip leaves the
//! storyboard exactly as it was.

use serde::Serialize;
use storysplice_core::project::validate_project_name;
use storysplice_core::storyboard::{Frame, ProvenanceRange, Selection, Storyboard};
use storysplice_core::types::DbId;
use storysplice_media::models::VideoUpload;
use uuid::Uuid;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Phase and actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditorPhase {
    Empty,
    /// A video is present; `duration` is known once the client reports it.
    VideoLoaded { duration: Option<f64> },
    Extracting,
    Ready,
    Generating,
    Saving,
}

impl EditorPhase {
    /// Whether a network round trip is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Extracting | Self::Generating | Self::Saving)
    }
}

/// Follow-up the caller must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    /// Video and duration are both known: run frame extraction now.
    RequestExtraction,
}

/// The video currently shown to the user.
///
/// The `id` is the handle clients fetch it by; replacing the video
/// invalidates the previous id.
#[derive(Debug, Clone)]
pub struct DisplayedVideo {
    pub id: Uuid,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl DisplayedVideo {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            bytes,
            content_type: content_type.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Snapshot needed to run extraction outside the session lock.
#[derive(Debug, Clone)]
pub struct ExtractionTicket {
    pub video: VideoUpload,
}

/// Snapshot needed to run one interpolation round trip.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub start: usize,
    pub end: usize,
    pub first_frame: Frame,
    pub last_frame: Frame,
    pub prompt: String,
}

/// Snapshot needed to render and persist the storyboard.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    /// Trimmed project name.
    pub name: String,
    pub frames: Vec<Frame>,
    pub duration_secs: Option<f64>,
}

/// Result of applying a finished generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationApplied {
    pub range: ProvenanceRange,
    pub total_frames: usize,
    /// Id of the video handle that was replaced and is no longer served.
    pub superseded_video: Option<Uuid>,
    pub video_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct EditorSession {
    id: Uuid,
    owner_id: DbId,
    phase: EditorPhase,
    storyboard: Storyboard,
    prompt: String,
    source: Option<VideoUpload>,
    duration: Option<f64>,
    video: Option<DisplayedVideo>,
}

impl EditorSession {
    pub fn new(id: Uuid, owner_id: DbId) -> Self {
        Self {
            id,
            owner_id,
            phase: EditorPhase::Empty,
            storyboard: Storyboard::new(),
            prompt: String::new(),
            source: None,
            duration: None,
            video: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> DbId {
        self.owner_id
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn storyboard(&self) -> &Storyboard {
        &self.storyboard
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn video_duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn displayed_video(&self) -> Option<&DisplayedVideo> {
        self.video.as_ref()
    }

    /// Accept a new source video. Drops the storyboard and any selection.
    pub fn load_video(
        &mut self,
        upload: VideoUpload,
        duration: Option<f64>,
    ) -> Result<EditorAction, PipelineError> {
        self.ensure_idle()?;
        if upload.bytes.is_empty() {
            return Err(PipelineError::Validation("Please upload a video first.".into()));
        }
        if let Some(secs) = duration {
            check_duration(secs)?;
        }

        self.storyboard.reset();
        let superseded =
            self.replace_video(DisplayedVideo::new(upload.bytes.clone(), upload.content_type.clone()));
        if let Some(old) = superseded {
            tracing::debug!(session_id = %self.id, video_id = %old, "Displayed video released");
        }
        self.source = Some(upload);
        self.duration = duration;
        self.phase = EditorPhase::VideoLoaded { duration };
        Ok(self.next_action())
    }

    /// Record the video duration once the client knows it.
    pub fn report_duration(&mut self, secs: f64) -> Result<EditorAction, PipelineError> {
        self.ensure_idle()?;
        if !matches!(self.phase, EditorPhase::VideoLoaded { .. }) {
            return Err(PipelineError::Validation(
                "No video is waiting for its duration.".into(),
            ));
        }
        check_duration(secs)?;
        self.duration = Some(secs);
        self.phase = EditorPhase::VideoLoaded {
            duration: Some(secs),
        };
        Ok(self.next_action())
    }

    fn next_action(&self) -> EditorAction {
        match self.phase {
            EditorPhase::VideoLoaded { duration: Some(_) } => EditorAction::RequestExtraction,
            _ => EditorAction::None,
        }
    }

    pub fn begin_extraction(&mut self) -> Result<ExtractionTicket, PipelineError> {
        self.ensure_idle()?;
        let video = match (&self.phase, &self.source) {
            (EditorPhase::VideoLoaded { .. }, Some(video)) => video.clone(),
            _ => return Err(PipelineError::Validation("Please upload a video first.".into())),
        };
        self.phase = EditorPhase::Extracting;
        Ok(ExtractionTicket { video })
    }

    /// Load extracted frames. Returns the storyboard length.
    pub fn complete_extraction(&mut self, frames: Vec<Frame>) -> Result<usize, PipelineError> {
        self.expect_phase(EditorPhase::Extracting)?;
        if let Err(e) = self.storyboard.load(frames) {
            self.abort();
            return Err(e.into());
        }
        self.phase = EditorPhase::Ready;
        Ok(self.storyboard.len())
    }

    pub fn toggle_select(&mut self, index: usize) -> Result<&Selection, PipelineError> {
        self.ensure_idle()?;
        Ok(self.storyboard.toggle_select(index)?)
    }

    pub fn clear_selection(&mut self) -> Result<(), PipelineError> {
        self.ensure_idle()?;
        self.storyboard.clear_selection();
        Ok(())
    }

    /// Validate a generation request and enter `Generating`.
    ///
    /// Checks, in order: nothing in flight, storyboard present, prompt
    /// non-empty, exactly two frames selected.
    pub fn begin_generation(&mut self, prompt: &str) -> Result<GenerationTicket, PipelineError> {
        if self.phase == EditorPhase::Generating {
            return Err(PipelineError::Conflict(
                "A generation is already in progress.".into(),
            ));
        }
        self.ensure_idle()?;
        if self.storyboard.is_empty() {
            return Err(PipelineError::Validation(
                "The storyboard is empty. Upload a video to extract frames first.".into(),
            ));
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PipelineError::Validation(
                "Please enter a prompt for generation.".into(),
            ));
        }
        let Some((start, end)) = self.storyboard.selected_pair() else {
            return Err(PipelineError::Validation(
                "Select exactly two frames from the storyboard.".into(),
            ));
        };
        let (Some(first), Some(last)) = (self.storyboard.frame(start), self.storyboard.frame(end))
        else {
            return Err(PipelineError::Internal("selection points past the storyboard".into()));
        };

        let ticket = GenerationTicket {
            start,
            end,
            first_frame: first.clone(),
            last_frame: last.clone(),
            prompt: prompt.to_string(),
        };
        self.prompt = ticket.prompt.clone();
        self.phase = EditorPhase::Generating;
        Ok(ticket)
    }

    /// Splice the generated frames and swap in the replacement video.
    pub fn complete_generation(
        &mut self,
        ticket: &GenerationTicket,
        frames: Vec<Frame>,
        video: Option<DisplayedVideo>,
    ) -> Result<GenerationApplied, PipelineError> {
        self.expect_phase(EditorPhase::Generating)?;
        let range = match self.storyboard.splice(ticket.start, ticket.end, frames) {
            Ok(range) => range,
            Err(e) => {
                self.abort();
                return Err(e.into());
            }
        };

        let video_id = video.as_ref().map(|v| v.id);
        let superseded_video = video.and_then(|v| self.replace_video(v));
        self.phase = EditorPhase::Ready;

        Ok(GenerationApplied {
            range,
            total_frames: self.storyboard.len(),
            superseded_video,
            video_id,
        })
    }

    /// Validate a save request and enter `Saving`.
    pub fn begin_save(&mut self, name: &str) -> Result<SaveTicket, PipelineError> {
        self.ensure_idle()?;
        let name = validate_project_name(name)?;
        if self.storyboard.is_empty() {
            return Err(PipelineError::Validation(
                "The storyboard is empty. Upload a video first.".into(),
            ));
        }
        let ticket = SaveTicket {
            name: name.to_string(),
            frames: self.storyboard.frames().to_vec(),
            duration_secs: self.duration,
        };
        self.phase = EditorPhase::Saving;
        Ok(ticket)
    }

    pub fn complete_save(&mut self) -> Result<(), PipelineError> {
        self.expect_phase(EditorPhase::Saving)?;
        self.phase = EditorPhase::Ready;
        Ok(())
    }

    /// Leave the busy phase without changing the storyboard.
    pub fn abort(&mut self) {
        self.phase = match self.phase {
            EditorPhase::Extracting => EditorPhase::VideoLoaded {
                duration: self.duration,
            },
            EditorPhase::Generating | EditorPhase::Saving => EditorPhase::Ready,
            other => other,
        };
    }

    /// Swap the displayed video, returning the id of the one it replaced.
    pub fn replace_video(&mut self, video: DisplayedVideo) -> Option<Uuid> {
        self.video.replace(video).map(|old| old.id)
    }

    fn ensure_idle(&self) -> Result<(), PipelineError> {
        if self.phase.is_busy() {
            return Err(PipelineError::Conflict(
                "Another operation is in progress for this session.".into(),
            ));
        }
        Ok(())
    }

    fn expect_phase(&self, expected: EditorPhase) -> Result<(), PipelineError> {
        if self.phase != expected {
            return Err(PipelineError::Internal(format!(
                "expected phase {expected:?}, session is {:?}",
                self.phase
            )));
        }
        Ok(())
    }
}

fn check_duration(secs: f64) -> Result<(), PipelineError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(PipelineError::Validation(format!(
            "Video duration must be a positive number of seconds, got {secs}."
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use assert_matches::assert_matches;

    fn upload() -> VideoUpload {
        VideoUpload {
            file_name: "in.mp4".into(),
            content_type: "video/mp4".into(),
            bytes: vec![1, 2, 3],
        }
    }

    fn frames(names: &[&str]) -> Vec<Frame> {
        names.iter().map(|n| Frame::from(*n)).collect()
    }

    fn ready_session() -> EditorSession {
        let mut session = EditorSession::new(Uuid::nil(), 7);
        session.load_video(upload(), Some(4.0)).unwrap();
        session.begin_extraction().unwrap();
        session
            .complete_extraction(frames(&["f0", "f1", "f2", "f3"]))
            .unwrap();
        session
    }

    #[test]
    fn video_with_duration_requests_extraction() {
        let mut session = EditorSession::new(Uuid::nil(), 1);
        let action = session.load_video(upload(), Some(3.5)).unwrap();
        assert_eq!(action, EditorAction::RequestExtraction);
        assert_eq!(
            session.phase(),
            EditorPhase::VideoLoaded {
                duration: Some(3.5)
            }
        );
    }

    #[test]
    fn extraction_waits_for_duration() {
        let mut session = EditorSession::new(Uuid::nil(), 1);
        assert_eq!(session.load_video(upload(), None).unwrap(), EditorAction::None);
        assert_eq!(
            session.report_duration(12.0).unwrap(),
            EditorAction::RequestExtraction
        );
        assert_eq!(session.video_duration(), Some(12.0));
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let mut session = EditorSession::new(Uuid::nil(), 1);
        session.load_video(upload(), None).unwrap();
        let err = session.report_duration(f64::NAN).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert!(session.report_duration(0.0).is_err());
    }

    #[test]
    fn empty_upload_is_rejected() {
        let mut session = EditorSession::new(Uuid::nil(), 1);
        let mut video = upload();
        video.bytes.clear();
        assert!(session.load_video(video, Some(1.0)).is_err());
        assert_eq!(session.phase(), EditorPhase::Empty);
    }

    #[test]
    fn extraction_completes_into_ready() {
        let session = ready_session();
        assert_eq!(session.phase(), EditorPhase::Ready);
        assert_eq!(session.storyboard().len(), 4);
    }

    #[test]
    fn empty_extraction_returns_to_video_loaded() {
        let mut session = EditorSession::new(Uuid::nil(), 1);
        session.load_video(upload(), Some(2.0)).unwrap();
        session.begin_extraction().unwrap();
        assert!(session.complete_extraction(vec![]).is_err());
        assert_eq!(
            session.phase(),
            EditorPhase::VideoLoaded {
                duration: Some(2.0)
            }
        );
    }

    #[test]
    fn generation_validation_order() {
        let mut empty = EditorSession::new(Uuid::nil(), 1);
        let err = empty.begin_generation("sunset").unwrap_err();
        assert!(err.user_message().contains("storyboard is empty"));

        let mut session = ready_session();
        let err = session.begin_generation("   ").unwrap_err();
        assert!(err.user_message().contains("prompt"));

        let err = session.begin_generation("sunset").unwrap_err();
        assert!(err.user_message().contains("two frames"));
        assert_eq!(session.phase(), EditorPhase::Ready);
    }

    #[test]
    fn second_generation_while_in_flight_conflicts() {
        let mut session = ready_session();
        session.toggle_select(1).unwrap();
        session.toggle_select(3).unwrap();

        let ticket = session.begin_generation("sunset").unwrap();
        assert_eq!((ticket.start, ticket.end), (1, 3));
        assert_eq!(ticket.first_frame.as_str(), "f1");
        assert_eq!(ticket.last_frame.as_str(), "f3");

        let err = session.begin_generation("again").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Conflict);
        assert_matches!(session.toggle_select(0), Err(PipelineError::Conflict(_)));
        assert!(session.load_video(upload(), Some(1.0)).is_err());
    }

    #[test]
    fn completed_generation_splices_and_swaps_video() {
        let mut session = ready_session();
        let original_video = session.displayed_video().unwrap().id;
        session.toggle_select(1).unwrap();
        session.toggle_select(3).unwrap();
        let ticket = session.begin_generation("sunset").unwrap();

        let replacement = DisplayedVideo::new(vec![9], "video/mp4");
        let replacement_id = replacement.id;
        let applied = session
            .complete_generation(&ticket, frames(&["a0", "a1"]), Some(replacement))
            .unwrap();

        assert_eq!(applied.range, ProvenanceRange::new(2, 2));
        assert_eq!(applied.total_frames, 5);
        assert_eq!(applied.superseded_video, Some(original_video));
        assert_eq!(applied.video_id, Some(replacement_id));
        assert_eq!(session.displayed_video().unwrap().id, replacement_id);
        assert!(session.storyboard().selection().is_empty());
        assert_eq!(session.prompt(), "sunset");
        assert_eq!(session.phase(), EditorPhase::Ready);
    }

    #[test]
    fn aborted_generation_leaves_storyboard_untouched() {
        let mut session = ready_session();
        session.toggle_select(0).unwrap();
        session.toggle_select(2).unwrap();
        session.begin_generation("x").unwrap();

        session.abort();

        assert_eq!(session.phase(), EditorPhase::Ready);
        assert_eq!(session.storyboard().len(), 4);
        assert_eq!(session.storyboard().selection().indices(), &[0, 2]);
        assert!(session.storyboard().provenance().is_empty());
    }

    #[test]
    fn save_validates_name_then_storyboard() {
        let mut empty = EditorSession::new(Uuid::nil(), 1);
        assert!(empty.begin_save("  ").unwrap_err().user_message().contains("name"));
        assert!(empty
            .begin_save("Trip")
            .unwrap_err()
            .user_message()
            .contains("storyboard is empty"));

        let mut session = ready_session();
        let ticket = session.begin_save("  Trip  ").unwrap();
        assert_eq!(ticket.name, "Trip");
        assert_eq!(ticket.frames.len(), 4);
        assert_eq!(ticket.duration_secs, Some(4.0));
        assert_eq!(session.phase(), EditorPhase::Saving);

        session.complete_save().unwrap();
        assert_eq!(session.phase(), EditorPhase::Ready);
    }

    #[test]
    fn new_video_resets_storyboard_and_releases_old_handle() {
        let mut session = ready_session();
        let first = session.displayed_video().unwrap().id;

        session.load_video(upload(), None).unwrap();

        assert!(session.storyboard().is_empty());
        assert_ne!(session.displayed_video().unwrap().id, first);
    }
}
