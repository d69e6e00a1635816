//! Naming, duration formatting and blob-key rules for saved projects.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum length of a project name, in characters.
pub const MAX_PROJECT_NAME_LEN: usize = 200;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("static regex"));

static NON_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9.-]").expect("static regex"));

/// Format a duration in seconds as `m:ss`.
///
/// Fractional seconds are floored. Negative, NaN and infinite inputs render
/// as `0:00`.
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Validate a project name for saving. Returns the trimmed name.
pub fn validate_project_name(name: &str) -> Result<&str, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Please enter a project name".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Project name must be at most {MAX_PROJECT_NAME_LEN} characters"
        )));
    }
    Ok(trimmed)
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    NON_ALNUM.replace_all(name, "_").into_owned()
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    NON_FILE_NAME.replace_all(name, "_").into_owned()
}

/// File name for a rendered project video: `{stem}_{ts}.mp4`.
pub fn final_video_file_name(project_name: &str, timestamp_ms: i64) -> String {
    format!("{}_{timestamp_ms}.mp4", sanitize_file_stem(project_name))
}

/// Blob key for a project's video.
pub fn video_key(owner: impl std::fmt::Display, timestamp_ms: i64, file_name: &str) -> String {
    format!(
        "videos/{owner}/{timestamp_ms}_{}",
        sanitize_file_name(file_name)
    )
}

/// Blob key for a project's thumbnail.
pub fn thumbnail_key(owner: impl std::fmt::Display, timestamp_ms: i64) -> String {
    format!("thumbnails/{owner}/{timestamp_ms}_thumbnail.jpg")
}

/// Blob key for an anchor frame uploaded ahead of an interpolation request.
pub fn frame_key(owner: impl std::fmt::Display, timestamp_ms: i64, label: &str) -> String {
    format!(
        "frames/{owner}/{timestamp_ms}_{}.jpg",
        sanitize_file_stem(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(5.9), "0:05");
        assert_eq!(format_duration(65.0), "1:05");
        assert_eq!(format_duration(600.0), "10:00");
        assert_eq!(format_duration(3725.4), "62:05");
    }

    #[test]
    fn odd_durations_render_zero() {
        assert_eq!(format_duration(-3.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
        assert_eq!(format_duration(f64::INFINITY), "0:00");
    }

    #[test]
    fn project_name_is_trimmed() {
        assert_eq!(validate_project_name("  Trip  ").unwrap(), "Trip");
    }

    #[test]
    fn blank_project_name_rejected() {
        assert!(validate_project_name("").is_err());
        assert!(validate_project_name("   \t").is_err());
    }

    #[test]
    fn overlong_project_name_rejected() {
        let name = "x".repeat(MAX_PROJECT_NAME_LEN + 1);
        assert!(validate_project_name(&name).is_err());
        let name = "x".repeat(MAX_PROJECT_NAME_LEN);
        assert!(validate_project_name(&name).is_ok());
    }

    #[test]
    fn stem_sanitizer_replaces_dots_and_spaces() {
        assert_eq!(sanitize_file_stem("My trip v1.2"), "My_trip_v1_2");
    }

    #[test]
    fn file_name_sanitizer_keeps_dots_and_dashes() {
        assert_eq!(sanitize_file_name("my clip-1.mp4"), "my_clip-1.mp4");
        assert_eq!(sanitize_file_name("../etc/passwd"), ".._etc_passwd");
    }

    #[test]
    fn key_layout() {
        assert_eq!(final_video_file_name("Beach day", 1700), "Beach_day_1700.mp4");
        assert_eq!(
            video_key(7, 1700, "Beach_day_1700.mp4"),
            "videos/7/1700_Beach_day_1700.mp4"
        );
        assert_eq!(thumbnail_key(7, 1700), "thumbnails/7/1700_thumbnail.jpg");
        assert_eq!(frame_key(7, 1700, "first_frame"), "frames/7/1700_first_frame.jpg");
    }
}
