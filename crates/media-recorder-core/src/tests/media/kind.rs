use crate::{
    MediaKind, MediaProfile, RecordingContainer, SessionError, VideoRecordSettings, VideoRequest,
};

use std::str::FromStr;

/// WHAT: Every known kind name parses, including the legacy alias
/// WHY: Capability lookups are keyed by these names
#[test]
#[allow(clippy::unwrap_used)]
fn given_known_kind_names_when_parsing_then_kinds_returned() {
    // Given: The accepted names
    let cases = [
        ("audio", MediaKind::Audio),
        ("video", MediaKind::Video),
        ("multi", MediaKind::Multi),
        ("multiple", MediaKind::Multi),
        ("VIDEO", MediaKind::Video),
    ];

    // When/Then: Each parses to its kind
    for (name, expected) in cases {
        assert_eq!(MediaKind::from_str(name).unwrap(), expected);
    }
}

/// WHAT: Unknown kind names are a caller error
/// WHY: A typo must fail immediately instead of prompting for the wrong device
#[test]
fn given_unknown_kind_name_when_parsing_then_invalid_media_kind_requested() {
    // Given: A name that is not a media kind
    let name = "screen";

    // When: Parsing it
    let result = name.parse::<MediaKind>();

    // Then: InvalidMediaKindRequested carries the name
    assert!(matches!(
        result,
        Err(SessionError::InvalidMediaKindRequested { ref requested, .. }) if requested == "screen"
    ));
}

/// WHAT: Video capture pins the camera resolution and excludes audio
/// WHY: Recordings have a predictable frame size
#[test]
fn given_default_profile_when_building_video_constraints_then_exact_resolution() {
    // Given: The default profile
    let profile = MediaProfile::default();

    // When: Building capture constraints per kind
    let video = MediaKind::Video.capture_constraints(&profile);
    let audio = MediaKind::Audio.capture_constraints(&profile);
    let multi = MediaKind::Multi.capture_constraints(&profile);

    // Then: Video is exactly 640x480 without audio, audio has no video, multi takes both
    assert!(!video.audio);
    assert_eq!(
        video.video,
        VideoRequest::Exact {
            width: 640,
            height: 480
        }
    );
    assert!(audio.audio);
    assert_eq!(audio.video, VideoRequest::None);
    assert!(multi.audio);
    assert_eq!(multi.video, VideoRequest::Any);
}

/// WHAT: Recording options follow the kind and the profile
/// WHY: The encoder needs container and frame settings
#[test]
fn given_custom_profile_when_building_recording_options_then_settings_applied() {
    // Given: A profile with a custom frame size
    let profile = MediaProfile {
        video_width: 320,
        video_height: 240,
        video_frame_rate: 15,
        ..MediaProfile::default()
    };

    // When: Building recording options
    let audio = MediaKind::Audio.recording_options(&profile);
    let multi = MediaKind::Multi.recording_options(&profile);

    // Then: Audio has no video, multi records video with audio
    assert_eq!(audio.container, RecordingContainer::Audio);
    assert!(audio.video.is_none());
    assert_eq!(multi.container, RecordingContainer::Video);
    assert!(multi.include_audio);
    assert_eq!(
        multi.video,
        Some(VideoRecordSettings {
            width: 320,
            height: 240,
            frame_rate: 15
        })
    );
}

/// WHAT: Surface types map to kinds, case-insensitively
/// WHY: Surfaces are tagged by their element name
#[test]
fn given_surface_types_when_mapping_then_only_audio_and_video_supported() {
    // Given/When/Then: audio and video map, everything else is unsupported
    assert!(matches!(
        MediaKind::from_surface_type("Audio"),
        Ok(MediaKind::Audio)
    ));
    assert!(matches!(
        MediaKind::from_surface_type("video"),
        Ok(MediaKind::Video)
    ));
    assert!(matches!(
        MediaKind::from_surface_type("multi"),
        Err(SessionError::UnsupportedMediaKind { .. })
    ));
}
