//! Integration tests for the offline half of publishing: derive paths,
//! check what is on disk, and build the update payload.

use std::path::Path;

use assert_matches::assert_matches;
use shotver_core::entity::{Container, Entity, EntityKind, EntityLink, Project};
use shotver_core::error::CoreError;
use shotver_core::media_status::{check_frames, check_media};
use shotver_core::naming::version_code;
use shotver_core::paths::{derive_paths, MediaFlavor, MediaRoot, PathStyle};
use shotver_core::publish::{build_update, MediaUrlMap};
use shotver_core::version::Version;

fn project() -> Project {
    Project {
        id: 1,
        code: "P1".into(),
        name: "Proj".into(),
        short_code: "S0001".into(),
    }
}

fn shot() -> Entity {
    Entity {
        id: 10,
        code: "sh010".into(),
        kind: EntityKind::Shot,
        project: EntityLink::new("Project", 1),
        container: Container::Sequence {
            id: 3,
            name: "sc01".into(),
        },
    }
}

fn version() -> Version {
    Version {
        id: 100,
        code: version_code(&project(), &shot(), "Lighting", 1),
        entity: shot().link(),
        project: Some(project().link()),
        version_type: "Lighting".into(),
        increment: 1,
        first_frame: Some(1),
        last_frame: Some(5),
        frame_count: Some(5),
        description: Some("first pass".into()),
        user: Some(EntityLink::new("HumanUser", 37)),
        status: None,
        created_at: None,
    }
}

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
    std::fs::write(path, b"").expect("write file");
}

#[test]
fn frames_then_media_then_payload() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = MediaRoot::new(dir.path().to_string_lossy(), PathStyle::Posix);
    let urls = MediaUrlMap::new(root.clone(), "http://media.example");
    let version = version();
    let paths = derive_paths(&root, &project(), &shot(), &version);

    assert!(!check_frames(&paths, 1, 5));
    for frame in 1..=5 {
        touch(&paths.frame_path(frame));
    }
    assert!(check_frames(&paths, 1, 5));

    touch(&paths.movie_path);
    touch(&paths.mp4_path);
    let partial = check_media(&paths);
    assert_matches!(
        build_update(&version, &paths, &partial, &urls),
        Err(CoreError::IncompleteMedia { missing }) if missing == vec![MediaFlavor::Webm]
    );

    touch(&paths.webm_path);
    let status = check_media(&paths);
    assert!(status.is_complete());

    let payload = build_update(&version, &paths, &status, &urls).expect("payload");
    assert!(payload
        .sg_path_to_frames
        .ends_with("/frames/S0001_sc01_sh010_Lighting_001_0001.exr"));
    assert_eq!(
        payload.sg_uploaded_movie_webm.url.as_deref(),
        Some("http://media.example/P1_Proj/output/Shot/sc01/sh010/Lighting/001/preview/S0001_sc01_sh010_Lighting_001_SG.webm")
    );
}
