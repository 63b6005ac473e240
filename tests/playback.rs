mod common;

use onireader::{Error, PlaybackSpeed, SensorKind, StartConfig};

use common::{live, opened, recorded};

#[test]
fn frame_count_is_the_longer_stream() {
    let (mut session, _driver) = opened("rec.oni", recorded(120, 100));
    session.start(None, None).unwrap();
    assert_eq!(session.frame_count(), 120);
    assert!(session.is_seekable());

    let (mut session, _driver) = opened("rec.oni", recorded(80, 100));
    session.start(None, None).unwrap();
    assert_eq!(session.frame_count(), 100);
}

#[test]
fn live_sources_cannot_seek() {
    let (mut session, _driver) = opened("cam", live());
    session.start(None, None).unwrap();

    assert_eq!(session.frame_count(), -1);
    assert!(!session.is_seekable());
    for &index in [0, 10, -1].iter() {
        assert!(matches!(session.seek(index), Err(Error::SeekUnsupported)));
    }
}

#[test]
fn seek_moves_both_streams() {
    let (mut session, _driver) = opened("rec.oni", recorded(100, 100));
    session.start(None, None).unwrap();

    session.seek(50).unwrap();
    let color = session.read_color().unwrap();
    assert!(color.frame_index() >= 50);
    assert_eq!(color.frame_index(), 50);
    assert_eq!(session.read_depth().unwrap().frame_index(), 50);

    // seeking backwards
    session.seek(3).unwrap();
    let (depth, color) = session.read_pair().unwrap();
    assert_eq!(depth.frame_index(), 3);
    assert_eq!(color.frame_index(), 3);
}

#[test]
fn seek_rejects_indices_outside_the_recording() {
    let (mut session, _driver) = opened("rec.oni", recorded(100, 100));
    session.start(None, None).unwrap();

    for &index in [-1, 100, 200].iter() {
        match session.seek(index) {
            Err(Error::SeekOutOfRange { index: i, count }) => {
                assert_eq!(i, index);
                assert_eq!(count, 100);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    // the session is still usable
    session.seek(99).unwrap();
    assert_eq!(session.read_depth().unwrap().frame_index(), 99);
}

#[test]
fn seek_past_the_shorter_stream_moves_neither_stream() {
    let (mut session, _driver) = opened("rec.oni", recorded(120, 100));
    session.start(None, None).unwrap();
    session.read_pair().unwrap();

    match session.seek(110) {
        Err(e @ Error::Seek { .. }) => {
            assert!(e.is_recoverable());
            assert!(matches!(
                e,
                Error::Seek {
                    kind: SensorKind::Color,
                    ..
                }
            ));
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // both streams carry on from where they were
    let (depth, color) = session.read_pair().unwrap();
    assert_eq!(depth.frame_index(), 1);
    assert_eq!(color.frame_index(), 1);

    // indices held by both streams still work
    session.seek(99).unwrap();
    let (depth, color) = session.read_pair().unwrap();
    assert_eq!(depth.frame_index(), 99);
    assert_eq!(color.frame_index(), 99);
}

#[test]
fn recording_end_yields_sentinels() {
    let (mut session, _driver) = opened("rec.oni", recorded(2, 2));
    session.start(None, None).unwrap();

    assert!(!session.read_depth().unwrap().is_empty());
    assert!(!session.read_depth().unwrap().is_empty());

    let end = session.read_depth().unwrap();
    assert!(end.is_empty());
    assert_eq!(end.timestamp(), -1);
    assert_eq!(end.frame_index(), -1);
    assert!(end.data().is_empty());
}

#[test]
fn playback_speed_is_applied_at_start() {
    let (mut session, driver) = opened("rec.oni", recorded(5, 5));
    let probe = driver.probe("rec.oni").unwrap();

    session.start(None, None).unwrap();
    assert_eq!(probe.playback_speed(), Some(-1.0));

    session
        .start_with(&StartConfig::new().with_playback_speed(PlaybackSpeed::Fastest))
        .unwrap();
    assert_eq!(probe.playback_speed(), Some(0.0));
}

#[test]
fn live_sources_ignore_playback_speed() {
    let (mut session, driver) = opened("cam", live());
    session
        .start_with(&StartConfig::new().with_playback_speed(PlaybackSpeed::Ratio(2.0)))
        .unwrap();
    assert_eq!(driver.probe("cam").unwrap().playback_speed(), None);
}

#[test]
fn seek_requires_start() {
    let (mut session, _driver) = opened("rec.oni", recorded(5, 5));
    assert!(matches!(session.seek(0), Err(Error::NotStarted)));
}
