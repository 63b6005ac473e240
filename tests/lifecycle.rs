mod common;

use onireader::driver::memory::{Faults, MemoryDriver, Source};
use onireader::driver::Driver;
use onireader::{Error, QueryFailure, Registration, SensorKind, Session, StartConfig, State};

use common::{live, opened, recorded};

#[test]
fn close_is_idempotent() {
    let mut session = Session::new(MemoryDriver::new()).unwrap();
    session.close();
    session.close();
    assert_eq!(session.state(), State::Closed);

    let (mut session, driver) = opened("cam", live());
    session.close();
    session.close();
    assert_eq!(session.state(), State::Closed);
    assert!(!driver.probe("cam").unwrap().is_open());
}

#[test]
fn close_releases_everything() {
    let (mut session, driver) = opened("cam", live());
    let probe = driver.probe("cam").unwrap();

    session.start(None, None).unwrap();
    assert_eq!(probe.streams(), 2);
    assert_eq!(probe.active_streams(), 2);

    session.close();
    assert_eq!(probe.streams(), 0);
    assert_eq!(probe.active_streams(), 0);
    assert!(!probe.is_open());
    assert_eq!(session.frame_count(), -1);
}

#[test]
fn drop_releases_the_device() {
    let driver = MemoryDriver::new().with_device("cam", live());
    let probe = driver.probe("cam").unwrap();
    {
        let mut session = Session::new(driver.clone()).unwrap();
        session.open("cam").unwrap();
        session.start(None, None).unwrap();
        assert!(probe.is_open());
    }
    assert!(!probe.is_open());
    assert_eq!(probe.streams(), 0);

    // the device can be bound again
    let mut session = Session::new(driver).unwrap();
    session.open("cam").unwrap();
}

#[test]
fn restart_recreates_streams() {
    let (mut session, driver) = opened("cam", live());
    let probe = driver.probe("cam").unwrap();

    session.start(None, None).unwrap();
    session.start(Some(1), Some(1)).unwrap();
    assert_eq!(probe.streams(), 2);
    assert_eq!(probe.active_streams(), 2);
    assert_eq!(session.depth_mode().unwrap().width, 4);
    assert_eq!(session.color_mode().unwrap().width, 4);
}

#[test]
fn empty_uri_opens_any_device() {
    let driver = MemoryDriver::new()
        .with_device("first", live())
        .with_device("second", live());
    let mut session = Session::new(driver.clone()).unwrap();
    session.open("").unwrap();

    assert_eq!(session.uri(), None);
    assert_eq!(session.device_info().unwrap().uri, "first");
    assert!(driver.probe("first").unwrap().is_open());
}

#[test]
fn open_failures_leave_the_session_closed() {
    let driver = MemoryDriver::new().with_device("cam", live());
    let _holder = driver.open(Some("cam")).unwrap();

    let mut session = Session::new(driver).unwrap();
    match session.open("cam") {
        Err(Error::DeviceOpen { uri, .. }) => assert_eq!(uri, "cam"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
    assert_eq!(session.state(), State::Closed);

    assert!(matches!(
        session.open("missing"),
        Err(Error::DeviceOpen { .. })
    ));
}

#[test]
fn reopening_closes_the_previous_device() {
    let driver = MemoryDriver::new()
        .with_device("a", live())
        .with_device("b", live());
    let mut session = Session::new(driver.clone()).unwrap();

    session.open("a").unwrap();
    session.start(None, None).unwrap();
    session.open("b").unwrap();

    assert_eq!(session.state(), State::Opened);
    assert!(!driver.probe("a").unwrap().is_open());
    assert_eq!(driver.probe("a").unwrap().streams(), 0);
    assert!(driver.probe("b").unwrap().is_open());
}

#[test]
fn bad_mode_index_leaves_the_session_opened() {
    let (mut session, driver) = opened("cam", live());
    let probe = driver.probe("cam").unwrap();

    match session.start(Some(2), None) {
        Err(Error::ModeIndex {
            kind,
            index,
            available,
        }) => {
            assert_eq!(kind, SensorKind::Depth);
            assert_eq!(index, 2);
            assert_eq!(available, 2);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(session.state(), State::Opened);
    assert_eq!(probe.streams(), 0);

    session.start(Some(1), Some(0)).unwrap();
    assert_eq!(session.state(), State::Started);
}

#[test]
fn missing_sensor_fails_start() {
    let (mut session, driver) = opened("cam", live().without_color());

    assert!(matches!(
        session.start(None, None),
        Err(Error::Stream {
            kind: SensorKind::Color,
            ..
        })
    ));
    assert_eq!(session.state(), State::Opened);
    assert_eq!(driver.probe("cam").unwrap().streams(), 0);
}

#[test]
fn mode_listing_errors() {
    let session = Session::new(MemoryDriver::new()).unwrap();
    match session.depth_modes() {
        Err(Error::DeviceQuery { kind, reason }) => {
            assert_eq!(kind, SensorKind::Depth);
            assert_eq!(reason, QueryFailure::NotOpened);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let (session, _driver) = opened("cam", live().without_depth());
    match session.depth_modes() {
        Err(Error::DeviceQuery { reason, .. }) => assert_eq!(reason, QueryFailure::NoSensor),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(session.color_modes().unwrap().len(), 2);
}

#[test]
fn registration_follows_the_config() {
    let (mut session, driver) = opened("cam", live());
    let probe = driver.probe("cam").unwrap();

    session.start(None, None).unwrap();
    assert_eq!(probe.registration(), Registration::DepthToColor);

    session
        .start_with(&StartConfig::new().with_registration(Registration::Off))
        .unwrap();
    assert_eq!(probe.registration(), Registration::Off);
}

#[test]
fn metadata_requires_start() {
    let (mut session, _driver) = opened("cam", recorded(3, 3));
    assert!(matches!(session.depth_mode(), Err(Error::NotStarted)));
    assert!(matches!(session.max_depth(), Err(Error::NotStarted)));
    assert!(matches!(
        session.field_of_view(SensorKind::Color),
        Err(Error::NotStarted)
    ));
    assert_eq!(session.frame_count(), -1);
    assert!(!session.is_seekable());

    session.start(None, None).unwrap();
    assert_eq!(session.max_depth().unwrap(), 10_000);
    let fov = session.field_of_view(SensorKind::Depth).unwrap();
    assert!(fov.horizontal > fov.vertical);
}

#[test]
fn sessions_bind_separate_devices() {
    let driver = MemoryDriver::new();
    let sessions: Vec<_> = (0..4)
        .map(|i| {
            let uri = format!("cam{}", i);
            driver.add(&uri, Source::live());
            let mut session = Session::new(driver.clone()).unwrap();
            session.open(&uri).unwrap();
            session
        })
        .collect();

    assert!(sessions.iter().all(|s| s.state() == State::Opened));
    for i in 0..4 {
        let probe = driver.probe(&format!("cam{}", i)).unwrap();
        assert!(probe.is_open());
        assert_eq!(probe.open_count(), 1);
    }

    drop(sessions);
    assert!(!driver.probe("cam0").unwrap().is_open());
}

#[test]
fn registration_failure_fails_start() {
    let (mut session, driver) = opened("cam", live().fail(Faults::REGISTRATION));
    let probe = driver.probe("cam").unwrap();

    assert!(matches!(
        session.start(None, None),
        Err(Error::Registration(_))
    ));
    assert_eq!(session.state(), State::Opened);
    assert_eq!(probe.streams(), 0);
    assert_eq!(probe.registration(), Registration::Off);
}

#[test]
fn rejected_registration_off_is_ignored() {
    let (mut session, driver) = opened("cam", live().fail(Faults::REGISTRATION));

    session
        .start_with(&StartConfig::new().with_registration(Registration::Off))
        .unwrap();
    assert_eq!(session.state(), State::Started);
    assert_eq!(driver.probe("cam").unwrap().active_streams(), 2);
    assert!(!session.read_depth().unwrap().is_empty());
}

#[test]
fn playback_speed_failure_fails_start() {
    let (mut session, driver) = opened("rec.oni", recorded(5, 5).fail(Faults::PLAYBACK_SPEED));
    let probe = driver.probe("rec.oni").unwrap();

    assert!(matches!(session.start(None, None), Err(Error::Playback(_))));
    assert_eq!(session.state(), State::Opened);
    assert_eq!(session.frame_count(), -1);
    assert!(!session.is_seekable());
    assert_eq!(probe.streams(), 0);
    assert_eq!(probe.playback_speed(), None);
}

#[test]
fn teardown_failures_are_swallowed() {
    let faults = Faults::STREAM_STOP | Faults::DEVICE_CLOSE;
    let (mut session, driver) = opened("cam", live().fail(faults));
    let probe = driver.probe("cam").unwrap();

    session.start(None, None).unwrap();
    session.close();
    assert_eq!(session.state(), State::Closed);
    assert_eq!(session.frame_count(), -1);
    assert_eq!(probe.streams(), 0);
    assert_eq!(probe.active_streams(), 0);
    assert!(!probe.is_open());

    // dropping a started session goes through the same path
    session.open("cam").unwrap();
    session.start(None, None).unwrap();
    drop(session);
    assert!(!probe.is_open());
    assert_eq!(probe.streams(), 0);
}
