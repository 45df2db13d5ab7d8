//! End-to-end tests against the simulated engine.
//!
//! These tests verify the full connect -> configure -> poll -> render ->
//! disconnect lifecycle through the public API, with the simulation
//! feeding frames and faults from a second thread while the poll loop
//! runs on the first.

use std::thread;
use std::time::Duration;

use picop::{
    ChannelRenderer, Color, ConnectionInfo, DataChannel, DrawCommand, Engine, EngineBackend,
    FramePoller, PollExit, PollerConfig, Point, RenderTarget, ResultCode, SensingState, SimBackend,
    UsbInfo, ValueStorage,
};

fn usb_info() -> ConnectionInfo {
    ConnectionInfo::Usb(UsbInfo {
        product_id: 4,
        serial_number: "PHX-0042".to_string(),
    })
}

fn fast_config() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_millis(5),
        fast_interval: Duration::from_millis(1),
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_full_lifecycle() {
    init_logging();
    let sim = SimBackend::new();
    sim.push_synthetic_frame();
    let mut engine = Engine::connect(Box::new(sim.clone()), usb_info()).expect("connect");

    // Identity comes back from the connection parameters
    let info = engine.system_info().expect("system info");
    assert_eq!(info.serial_number, "PHX-0042");

    // Configure sensing, committed so it survives a restart
    engine
        .set_sensing_state(SensingState::Enabled, true)
        .expect("enable sensing");
    assert_eq!(
        engine.sensing_state(ValueStorage::Startup).expect("get"),
        SensingState::Enabled
    );

    let geometry = engine.frame_dimensions().expect("dimensions");
    let renderer = ChannelRenderer::for_geometry(geometry).expect("renderer");

    let mut poller = FramePoller::with_config(engine, fast_config());
    let control = poller.control();

    let mut frames = 0u32;
    let exit = poller
        .run(
            |frame| {
                renderer.render(&frame, DataChannel::Time).expect("render");
                frames += 1;
                control.stop();
            },
            |err| panic!("unexpected poll error: {}", err),
        )
        .expect("run");

    assert_eq!(exit, PollExit::Stopped);
    assert_eq!(frames, 1);

    poller.into_engine().close().expect("close");
    assert!(!sim.is_connected());
}

#[test]
fn test_poll_render_stop() {
    init_logging();
    let sim = SimBackend::new();
    let engine = Engine::connect(Box::new(sim.clone()), usb_info()).expect("connect");
    let geometry = sim.geometry();
    let renderer = ChannelRenderer::for_geometry(geometry).expect("renderer");

    let mut poller = FramePoller::with_config(engine, fast_config());
    let control = poller.control();

    let feeder_sim = sim.clone();
    let feeder = thread::spawn(move || {
        for _ in 0..3 {
            feeder_sim.push_synthetic_frame();
            thread::sleep(Duration::from_millis(3));
        }
    });

    let mut rendered = 0u32;
    let exit = poller
        .run(
            |frame| {
                let image = renderer.render(&frame, DataChannel::Time).expect("render");
                assert_eq!(image.width(), 520);
                assert_eq!(image.height(), 200);
                rendered += 1;
                if rendered == 2 {
                    control.stop();
                }
            },
            |err| panic!("unexpected poll error: {}", err),
        )
        .expect("run");

    feeder.join().expect("feeder thread");
    assert_eq!(exit, PollExit::Stopped);
    assert!(rendered >= 2);
}

#[test]
fn test_backlog_is_drained_to_freshest_frame() {
    init_logging();
    let sim = SimBackend::new();
    let len = sim.geometry().frame_len();
    for marker in 1..=5u32 {
        let mut samples = vec![0u32; len];
        samples[0] = marker;
        sim.push_frame(samples).expect("push");
    }

    let engine = Engine::connect(Box::new(sim.clone()), usb_info()).expect("connect");
    let mut poller = FramePoller::with_config(engine, fast_config());
    let control = poller.control();

    let mut markers = Vec::new();
    poller
        .run(
            |frame| {
                markers.push(frame.sample(DataChannel::Time, 0, 0).unwrap());
                control.stop();
            },
            |err| panic!("unexpected poll error: {}", err),
        )
        .expect("run");

    // The four stale frames were discarded; only the newest was delivered
    assert_eq!(markers, vec![5]);
    assert_eq!(sim.pending_frames(), 0);
}

#[test]
fn test_transient_fault_does_not_end_the_loop() {
    init_logging();
    let sim = SimBackend::new();
    sim.fail_next("get_frame_count", ResultCode::CommunicationError);
    sim.push_synthetic_frame();

    let engine = Engine::connect(Box::new(sim.clone()), usb_info()).expect("connect");
    let mut poller = FramePoller::with_config(engine, fast_config());
    let control = poller.control();

    let mut faults = Vec::new();
    let mut frames = 0u32;
    let exit = poller
        .run(
            |_| {
                frames += 1;
                control.stop();
            },
            |err| faults.push(err.to_string()),
        )
        .expect("run");

    assert_eq!(exit, PollExit::Stopped);
    assert_eq!(frames, 1, "polling must resume after the fault");
    assert_eq!(faults.len(), 1);
    assert!(
        faults[0].contains("get_frame_count"),
        "fault names the failing call: {}",
        faults[0]
    );
}

#[test]
fn test_lost_connection_ends_the_loop() {
    init_logging();
    let sim = SimBackend::new();
    let engine = Engine::connect(Box::new(sim.clone()), usb_info()).expect("connect");

    let watcher_sim = sim.clone();
    let watcher = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        watcher_sim.drop_connection();
    });

    let mut poller = FramePoller::with_config(engine, fast_config());
    let mut saw_disconnect = false;
    let exit = poller
        .run(
            |_| panic!("no frames were queued"),
            |err| saw_disconnect = err.is_disconnected(),
        )
        .expect("run");

    watcher.join().expect("watcher thread");
    assert_eq!(exit, PollExit::Disconnected);
    assert!(saw_disconnect);
}

#[test]
fn test_drawing_surface_through_engine() {
    init_logging();
    let sim = SimBackend::new();
    let mut engine = Engine::connect(Box::new(sim.clone()), usb_info()).expect("connect");

    engine
        .clear(RenderTarget::Osd0, Color::default())
        .expect("clear");
    engine
        .draw(
            RenderTarget::Osd0,
            &DrawCommand::Text {
                origin: Point::new(10, 10),
                text: "sensing active".to_string(),
                color: Color::new(0, 255, 0),
            },
        )
        .expect("draw");
    assert!(sim.drawn(RenderTarget::Osd0).is_empty(), "not flushed yet");

    engine.render(RenderTarget::Osd0).expect("render");
    assert_eq!(sim.drawn(RenderTarget::Osd0).len(), 1);
    assert_eq!(sim.renders(), vec![RenderTarget::Osd0]);

    engine.close().expect("close");
    assert!(!sim.is_connected());
}
