//! Minimal viewer loop against the simulated engine.
//!
//! Connects, enables sensing, then polls for frames and renders both
//! channels, printing a short summary per frame. A real deployment swaps
//! [`SimBackend`] for a transport-backed [`EngineBackend`] implementation.
//!
//! Run with `RUST_LOG=debug cargo run --example viewer` to see the
//! engine's transition logging.

use std::thread;
use std::time::Duration;

use picop::{
    ChannelRenderer, ConnectionInfo, DataChannel, Engine, FramePoller, SensingState, SimBackend,
    UsbInfo, ValueStorage,
};

fn main() -> picop::Result<()> {
    env_logger::init();

    let sim = SimBackend::new();
    let mut engine = Engine::connect(
        Box::new(sim.clone()),
        ConnectionInfo::Usb(UsbInfo {
            product_id: 4,
            serial_number: "PHX-0042".to_string(),
        }),
    )?;

    let library = engine.library_info()?;
    let system = engine.system_info()?;
    println!("library v{}, engine {}", library, system.serial_number);

    engine.set_sensing_state(SensingState::Enabled, false)?;
    println!(
        "sensing: {:?}, brightness: {}",
        engine.sensing_state(ValueStorage::Current)?,
        engine.brightness(ValueStorage::Current)?
    );

    let geometry = engine.frame_dimensions()?;
    let renderer = ChannelRenderer::for_geometry(geometry)?;

    let mut poller = FramePoller::new(engine);
    let control = poller.control();

    // The simulation produces a frame every 100ms; stop after ten.
    let feeder = thread::spawn(move || {
        for _ in 0..10 {
            sim.push_synthetic_frame();
            thread::sleep(Duration::from_millis(100));
        }
    });

    let mut shown = 0u32;
    poller.run(
        |frame| {
            let time = renderer.render(&frame, DataChannel::Time).unwrap();
            let amplitude = renderer.render(&frame, DataChannel::Amplitude).unwrap();
            shown += 1;
            println!(
                "frame {}: {}x{} time + {}x{} amplitude",
                shown,
                time.width(),
                time.height(),
                amplitude.width(),
                amplitude.height()
            );
            if shown == 10 {
                control.stop();
            }
        },
        |err| eprintln!("poll error: {}", err),
    )?;

    feeder.join().expect("feeder thread");
    poller.into_engine().close()?;
    Ok(())
}
