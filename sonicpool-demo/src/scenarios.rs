use anyhow::Result;
use sonicpool::{
    AudioEngine, AudioEvent, BufferCatalog, EngineDesc, ManualClock, Pose, SoundDescription,
    StreamCatalog, Vec3, VirtualDevice,
};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn build_engine(channels: usize) -> Result<(AudioEngine<VirtualDevice>, ManualClock)> {
    let mut buffers = BufferCatalog::new();
    buffers.insert("footstep", Duration::from_millis(250));
    buffers.insert("gunshot", Duration::from_millis(600));
    buffers.insert("engine_hum", Duration::from_secs(2));
    buffers.insert("wind", Duration::from_secs(4));

    let mut streams = StreamCatalog::new(Duration::from_millis(250));
    streams.insert("music", Duration::from_secs(20));

    let clock = ManualClock::new();
    let desc = EngineDesc::new().max_sources(channels);
    let engine = AudioEngine::new(desc, VirtualDevice::new(channels), buffers)?
        .with_stream_factory(streams)
        .with_clock(clock.clone());

    Ok((engine, clock))
}

fn tick(engine: &mut AudioEngine<VirtualDevice>, clock: &ManualClock) {
    engine.backend_mut().advance(FRAME);
    clock.advance(FRAME);
    engine.update();
}

#[derive(Default)]
struct EventTally {
    started: usize,
    culled: usize,
    deferred: usize,
    revived: usize,
    retired: usize,
    dropped: usize,
    completed: usize,
    rejected: usize,
}

impl EventTally {
    fn record(&mut self, events: Vec<AudioEvent>) {
        for event in events {
            if let (Some(handle), Some(channel)) = (event.handle(), event.channel()) {
                log::debug!("{:?} for {} on channel {}", event, handle, channel);
            } else if event.is_terminal() {
                log::info!("{:?}", event);
            }
            match event {
                AudioEvent::Started { .. } => self.started += 1,
                AudioEvent::Culled { .. } => self.culled += 1,
                AudioEvent::Deferred { .. } => self.deferred += 1,
                AudioEvent::Revived { .. } => self.revived += 1,
                AudioEvent::Retired { .. } => self.retired += 1,
                AudioEvent::DeviceDropped { .. } => self.dropped += 1,
                AudioEvent::Completed { .. } => self.completed += 1,
                AudioEvent::Rejected { .. } => self.rejected += 1,
            }
        }
    }

    fn report(&self) {
        log::info!(
            "Events: {} started, {} culled, {} deferred, {} revived, {} rejected",
            self.started,
            self.culled,
            self.deferred,
            self.revived,
            self.rejected
        );
        log::info!(
            "        {} retired, {} device drops, {} completed",
            self.retired,
            self.dropped,
            self.completed
        );
    }
}

/// Floods the engine with short sounds around a few persistent loops.
pub fn crowd(channels: usize, frames: u32) -> Result<()> {
    let (mut engine, clock) = build_engine(channels)?;
    let mut tally = EventTally::default();

    let hum = SoundDescription::looping(0.3).positional(2.0, 60.0);
    let mut loops = Vec::new();
    for i in 0..channels / 2 {
        let pose = Pose::from_position(Vec3::new(i as f32 * 6.0, 0.0, -4.0));
        if let Some(handle) = engine.create_sound(&hum, "engine_hum", Some(pose), None) {
            engine.play(handle);
            loops.push(handle);
        }
    }
    log::info!("Started {} looping sounds", loops.len());

    let step = SoundDescription::one_shot(0.2).positional(1.0, 30.0).in_category(1);
    let shot = SoundDescription::one_shot(1.0).positional(5.0, 200.0).in_category(2);

    for frame in 0..frames {
        // the listener walks along the row of loops
        let listener = Pose::from_position(Vec3::new(frame as f32 * 0.25, 0.0, 0.0));
        engine.set_listener(listener);

        for n in 0..3 {
            let angle = (frame * 3 + n) as f32 * 0.7;
            let offset = Vec3::new(angle.cos() * 8.0, 0.0, angle.sin() * 8.0);
            let pose = Pose::from_position(listener.position + offset);
            if let Some(handle) = engine.create_sound(&step, "footstep", Some(pose), None) {
                engine.play(handle);
            }
        }
        if frame % 20 == 0 {
            let pose = Pose::from_position(Vec3::new(0.0, 0.0, -15.0));
            if let Some(handle) = engine.create_sound(&shot, "gunshot", Some(pose), None) {
                engine.play(handle);
            }
        }
        if frame == frames / 2 {
            log::info!("Muting footsteps");
            engine.set_category_gain(1, 0.0);
        }

        tick(&mut engine, &clock);
        tally.record(engine.poll_events());
    }

    let playing = loops.iter().filter(|h| engine.is_playing(**h)).count();
    log::info!("{} of {} loops hold a channel", playing, loops.len());
    log::info!("{:#?}", engine.metrics());
    tally.report();

    engine.shutdown();
    Ok(())
}

/// Moves a loud source past the listener while ambient loops hold every
/// channel. The source takes a channel as it approaches and loses it again
/// as it recedes.
pub fn flyby(channels: usize, frames: u32) -> Result<()> {
    let (mut engine, clock) = build_engine(channels)?;
    let mut tally = EventTally::default();

    let music = engine.create_sound(&SoundDescription::streaming(0.5), "music", None, None);
    if let Some(music) = music {
        engine.play(music);
    }

    // fill the pool so the plane has to win its channel
    let ambient = SoundDescription::looping(0.35);
    for _ in 0..channels {
        if let Some(handle) = engine.create_sound(&ambient, "engine_hum", None, None) {
            engine.play(handle);
        }
    }

    let wind = SoundDescription::looping(0.9).positional(4.0, 40.0);
    let start = Vec3::new(-60.0, 0.0, -5.0);
    let Some(plane) = engine.create_sound(&wind, "wind", Some(Pose::facing(start, Vec3::X)), None)
    else {
        anyhow::bail!("the flyby source was rejected");
    };
    engine.play(plane);

    let speed = 120.0 / frames.max(1) as f32;
    let mut was_playing = engine.is_playing(plane);
    for frame in 0..frames {
        let position = start + Vec3::X * speed * frame as f32;
        engine.set_transform(plane, Pose::facing(position, Vec3::X));

        tick(&mut engine, &clock);
        tally.record(engine.poll_events());

        let playing = engine.is_playing(plane);
        if playing != was_playing {
            log::info!(
                "Frame {}: source at x = {:.1} {}",
                frame,
                position.x,
                if playing { "audible" } else { "silent" }
            );
            was_playing = playing;
        }
    }

    if let Some(music) = music {
        if let (Some(position), Some(length)) =
            (engine.stream_position(music), engine.stream_duration(music))
        {
            log::info!("Music at {:?} of {:?}", position, length);
        }
    }
    log::info!("{:#?}", engine.metrics());
    tally.report();

    engine.shutdown();
    Ok(())
}
