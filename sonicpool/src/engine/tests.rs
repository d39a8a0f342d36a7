use super::*;
use crate::backend::VirtualDevice;
use crate::clock::ManualClock;
use crate::config::{AudioProfile, Cone, SoundDescription};
use crate::environment::SampleEnvironment;
use crate::events::RejectReason;
use crate::math::Vec3;
use crate::resource::{BufferCatalog, SoundBuffer};
use crate::stream::StreamCatalog;
use approx::assert_relative_eq;
use std::sync::Arc;

const FRAME: Duration = Duration::from_millis(100);

struct Fixture {
    engine: AudioEngine<VirtualDevice>,
    clock: ManualClock,
    hum: Arc<SoundBuffer>,
    music: Arc<SoundBuffer>,
}

fn fixture(channels: usize) -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut buffers = BufferCatalog::new();
    buffers.insert("shot", Duration::from_millis(500));
    let hum = buffers.insert("hum", Duration::from_secs(2));

    let mut streams = StreamCatalog::new(FRAME);
    let music = streams.insert("music", Duration::from_secs(3));

    let clock = ManualClock::new();
    let desc = EngineDesc::new().max_sources(channels);
    let engine = AudioEngine::new(desc, VirtualDevice::new(channels), buffers)
        .unwrap()
        .with_stream_factory(streams)
        .with_clock(clock.clone());

    Fixture {
        engine,
        clock,
        hum,
        music,
    }
}

fn shot(engine: &mut AudioEngine<VirtualDevice>, volume: f32) -> Option<Handle> {
    let handle = engine.create_sound(&SoundDescription::one_shot(volume), "shot", None, None)?;
    assert!(engine.play(handle));
    Some(handle)
}

fn looper(engine: &mut AudioEngine<VirtualDevice>, volume: f32) -> Handle {
    engine
        .create_sound(&SoundDescription::looping(volume), "hum", None, None)
        .unwrap()
}

fn has_event(events: &[AudioEvent], wanted: impl Fn(&AudioEvent) -> bool) -> bool {
    events.iter().any(wanted)
}

#[test]
fn test_new_accepts_partial_grant() {
    let engine = AudioEngine::new(
        EngineDesc::new().max_sources(16),
        VirtualDevice::new(4),
        BufferCatalog::new(),
    )
    .unwrap();
    assert_eq!(engine.channel_count(), 4);
}

#[test]
fn test_new_fails_without_channels() {
    let result = AudioEngine::new(EngineDesc::new(), VirtualDevice::new(0), BufferCatalog::new());
    assert!(matches!(result, Err(AudioError::NoChannels)));
}

#[test]
fn test_seventeen_requests_on_sixteen_channels() {
    let mut f = fixture(16);
    let handles: Vec<Option<Handle>> = (0..17).map(|_| shot(&mut f.engine, 0.5)).collect();

    assert!(handles[..16].iter().all(Option::is_some));
    assert!(handles[16].is_none());
    assert_eq!(f.engine.metrics().open_handles, 16);
    assert_eq!(f.engine.backend().playing_count(), 16);

    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(
        e,
        AudioEvent::Rejected {
            reason: RejectReason::NoChannel
        }
    )));
}

#[test]
fn test_louder_request_evicts_quietest() {
    let mut f = fixture(2);
    let loud = shot(&mut f.engine, 0.9).unwrap();
    let quiet = shot(&mut f.engine, 0.3).unwrap();
    let medium = shot(&mut f.engine, 0.6).unwrap();

    assert!(!f.engine.is_valid(quiet));
    assert!(f.engine.is_playing(loud));
    assert!(f.engine.is_playing(medium));

    let mut scores: Vec<f32> = f.engine.channels.iter().map(|(_, s)| s.score).collect();
    scores.sort_by(|a, b| b.total_cmp(a));
    assert_relative_eq!(scores[0], 0.9);
    assert_relative_eq!(scores[1], 0.6);

    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(
        e,
        AudioEvent::Culled { handle, .. } if *handle == quiet
    )));
}

#[test]
fn test_quieter_request_cannot_evict() {
    let mut f = fixture(1);
    let loud = shot(&mut f.engine, 0.6).unwrap();
    assert!(shot(&mut f.engine, 0.6).is_none());
    assert!(shot(&mut f.engine, 0.2).is_none());
    assert!(f.engine.is_playing(loud));
}

#[test]
fn test_deferred_looper_is_parked_then_revived() {
    let mut f = fixture(2);
    let first = shot(&mut f.engine, 0.9).unwrap();
    shot(&mut f.engine, 0.9).unwrap();

    let hum = looper(&mut f.engine, 0.4);
    assert!(f.engine.is_valid(hum));
    assert!(!f.engine.is_playing(hum));
    assert_eq!(f.engine.channels.find_index(hum), None);
    assert_eq!(f.engine.metrics().inactive_looping_sounds, 1);
    assert_eq!(hum.masked().to_bits() & Handle::INACTIVE_BIT, 0);

    // nothing quieter to evict, so play only marks it for revival
    assert!(f.engine.play(hum));
    assert!(!f.engine.is_playing(hum));
    assert_eq!(f.engine.metrics().culled_looping_sounds, 1);

    f.engine.stop(first);
    f.engine.update();
    assert!(f.engine.is_playing(hum));

    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(e, AudioEvent::Deferred { handle } if *handle == hum)));
    assert!(has_event(&events, |e| matches!(e, AudioEvent::Revived { handle, .. } if *handle == hum)));
}

#[test]
fn test_revival_waits_for_uncull_period() {
    let mut f = fixture(1);
    let hum = looper(&mut f.engine, 0.3);
    f.engine.play(hum);

    let loud = shot(&mut f.engine, 0.9).unwrap();
    assert!(!f.engine.is_playing(hum));
    assert_eq!(f.engine.metrics().culled_looping_sounds, 1);
    f.engine.stop(loud);

    f.clock.advance(Duration::from_millis(499));
    f.engine.update();
    assert!(!f.engine.is_playing(hum));

    f.clock.advance(Duration::from_millis(1));
    f.engine.update();
    assert!(f.engine.is_playing(hum));
}

#[test]
fn test_evicting_unstarted_looper_parks_it_inactive() {
    let mut f = fixture(1);
    let hum = looper(&mut f.engine, 0.3);
    assert!(f.engine.channels.find_index(hum).is_some());

    shot(&mut f.engine, 0.9).unwrap();
    let metrics = f.engine.metrics();
    assert_eq!(metrics.inactive_looping_sounds, 1);
    assert_eq!(metrics.culled_looping_sounds, 0);
}

#[test]
fn test_unstarted_looper_is_parked_at_next_tick() {
    let mut f = fixture(2);
    let hum = looper(&mut f.engine, 0.5);
    f.engine.update();
    assert_eq!(f.engine.channels.find_index(hum), None);
    assert_eq!(f.engine.metrics().inactive_looping_sounds, 1);

    assert!(f.engine.play(hum));
    assert!(f.engine.is_playing(hum));
}

#[test]
fn test_muted_category_rejects_only_one_shots() {
    let mut f = fixture(4);
    let desc = SoundDescription::one_shot(0.8).in_category(3);
    let playing = f.engine.create_sound(&desc, "shot", None, None).unwrap();
    f.engine.play(playing);
    let index = f.engine.channels.find_index(playing).unwrap();

    assert!(f.engine.set_category_gain(3, 0.0));
    assert!(f.engine.is_playing(playing));
    assert_eq!(f.engine.backend().gain(index), 0.0);

    assert!(f.engine.create_sound(&desc, "shot", None, None).is_none());
    let hum = f
        .engine
        .create_sound(&SoundDescription::looping(0.8).in_category(3), "hum", None, None);
    assert!(hum.is_some());

    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(
        e,
        AudioEvent::Rejected {
            reason: RejectReason::MutedCategory
        }
    )));

    assert!(f.engine.set_category_gain(3, 0.5));
    assert_relative_eq!(f.engine.backend().gain(index), 0.4);
    assert!(!f.engine.set_category_gain(99, 1.0));
}

#[test]
fn test_invalid_requests_are_rejected() {
    let mut f = fixture(2);
    let desc = SoundDescription::one_shot(1.0);
    assert!(f.engine.create_sound(&desc, "", None, None).is_none());
    assert!(f.engine.create_sound(&desc, "missing", None, None).is_none());
    assert!(
        f.engine
            .create_sound(&desc.clone().in_category(32), "shot", None, None)
            .is_none()
    );
    assert!(f.engine.create_sound(&SoundDescription::one_shot(0.05), "shot", None, None).is_none());
    assert_eq!(f.engine.metrics().open_handles, 0);
}

#[test]
fn test_far_positional_one_shot_is_inaudible() {
    let mut f = fixture(2);
    let desc = SoundDescription::one_shot(1.0).positional(1.0, 10.0);
    let far = Pose::from_position(Vec3::new(20.0, 0.0, 0.0));
    assert!(f.engine.create_sound(&desc, "shot", Some(far), None).is_none());

    let hum = SoundDescription::looping(1.0).positional(1.0, 10.0);
    let handle = f.engine.create_sound(&hum, "hum", Some(far), None).unwrap();
    assert_eq!(f.engine.channels.find_index(handle), None);
    assert_eq!(f.engine.position(handle), Some(Vec3::new(20.0, 0.0, 0.0)));
}

#[test]
fn test_gain_round_trips() {
    let mut f = fixture(1);
    let bound = looper(&mut f.engine, 0.5);
    f.engine.play(bound);
    let parked = looper(&mut f.engine, 0.5);

    for handle in [bound, parked] {
        assert!(f.engine.set_gain(handle, 0.37));
        assert_relative_eq!(f.engine.gain(handle).unwrap(), 0.37);

        f.engine.set_gain_log(handle, 0.6);
        assert_relative_eq!(
            f.engine.gain_log(handle).unwrap(),
            0.6,
            epsilon = crate::gain::LOG_STEP
        );
    }

    f.engine.set_gain(bound, 4.0);
    assert_eq!(f.engine.gain(bound), Some(1.0));

    f.engine.set_master_gain(0.25);
    assert_relative_eq!(f.engine.master_gain(), 0.25);
    f.engine.set_master_gain_log(0.5);
    assert_relative_eq!(f.engine.master_gain_log(), 0.5, epsilon = crate::gain::LOG_STEP);
}

#[test]
fn test_master_gain_does_not_affect_admission() {
    let mut f = fixture(2);
    f.engine.set_master_gain(0.1);
    let handle = shot(&mut f.engine, 0.5).unwrap();
    let index = f.engine.channels.find_index(handle).unwrap();
    assert_relative_eq!(f.engine.backend().gain(index), 0.05);
    assert_relative_eq!(f.engine.channels.get(index).unwrap().score, 0.5);
}

#[test]
fn test_parameters_survive_cull_and_revival() {
    let mut f = fixture(1);
    let hum = looper(&mut f.engine, 0.3);
    f.engine.play(hum);
    f.engine.set_pitch(hum, 1.5);
    f.engine.set_velocity(hum, Vec3::X);

    let loud = shot(&mut f.engine, 0.9).unwrap();
    assert_eq!(f.engine.velocity(hum), None);
    assert_eq!(f.engine.pitch(hum), Some(1.5));
    f.engine.set_gain(hum, 0.8);
    f.engine.set_cone(
        hum,
        Cone {
            inner_angle: 90.0,
            outer_angle: 180.0,
            outer_gain: 0.25,
        },
    );
    f.engine.stop(loud);

    f.clock.advance(Duration::from_millis(500));
    f.engine.update();
    let index = f.engine.channels.find_index(hum).unwrap();
    let device = f.engine.backend();
    assert_eq!(device.pitch(index), 1.5);
    assert_relative_eq!(device.gain(index), 0.8);
    assert_eq!(device.cone(index).outer_angle, 180.0);
    assert!(device.is_looping(index));
    assert!(device.bound_buffer(index).is_some());
}

#[test]
fn test_pitch_is_clamped() {
    let mut f = fixture(1);
    let hum = looper(&mut f.engine, 0.5);
    f.engine.play(hum);

    assert!(f.engine.set_pitch(hum, 1e30));
    assert_eq!(f.engine.pitch(hum), Some(MAX_PITCH));
    f.engine.backend_mut().advance(Duration::from_secs(10));
    assert!(f.engine.is_playing(hum));

    f.engine.set_pitch(hum, -2.0);
    assert_eq!(f.engine.pitch(hum), Some(0.0));
    f.engine.set_pitch(hum, f32::NAN);
    assert_eq!(f.engine.pitch(hum), Some(1.0));
}

#[test]
fn test_request_volume_is_clamped() {
    let mut f = fixture(1);
    let blocker = shot(&mut f.engine, 1.0).unwrap();

    // an overdriven request does not outscore a full-volume sound
    assert!(shot(&mut f.engine, 2.0).is_none());
    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(
        e,
        AudioEvent::Rejected {
            reason: RejectReason::NoChannel
        }
    )));
    assert!(f.engine.is_playing(blocker));

    f.engine.stop(blocker);
    let hum = f
        .engine
        .create_sound(&SoundDescription::looping(3.0), "hum", None, None)
        .unwrap();
    assert_eq!(f.engine.gain(hum), Some(1.0));
    let index = f.engine.channels.find_index(hum).unwrap();
    assert_relative_eq!(f.engine.backend().gain(index), 1.0);
}

#[test]
fn test_transform_and_distances_write_through() {
    let mut f = fixture(1);
    let desc = SoundDescription::looping(0.9).positional(1.0, 40.0);
    let pose = Pose::from_position(Vec3::new(2.0, 0.0, 0.0));
    let hum = f.engine.create_sound(&desc, "hum", Some(pose), None).unwrap();
    f.engine.play(hum);

    let moved = Pose::facing(Vec3::new(0.0, 3.0, 0.0), Vec3::X);
    assert!(f.engine.set_transform(hum, moved));
    assert_eq!(f.engine.position(hum), Some(Vec3::new(0.0, 3.0, 0.0)));
    let direction = f.engine.direction(hum).unwrap();
    assert_relative_eq!(direction.x, 1.0, epsilon = 1e-5);

    f.engine.set_reference_distance(hum, 4.0);
    f.engine.set_max_distance(hum, 80.0);
    assert_eq!(f.engine.reference_distance(hum), Some(4.0));
    assert_eq!(f.engine.max_distance(hum), Some(80.0));
    let state = f.engine.registries.get(hum).unwrap();
    assert_eq!(state.desc.max_distance, 80.0);
    assert_eq!(state.position, Vec3::new(0.0, 3.0, 0.0));
}

#[test]
fn test_stop_invalidates_handle() {
    let mut f = fixture(2);
    let one_shot = shot(&mut f.engine, 0.9).unwrap();
    let bound = looper(&mut f.engine, 0.5);
    f.engine.play(bound);
    let parked = looper(&mut f.engine, 0.5);
    let stream = f
        .engine
        .create_sound(&SoundDescription::streaming(0.5), "music", None, None)
        .unwrap();

    for handle in [one_shot, bound, parked, stream] {
        assert!(f.engine.is_valid(handle));
        assert!(f.engine.stop(handle));
        assert!(!f.engine.is_valid(handle));
        assert_eq!(f.engine.gain(handle), None);
        assert_eq!(f.engine.pitch(handle), None);
        assert!(!f.engine.set_gain(handle, 0.5));
        assert!(!f.engine.stop(handle));
    }
    assert_eq!(f.engine.metrics(), EngineMetrics {
        pooled_looping_records: 2,
        ..Default::default()
    });
}

#[test]
fn test_device_drop_is_an_implicit_cull() {
    let mut f = fixture(2);
    let hum = looper(&mut f.engine, 0.5);
    f.engine.play(hum);
    let index = f.engine.channels.find_index(hum).unwrap();

    f.engine.backend_mut().drop_channel(index);
    f.engine.update();
    assert!(f.engine.is_valid(hum));
    assert!(!f.engine.is_playing(hum));
    assert_eq!(f.engine.metrics().culled_looping_sounds, 1);
    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(e, AudioEvent::DeviceDropped { handle, .. } if *handle == hum)));

    f.clock.advance(Duration::from_millis(500));
    f.engine.update();
    assert!(f.engine.is_playing(hum));
}

#[test]
fn test_device_drop_mid_stream_parks_the_stream() {
    let mut f = fixture(2);
    let music = f
        .engine
        .create_sound(&SoundDescription::streaming(0.7), "music", None, None)
        .unwrap();
    f.engine.play(music);
    for _ in 0..3 {
        f.engine.backend_mut().advance(FRAME);
        f.engine.update();
    }
    let index = f.engine.channels.find_index(music).unwrap();

    f.engine.backend_mut().drop_channel(index);
    f.engine.update();
    assert!(f.engine.is_valid(music));
    assert!(!f.engine.is_playing(music));
    assert_eq!(f.engine.metrics().culled_streaming_sounds, 1);
    assert_eq!(f.engine.stream_position(music), Some(Duration::ZERO));
    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(e, AudioEvent::DeviceDropped { handle, .. } if *handle == music)));
    assert!(!has_event(&events, |e| matches!(e, AudioEvent::Completed { .. })));

    f.clock.advance(Duration::from_millis(500));
    f.engine.update();
    assert!(f.engine.is_playing(music));
}

#[test]
fn test_evicted_stream_restarts_on_revival() {
    let mut f = fixture(1);
    let music = f
        .engine
        .create_sound(&SoundDescription::streaming(0.3), "music", None, None)
        .unwrap();
    f.engine.play(music);
    for _ in 0..3 {
        f.engine.backend_mut().advance(FRAME);
        f.engine.update();
    }
    assert_eq!(f.engine.stream_position(music), Some(Duration::from_millis(300)));

    let loud = shot(&mut f.engine, 0.9).unwrap();
    assert_eq!(f.engine.metrics().culled_streaming_sounds, 1);
    assert_eq!(f.engine.stream_position(music), Some(Duration::ZERO));
    f.engine.stop(loud);

    // culled at t = 0, so the dwell runs until 500 ms
    f.clock.advance(Duration::from_millis(499));
    f.engine.update();
    assert!(!f.engine.is_playing(music));

    f.clock.advance(Duration::from_millis(1));
    f.engine.update();
    assert!(f.engine.is_playing(music));
    let index = f.engine.channels.find_index(music).unwrap();
    assert_eq!(f.engine.backend().queued_buffers(index), 3);
    assert_eq!(f.engine.stream_position(music), Some(Duration::ZERO));
}

#[test]
fn test_stop_releases_a_culled_looper() {
    let mut f = fixture(1);
    let hum = looper(&mut f.engine, 0.3);
    f.engine.play(hum);
    let _loud = shot(&mut f.engine, 0.9).unwrap();
    assert_eq!(f.engine.metrics().culled_looping_sounds, 1);

    assert!(f.engine.stop(hum));
    assert!(!f.engine.is_valid(hum));
    let metrics = f.engine.metrics();
    assert_eq!(metrics.culled_looping_sounds, 0);
    assert_eq!(metrics.pooled_looping_records, 1);
    assert!(!f.engine.stop(hum));
}

#[test]
fn test_finished_one_shot_frees_channel() {
    let mut f = fixture(1);
    let handle = shot(&mut f.engine, 0.9).unwrap();
    f.engine.backend_mut().advance(Duration::from_millis(600));
    assert!(!f.engine.is_valid(handle));

    f.engine.update();
    assert_eq!(f.engine.metrics().open_handles, 0);
    assert!(shot(&mut f.engine, 0.2).is_some());
}

#[test]
fn test_purged_buffer_retires_parked_looper() {
    let mut f = fixture(1);
    let hum = looper(&mut f.engine, 0.3);
    f.engine.play(hum);
    let loud = shot(&mut f.engine, 0.9).unwrap();

    f.hum.purge();
    f.engine.stop(loud);
    f.clock.advance(Duration::from_millis(500));
    f.engine.update();

    assert!(!f.engine.is_valid(hum));
    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(e, AudioEvent::Retired { handle } if *handle == hum)));
}

#[test]
fn test_stream_plays_to_completion() {
    let mut f = fixture(2);
    let music = f
        .engine
        .create_sound(&SoundDescription::streaming(0.7), "music", None, None)
        .unwrap();
    assert!(music.is_streaming());

    // a loading stream is not reclaimed before it is played
    f.engine.update();
    assert!(f.engine.channels.find_index(music).is_some());

    f.engine.play(music);
    assert_eq!(f.engine.stream_duration(music), Some(Duration::from_secs(3)));
    for _ in 0..10 {
        f.engine.backend_mut().advance(FRAME);
        f.engine.update();
    }
    assert_eq!(f.engine.stream_position(music), Some(Duration::from_secs(1)));

    for _ in 0..25 {
        f.engine.backend_mut().advance(FRAME);
        f.engine.update();
    }
    assert!(!f.engine.is_valid(music));
    assert_eq!(f.engine.stream_position(music), None);
    let events = f.engine.poll_events();
    assert!(has_event(&events, |e| matches!(e, AudioEvent::Completed { handle } if *handle == music)));
}

#[test]
fn test_deferred_stream_is_revived() {
    let mut f = fixture(1);
    let blocker = shot(&mut f.engine, 0.9).unwrap();
    let music = f
        .engine
        .create_sound(&SoundDescription::streaming(0.6), "music", None, None)
        .unwrap();
    assert_eq!(f.engine.metrics().inactive_streaming_sounds, 1);

    f.engine.play(music);
    assert_eq!(f.engine.metrics().culled_streaming_sounds, 1);
    f.engine.stop(blocker);
    f.engine.update();

    let index = f.engine.channels.find_index(music).unwrap();
    assert!(f.engine.is_playing(music));
    assert_eq!(f.engine.backend().queued_buffers(index), 3);
}

#[test]
fn test_invalid_stream_is_retired() {
    let mut f = fixture(1);
    let blocker = shot(&mut f.engine, 0.9).unwrap();
    let music = f
        .engine
        .create_sound(&SoundDescription::streaming(0.6), "music", None, None)
        .unwrap();
    f.engine.play(music);

    f.music.purge();
    f.engine.stop(blocker);
    f.engine.update();
    assert!(!f.engine.is_valid(music));
}

#[test]
fn test_unavailable_stream_does_not_evict() {
    let mut f = fixture(1);
    let blocker = shot(&mut f.engine, 0.2).unwrap();
    f.music.purge();

    let music = f
        .engine
        .create_sound(&SoundDescription::streaming(0.9), "music", None, None);
    assert!(music.is_none());
    assert!(f.engine.is_playing(blocker));
    let events = f.engine.poll_events();
    assert!(!has_event(&events, |e| matches!(e, AudioEvent::Culled { .. })));
    assert!(has_event(&events, |e| matches!(
        e,
        AudioEvent::Rejected {
            reason: RejectReason::UnresolvedSource
        }
    )));
}

#[test]
fn test_max_distance_refresh_mutes_far_channels() {
    let mut f = fixture(1);
    let desc = SoundDescription::looping(0.8).positional(1.0, 10.0);
    let hum = f
        .engine
        .create_sound(&desc, "hum", Some(Pose::from_position(Vec3::X * 5.0)), None)
        .unwrap();
    f.engine.play(hum);
    let index = f.engine.channels.find_index(hum).unwrap();

    f.engine.set_listener(Pose::from_position(Vec3::X * 100.0));
    f.engine.update();
    assert_eq!(f.engine.backend().gain(index), 0.0);
    assert_eq!(f.engine.channels.get(index).unwrap().score, 0.0);

    f.engine.set_listener(Pose::identity());
    f.engine.update();
    assert_relative_eq!(f.engine.backend().gain(index), 0.8);
}

#[test]
fn test_profiles() {
    let mut f = fixture(2);
    let profiles = [
        AudioProfile::new("shot", SoundDescription::one_shot(0.9)).preloaded(),
        AudioProfile::new("missing", SoundDescription::one_shot(0.9)).preloaded(),
        AudioProfile::new("hum", SoundDescription::looping(0.5)),
    ];
    assert_eq!(f.engine.preload(&profiles), 1);

    let handle = f.engine.play_profile(&profiles[0], None).unwrap();
    assert!(f.engine.is_playing(handle));
    assert!(f.engine.play_profile(&profiles[1], None).is_none());
    let hum = f.engine.play_profile(&profiles[2], None).unwrap();
    assert!(hum.is_looping());
}

#[test]
fn test_environment_hooks_reach_positional_channels() {
    let mut f = fixture(2);
    f.engine.enable_environment(true);
    let mut desc = SoundDescription::looping(0.8).positional(1.0, 50.0);
    desc.environment_level = 0.5;
    let environment = SampleEnvironment {
        room: -100,
        ..Default::default()
    };
    let hum = f
        .engine
        .create_sound(&desc, "hum", Some(Pose::identity()), Some(&environment))
        .unwrap();
    let index = f.engine.channels.find_index(hum).unwrap();
    assert_eq!(f.engine.backend().sample_environment(index), Some(&environment));
    assert_eq!(f.engine.backend().environment_level(index), 0.5);

    f.engine.enable_environment(false);
    assert!(f.engine.backend().sample_environment(index).is_none());
    f.engine.enable_environment(true);
    assert_eq!(f.engine.backend().sample_environment(index), Some(&environment));

    f.engine.set_environment(Some(AudioEnvironment::default()));
    assert!(f.engine.backend().environment().is_some());
    assert!(f.engine.environment().is_some());
}

#[test]
fn test_stop_all_and_shutdown() {
    let mut f = fixture(2);
    shot(&mut f.engine, 0.9).unwrap();
    let hum = looper(&mut f.engine, 0.5);
    f.engine.play(hum);
    looper(&mut f.engine, 0.5);

    f.engine.stop_all();
    let metrics = f.engine.metrics();
    assert_eq!(metrics.open_handles, 0);
    assert_eq!(metrics.looping_sounds, 0);
    assert_eq!(metrics.pooled_looping_records, 2);

    f.engine.shutdown();
    assert!(f.engine.is_shut_down());
    assert_eq!(f.engine.backend().channel_count(), 0);
    assert!(shot(&mut f.engine, 0.9).is_none());
    f.engine.update();
}
