mod common;

use std::io::Cursor;
use std::sync::mpsc::sync_channel;
use std::thread;
use std::time::Duration;

use kira_gaitqc::config::Config;
use kira_gaitqc::phases::TugPhase;
use kira_gaitqc::stream::events::{CompletedResult, StreamEvent};
use kira_gaitqc::stream::live::{LiveSession, run_live, spawn_frame_reader};

use common::{to_json_lines, tug_frames};

#[test]
fn session_emits_transitions_and_throttled_updates() {
    let cfg = Config::default();
    let mut session = LiveSession::new(&cfg);
    let mut transitions = Vec::new();
    let mut updates = 0usize;
    for frame in tug_frames() {
        for event in session.push_frame(&frame) {
            match event {
                StreamEvent::PhaseTransition {
                    to_phase,
                    transitions: so_far,
                    ..
                } => {
                    transitions.push(to_phase);
                    assert_eq!(so_far.len(), transitions.len());
                }
                StreamEvent::PhaseUpdate { .. } => updates += 1,
                other => panic!("unexpected event {:?}", other),
            }
        }
    }
    assert_eq!(
        transitions,
        vec![
            TugPhase::WalkOut,
            TugPhase::Turn,
            TugPhase::WalkBack,
            TugPhase::SitDown
        ]
    );
    // One update per half second over twelve seconds.
    assert!((20..=26).contains(&updates), "{} updates", updates);
    let seg = session.finish();
    assert_eq!(seg.boundaries.len(), 4);
    assert!(!seg.low_confidence);
}

#[test]
fn stale_frames_produce_no_events() {
    let frames = tug_frames();
    let mut session = LiveSession::new(&Config::default());
    assert!(!session.push_frame(&frames[5]).is_empty());
    assert!(session.push_frame(&frames[2]).is_empty());
    assert_eq!(session.tracker().rejected(), 1);
}

#[test]
fn run_live_completes_with_segmentation() {
    let cfg = Config::default();
    let (frame_tx, frame_rx) = sync_channel(8);
    let (event_tx, event_rx) = sync_channel(1024);
    let producer = thread::spawn(move || {
        for frame in tug_frames() {
            frame_tx.send(frame).unwrap();
        }
    });
    let seg = run_live(&frame_rx, &event_tx, &cfg, "live-1").unwrap();
    producer.join().unwrap();
    drop(event_tx);

    let events: Vec<StreamEvent> = event_rx.iter().collect();
    assert_eq!(
        events
            .iter()
            .filter(|e| e.kind() == "phase_transition")
            .count(),
        4
    );
    match events.last().unwrap() {
        StreamEvent::Completed {
            file_id,
            result: CompletedResult::Phases(done),
        } => {
            assert_eq!(file_id, "live-1");
            assert_eq!(done, &seg);
        }
        other => panic!("unexpected final event {:?}", other),
    }
}

#[test]
fn idle_stream_sends_heartbeats() {
    let mut cfg = Config::default();
    cfg.live.heartbeat_interval_ms = 10;
    let (frame_tx, frame_rx) = sync_channel(1);
    let (event_tx, event_rx) = sync_channel(1024);
    let idle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(80));
        drop(frame_tx);
    });
    let seg = run_live(&frame_rx, &event_tx, &cfg, "idle").unwrap();
    idle.join().unwrap();
    drop(event_tx);

    let events: Vec<StreamEvent> = event_rx.iter().collect();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, StreamEvent::Heartbeat { frames: 0, .. }))
    );
    assert!(events.last().unwrap().is_terminal());
    assert!(seg.low_confidence);
}

#[test]
fn closed_event_channel_ends_the_session() {
    let (frame_tx, frame_rx) = sync_channel(8);
    let (event_tx, event_rx) = sync_channel(1);
    drop(event_rx);
    let producer = thread::spawn(move || {
        for frame in tug_frames().into_iter().take(10) {
            if frame_tx.send(frame).is_err() {
                break;
            }
        }
    });
    let err = run_live(&frame_rx, &event_tx, &Config::default(), "x").unwrap_err();
    assert!(err.to_string().contains("disconnected"));
    drop(frame_rx);
    producer.join().unwrap();
}

#[test]
fn frame_reader_skips_blank_lines() {
    let frames = tug_frames();
    let mut text = to_json_lines(&frames[..10]);
    text.push_str("\n\n");
    let (rx, handle) = spawn_frame_reader(Cursor::new(text.into_bytes()), 2).unwrap();
    let received: Vec<_> = rx.iter().collect();
    assert_eq!(received.len(), 10);
    assert_eq!(received[3].time, frames[3].time);
    assert_eq!(handle.join().unwrap().unwrap(), 10);
}

#[test]
fn frame_reader_reports_bad_lines() {
    let (rx, handle) = spawn_frame_reader(Cursor::new(b"{not json}\n".to_vec()), 2).unwrap();
    assert_eq!(rx.iter().count(), 0);
    let err = handle.join().unwrap().unwrap_err();
    assert!(err.to_string().contains("line 1"));
}
