use timeline::edit_operations::{self, TRIM_STEP};
use timeline::timecode::{format_clock, ruler_markers};
use timeline::{
    fraction_of, HistoryBuffer, MediaRef, PlayheadController, Seek, Snapshot, TrackGeometry, Zoom,
};

fn seeded(duration: f64) -> HistoryBuffer {
    let clip = edit_operations::main_clip(Some(duration), Some(MediaRef::new("job-1")));
    let mut history = HistoryBuffer::default();
    history.push(Snapshot::new(vec![clip], Vec::new()));
    history
}

#[test]
fn scrub_then_cut_at_playhead() {
    let mut history = seeded(60.0);
    let geometry = TrackGeometry::new(20.0, 600.0);
    let mut playhead = PlayheadController::new(60.0);

    assert!(playhead.begin_drag());
    playhead.drag_to(170.0, &geometry);
    assert_eq!(playhead.drag_to(320.0, &geometry), Some(Seek(30.0)));
    playhead.end_drag();

    let main = history.current().clips[0].id;
    let clips = edit_operations::cut_clip(&history.current().clips, main, playhead.current_time())
        .unwrap();
    history.push(Snapshot::new(clips, Vec::new()));

    let current = &history.current().clips;
    assert_eq!(current.len(), 2);
    assert_eq!(current[0].end, 30.0);
    assert_eq!(current[1].start, 30.0);
    assert_eq!(current[1].name, "Main Video (Cut)");
    assert_eq!(format_clock(playhead.current_time()), "00:30");
}

#[test]
fn zoomed_and_scrolled_track_maps_back_to_time() {
    let fitted = 400.0;
    let zoom = Zoom::default().zoom_in().zoom_in().zoom_in().zoom_in().zoom_in();
    assert_eq!(zoom.percent(), 200);

    let geometry = TrackGeometry::new(10.0, zoom.track_width(fitted)).with_scroll(200.0);
    let mut playhead = PlayheadController::new(120.0);
    assert_eq!(playhead.click_track(210.0, &geometry), Some(Seek(60.0)));

    let x = geometry.x_at(playhead.current_time(), 120.0);
    assert!((x - 210.0).abs() < 1e-9);
    assert_eq!(fraction_of(playhead.current_time(), 120.0), 0.5);
}

#[test]
fn edits_undo_and_redo_as_whole_snapshots() {
    let mut history = seeded(20.0);
    let main = history.current().clips[0].id;

    let trimmed = edit_operations::trim_clip_end(&history.current().clips, main, TRIM_STEP).unwrap();
    history.push(Snapshot::new(trimmed, Vec::new()));
    let with_music = edit_operations::add_audio_track(&[], "song.mp3", None, 20.0).unwrap();
    history.push(Snapshot::new(history.current().clips.clone(), with_music));
    assert_eq!(history.len(), 4);

    let undone = history.undo().unwrap().clone();
    assert!(undone.audio_tracks.is_empty());
    assert_eq!(undone.clips[0].end, 19.0);
    assert_eq!(history.undo().unwrap().clips[0].end, 20.0);

    // a new edit from the middle discards the redo branch
    let deleted = edit_operations::delete_clip(&history.current().clips, main).unwrap();
    history.push(Snapshot::new(deleted, Vec::new()));
    assert!(!history.can_redo());
    assert_eq!(history.len(), 3);
    assert!(history.current().clips.is_empty());

    history.undo();
    history.undo();
    assert!(history.current().clips.is_empty());
    assert!(history.undo().is_none());
    assert_eq!(history.index(), 0);
}

#[test]
fn late_duration_resizes_every_snapshot() {
    let mut history = HistoryBuffer::default();
    history.push(Snapshot::new(
        vec![edit_operations::main_clip(None, None)],
        Vec::new(),
    ));
    let appended =
        edit_operations::append_media(&history.current().clips, "b-roll.mp4", None).unwrap();
    history.push(Snapshot::new(appended, Vec::new()));

    history.amend_all(|s| {
        edit_operations::stretch_unsized(&mut s.clips, 45.0);
    });
    assert_eq!(history.len(), 3);
    assert_eq!(history.current().clips[0].end, 45.0);
    assert_eq!(history.undo().unwrap().clips[0].end, 45.0);

    let mut playhead = PlayheadController::new(0.0);
    playhead.set_duration(45.0);
    assert_eq!(playhead.seek(90.0), Seek(45.0));
    assert_eq!(ruler_markers(45.0).last().map(|m| m.time), Some(45.0));
}
