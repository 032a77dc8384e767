mod common;

use common::{config, fixture, tree_snapshot, write_file};
use photo_curator_core::pipeline::Pipeline;
use photo_curator_core::undo::undo_run;
use photo_curator_core::TransferMode;

#[test]
fn copy_mode_roundtrip_restores_initial_state() {
    let fx = fixture();
    write_file(&fx.destination.join("NoDate").join("existing.jpg"), b"dup bytes");
    write_file(&fx.source.join("keep.jpg"), b"unique bytes");
    write_file(&fx.source.join("dupe.jpg"), b"dup bytes");
    write_file(&fx.source.join("keep.xmp"), b"<xmp/>");

    let source_before = tree_snapshot(&fx.source);
    let dest_before = tree_snapshot(&fx.destination);
    let discard_before = tree_snapshot(&fx.discard);

    let config = config(&fx, TransferMode::Copy, "content-hash", false);
    let summary = Pipeline::new(config, "test-run").unwrap().run().unwrap();
    let manifest_path = summary.manifest_path.unwrap();

    // The run changed the archive...
    assert_ne!(tree_snapshot(&fx.destination), dest_before);

    let undo_summary = undo_run(&manifest_path, false, &fx.log_dir).unwrap();

    // ...and undo put everything back
    assert_eq!(undo_summary.failed, 0);
    assert_eq!(tree_snapshot(&fx.source), source_before);
    assert_eq!(tree_snapshot(&fx.destination), dest_before);
    assert_eq!(tree_snapshot(&fx.discard), discard_before);
}

#[test]
fn move_mode_roundtrip_restores_sources_in_place() {
    let fx = fixture();
    write_file(&fx.source.join("trip").join("a.jpg"), b"alpha bytes");
    write_file(&fx.source.join("trip").join("b.jpg"), b"beta bytes");
    write_file(&fx.source.join("trip").join("b.xmp"), b"<xmp/>");

    let source_before = tree_snapshot(&fx.source);

    let config = config(&fx, TransferMode::Move, "content-hash", false);
    let summary = Pipeline::new(config, "test-run").unwrap().run().unwrap();
    let manifest_path = summary.manifest_path.unwrap();

    // Move mode emptied the source
    assert!(!fx.source.join("trip").join("a.jpg").exists());
    assert!(fx.destination.join("NoDate").join("a.jpg").exists());

    let undo_summary = undo_run(&manifest_path, false, &fx.log_dir).unwrap();

    assert_eq!(undo_summary.failed, 0);
    assert_eq!(tree_snapshot(&fx.source), source_before);
    assert!(tree_snapshot(&fx.destination).is_empty());
    assert!(tree_snapshot(&fx.discard).is_empty());
}

#[test]
fn undo_dry_run_previews_without_changes() {
    let fx = fixture();
    write_file(&fx.source.join("a.jpg"), b"alpha bytes");

    let config = config(&fx, TransferMode::Copy, "filename-size", false);
    let summary = Pipeline::new(config, "test-run").unwrap().run().unwrap();
    let manifest_path = summary.manifest_path.unwrap();

    let dest_after_run = tree_snapshot(&fx.destination);
    let undo_summary = undo_run(&manifest_path, true, &fx.log_dir).unwrap();

    assert!(undo_summary.dry_run);
    assert_eq!(undo_summary.reversed, 1);
    assert_eq!(tree_snapshot(&fx.destination), dest_after_run);
}

#[test]
fn undo_survives_a_missing_destination() {
    let fx = fixture();
    write_file(&fx.source.join("a.jpg"), b"alpha bytes");
    write_file(&fx.source.join("b.jpg"), b"beta bytes");

    let config = config(&fx, TransferMode::Copy, "filename-size", false);
    let summary = Pipeline::new(config, "test-run").unwrap().run().unwrap();
    let manifest_path = summary.manifest_path.unwrap();

    // Someone deleted one archived file between run and undo
    std::fs::remove_file(fx.destination.join("NoDate").join("a.jpg")).unwrap();

    let undo_summary = undo_run(&manifest_path, false, &fx.log_dir).unwrap();

    assert_eq!(undo_summary.already_gone, 1);
    assert_eq!(undo_summary.reversed, 1);
    assert_eq!(undo_summary.failed, 0);
    assert!(!fx.destination.join("NoDate").join("b.jpg").exists());
}
