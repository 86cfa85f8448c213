// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use roiferry_core::batch::{BatchOptions, BatchReport, run_batch, run_batch_with};
use roiferry_core::codec::{parse_points, rgba_to_int};
use roiferry_core::io::{ImagePair, read_image_pairs};
use roiferry_core::roi::Shape;
use roiferry_core::session::WriteContext;
use roiferry_core::session::memory::{MemoryConnector, MemoryServer};
use roiferry_core::ut::track::Verbosity;
use serde_json::json;

fn options() -> BatchOptions {
    BatchOptions {
        default_stroke_width: 10.0,
        target_group: -1,
        target_user: -1,
        verbosity: Verbosity::Silent,
        dry_run: false,
    }
}

fn pair(source_id: i64, target_id: i64) -> ImagePair {
    ImagePair {
        source_id,
        target_id,
    }
}

#[test]
fn test_end_to_end_from_csv() {
    const INPUT: &str = "TEST_END_TO_END_PAIRS.csv";
    std::fs::write(INPUT, "omero_id_1,omero_id_2\n100,200\n").unwrap();
    let pairs = read_image_pairs(INPUT, "omero_id_1", "omero_id_2");
    std::fs::remove_file(INPUT).unwrap();
    let pairs = pairs.unwrap();

    let source = MemoryServer::new();
    source.add_image(100, "source.svs", 5);
    source.add_region(100, Shape::polygon("1,1 2,1 2,2").with_text("Tumor"));

    let target = MemoryServer::new();
    target.add_image(200, "target.svs", 8);

    let report = run_batch(
        &pairs,
        &MemoryConnector::new(&source, "server-a"),
        &MemoryConnector::new(&target, "server-b"),
        &options(),
    );

    assert_eq!(
        report,
        BatchReport {
            pairs: 1,
            rois_written: 1,
            ..Default::default()
        }
    );

    let regions = target.regions(200);
    assert_eq!(regions.len(), 1);

    let shape = regions[0].primary_shape().unwrap();
    assert_eq!(shape.text.as_deref(), Some("Tumor"));
    assert_eq!(
        parse_points(shape.points.as_deref().unwrap()).unwrap(),
        vec![[1., 1.], [2., 1.], [2., 2.]]
    );
}

#[test]
fn test_style_is_preserved() {
    let mut polygon = Shape::polygon("10,10 20,10 20,20").with_text("Necrosis");
    polygon.stroke_color = Some(json!(rgba_to_int(0, 128, 255, 255)));
    polygon.fill_color = Some(json!(rgba_to_int(255, 0, 0, 60)));
    polygon.stroke_dash = Some(json!("6,3"));
    polygon.stroke_width = Some(json!({"@type": "TBD#LengthI", "Unit": "MICROMETER", "Value": 4.0}));

    let source = MemoryServer::new();
    source.add_image(1, "a", 1);
    source.add_region(1, polygon);

    let target = MemoryServer::new();
    target.add_image(2, "b", 1);

    run_batch(
        &[pair(1, 2)],
        &MemoryConnector::new(&source, "a"),
        &MemoryConnector::new(&target, "b"),
        &options(),
    );

    let regions = target.regions(2);
    let shape = regions[0].primary_shape().unwrap();
    assert_eq!(shape.stroke_color(), Some(rgba_to_int(0, 128, 255, 255)));
    assert_eq!(shape.fill_color(), Some(rgba_to_int(255, 0, 0, 60)));
    assert_eq!(shape.stroke_dash, Some(json!("6,3")));
    assert_eq!(shape.stroke_width.as_ref().unwrap()["Value"], json!(10.0));
    assert_eq!(shape.stroke_width.as_ref().unwrap()["Unit"], json!("PIXEL"));
}

#[test]
fn test_rectangles_become_polygons() {
    let source = MemoryServer::new();
    source.add_image(1, "a", 1);
    source.add_region(1, Shape::rectangle(10., 20., 5., 7.).with_text("Box"));

    let target = MemoryServer::new();
    target.add_image(2, "b", 1);

    run_batch(
        &[pair(1, 2)],
        &MemoryConnector::new(&source, "a"),
        &MemoryConnector::new(&target, "b"),
        &options(),
    );

    let regions = target.regions(2);
    let shape = regions[0].primary_shape().unwrap();
    assert!(shape.shape_type.ends_with("#Polygon"));
    assert_eq!(shape.points.as_deref(), Some("10,20 15,20 15,27 10,27 "));
}

#[test]
fn test_continue_past_failures() {
    let source = MemoryServer::new();
    source.add_image(1, "a", 1);
    source.add_region(1, Shape::polygon("10,10 20,10 20,20").with_text("rejected"));
    source.add_region(1, Shape::polygon("30,30 40,30 40,40").with_text("kept"));
    source.add_region(
        1,
        Shape {
            shape_type: "http://www.openmicroscopy.org/Schemas/OME/2016-06#Label".to_string(),
            text: Some("label".to_string()),
            ..Default::default()
        },
    );
    source.add_image(3, "c", 1);
    source.add_region(3, Shape::polygon("50,50 60,50 60,60").with_text("later"));

    let target = MemoryServer::new();
    target.add_image(2, "b", 1);
    target.add_image(4, "d", 1);
    target.fail_persist_for("rejected");

    let report = run_batch(
        &[pair(1, 2), pair(999, 2), pair(3, 4)],
        &MemoryConnector::new(&source, "a"),
        &MemoryConnector::new(&target, "b"),
        &options(),
    );

    assert_eq!(
        report,
        BatchReport {
            pairs: 3,
            pairs_failed: 1,
            rois_written: 2,
            rois_failed: 1,
            rois_skipped: 1,
        }
    );

    let names: Vec<String> = target
        .persisted()
        .iter()
        .map(|persisted| persisted.region.shapes[0].text.clone().unwrap())
        .collect();
    assert_eq!(names, vec!["kept", "later"]);
}

#[test]
fn test_unreachable_target_continues() {
    let source = MemoryServer::new();
    source.add_image(1, "a", 1);
    source.add_region(1, Shape::polygon("10,10 20,10 20,20"));

    let target = MemoryServer::new();
    target.refuse_connections(true);

    let report = run_batch(
        &[pair(1, 2), pair(1, 2)],
        &MemoryConnector::new(&source, "a"),
        &MemoryConnector::new(&target, "b"),
        &options(),
    );

    assert_eq!(report.pairs, 2);
    assert_eq!(report.rois_failed, 2);
    assert_eq!(report.rois_written, 0);
}

#[test]
fn test_sessions_are_scoped() {
    let tracker = MemoryServer::new();

    let source = MemoryServer::new();
    source.add_image(1, "a", 1);
    source.add_region(1, Shape::polygon("10,10 20,10 20,20"));
    source.add_region(1, Shape::polygon("30,30 40,30 40,40"));

    let target = MemoryServer::new();
    target.add_image(2, "b", 1);

    run_batch(
        &[pair(1, 2), pair(404, 2)],
        &MemoryConnector::new(&source, "a").tracked_by(&tracker),
        &MemoryConnector::new(&target, "b").tracked_by(&tracker),
        &options(),
    );

    // One source session per pair and one target session per ROI
    assert_eq!(tracker.sessions_opened(), 4);
    assert_eq!(tracker.sessions_closed(), 4);
    assert_eq!(tracker.open_sessions(), 0);
    assert_eq!(tracker.max_open_sessions(), 1);
}

#[test]
fn test_write_context_for_target_group() {
    let source = MemoryServer::new();
    source.add_image(1, "a", 1);
    source.add_region(1, Shape::polygon("10,10 20,10 20,20"));

    let target = MemoryServer::new();
    target.add_image(2, "b", 409);

    let unscoped = MemoryServer::new();
    unscoped.add_image(2, "b", 409);

    let scoped_options = BatchOptions {
        target_group: 409,
        target_user: 12,
        ..options()
    };

    run_batch(
        &[pair(1, 2)],
        &MemoryConnector::new(&source, "a"),
        &MemoryConnector::new(&target, "b"),
        &scoped_options,
    );

    run_batch(
        &[pair(1, 2)],
        &MemoryConnector::new(&source, "a"),
        &MemoryConnector::new(&unscoped, "b"),
        &options(),
    );

    assert_eq!(
        target.persisted()[0].context,
        Some(WriteContext {
            group_id: 409,
            user_id: 12
        })
    );
    assert_eq!(unscoped.persisted()[0].context, None);
}

#[test]
fn test_dry_run_writes_nothing() {
    let source = MemoryServer::new();
    source.add_image(1, "a", 1);
    source.add_region(1, Shape::polygon("10,10 20,10 20,20"));

    let target = MemoryServer::new();
    target.add_image(2, "b", 1);

    let mut inspected = Vec::new();

    let report = run_batch_with(
        &[pair(1, 2)],
        &MemoryConnector::new(&source, "a"),
        &MemoryConnector::new(&target, "b"),
        &BatchOptions {
            dry_run: true,
            ..options()
        },
        |pair, extraction| inspected.push((pair.source_id, extraction.rois().count())),
    );

    assert_eq!(inspected, vec![(1, 1)]);
    assert_eq!(report.rois_written, 0);
    assert!(target.regions(2).is_empty());
    assert_eq!(target.sessions_opened(), 0);
}
