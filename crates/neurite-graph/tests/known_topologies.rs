//! Hand-built morphologies whose sections are known in advance.

use neurite_core::swc::parse_swc;
use neurite_core::{MorphologyError, NodeId};
use neurite_graph::{ConnectivityIndex, Pipeline, RepairPath, Section, classify, segment};

fn ids(raw: &[u64]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId).collect()
}

fn sections_of(text: &str) -> Vec<Section> {
    let m = parse_swc(text).expect("parse");
    let index = ConnectivityIndex::build(&m).expect("index");
    let classes = classify(&index).expect("classify");
    segment(&index, &classes).expect("segment")
}

const SEVEN_NODE: &str = "\
# two branches off node 3
1 1 0 0 0 1 -1
2 3 1 0 0 1 1
3 3 2 0 0 1 2
4 3 3 1 0 1 3
5 3 3 -1 0 1 3
6 3 4 1 0 1 4
7 3 4 -1 0 1 5
";

const Y_BRANCH: &str = "\
1 1 0 0 0 1 -1
2 3 1 0 0 1 1
3 3 2 0 0 1 2
4 3 3 1 0 1 3
5 3 3 -1 0 1 3
";

#[test]
fn seven_node_tree() {
    let sections = sections_of(SEVEN_NODE);
    let paths: Vec<Vec<NodeId>> = sections.iter().map(|s| s.path.clone()).collect();
    assert_eq!(paths, vec![ids(&[1, 2, 3]), ids(&[3, 4, 6]), ids(&[3, 5, 7])]);
}

#[test]
fn y_branch_end_to_end() {
    let m = parse_swc(Y_BRANCH).expect("parse");
    let out = Pipeline::default().run(&m, None).expect("run");

    assert_eq!(out.repair.path, RepairPath::Reparent);
    let ends: Vec<NodeId> = out.records.iter().map(|r| r.end).collect();
    assert_eq!(ends, ids(&[3, 4, 5]));

    let stem = out.records.iter().find(|r| r.end == NodeId(3)).expect("stem");
    for tip in out.records.iter().filter(|r| r.end != NodeId(3)) {
        assert_eq!(tip.attachment, Some(stem.index));
    }
    let labels: Vec<&str> = out.records.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["soma", "d1", "d2"]);
    assert!((out.records[1].points[1].diameter - 2.0).abs() < f64::EPSILON);
}

#[test]
fn labels_are_deterministic_across_runs() {
    let m = parse_swc(SEVEN_NODE).expect("parse");
    let pipeline = Pipeline::default();
    let first = pipeline.run(&m, None).expect("first");
    for _ in 0..5 {
        let again = pipeline.run(&m, None).expect("again");
        assert_eq!(again.records, first.records);
    }
}

#[test]
fn soma_in_the_middle_becomes_root() {
    // Declared root is a dendrite tip; the soma is node 3.
    let text = "\
1 3 0 0 0 1 -1
2 3 1 0 0 1 1
3 1 2 0 0 4 2
4 3 3 0 0 1 3
5 3 4 0 0 1 4
";
    let out = Pipeline::default().run(&parse_swc(text).expect("parse"), None).expect("run");
    assert_eq!(out.repair.root, NodeId(3));
    assert_eq!(out.stats.sections, 3);
    assert_eq!(out.records[0].label, "soma");
    assert_eq!(out.records[0].points.len(), 1);
}

#[test]
fn star_root_gives_one_section_per_arm() {
    let text = "\
1 1 0 0 0 5 -1
2 3 1 0 0 1 1
3 3 0 1 0 1 1
4 3 0 0 1 1 1
5 3 -1 0 0 1 1
";
    let sections = sections_of(text);
    assert_eq!(sections.len(), 5);
    assert_eq!(sections[0].path, ids(&[1]));
    assert!(sections[1..].iter().all(|s| s.start == NodeId(1) && s.len() == 2));
}

#[test]
fn long_unbranched_chain() {
    let mut text = String::from("1 1 0 0 0 1 -1\n");
    for id in 2..=20_000 {
        text.push_str(&format!("{id} 3 {id} 0 0 1 {}\n", id - 1));
    }
    let out = Pipeline::default().run(&parse_swc(&text).expect("parse"), None).expect("run");
    assert_eq!(out.stats.sections, 1);
    assert_eq!(out.stats.max_section_len, 20_000);
}

#[test]
fn looped_file_is_repaired_from_the_soma() {
    // 2 -> 3 -> 4 -> 2 loop, soma 1 declares 2 as its parent.
    let text = "\
1 1 0 0 0 1 2
2 3 1 0 0 1 4
3 3 2 0 0 1 2
4 3 3 0 0 1 3
5 3 4 0 0 1 4
";
    let out = Pipeline::default().run(&parse_swc(text).expect("parse"), None).expect("run");
    assert_eq!(out.repair.path, RepairPath::CycleBreak);
    assert_eq!(out.repair.morphology.edge_count(), 4);
    assert_eq!(out.repair.dropped.len(), 1);
    assert_ne!(out.input_hash, out.output_hash);
}

#[test]
fn stray_fragment_fails_the_run() {
    let text = "\
1 1 0 0 0 1 -1
2 3 1 0 0 1 1
8 3 5 0 0 1 9
9 3 6 0 0 1 8
";
    let err = Pipeline::default()
        .run(&parse_swc(text).expect("parse"), None)
        .expect_err("8 and 9 are unreachable");
    assert_eq!(
        err,
        MorphologyError::Disconnected {
            root: NodeId(1),
            ids: ids(&[8, 9])
        }
    );
}

#[test]
fn structure_records_serialize_with_stable_keys() {
    let m = parse_swc(Y_BRANCH).expect("parse");
    let out = Pipeline::default().run(&m, None).expect("run");
    let json = serde_json::to_value(&out.records).expect("serialize");

    assert_eq!(json[0]["label"], "soma");
    assert_eq!(json[0]["attachment"], serde_json::Value::Null);
    assert_eq!(json[0]["end"], 3);
    assert_eq!(json[2]["label"], "d2");
    assert_eq!(json[2]["points"][1]["diameter"], 2.0);
    assert_eq!(json[2]["points"][1]["y"], -1.0);
}
