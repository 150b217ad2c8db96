//! Unit tests for lenswatch-core module

use crate::test_utils::*;
use crate::*;
use serde_json::{Value, json};
use std::collections::HashSet;

fn record(value: Value) -> NodeRecord {
    serde_json::from_value(value).unwrap()
}

fn hash_of(value: Value) -> String {
    content_hash(&record(value))
}

fn snapshot_of(pairs: &[(&str, &str)]) -> Snapshot {
    pairs
        .iter()
        .map(|(uid, hash)| (Uid::from(*uid), hash.to_string()))
        .collect()
}

#[test]
fn test_record_decoding_classifies_attributes() {
    let node = record(json!({
        "uid": "0x10",
        "process_name": "svchost.exe",
        "arguments": ["-k", "netsvcs"],
        "env": [{"name": "PATH"}],
        "empty": [],
        "children": [{"uid": "0x11"}, {"uid": "0x12", "process_name": "conhost.exe"}],
    }));

    assert!(matches!(node.get("process_name"), Some(AttrValue::Scalar(_))));
    assert!(matches!(node.get("arguments"), Some(AttrValue::Scalar(_))));
    assert!(matches!(node.get("env"), Some(AttrValue::Scalar(_))));
    assert!(matches!(node.get("empty"), Some(AttrValue::Scalar(_))));
    assert_eq!(node.edges("children").len(), 2);
    assert_eq!(node.edges("children")[1].scalar_str("process_name"), Some("conhost.exe"));
}

#[test]
fn test_null_uid_list_is_scalar() {
    let node = record(json!({
        "uid": "0x10",
        "parent": [{"uid": null, "process_name": "ghost.exe"}],
    }));

    assert!(matches!(node.get("parent"), Some(AttrValue::Scalar(_))));
    assert!(node.edges("parent").is_empty());
}

#[test]
fn test_record_integer_uid_and_round_trip() {
    let node = record(json!({ "uid": 17, "file_path": "/tmp/a" }));
    assert_eq!(node.uid, Uid::from("17"));

    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(value, json!({ "uid": "17", "file_path": "/tmp/a" }));
}

#[test]
fn test_record_without_uid_is_rejected() {
    let err = serde_json::from_value::<NodeRecord>(json!({ "file_path": "/tmp/a" }));
    assert!(err.is_err());
    let err = serde_json::from_value::<NodeRecord>(json!({ "uid": true }));
    assert!(err.is_err());
}

#[test]
fn test_hash_independent_of_attribute_order() {
    let a: NodeRecord = serde_json::from_str(
        r#"{"uid":"0x1","process_name":"a.exe","process_id":4,"bin_file":[{"uid":"0x2"}],"children":[{"uid":"0x3"}]}"#,
    )
    .unwrap();
    let b: NodeRecord = serde_json::from_str(
        r#"{"children":[{"uid":"0x3"}],"process_id":4,"bin_file":[{"uid":"0x2"}],"uid":"0x1","process_name":"a.exe"}"#,
    )
    .unwrap();
    assert_eq!(content_hash(&a), content_hash(&b));
}

#[test]
fn test_hash_independent_of_edge_order() {
    let uids = ["0x3", "0x4", "0x5", "0x6"];
    let base = hash_of(with_edges(
        process("0x1", "a.exe", 4),
        "children",
        uids.iter().map(|u| json!({ "uid": u })).collect(),
    ));

    // Every rotation and the reversal of the edge list.
    for shift in 0..uids.len() {
        let mut order = uids.to_vec();
        order.rotate_left(shift);
        let rotated = hash_of(with_edges(
            process("0x1", "a.exe", 4),
            "children",
            order.iter().map(|u| json!({ "uid": u })).collect(),
        ));
        assert_eq!(base, rotated);

        order.reverse();
        let reversed = hash_of(with_edges(
            process("0x1", "a.exe", 4),
            "children",
            order.iter().map(|u| json!({ "uid": u })).collect(),
        ));
        assert_eq!(base, reversed);
    }
}

#[test]
fn test_hash_sensitive_to_structural_mutations() {
    let base = with_edges(
        with_edges(process("0x1", "a.exe", 4), "children", vec![json!({"uid": "0x3"})]),
        "bin_file",
        vec![json!({"uid": "0x2"})],
    );

    let mut mutants = vec![base.clone()];
    for i in 0..64i64 {
        mutants.push(with_scalar(base.clone(), "process_id", json!(i + 100)));
        mutants.push(with_scalar(base.clone(), "process_name", json!(format!("p{}.exe", i))));
        mutants.push(with_scalar(base.clone(), &format!("extra_{}", i), json!(i)));
        mutants.push(with_edges(
            base.clone(),
            "children",
            vec![json!({"uid": "0x3"}), json!({"uid": format!("0x{:x}", 0x100 + i)})],
        ));
        mutants.push(with_edges(
            base.clone(),
            &format!("created_file_{}", i),
            vec![json!({"uid": "0x9"})],
        ));
    }
    let mut removed_scalar = base.clone();
    removed_scalar.as_object_mut().unwrap().remove("process_name");
    mutants.push(removed_scalar);
    let mut removed_edge = base.clone();
    removed_edge.as_object_mut().unwrap().remove("bin_file");
    mutants.push(removed_edge);
    mutants.push(with_edges(base.clone(), "children", vec![]));

    let hashes: HashSet<String> = mutants.iter().cloned().map(hash_of).collect();
    assert_eq!(hashes.len(), mutants.len());
}

#[test]
fn test_scenario_new_member_reported() {
    let a = process("0xa", "a.exe", 1);
    let h_a = hash_of(a.clone());
    let g = graph(vec![lens_root("0x1", "L1", vec![a, process("0xb", "b.exe", 2)])]);

    let diff = DiffEngine::new("L1").evaluate(g, &snapshot_of(&[("0xa", h_a.as_str())]));

    let updated: Vec<_> = diff.updated_nodes.iter().map(|n| n.uid.as_str()).collect();
    assert_eq!(updated, vec!["0xb"]);
    assert!(diff.removed_nodes.is_empty());
}

#[test]
fn test_scenario_vanished_member_reported() {
    let a = process("0xa", "a.exe", 1);
    let h_a = hash_of(a.clone());
    let g = graph(vec![lens_root("0x1", "L1", vec![a])]);

    let diff = DiffEngine::new("L1").evaluate(g, &snapshot_of(&[("0xa", h_a.as_str()), ("0xz", "h_z")]));

    assert!(diff.updated_nodes.is_empty());
    assert_eq!(diff.removed_nodes, vec![Uid::from("0xz")]);
}

#[test]
fn test_scenario_risk_score_change() {
    let before = with_scalar(process("0xa", "a.exe", 1), "risk_score", json!(10));
    let after = with_scalar(process("0xa", "a.exe", 1), "risk_score", json!(90));
    let engine = DiffEngine::new("L1");

    let first = engine.evaluate(graph(vec![lens_root("0x1", "L1", vec![before])]), &Snapshot::new());
    let second = engine.evaluate(
        graph(vec![lens_root("0x1", "L1", vec![after])]),
        &first.uid_hashes,
    );

    assert_eq!(second.updated_nodes.len(), 1);
    assert_eq!(second.updated_nodes[0].scalar("risk_score"), Some(&json!(90)));
}

#[test]
fn test_diff_completeness() {
    let members: Vec<Value> = (0..6).map(|i| process(&format!("0x{}", i), "p.exe", i)).collect();
    let hashes: Vec<String> = members.iter().cloned().map(hash_of).collect();
    let g = graph(vec![lens_root("0xl", "L1", members)]);

    // Known & current: 0x0, 0x1. Stale hash: 0x2. Unknown: 0x3..0x5. Gone: 0xdead.
    let snapshot = snapshot_of(&[
        ("0x0", hashes[0].as_str()),
        ("0x1", hashes[1].as_str()),
        ("0x2", "stale"),
        ("0xdead", "gone"),
    ]);
    let diff = compute_diff(&g, &snapshot);

    let updated: HashSet<&str> = diff.updated_nodes.iter().map(|n| n.uid.as_str()).collect();
    assert_eq!(updated, HashSet::from(["0x2", "0x3", "0x4", "0x5"]));
    assert_eq!(diff.removed_nodes, vec![Uid::from("0xdead")]);
}

#[test]
fn test_diff_idempotent_against_own_output() {
    let g = graph(vec![lens_root(
        "0x1",
        "L1",
        vec![
            with_edges(
                process("0xa", "a.exe", 1),
                "children",
                vec![neighbour("0xc", vec![owner("0x1", "L1")])],
            ),
            file("0xb", "/etc/passwd"),
        ],
    )]);
    let engine = DiffEngine::new("L1");

    let first = engine.evaluate(g.clone(), &snapshot_of(&[("0xold", "h")]));
    assert_eq!(first.updated_nodes.len(), 2);
    assert_eq!(first.removed_nodes, vec![Uid::from("0xold")]);

    let second = engine.evaluate(g, &first.uid_hashes);
    assert!(second.is_empty());
    assert_eq!(second.uid_hashes, first.uid_hashes);
}

#[test]
fn test_filter_prunes_foreign_neighbours() {
    let mut g = graph(vec![lens_root(
        "0x1",
        "L1",
        vec![with_edges(
            process("0xa", "a.exe", 1),
            "children",
            vec![
                neighbour("0xc", vec![owner("0x1", "L1")]),
                neighbour("0xd", vec![owner("0x2", "L2")]),
                neighbour("0xe", vec![owner("0x2", "L2"), risk_owner("0x7", "odd_parent", 80)]),
                neighbour("0xf", vec![]),
            ],
        )],
    )]);

    strip_graph(&mut g, "L1");

    let kept: Vec<&str> = g.roots[0].scope()[0]
        .edges("children")
        .iter()
        .map(|n| n.uid.as_str())
        .collect();
    assert_eq!(kept, vec!["0xc", "0xe"]);
}

#[test]
fn test_filter_idempotent() {
    let mut g = graph(vec![lens_root(
        "0x1",
        "L1",
        vec![
            with_edges(
                process("0xa", "a.exe", 1),
                "children",
                vec![
                    neighbour("0xc", vec![owner("0x1", "L1")]),
                    neighbour("0xd", vec![owner("0x2", "L2")]),
                ],
            ),
            with_edges(
                file("0xb", "/bin/sh"),
                "risks",
                vec![json!({"uid": "0x9", "analyzer_name": "a"})],
            ),
        ],
    )]);

    strip_graph(&mut g, "L1");
    let once = g.clone();
    strip_graph(&mut g, "L1");
    assert_eq!(g, once);
}

#[test]
fn test_foreign_neighbour_does_not_change_hash() {
    let member = |children: Vec<Value>| {
        graph(vec![lens_root(
            "0x1",
            "L1",
            vec![with_edges(process("0xa", "a.exe", 1), "children", children)],
        )])
    };
    let engine = DiffEngine::new("L1");

    let base = engine.evaluate(
        member(vec![neighbour("0xc", vec![owner("0x1", "L1")])]),
        &Snapshot::new(),
    );
    let with_foreign = engine.evaluate(
        member(vec![
            neighbour("0xc", vec![owner("0x1", "L1")]),
            neighbour("0xd", vec![owner("0x2", "L2")]),
        ]),
        &base.uid_hashes,
    );
    assert!(with_foreign.is_empty());
}
