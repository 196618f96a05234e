//! End-to-end pipeline tests against synthetic CDP-shaped fixtures: a raw
//! `DOM.getDocument` tree, a flat `Accessibility.getFullAXTree` node list, and
//! a `DOMSnapshot.captureSnapshot` response, all hand-built to match the real
//! wire shapes without requiring a live browser.

use serde_json::json;

fn dom_root() -> serde_json::Value {
    json!({
        "nodeId": 1,
        "backendNodeId": 100,
        "nodeType": 9,
        "nodeName": "#document",
        "children": [{
            "nodeId": 2,
            "backendNodeId": 101,
            "nodeType": 1,
            "nodeName": "BODY",
            "attributes": [],
            "children": [
                {
                    "nodeId": 3,
                    "backendNodeId": 102,
                    "nodeType": 1,
                    "nodeName": "BUTTON",
                    "attributes": ["id", "submit-btn", "class", "primary"],
                    "children": [{
                        "nodeId": 4,
                        "backendNodeId": 103,
                        "nodeType": 3,
                        "nodeName": "#text",
                        "nodeValue": "Submit"
                    }]
                },
                {
                    "nodeId": 5,
                    "backendNodeId": 104,
                    "nodeType": 1,
                    "nodeName": "SCRIPT",
                    "attributes": [],
                    "children": []
                }
            ]
        }]
    })
}

fn ax_nodes() -> Vec<serde_json::Value> {
    vec![json!({
        "nodeId": "ax-3",
        "backendDOMNodeId": 102,
        "role": {"type": "role", "value": "button"},
        "name": {"type": "computedString", "value": "Submit"},
        "ignored": false,
        "properties": []
    })]
}

fn snapshot_response() -> (serde_json::Value, Vec<String>) {
    let strings = vec![
        "block".to_string(),
        "visible".to_string(),
        "1".to_string(),
        "visible".to_string(),
        "visible".to_string(),
        "pointer".to_string(),
        "auto".to_string(),
        "static".to_string(),
        "rgb(0, 123, 255)".to_string(),
    ];
    let raw = json!({
        "documents": [{
            "nodes": {
                "backendNodeId": [100, 101, 102, 103, 104],
                "isClickable": {"index": [2]}
            },
            "layout": {
                "nodeIndex": [1, 2],
                "bounds": [
                    [0.0, 0.0, 800.0, 600.0],
                    [10.0, 10.0, 100.0, 30.0]
                ],
                "styles": [
                    [0, 1, 2, 3, 4, 5, 6, 7, 8],
                    [0, 1, 2, 3, 4, 5, 6, 7, 8]
                ],
                "paintOrders": [1, 2],
                "stackingContexts": {"index": [0, 0]}
            }
        }]
    });
    (raw, strings)
}

#[test]
fn pipeline_produces_indexed_text_and_selector_map() {
    let dom_root = dom_root();
    let ax = ax_nodes();
    let (snapshot_raw, strings) = snapshot_response();

    let state = dom_projection::build(&dom_root, &ax, &snapshot_raw, &strings, 1.0)
        .expect("pipeline should succeed on well-formed fixtures");

    assert!(!state.selector_map.is_empty(), "button should be addressable");
    let button = state
        .selector_map
        .values()
        .find(|n| n.tag_name == "button")
        .expect("button present in selector map");
    assert_eq!(button.attr("id"), Some("submit-btn"));

    assert!(state.llm_text.contains("button"));
    assert!(!state.llm_text.contains("script"), "script tag must be skipped");
}

#[test]
fn every_rendered_index_is_a_selector_map_key() {
    let dom_root = dom_root();
    let ax = ax_nodes();
    let (snapshot_raw, strings) = snapshot_response();

    let state = dom_projection::build(&dom_root, &ax, &snapshot_raw, &strings, 1.0).unwrap();

    for line in state.llm_text.lines() {
        if let Some(rest) = line.trim_start().strip_prefix('[') {
            if let Some(idx_str) = rest.split(']').next() {
                if let Ok(idx) = idx_str.parse::<i64>() {
                    assert!(
                        state.selector_map.contains_key(&idx),
                        "rendered index {idx} missing from selector map"
                    );
                }
            }
        }
    }
}

#[test]
fn device_pixel_ratio_scales_bounds_down() {
    let dom_root = dom_root();
    let ax = ax_nodes();
    let (snapshot_raw, strings) = snapshot_response();

    let state_1x = dom_projection::build(&dom_root, &ax, &snapshot_raw, &strings, 1.0).unwrap();
    let state_2x = dom_projection::build(&dom_root, &ax, &snapshot_raw, &strings, 2.0).unwrap();

    let button_1x = state_1x.selector_map.values().find(|n| n.tag_name == "button").unwrap();
    let button_2x = state_2x.selector_map.values().find(|n| n.tag_name == "button").unwrap();

    let bounds_1x = button_1x.snapshot.bounds.unwrap();
    let bounds_2x = button_2x.snapshot.bounds.unwrap();
    assert!((bounds_1x.width - bounds_2x.width * 2.0).abs() < 1e-6);
}
