use std::cell::Cell;
use std::io::{Cursor, Read};

use serde_json::{json, Value};

use super::*;
use crate::bundle::MemoryAssets;
use crate::document::{FssConfig, LayerConfig, LayerKind, SceneStateDocument};
use crate::host::{GuiLayer, RecordingHost};
use crate::scene::{Scene, Vec3, VertexSnapshot};

/// Builder that restores from the seed when given one and otherwise
/// produces a fixed two-vertex scene, counting every call.
#[derive(Default)]
struct CountingBuilder {
    calls: Cell<usize>,
}

impl CountingBuilder {
    fn calls(&self) -> usize {
        self.calls.get()
    }
}

fn fresh_vertex(i: usize) -> VertexSnapshot {
    VertexSnapshot {
        v0: Vec3([i as f64, 0.0, 0.0]),
        time: 0.0,
        anchor: Vec3([0.0, 0.0, 0.0]),
        gradient: 0.0,
    }
}

impl SceneBuilder for CountingBuilder {
    fn build(&self, _config: &FssConfig, fuzz: Option<&[VertexSnapshot]>) -> Option<Scene> {
        self.calls.set(self.calls.get() + 1);
        Some(match fuzz {
            Some(seed) => Scene::from_snapshot(seed),
            None => Scene::from_snapshot(&[fresh_vertex(0), fresh_vertex(1)]),
        })
    }
}

type TestController = SceneController<RecordingHost, CountingBuilder>;

fn controller() -> TestController {
    SceneController::new(RecordingHost::default(), CountingBuilder::default())
}

fn fuzz_json() -> Value {
    json!([
        { "v0": [0.1, 0.2, 0.0], "time": 12.5, "anchor": [0.0, 0.0, 1.0], "gradient": 0.3 },
        { "v0": { "0": 1.0, "1": 2.0, "2": 0.0 }, "time": 3.0, "anchor": [1.0, 1.0, 1.0], "gradient": 0.9 }
    ])
}

fn doc_with(layers: Value) -> String {
    json!({
        "theta": 0.25,
        "size": [1500, 800],
        "origin": [0, 0],
        "mouse": [10, 20],
        "now": 42.0,
        "layers": layers,
    })
    .to_string()
}

fn sample_doc() -> String {
    doc_with(json!([
        {
            "type": "fss-mirror",
            "blend": "normal",
            "config": {
                "faces": { "x": 12, "y": 15 },
                "lights": { "ambient": ["#000000", 0.0], "diffuse": ["#ffffff", 0.7] },
                "lightSpeed": 540.0,
                "renderMode": "triangles"
            },
            "sceneFuzz": fuzz_json()
        },
        {
            "type": "svg-image",
            "blend": "screen",
            "config": { "href": "./assets/logo.svg" }
        }
    ]))
}

/// The state the host hands over on export: same stack, configs blanked.
fn host_state() -> String {
    doc_with(json!([
        { "type": "fss-mirror", "blend": "normal", "config": "" },
        { "type": "svg-image", "blend": "screen", "config": "" }
    ]))
}

#[test]
fn import_sends_commands_in_order() {
    let mut ctl = controller();
    let summary = ctl.import_state(&sample_doc()).unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            layer_count: 2,
            mirrored_count: 1,
            blends: "normal:screen".to_string(),
        }
    );
    assert_eq!(
        ctl.host().ports(),
        vec!["pause", "initLayers", "import_", "configureMirroredFss", "rebuildFss"]
    );
    assert_eq!(ctl.host().fragment.as_deref(), Some("#blends=normal:screen"));
    assert_eq!(ctl.builder().calls(), 1);
    assert_eq!(ctl.session().layers().len(), 2);
    assert_eq!(ctl.session().scenes().len(), 1);
}

#[test]
fn import_forwards_kinds_and_reduced_payload() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    let sent = &ctl.host().sent;

    assert_eq!(
        sent[1],
        HostCommand::InitLayers(vec![LayerKind::MirroredFss, LayerKind::SvgImage])
    );

    let import_text = sent[2].payload();
    let payload: Value = serde_json::from_str(import_text.as_str().unwrap()).unwrap();
    assert_eq!(payload["layers"][0], json!({ "kind": "fss-mirror", "blend": "normal", "config": "" }));
    assert_eq!(payload["layers"][1]["config"], json!(""));
    assert_eq!(payload["mouse"], json!([10.0, 20.0]));

    match &sent[3] {
        HostCommand::ConfigureMirroredFss { config, layer } => {
            assert_eq!(*layer, 0);
            assert_eq!(config.light_speed(), Some(540.0));
        }
        other => panic!("expected configureMirroredFss, got {other:?}"),
    }
    match &sent[4] {
        HostCommand::RebuildFss { scene, layer } => {
            assert_eq!(*layer, 0);
            assert_eq!(scene.vertex_count(), 2);
        }
        other => panic!("expected rebuildFss, got {other:?}"),
    }
}

#[test]
fn import_of_empty_stack_builds_nothing() {
    let mut ctl = controller();
    let summary = ctl.import_state(&doc_with(json!([]))).unwrap();

    assert_eq!(summary.blends, "");
    assert_eq!(summary.layer_count, 0);
    assert_eq!(ctl.builder().calls(), 0);
    assert_eq!(ctl.host().fragment.as_deref(), Some("#blends="));
    assert_eq!(ctl.host().ports(), vec!["pause", "initLayers", "import_"]);
}

#[test]
fn import_resets_previous_session() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    ctl.import_state(&doc_with(json!([{ "type": "text", "blend": "normal" }])))
        .unwrap();

    assert_eq!(ctl.session().layers().len(), 1);
    assert!(ctl.session().scenes().is_empty());
    assert_eq!(ctl.session().layer(0).unwrap().kind, LayerKind::Text);
}

#[test]
fn malformed_import_alerts_once_and_keeps_session() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    let layers_before = ctl.session().layers().clone();
    let scenes_before = ctl.session().scenes().clone();
    ctl.host_mut().clear();

    let effect = ctl.submit_import("{ \"theta\": ");
    assert_eq!(effect, Some(UiEffect::Alert(ALERT_IMPORT_FAILED.to_string())));
    assert_eq!(ctl.session().layers(), &layers_before);
    assert_eq!(ctl.session().scenes(), &scenes_before);
    assert!(ctl.host().sent.is_empty());
    assert!(ctl.host().fragment.is_none());
}

#[test]
fn empty_import_text_is_rejected() {
    let mut ctl = controller();
    assert_eq!(
        ctl.submit_import(""),
        Some(UiEffect::Alert(ALERT_NOTHING_TO_IMPORT.to_string()))
    );
    assert!(ctl.host().sent.is_empty());
    assert_eq!(ctl.submit_import(&sample_doc()), None);
}

#[test]
fn export_restores_cached_configs() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    ctl.host_mut().clear();

    let doc = ctl.export_document(&host_state()).unwrap();
    assert_eq!(ctl.host().ports(), vec!["pause"]);

    let fss = doc.layers[0].config.as_fss().unwrap();
    assert_eq!(fss.light_speed(), Some(540.0));
    assert_eq!(fss.extra.get("renderMode"), Some(&json!("triangles")));
    match &doc.layers[1].config {
        LayerConfig::Opaque(map) => assert_eq!(map.get("href"), Some(&json!("./assets/logo.svg"))),
        other => panic!("expected opaque config, got {other:?}"),
    }
}

#[test]
fn export_leaves_non_mirrored_layers_without_fuzz() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    let text = ctl.export_state(&host_state()).unwrap();

    let out: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(out["layers"][1]["sceneFuzz"], Value::Null);
    assert!(out["layers"][0]["sceneFuzz"].is_array());
}

#[test]
fn export_reuses_live_scene_snapshot() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    assert_eq!(ctl.builder().calls(), 1);

    let doc = ctl.export_document(&host_state()).unwrap();
    assert_eq!(ctl.builder().calls(), 1, "cached scene must not be rebuilt");

    let expected: Vec<VertexSnapshot> = serde_json::from_value(fuzz_json()).unwrap();
    assert_eq!(doc.layers[0].scene_fuzz.as_ref(), Some(&expected));
}

#[test]
fn export_without_live_scene_rebuilds_from_config() {
    let mut ctl = controller();
    let doc = ctl.export_document(&host_state()).unwrap();

    assert_eq!(ctl.builder().calls(), 1);
    assert_eq!(
        doc.layers[0].scene_fuzz,
        Some(vec![fresh_vertex(0), fresh_vertex(1)])
    );
    assert!(doc.layers[0].config.is_empty());
    assert!(doc.layers[1].config.is_empty());
}

#[test]
fn export_with_no_scene_at_all_writes_null_fuzz() {
    let builder = |_: &FssConfig, _: Option<&[VertexSnapshot]>| -> Option<Scene> { None };
    let mut ctl = SceneController::new(RecordingHost::default(), builder);
    let doc = ctl.export_document(&host_state()).unwrap();
    assert!(doc.layers[0].scene_fuzz.is_none());
}

#[test]
fn export_then_import_round_trips_layers() {
    let mut first = controller();
    first.import_state(&sample_doc()).unwrap();
    let exported = first.export_state(&host_state()).unwrap();

    let mut second = controller();
    second.import_state(&exported).unwrap();
    let reexported = second.export_document(&host_state()).unwrap();

    let original = SceneStateDocument::from_json(&sample_doc()).unwrap();
    assert_eq!(reexported.layers.len(), original.layers.len());
    for (a, b) in original.layers.iter().zip(&reexported.layers) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.blend, b.blend);
        assert_eq!(a.config, b.config);
    }
}

#[test]
fn export_never_reads_host_configs() {
    let mut ctl = controller();
    ctl.import_state(&doc_with(json!([
        { "type": "fss-mirror", "blend": "normal", "config": { "lightSpeed": 5 } },
        { "type": "text", "blend": "screen", "config": { "text": "hello" } }
    ])))
    .unwrap();

    let state = doc_with(json!([
        {
            "type": "fss-mirror",
            "blend": "normal",
            "config": { "faces": { "x": 12.5, "y": 3 } },
            "sceneFuzz": "stale"
        },
        { "type": "text", "blend": "screen", "config": 42 }
    ]));
    let doc = ctl.export_document(&state).expect("host configs are discarded");

    assert_eq!(doc.layers[0].config.as_fss().unwrap().light_speed(), Some(5.0));
    assert_eq!(doc.layers[0].config.as_fss().unwrap().faces, None);
    match &doc.layers[1].config {
        LayerConfig::Opaque(map) => assert_eq!(map.get("text"), Some(&json!("hello"))),
        other => panic!("expected opaque config, got {other:?}"),
    }
}

fn decorated_scene() -> Value {
    json!({
        "lights": [{ "ambient": "#000000", "diffuse": "#ffffff" }],
        "meshes": [{
            "geometry": {
                "triangles": [[0, 1, 2]],
                "vertices": [{
                    "v0": [0.0, 1.0, 0.0],
                    "time": 1.0,
                    "anchor": [0.0, 1.0, 0.0],
                    "gradient": 0.5,
                    "color": "#fff"
                }]
            },
            "material": { "ambient": "#555555", "diffuse": "#ffffff" }
        }]
    })
}

#[test]
fn built_scene_reaches_host_unchanged() {
    let builder = |_: &FssConfig, _: Option<&[VertexSnapshot]>| -> Option<Scene> {
        serde_json::from_value(decorated_scene()).ok()
    };
    let mut ctl = SceneController::new(RecordingHost::default(), builder);
    ctl.import_state(&doc_with(json!([
        { "type": "fss-mirror", "blend": "normal", "config": {} }
    ])))
    .unwrap();

    let rebuild = ctl
        .host()
        .sent
        .iter()
        .find(|c| c.port() == "rebuildFss")
        .expect("scene sent");
    assert_eq!(rebuild.payload(), json!([decorated_scene(), 0]));

    ctl.host_mut().clear();
    let model = GuiModel {
        layers: vec![GuiLayer { kind: LayerKind::MirroredFss }],
        fss: FssConfig::default(),
    };
    assert_eq!(ctl.rebuild_mirrored(&model), 1);
    assert_eq!(ctl.host().sent[0].payload(), json!([decorated_scene(), 0]));
}

#[tokio::test]
async fn malformed_export_event_alerts_once() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    let layers_before = ctl.session().layers().clone();

    let effect = ctl
        .dispatch(HostEvent::Export("not json".into()), &MemoryAssets::new())
        .await;
    assert_eq!(effect, Some(UiEffect::Alert(ALERT_EXPORT_FAILED.to_string())));
    assert_eq!(ctl.session().layers(), &layers_before);
    assert_eq!(ctl.session().scenes().len(), 1);
}

#[tokio::test]
async fn export_event_shows_code() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    let effect = ctl
        .dispatch(HostEvent::Export(host_state()), &MemoryAssets::new())
        .await;
    match effect {
        Some(UiEffect::ShowExport(code)) => assert!(code.contains("\"sceneFuzz\"")),
        other => panic!("expected export code, got {other:?}"),
    }
}

#[tokio::test]
async fn zip_export_is_all_or_nothing() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();
    ctl.host_mut().clear();

    let only_player = MemoryAssets::new().with("player.bundle.js", b"player".to_vec());
    let effect = ctl
        .dispatch(HostEvent::ExportZip(host_state()), &only_player)
        .await;

    assert_eq!(effect, Some(UiEffect::Alert(ALERT_ZIP_FAILED.to_string())));
    assert!(ctl.host().sent.is_empty(), "nothing is exported before both assets arrive");
}

#[tokio::test]
async fn zip_export_offers_archive_download() {
    let mut ctl = controller();
    ctl.import_state(&sample_doc()).unwrap();

    let assets = MemoryAssets::new()
        .with("player.bundle.js", b"player".to_vec())
        .with("index.player.html", b"<html></html>".to_vec());
    let effect = ctl
        .dispatch(HostEvent::ExportZip(host_state()), &assets)
        .await;

    let (file_name, bytes) = match effect {
        Some(UiEffect::Download { file_name, bytes }) => (file_name, bytes),
        other => panic!("expected download, got {other:?}"),
    };
    assert_eq!(file_name, "export.zip");

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 3);
    let mut script = String::new();
    archive
        .by_name("scene.js")
        .unwrap()
        .read_to_string(&mut script)
        .unwrap();
    let json = script
        .strip_prefix("window.jsGenScene = ")
        .and_then(|s| s.strip_suffix(';'))
        .unwrap();
    let doc = SceneStateDocument::from_json(json).unwrap();
    assert_eq!(doc.layers.len(), 2);
    assert!(doc.layers[0].scene_fuzz.is_some());
}

#[tokio::test]
async fn gui_start_rebuilds_mirrored_layers_only() {
    let mut ctl = controller();
    let model = GuiModel {
        layers: vec![
            GuiLayer { kind: LayerKind::Text },
            GuiLayer { kind: LayerKind::MirroredFss },
            GuiLayer { kind: LayerKind::MirroredFss },
        ],
        fss: FssConfig::default(),
    };

    let effect = ctl
        .dispatch(HostEvent::StartGui(model.clone()), &MemoryAssets::new())
        .await;
    assert!(effect.is_none());

    let layers: Vec<usize> = ctl
        .host()
        .sent
        .iter()
        .filter_map(|c| match c {
            HostCommand::RebuildFss { layer, .. } => Some(*layer),
            _ => None,
        })
        .collect();
    assert_eq!(layers, vec![1, 2]);

    ctl.dispatch(HostEvent::RequestFssRebuild(model), &MemoryAssets::new())
        .await;
    assert_eq!(ctl.host().count("rebuildFss"), 4);
}

#[test]
fn relay_and_start_reach_the_host() {
    let mut ctl = controller();
    ctl.start();
    ctl.relay(ControlChange::FacesX(11.5));
    ctl.relay(ControlChange::CustomSize("1024,oops".into()));

    assert_eq!(
        ctl.host().sent,
        vec![
            HostCommand::Bang,
            HostCommand::ChangeFacesX(12),
            HostCommand::SetCustomSize(Some(1024), None),
        ]
    );
}
