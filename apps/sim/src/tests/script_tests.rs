use super::*;

use shared::{error::ChannelKind, protocol::GesturePhase};

const SCALE_SCRIPT: &str = r#"
[[entities]]
name = "cube"
position = [0.0, 0.0, -2.0]
scale = [0.5, 0.5, 0.5]
collider = [1.0, 1.0, 1.0]
behaviors = ["rotate", "scale"]

[[steps]]
tick = { forward = [0.0, 0.0, -1.0] }

[[steps]]
say = "Scale"

[[steps]]
gesture = { source = 7, input = { type = "manipulation", phase = "started", delta = [0.0, 0.0, 0.0] } }

[[steps]]
gesture = { source = 7, input = { type = "manipulation", phase = "updated", delta = [0.25, 0.0, 0.0] } }

[[steps]]
gesture = { source = 7, input = { type = "navigation", phase = "started", position = [0.0, 0.0, 0.0] } }

[[steps]]
tick = { forward = [0.0, 0.0, 1.0] }
"#;

fn transform_of(simulation: &Simulation, name: &str) -> Option<Transform> {
    let scene = simulation.scene.borrow();
    let id = scene.find_by_name(name)?;
    scene.entity(id).map(|record| record.transform)
}

fn build(raw: &str) -> (Script, Simulation) {
    let script = Script::from_toml(raw).expect("script");
    let simulation = Simulation::build(&script.entities, &Settings::default()).expect("build");
    (script, simulation)
}

#[test]
fn scripted_scale_gesture_is_traced_and_reverted_on_focus_loss() {
    let (script, mut simulation) = build(SCALE_SCRIPT);
    let cube = simulation.session().focused();
    assert_eq!(cube, None);

    let trace: Vec<Vec<TraceEvent>> = script
        .steps
        .iter()
        .map(|step| simulation.step(step))
        .collect();

    assert!(matches!(
        trace[0].as_slice(),
        [TraceEvent::Focus(FocusChanged { previous: None, current: Some(_) })]
    ));
    assert_eq!(
        trace[1],
        vec![TraceEvent::ModeSwitched {
            vocabulary: GestureVocabulary::Manipulation
        }]
    );
    assert!(matches!(trace[3].as_slice(), [TraceEvent::Gesture(event)]
        if event.kind() == InteractionKind::ManipulationUpdated));
    assert_eq!(
        trace[4],
        vec![TraceEvent::Unrecognized {
            kind: InteractionKind::NavigationStarted
        }]
    );

    let kinds: Vec<_> = trace[5]
        .iter()
        .map(|event| match event {
            TraceEvent::Gesture(gesture) => format!("{:?}", gesture.kind()),
            TraceEvent::Focus(change) => format!("focus {:?}", change.current),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec!["ManipulationCanceled", "focus None"]);

    let transform = transform_of(&simulation, "cube").expect("cube");
    assert_eq!(transform.scale, Vec3::splat(0.5));
}

#[test]
fn run_writes_json_lines_and_final_transforms() {
    let (script, mut simulation) = build(SCALE_SCRIPT);
    let mut out = Vec::new();
    simulation.run(&script.steps, &mut out).expect("run");

    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines[0]["event"], "focus");
    assert_eq!(lines[1]["event"], "mode_switched");
    assert_eq!(lines[1]["vocabulary"], "manipulation");
    assert_eq!(lines[2]["event"], "gesture");
    assert_eq!(lines[2]["input"]["type"], "manipulation");
    assert_eq!(lines[2]["input"]["phase"], "started");

    let last = lines.last().expect("transform line");
    assert_eq!(last["event"], "transform");
    assert_eq!(last["entity"], "cube");
}

#[test]
fn tap_to_place_moves_parent_onto_mesh() {
    let (script, mut simulation) = build(
        r#"
[[entities]]
name = "floor"
position = [0.0, -1.5, 0.0]
collider = [20.0, 0.5, 20.0]
spatial_mapping = true

[[entities]]
name = "anchor"
position = [0.0, 0.0, -2.0]

[[entities]]
name = "hologram"
parent = "anchor"
collider = [0.25, 0.25, 0.25]
behaviors = ["place"]

[[steps]]
tick = { forward = [0.0, 0.0, -1.0] }

[[steps]]
gesture = { source = 1, input = { type = "tap", tap_count = 1 } }

[[steps]]
tick = { position = [0.0, 0.0, 0.0], forward = [0.0, -1.0, -1.0] }
"#,
    );

    let mut events = Vec::new();
    for step in &script.steps {
        events.extend(simulation.step(step));
    }
    assert!(events.contains(&TraceEvent::MeshVisibility { visible: true }));

    let anchor = transform_of(&simulation, "anchor").expect("anchor");
    assert!((anchor.position - Vec3::new(0.0, -1.0, -1.0)).length() < 1e-4);
}

#[test]
fn hand_presence_and_keywords_are_traced() {
    let (_, mut simulation) = build("");
    assert!(simulation.step(&Step::SourceDetected(3)).contains(&TraceEvent::HandPresence(
        HandPresenceChanged {
            hand_detected: true
        }
    )));
    assert!(simulation.step(&Step::SourceDetected(4)).is_empty());
    assert!(simulation.step(&Step::SourceLost(3)).is_empty());
    assert_eq!(
        simulation.step(&Step::SourceLost(4)),
        vec![TraceEvent::HandPresence(HandPresenceChanged {
            hand_detected: false
        })]
    );

    let reset = simulation.step(&Step::Say("Reset".to_string()));
    assert!(matches!(reset.as_slice(), [TraceEvent::Keyword(event)] if event.is_reset()));
    assert!(simulation.step(&Step::Say("Jump".to_string())).is_empty());
}

#[test]
fn configured_keywords_reach_the_session() {
    let script = Script::from_toml("").expect("script");
    let settings = Settings {
        keywords: vec![(
            "Bigger".to_string(),
            KeywordCommand::ModeSwitch(GestureVocabulary::Manipulation),
        )],
        ..Settings::default()
    };
    let mut simulation = Simulation::build(&script.entities, &settings).expect("build");

    assert!(simulation.session().phrases().contains(&"Bigger".to_string()));
    assert_eq!(
        simulation.step(&Step::Say("Bigger".to_string())),
        vec![TraceEvent::ModeSwitched {
            vocabulary: GestureVocabulary::Manipulation
        }]
    );
}

#[test]
fn invalid_scripts_are_rejected() {
    let forward_parent = Script::from_toml(
        r#"
[[entities]]
name = "child"
parent = "later"

[[entities]]
name = "later"
"#,
    )
    .expect("script");
    let error = Simulation::build(&forward_parent.entities, &Settings::default())
        .err()
        .expect("forward parent");
    assert!(error.to_string().contains("later"));

    let duplicate = Script::from_toml("[[entities]]\nname = \"a\"\n[[entities]]\nname = \"a\"\n")
        .expect("script");
    assert!(Simulation::build(&duplicate.entities, &Settings::default()).is_err());

    assert!(Script::from_toml("[[steps]]\njump = 1\n").is_err());
}

#[test]
fn shutdown_detaches_all_behaviors() {
    let (_, simulation) = build(SCALE_SCRIPT);
    let bus = simulation.session().bus().clone();
    // Behaviors plus the trace recorder.
    assert_eq!(bus.subscriber_count(ChannelKind::Gesture), 3);
    simulation.shutdown().expect("shutdown");
    assert_eq!(bus.subscriber_count(ChannelKind::Gesture), 0);
}

#[test]
fn phase_names_in_scripts_match_protocol() {
    let script = Script::from_toml(
        "[[steps]]\ngesture = { source = 2, input = { type = \"navigation\", phase = \"canceled\", position = [0.1, 0.0, 0.0] } }\n",
    )
    .expect("script");
    match &script.steps[0] {
        Step::Gesture(raw) => assert_eq!(raw.input.phase(), Some(GesturePhase::Canceled)),
        other => panic!("unexpected step {other:?}"),
    }
}
