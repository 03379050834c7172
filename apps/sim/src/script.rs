//! Scripted sessions: a scene description plus an ordered list of inputs,
//! replayed against a live interaction session.

use std::{cell::RefCell, collections::HashMap, io::Write, rc::Rc};

use anyhow::{anyhow, Context};
use behaviors::{GestureRotation, GestureScaling, SharedVisualizer, TapToPlace};
use glam::{Quat, Vec3};
use interaction::{
    InteractionSession, MeshVisualizer, SessionOptions, SimulatedGestureDevice, Subscription,
};
use scene::{Collider, Scene};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{EntityId, GestureVocabulary, LayerMask, SourceId, Transform, ViewerPose},
    protocol::{
        FocusChanged, GestureEvent, HandPresenceChanged, InteractionKind, KeywordCommand,
        KeywordEvent, RawGesture,
    },
};
use tracing::{debug, info};

use crate::config::Settings;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySpec {
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    /// Name of an entity declared earlier in the script.
    pub parent: Option<String>,
    /// Box half extents.
    pub collider: Option<Vec3>,
    /// Puts the collider on the spatial-mapping layer instead of the default one.
    #[serde(default)]
    pub spatial_mapping: bool,
    #[serde(default)]
    pub behaviors: Vec<BehaviorKind>,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Rotate,
    Scale,
    Place,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Tick(PoseStep),
    Gesture(RawGesture),
    Say(String),
    SourceDetected(u32),
    SourceLost(u32),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoseStep {
    #[serde(default)]
    pub position: Vec3,
    pub forward: Vec3,
}

impl PoseStep {
    fn pose(&self) -> ViewerPose {
        ViewerPose::looking(self.position, self.forward)
    }
}

/// One line of simulator output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Focus(FocusChanged),
    Gesture(GestureEvent),
    Keyword(KeywordEvent),
    HandPresence(HandPresenceChanged),
    ModeSwitched { vocabulary: GestureVocabulary },
    Unrecognized { kind: InteractionKind },
    MeshVisibility { visible: bool },
    Transform { entity: String, transform: Transform },
}

type TraceLog = Rc<RefCell<Vec<TraceEvent>>>;

struct TracingVisualizer {
    trace: TraceLog,
}

impl MeshVisualizer for TracingVisualizer {
    fn set_draw_visual_meshes(&mut self, visible: bool) {
        info!(visible, "spatial mesh visibility changed");
        self.trace
            .borrow_mut()
            .push(TraceEvent::MeshVisibility { visible });
    }
}

pub struct Simulation {
    scene: Rc<RefCell<Scene>>,
    device: SimulatedGestureDevice,
    session: InteractionSession,
    names: Vec<(EntityId, String)>,
    rotations: Vec<GestureRotation>,
    scalings: Vec<GestureScaling>,
    placements: Vec<TapToPlace>,
    trace: TraceLog,
    _recorders: Vec<Subscription>,
}

impl Simulation {
    pub fn build(entities: &[EntitySpec], settings: &Settings) -> anyhow::Result<Self> {
        let mut scene = Scene::new();
        let mut ids: HashMap<&str, EntityId> = HashMap::new();
        let mut names = Vec::with_capacity(entities.len());

        for spec in entities {
            if ids.contains_key(spec.name.as_str()) {
                return Err(anyhow!("entity '{}' is declared twice", spec.name));
            }
            let transform = Transform {
                position: spec.position,
                rotation: Quat::from_rotation_y(spec.yaw_degrees.to_radians()),
                scale: spec.scale,
            };
            let id = match &spec.parent {
                Some(parent) => {
                    let parent_id = ids.get(parent.as_str()).copied().ok_or_else(|| {
                        anyhow!(
                            "entity '{}' names parent '{parent}' before it is declared",
                            spec.name
                        )
                    })?;
                    scene.spawn_child(parent_id, spec.name.clone(), transform)?
                }
                None => scene.spawn(spec.name.clone(), transform),
            };
            if let Some(half_extents) = spec.collider {
                let layer = if spec.spatial_mapping {
                    LayerMask::SPATIAL_MAPPING
                } else {
                    LayerMask::DEFAULT
                };
                scene.set_collider(id, Collider { half_extents, layer })?;
            }
            ids.insert(spec.name.as_str(), id);
            names.push((id, spec.name.clone()));
        }

        let scene = Rc::new(RefCell::new(scene));
        let device = SimulatedGestureDevice::new();
        let session = InteractionSession::new(
            device.factory(),
            SessionOptions {
                initial_vocabulary: settings.default_vocabulary,
                keyword_bindings: settings.keywords.clone(),
                ..SessionOptions::default()
            },
        );
        let trace: TraceLog = Rc::new(RefCell::new(Vec::new()));
        let visualizer: SharedVisualizer = Rc::new(RefCell::new(TracingVisualizer {
            trace: trace.clone(),
        }));

        let mut rotations = Vec::new();
        let mut scalings = Vec::new();
        let mut placements = Vec::new();
        for (spec, (id, _)) in entities.iter().zip(&names) {
            for behavior in &spec.behaviors {
                let bus = session.bus();
                let attached = match behavior {
                    BehaviorKind::Rotate => {
                        GestureRotation::attach(bus, scene.clone(), *id, settings.rotation)
                            .map(|behavior| rotations.push(behavior))
                    }
                    BehaviorKind::Scale => {
                        GestureScaling::attach(bus, scene.clone(), *id, settings.scaling)
                            .map(|behavior| scalings.push(behavior))
                    }
                    BehaviorKind::Place => TapToPlace::attach(
                        bus,
                        scene.clone(),
                        *id,
                        visualizer.clone(),
                        settings.placement,
                    )
                    .map(|behavior| placements.push(behavior)),
                };
                attached.with_context(|| format!("attaching {behavior:?} to '{}'", spec.name))?;
            }
        }

        let recorders = record_bus(&session, &trace);
        info!(
            entities = names.len(),
            rotations = rotations.len(),
            scalings = scalings.len(),
            placements = placements.len(),
            "simulation built"
        );

        Ok(Self {
            scene,
            device,
            session,
            names,
            rotations,
            scalings,
            placements,
            trace,
            _recorders: recorders,
        })
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    /// Applies one input and returns everything it caused, in order.
    pub fn step(&mut self, step: &Step) -> Vec<TraceEvent> {
        match step {
            Step::Tick(pose) => {
                let pose = pose.pose();
                self.session.tick(&pose, &*self.scene);
                for placement in &self.placements {
                    if placement.tick(&pose) {
                        debug!(entity = placement.entity().0, "placement moved");
                    }
                }
            }
            Step::Gesture(raw) => match self.device.perform(*raw) {
                Some(callback) => self.session.on_raw_gesture(callback),
                None => self.trace.borrow_mut().push(TraceEvent::Unrecognized {
                    kind: raw.input.kind(),
                }),
            },
            Step::Say(phrase) => {
                if let Some(KeywordCommand::ModeSwitch(vocabulary)) =
                    self.session.on_phrase_recognized(phrase)
                {
                    self.trace
                        .borrow_mut()
                        .push(TraceEvent::ModeSwitched { vocabulary });
                }
            }
            Step::SourceDetected(source) => self.session.source_detected(SourceId(*source)),
            Step::SourceLost(source) => self.session.source_lost(SourceId(*source)),
        }
        self.trace.borrow_mut().drain(..).collect()
    }

    /// Current local transform of every entity, in declaration order.
    pub fn transforms(&self) -> Vec<TraceEvent> {
        let scene = self.scene.borrow();
        self.names
            .iter()
            .filter_map(|(id, name)| {
                scene.entity(*id).map(|record| TraceEvent::Transform {
                    entity: name.clone(),
                    transform: record.transform,
                })
            })
            .collect()
    }

    /// Replays `steps` and writes one JSON line per event, then the final
    /// transforms.
    pub fn run<W: Write>(&mut self, steps: &[Step], out: &mut W) -> anyhow::Result<()> {
        for (index, step) in steps.iter().enumerate() {
            debug!(index, ?step, "applying step");
            for event in self.step(step) {
                writeln!(out, "{}", serde_json::to_string(&event)?)?;
            }
        }
        for event in self.transforms() {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Detaches every behavior explicitly.
    pub fn shutdown(self) -> anyhow::Result<()> {
        for rotation in self.rotations {
            rotation.detach()?;
        }
        for scaling in self.scalings {
            scaling.detach()?;
        }
        for placement in self.placements {
            placement.detach()?;
        }
        Ok(())
    }
}

fn record_bus(session: &InteractionSession, trace: &TraceLog) -> Vec<Subscription> {
    let bus = session.bus();
    let focus = {
        let trace = trace.clone();
        bus.focus_changes()
            .subscribe(move |event| trace.borrow_mut().push(TraceEvent::Focus(*event)))
    };
    let gestures = {
        let trace = trace.clone();
        bus.gestures()
            .subscribe(move |event| trace.borrow_mut().push(TraceEvent::Gesture(*event)))
    };
    let keywords = {
        let trace = trace.clone();
        bus.keywords()
            .subscribe(move |event| trace.borrow_mut().push(TraceEvent::Keyword(event.clone())))
    };
    let hands = {
        let trace = trace.clone();
        bus.hand_presence()
            .subscribe(move |event| trace.borrow_mut().push(TraceEvent::HandPresence(*event)))
    };
    vec![focus, gestures, keywords, hands]
}

#[cfg(test)]
#[path = "tests/script_tests.rs"]
mod tests;
