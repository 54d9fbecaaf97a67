//! Click-to-place transoms.
//!
//! The controller owns the interactive set: every centre marker ever created,
//! in creation order. Picking an empty marker asks the caller to load a
//! transom; once the load completes the transom is placed at the marker and
//! the span on each side of it gets a new marker. Picking a marker that
//! already holds a transom toggles the transom's visibility.

pub mod marker;

use glam::{Vec2, Vec3};

use crate::{
    assets::SceneAsset,
    camera::Camera,
    config::PlacementSettings,
    error::{FrameError, InsertionError, LoadError},
    math::{bounds::AABB, ray::Ray},
    model::Model,
    scene_graph::{Object3D, ObjectId, Scene, SceneModel, SceneModelId},
};

pub use marker::{Bound, CenterMarker, FrameEdge, MarkerId, MarkerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEdges {
    pub top: ObjectId,
    pub bottom: ObjectId,
    pub left: ObjectId,
    pub right: ObjectId,
}

impl FrameEdges {
    /// Edges are the frame root's children named top, bottom, left and right.
    /// Edges without a matching name take the remaining children in order.
    pub fn resolve(scene: &Scene, frame_root: ObjectId) -> Result<Self, FrameError> {
        let root = scene
            .get_object(frame_root)
            .ok_or(FrameError::DetachedObject { name: "frame root" })?;
        let children = &root.child_ids;

        let by_name = |edge: FrameEdge| {
            children.iter().copied().find(|&id| {
                scene
                    .get_object(id)
                    .is_some_and(|object| object.name.eq_ignore_ascii_case(edge.name()))
            })
        };

        let named = FrameEdge::ALL.map(by_name);
        let mut unclaimed = children
            .iter()
            .copied()
            .filter(|id| !named.contains(&Some(*id)));

        let mut slots = named;
        for (edge, slot) in FrameEdge::ALL.into_iter().zip(slots.iter_mut()) {
            if slot.is_none() {
                *slot = unclaimed.next();
                if slot.is_some() {
                    log::warn!("Frame has no part named {}, using child order", edge.name());
                }
            }
        }

        match slots {
            [Some(top), Some(bottom), Some(left), Some(right)] => Ok(Self {
                top,
                bottom,
                left,
                right,
            }),
            _ => Err(FrameError::MissingEdges {
                found: children.len(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickOutcome {
    /// Nothing in the interactive set was under the cursor.
    Miss,
    /// The marker is now pending; the caller must load a transom and report
    /// back through [`PlacementController::complete_insertion`].
    InsertRequested(MarkerId),
    /// The marker is still waiting for its transom. Nothing changed.
    Pending(MarkerId),
    VisibilityToggled {
        marker: MarkerId,
        transom: ObjectId,
        visible: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedTransom {
    pub marker: MarkerId,
    pub transom: ObjectId,
    /// Markers between the transom and the old left bound, then the old right bound.
    pub new_markers: [MarkerId; 2],
}

pub struct PlacementController {
    frame_root: ObjectId,
    edges: FrameEdges,
    markers: Vec<CenterMarker>,
    marker_model: SceneModelId,
    settings: PlacementSettings,
}

impl PlacementController {
    /// Sets up the interactive set with one marker between the left and right edges.
    pub fn initialize(
        scene: &mut Scene,
        frame_root: ObjectId,
        settings: PlacementSettings,
    ) -> Result<Self, FrameError> {
        let edges = FrameEdges::resolve(scene, frame_root)?;

        let marker_model = scene.add_model(SceneModel::new(Model::cuboid(
            "Center marker",
            Vec3::splat(settings.marker_size),
            settings.marker_color,
        )));

        let mut controller = Self {
            frame_root,
            edges,
            markers: Vec::new(),
            marker_model,
            settings,
        };

        controller.add_center_marker(
            scene,
            Bound::Edge {
                edge: FrameEdge::Left,
                object: edges.left,
            },
            Bound::Edge {
                edge: FrameEdge::Right,
                object: edges.right,
            },
        )?;

        Ok(controller)
    }

    pub fn edges(&self) -> FrameEdges {
        self.edges
    }

    pub fn markers(&self) -> &[CenterMarker] {
        &self.markers
    }

    pub fn marker(&self, id: MarkerId) -> Option<&CenterMarker> {
        self.markers.get(id.0)
    }

    pub fn transom_count(&self) -> usize {
        self.markers
            .iter()
            .filter(|marker| marker.transom_inserted())
            .count()
    }

    /// Handles a click at `cursor` (physical pixels) in a viewport of `viewport` pixels.
    pub fn handle_pick(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        cursor: Vec2,
        viewport: Vec2,
    ) -> PickOutcome {
        match camera.screen_to_ray(cursor, viewport) {
            Some(ray) => self.pick_ray(scene, &ray),
            None => PickOutcome::Miss,
        }
    }

    pub fn pick_ray(&mut self, scene: &mut Scene, ray: &Ray) -> PickOutcome {
        let candidates: Vec<ObjectId> = self.markers.iter().map(|marker| marker.object).collect();

        let Some(nearest) = scene.intersect_objects(ray, &candidates, true).first().copied() else {
            return PickOutcome::Miss;
        };

        let id = MarkerId(nearest.candidate);
        let marker = &mut self.markers[nearest.candidate];

        match marker.state {
            MarkerState::Empty => {
                marker.state = MarkerState::Pending;
                log::info!("Inserting transom at marker {} ({})", id, marker.position);
                PickOutcome::InsertRequested(id)
            }
            MarkerState::Pending => {
                log::debug!("Marker {} is still waiting for its transom", id);
                PickOutcome::Pending(id)
            }
            MarkerState::Inserted { transom } => {
                let visible = !scene
                    .get_object(transom)
                    .is_some_and(|object| object.visible);
                scene.set_object_visible(transom, visible);
                log::debug!("Toggled transom at marker {} to visible={}", id, visible);

                PickOutcome::VisibilityToggled {
                    marker: id,
                    transom,
                    visible,
                }
            }
        }
    }

    /// Finishes an insertion started by [`PickOutcome::InsertRequested`].
    ///
    /// A failed load puts the marker back to [`MarkerState::Empty`] so it can
    /// be clicked again.
    pub fn complete_insertion(
        &mut self,
        scene: &mut Scene,
        id: MarkerId,
        result: Result<SceneAsset, LoadError>,
    ) -> Result<InsertedTransom, InsertionError> {
        let marker = match self.markers.get_mut(id.0) {
            Some(marker) if marker.state == MarkerState::Pending => marker,
            _ => return Err(InsertionError::NotPending { marker: id.0 }),
        };

        let asset = match result {
            Ok(asset) => asset,
            Err(source) => {
                marker.state = MarkerState::Empty;
                return Err(InsertionError::Load {
                    marker: id.0,
                    source,
                });
            }
        };

        let (position, left, right) = (marker.position, marker.left, marker.right);

        // Both bounds must resolve before the scene is touched
        let bound_positions = left
            .position(scene)
            .and_then(|left_position| Ok((left_position, right.position(scene)?)));
        let (left_position, right_position) = match bound_positions {
            Ok(positions) => positions,
            Err(error) => {
                marker.state = MarkerState::Empty;
                return Err(error.into());
            }
        };

        let transom = scene.spawn_asset(asset, Some(self.frame_root));
        scene.set_object_translation(transom, position);
        scene.set_object_scale(transom, self.settings.transom_scale);
        marker.state = MarkerState::Inserted { transom };

        let transom_bound = Bound::Transom(transom);
        let new_markers = [
            self.push_center_marker(scene, transom_bound, left, position, left_position),
            self.push_center_marker(scene, transom_bound, right, position, right_position),
        ];

        Ok(InsertedTransom {
            marker: id,
            transom,
            new_markers,
        })
    }

    fn add_center_marker(
        &mut self,
        scene: &mut Scene,
        left: Bound,
        right: Bound,
    ) -> Result<MarkerId, FrameError> {
        let left_position = left.position(scene)?;
        let right_position = right.position(scene)?;

        Ok(self.push_center_marker(scene, left, right, left_position, right_position))
    }

    fn push_center_marker(
        &mut self,
        scene: &mut Scene,
        left: Bound,
        right: Bound,
        left_position: Vec3,
        right_position: Vec3,
    ) -> MarkerId {
        let position = AABB::new(left_position, right_position).center();

        let mut object = Object3D::named("center");
        object.transform.set_translation(position);
        object.model_id = Some(self.marker_model);
        let object = scene.add_child(Some(self.frame_root), object);

        let id = MarkerId(self.markers.len());
        self.markers.push(CenterMarker {
            left,
            right,
            position,
            object,
            state: MarkerState::Empty,
        });
        log::debug!("Added center marker {} at {}", id, position);

        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assets::AssetNode, camera::project_to_screen, config::CameraConfig};
    use approx::assert_abs_diff_eq;
    use glam::Vec4;
    use std::path::PathBuf;

    const VIEWPORT: Vec2 = Vec2::new(1024.0, 768.0);

    struct Fixture {
        scene: Scene,
        camera: Camera,
        frame: ObjectId,
        controller: PlacementController,
    }

    fn frame_asset(edges: &[(&str, Vec3)]) -> SceneAsset {
        SceneAsset {
            name: "shapedFrame".to_string(),
            meshes: Vec::new(),
            nodes: edges
                .iter()
                .map(|&(name, position)| AssetNode::new(name, position))
                .collect(),
        }
    }

    fn standard_frame() -> SceneAsset {
        frame_asset(&[
            ("top", Vec3::new(0.0, 1.0, 0.0)),
            ("bottom", Vec3::new(0.0, -1.0, 0.0)),
            ("left", Vec3::new(-1.0, 0.0, 0.0)),
            ("right", Vec3::new(1.0, 0.0, 0.0)),
        ])
    }

    fn transom_asset() -> SceneAsset {
        let mut bar = AssetNode::new("bar", Vec3::ZERO);
        bar.mesh = Some(0);
        SceneAsset {
            name: "transomsModel".to_string(),
            meshes: vec![Model::cuboid(
                "bar",
                Vec3::new(0.05, 0.02, 0.05),
                Vec4::ONE,
            )],
            nodes: vec![bar],
        }
    }

    fn setup() -> Fixture {
        let mut scene = Scene::new();
        let frame = scene.spawn_asset(standard_frame(), None);
        let controller =
            PlacementController::initialize(&mut scene, frame, PlacementSettings::default())
                .unwrap();

        Fixture {
            scene,
            camera: Camera::from_config(&CameraConfig::default()),
            frame,
            controller,
        }
    }

    impl Fixture {
        fn click(&mut self, point: Vec3) -> PickOutcome {
            let cursor = project_to_screen(&self.camera, point, VIEWPORT);
            self.controller
                .handle_pick(&mut self.scene, &self.camera, cursor, VIEWPORT)
        }

        fn insert(&mut self, point: Vec3) -> InsertedTransom {
            let PickOutcome::InsertRequested(id) = self.click(point) else {
                panic!("expected an insertion at {point}");
            };
            self.controller
                .complete_insertion(&mut self.scene, id, Ok(transom_asset()))
                .unwrap()
        }

        fn position(&self, id: MarkerId) -> Vec3 {
            self.controller.marker(id).unwrap().position
        }

        fn visible(&self, object: ObjectId) -> bool {
            self.scene.get_object(object).unwrap().visible
        }
    }

    #[test]
    fn initialize_creates_one_marker_between_left_and_right() {
        let fixture = setup();
        let markers = fixture.controller.markers();

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].position, Vec3::ZERO);
        assert_eq!(markers[0].state, MarkerState::Empty);
        assert!(!markers[0].transom_inserted());
        assert_eq!(fixture.controller.transom_count(), 0);

        let edges = fixture.controller.edges();
        assert_eq!(markers[0].left, Bound::Edge { edge: FrameEdge::Left, object: edges.left });
        assert_eq!(markers[0].right, Bound::Edge { edge: FrameEdge::Right, object: edges.right });
    }

    #[test]
    fn marker_objects_are_children_of_the_frame() {
        let fixture = setup();
        let marker = &fixture.controller.markers()[0];
        let object = fixture.scene.get_object(marker.object).unwrap();

        assert_eq!(object.name, "center");
        assert_eq!(object.parent_id, Some(fixture.frame));
        assert!(object.model_id.is_some());
    }

    #[test]
    fn initialize_uses_midpoint_of_arbitrary_edges() {
        let mut scene = Scene::new();
        let frame = scene.spawn_asset(
            frame_asset(&[
                ("top", Vec3::new(0.0, 2.0, 0.0)),
                ("bottom", Vec3::new(0.0, -2.0, 0.0)),
                ("left", Vec3::new(-3.0, 1.0, 0.5)),
                ("right", Vec3::new(1.0, -1.0, 0.5)),
            ]),
            None,
        );

        let controller =
            PlacementController::initialize(&mut scene, frame, PlacementSettings::default())
                .unwrap();

        assert_eq!(controller.markers()[0].position, Vec3::new(-1.0, 0.0, 0.5));
    }

    #[test]
    fn edges_are_resolved_by_name_before_order() {
        let mut scene = Scene::new();
        let frame = scene.spawn_asset(
            frame_asset(&[
                ("Right", Vec3::new(2.0, 0.0, 0.0)),
                ("Left", Vec3::new(-4.0, 0.0, 0.0)),
                ("Bottom", Vec3::new(0.0, -1.0, 0.0)),
                ("Top", Vec3::new(0.0, 1.0, 0.0)),
            ]),
            None,
        );

        let controller =
            PlacementController::initialize(&mut scene, frame, PlacementSettings::default())
                .unwrap();

        assert_eq!(controller.markers()[0].position, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn unnamed_edges_fall_back_to_child_order() {
        let mut scene = Scene::new();
        let frame = scene.spawn_asset(
            frame_asset(&[
                ("Cube", Vec3::new(0.0, 1.0, 0.0)),
                ("Cube.001", Vec3::new(0.0, -1.0, 0.0)),
                ("Cube.002", Vec3::new(-2.0, 0.0, 0.0)),
                ("Cube.003", Vec3::new(1.0, 0.0, 0.0)),
            ]),
            None,
        );

        let controller =
            PlacementController::initialize(&mut scene, frame, PlacementSettings::default())
                .unwrap();

        assert_eq!(controller.markers()[0].position, Vec3::new(-0.5, 0.0, 0.0));
    }

    #[test]
    fn partially_named_edges_keep_their_names() {
        let mut scene = Scene::new();
        let frame = scene.spawn_asset(
            frame_asset(&[
                ("Cube", Vec3::new(0.0, 1.0, 0.0)),
                ("left", Vec3::new(-3.0, 0.0, 0.0)),
                ("Cube.001", Vec3::new(0.0, -1.0, 0.0)),
                ("right", Vec3::new(1.0, 0.0, 0.0)),
            ]),
            None,
        );

        let controller =
            PlacementController::initialize(&mut scene, frame, PlacementSettings::default())
                .unwrap();

        let edges = controller.edges();
        let name = |id: ObjectId| scene.get_object(id).unwrap().name.as_str();
        assert_eq!(name(edges.top), "Cube");
        assert_eq!(name(edges.bottom), "Cube.001");
        assert_eq!(name(edges.left), "left");
        assert_eq!(name(edges.right), "right");
        assert_eq!(controller.markers()[0].position, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn frame_with_missing_edges_fails() {
        let mut scene = Scene::new();
        let frame = scene.spawn_asset(
            frame_asset(&[("top", Vec3::Y), ("bottom", Vec3::NEG_Y)]),
            None,
        );

        let result = PlacementController::initialize(&mut scene, frame, PlacementSettings::default());

        assert!(matches!(result, Err(FrameError::MissingEdges { found: 2 })));
    }

    #[test]
    fn picking_empty_marker_requests_insertion_once() {
        let mut fixture = setup();

        let outcome = fixture.click(Vec3::ZERO);
        let PickOutcome::InsertRequested(id) = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(id.index(), 0);
        assert_eq!(fixture.controller.marker(id).unwrap().state, MarkerState::Pending);

        // A second click before the load resolves must not start another load
        assert_eq!(fixture.click(Vec3::ZERO), PickOutcome::Pending(id));
        assert_eq!(fixture.controller.markers().len(), 1);
        assert_eq!(fixture.controller.transom_count(), 0);
    }

    #[test]
    fn completed_insertion_places_transom_and_derives_two_markers() {
        let mut fixture = setup();

        let inserted = fixture.insert(Vec3::ZERO);

        assert_eq!(fixture.controller.markers().len(), 3);
        assert_eq!(fixture.controller.transom_count(), 1);

        let transom = fixture.scene.get_object(inserted.transom).unwrap();
        assert_eq!(transom.parent_id, Some(fixture.frame));
        assert_eq!(transom.transform.translation(), Vec3::ZERO);
        assert_eq!(transom.transform.scale(), Vec3::new(1.0, 100.0, 1.0));
        assert!(transom.visible);

        let marker = fixture.controller.marker(inserted.marker).unwrap();
        assert!(marker.transom_inserted());
        assert_eq!(marker.transom(), Some(inserted.transom));

        let [first, second] = inserted.new_markers;
        assert_eq!(fixture.position(first), Vec3::new(-0.5, 0.0, 0.0));
        assert_eq!(fixture.position(second), Vec3::new(0.5, 0.0, 0.0));

        let edges = fixture.controller.edges();
        let first_marker = fixture.controller.marker(first).unwrap();
        assert_eq!(first_marker.left, Bound::Transom(inserted.transom));
        assert_eq!(first_marker.right.object(), edges.left);
        assert_eq!(first_marker.state, MarkerState::Empty);
        let second_marker = fixture.controller.marker(second).unwrap();
        assert_eq!(second_marker.right.object(), edges.right);
        assert_eq!(second_marker.state, MarkerState::Empty);
    }

    #[test]
    fn failed_load_leaves_marker_ready_for_retry() {
        let mut fixture = setup();
        let PickOutcome::InsertRequested(id) = fixture.click(Vec3::ZERO) else {
            panic!("expected an insertion");
        };

        let error = LoadError::NoScene {
            path: PathBuf::from("models/transomsModel.glb"),
        };
        let result = fixture
            .controller
            .complete_insertion(&mut fixture.scene, id, Err(error));

        assert!(matches!(result, Err(InsertionError::Load { marker: 0, .. })));
        assert_eq!(fixture.controller.marker(id).unwrap().state, MarkerState::Empty);
        assert_eq!(fixture.controller.markers().len(), 1);
        assert_eq!(fixture.click(Vec3::ZERO), PickOutcome::InsertRequested(id));
    }

    #[test]
    fn unresolvable_bound_leaves_scene_untouched() {
        let mut fixture = setup();
        let mut other = Scene::new();
        let foreign = other.add_object(Object3D::named("elsewhere"));
        fixture.controller.markers[0].right = Bound::Transom(foreign);

        let PickOutcome::InsertRequested(id) = fixture.click(Vec3::ZERO) else {
            panic!("expected an insertion");
        };
        let objects_before = fixture.scene.objects.len();

        let result = fixture
            .controller
            .complete_insertion(&mut fixture.scene, id, Ok(transom_asset()));

        assert!(matches!(
            result,
            Err(InsertionError::Frame(FrameError::DetachedObject { .. }))
        ));
        assert_eq!(fixture.scene.objects.len(), objects_before);
        assert_eq!(fixture.controller.markers().len(), 1);
        assert_eq!(fixture.controller.marker(id).unwrap().state, MarkerState::Empty);
        assert_eq!(fixture.controller.transom_count(), 0);
    }

    #[test]
    fn completion_without_pending_pick_is_rejected() {
        let mut fixture = setup();
        let objects_before = fixture.scene.objects.len();

        let result = fixture.controller.complete_insertion(
            &mut fixture.scene,
            MarkerId(0),
            Ok(transom_asset()),
        );

        assert!(matches!(result, Err(InsertionError::NotPending { marker: 0 })));
        assert_eq!(fixture.scene.objects.len(), objects_before);
        assert_eq!(fixture.controller.transom_count(), 0);
    }

    #[test]
    fn picking_inserted_marker_toggles_visibility() {
        let mut fixture = setup();
        let inserted = fixture.insert(Vec3::ZERO);
        let markers_before = fixture.controller.markers().len();

        for expected in [false, true, false, true] {
            let outcome = fixture.click(Vec3::ZERO);
            assert_eq!(
                outcome,
                PickOutcome::VisibilityToggled {
                    marker: inserted.marker,
                    transom: inserted.transom,
                    visible: expected,
                }
            );
            assert_eq!(fixture.visible(inserted.transom), expected);
        }

        assert_eq!(fixture.controller.markers().len(), markers_before);
        assert_eq!(fixture.controller.transom_count(), 1);
    }

    #[test]
    fn miss_leaves_state_unchanged() {
        let mut fixture = setup();
        let objects_before = fixture.scene.objects.len();

        assert_eq!(fixture.click(Vec3::new(0.0, 0.8, 0.0)), PickOutcome::Miss);
        assert_eq!(
            fixture
                .controller
                .handle_pick(&mut fixture.scene, &fixture.camera, Vec2::ZERO, Vec2::ZERO),
            PickOutcome::Miss
        );

        assert_eq!(fixture.controller.markers().len(), 1);
        assert_eq!(fixture.controller.markers()[0].state, MarkerState::Empty);
        assert_eq!(fixture.scene.objects.len(), objects_before);
    }

    #[test]
    fn repeated_insertion_subdivides_the_span() {
        let mut fixture = setup();

        let first = fixture.insert(Vec3::ZERO);
        let left_marker = first.new_markers[0];
        assert_eq!(fixture.position(left_marker), Vec3::new(-0.5, 0.0, 0.0));

        let second = fixture.insert(Vec3::new(-0.5, 0.0, 0.0));
        assert_eq!(second.marker, left_marker);

        let transom = fixture.scene.get_object(second.transom).unwrap();
        assert_eq!(transom.transform.translation(), Vec3::new(-0.5, 0.0, 0.0));

        let mut positions: Vec<f32> = second
            .new_markers
            .iter()
            .map(|&id| fixture.position(id).x)
            .collect();
        positions.sort_by(f32::total_cmp);
        assert_abs_diff_eq!(positions[0], -0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(positions[1], -0.25, epsilon = 1e-6);

        assert_eq!(fixture.controller.markers().len(), 5);
        assert_eq!(fixture.controller.transom_count(), 2);

        // The first marker still toggles its own transom rather than inserting again
        let outcome = fixture.click(Vec3::ZERO);
        assert_eq!(
            outcome,
            PickOutcome::VisibilityToggled {
                marker: first.marker,
                transom: first.transom,
                visible: false,
            }
        );
        assert!(fixture.visible(second.transom));
    }

    #[test]
    fn marker_position_does_not_follow_moved_bounds() {
        let mut fixture = setup();
        let edges = fixture.controller.edges();

        fixture
            .scene
            .set_object_translation(edges.left, Vec3::new(-3.0, 0.0, 0.0));

        assert_eq!(fixture.controller.markers()[0].position, Vec3::ZERO);
    }

    #[test]
    fn derived_marker_uses_current_bound_position() {
        let mut fixture = setup();
        let edges = fixture.controller.edges();
        fixture
            .scene
            .set_object_translation(edges.left, Vec3::new(-3.0, 0.0, 0.0));

        let inserted = fixture.insert(Vec3::ZERO);

        assert_eq!(fixture.position(inserted.new_markers[0]), Vec3::new(-1.5, 0.0, 0.0));
    }
}
