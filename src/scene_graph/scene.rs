use glam::{Mat4, Vec3};
use id_arena::Arena;
use std::cmp::Ordering;

use crate::assets::{AssetNode, SceneAsset};
use crate::math::ray::Ray;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// The object whose bounds were hit; a candidate or one of its descendants.
    pub object: ObjectId,
    /// Index of the candidate the hit belongs to.
    pub candidate: usize,
    pub distance: f32,
    pub point: Vec3,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    /// Adds an object and attaches it to `parent` in one step.
    pub fn add_child(&mut self, parent: Option<ObjectId>, object: Object3D) -> ObjectId {
        let object_id = self.add_object(object);

        if parent.is_some() {
            self.set_object_parent(object_id, parent);
        }

        object_id
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    pub fn get_model(&self, id: SceneModelId) -> Option<&SceneModel> {
        self.models.get(id)
    }

    /// Spawns a decoded asset under `parent`. The returned root object stands
    /// for the asset's glTF scene; its children are the scene's root nodes in
    /// document order. Meshes become new scene models for every call.
    pub fn spawn_asset(&mut self, asset: SceneAsset, parent: Option<ObjectId>) -> ObjectId {
        let SceneAsset {
            name,
            meshes,
            nodes,
        } = asset;

        let model_ids: Vec<SceneModelId> = meshes
            .into_iter()
            .map(|model| self.add_model(SceneModel::new(model)))
            .collect();

        let root_id = self.add_child(parent, Object3D::named(name));

        for node in &nodes {
            self.spawn_asset_node(node, &model_ids, root_id);
        }

        root_id
    }

    fn spawn_asset_node(
        &mut self,
        node: &AssetNode,
        model_ids: &[SceneModelId],
        parent: ObjectId,
    ) -> ObjectId {
        let mut object = Object3D::named(node.name.clone());
        object.transform = Transform::new(node.translation, node.rotation, node.scale);
        object.model_id = node.mesh.and_then(|mesh| model_ids.get(mesh).copied());

        let object_id = self.add_child(Some(parent), object);

        for child in &node.children {
            self.spawn_asset_node(child, model_ids, object_id);
        }

        object_id
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    /// Recursively updates an object's world transform and its children
    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                let world_matrix = parent_world_matrix * local_matrix;
                object.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_scale(&mut self, object_id: ObjectId, scale: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale(scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    /// Local translation, i.e. the position relative to the parent.
    pub fn object_translation(&self, object_id: ObjectId) -> Option<Vec3> {
        self.objects
            .get(object_id)
            .map(|object| object.transform.translation())
    }

    pub fn set_object_visible(&mut self, object_id: ObjectId, visible: bool) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.visible = visible;
        }
    }

    /// True when the object and every ancestor are visible.
    pub fn is_visible_in_hierarchy(&self, object_id: ObjectId) -> bool {
        let mut current = Some(object_id);

        while let Some(id) = current {
            match self.objects.get(id) {
                Some(object) if object.visible => current = object.parent_id,
                _ => return false,
            }
        }

        true
    }

    /// Casts `ray` (world space) against the model bounds of `candidates`,
    /// descending into their children when `recursive` is set. Hits are
    /// sorted nearest first; on equal distance the later candidate wins.
    pub fn intersect_objects(
        &self,
        ray: &Ray,
        candidates: &[ObjectId],
        recursive: bool,
    ) -> Vec<Intersection> {
        self.update_transforms();

        let mut intersections = Vec::new();

        for (candidate, &object_id) in candidates.iter().enumerate() {
            self.intersect_object(ray, object_id, candidate, recursive, &mut intersections);
        }

        intersections.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(b.candidate.cmp(&a.candidate))
        });

        intersections
    }

    fn intersect_object(
        &self,
        ray: &Ray,
        object_id: ObjectId,
        candidate: usize,
        recursive: bool,
        intersections: &mut Vec<Intersection>,
    ) {
        let Some(object) = self.objects.get(object_id) else {
            return;
        };

        let bounds = object
            .model_id
            .and_then(|model_id| self.models.get(model_id))
            .map(|scene_model| scene_model.model.bounding_box);

        if let Some(bounds) = bounds {
            let world_matrix = *object.transform.get_world_matrix();

            // Zero scale on any axis leaves nothing to hit
            if world_matrix.determinant().abs() > f32::EPSILON {
                let local_ray = ray.transform(&world_matrix.inverse());

                if let Some(distance) = local_ray.intersect_aabb(&bounds) {
                    intersections.push(Intersection {
                        object: object_id,
                        candidate,
                        distance,
                        point: ray.at(distance),
                    });
                }
            }
        }

        if recursive {
            for &child_id in &object.child_ids {
                self.intersect_object(ray, child_id, candidate, recursive, intersections);
            }
        }
    }

    /// Brings cached world matrices up to date before drawing.
    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use approx::assert_abs_diff_eq;
    use glam::{Quat, Vec4};

    fn cube_model(scene: &mut Scene) -> SceneModelId {
        scene.add_model(SceneModel::new(Model::cuboid(
            "cube",
            Vec3::splat(0.1),
            Vec4::ONE,
        )))
    }

    fn cube_at(scene: &mut Scene, model: SceneModelId, parent: Option<ObjectId>, at: Vec3) -> ObjectId {
        let mut object = Object3D::named("cube");
        object.transform = Transform::from_translation(at);
        object.model_id = Some(model);
        scene.add_child(parent, object)
    }

    fn forward_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z)
    }

    #[test]
    fn spawn_asset_wraps_root_nodes_in_order() {
        let mut scene = Scene::new();
        let mut left = AssetNode::new("left", Vec3::new(-1.0, 0.0, 0.0));
        left.children.push(AssetNode::new("glass", Vec3::ZERO));
        let asset = SceneAsset {
            name: "frame".to_string(),
            meshes: vec![Model::cuboid("bar", Vec3::ONE, Vec4::ONE)],
            nodes: vec![AssetNode::new("top", Vec3::Y), left],
        };

        let root = scene.spawn_asset(asset, None);

        let root_object = scene.get_object(root).unwrap();
        assert_eq!(root_object.name, "frame");
        let names: Vec<_> = root_object
            .child_ids
            .iter()
            .map(|&id| scene.get_object(id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["top", "left"]);
        assert_eq!(scene.models.len(), 1);

        let left_id = root_object.child_ids[1];
        assert_eq!(
            scene.object_translation(left_id),
            Some(Vec3::new(-1.0, 0.0, 0.0))
        );
        assert_eq!(scene.get_object(left_id).unwrap().child_ids.len(), 1);
    }

    #[test]
    fn spawn_asset_registers_meshes_each_time() {
        let mut scene = Scene::new();
        let asset = || {
            let mut node = AssetNode::new("bar", Vec3::ZERO);
            node.mesh = Some(0);
            SceneAsset {
                name: "transom".to_string(),
                meshes: vec![Model::cuboid("bar", Vec3::ONE, Vec4::ONE)],
                nodes: vec![node],
            }
        };

        let first = scene.spawn_asset(asset(), None);
        let second = scene.spawn_asset(asset(), None);

        assert_eq!(scene.models.len(), 2);
        let model_of = |root: ObjectId| {
            let child = scene.get_object(root).unwrap().child_ids[0];
            scene.get_object(child).unwrap().model_id
        };
        assert_ne!(model_of(first), model_of(second));
    }

    #[test]
    fn world_matrix_composes_parent_scale() {
        let mut scene = Scene::new();
        let model = cube_model(&mut scene);
        let parent = scene.add_object(Object3D::named("parent"));
        scene.set_object_scale(parent, Vec3::new(1.0, 100.0, 1.0));
        let child = cube_at(&mut scene, model, Some(parent), Vec3::new(0.0, 0.01, 0.0));

        scene.late_update();

        let world = *scene.get_object(child).unwrap().transform.get_world_matrix();
        assert_abs_diff_eq!(
            world.transform_point3(Vec3::ZERO),
            Vec3::new(0.0, 1.0, 0.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn intersections_are_sorted_nearest_first() {
        let mut scene = Scene::new();
        let model = cube_model(&mut scene);
        let far = cube_at(&mut scene, model, None, Vec3::new(0.0, 0.0, 1.0));
        let near = cube_at(&mut scene, model, None, Vec3::ZERO);

        let hits = scene.intersect_objects(&forward_ray(), &[far, near], false);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object, near);
        assert_eq!(hits[0].candidate, 1);
        assert_abs_diff_eq!(hits[0].distance, 4.95, epsilon = 1e-5);
        assert_eq!(hits[1].object, far);
    }

    #[test]
    fn equal_distance_prefers_later_candidate() {
        let mut scene = Scene::new();
        let model = cube_model(&mut scene);
        let first = cube_at(&mut scene, model, None, Vec3::ZERO);
        let second = cube_at(&mut scene, model, None, Vec3::ZERO);

        let hits = scene.intersect_objects(&forward_ray(), &[first, second], false);

        assert_eq!(hits[0].object, second);
        assert_eq!(hits[1].object, first);
    }

    #[test]
    fn recursive_descends_into_children() {
        let mut scene = Scene::new();
        let model = cube_model(&mut scene);
        let group = scene.add_object(Object3D::named("group"));
        let child = cube_at(&mut scene, model, Some(group), Vec3::ZERO);

        assert!(scene.intersect_objects(&forward_ray(), &[group], false).is_empty());

        let hits = scene.intersect_objects(&forward_ray(), &[group], true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, child);
        assert_eq!(hits[0].candidate, 0);
    }

    #[test]
    fn miss_returns_nothing() {
        let mut scene = Scene::new();
        let model = cube_model(&mut scene);
        let cube = cube_at(&mut scene, model, None, Vec3::new(3.0, 0.0, 0.0));

        assert!(scene.intersect_objects(&forward_ray(), &[cube], true).is_empty());
    }

    #[test]
    fn zero_scale_objects_are_skipped() {
        let mut scene = Scene::new();
        let model = cube_model(&mut scene);
        let cube = cube_at(&mut scene, model, None, Vec3::ZERO);
        scene.set_object_scale(cube, Vec3::new(1.0, 0.0, 1.0));

        assert!(scene.intersect_objects(&forward_ray(), &[cube], false).is_empty());
    }

    #[test]
    fn hidden_ancestor_hides_descendants() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::named("parent"));
        let child = scene.add_child(Some(parent), Object3D::named("child"));

        assert!(scene.is_visible_in_hierarchy(child));
        scene.set_object_visible(parent, false);
        assert!(!scene.is_visible_in_hierarchy(child));
        assert!(scene.get_object(child).unwrap().visible);

        scene.set_object_visible(parent, true);
        assert!(scene.is_visible_in_hierarchy(child));
    }

    #[test]
    fn asset_node_rotation_is_kept() {
        let mut scene = Scene::new();
        let mut node = AssetNode::new("rotated", Vec3::ZERO);
        node.rotation = Quat::from_rotation_y(1.0);
        let root = scene.spawn_asset(
            SceneAsset {
                name: "asset".to_string(),
                meshes: Vec::new(),
                nodes: vec![node],
            },
            None,
        );

        let child = scene.get_object(root).unwrap().child_ids[0];
        let rotation = scene.get_object(child).unwrap().transform.rotation();
        assert_abs_diff_eq!(rotation, Quat::from_rotation_y(1.0), epsilon = 1e-6);
    }
}
