use crate::scene::types::Mesh;
use crate::util::mirror_rotation_x;
use glam::{Affine3A, Quat, Vec3};
use std::sync::Arc;

/// Position plus orientation, without scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation_yaw(translation: Vec3, yaw_radians: f32) -> Self {
        Self::new(translation, Quat::from_rotation_y(yaw_radians))
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// The pose as seen from a parent space that is mirrored on the X axis.
    #[inline]
    pub fn mirrored_x(&self) -> Pose {
        Pose {
            translation: self.translation * Vec3::new(-1.0, 1.0, 1.0),
            rotation: mirror_rotation_x(self.rotation),
        }
    }

    pub fn abs_diff_eq(&self, other: &Pose, epsilon: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, epsilon)
            && (self.rotation.abs_diff_eq(other.rotation, epsilon)
                || self.rotation.abs_diff_eq(-other.rotation, epsilon))
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::IDENTITY
    }
}

/// Releases the (potentially GPU backed) resources of an object for good.
pub trait Disposable {
    fn dispose(&mut self);
}

/// A single renderable instance as the presentation layer sees it.
///
/// The world matrix is cached and only recomputed in [`SceneNode::update_world_matrix`]. Anything
/// that reads [`SceneNode::cached_world_matrix`] after changing the transform without refreshing it
/// reads a stale transform.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
    visible: bool,
    mesh: Option<Arc<Mesh>>,
    world: Affine3A,
    world_dirty: bool,
    disposed: bool,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, mesh: Option<Arc<Mesh>>) -> Self {
        Self {
            name: name.into(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            visible: true,
            mesh,
            world: Affine3A::IDENTITY,
            world_dirty: false,
            disposed: false,
        }
    }

    /// Clones the node including its subtree. Geometry is shared with the source until either is
    /// disposed, as it's immutable.
    pub fn deep_clone(&self) -> SceneNode {
        let mut clone = self.clone();
        clone.world_dirty = true;
        clone
    }

    pub fn set_transform(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) {
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
        self.world_dirty = true;
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.world_dirty = true;
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn is_mirrored(&self) -> bool {
        self.scale.x < 0.0
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_world_matrix_stale(&self) -> bool {
        self.world_dirty
    }

    pub fn update_world_matrix(&mut self) -> Affine3A {
        if self.world_dirty {
            self.world = Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation);
            self.world_dirty = false;
        }
        self.world
    }

    pub fn cached_world_matrix(&self) -> Affine3A {
        self.world
    }

    /// Back to the neutral state pooled instances are kept in: hidden, at the origin, unmirrored.
    pub fn reset(&mut self) {
        self.set_transform(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
        self.update_world_matrix();
        self.visible = false;
    }
}

impl Disposable for SceneNode {
    fn dispose(&mut self) {
        // The last instance to drop its Arc frees the geometry.
        self.mesh = None;
        self.visible = false;
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_matrix_is_only_refreshed_on_request() {
        let mut node = SceneNode::new("test", None);
        node.set_translation(Vec3::new(1.0, 2.0, 3.0));
        assert!(node.is_world_matrix_stale());
        assert_eq!(node.cached_world_matrix(), Affine3A::IDENTITY);

        let world = node.update_world_matrix();
        assert!(!node.is_world_matrix_stale());
        assert_eq!(world.translation, Vec3::new(1.0, 2.0, 3.0).into());
    }

    #[test]
    fn reset_hides_and_clears_the_transform() {
        let mut node = SceneNode::new("test", None);
        node.set_transform(Vec3::ONE, Quat::from_rotation_y(1.0), Vec3::new(-1.0, 1.0, 1.0));
        node.reset();
        assert!(!node.is_visible());
        assert!(!node.is_mirrored());
        assert_eq!(node.translation(), Vec3::ZERO);
        assert_eq!(node.cached_world_matrix(), Affine3A::IDENTITY);
    }

    #[test]
    fn dispose_drops_the_geometry() {
        let mesh = Arc::new(Mesh::cuboid(1.0, 1.0, 1.0));
        let mut node = SceneNode::new("test", Some(mesh.clone()));
        let mut clone = node.deep_clone();
        assert_eq!(Arc::strong_count(&mesh), 3);

        clone.dispose();
        node.dispose();
        assert!(node.is_disposed());
        assert!(node.mesh().is_none());
        assert_eq!(Arc::strong_count(&mesh), 1);
    }
}
