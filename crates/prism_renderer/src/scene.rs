//! Renderable scene: camera, object graph and background.

use thiserror::Error;

use crate::{BvhNode, Camera, Color, Hittable, HittableList};

/// Errors raised while assembling a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Cannot build a BVH over an empty object list")]
    EmptyObjectList,

    #[error("Object {index} has no bounding box and cannot be placed in a BVH")]
    UnboundedObject { index: usize },
}

/// Everything the renderer needs to produce an image.
///
/// A scene is immutable once built. Materials and textures reachable from
/// the objects are shared through `Arc`, so the whole scene is `Send + Sync`
/// and can be handed to the render threads behind an `Arc<Scene>`.
pub struct Scene {
    pub camera: Camera,
    pub objects: HittableList,
    /// Radiance returned by rays that escape the scene
    pub background: Color,
}

impl Scene {
    pub fn new(camera: Camera, objects: HittableList, background: Color) -> Self {
        Self {
            camera,
            objects,
            background,
        }
    }

    /// Build a scene whose objects are wrapped in a single BVH over the
    /// camera's shutter interval.
    pub fn with_bvh(
        camera: Camera,
        objects: Vec<Box<dyn Hittable>>,
        background: Color,
    ) -> Result<Self, SceneError> {
        let (time0, time1) = camera.shutter();
        let bvh = BvhNode::new(objects, time0, time1)?;

        Ok(Self::new(
            camera,
            HittableList::from_object(Box::new(bvh)),
            background,
        ))
    }

    /// The root of the object graph as a hittable.
    pub fn world(&self) -> &dyn Hittable {
        &self.objects
    }
}
