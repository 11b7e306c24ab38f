//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over the scene's hittables. Every branch owns exactly two
//! children and every leaf wraps exactly one primitive. The tree is built
//! once per scene and only read afterwards, so it is shared between render
//! threads without locking.

use crate::{HitRecord, Hittable, Ray, SceneError};
use prism_math::{Aabb, Interval};

/// BVH node - either a branch with two children or a leaf with one primitive.
///
/// Using an enum keeps traversal free of dynamic dispatch until a leaf.
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node wrapping a single primitive.
    Leaf {
        object: Box<dyn Hittable>,
        bbox: Aabb,
    },
}

impl BvhNode {
    /// Build a BVH over `objects`, bounding moving objects over the shutter
    /// interval `[time0, time1]`.
    ///
    /// Fails on an empty list or when an object has no bounding box.
    pub fn new(
        objects: Vec<Box<dyn Hittable>>,
        time0: f32,
        time1: f32,
    ) -> Result<Self, SceneError> {
        if objects.is_empty() {
            return Err(SceneError::EmptyObjectList);
        }

        let count = objects.len();
        let items = objects
            .into_iter()
            .enumerate()
            .map(|(index, object)| match object.bounding_box(time0, time1) {
                Some(bbox) => Ok((object, bbox)),
                None => Err(SceneError::UnboundedObject { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let node = Self::build(items);
        log::debug!("Built BVH over {} objects (depth {})", count, node.depth());
        Ok(node)
    }

    /// Recursive BVH construction.
    ///
    /// Median split: sort objects by centroid on the axis along which the
    /// centroids spread the most, split in half, recurse.
    fn build(mut items: Vec<(Box<dyn Hittable>, Aabb)>) -> Self {
        if items.len() == 1 {
            let (object, bbox) = items.remove(0);
            return BvhNode::Leaf { object, bbox };
        }

        let bounds = items
            .iter()
            .fold(Aabb::EMPTY, |acc, (_, bbox)| acc.merge(bbox));

        let centroid_bounds = items.iter().fold(Aabb::EMPTY, |acc, (_, bbox)| {
            let c = bbox.centroid();
            acc.merge(&Aabb::from_points(c, c))
        });
        let axis = centroid_bounds.longest_axis();

        items.sort_unstable_by(|(_, a), (_, b)| {
            let a_val = a.centroid()[axis];
            let b_val = b.centroid()[axis];
            a_val.total_cmp(&b_val)
        });

        let mid = items.len() / 2;
        let right_items = items.split_off(mid);

        BvhNode::Branch {
            left: Box::new(Self::build(items)),
            right: Box::new(Self::build(right_items)),
            bbox: bounds,
        }
    }

    /// Precomputed bounding box of this node.
    pub fn bbox(&self) -> Aabb {
        match self {
            BvhNode::Leaf { bbox, .. } | BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    /// Number of levels below and including this node.
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Number of primitives stored in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

impl Hittable for BvhNode {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        match self {
            BvhNode::Leaf { object, bbox } => {
                bbox.hit(ray, ray_t) && object.hit(ray, ray_t, rec)
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let hit_left = left.hit(ray, ray_t, rec);

                // Only check right up to closest hit
                let right_max = if hit_left { rec.t } else { ray_t.max };
                let hit_right = right.hit(ray, ray_t.with_max(right_max), rec);

                hit_left || hit_right
            }
        }
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        Some(self.bbox())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HittableList, Lambertian, Material, Sphere};
    use prism_math::Vec3;
    use std::sync::Arc;

    fn grey() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Vec3::splat(0.5)))
    }

    /// A hittable with no bounding box.
    struct Unbounded;

    impl Hittable for Unbounded {
        fn hit<'a>(&'a self, _ray: &Ray, _ray_t: Interval, _rec: &mut HitRecord<'a>) -> bool {
            false
        }

        fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
            None
        }
    }

    #[test]
    fn test_bvh_empty_is_an_error() {
        let result = BvhNode::new(vec![], 0.0, 1.0);
        assert!(matches!(result, Err(SceneError::EmptyObjectList)));
    }

    #[test]
    fn test_bvh_rejects_unbounded_object() {
        let objects: Vec<Box<dyn Hittable>> = vec![
            Box::new(Sphere::new(Vec3::ZERO, 1.0, grey())),
            Box::new(Unbounded),
        ];
        let result = BvhNode::new(objects, 0.0, 1.0);
        assert!(matches!(result, Err(SceneError::UnboundedObject { index: 1 })));
    }

    #[test]
    fn test_bvh_single_sphere() {
        let objects: Vec<Box<dyn Hittable>> =
            vec![Box::new(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey()))];
        let bvh = BvhNode::new(objects, 0.0, 1.0).unwrap();

        assert!(matches!(bvh, BvhNode::Leaf { .. }));

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);
        let mut rec = HitRecord::default();
        assert!(bvh.hit(&ray, Ray::valid_range(), &mut rec));
    }

    #[test]
    fn test_bvh_structure() {
        let spheres: Vec<Box<dyn Hittable>> = (0..7)
            .map(|i| {
                Box::new(Sphere::new(Vec3::new(i as f32 * 2.0, 0.0, -5.0), 0.5, grey()))
                    as Box<dyn Hittable>
            })
            .collect();
        let bvh = BvhNode::new(spheres, 0.0, 1.0).unwrap();

        assert_eq!(bvh.leaf_count(), 7);
        assert_eq!(bvh.depth(), 4);

        // Root box covers every sphere
        let root = bvh.bounding_box(0.0, 1.0).unwrap();
        assert!(root.x.min <= -0.5 && root.x.max >= 12.5);
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let spheres: Vec<Box<dyn Hittable>> = (0..10)
            .map(|i| {
                Box::new(Sphere::new(Vec3::new(i as f32, 0.0, -5.0), 0.5, grey()))
                    as Box<dyn Hittable>
            })
            .collect();
        let bvh = BvhNode::new(spheres, 0.0, 1.0).unwrap();

        // Ray that hits sphere at x=5
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), 0.0);
        let mut rec = HitRecord::default();
        assert!(bvh.hit(&ray, Ray::valid_range(), &mut rec));

        // Hit point should be near z = -4.5 (sphere at z=-5, radius 0.5)
        assert!((rec.p.z - (-4.5)).abs() < 0.01);
    }

    #[test]
    fn test_bvh_picks_closest_regardless_of_order() {
        // Closest sphere is last in input order
        let objects: Vec<Box<dyn Hittable>> = vec![
            Box::new(Sphere::new(Vec3::new(0.0, 0.0, -20.0), 1.0, grey())),
            Box::new(Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, grey())),
            Box::new(Sphere::new(Vec3::new(0.0, 0.0, -4.0), 1.0, grey())),
        ];
        let bvh = BvhNode::new(objects, 0.0, 1.0).unwrap();
        let list = HittableList::from(vec![Box::new(bvh) as Box<dyn Hittable>]);

        let ray = Ray::new_simple(Vec3::ZERO, Vec3::NEG_Z);
        let mut rec = HitRecord::default();
        assert!(list.hit(&ray, Ray::valid_range(), &mut rec));
        assert!((rec.t - 3.0).abs() < 1e-4);
    }
}
