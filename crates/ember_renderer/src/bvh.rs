//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree of boxes over shared primitives. Each level sorts its span
//! by the lower bound of the primitives' boxes along the span's longest axis
//! and splits at the median, so the tree is balanced by count.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{RenderError, RenderResult};
use crate::{Aabb, Axis, HitRecord, Hittable, HittableList, Interval, Ray};

/// Interior node of the hierarchy.
///
/// A leaf holding a single primitive has `left` and `right` pointing at the
/// same object.
pub struct BvhNode {
    left: Arc<dyn Hittable>,
    right: Arc<dyn Hittable>,
    bbox: Aabb,
}

#[derive(Debug, Default)]
struct BuildStats {
    nodes: usize,
    max_depth: usize,
}

impl BvhNode {
    /// Build a BVH over `objects`.
    ///
    /// Returns [`RenderError::EmptyScene`] when there is nothing to build over.
    pub fn new(mut objects: Vec<Arc<dyn Hittable>>) -> RenderResult<Self> {
        if objects.is_empty() {
            return Err(RenderError::EmptyScene);
        }

        let mut stats = BuildStats::default();
        let root = Self::build(&mut objects, 1, &mut stats);

        log::debug!(
            "Built BVH over {} primitives: {} nodes, depth {}, bounds {:?}",
            objects.len(),
            stats.nodes,
            stats.max_depth,
            root.bbox
        );

        Ok(root)
    }

    /// Build a BVH over the contents of a list.
    pub fn from_list(list: HittableList) -> RenderResult<Self> {
        Self::new(list.into_objects())
    }

    /// Recursive construction over a non-empty span, reordering it in place.
    fn build(objects: &mut [Arc<dyn Hittable>], depth: usize, stats: &mut BuildStats) -> Self {
        debug_assert!(!objects.is_empty());
        stats.nodes += 1;
        stats.max_depth = stats.max_depth.max(depth);

        let span_bounds = objects
            .iter()
            .fold(Aabb::EMPTY, |acc, obj| Aabb::surrounding(&acc, &obj.bounding_box()));
        let axis = span_bounds.longest_axis();

        let (left, right): (Arc<dyn Hittable>, Arc<dyn Hittable>) = match objects.len() {
            1 => (objects[0].clone(), objects[0].clone()),
            2 => (objects[0].clone(), objects[1].clone()),
            span => {
                objects.sort_unstable_by(|a, b| box_compare(a.as_ref(), b.as_ref(), axis));

                let mid = span / 2;
                let (lower, upper) = objects.split_at_mut(mid);
                (
                    Arc::new(Self::build(lower, depth + 1, stats)),
                    Arc::new(Self::build(upper, depth + 1, stats)),
                )
            }
        };

        // Tight to the children actually stored.
        let bbox = Aabb::surrounding(&left.bounding_box(), &right.bounding_box());

        Self { left, right, bbox }
    }
}

/// Order two primitives by the minimum of their boxes on `axis`.
fn box_compare(a: &dyn Hittable, b: &dyn Hittable, axis: Axis) -> Ordering {
    let a_min = a.bounding_box().axis_interval(axis).min;
    let b_min = b.bounding_box().axis_interval(axis).min;
    a_min.total_cmp(&b_min)
}

impl Hittable for BvhNode {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        if !self.bbox.hit(ray, ray_t) {
            return None;
        }

        let hit_left = self.left.hit(ray, ray_t);

        // Leaf: the same primitive sits on both sides.
        if Arc::ptr_eq(&self.left, &self.right) {
            return hit_left;
        }

        // Only check right up to the closest hit on the left
        let right_max = hit_left.map_or(ray_t.max, |rec| rec.t);
        self.right
            .hit(ray, Interval::new(ray_t.min, right_max))
            .or(hit_left)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
