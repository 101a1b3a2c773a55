//! # Object Picking System
//!
//! Mouse ray-casting against the scene graph.
//!
//! ## How it works
//!
//! 1. **Mouse to Ray**: Convert mouse coordinates to a ray from the camera eye
//! 2. **Broad phase**: Test the ray against each mesh's bounding box in mesh space
//! 3. **Narrow phase**: Test the mesh triangles, both faces
//! 4. **Selection**: Return the closest hit

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4, Zero};

use crate::gfx::{
    camera::orbit_camera::OrbitCamera,
    scene::{node::NodeId, Scene},
};

/// Triangles closer to parallel than this are treated as misses
const PARALLEL_EPSILON: f32 = 1e-8;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    /// Ray direction; normalized unless built by [`Ray::transform`]
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray with a normalized direction
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Maps the ray by an affine matrix without renormalizing, so `t`
    /// values stay comparable with the untransformed ray
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let o = matrix * self.origin.extend(1.0);
        let d = matrix * self.direction.extend(0.0);
        Self {
            origin: o.truncate() / o.w,
            direction: d.truncate(),
        }
    }

    /// Möller–Trumbore intersection, accepting hits on either face
    pub fn intersect_triangle(&self, triangle: &[Vector3<f32>; 3]) -> Option<f32> {
        let [a, b, c] = *triangle;
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl AABB {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices (a zero box at the origin if empty)
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        let mut min = Vector3::from(*first);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            let v = Vector3::from(*vertex);
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }

        Self::new(min, max)
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Smallest box containing both
    pub fn union(&self, other: &AABB) -> AABB {
        AABB::from_vertices(&[self.min.into(), self.max.into(), other.min.into(), other.max.into()])
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        // Transform all 8 corners of the AABB and compute new bounds
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let transformed_corners: Vec<[f32; 3]> = corners
            .iter()
            .map(|corner| {
                let transformed = matrix * Vector4::new(corner.x, corner.y, corner.z, 1.0);
                [
                    transformed.x / transformed.w,
                    transformed.y / transformed.w,
                    transformed.z / transformed.w,
                ]
            })
            .collect();

        Self::from_vertices(&transformed_corners)
    }
}

/// Result of an object picking operation
#[derive(Debug, Clone)]
pub struct PickResult {
    /// Node owning the mesh that was hit
    pub node: NodeId,
    /// Distance from the camera eye to the intersection point
    pub distance: f32,
    /// World space intersection point
    pub intersection_point: Vector3<f32>,
}

/// Object picker for 3D mouse selection
#[derive(Debug, Default)]
pub struct ObjectPicker;

impl ObjectPicker {
    pub fn new() -> Self {
        Self
    }

    /// Convert screen coordinates (pixels, origin top-left) to a world-space ray
    /// starting at the camera eye
    pub fn screen_to_ray(
        &self,
        screen_pos: (f32, f32),
        screen_size: (f32, f32),
        camera: &OrbitCamera,
    ) -> Ray {
        let (mouse_x, mouse_y) = screen_pos;
        let (screen_width, screen_height) = (screen_size.0.max(1.0), screen_size.1.max(1.0));

        // Normalized device coordinates (-1 to 1), Y up
        let ndc_x = (2.0 * mouse_x) / screen_width - 1.0;
        let ndc_y = 1.0 - (2.0 * mouse_y) / screen_height;

        let half_height = (camera.fov_deg.to_radians() / 2.0).tan();
        let half_width = half_height * camera.aspect;
        let (right, up, forward) = camera.basis();

        let direction = forward + right * (ndc_x * half_width) + up * (ndc_y * half_height);
        Ray::new(camera.eye, direction)
    }

    /// Pick the nearest visible mesh under the mouse
    pub fn pick_object(
        &self,
        screen_pos: (f32, f32),
        screen_size: (f32, f32),
        camera: &OrbitCamera,
        scene: &Scene,
    ) -> Option<PickResult> {
        let ray = self.screen_to_ray(screen_pos, screen_size, camera);
        self.pick_with_ray(&ray, scene)
    }

    /// Nearest hit of `ray` against every visible mesh in the scene
    pub fn pick_with_ray(&self, ray: &Ray, scene: &Scene) -> Option<PickResult> {
        let mut closest_result: Option<PickResult> = None;

        for (id, node) in scene.nodes() {
            if !node.has_meshes() || !scene.is_visible(id) {
                continue;
            }
            let Some(to_local) = scene.world_transform(id).invert() else {
                continue; // degenerate scale
            };
            let local_ray = ray.transform(&to_local);

            for instance in &node.meshes {
                if instance.mesh.bounds().intersect_ray(&local_ray).is_none() {
                    continue;
                }
                let nearest = instance
                    .mesh
                    .triangles()
                    .filter_map(|triangle| local_ray.intersect_triangle(&triangle))
                    .reduce(f32::min);

                let Some(distance) = nearest else {
                    continue;
                };
                if closest_result
                    .as_ref()
                    .map_or(true, |result| distance < result.distance)
                {
                    closest_result = Some(PickResult {
                        node: id,
                        distance,
                        intersection_point: ray.point_at(distance),
                    });
                }
            }
        }

        closest_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::scene::tests::{add_cube_object, empty_scene};

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = AABB::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(aabb.center(), Vector3::zero());
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = AABB::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn triangle_is_hit_from_both_sides() {
        let triangle = [
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let front = Ray::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let back = Ray::new(Vector3::new(0.0, 0.0, -2.0), Vector3::new(0.0, 0.0, 1.0));
        let beside = Ray::new(Vector3::new(3.0, 0.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let behind = Ray::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, 1.0));

        assert!((front.intersect_triangle(&triangle).unwrap() - 3.0).abs() < 1e-6);
        assert!((back.intersect_triangle(&triangle).unwrap() - 2.0).abs() < 1e-6);
        assert!(beside.intersect_triangle(&triangle).is_none());
        assert!(behind.intersect_triangle(&triangle).is_none());
    }

    #[test]
    fn nearest_object_wins() {
        let mut scene = empty_scene();
        let (_, far_mesh) = add_cube_object(&mut scene, "far", Vector3::new(0.0, 0.0, -5.0), true);
        let (_, near_mesh) = add_cube_object(&mut scene, "near", Vector3::new(0.0, 0.0, 0.0), true);

        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = ObjectPicker::new().pick_with_ray(&ray, &scene).unwrap();

        assert_eq!(hit.node, near_mesh);
        assert_ne!(hit.node, far_mesh);
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert!((hit.intersection_point.z - 0.5).abs() < 1e-5);
    }

    #[test]
    fn hidden_nodes_are_not_picked() {
        let mut scene = empty_scene();
        let (group, _) = add_cube_object(&mut scene, "1", Vector3::new(0.0, 0.0, 0.0), true);
        scene.node_mut(group).unwrap().visible = false;

        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ObjectPicker::new().pick_with_ray(&ray, &scene).is_none());
    }

    #[test]
    fn scaled_node_keeps_world_distance() {
        let mut scene = empty_scene();
        let (group, _) = add_cube_object(&mut scene, "big", Vector3::new(0.0, 0.0, 0.0), true);
        scene.node_mut(group).unwrap().transform.scale = Vector3::new(4.0, 4.0, 4.0);

        let ray = Ray::new(Vector3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = ObjectPicker::new().pick_with_ray(&ray, &scene).unwrap();
        assert!((hit.distance - 8.0).abs() < 1e-4);
    }

    #[test]
    fn screen_centre_ray_points_at_target() {
        let mut scene = empty_scene();
        scene.camera_manager.camera.update();
        let camera = &scene.camera_manager.camera;

        let ray = ObjectPicker::new().screen_to_ray((600.0, 400.0), (1200.0, 800.0), camera);
        let to_target = (camera.target - camera.eye).normalize();

        assert_eq!(ray.origin, camera.eye);
        assert!((ray.direction - to_target).magnitude() < 1e-5);

        // Top of the screen looks above the target
        let top = ObjectPicker::new().screen_to_ray((600.0, 0.0), (1200.0, 800.0), camera);
        assert!(top.direction.y > ray.direction.y);
    }

    #[test]
    fn click_through_camera_hits_cube_at_origin() {
        let mut scene = empty_scene();
        let (_, mesh) = add_cube_object(&mut scene, "3", Vector3::new(0.0, 0.0, 0.0), true);
        scene.camera_manager.camera.update();

        let picker = ObjectPicker::new();
        let camera = &scene.camera_manager.camera;
        let hit = picker.pick_object((600.0, 400.0), (1200.0, 800.0), camera, &scene);
        assert_eq!(hit.map(|h| h.node), Some(mesh));

        let miss = picker.pick_object((0.0, 0.0), (1200.0, 800.0), camera, &scene);
        assert!(miss.is_none());
    }
}
