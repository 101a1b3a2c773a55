//! Click, focus and reset handling
//!
//! [`FocusController`] decides what a click on the scene means: it toggles
//! the light for the ring, focuses numbered objects (highlight, camera zoom,
//! delayed reveal of their information) and ignores everything else. A wheel
//! gesture always returns to the overview.

use std::time::Instant;

use log::{debug, info};

use crate::{
    assets::RING_NAME,
    config::FocusSettings,
    content::is_numbered,
    gfx::scene::{NodeId, Scene},
};

/// What a click did
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Nothing under the pointer
    Miss,
    /// The nearest hit belongs to a non-selectable object
    NotSelectable,
    /// An object is already focused; clicks are ignored until reset
    Locked,
    LightToggled { visible: bool },
    Focused { node: NodeId, name: String },
    /// Selectable but neither the ring nor numbered
    Unrecognized,
}

/// One-shot delayed reveal of an object's information
#[derive(Debug, Clone, PartialEq)]
pub struct RevealTimer {
    pub name: String,
    pub due: Instant,
}

pub struct FocusController {
    settings: FocusSettings,
    selected: Option<NodeId>,
    focus_mode: bool,
    target_fov: f32,
    pending_reveal: Option<RevealTimer>,
}

impl FocusController {
    pub fn new(settings: FocusSettings) -> Self {
        Self {
            target_fov: settings.default_fov,
            settings,
            selected: None,
            focus_mode: false,
            pending_reveal: None,
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn is_focused(&self) -> bool {
        self.focus_mode
    }

    /// Field of view (degrees) the camera should ease towards
    pub fn target_fov(&self) -> f32 {
        self.target_fov
    }

    pub fn pending_reveal(&self) -> Option<&RevealTimer> {
        self.pending_reveal.as_ref()
    }

    /// Handles a click whose nearest pick hit `hit`
    pub fn handle_click(&mut self, scene: &mut Scene, hit: Option<NodeId>, now: Instant) -> ClickOutcome {
        let Some(hit) = hit else {
            return ClickOutcome::Miss;
        };
        if !scene.is_selectable(hit) {
            return ClickOutcome::NotSelectable;
        }

        let object = scene.top_level_ancestor(hit);
        if self.focus_mode {
            return ClickOutcome::Locked;
        }

        if let Some(previous) = self.selected.take() {
            scene.reset_highlight(previous);
        }

        let Some(name) = scene.node(object).map(|n| n.name.clone()) else {
            return ClickOutcome::Miss;
        };

        if name == RING_NAME {
            let visible = scene.light.toggle();
            info!("light {}", if visible { "on" } else { "off" });
            return ClickOutcome::LightToggled { visible };
        }

        if !is_numbered(&name) {
            debug!("clicked '{}', nothing to do", name);
            return ClickOutcome::Unrecognized;
        }

        scene.highlight_subtree(
            object,
            self.settings.highlight_color,
            self.settings.highlight_intensity,
        );
        let center = scene
            .world_center(object)
            .unwrap_or(self.settings.world_center);

        let camera = &mut scene.camera_manager.camera;
        camera.set_target(center);
        camera.enable_rotate = false;
        camera.enable_pan = false;

        self.target_fov = self.settings.zoom_fov;
        self.focus_mode = true;
        self.selected = Some(object);
        self.pending_reveal = Some(RevealTimer {
            name: name.clone(),
            due: now + self.settings.reveal_delay,
        });

        info!("focused object '{}'", name);
        ClickOutcome::Focused { node: object, name }
    }

    /// Returns to the overview; applies whether or not anything is focused
    pub fn handle_wheel(&mut self, scene: &mut Scene) {
        if self.pending_reveal.take().is_some() {
            debug!("pending reveal cancelled");
        }
        self.target_fov = self.settings.default_fov;
        self.focus_mode = false;

        let camera = &mut scene.camera_manager.camera;
        camera.set_target(self.settings.world_center);
        camera.enable_rotate = true;
        camera.enable_pan = true;

        if let Some(selected) = self.selected.take() {
            scene.reset_highlight(selected);
        }
    }

    /// The name of the object whose reveal is due, exactly once
    pub fn poll_reveal(&mut self, now: Instant) -> Option<String> {
        if self.pending_reveal.as_ref()?.due > now {
            return None;
        }
        self.pending_reveal.take().map(|timer| timer.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ViewerConfig,
        gfx::{
            resources::MaterialManager,
            scene::scene::tests::{add_cube_object, empty_scene},
        },
    };
    use cgmath::Vector3;
    use std::time::Duration;

    fn controller() -> FocusController {
        FocusController::new(ViewerConfig::default().focus)
    }

    fn mesh_material(scene: &Scene, node: NodeId) -> String {
        scene.node(node).unwrap().meshes[0].material.clone()
    }

    #[test]
    fn clicking_numbered_object_focuses_and_schedules_one_reveal() {
        let mut scene = empty_scene();
        let (object, mesh) = add_cube_object(&mut scene, "7", Vector3::new(1.0, 0.5, 2.0), true);
        let mut focus = controller();
        let now = Instant::now();

        let outcome = focus.handle_click(&mut scene, Some(mesh), now);

        assert_eq!(
            outcome,
            ClickOutcome::Focused {
                node: object,
                name: "7".to_string()
            }
        );
        assert!(focus.is_focused());
        assert_eq!(focus.selected(), Some(object));
        assert_eq!(focus.target_fov(), 35.0);

        let camera = &scene.camera_manager.camera;
        assert_eq!(camera.target, Vector3::new(1.0, 0.5, 2.0));
        assert!(!camera.enable_rotate);
        assert!(!camera.enable_pan);
        assert_ne!(mesh_material(&scene, mesh), MaterialManager::DEFAULT);

        let timer = focus.pending_reveal().unwrap();
        assert_eq!(timer.name, "7");
        assert_eq!(timer.due, now + Duration::from_millis(3000));
    }

    #[test]
    fn reveal_fires_once_when_due() {
        let mut scene = empty_scene();
        let (_, mesh) = add_cube_object(&mut scene, "12", Vector3::new(0.0, 0.0, 0.0), true);
        let mut focus = controller();
        let now = Instant::now();
        focus.handle_click(&mut scene, Some(mesh), now);

        assert_eq!(focus.poll_reveal(now + Duration::from_millis(2999)), None);
        assert_eq!(
            focus.poll_reveal(now + Duration::from_secs(3)),
            Some("12".to_string())
        );
        assert_eq!(focus.poll_reveal(now + Duration::from_secs(10)), None);
    }

    #[test]
    fn wheel_always_cancels_reveal_and_restores_defaults() {
        let mut scene = empty_scene();
        let (_, mesh) = add_cube_object(&mut scene, "4", Vector3::new(2.0, 0.0, 0.0), true);
        let mut focus = controller();
        let now = Instant::now();
        focus.handle_click(&mut scene, Some(mesh), now);

        focus.handle_wheel(&mut scene);

        assert!(focus.pending_reveal().is_none());
        assert!(!focus.is_focused());
        assert_eq!(focus.selected(), None);
        assert_eq!(focus.target_fov(), 75.0);
        assert_eq!(mesh_material(&scene, mesh), MaterialManager::DEFAULT);

        let camera = &scene.camera_manager.camera;
        assert_eq!(camera.target, Vector3::new(0.0, 0.0, 0.0));
        assert!(camera.enable_rotate);
        assert!(camera.enable_pan);
        assert_eq!(focus.poll_reveal(now + Duration::from_secs(60)), None);

        // Also harmless with nothing focused
        focus.handle_wheel(&mut scene);
        assert!(!focus.is_focused());
        assert_eq!(focus.target_fov(), 75.0);
    }

    #[test]
    fn clicking_ring_toggles_light_without_focus() {
        let mut scene = empty_scene();
        let (_, mesh) = add_cube_object(&mut scene, RING_NAME, Vector3::new(0.0, 0.0, 0.0), true);
        let mut focus = controller();
        let now = Instant::now();

        assert_eq!(
            focus.handle_click(&mut scene, Some(mesh), now),
            ClickOutcome::LightToggled { visible: false }
        );
        assert!(!scene.light.visible);
        assert!(!focus.is_focused());
        assert!(focus.pending_reveal().is_none());
        assert_eq!(mesh_material(&scene, mesh), MaterialManager::DEFAULT);

        assert_eq!(
            focus.handle_click(&mut scene, Some(mesh), now),
            ClickOutcome::LightToggled { visible: true }
        );
        assert!(scene.light.visible);
    }

    #[test]
    fn clicks_while_focused_are_ignored() {
        let mut scene = empty_scene();
        let (first, first_mesh) = add_cube_object(&mut scene, "1", Vector3::new(0.0, 0.0, 0.0), true);
        let (_, second_mesh) = add_cube_object(&mut scene, "2", Vector3::new(3.0, 0.0, 0.0), true);
        let (_, ring_mesh) = add_cube_object(&mut scene, RING_NAME, Vector3::new(-3.0, 0.0, 0.0), true);
        let mut focus = controller();
        let now = Instant::now();
        focus.handle_click(&mut scene, Some(first_mesh), now);
        let timer = focus.pending_reveal().cloned();

        let later = now + Duration::from_secs(1);
        assert_eq!(
            focus.handle_click(&mut scene, Some(second_mesh), later),
            ClickOutcome::Locked
        );
        assert_eq!(
            focus.handle_click(&mut scene, Some(ring_mesh), later),
            ClickOutcome::Locked
        );

        assert_eq!(focus.selected(), Some(first));
        assert_eq!(focus.pending_reveal().cloned(), timer);
        assert!(scene.light.visible);
        assert_eq!(mesh_material(&scene, second_mesh), MaterialManager::DEFAULT);
        assert_eq!(scene.camera_manager.camera.target, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn non_selectable_and_missing_hits_do_nothing() {
        let mut scene = empty_scene();
        let (_, floor_mesh) = add_cube_object(&mut scene, "floor", Vector3::new(0.0, 0.0, 0.0), false);
        let (_, other_mesh) = add_cube_object(&mut scene, "plaque", Vector3::new(0.0, 2.0, 0.0), true);
        let mut focus = controller();
        let now = Instant::now();

        assert_eq!(focus.handle_click(&mut scene, None, now), ClickOutcome::Miss);
        assert_eq!(
            focus.handle_click(&mut scene, Some(floor_mesh), now),
            ClickOutcome::NotSelectable
        );
        assert_eq!(
            focus.handle_click(&mut scene, Some(other_mesh), now),
            ClickOutcome::Unrecognized
        );
        assert!(!focus.is_focused());
        assert!(focus.pending_reveal().is_none());
    }

    #[test]
    fn leading_digits_are_enough_to_focus() {
        let mut scene = empty_scene();
        let (object, mesh) = add_cube_object(&mut scene, "12abc", Vector3::new(0.0, 0.0, 0.0), true);
        let mut focus = controller();

        let outcome = focus.handle_click(&mut scene, Some(mesh), Instant::now());
        assert!(matches!(outcome, ClickOutcome::Focused { node, .. } if node == object));
    }

    #[test]
    fn overlong_number_still_focuses() {
        let mut scene = empty_scene();
        let (object, mesh) = add_cube_object(
            &mut scene,
            "123456789012345678901234567890",
            Vector3::new(0.0, 0.0, 0.0),
            true,
        );
        let mut focus = controller();

        let outcome = focus.handle_click(&mut scene, Some(mesh), Instant::now());
        assert!(matches!(outcome, ClickOutcome::Focused { node, .. } if node == object));
    }

    #[test]
    fn refocus_after_reset_replaces_the_timer() {
        let mut scene = empty_scene();
        let (_, a) = add_cube_object(&mut scene, "5", Vector3::new(0.0, 0.0, 0.0), true);
        let (b_object, b) = add_cube_object(&mut scene, "6", Vector3::new(2.0, 0.0, 0.0), true);
        let mut focus = controller();
        let now = Instant::now();

        focus.handle_click(&mut scene, Some(a), now);
        focus.handle_wheel(&mut scene);
        let later = now + Duration::from_secs(1);
        focus.handle_click(&mut scene, Some(b), later);

        assert_eq!(focus.selected(), Some(b_object));
        assert_eq!(mesh_material(&scene, a), MaterialManager::DEFAULT);
        let timer = focus.pending_reveal().unwrap();
        assert_eq!(timer.name, "6");
        assert_eq!(timer.due, later + Duration::from_secs(3));
    }
}
