//! Information panel shown for a focused object
//!
//! Displays an [`InfoEntry`]'s title, text and picture centred over the
//! scene. Pictures are decoded once per path and uploaded through the
//! [`UiManager`]; a picture that fails to load is logged and left out.
//! Clips are handed to the system player from a button.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use imgui::{Condition, TextureId};
use log::{info, warn};

use crate::{
    content::InfoEntry,
    error::{Result, ViewerError},
};

use super::manager::UiManager;

const PANEL_MAX_WIDTH: f32 = 520.0;

#[derive(Debug, Clone, Copy)]
struct LoadedImage {
    texture: TextureId,
    size: [f32; 2],
}

/// Entry currently on screen, media paths resolved against the content dir
#[derive(Debug, Clone, PartialEq)]
pub struct ShownEntry {
    pub title: String,
    pub content: String,
    pub image: Option<PathBuf>,
    pub video: Option<PathBuf>,
}

pub struct InfoPanel {
    content_dir: PathBuf,
    shown: Option<ShownEntry>,
    // None records a failed load so it is not retried every frame
    images: HashMap<PathBuf, Option<LoadedImage>>,
}

impl InfoPanel {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            shown: None,
            images: HashMap::new(),
        }
    }

    /// Replaces whatever is shown with `entry`
    pub fn show(&mut self, entry: &InfoEntry) {
        info!("showing information for '{}'", entry.title);
        self.shown = Some(ShownEntry {
            title: entry.title.clone(),
            content: entry.content.clone(),
            image: entry.image.as_ref().map(|p| self.content_dir.join(p)),
            video: entry.video.as_ref().map(|p| self.content_dir.join(p)),
        });
    }

    pub fn hide(&mut self) {
        self.shown = None;
    }

    pub fn is_visible(&self) -> bool {
        self.shown.is_some()
    }

    pub fn shown(&self) -> Option<&ShownEntry> {
        self.shown.as_ref()
    }

    /// Uploads the shown entry's picture if it has not been seen yet
    pub fn prepare(&mut self, ui: &mut UiManager, device: &wgpu::Device, queue: &wgpu::Queue) {
        let Some(path) = self.shown.as_ref().and_then(|s| s.image.clone()) else {
            return;
        };
        if self.images.contains_key(&path) {
            return;
        }

        let loaded = match load_rgba(&path) {
            Ok(rgba) => {
                let (w, h) = rgba.dimensions();
                Some(LoadedImage {
                    texture: ui.upload_image(device, queue, &rgba),
                    size: [w as f32, h as f32],
                })
            }
            Err(e) => {
                warn!("{:#}", anyhow::Error::new(e));
                None
            }
        };
        self.images.insert(path, loaded);
    }

    pub fn draw(&self, ui: &imgui::Ui) {
        let Some(shown) = &self.shown else {
            return;
        };
        let image = shown
            .image
            .as_ref()
            .and_then(|p| self.images.get(p).copied().flatten());

        let [display_w, display_h] = ui.io().display_size;
        let width = display_w.min(PANEL_MAX_WIDTH);

        ui.window("##info")
            .position([display_w * 0.5, display_h * 0.5], Condition::Always)
            .position_pivot([0.5, 0.5])
            .size([width, 0.0], Condition::Always)
            .title_bar(false)
            .resizable(false)
            .movable(false)
            .collapsible(false)
            .build(|| {
                ui.text(&shown.title);
                ui.separator();
                ui.text_wrapped(&shown.content);

                if let Some(image) = image {
                    let avail = ui.content_region_avail()[0];
                    let [w, h] = fit_width(image.size, avail);
                    ui.spacing();
                    imgui::Image::new(image.texture, [w, h]).build(ui);
                }

                if let Some(video) = &shown.video {
                    ui.spacing();
                    if ui.button("Reproducir") {
                        if let Err(e) = play_video(video) {
                            warn!("{:#}", anyhow::Error::new(e));
                        }
                    }
                    ui.same_line();
                    ui.text_disabled(video.file_name().map(|n| n.to_string_lossy()).unwrap_or_default());
                }
            });
    }
}

/// Decodes `path` into 8-bit RGBA
pub fn load_rgba(path: &Path) -> Result<image::RgbaImage> {
    if !path.exists() {
        return Err(ViewerError::MissingAsset {
            path: path.to_path_buf(),
        });
    }
    let decoded = image::open(path).map_err(|source| ViewerError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgba8())
}

/// Opens the clip at `path` with the platform's default player
pub fn play_video(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(ViewerError::MissingAsset {
            path: path.to_path_buf(),
        });
    }
    open::that(path).map_err(|source| ViewerError::Player {
        path: path.to_path_buf(),
        source,
    })?;
    info!("playing '{}'", path.display());
    Ok(())
}

/// Scales `size` down to at most `max_width`, keeping the aspect ratio
fn fit_width(size: [f32; 2], max_width: f32) -> [f32; 2] {
    if size[0] <= max_width || size[0] <= 0.0 {
        return size;
    }
    let scale = max_width / size[0];
    [max_width, size[1] * scale]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::InfoCatalog;

    #[test]
    fn show_resolves_media_against_content_dir() {
        let catalog = InfoCatalog::default();
        let mut panel = InfoPanel::new("/srv/showcase");
        assert!(!panel.is_visible());

        panel.show(catalog.get(1).unwrap());
        let shown = panel.shown().unwrap();
        assert_eq!(shown.title, "Objeto 1");
        assert_eq!(shown.image, Some(PathBuf::from("/srv/showcase/images/1.png")));
        assert_eq!(shown.video, None);

        panel.show(catalog.get(3).unwrap());
        let shown = panel.shown().unwrap();
        assert_eq!(shown.image, None);
        assert_eq!(shown.video, Some(PathBuf::from("/srv/showcase/videos/3.mp4")));

        panel.hide();
        assert!(!panel.is_visible());
    }

    #[test]
    fn missing_picture_is_reported() {
        let path = std::env::temp_dir().join("vitrine-no-such-image.png");
        assert!(matches!(
            load_rgba(&path),
            Err(ViewerError::MissingAsset { .. })
        ));
    }

    #[test]
    fn undecodable_picture_is_an_image_error() {
        let path = std::env::temp_dir().join(format!("vitrine-bad-{}.png", std::process::id()));
        std::fs::write(&path, b"not a png").unwrap();

        let result = load_rgba(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ViewerError::Image { .. })));
    }

    #[test]
    fn decodes_a_real_png() {
        let path = std::env::temp_dir().join(format!("vitrine-ok-{}.png", std::process::id()));
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let result = load_rgba(&path);
        std::fs::remove_file(&path).ok();
        let rgba = result.unwrap();
        assert_eq!(rgba.dimensions(), (3, 2));
        assert_eq!(rgba.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn missing_clip_is_not_handed_to_the_player() {
        let path = std::env::temp_dir().join("vitrine-no-such-clip.mp4");
        assert!(matches!(
            play_video(&path),
            Err(ViewerError::MissingAsset { .. })
        ));
    }

    #[test]
    fn wide_pictures_are_scaled_to_fit() {
        assert_eq!(fit_width([100.0, 50.0], 200.0), [100.0, 50.0]);
        assert_eq!(fit_width([400.0, 200.0], 200.0), [200.0, 100.0]);
    }
}
