//! Animated background colour
//!
//! The hue advances a fixed step per frame and wraps, at constant
//! saturation and lightness.

use crate::config::SkySettings;

#[derive(Debug, Clone)]
pub struct SkyCycle {
    hue: f32,
    color: [f32; 3],
    settings: SkySettings,
}

impl SkyCycle {
    pub fn new(settings: SkySettings) -> Self {
        Self {
            hue: 0.0,
            color: settings.initial_color,
            settings,
        }
    }

    /// Current background colour (sRGB, 0..1)
    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    /// Advances one frame and returns the new colour
    pub fn advance(&mut self) -> [f32; 3] {
        self.hue += self.settings.hue_step;
        if self.hue > 1.0 {
            self.hue = 0.0;
        }
        self.color = hsl_to_rgb(self.hue, self.settings.saturation, self.settings.lightness);
        self.color
    }
}

/// HSL (all components 0..1) to RGB
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn primary_hues() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), [0.0, 1.0, 0.0]));
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), [0.0, 0.0, 1.0]));
        assert!(close(hsl_to_rgb(0.3, 0.0, 0.25), [0.25, 0.25, 0.25]));
    }

    #[test]
    fn starts_with_initial_colour_then_cycles() {
        let settings = SkySettings::default();
        let initial = settings.initial_color;
        let mut sky = SkyCycle::new(settings);
        assert_eq!(sky.color(), initial);

        let first = sky.advance();
        assert!((sky.hue() - 0.0005).abs() < 1e-7);
        // Hue ~0 at s=0.6, l=0.5 is a muted red
        assert!(close(first, hsl_to_rgb(0.0005, 0.6, 0.5)));
        assert!(first[0] > first[1] && first[1] >= first[2]);
    }

    #[test]
    fn hue_wraps_past_one() {
        let mut sky = SkyCycle::new(SkySettings::default());
        for _ in 0..1990 {
            sky.advance();
        }
        assert!(sky.hue() > 0.99);
        for _ in 0..20 {
            sky.advance();
        }
        assert!(sky.hue() < 0.01);
    }
}
