use ash::vk;

/// 视口：左上角偏移与尺寸
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub offset: glam::Vec2,
    pub size: glam::Vec2,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

// new & init
impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            offset: glam::Vec2::ZERO,
            size: glam::Vec2::new(width as f32, height as f32),
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

// getters
impl Viewport {
    #[inline]
    pub fn width(&self) -> u32 {
        self.size.x as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.y as u32
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width(),
            height: self.height(),
        }
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        if self.size.y == 0.0 { 1.0 } else { self.size.x / self.size.y }
    }
}
