use crate::core::bounds::Extent;
use crate::core::constants::DEFAULT_MAX_ZOOM;
use crate::core::geo::{Coordinate, Projection};

/// Center, zoom and projection of a map.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    projection: Projection,
    center: Coordinate,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl View {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            center: Coordinate::default(),
            zoom: 0.0,
            min_zoom: 0.0,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }

    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = center;
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.set_zoom(zoom);
        self
    }

    pub fn with_zoom_limits(mut self, min_zoom: Option<f64>, max_zoom: Option<f64>) -> Self {
        self.min_zoom = min_zoom.unwrap_or(0.0);
        self.max_zoom = max_zoom.unwrap_or(DEFAULT_MAX_ZOOM);
        self.set_zoom(self.zoom);
        self
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn set_center(&mut self, center: Coordinate) {
        self.center = center;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Sets the zoom, clamped to the view's limits.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Map units per pixel at the current zoom.
    pub fn resolution(&self) -> f64 {
        self.projection.max_resolution() / 2f64.powf(self.zoom)
    }

    /// Extent visible in a viewport of `size` pixels.
    pub fn calculate_extent(&self, size: (f64, f64)) -> Extent {
        let half_w = size.0 * self.resolution() / 2.0;
        let half_h = size.1 * self.resolution() / 2.0;
        Extent::from_coords(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
        )
    }

    /// Centers on `extent` and picks the largest zoom that shows all of it in
    /// a viewport of `size` pixels. A zero-area extent zooms to the max zoom.
    pub fn fit(&mut self, extent: &Extent, size: (f64, f64)) {
        if extent.is_empty() {
            return;
        }
        self.center = extent.center();
        let wanted = (extent.width() / size.0.max(1.0)).max(extent.height() / size.1.max(1.0));
        if wanted <= 0.0 {
            self.set_zoom(self.max_zoom);
            return;
        }
        let zoom = (self.projection.max_resolution() / wanted).log2();
        self.set_zoom(zoom);
    }
}
