use crate::animation::easing::EasingType;
use crate::core::geo::LatLng;
use std::time::Duration;

/// An animated programmatic camera move, advanced by the map's tick
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    pub from_center: LatLng,
    pub from_zoom: f64,
    pub to_center: LatLng,
    pub to_zoom: f64,
    started_at: Duration,
    duration: Duration,
    easing: EasingType,
}

/// One interpolated camera frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub center: LatLng,
    pub zoom: f64,
    pub finished: bool,
}

impl CameraTransition {
    pub fn new(
        from: (LatLng, f64),
        to: (LatLng, f64),
        started_at: Duration,
        duration: Duration,
        easing: EasingType,
    ) -> Self {
        Self {
            from_center: from.0,
            from_zoom: from.1,
            to_center: to.0,
            to_zoom: to.1,
            started_at,
            duration,
            easing,
        }
    }

    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn sample(&self, now: Duration) -> CameraFrame {
        let t = self.progress(now);
        if t >= 1.0 {
            return CameraFrame {
                center: self.to_center,
                zoom: self.to_zoom,
                finished: true,
            };
        }

        let eased = self.easing.apply(t);
        let lerp = |a: f64, b: f64| a + (b - a) * eased;
        CameraFrame {
            center: LatLng::new(
                lerp(self.from_center.lat, self.to_center.lat),
                lerp(self.from_center.lng, self.to_center.lng),
            ),
            zoom: lerp(self.from_zoom, self.to_zoom),
            finished: false,
        }
    }
}
