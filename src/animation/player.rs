//! Time-indexed playback of one timeline over one raster.

use std::sync::Arc;

use glam::{DAffine2, DVec2};

use super::canvas::Surface;
use crate::format::{Frame, RasterImage, Rect, Timeline};

/// Plays a shared timeline with its raster at a placement offset.
///
/// Usage:
/// ```ignore
/// let mut player = library.player("walk")?.expect("known animation");
/// player.set_offset(DVec2::new(120.0, 80.0));
/// for tick in player.delay()..player.end_frame() {
///     player.draw(tick, &mut canvas);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    timeline: Arc<Timeline>,
    raster: Arc<RasterImage>,
    offset: DVec2,
    delay: i64,
    frame_count: usize,
    looping: bool,
}

impl AnimationPlayer {
    pub fn new(timeline: Arc<Timeline>, raster: Arc<RasterImage>) -> Self {
        let frame_count = timeline.frame_count();
        Self {
            timeline,
            raster,
            offset: DVec2::ZERO,
            delay: 0,
            frame_count,
            looping: false,
        }
    }

    /// Start playback `delay` ticks late.
    pub fn with_delay(mut self, delay: i64) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_offset(&mut self, offset: DVec2) {
        self.offset = offset;
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn raster(&self) -> &Arc<RasterImage> {
        &self.raster
    }

    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    pub fn delay(&self) -> i64 {
        self.delay
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Visible frames, after any early stop.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// First tick after the last visible frame.
    pub fn end_frame(&self) -> i64 {
        self.delay.saturating_add(self.frame_count as i64)
    }

    /// Frame shown at tick `at`.
    pub fn frame(&self, at: i64) -> Option<&Arc<Frame>> {
        let index = self.frame_index(at)?;
        self.timeline.frame(index)
    }

    fn frame_index(&self, at: i64) -> Option<usize> {
        let relative = at.checked_sub(self.delay)?;
        if relative < 0 || self.frame_count == 0 {
            return None;
        }
        let relative = relative as usize;
        if relative < self.frame_count {
            Some(relative)
        } else if self.looping {
            Some(relative % self.frame_count)
        } else {
            None
        }
    }

    /// End playback at the next return to the starting pose.
    ///
    /// The search begins at tick `max(1, at - delay)`; the first later
    /// frame that is the very same frame as the first one becomes the last
    /// visible frame. Without such a frame nothing changes.
    pub fn early_stop(&mut self, at: i64) {
        let first_tick = at.saturating_sub(self.delay).max(1);
        let first = usize::try_from(first_tick.saturating_sub(self.delay).max(1))
            .unwrap_or(usize::MAX);

        let frames = self.timeline.frames();
        let Some(rest) = frames.first() else {
            return;
        };
        if let Some(index) = (first..self.frame_count).find(|&i| Arc::ptr_eq(&frames[i], rest)) {
            log::trace!(
                "Early stop of {} at frame {} of {}",
                self.timeline.name(),
                index,
                self.frame_count
            );
            self.frame_count = index + 1;
        }
    }

    /// Overall bounds at the placement offset.
    pub fn bounds(&self) -> Rect {
        self.timeline.bounds().translate(self.offset)
    }

    /// Bounds of the frame shown at tick `at`, if any.
    pub fn frame_bounds(&self, at: i64) -> Option<Rect> {
        let bounds = self.frame(at)?.bounds()?;
        Some(bounds.to_rect(self.timeline.scale()).translate(self.offset))
    }

    /// Draw the frame shown at tick `at`. Returns whether anything was drawn.
    pub fn draw(&self, at: i64, surface: &mut impl Surface) -> bool {
        let Some(frame) = self.frame(at) else {
            return false;
        };
        let texture = self.raster.texture();
        let placement = DAffine2::from_translation(self.offset);
        for (i, polygon) in frame.polygons().iter().enumerate() {
            surface.fill_textured_quad(
                &polygon.quad,
                placement * polygon.transform,
                &texture,
                frame.composite(i),
            );
        }
        true
    }

    /// Iterate over the visible frames in playback order.
    pub fn frames(&self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            tick: self.delay,
        }
    }
}

/// Iterator over a player's visible frames, ignoring looping.
pub struct FrameIterator<'a> {
    player: &'a AnimationPlayer,
    tick: i64,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = (i64, &'a Arc<Frame>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.tick >= self.player.end_frame() {
            return None;
        }
        let tick = self.tick;
        self.tick += 1;
        self.player.frame(tick).map(|frame| (tick, frame))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.player.end_frame().saturating_sub(self.tick).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::PixelCanvas;
    use crate::format::testutil::{AnimationSpec, argb, encode_package, quad_animation};
    use crate::format::{BitDepth, Texture, TimelinePackage};

    fn raster(color: u32) -> Arc<RasterImage> {
        let texture = Texture::new(1, 1, vec![color]).unwrap();
        Arc::new(RasterImage::from_texture("pkg", BitDepth::Eight, texture))
    }

    fn timeline(version: i16, spec: AnimationSpec) -> Arc<Timeline> {
        let package = TimelinePackage::decode("pkg", &encode_package(version, &[spec])).unwrap();
        package.timelines()[0].clone()
    }

    /// Twenty playable frames where index 12 is the same frame as index 0.
    fn returning_timeline() -> Arc<Timeline> {
        let sequence: Vec<i16> = (0..20).map(|i| if i == 0 || i == 12 { 0 } else { 1 }).collect();
        let spec = quad_animation("Swing")
            .frame(vec![[0, 1, 2, 0, 2, 3]])
            .sequence(sequence);
        timeline(6, spec)
    }

    #[test]
    fn test_frame_delay_and_range() {
        let player = AnimationPlayer::new(returning_timeline(), raster(0)).with_delay(5);
        assert_eq!(player.frame_count(), 20);
        assert_eq!(player.end_frame(), 25);
        assert!(player.frame(4).is_none());
        assert!(Arc::ptr_eq(
            player.frame(5).unwrap(),
            &player.timeline().frames()[0]
        ));
        assert!(player.frame(24).is_some());
        assert!(player.frame(25).is_none());
    }

    #[test]
    fn test_looping_wraps_after_delay() {
        let mut player = AnimationPlayer::new(returning_timeline(), raster(0)).with_delay(5);
        player.set_loop(true);
        assert!(player.is_looping());
        assert!(player.frame(4).is_none());
        let frames = player.timeline().frames();
        assert!(Arc::ptr_eq(player.frame(25).unwrap(), &frames[0]));
        assert!(Arc::ptr_eq(player.frame(26).unwrap(), &frames[1]));
        assert!(Arc::ptr_eq(player.frame(5 + 20 * 3 + 12).unwrap(), &frames[12]));
    }

    #[test]
    fn test_early_stop_at_return_to_rest() {
        let mut player = AnimationPlayer::new(returning_timeline(), raster(0)).with_delay(5);
        player.early_stop(20);
        assert_eq!(player.frame_count(), 13);
        assert!(player.frame(17).is_some());
        assert!(player.frame(18).is_none());
        assert_eq!(player.end_frame(), 18);
    }

    #[test]
    fn test_early_stop_without_return_is_noop() {
        let mut player = AnimationPlayer::new(returning_timeline(), raster(0)).with_delay(5);
        // The search starts past index 12.
        player.early_stop(40);
        assert_eq!(player.frame_count(), 20);

        let mut single = AnimationPlayer::new(timeline(4, quad_animation("Idle")), raster(0));
        single.early_stop(0);
        assert_eq!(single.frame_count(), 1);
    }

    #[test]
    fn test_extreme_ticks() {
        let mut player = AnimationPlayer::new(returning_timeline(), raster(0)).with_delay(5);
        assert!(player.frame(i64::MIN).is_none());
        assert!(player.frame(i64::MAX).is_none());
        player.early_stop(i64::MAX);
        assert_eq!(player.frame_count(), 20);
        // Clamped to the first search tick.
        player.early_stop(i64::MIN);
        assert_eq!(player.frame_count(), 13);

        player.set_loop(true);
        assert!(player.frame(i64::MIN).is_none());
        assert!(player.frame(i64::MAX).is_some());

        let late = AnimationPlayer::new(returning_timeline(), raster(0)).with_delay(i64::MAX - 3);
        assert_eq!(late.end_frame(), i64::MAX);
        assert!(late.frame(i64::MAX).is_some());
        assert_eq!(late.frames().count(), 3);

        let mut early = AnimationPlayer::new(returning_timeline(), raster(0)).with_delay(i64::MIN);
        assert!(early.frame(0).is_none());
        early.early_stop(0);
        assert_eq!(early.frame_count(), 20);
    }

    #[test]
    fn test_bounds_are_scaled_and_offset() {
        let mut player = AnimationPlayer::new(timeline(4, quad_animation("Idle")), raster(0));
        player.set_offset(DVec2::new(10.0, -5.0));
        let bounds = player.bounds();
        assert_eq!(bounds.x, 10.0);
        assert_eq!(bounds.y, -5.0);
        assert_eq!(bounds.width, 33.0);
        assert_eq!(player.offset(), DVec2::new(10.0, -5.0));

        let frame = player.frame_bounds(0).unwrap();
        assert_eq!((frame.x, frame.y, frame.width, frame.height), (10.0, -5.0, 33.0, 33.0));
        assert!(player.frame_bounds(1).is_none());
        assert!(player.frame_bounds(-1).is_none());

        let v6 = AnimationPlayer::new(timeline(6, quad_animation("Idle")), raster(0));
        assert_eq!(v6.bounds().width, 33.0 / 32.0);
    }

    #[test]
    fn test_draw_fills_posed_quad() {
        let red = argb(255, 255, 0, 0);
        let mut player = AnimationPlayer::new(timeline(4, quad_animation("Idle")), raster(red));
        player.set_offset(DVec2::new(4.0, 4.0));

        let mut canvas = PixelCanvas::new(40, 40);
        assert!(player.draw(0, &mut canvas));
        assert_eq!(canvas.covered(), 32 * 32);
        assert_eq!(canvas.pixel(4, 4), Some(red));
        assert_eq!(canvas.pixel(35, 35), Some(red));
        assert_eq!(canvas.pixel(3, 3), Some(0));
        assert_eq!(canvas.pixel(36, 36), Some(0));

        canvas.clear();
        assert!(!player.draw(1, &mut canvas));
        assert_eq!(canvas.covered(), 0);
    }

    #[test]
    fn test_draw_uses_replacement_texture() {
        let image = raster(argb(255, 255, 0, 0));
        let player = AnimationPlayer::new(timeline(4, quad_animation("Idle")), image.clone());
        let blue = argb(255, 0, 0, 255);
        image.replace_texture(Texture::new(1, 1, vec![blue]).unwrap());

        let mut canvas = PixelCanvas::new(32, 32);
        player.draw(0, &mut canvas);
        assert_eq!(canvas.pixel(0, 0), Some(blue));
    }

    #[test]
    fn test_frame_iterator() {
        let mut player = AnimationPlayer::new(returning_timeline(), raster(0)).with_delay(2);
        player.early_stop(0);
        let ticks: Vec<i64> = player.frames().map(|(tick, _)| tick).collect();
        assert_eq!(ticks, (2..15).collect::<Vec<_>>());
        assert_eq!(player.frames().len(), 13);
    }
}
