//! Playback of decoded timelines.
//!
//! A player binds one shared [`Timeline`](crate::format::Timeline) to the
//! raster named after its package and answers, per tick, which frame is
//! visible, where it sits and how to draw it onto a [`Surface`].

mod canvas;
mod player;

pub use canvas::{PixelCanvas, Surface};
pub use player::{AnimationPlayer, FrameIterator};
