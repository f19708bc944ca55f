mod glyphs;
mod sprite;
mod surface;

pub use sprite::{Sprite, SpriteError, SpriteImage};
pub use surface::{Rgba, Surface};
pub(crate) use surface::text_height;
