//! Terminal front end: a framebuffer, a pure view, and a diffing flusher

pub mod fb;
pub mod renderer;
pub mod view;

pub use fb::{Cell, FrameBuffer, Rgb, Style};
pub use renderer::TerminalRenderer;
pub use view::{GameView, Viewport};
