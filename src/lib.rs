pub mod code_rain;
pub mod content;
pub mod nav;
pub mod reveal;
pub mod schedule;
pub mod tilt;
pub mod typewriter;
