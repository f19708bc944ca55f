mod fps_counter;

pub use fps_counter::FpsCounter;
