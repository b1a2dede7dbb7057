pub mod analysis;
pub mod features;
pub mod playback;
pub mod spectrum;
pub mod stereo;
pub mod wave;
pub mod window;
