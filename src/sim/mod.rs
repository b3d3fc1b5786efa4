pub mod diagnostics;
pub mod event;
pub mod ghost;
pub mod level;
pub mod population;
pub mod recording;
pub mod replay;
pub mod spawn;
pub mod step;
pub mod transform;
pub mod world;
