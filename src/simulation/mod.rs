mod channel;
mod grid;
mod raster;
mod step;
mod worker;

pub use channel::{
    command_channel, frame_channel, Command, CommandReceiver, CommandSender, FrameReceiver,
    FrameSender,
};
pub use grid::GridBuffer;
pub use raster::{luma, rasterize, Frame, Pixel};
pub use step::step;
pub use worker::{LifecycleState, Worker, WorkerHandle};
