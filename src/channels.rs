use crate::prelude::*;

/// Inter-component communication channels. The coordinator's write path
/// uses `to_scheduler` to request an out-of-band refresh; the composition
/// root uses it to stop the poll loop.
#[derive(Debug, Clone)]
pub struct Channels {
    pub to_scheduler: broadcast::Sender<crate::scheduler::ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            to_scheduler: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(64).0
    }
}
