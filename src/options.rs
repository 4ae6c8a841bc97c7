use instant::Duration;
use std::sync::mpsc::Receiver;

/// Knobs for a single fill attempt. The defaults reproduce the plain algorithm: no forward
/// checking, no deadline and no way to abort.
#[derive(Debug, Default, Clone, Copy)]
pub struct FillOptions<'a> {
    /// Prune each branch's private copy of the neighbors' domains after every assignment.
    pub forward_checking: bool,

    /// Give up with `FillFailure::Timeout` once the search has run this long.
    pub timeout: Option<Duration>,

    /// Give up with `FillFailure::Abort` as soon as a message arrives on this channel.
    pub abort_rx: Option<&'a Receiver<()>>,
}

impl<'a> FillOptions<'a> {
    pub fn with_forward_checking(mut self, forward_checking: bool) -> Self {
        self.forward_checking = forward_checking;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_abort_rx(mut self, abort_rx: &'a Receiver<()>) -> Self {
        self.abort_rx = Some(abort_rx);
        self
    }
}
