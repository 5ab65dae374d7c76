//! Application endpoint contract.

use crate::transport::context::RequestContext;
use crate::transport::error::BoxError;
use crate::transport::queue::AppQueues;

/// Wires one connection's queues to application logic.
///
/// Called once per connection, after the hook chains ran and before any pump
/// starts. Implementations typically spawn a task that drains
/// `queues.requests` and feeds `queues.responses`. Returning an error aborts
/// the connection: no pump is started.
pub trait Endpoint<Req, Resp>: Send + Sync + 'static {
    fn open(&self, ctx: &RequestContext, queues: AppQueues<Req, Resp>) -> Result<(), BoxError>;
}

impl<Req, Resp, F> Endpoint<Req, Resp> for F
where
    F: Fn(&RequestContext, AppQueues<Req, Resp>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn open(&self, ctx: &RequestContext, queues: AppQueues<Req, Resp>) -> Result<(), BoxError> {
        self(ctx, queues)
    }
}
