//! Ordered hook chains applied once per connection.
//!
//! # Responsibilities
//! - Context hooks: fold over the request context, each returning the next context
//! - Socket hooks: side effects on the connection's settings, given the final context
//!
//! # Design Decisions
//! - Hooks run strictly in registration order, exactly once per connection
//! - Hooks are infallible; a panicking hook is not caught here
//! - Closures with the matching signature are hooks

use std::sync::Arc;

use axum::http::request::Parts;

use crate::transport::context::RequestContext;
use crate::transport::socket::SocketSettings;

/// Derives the next request context from the previous one and the request head.
pub trait ContextHook: Send + Sync + 'static {
    fn derive(&self, ctx: RequestContext, request: &Parts) -> RequestContext;
}

impl<F> ContextHook for F
where
    F: Fn(RequestContext, &Parts) -> RequestContext + Send + Sync + 'static,
{
    fn derive(&self, ctx: RequestContext, request: &Parts) -> RequestContext {
        self(ctx, request)
    }
}

/// Configures one connection using the final request context.
pub trait SocketHook: Send + Sync + 'static {
    fn configure(&self, ctx: &RequestContext, socket: &mut SocketSettings);
}

impl<F> SocketHook for F
where
    F: Fn(&RequestContext, &mut SocketSettings) + Send + Sync + 'static,
{
    fn configure(&self, ctx: &RequestContext, socket: &mut SocketSettings) {
        self(ctx, socket)
    }
}

/// An ordered list of hooks.
pub struct HookChain<H: ?Sized> {
    hooks: Vec<Arc<H>>,
}

impl<H: ?Sized> HookChain<H> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn push(&mut self, hook: Arc<H>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<H: ?Sized> Default for HookChain<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> Clone for HookChain<H> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
        }
    }
}

impl HookChain<dyn ContextHook> {
    /// Fold every hook over `ctx`, in registration order.
    pub fn derive(&self, ctx: RequestContext, request: &Parts) -> RequestContext {
        self.hooks
            .iter()
            .fold(ctx, |ctx, hook| hook.derive(ctx, request))
    }
}

impl HookChain<dyn SocketHook> {
    /// Run every hook against `socket`, in registration order.
    pub fn apply(&self, ctx: &RequestContext, socket: &mut SocketSettings) {
        for hook in &self.hooks {
            hook.configure(ctx, socket);
        }
    }
}
