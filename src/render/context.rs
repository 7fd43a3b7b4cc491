//! Drawing context - tracks where geometry lands during rendering

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use glam::DVec2;

use crate::errors::RenderError;
use crate::types::Canvas;

/// One frame of drawing state
#[derive(Debug, Clone, PartialEq)]
pub struct DrawContext {
    pub canvas: Rc<Canvas>,
    /// Origin of this frame in device units
    pub origin: DVec2,
}

impl DrawContext {
    pub fn new(canvas: Rc<Canvas>, origin: DVec2) -> Self {
        Self { canvas, origin }
    }
}

/// Stack of drawing frames
///
/// Frames are only ever pushed through [`Scope`] guards, which pop them
/// again when dropped.
#[derive(Debug, Default)]
pub struct ContextStack {
    frames: Vec<DrawContext>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The innermost frame
    pub fn top(&self) -> Result<&DrawContext, RenderError> {
        self.frames.last().ok_or(RenderError::StackUnderflow)
    }

    /// Install a fresh frame at an absolute origin.
    pub fn push_absolute(&mut self, canvas: Rc<Canvas>, origin: DVec2) -> Scope<'_> {
        self.push(DrawContext::new(canvas, origin))
    }

    /// Install a frame offset from the current top.
    pub fn push_relative(&mut self, offset: DVec2) -> Result<Scope<'_>, RenderError> {
        let top = self.top()?;
        let ctx = DrawContext::new(Rc::clone(&top.canvas), top.origin + offset);
        Ok(self.push(ctx))
    }

    /// Remove the innermost frame.
    pub fn pop(&mut self) -> Result<DrawContext, RenderError> {
        let ctx = self.frames.pop().ok_or(RenderError::StackUnderflow)?;
        crate::log::trace!(depth = self.frames.len(), "pop context");
        Ok(ctx)
    }

    fn push(&mut self, ctx: DrawContext) -> Scope<'_> {
        let depth = self.frames.len();
        crate::log::trace!(
            depth = depth + 1,
            x = ctx.origin.x,
            y = ctx.origin.y,
            "push context"
        );
        self.frames.push(ctx);
        Scope { stack: self, depth }
    }
}

/// A pushed frame; dropping it restores the stack to its depth before the push
#[derive(Debug)]
pub struct Scope<'a> {
    stack: &'a mut ContextStack,
    depth: usize,
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        while self.stack.depth() > self.depth {
            // Depth is strictly greater, so the stack is not empty.
            let _ = self.stack.pop();
        }
    }
}

impl Deref for Scope<'_> {
    type Target = ContextStack;

    fn deref(&self) -> &ContextStack {
        self.stack
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut ContextStack {
        self.stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Rc<Canvas> {
        Rc::new(Canvas::try_new(1.0, 1.0, 100.0, 1.0).unwrap())
    }

    #[test]
    fn empty_stack_underflows() {
        let mut stack = ContextStack::new();
        assert!(matches!(stack.top(), Err(RenderError::StackUnderflow)));
        assert!(matches!(stack.pop(), Err(RenderError::StackUnderflow)));
        assert!(matches!(
            stack.push_relative(DVec2::ONE),
            Err(RenderError::StackUnderflow)
        ));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn scope_pops_on_drop() {
        let mut stack = ContextStack::new();
        {
            let scope = stack.push_absolute(canvas(), DVec2::ZERO);
            assert_eq!(scope.depth(), 1);
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn relative_frames_accumulate_offsets() {
        let mut stack = ContextStack::new();
        let mut root = stack.push_absolute(canvas(), DVec2::new(10.0, 20.0));
        {
            let mut inner = root.push_relative(DVec2::new(1.0, 2.0)).unwrap();
            let innermost = inner.push_relative(DVec2::new(0.5, 0.5)).unwrap();
            assert_eq!(innermost.depth(), 3);
            assert_eq!(innermost.top().unwrap().origin, DVec2::new(11.5, 22.5));
        }
        assert_eq!(root.depth(), 1);
        assert_eq!(root.top().unwrap().origin, DVec2::new(10.0, 20.0));
    }

    #[test]
    fn frames_share_the_canvas() {
        let mut stack = ContextStack::new();
        let canvas = canvas();
        let mut root = stack.push_absolute(Rc::clone(&canvas), DVec2::ZERO);
        let inner = root.push_relative(DVec2::ONE).unwrap();
        assert!(Rc::ptr_eq(&inner.top().unwrap().canvas, &canvas));
    }

    #[test]
    fn scope_restores_depth_on_early_return() {
        fn fails(stack: &mut ContextStack) -> Result<(), RenderError> {
            let mut scope = stack.push_relative(DVec2::ONE)?;
            let _nested = scope.push_relative(DVec2::ONE)?;
            Err(RenderError::MissingCanvas)
        }

        let mut stack = ContextStack::new();
        let mut root = stack.push_absolute(canvas(), DVec2::ZERO);
        assert!(fails(&mut root).is_err());
        assert_eq!(root.depth(), 1);
    }
}
