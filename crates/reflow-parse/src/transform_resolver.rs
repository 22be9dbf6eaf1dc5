//! Transform Resolver: finds the CTM in force when an XObject is painted.
//!
//! Content-stream operators are routed through a dispatch table to an
//! [`InstructionDispatcher`], one method per operator category. Each handler
//! returns [`ControlFlow`]; the driver stops at the first `Break`.

use std::collections::HashMap;
use std::ops::ControlFlow;

use lopdf::Object;
use lopdf::content::Operation;
use reflow_core::Transform;
use tracing::debug;

use crate::source::operand_f64;

/// Receives the graphics-state operators of a content stream.
pub trait InstructionDispatcher {
    /// Value produced when traversal stops early.
    type Output;

    /// `q`
    fn save(&mut self) -> ControlFlow<Self::Output>;
    /// `Q`
    fn restore(&mut self) -> ControlFlow<Self::Output>;
    /// `cm`
    fn transform(&mut self, matrix: Transform) -> ControlFlow<Self::Output>;
    /// `Do`
    fn paint(&mut self, name: &[u8]) -> ControlFlow<Self::Output>;
}

/// Operator handler: decodes operands and forwards to the dispatcher.
pub type Handler<D> =
    fn(&mut D, &[Object]) -> ControlFlow<<D as InstructionDispatcher>::Output>;

/// Operator name to handler for the four dispatcher categories.
pub fn dispatch_table<D: InstructionDispatcher>() -> HashMap<&'static str, Handler<D>> {
    let mut table: HashMap<&'static str, Handler<D>> = HashMap::with_capacity(4);
    table.insert("q", on_save::<D>);
    table.insert("Q", on_restore::<D>);
    table.insert("cm", on_concat::<D>);
    table.insert("Do", on_paint::<D>);
    table
}

fn on_save<D: InstructionDispatcher>(d: &mut D, _: &[Object]) -> ControlFlow<D::Output> {
    d.save()
}

fn on_restore<D: InstructionDispatcher>(d: &mut D, _: &[Object]) -> ControlFlow<D::Output> {
    d.restore()
}

fn on_concat<D: InstructionDispatcher>(d: &mut D, operands: &[Object]) -> ControlFlow<D::Output> {
    match matrix_operands(operands) {
        Some(m) => d.transform(m),
        None => {
            debug!(?operands, "skipping malformed cm operator");
            ControlFlow::Continue(())
        }
    }
}

fn on_paint<D: InstructionDispatcher>(d: &mut D, operands: &[Object]) -> ControlFlow<D::Output> {
    match operands.first().and_then(|o| o.as_name().ok()) {
        Some(name) => d.paint(name),
        None => ControlFlow::Continue(()),
    }
}

/// Six numeric operands as a [`Transform`].
pub(crate) fn matrix_operands(operands: &[Object]) -> Option<Transform> {
    if operands.len() < 6 {
        return None;
    }
    let mut v = [0.0; 6];
    for (i, slot) in v.iter_mut().enumerate() {
        *slot = operand_f64(operands, i)?;
    }
    Some(Transform::from_array(v))
}

/// Run `ops` through `dispatcher`, returning the first `Break` value.
pub fn traverse<D: InstructionDispatcher>(ops: &[Operation], dispatcher: &mut D) -> Option<D::Output> {
    let table = dispatch_table::<D>();
    for op in ops {
        let Some(handler) = table.get(op.operator.as_str()) else {
            continue;
        };
        if let ControlFlow::Break(out) = handler(dispatcher, &op.operands) {
            return Some(out);
        }
    }
    None
}

/// Tracks the CTM through `q`/`Q`/`cm` and stops when `target` is painted.
#[derive(Debug, Clone)]
pub struct TransformResolver {
    target: Vec<u8>,
    current: Transform,
    stack: Vec<Transform>,
}

impl TransformResolver {
    pub fn new(target: impl Into<Vec<u8>>) -> Self {
        Self {
            target: target.into(),
            current: Transform::identity(),
            stack: Vec::new(),
        }
    }

    /// The transform in force at the current point of traversal.
    pub fn current(&self) -> Transform {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Traverse `ops`; `None` when the target is never painted.
    pub fn resolve(mut self, ops: &[Operation]) -> Option<Transform> {
        traverse(ops, &mut self)
    }
}

impl InstructionDispatcher for TransformResolver {
    type Output = Transform;

    fn save(&mut self) -> ControlFlow<Transform> {
        self.stack.push(self.current);
        ControlFlow::Continue(())
    }

    fn restore(&mut self) -> ControlFlow<Transform> {
        match self.stack.pop() {
            Some(saved) => self.current = saved,
            None => debug!("Q with empty graphics stack ignored"),
        }
        ControlFlow::Continue(())
    }

    fn transform(&mut self, matrix: Transform) -> ControlFlow<Transform> {
        self.current = self.current.multiply(&matrix);
        ControlFlow::Continue(())
    }

    fn paint(&mut self, name: &[u8]) -> ControlFlow<Transform> {
        if name == self.target.as_slice() {
            ControlFlow::Break(self.current)
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Transform in force where XObject `target` is first painted, if it is.
pub fn find_transform(ops: &[Operation], target: &[u8]) -> Option<Transform> {
    TransformResolver::new(target).resolve(ops)
}

/// Like [`find_transform`], but identity when `target` is never painted.
pub fn resolve_transform(ops: &[Operation], target: &[u8]) -> Transform {
    find_transform(ops, target).unwrap_or_default()
}
