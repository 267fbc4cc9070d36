use std::sync::Arc;

use parking_lot::RwLock;

use crate::ast::Function;
use crate::context::EvalContext;
use crate::error::{CallError, CompileError};
use crate::eval;
use crate::optimize;
use crate::source::SourceMap;

/// Opaque reference to a registered function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

/// Compile state of one registered source. Starts `Pending`; the first call
/// moves it to `Ready` or `Failed` exactly once, and it never changes again.
enum Slot {
    Pending,
    Ready(Arc<Function>),
    Failed(CompileError),
}

struct Registration {
    source: SourceMap,
    slot: RwLock<Slot>,
}

impl Registration {
    /// Compile on first use, memoizing the outcome.
    ///
    /// The fast path takes the shared lock only long enough to clone the
    /// `Arc`. First-time entrants serialize through the exclusive lock and
    /// re-check the slot there, so the pipeline runs at most once no matter
    /// how many threads race the first call.
    fn compiled(&self) -> Result<Arc<Function>, CompileError> {
        {
            let slot = self.slot.read();
            match &*slot {
                Slot::Ready(function) => return Ok(Arc::clone(function)),
                Slot::Failed(error) => return Err(error.clone()),
                Slot::Pending => {}
            }
        }

        let mut slot = self.slot.write();
        // another thread may have finished while we waited for the lock
        match &*slot {
            Slot::Ready(function) => return Ok(Arc::clone(function)),
            Slot::Failed(error) => return Err(error.clone()),
            Slot::Pending => {}
        }

        match crate::compile(&self.source) {
            Ok(mut function) => {
                optimize::optimize(&mut function);
                let function = Arc::new(function);
                *slot = Slot::Ready(Arc::clone(&function));
                Ok(function)
            }
            Err(error) => {
                *slot = Slot::Failed(error.clone());
                Err(error)
            }
        }
    }
}

/// Owns any number of independently registered functions, each compiled at
/// most once and evaluated as often as callers like. Evaluation builds a
/// private context per call, so concurrent calls to the same function never
/// observe each other — including one call's divide-by-zero.
#[derive(Default)]
pub struct Jit {
    registrations: RwLock<Vec<Arc<Registration>>>,
}

impl Jit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function's source text. Nothing is compiled yet; the first
    /// call does that.
    pub fn register(&self, source: &str) -> Handle {
        let mut registrations = self.registrations.write();
        registrations.push(Arc::new(Registration {
            source: SourceMap::new(source),
            slot: RwLock::new(Slot::Pending),
        }));
        Handle(registrations.len() - 1)
    }

    /// Call a registered function with the given arguments.
    ///
    /// Compile failures are detected on the first call and repeated verbatim
    /// on every later one; runtime failures abort only this call and the
    /// function stays callable.
    pub fn call(&self, handle: Handle, args: &[i64]) -> Result<i64, CallError> {
        let registration = self
            .registrations
            .read()
            .get(handle.0)
            .cloned()
            .ok_or(CallError::UnknownHandle)?;

        let function = registration.compiled()?;

        let expected = function.symbols.parameter_count();
        if args.len() != expected {
            return Err(CallError::Arity {
                expected,
                got: args.len(),
            });
        }

        let mut ctx = EvalContext::for_call(&function.symbols, args);
        eval::evaluate(&function, &mut ctx).map_err(CallError::from)
    }

    /// Parameter count of a registered function, compiling it if needed.
    pub fn arity(&self, handle: Handle) -> Result<usize, CallError> {
        let registration = self
            .registrations
            .read()
            .get(handle.0)
            .cloned()
            .ok_or(CallError::UnknownHandle)?;
        let function = registration.compiled()?;
        Ok(function.symbols.parameter_count())
    }
}
