use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Completion callback handed to asset loaders.
pub type LoadDone = Box<dyn FnOnce()>;

/// Counts outstanding load callbacks and fires `done` once when the count hits zero.
///
/// A loader that never reports completion stalls the counter forever; nothing
/// here times out.
#[derive(Clone)]
pub(crate) struct LoadCounter {
    remaining: Rc<Cell<usize>>,
    done: Rc<RefCell<Option<LoadDone>>>,
}

impl LoadCounter {
    pub(crate) fn new(total: usize, done: LoadDone) -> Self {
        let counter = Self {
            remaining: Rc::new(Cell::new(total)),
            done: Rc::new(RefCell::new(Some(done))),
        };
        if total == 0 {
            counter.fire();
        }
        counter
    }

    pub(crate) fn complete_one(&self) {
        let remaining = self.remaining.get();
        if remaining == 0 {
            return;
        }
        self.remaining.set(remaining - 1);
        if remaining == 1 {
            self.fire();
        }
    }

    pub(crate) fn completion(&self) -> LoadDone {
        let counter = self.clone();
        Box::new(move || counter.complete_one())
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> usize {
        self.remaining.get()
    }

    fn fire(&self) {
        let done = self.done.borrow_mut().take();
        if let Some(done) = done {
            done();
        }
    }
}
