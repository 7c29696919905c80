use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::trace;

use super::error::DispatchError;
use super::token::DispatchToken;

type Handler<P> = Rc<RefCell<dyn FnMut(&Dispatcher<P>, &P) -> Result<(), DispatchError>>>;

struct HandlerSlot<P> {
    token: DispatchToken,
    handler: Handler<P>,
    pending: bool,
    handled: bool,
}

/// Broadcasts payloads to every registered handler, one dispatch at a time.
///
/// All methods take `&self` so handlers can call back into the dispatcher
/// (`wait_for`, `register`, `is_dispatching`) while a dispatch is running.
pub struct Dispatcher<P> {
    slots: RefCell<Vec<HandlerSlot<P>>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
    payload: RefCell<Option<Rc<P>>>,
}

impl<P: 'static> Dispatcher<P> {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            dispatching: Cell::new(false),
            payload: RefCell::new(None),
        }
    }

    /// Register a handler invoked with every dispatched payload.
    ///
    /// Registering during a dispatch is allowed; the new handler only sees
    /// later dispatches unless someone explicitly waits for it.
    pub fn register<F>(&self, handler: F) -> DispatchToken
    where
        F: FnMut(&Dispatcher<P>, &P) -> Result<(), DispatchError> + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let token = DispatchToken::new(id);

        self.slots.borrow_mut().push(HandlerSlot {
            token,
            handler: Rc::new(RefCell::new(handler)),
            pending: false,
            handled: false,
        });
        trace!("dispatcher: registered {token}");
        token
    }

    /// Remove the handler behind `token`.
    pub fn unregister(&self, token: DispatchToken) -> Result<(), DispatchError> {
        let mut slots = self.slots.borrow_mut();
        let pos = slots
            .iter()
            .position(|s| s.token == token)
            .ok_or(DispatchError::UnknownToken(token))?;
        slots.remove(pos);
        trace!("dispatcher: unregistered {token}");
        Ok(())
    }

    /// Run the handlers behind `tokens` before the calling handler continues.
    ///
    /// Only valid from inside a handler during a dispatch.
    pub fn wait_for(&self, tokens: &[DispatchToken]) -> Result<(), DispatchError> {
        if !self.dispatching.get() {
            return Err(DispatchError::NotDispatching);
        }

        for &token in tokens {
            let (pending, handled) = self
                .flags(token)
                .ok_or(DispatchError::UnknownToken(token))?;
            if pending {
                if !handled {
                    return Err(DispatchError::CircularWait(token));
                }
                continue;
            }
            self.invoke(token)?;
        }
        Ok(())
    }

    /// Deliver `payload` to every registered handler in registration order.
    ///
    /// The first handler error aborts the broadcast and is returned; handlers
    /// after it do not see this payload.
    pub fn dispatch(&self, payload: P) -> Result<(), DispatchError> {
        if self.dispatching.get() {
            return Err(DispatchError::ReentrantDispatch);
        }

        let _guard = self.start_dispatching(payload);

        let tokens: Vec<DispatchToken> = self.slots.borrow().iter().map(|s| s.token).collect();
        for token in tokens {
            match self.flags(token) {
                // Unregistered by an earlier handler.
                None => continue,
                Some((true, _)) => continue,
                Some((false, _)) => self.invoke(token)?,
            }
        }
        Ok(())
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    fn flags(&self, token: DispatchToken) -> Option<(bool, bool)> {
        self.slots
            .borrow()
            .iter()
            .find(|s| s.token == token)
            .map(|s| (s.pending, s.handled))
    }

    fn invoke(&self, token: DispatchToken) -> Result<(), DispatchError> {
        // Never hold the slot table across the call: the handler may register,
        // unregister or wait for others.
        let handler = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .iter_mut()
                .find(|s| s.token == token)
                .ok_or(DispatchError::UnknownToken(token))?;
            slot.pending = true;
            Rc::clone(&slot.handler)
        };
        let payload = self
            .payload
            .borrow()
            .clone()
            .ok_or(DispatchError::NotDispatching)?;

        {
            let mut callback = handler.borrow_mut();
            (*callback)(self, &*payload)?;
        }

        if let Some(slot) = self.slots.borrow_mut().iter_mut().find(|s| s.token == token) {
            slot.handled = true;
        }
        Ok(())
    }

    fn start_dispatching(&self, payload: P) -> DispatchGuard<'_, P> {
        for slot in self.slots.borrow_mut().iter_mut() {
            slot.pending = false;
            slot.handled = false;
        }
        *self.payload.borrow_mut() = Some(Rc::new(payload));
        self.dispatching.set(true);
        DispatchGuard { dispatcher: self }
    }

    fn stop_dispatching(&self) {
        *self.payload.borrow_mut() = None;
        self.dispatching.set(false);
    }
}

impl<P: 'static> Default for Dispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the dispatch bookkeeping however the broadcast ends, including a
/// handler error or panic.
struct DispatchGuard<'a, P: 'static> {
    dispatcher: &'a Dispatcher<P>,
}

impl<P: 'static> Drop for DispatchGuard<'_, P> {
    fn drop(&mut self) {
        self.dispatcher.stop_dispatching();
    }
}
