//! # Cart State
//!
//! Holds the session's in-progress [`Order`].
//!
//! ## Thread Safety
//! The order is wrapped in `Arc<Mutex<T>>` because:
//! 1. Several cart commands may run concurrently
//! 2. Only one of them may mutate the order at a time
//! 3. The lock is never held across an `.await` (stock checks run unlocked)
//!
//! ## Check-Then-Apply
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  with_order(snapshot)  ──►  validate (await, unlocked)                  │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  with_order_mut(|order| {        ── payment in flight ──► refused       │
//! │      same order id?  line still there?   ── no ──► STALE_RESULT         │
//! │      apply mutation                                                     │
//! │  })                                                                     │
//! │                                                                         │
//! │  lock_for_payment(id, revision) ──► PaymentLock                         │
//! │      every mutation refused until complete() or drop                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use kitguard_core::{Order, OrderId};

/// A mutation attempted while the order is being paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Payment in progress")]
pub struct PaymentInProgress;

#[derive(Debug, Default)]
struct CartSlot {
    order: Order,
    paying: bool,
}

/// Session-owned order state.
#[derive(Debug, Clone)]
pub struct CartState {
    slot: Arc<Mutex<CartSlot>>,
}

impl CartState {
    /// Creates a state holding a fresh empty order.
    pub fn new() -> Self {
        CartState {
            slot: Arc::new(Mutex::new(CartSlot::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the order.
    pub fn with_order<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Order) -> R,
    {
        f(&self.lock().order)
    }

    /// Executes a function with write access to the order.
    ///
    /// Refused while a [`PaymentLock`] is held.
    pub fn with_order_mut<F, R>(&self, f: F) -> Result<R, PaymentInProgress>
    where
        F: FnOnce(&mut Order) -> R,
    {
        let mut slot = self.lock();
        if slot.paying {
            return Err(PaymentInProgress);
        }
        Ok(f(&mut slot.order))
    }

    /// A copy of the current order.
    pub fn snapshot(&self) -> Order {
        self.with_order(Order::clone)
    }

    /// Starts a new order (new id) and returns the one it replaced.
    pub fn reset(&self) -> Result<Order, PaymentInProgress> {
        self.with_order_mut(std::mem::take)
    }

    pub fn is_paying(&self) -> bool {
        self.lock().paying
    }

    /// Freezes the order for payment.
    ///
    /// `None` when the order is no longer the given id and revision, or
    /// another payment already holds the lock.
    pub fn lock_for_payment(&self, order_id: &OrderId, revision: u64) -> Option<PaymentLock<'_>> {
        let mut slot = self.lock();
        if slot.paying || &slot.order.id != order_id || slot.order.revision != revision {
            return None;
        }
        slot.paying = true;
        let order = slot.order.clone();
        Some(PaymentLock {
            cart: self,
            order,
            released: false,
        })
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the order frozen until the payment completes or is abandoned.
#[derive(Debug)]
pub struct PaymentLock<'a> {
    cart: &'a CartState,
    order: Order,
    released: bool,
}

impl PaymentLock<'_> {
    /// The frozen order.
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Starts a new order and returns the paid one.
    pub fn complete(mut self) -> Order {
        let mut slot = self.cart.lock();
        slot.order = Order::new();
        slot.paying = false;
        drop(slot);
        self.released = true;
        std::mem::take(&mut self.order)
    }
}

impl Drop for PaymentLock<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.cart.lock().paying = false;
        }
    }
}
