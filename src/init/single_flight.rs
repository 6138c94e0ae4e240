//! Single-flight execution
//!
//! Runs a piece of async work at most once and hands its output to every
//! caller: the ones that started it, the ones that arrived while it was
//! running, and the ones that arrive after it finished.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

enum Flight<T: Clone> {
    Idle,
    Running(Shared<BoxFuture<'static, T>>),
    Done(T),
}

/// Observable progress of a `SingleFlight`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightStatus<T> {
    Idle,
    Running,
    Done(T),
}

/// Executes one future per instance and shares its output
pub struct SingleFlight<T: Clone> {
    state: Mutex<Flight<T>>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Flight::Idle),
        }
    }

    /// Run `work` if nothing has run yet, otherwise join the existing run.
    ///
    /// `work` is called at most once over the life of the instance.
    pub async fn run<F, Fut>(&self, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = {
            let mut state = self.lock();
            let joined = match &*state {
                Flight::Done(value) => return value.clone(),
                Flight::Running(flight) => Some(flight.clone()),
                Flight::Idle => None,
            };
            match joined {
                Some(flight) => flight,
                None => {
                    let flight = work().boxed().shared();
                    *state = Flight::Running(flight.clone());
                    flight
                }
            }
        };

        let value = flight.await;

        let mut state = self.lock();
        if let Flight::Running(_) = *state {
            *state = Flight::Done(value.clone());
        }
        value
    }

    /// Current progress, without driving the work
    pub fn status(&self) -> FlightStatus<T> {
        match &*self.lock() {
            Flight::Idle => FlightStatus::Idle,
            Flight::Running(flight) => match flight.peek() {
                Some(value) => FlightStatus::Done(value.clone()),
                None => FlightStatus::Running,
            },
            Flight::Done(value) => FlightStatus::Done(value.clone()),
        }
    }

    /// The settled output, if any
    pub fn get(&self) -> Option<T> {
        match self.status() {
            FlightStatus::Done(value) => Some(value),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Flight<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
