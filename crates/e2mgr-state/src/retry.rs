//! Retrying decorator for remote gateway backends.
//!
//! A store reached over the network can drop connections transiently.
//! `RetryingGateway` repeats an operation while it fails with
//! [`StateError::Connection`], up to a fixed number of attempts. Every
//! other error, `NotFound` included, is returned on the first attempt.

use std::time::Duration;

use tracing::{error, info};

use e2mgr_core::{InstanceRecord, NbIdentity, RanRecord};

use crate::error::StateResult;
use crate::gateway::StateGateway;

pub struct RetryingGateway<G> {
    inner: G,
    max_attempts: u32,
    retry_interval: Duration,
}

impl<G: StateGateway> RetryingGateway<G> {
    /// `max_attempts` is clamped to at least one.
    pub fn new(inner: G, max_attempts: u32, retry_interval: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            retry_interval,
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn retry<T>(&self, op: &str, mut f: impl FnMut(&G) -> StateResult<T>) -> StateResult<T> {
        let mut attempt = 1;
        loop {
            match f(&self.inner) {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_connection_error() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    error!(op, attempts = attempt, error = %e, "giving up on store call");
                    return Err(e);
                }
                Err(e) => {
                    std::thread::sleep(self.retry_interval);
                    info!(op, attempt, error = %e, "retrying store call");
                    attempt += 1;
                }
            }
        }
    }
}

impl<G: StateGateway> StateGateway for RetryingGateway<G> {
    fn get_ran(&self, ran_name: &str) -> StateResult<RanRecord> {
        self.retry("get_ran", |g| g.get_ran(ran_name))
    }

    fn save_ran(&self, identity: &NbIdentity, ran: &RanRecord) -> StateResult<()> {
        self.retry("save_ran", |g| g.save_ran(identity, ran))
    }

    fn update_ran(&self, ran: &RanRecord) -> StateResult<()> {
        self.retry("update_ran", |g| g.update_ran(ran))
    }

    fn get_instance(&self, address: &str) -> StateResult<InstanceRecord> {
        self.retry("get_instance", |g| g.get_instance(address))
    }

    fn get_instances(&self, addresses: &[String]) -> StateResult<Vec<InstanceRecord>> {
        self.retry("get_instances", |g| g.get_instances(addresses))
    }

    fn save_instance(&self, instance: &InstanceRecord) -> StateResult<()> {
        self.retry("save_instance", |g| g.save_instance(instance))
    }

    fn remove_instance(&self, address: &str) -> StateResult<()> {
        self.retry("remove_instance", |g| g.remove_instance(address))
    }

    fn get_instance_addresses(&self) -> StateResult<Vec<String>> {
        self.retry("get_instance_addresses", |g| g.get_instance_addresses())
    }

    fn save_instance_addresses(&self, addresses: &[String]) -> StateResult<()> {
        self.retry("save_instance_addresses", |g| {
            g.save_instance_addresses(addresses)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;
    use crate::store::StateStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `get_instance` with the given error a fixed number of times.
    struct Flaky {
        store: StateStore,
        failures_left: AtomicU32,
        calls: AtomicU32,
        not_found: bool,
    }

    impl Flaky {
        fn new(failures: u32, not_found: bool) -> Self {
            Self {
                store: StateStore::open_in_memory().unwrap(),
                failures_left: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
                not_found,
            }
        }
    }

    impl StateGateway for Flaky {
        fn get_ran(&self, ran_name: &str) -> StateResult<RanRecord> {
            self.store.get_ran(ran_name)
        }
        fn save_ran(&self, identity: &NbIdentity, ran: &RanRecord) -> StateResult<()> {
            self.store.save_ran(identity, ran)
        }
        fn update_ran(&self, ran: &RanRecord) -> StateResult<()> {
            self.store.update_ran(ran)
        }
        fn get_instance(&self, address: &str) -> StateResult<InstanceRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.not_found {
                return Err(StateError::NotFound(address.to_string()));
            }
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(StateError::Connection("connection refused".to_string()));
            }
            self.store.get_instance(address)
        }
        fn get_instances(&self, addresses: &[String]) -> StateResult<Vec<InstanceRecord>> {
            self.store.get_instances(addresses)
        }
        fn save_instance(&self, instance: &InstanceRecord) -> StateResult<()> {
            self.store.save_instance(instance)
        }
        fn remove_instance(&self, address: &str) -> StateResult<()> {
            self.store.remove_instance(address)
        }
        fn get_instance_addresses(&self) -> StateResult<Vec<String>> {
            self.store.get_instance_addresses()
        }
        fn save_instance_addresses(&self, addresses: &[String]) -> StateResult<()> {
            self.store.save_instance_addresses(addresses)
        }
    }

    #[test]
    fn recovers_after_transient_connection_errors() {
        let flaky = Flaky::new(2, false);
        flaky
            .store
            .save_instance(&InstanceRecord::new("a:1", "pod-a"))
            .unwrap();
        let gw = RetryingGateway::new(flaky, 3, Duration::from_millis(1));

        let inst = gw.get_instance("a:1").unwrap();
        assert_eq!(inst.pod_name, "pod-a");
        assert_eq!(gw.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let gw = RetryingGateway::new(Flaky::new(10, false), 3, Duration::from_millis(1));

        let err = gw.get_instance("a:1").unwrap_err();
        assert!(err.is_connection_error());
        assert_eq!(gw.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn not_found_is_not_retried() {
        let gw = RetryingGateway::new(Flaky::new(0, true), 5, Duration::from_millis(1));

        let err = gw.get_instance("a:1").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(gw.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let gw = RetryingGateway::new(Flaky::new(1, false), 0, Duration::from_millis(1));
        assert!(gw.get_instance("a:1").unwrap_err().is_connection_error());
        assert_eq!(gw.inner().calls.load(Ordering::SeqCst), 1);
    }
}
