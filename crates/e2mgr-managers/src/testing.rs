//! Test doubles shared by the manager unit tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use e2mgr_core::{InstanceRecord, Message, MessageSender, MessagingError, NbIdentity, RanRecord};
use e2mgr_routing::{RoutingClient, RoutingError, RoutingFuture};
use e2mgr_state::{StateError, StateGateway, StateResult, StateStore};

/// In-memory store that can be told to fail chosen operations.
pub struct FaultyGateway {
    pub store: StateStore,
    failing: Mutex<HashSet<&'static str>>,
}

impl FaultyGateway {
    pub fn new() -> Self {
        Self {
            store: StateStore::open_in_memory().unwrap(),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every later call to `op` fail with a write error.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    fn check(&self, op: &'static str) -> StateResult<()> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(StateError::Write(format!("injected {op} failure")));
        }
        Ok(())
    }
}

impl StateGateway for FaultyGateway {
    fn get_ran(&self, ran_name: &str) -> StateResult<RanRecord> {
        self.check("get_ran")?;
        self.store.get_ran(ran_name)
    }
    fn save_ran(&self, identity: &NbIdentity, ran: &RanRecord) -> StateResult<()> {
        self.check("save_ran")?;
        self.store.save_ran(identity, ran)
    }
    fn update_ran(&self, ran: &RanRecord) -> StateResult<()> {
        self.check("update_ran")?;
        self.store.update_ran(ran)
    }
    fn get_instance(&self, address: &str) -> StateResult<InstanceRecord> {
        self.check("get_instance")?;
        self.store.get_instance(address)
    }
    fn get_instances(&self, addresses: &[String]) -> StateResult<Vec<InstanceRecord>> {
        self.check("get_instances")?;
        self.store.get_instances(addresses)
    }
    fn save_instance(&self, instance: &InstanceRecord) -> StateResult<()> {
        self.check("save_instance")?;
        self.store.save_instance(instance)
    }
    fn remove_instance(&self, address: &str) -> StateResult<()> {
        self.check("remove_instance")?;
        self.store.remove_instance(address)
    }
    fn get_instance_addresses(&self) -> StateResult<Vec<String>> {
        self.check("get_instance_addresses")?;
        self.store.get_instance_addresses()
    }
    fn save_instance_addresses(&self, addresses: &[String]) -> StateResult<()> {
        self.check("save_instance_addresses")?;
        self.store.save_instance_addresses(addresses)
    }
}

/// A call observed by [`RecordingRoutingClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingCall {
    AddInstance(String),
    Associate(String, String),
    Dissociate(String, String),
    DeleteInstance(String, Vec<String>),
}

/// Routing client that records calls and optionally rejects them all.
#[derive(Default)]
pub struct RecordingRoutingClient {
    calls: Mutex<Vec<RoutingCall>>,
    failing: AtomicBool,
}

impl RecordingRoutingClient {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RoutingCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RoutingCall) -> Result<(), RoutingError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RoutingError::Status(500));
        }
        Ok(())
    }
}

impl RoutingClient for RecordingRoutingClient {
    fn add_instance<'a>(&'a self, address: &'a str) -> RoutingFuture<'a> {
        let result = self.record(RoutingCall::AddInstance(address.to_string()));
        Box::pin(async move { result })
    }

    fn associate<'a>(&'a self, address: &'a str, ran_name: &'a str) -> RoutingFuture<'a> {
        let result = self.record(RoutingCall::Associate(
            address.to_string(),
            ran_name.to_string(),
        ));
        Box::pin(async move { result })
    }

    fn dissociate<'a>(&'a self, address: &'a str, ran_name: &'a str) -> RoutingFuture<'a> {
        let result = self.record(RoutingCall::Dissociate(
            address.to_string(),
            ran_name.to_string(),
        ));
        Box::pin(async move { result })
    }

    fn delete_instance<'a>(
        &'a self,
        address: &'a str,
        ran_names: &'a [String],
    ) -> RoutingFuture<'a> {
        let result = self.record(RoutingCall::DeleteInstance(
            address.to_string(),
            ran_names.to_vec(),
        ));
        Box::pin(async move { result })
    }
}

/// Message sender that keeps everything it was handed.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Message>>,
    quiet: Mutex<Vec<Message>>,
    failing: AtomicBool,
}

impl RecordingSender {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    pub fn quiet(&self) -> Vec<Message> {
        self.quiet.lock().unwrap().clone()
    }
}

impl MessageSender for RecordingSender {
    fn send(&self, message: Message) -> Result<(), MessagingError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessagingError::Send("injected send failure".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn send_without_logs(&self, message: Message) {
        self.quiet.lock().unwrap().push(message);
    }
}
