use std::sync::{Arc, Condvar, Mutex};

use submerge_base::{kind_err, ErrorKind, Result};
use submerge_net::RpcClient;
use tracing::{info, warn};

use crate::identity::Identity;

/// The outcome a parked caller replays once the in-flight leader finishes.
/// `Error` does not implement `Clone`, so followers get a fresh
/// `EnrollFailed` built from the leader's message rather than the original
/// error value.
type SharedOutcome = std::result::Result<String, String>;

struct Gate {
    in_flight: bool,
    last: Option<SharedOutcome>,
}

/// Enrollment mutual exclusion plus node-identity persistence
/// (SPEC_FULL.md §4.4 / §8 properties 5-7). At most one `enroll` RPC is ever
/// in flight at a time; concurrent callers park on the leader's result
/// instead of firing their own request.
pub struct Enroller {
    identity: Identity,
    client: Arc<RpcClient>,
    gate: Mutex<Gate>,
    cond: Condvar,
}

impl Enroller {
    pub fn new(identity: Identity, client: Arc<RpcClient>) -> Self {
        Enroller {
            identity,
            client,
            gate: Mutex::new(Gate {
                in_flight: false,
                last: None,
            }),
            cond: Condvar::new(),
        }
    }

    pub fn node_key(&self) -> Result<Option<String>> {
        self.identity.node_key()
    }

    /// Clears the persisted node identity. Called before re-enrolling after
    /// the server rejects the current one.
    pub fn invalidate(&self) -> Result<()> {
        self.identity.clear_node_key()
    }

    /// Enrolls the host, or joins an enrollment already in flight and
    /// returns its result. Persists the node key on success.
    pub fn enroll(&self, secret: &str) -> Result<String> {
        {
            let mut gate = self.gate.lock().unwrap();
            if gate.in_flight {
                gate = self
                    .cond
                    .wait_while(gate, |g| g.in_flight)
                    .expect("enroll gate poisoned");
                return replay(gate.last.clone());
            }
            gate.in_flight = true;
        }

        let outcome = self.run_enroll(secret);

        let mut gate = self.gate.lock().unwrap();
        gate.in_flight = false;
        gate.last = Some(outcome.clone());
        self.cond.notify_all();
        drop(gate);

        replay(Some(outcome))
    }

    fn run_enroll(&self, secret: &str) -> SharedOutcome {
        let host_id = match self.identity.host_identifier() {
            Ok(id) => id,
            Err(e) => return Err(e.to_string()),
        };

        match self.client.enroll(secret, &host_id) {
            Ok(result) if result.invalid => {
                warn!("enrollment rejected by server");
                Err("server rejected the provided host identity".to_string())
            }
            Ok(result) => {
                if let Err(e) = self.identity.set_node_key(&result.value) {
                    return Err(e.to_string());
                }
                info!("enrollment succeeded");
                Ok(result.value)
            }
            Err(e) => {
                warn!(error = %e, "enroll RPC failed");
                Err(e.to_string())
            }
        }
    }
}

fn replay(outcome: Option<SharedOutcome>) -> Result<String> {
    match outcome {
        Some(Ok(node_key)) => Ok(node_key),
        Some(Err(msg)) => Err(kind_err(ErrorKind::EnrollFailed, msg)),
        None => Err(kind_err(
            ErrorKind::EnrollFailed,
            "enrollment attempt produced no result",
        )),
    }
}
