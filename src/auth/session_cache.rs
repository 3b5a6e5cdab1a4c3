use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::E2eResult;
use crate::pages::context::PageContext;
use crate::trace::event::EventKind;

/// Proven authentication state for one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub cache_key: String,
    /// Opaque browser-held state (cookies, storage) as exported by the driver.
    pub authentication_proof: Value,
}

/// How `with_cached_session` satisfied the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Cached proof applied and the validation probe passed.
    Restored,
    /// No cached proof; a full login ran.
    LoggedIn,
    /// Cached proof failed validation; it was dropped and a full login ran.
    Refreshed,
}

#[derive(Default)]
struct CacheState {
    records: BTreeMap<String, SessionRecord>,
    store: Option<PathBuf>,
    full_logins: u32,
}

/// Login memoization shared by every scenario of a run.
///
/// This is the one piece of state that crosses scenario
/// boundaries. It is keyed by identity and every reuse is guarded by a
/// validation probe. Clones share the same cache. With a backing file the
/// records also survive across separate runs.
#[derive(Clone, Default)]
pub struct SessionCache {
    state: Arc<Mutex<CacheState>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache persisted to `path` as JSON. A missing file starts empty.
    pub fn persistent(path: &Path) -> E2eResult<Self> {
        let records = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            state: Arc::new(Mutex::new(CacheState {
                records,
                store: Some(path.to_path_buf()),
                full_logins: 0,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, identity: &str) -> Option<SessionRecord> {
        self.lock().records.get(identity).cloned()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.lock().records.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of full login sequences run through this cache.
    pub fn full_logins(&self) -> u32 {
        self.lock().full_logins
    }

    pub fn store(&self, identity: &str, proof: Value) -> E2eResult<()> {
        let mut state = self.lock();
        state.records.insert(
            identity.to_string(),
            SessionRecord {
                cache_key: identity.to_string(),
                authentication_proof: proof,
            },
        );
        Self::persist(&state)
    }

    pub fn invalidate(&self, identity: &str) -> E2eResult<bool> {
        let mut state = self.lock();
        let removed = state.records.remove(identity).is_some();
        if removed {
            Self::persist(&state)?;
        }
        Ok(removed)
    }

    fn persist(state: &CacheState) -> E2eResult<()> {
        if let Some(path) = &state.store {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, serde_json::to_string_pretty(&state.records)?)?;
        }
        Ok(())
    }

    /// Reuse the cached proof for `identity` if it still validates, otherwise
    /// log in and remember the new proof.
    ///
    /// A failing `perform_login` is returned as is and nothing is cached.
    pub fn with_cached_session<L, V>(
        &self,
        ctx: &mut PageContext,
        identity: &str,
        perform_login: L,
        validate: V,
    ) -> E2eResult<SessionOutcome>
    where
        L: FnOnce(&mut PageContext) -> E2eResult<()>,
        V: FnOnce(&mut PageContext) -> E2eResult<()>,
    {
        let cached = self.get(identity);
        let had_cache = cached.is_some();

        if let Some(record) = cached {
            ctx.driver().clear_auth_state()?;
            ctx.driver().import_auth_state(&record.authentication_proof)?;
            match validate(ctx) {
                Ok(()) => {
                    info!(identity, "restored cached session");
                    ctx.record(EventKind::Note, format!("session restored for {}", identity));
                    return Ok(SessionOutcome::Restored);
                }
                Err(e) => {
                    warn!(identity, "cached session failed validation: {}", e);
                    self.invalidate(identity)?;
                }
            }
        }

        ctx.driver().clear_auth_state()?;
        perform_login(ctx)?;
        let proof = ctx.driver().export_auth_state()?;
        {
            let mut state = self.lock();
            state.full_logins += 1;
        }
        self.store(identity, proof)?;
        ctx.record(EventKind::Note, format!("session cached for {}", identity));

        Ok(if had_cache {
            SessionOutcome::Refreshed
        } else {
            SessionOutcome::LoggedIn
        })
    }
}
