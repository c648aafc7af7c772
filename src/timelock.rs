use anyhow::Context;

use crate::{
    clock::Clock,
    persistence::Persistence,
    response::{
        AddResponse, BlockResponse, ContentResponse, InfoResponse, UnblockResponse,
        UpdateResponse,
    },
    store::{Store, StoreEntry},
    time_units::{PartialTimeUnits, TimeUnits},
};

/// Owns the registry and keeps it in step with its backend.
///
/// Every mutation is written through before the call returns. If the write
/// fails the mutation is undone, so the in-memory registry always matches the
/// last document that was successfully saved.
pub struct TimeLockStore {
    store: Store,
    backend: Box<dyn Persistence>,
    clock: Box<dyn Clock>,
}

impl TimeLockStore {
    pub fn open(backend: Box<dyn Persistence>, clock: Box<dyn Clock>) -> anyhow::Result<Self> {
        let store = load(backend.as_ref())?;
        tracing::info!("loaded {} entries", store.data.len());
        Ok(TimeLockStore {
            store,
            backend,
            clock,
        })
    }

    /// Re-reads the backend, discarding the in-memory registry.
    pub fn reload(&mut self) -> anyhow::Result<()> {
        self.store = load(self.backend.as_ref())?;
        Ok(())
    }

    pub fn add(
        &mut self,
        key: &str,
        content: &str,
        time_to_wait: PartialTimeUnits,
    ) -> anyhow::Result<AddResponse> {
        if self.store.data.contains_key(key) {
            return Ok(AddResponse::AlreadyExists);
        }

        let entry = StoreEntry {
            content: content.to_string(),
            time_to_wait: time_to_wait.normalize(),
            release_date: None,
        };
        self.store.data.insert(key.to_string(), entry);
        self.persist(key, None)?;
        tracing::debug!("added {:?}", key);
        Ok(AddResponse::Added)
    }

    /// Overwrites the whole entry. An omitted `release_date` clears it.
    pub fn update(
        &mut self,
        key: &str,
        content: &str,
        time_to_wait: PartialTimeUnits,
        release_date: Option<u64>,
    ) -> anyhow::Result<UpdateResponse> {
        let Some(entry) = self.store.data.get_mut(key) else {
            return Ok(UpdateResponse::NotFound);
        };

        let previous = std::mem::replace(
            entry,
            StoreEntry {
                content: content.to_string(),
                time_to_wait: time_to_wait.normalize(),
                release_date,
            },
        );
        self.persist(key, Some(previous))?;
        tracing::debug!("updated {:?}", key);
        Ok(UpdateResponse::Updated)
    }

    /// Schedules release at now + the entry's wait. Asking again restarts the
    /// wait from the current time.
    pub fn request_unblock(&mut self, key: &str) -> anyhow::Result<UnblockResponse> {
        let now = self.clock.now_ms();
        let Some(entry) = self.store.data.get_mut(key) else {
            return Ok(UnblockResponse::NotFound);
        };

        let wait = entry.time_to_wait.to_millis();
        let release_date = now.saturating_add(wait);
        let previous = entry.clone();
        entry.release_date = Some(release_date);
        self.persist(key, Some(previous))?;

        let TimeUnits {
            days,
            hours,
            minutes,
            seconds,
        } = TimeUnits::from_millis(wait);
        tracing::debug!(
            "{:?} releases at {} ({}d {}h {}m {}s from now)",
            key,
            release_date,
            days,
            hours,
            minutes,
            seconds
        );
        Ok(UnblockResponse::Scheduled(release_date))
    }

    pub fn block(&mut self, key: &str) -> anyhow::Result<BlockResponse> {
        let Some(entry) = self.store.data.get_mut(key) else {
            return Ok(BlockResponse::NotFound);
        };

        let previous = entry.clone();
        entry.release_date = None;
        self.persist(key, Some(previous))?;
        tracing::debug!("blocked {:?}", key);
        Ok(BlockResponse::Blocked)
    }

    /// Gated read. Reading a released entry doesn't consume the release.
    pub fn get_content(&self, key: &str) -> ContentResponse<'_> {
        let Some(entry) = self.store.data.get(key) else {
            return ContentResponse::NotFound;
        };

        match entry.release_date {
            None => ContentResponse::NoUnblockRequested,
            Some(release_date) if self.clock.now_ms() > release_date => {
                ContentResponse::Released(&entry.content)
            }
            Some(release_date) => ContentResponse::NotYetAvailable(release_date),
        }
    }

    /// Returns the whole entry to a caller who already knows its content,
    /// bypassing the release gate.
    pub fn info(&self, key: &str, expected_content: &str) -> InfoResponse<'_> {
        match self.store.data.get(key) {
            Some(entry) if entry.content == expected_content => InfoResponse::Found(entry),
            Some(_) => InfoResponse::ContentMismatch,
            None => InfoResponse::NotFound,
        }
    }

    /// Saves the registry, restoring `previous` under `key` if the write fails.
    fn persist(&mut self, key: &str, previous: Option<StoreEntry>) -> anyhow::Result<()> {
        let result = self
            .store
            .serialize()
            .and_then(|document| Ok(self.backend.save(document)?));

        if let Err(e) = result {
            match previous {
                Some(entry) => self.store.data.insert(key.to_string(), entry),
                None => self.store.data.remove(key),
            };
            return Err(e.context(format!("failed to persist change to {key:?}")));
        }
        Ok(())
    }
}

fn load(backend: &dyn Persistence) -> anyhow::Result<Store> {
    let document = backend.load()?;
    Store::deserialize(&document).context("stored registry is malformed")
}
