use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Entity, EntityId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadError {
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rollback<T> {
    /// Puts `previous` back only while the slot still holds `patched`.
    Restore { previous: T, patched: T },
    Reinsert { index: usize, item: T },
}

#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<LoadError>,
    loaded_at: Option<DateTime<Utc>>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            loaded_at: None,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    fn position(&self, id: &EntityId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Returns false when a reload is already in flight; the caller must not issue another request.
    pub fn begin_reload(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    /// Clears the flag of a reload that was abandoned before it produced a result.
    pub fn cancel_reload(&mut self) {
        self.loading = false;
    }

    pub fn finish_reload(&mut self, result: Result<Vec<T>, LoadError>) {
        self.loading = false;
        match result {
            Ok(items) => {
                self.replace_all(items);
                self.error = None;
                self.loaded_at = Some(Utc::now());
            }
            Err(error) => {
                self.error = Some(error);
            }
        }
    }

    /// Full-list replacement. Duplicate ids keep their first occurrence.
    pub fn replace_all(&mut self, items: Vec<T>) {
        let mut seen: HashSet<EntityId> = HashSet::with_capacity(items.len());
        let mut unique = Vec::with_capacity(items.len());
        for item in items {
            if seen.insert(item.id().clone()) {
                unique.push(item);
            } else {
                log::warn!("Duplicate {} id {} in snapshot ignored", T::NAME, item.id());
            }
        }
        self.items = unique;
    }

    pub fn insert_front(&mut self, item: T) {
        if let Some(index) = self.position(item.id()) {
            self.items.remove(index);
        }
        self.items.insert(0, item);
    }

    pub fn replace(&mut self, item: T) -> bool {
        match self.get_mut(item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Optimistic in-place replacement; the returned token undoes it.
    pub fn apply_patch(&mut self, item: T) -> Option<Rollback<T>> {
        let slot = self.get_mut(item.id())?;
        let previous = std::mem::replace(slot, item.clone());
        Some(Rollback::Restore {
            previous,
            patched: item,
        })
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Rollback<T>> {
        let index = self.position(id)?;
        let item = self.items.remove(index);
        Some(Rollback::Reinsert { index, item })
    }

    pub fn rollback(&mut self, rollback: Rollback<T>) {
        match rollback {
            Rollback::Restore { previous, patched } => match self.get_mut(patched.id()) {
                Some(slot) if *slot == patched => *slot = previous,
                Some(_) => log::info!("{} {} was reloaded meanwhile, rollback skipped", T::NAME, patched.id()),
                None => log::warn!("Rollback target {} is no longer in the store", T::NAME),
            },
            Rollback::Reinsert { index, item } => {
                if self.position(item.id()).is_some() {
                    return;
                }
                let index = index.min(self.items.len());
                self.items.insert(index, item);
            }
        }
    }
}
