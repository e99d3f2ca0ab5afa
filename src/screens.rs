use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Credentials;
use crate::engine::{
    filter_sort, AttendanceBoard, AttendanceFilter, AttendanceSummary, BranchFilter, BranchSelector, BucketView,
    Criteria, Filterable, SearchQuery, StatusFilter, Summarize, UNASSIGNED_TOKEN,
};
use crate::error::{ApiError, GatewayError};
use crate::models::{
    Appointment, Branch, BranchDirectory, Category, Client, Employee, Entity, EntityId, HasStatus,
    StatusValue, RESOURCE_BRANCHES,
};
use crate::state::{
    AppState, StoreEvent, ATTENDANCE, EVENT_CREATED, EVENT_DELETED, EVENT_RELOADED, EVENT_ROLLED_BACK,
    EVENT_STATUS_CHANGED, EVENT_TOGGLED, EVENT_UPDATED,
};
use crate::store::{EntityStore, LoadError};
use crate::validation::Validate;

pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mounted screens of one kind, keyed by the id handed out on mount.
pub struct ScreenRegistry<S> {
    screens: Arc<Mutex<HashMap<Uuid, Arc<Mutex<S>>>>>,
}

impl<S> Clone for ScreenRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            screens: Arc::clone(&self.screens),
        }
    }
}

impl<S> Default for ScreenRegistry<S> {
    fn default() -> Self {
        Self {
            screens: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<S> ScreenRegistry<S> {
    pub fn mount(&self, screen: S) -> Uuid {
        let id = Uuid::new_v4();
        lock(&self.screens).insert(id, Arc::new(Mutex::new(screen)));
        id
    }

    pub fn get(&self, id: &Uuid) -> Result<Arc<Mutex<S>>, ApiError> {
        lock(&self.screens)
            .get(id)
            .cloned()
            .ok_or(ApiError::ScreenNotFound)
    }

    pub fn unmount(&self, id: &Uuid) -> bool {
        lock(&self.screens).remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.screens).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadOutcome {
    Reloaded,
    AlreadyLoading,
}

/// Screens whose loading flag can be cleared when a reload is abandoned.
trait ReloadTarget {
    fn cancel_reload(&mut self);
}

impl<T: ScreenEntity> ReloadTarget for EntityScreen<T> {
    fn cancel_reload(&mut self) {
        self.store.cancel_reload();
    }
}

impl ReloadTarget for AttendanceScreen {
    fn cancel_reload(&mut self) {
        self.employees.cancel_reload();
    }
}

/// Held across the gateway calls of a reload; dropped unsettled, it clears the loading flag.
struct InFlight<S: ReloadTarget> {
    screen: Arc<Mutex<S>>,
    settled: bool,
}

impl<S: ReloadTarget> InFlight<S> {
    fn new(screen: &Arc<Mutex<S>>) -> Self {
        Self {
            screen: Arc::clone(screen),
            settled: false,
        }
    }

    fn settle(mut self) {
        self.settled = true;
    }
}

impl<S: ReloadTarget> Drop for InFlight<S> {
    fn drop(&mut self) {
        if !self.settled {
            log::warn!("Reload dropped before completion, clearing loading flag");
            lock(&self.screen).cancel_reload();
        }
    }
}

fn load_error(error: &GatewayError) -> LoadError {
    LoadError {
        message: error.user_message(),
        retryable: error.is_network(),
    }
}

#[derive(Debug, Serialize)]
pub struct LoadState<'a> {
    pub loading: bool,
    pub error: Option<&'a LoadError>,
    pub last_loaded_at: Option<DateTime<Utc>>,
}

impl<'a> LoadState<'a> {
    fn of<T: Entity>(store: &'a EntityStore<T>) -> Self {
        Self {
            loading: store.is_loading(),
            error: store.error(),
            last_loaded_at: store.loaded_at(),
        }
    }
}

pub trait ScreenEntity: Entity + Filterable + Summarize {
    fn registry(state: &AppState) -> &ScreenRegistry<EntityScreen<Self>>;
}

impl ScreenEntity for Client {
    fn registry(state: &AppState) -> &ScreenRegistry<EntityScreen<Self>> {
        &state.clients
    }
}

impl ScreenEntity for Employee {
    fn registry(state: &AppState) -> &ScreenRegistry<EntityScreen<Self>> {
        &state.employees
    }
}

impl ScreenEntity for Category {
    fn registry(state: &AppState) -> &ScreenRegistry<EntityScreen<Self>> {
        &state.categories
    }
}

impl ScreenEntity for Appointment {
    fn registry(state: &AppState) -> &ScreenRegistry<EntityScreen<Self>> {
        &state.appointments
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ViewQuery {
    pub q: Option<String>,
    pub estado: Option<String>,
    pub sucursal: Option<String>,
}

impl ViewQuery {
    pub fn criteria<T: ScreenEntity>(&self) -> Result<Criteria<T::Status>, ApiError> {
        let status = match self.estado.as_deref() {
            Some(raw) => StatusFilter::parse(raw).ok_or_else(|| ApiError::InvalidFilter(raw.to_string()))?,
            None => StatusFilter::All,
        };
        let branch = BranchFilter::parse(self.sucursal.as_deref().unwrap_or_default());
        if !T::NEEDS_BRANCHES && branch != BranchFilter::All {
            return Err(ApiError::InvalidFilter(format!("sucursal para {}", T::RESOURCE)));
        }
        Ok(Criteria {
            search: SearchQuery::new(self.q.as_deref().unwrap_or_default()),
            status,
            branch,
        })
    }
}

#[derive(Serialize)]
#[serde(bound = "T: Entity")]
pub struct ItemView<'a, T: Entity> {
    #[serde(flatten)]
    pub item: &'a T,
    pub display: T::Display,
}

#[derive(Serialize)]
#[serde(bound = "T: ScreenEntity")]
pub struct ScreenView<'a, T: ScreenEntity> {
    pub screen_id: Uuid,
    pub items: Vec<ItemView<'a, T>>,
    pub matched: usize,
    pub stats: T::Summary,
    #[serde(flatten)]
    pub load: LoadState<'a>,
}

pub struct EntityScreen<T> {
    pub store: EntityStore<T>,
    pub branches: BranchDirectory,
}

impl<T: ScreenEntity> EntityScreen<T> {
    pub fn new() -> Self {
        Self {
            store: EntityStore::new(),
            branches: BranchDirectory::default(),
        }
    }

    /// Filters and sorts for display; statistics always cover the whole collection.
    pub fn view(&self, screen_id: Uuid, criteria: &Criteria<T::Status>) -> ScreenView<'_, T> {
        let items: Vec<ItemView<'_, T>> = filter_sort(self.store.items(), criteria)
            .into_iter()
            .map(|item| ItemView {
                item,
                display: item.display(),
            })
            .collect();
        ScreenView {
            screen_id,
            matched: items.len(),
            items,
            stats: T::summarize(self.store.items()),
            load: LoadState::of(&self.store),
        }
    }

    fn resolved(&self, mut item: T) -> T {
        item.resolve_branches(&self.branches);
        item
    }
}

impl<T: ScreenEntity> Default for EntityScreen<T> {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch_branches(state: &AppState, credentials: &Credentials) -> Option<Vec<Branch>> {
    match state
        .gateway
        .list::<Branch>(RESOURCE_BRANCHES, credentials.token())
        .await
    {
        Ok(branches) => Some(branches),
        Err(err) => {
            log::warn!("Branch directory unavailable, keeping previous names: {err}");
            None
        }
    }
}

pub async fn mount<T: ScreenEntity>(state: &AppState, credentials: &Credentials) -> Uuid {
    let screen_id = T::registry(state).mount(EntityScreen::<T>::new());
    log::info!("Mounted {} screen {screen_id}", T::RESOURCE);
    if let Err(err) = reload::<T>(state, screen_id, credentials).await {
        log::warn!("Initial {} load for screen {screen_id} failed: {err}", T::RESOURCE);
    }
    screen_id
}

pub async fn reload<T: ScreenEntity>(
    state: &AppState,
    screen_id: Uuid,
    credentials: &Credentials,
) -> Result<ReloadOutcome, ApiError> {
    let screen = T::registry(state).get(&screen_id)?;
    if !lock(&screen).store.begin_reload() {
        log::info!("Reload of {} screen {screen_id} skipped, one is in flight", T::RESOURCE);
        return Ok(ReloadOutcome::AlreadyLoading);
    }
    let in_flight = InFlight::new(&screen);

    let branches = if T::NEEDS_BRANCHES {
        fetch_branches(state, credentials).await
    } else {
        None
    };
    let result = state.gateway.list::<T>(T::RESOURCE, credentials.token()).await;
    in_flight.settle();

    let mut guard = lock(&screen);
    if let Some(branches) = branches {
        guard.branches = BranchDirectory::new(&branches);
    }
    match result {
        Ok(items) => {
            let items: Vec<T> = items.into_iter().map(|item| guard.resolved(item)).collect();
            guard.store.finish_reload(Ok(items));
            drop(guard);
            state.publish(StoreEvent::new(EVENT_RELOADED, T::RESOURCE, screen_id));
            Ok(ReloadOutcome::Reloaded)
        }
        Err(err) => {
            log::warn!("Loading {} failed: {err}", T::RESOURCE);
            guard.store.finish_reload(Err(load_error(&err)));
            Err(ApiError::Load(err))
        }
    }
}

pub async fn create<T: ScreenEntity>(
    state: &AppState,
    screen_id: Uuid,
    credentials: &Credentials,
    input: T::Input,
) -> Result<T, ApiError> {
    let screen = T::registry(state).get(&screen_id)?;
    input.validate()?;

    let created: T = state
        .gateway
        .create(T::RESOURCE, credentials.token(), &input)
        .await?;

    let created = {
        let mut guard = lock(&screen);
        let created = guard.resolved(created);
        guard.store.insert_front(created.clone());
        created
    };
    state.publish(StoreEvent::new(EVENT_CREATED, T::RESOURCE, screen_id).with_item(created.id()));
    Ok(created)
}

/// Settles an optimistic patch: keeps the server copy, keeps the local patch when the server
/// returned nothing usable, or rolls back on failure.
fn settle<T: ScreenEntity>(
    state: &AppState,
    screen: &Mutex<EntityScreen<T>>,
    screen_id: Uuid,
    patched: T,
    rollback: Option<crate::store::Rollback<T>>,
    result: Result<Option<T>, GatewayError>,
) -> Result<T, ApiError> {
    let mut guard = lock(screen);
    match result {
        Ok(Some(server)) => {
            let server = guard.resolved(server);
            if !guard.store.replace(server.clone()) {
                log::warn!("{} {} vanished before the server confirmed it", T::NAME, server.id());
            }
            Ok(server)
        }
        Ok(None) => Ok(patched),
        Err(err) => {
            if let Some(rollback) = rollback {
                guard.store.rollback(rollback);
            }
            drop(guard);
            log::warn!("Rolled back {} {}: {err}", T::NAME, patched.id());
            state.publish(StoreEvent::new(EVENT_ROLLED_BACK, T::RESOURCE, screen_id).with_item(patched.id()));
            Err(err.into())
        }
    }
}

pub async fn update<T: ScreenEntity>(
    state: &AppState,
    screen_id: Uuid,
    credentials: &Credentials,
    id: &EntityId,
    input: T::Input,
) -> Result<T, ApiError> {
    let screen = T::registry(state).get(&screen_id)?;
    input.validate()?;

    let (patched, rollback) = {
        let mut guard = lock(&screen);
        let current = guard.store.get(id).ok_or(ApiError::ItemNotFound(T::NAME))?;
        let patched = guard.resolved(current.apply_input(&input));
        let rollback = guard.store.apply_patch(patched.clone());
        (patched, rollback)
    };
    state.publish(StoreEvent::new(EVENT_UPDATED, T::RESOURCE, screen_id).with_item(id));

    let result = state
        .gateway
        .update::<T, _>(T::RESOURCE, id, credentials.token(), &input)
        .await;
    settle(state, &screen, screen_id, patched, rollback, result)
}

pub async fn change_status<T>(
    state: &AppState,
    screen_id: Uuid,
    credentials: &Credentials,
    id: &EntityId,
    raw_status: &str,
) -> Result<T, ApiError>
where
    T: ScreenEntity + HasStatus,
{
    let screen = T::registry(state).get(&screen_id)?;
    let status = <T as HasStatus>::Status::parse_value(raw_status)
        .filter(|status| status.is_assignable())
        .ok_or_else(|| ApiError::InvalidStatus(raw_status.to_string()))?;

    let (patched, rollback) = {
        let mut guard = lock(&screen);
        let current = guard.store.get(id).ok_or(ApiError::ItemNotFound(T::NAME))?;
        if current.current_status() == status {
            return Ok(current.clone());
        }
        let mut patched = current.clone();
        patched.set_status(status);
        let rollback = guard.store.apply_patch(patched.clone());
        (patched, rollback)
    };
    state.publish(
        StoreEvent::new(EVENT_STATUS_CHANGED, T::RESOURCE, screen_id)
            .with_item(id)
            .with_status(status.token()),
    );

    let result = state
        .gateway
        .set_status::<T>(T::RESOURCE, id, credentials.token(), status.token())
        .await;
    settle(state, &screen, screen_id, patched, rollback, result)
}

pub async fn delete<T: ScreenEntity>(
    state: &AppState,
    screen_id: Uuid,
    credentials: &Credentials,
    id: &EntityId,
) -> Result<(), ApiError> {
    let screen = T::registry(state).get(&screen_id)?;
    let rollback = lock(&screen)
        .store
        .remove(id)
        .ok_or(ApiError::ItemNotFound(T::NAME))?;

    match state.gateway.delete(T::RESOURCE, id, credentials.token()).await {
        Ok(()) => {
            state.publish(StoreEvent::new(EVENT_DELETED, T::RESOURCE, screen_id).with_item(id));
            Ok(())
        }
        Err(err) => {
            lock(&screen).store.rollback(rollback);
            log::warn!("Restored {} {id} after failed delete: {err}", T::NAME);
            state.publish(StoreEvent::new(EVENT_ROLLED_BACK, T::RESOURCE, screen_id).with_item(id));
            Err(err.into())
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct AttendanceQuery {
    pub sucursal_id: Option<String>,
    pub disponible: Option<String>,
}

impl AttendanceQuery {
    pub fn filter(&self) -> Result<AttendanceFilter, ApiError> {
        let sucursal = match self.sucursal_id.as_deref().map(str::trim) {
            None | Some("" | "todas" | "todos" | "all") => BranchSelector::All,
            Some(raw) if raw.eq_ignore_ascii_case(UNASSIGNED_TOKEN) => BranchSelector::Unassigned,
            Some(raw) => BranchSelector::Branch(EntityId::parse(raw)),
        };
        let disponible = match self.disponible.as_deref().map(|raw| raw.trim().to_lowercase()) {
            None => None,
            Some(raw) => match raw.as_str() {
                "" | "todos" | "all" => None,
                "true" | "1" | "si" | "sí" | "disponible" | "disponibles" => Some(true),
                "false" | "0" | "no" | "no_disponible" | "no_disponibles" => Some(false),
                _ => return Err(ApiError::InvalidFilter(raw.clone())),
            },
        };
        Ok(AttendanceFilter { sucursal, disponible })
    }
}

#[derive(Serialize)]
pub struct AttendanceView<'a> {
    pub screen_id: Uuid,
    pub sucursales: Vec<BucketView<'a>>,
    pub summary: AttendanceSummary,
    #[serde(flatten)]
    pub load: LoadState<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub disponible: bool,
    pub disponibles: usize,
    pub no_disponibles: usize,
    pub total: usize,
}

#[derive(Default)]
pub struct AttendanceScreen {
    pub employees: EntityStore<Employee>,
    pub branches: Vec<Branch>,
    pub board: AttendanceBoard,
}

impl AttendanceScreen {
    pub fn view(&self, screen_id: Uuid, filter: &AttendanceFilter) -> AttendanceView<'_> {
        AttendanceView {
            screen_id,
            sucursales: self.board.view(filter),
            summary: self.board.summary(),
            load: LoadState::of(&self.employees),
        }
    }

    fn rebuild(&mut self) {
        self.board = AttendanceBoard::build(self.employees.items(), &self.branches);
    }

    /// Local only; the gateway is not told about availability flips.
    pub fn toggle(&mut self, id: &EntityId) -> Option<ToggleOutcome> {
        let disponible = self.board.toggle(id)?;
        if let Some(employee) = self.employees.get_mut(id) {
            employee.disponible = Some(disponible);
        }
        let bucket = self.board.bucket_of(id)?;
        Some(ToggleOutcome {
            disponible,
            disponibles: bucket.disponibles,
            no_disponibles: bucket.no_disponibles,
            total: bucket.total,
        })
    }
}

pub async fn mount_attendance(state: &AppState, credentials: &Credentials) -> Uuid {
    let screen_id = state.attendance.mount(AttendanceScreen::default());
    log::info!("Mounted {ATTENDANCE} screen {screen_id}");
    if let Err(err) = reload_attendance(state, screen_id, credentials).await {
        log::warn!("Initial {ATTENDANCE} load for screen {screen_id} failed: {err}");
    }
    screen_id
}

pub async fn reload_attendance(
    state: &AppState,
    screen_id: Uuid,
    credentials: &Credentials,
) -> Result<ReloadOutcome, ApiError> {
    let screen = state.attendance.get(&screen_id)?;
    if !lock(&screen).employees.begin_reload() {
        log::info!("Reload of {ATTENDANCE} screen {screen_id} skipped, one is in flight");
        return Ok(ReloadOutcome::AlreadyLoading);
    }
    let in_flight = InFlight::new(&screen);

    let branches = fetch_branches(state, credentials).await;
    let result = state
        .gateway
        .list::<Employee>(Employee::RESOURCE, credentials.token())
        .await;
    in_flight.settle();

    let mut guard = lock(&screen);
    if let Some(branches) = branches {
        guard.branches = branches;
    }
    match result {
        Ok(employees) => {
            guard.employees.finish_reload(Ok(employees));
            guard.rebuild();
            drop(guard);
            state.publish(StoreEvent::new(EVENT_RELOADED, ATTENDANCE, screen_id));
            Ok(ReloadOutcome::Reloaded)
        }
        Err(err) => {
            log::warn!("Loading {ATTENDANCE} failed: {err}");
            guard.employees.finish_reload(Err(load_error(&err)));
            Err(ApiError::Load(err))
        }
    }
}

pub fn toggle_attendance(state: &AppState, screen_id: Uuid, id: &EntityId) -> Result<ToggleOutcome, ApiError> {
    let screen = state.attendance.get(&screen_id)?;
    let outcome = lock(&screen)
        .toggle(id)
        .ok_or(ApiError::ItemNotFound(Employee::NAME))?;
    state.publish(
        StoreEvent::new(EVENT_TOGGLED, ATTENDANCE, screen_id)
            .with_item(id)
            .with_status(if outcome.disponible { "disponible" } else { "no_disponible" }),
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(estado: Option<&str>, sucursal: Option<&str>) -> ViewQuery {
        ViewQuery {
            q: None,
            estado: estado.map(str::to_string),
            sucursal: sucursal.map(str::to_string),
        }
    }

    #[test]
    fn registry_mounts_and_unmounts() {
        let registry: ScreenRegistry<EntityScreen<Client>> = ScreenRegistry::default();
        let first = registry.mount(EntityScreen::new());
        let second = registry.mount(EntityScreen::new());
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&first).is_ok());
        assert!(registry.unmount(&first));
        assert!(!registry.unmount(&first));
        assert!(matches!(registry.get(&first), Err(ApiError::ScreenNotFound)));
    }

    #[test]
    fn view_query_rejects_unknown_status_and_foreign_branch_filter() {
        assert!(query(Some("activos"), None).criteria::<Client>().is_ok());
        assert!(matches!(
            query(Some("borrados"), None).criteria::<Client>(),
            Err(ApiError::InvalidFilter(_))
        ));
        assert!(query(None, Some("Centro")).criteria::<Employee>().is_ok());
        assert!(query(None, Some("todas")).criteria::<Category>().is_ok());
        assert!(matches!(
            query(None, Some("Centro")).criteria::<Category>(),
            Err(ApiError::InvalidFilter(_))
        ));
    }

    #[test]
    fn view_reports_stats_over_full_collection() {
        let mut screen: EntityScreen<Client> = EntityScreen::new();
        let clients: Vec<Client> = serde_json::from_str(
            r#"[{"id": 1, "nombre": "Ana", "estado": "activo"}, {"id": 2, "nombre": "Luis", "estado": "inactivo"}]"#,
        )
        .unwrap();
        screen.store.replace_all(clients);
        let criteria = query(Some("activos"), None).criteria::<Client>().unwrap();
        let id = Uuid::new_v4();
        let view = screen.view(id, &criteria);
        assert_eq!(view.matched, 1);
        assert_eq!(view.stats.total, 2);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["items"][0]["nombre"], "Ana");
        assert_eq!(json["items"][0]["display"]["nombre_completo"], "Ana");
        assert_eq!(json["loading"], false);
    }

    #[test]
    fn attendance_toggle_updates_board_and_store() {
        let mut screen = AttendanceScreen::default();
        let staff: Vec<Employee> = serde_json::from_str(
            r#"[
                {"id": 1, "nombre": "Ana", "estado": "activo", "sucursal": "Centro", "disponible": true},
                {"id": 2, "nombre": "Luis", "estado": "activo", "sucursal": "Centro", "disponible": false}
            ]"#,
        )
        .unwrap();
        screen.employees.replace_all(staff);
        screen.rebuild();

        let outcome = screen.toggle(&2.into()).unwrap();
        assert_eq!(
            outcome,
            ToggleOutcome {
                disponible: true,
                disponibles: 2,
                no_disponibles: 0,
                total: 2
            }
        );
        assert_eq!(screen.employees.get(&2.into()).unwrap().disponible, Some(true));
        assert!(screen.toggle(&7.into()).is_none());
    }

    #[test]
    fn attendance_query_parses_flags() {
        let query = AttendanceQuery {
            sucursal_id: Some("10".to_string()),
            disponible: Some("false".to_string()),
        };
        assert_eq!(
            query.filter().unwrap(),
            AttendanceFilter {
                sucursal: BranchSelector::Branch(10.into()),
                disponible: Some(false)
            }
        );
        let query = AttendanceQuery {
            sucursal_id: Some("sin_sucursal".to_string()),
            disponible: None,
        };
        assert_eq!(query.filter().unwrap().sucursal, BranchSelector::Unassigned);
        let query = AttendanceQuery {
            sucursal_id: Some("todas".to_string()),
            disponible: Some("quizas".to_string()),
        };
        assert!(query.filter().is_err());
    }
}
