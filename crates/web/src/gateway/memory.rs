//! In-memory backend.
//!
//! Implements [`Gateway`] and [`AuthProvider`] inside the process so the
//! application runs without a Supabase project (`CLIQUE_BACKEND=memory`) and
//! tests can observe exactly which calls were made. Ownership checks mirror
//! the row level security policies of the hosted tables.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use clique_recicle_core::{
    CollectionPoint, CollectionPointId, Email, Favorite, FavoriteId, NewCollectionPoint, UserId,
    UserRole,
};

use super::{
    AccessToken, AuthProvider, AuthSession, AuthUser, Gateway, GatewayError, GatewayResult,
    PointFilter, SignUp, SignUpOutcome,
};

struct Account {
    user: AuthUser,
    password: SecretString,
    role: UserRole,
}

#[derive(Default)]
struct Tables {
    points: Vec<CollectionPoint>,
    favorites: Vec<Favorite>,
    accounts: HashMap<Email, Account>,
    tokens: HashMap<String, UserId>,
}

/// Process-local backend.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
    calls: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a point as-is, bypassing validation (test and demo seeding).
    pub fn seed_point(&self, point: CollectionPoint) {
        self.write_tables().points.push(point);
    }

    /// Register an account directly and return a signed-in session for it.
    pub fn seed_account(&self, email: &Email, password: &str, role: UserRole) -> AuthSession {
        let user = AuthUser {
            id: UserId::generate(),
            email: email.clone(),
            role_hint: Some(role),
        };
        let mut tables = self.write_tables();
        tables.accounts.insert(
            email.clone(),
            Account {
                user: user.clone(),
                password: SecretString::from(password.to_owned()),
                role,
            },
        );
        let access_token = issue_token(&mut tables, user.id);
        AuthSession { user, access_token }
    }

    /// Number of [`Gateway`] calls made so far (auth calls excluded).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of successful [`Gateway`] writes made so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent read fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored favorite rows (all users).
    pub fn favorite_rows(&self) -> usize {
        self.read_tables().favorites.len()
    }

    fn read_tables(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_tables(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn begin_read(&self) -> GatewayResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("simulated read failure".to_string()));
        }
        Ok(())
    }

    /// Count a write call and resolve the caller's identity.
    fn begin_write(&self, token: &AccessToken) -> GatewayResult<UserId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("simulated write failure".to_string()));
        }
        self.caller(token)
    }

    fn caller(&self, token: &AccessToken) -> GatewayResult<UserId> {
        self.read_tables()
            .tokens
            .get(token.expose())
            .copied()
            .ok_or_else(|| GatewayError::Unauthorized("invalid or expired token".to_string()))
    }

    fn committed(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn issue_token(tables: &mut Tables, user_id: UserId) -> AccessToken {
    let token = format!("mem-{}", Uuid::new_v4());
    tables.tokens.insert(token.clone(), user_id);
    AccessToken::new(token)
}

fn joined(favorite: &Favorite, points: &[CollectionPoint]) -> Favorite {
    Favorite {
        collection_point: points
            .iter()
            .find(|p| p.id == favorite.collection_point_id)
            .cloned(),
        ..favorite.clone()
    }
}

#[async_trait]
impl Gateway for InMemoryBackend {
    async fn list_collection_points(
        &self,
        filter: PointFilter,
    ) -> GatewayResult<Vec<CollectionPoint>> {
        self.begin_read()?;
        let mut points: Vec<CollectionPoint> = self
            .read_tables()
            .points
            .iter()
            .filter(|p| filter.agent_id.is_none_or(|agent| p.agent_id == agent))
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        points.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(points)
    }

    async fn get_collection_point(&self, id: CollectionPointId) -> GatewayResult<CollectionPoint> {
        self.begin_read()?;
        self.read_tables()
            .points
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("collection point {id}")))
    }

    async fn insert_collection_point(
        &self,
        token: &AccessToken,
        draft: &NewCollectionPoint,
    ) -> GatewayResult<CollectionPoint> {
        let caller = self.begin_write(token)?;
        if caller != draft.agent_id {
            return Err(GatewayError::Unauthorized(
                "new row violates row-level security policy".to_string(),
            ));
        }

        let point = CollectionPoint {
            id: CollectionPointId::generate(),
            name: draft.name.clone(),
            address: draft.address.clone(),
            city: draft.city.clone(),
            state: draft.state.clone(),
            zip_code: draft.zip_code.clone(),
            phone: draft.phone.clone(),
            hours: draft.hours.clone(),
            materials: draft.materials.clone(),
            agent_id: draft.agent_id,
            created_at: Utc::now(),
        };
        self.write_tables().points.push(point.clone());
        self.committed();
        Ok(point)
    }

    async fn update_collection_point(
        &self,
        token: &AccessToken,
        id: CollectionPointId,
        draft: &NewCollectionPoint,
    ) -> GatewayResult<CollectionPoint> {
        let caller = self.begin_write(token)?;
        let mut tables = self.write_tables();
        let point = tables
            .points
            .iter_mut()
            .find(|p| p.id == id && p.agent_id == caller)
            .ok_or_else(|| GatewayError::NotFound(format!("collection point {id}")))?;

        point.name.clone_from(&draft.name);
        point.address.clone_from(&draft.address);
        point.city.clone_from(&draft.city);
        point.state.clone_from(&draft.state);
        point.zip_code.clone_from(&draft.zip_code);
        point.phone.clone_from(&draft.phone);
        point.hours.clone_from(&draft.hours);
        point.materials.clone_from(&draft.materials);
        let updated = point.clone();
        drop(tables);

        self.committed();
        Ok(updated)
    }

    async fn delete_collection_point(
        &self,
        token: &AccessToken,
        id: CollectionPointId,
    ) -> GatewayResult<()> {
        let caller = self.begin_write(token)?;
        let mut tables = self.write_tables();
        let before = tables.points.len();
        tables.points.retain(|p| !(p.id == id && p.agent_id == caller));
        if tables.points.len() == before {
            return Err(GatewayError::NotFound(format!("collection point {id}")));
        }
        // favorites.collection_point_id references the point with ON DELETE CASCADE
        tables.favorites.retain(|f| f.collection_point_id != id);
        drop(tables);

        self.committed();
        Ok(())
    }

    async fn list_favorites(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> GatewayResult<Vec<Favorite>> {
        self.begin_read()?;
        if self.caller(token)? != user_id {
            return Ok(Vec::new());
        }
        let tables = self.read_tables();
        let mut favorites: Vec<Favorite> = tables
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| joined(f, &tables.points))
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }

    async fn insert_favorite(
        &self,
        token: &AccessToken,
        user_id: UserId,
        point_id: CollectionPointId,
    ) -> GatewayResult<Favorite> {
        let caller = self.begin_write(token)?;
        if caller != user_id {
            return Err(GatewayError::Unauthorized(
                "new row violates row-level security policy".to_string(),
            ));
        }

        let mut tables = self.write_tables();
        if !tables.points.iter().any(|p| p.id == point_id) {
            return Err(GatewayError::Backend {
                status: 409,
                message: "insert or update on table \"favorites\" violates foreign key constraint"
                    .to_string(),
            });
        }

        if let Some(existing) = tables
            .favorites
            .iter()
            .find(|f| f.user_id == user_id && f.collection_point_id == point_id)
        {
            return Ok(joined(existing, &tables.points));
        }

        let favorite = Favorite {
            id: FavoriteId::generate(),
            user_id,
            collection_point_id: point_id,
            created_at: Utc::now(),
            collection_point: None,
        };
        tables.favorites.push(favorite.clone());
        let result = joined(&favorite, &tables.points);
        drop(tables);

        self.committed();
        Ok(result)
    }

    async fn delete_favorite(
        &self,
        token: &AccessToken,
        user_id: UserId,
        point_id: CollectionPointId,
    ) -> GatewayResult<()> {
        let caller = self.begin_write(token)?;
        if caller == user_id {
            self.write_tables()
                .favorites
                .retain(|f| !(f.user_id == user_id && f.collection_point_id == point_id));
        }
        self.committed();
        Ok(())
    }

    async fn delete_favorite_by_id(
        &self,
        token: &AccessToken,
        favorite_id: FavoriteId,
    ) -> GatewayResult<()> {
        let caller = self.begin_write(token)?;
        self.write_tables()
            .favorites
            .retain(|f| !(f.id == favorite_id && f.user_id == caller));
        self.committed();
        Ok(())
    }

    async fn fetch_role(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> GatewayResult<Option<UserRole>> {
        self.begin_read()?;
        self.caller(token)?;
        Ok(self
            .read_tables()
            .accounts
            .values()
            .find(|a| a.user.id == user_id)
            .map(|a| a.role))
    }
}

#[async_trait]
impl AuthProvider for InMemoryBackend {
    async fn sign_up(&self, request: &SignUp) -> GatewayResult<SignUpOutcome> {
        let mut tables = self.write_tables();
        if tables.accounts.contains_key(&request.email) {
            return Err(GatewayError::Conflict("User already registered".to_string()));
        }

        let user = AuthUser {
            id: UserId::generate(),
            email: request.email.clone(),
            role_hint: Some(request.role),
        };
        tables.accounts.insert(
            request.email.clone(),
            Account {
                user: user.clone(),
                password: SecretString::from(request.password().to_owned()),
                role: request.role,
            },
        );
        let access_token = issue_token(&mut tables, user.id);
        Ok(SignUpOutcome::SignedIn(AuthSession { user, access_token }))
    }

    async fn sign_in(&self, email: &Email, password: &SecretString) -> GatewayResult<AuthSession> {
        let mut tables = self.write_tables();
        let user = tables
            .accounts
            .get(email)
            .filter(|a| a.password.expose_secret() == password.expose_secret())
            .map(|a| a.user.clone())
            .ok_or_else(|| GatewayError::Unauthorized("Invalid login credentials".to_string()))?;
        let access_token = issue_token(&mut tables, user.id);
        Ok(AuthSession { user, access_token })
    }

    async fn sign_out(&self, token: &AccessToken) -> GatewayResult<()> {
        self.write_tables().tokens.remove(token.expose());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft(agent_id: UserId) -> NewCollectionPoint {
        NewCollectionPoint {
            name: "EcoPoint Centro".to_string(),
            address: "Rua das Flores, 123".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            zip_code: None,
            phone: "(11) 1234-5678".to_string(),
            hours: "Seg-Sex: 8h-18h".to_string(),
            materials: vec!["Papel".to_string()],
            agent_id,
        }
    }

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_insert_requires_matching_agent() {
        let backend = InMemoryBackend::new();
        let agent = backend.seed_account(&email("agente@exemplo.com"), "senha123", UserRole::Agent);

        let err = backend
            .insert_collection_point(&agent.access_token, &draft(UserId::generate()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));

        let point = backend
            .insert_collection_point(&agent.access_token, &draft(agent.user.id))
            .await
            .unwrap();
        assert_eq!(point.agent_id, agent.user.id);
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_only_by_owner() {
        let backend = InMemoryBackend::new();
        let owner = backend.seed_account(&email("dono@exemplo.com"), "senha123", UserRole::Agent);
        let other = backend.seed_account(&email("outro@exemplo.com"), "senha123", UserRole::Agent);
        let point = backend
            .insert_collection_point(&owner.access_token, &draft(owner.user.id))
            .await
            .unwrap();

        let err = backend
            .delete_collection_point(&other.access_token, point.id)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));

        backend
            .delete_collection_point(&owner.access_token, point.id)
            .await
            .unwrap();
        assert!(
            backend
                .list_collection_points(PointFilter::all())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_insert_favorite_is_idempotent() {
        let backend = InMemoryBackend::new();
        let agent = backend.seed_account(&email("agente@exemplo.com"), "senha123", UserRole::Agent);
        let user = backend.seed_account(&email("user@exemplo.com"), "senha123", UserRole::Recycler);
        let point = backend
            .insert_collection_point(&agent.access_token, &draft(agent.user.id))
            .await
            .unwrap();

        let first = backend
            .insert_favorite(&user.access_token, user.user.id, point.id)
            .await
            .unwrap();
        let second = backend
            .insert_favorite(&user.access_token, user.user.id, point.id)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(backend.favorite_rows(), 1);
        assert_eq!(first.collection_point.unwrap().id, point.id);
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let backend = InMemoryBackend::new();
        let address = email("ana@exemplo.com");
        backend.seed_account(&address, "senha123", UserRole::Recycler);

        let err = backend
            .sign_in(&address, &SecretString::from("errada"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));

        let session = backend
            .sign_in(&address, &SecretString::from("senha123"))
            .await
            .unwrap();
        assert_eq!(session.user.email, address);
    }

    #[tokio::test]
    async fn test_signed_out_token_rejected() {
        let backend = InMemoryBackend::new();
        let agent = backend.seed_account(&email("agente@exemplo.com"), "senha123", UserRole::Agent);
        backend.sign_out(&agent.access_token).await.unwrap();

        let err = backend
            .insert_collection_point(&agent.access_token, &draft(agent.user.id))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = InMemoryBackend::new();
        backend.set_fail_reads(true);
        assert!(
            backend
                .list_collection_points(PointFilter::all())
                .await
                .is_err()
        );
        assert_eq!(backend.call_count(), 1);
    }
}
