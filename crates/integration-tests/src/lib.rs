//! Integration test support for the KidsGPT client.
//!
//! Spins up an in-process mock of the backend REST API on a random port, so
//! the tests in `tests/` exercise the real client stack (HTTP, serde, auth
//! header handling, session manager) without a Python backend or network
//! access.
//!
//! The mock keeps its world in a [`MockState`] behind a mutex. Tests seed it
//! directly through [`TestContext`] helpers and can flip knobs like
//! [`MockState::require_token`] or [`MockState::login_delay_ms`] to provoke
//! 401 retries and login/logout races.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kidsgpt-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::{get, patch, post};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Value, json};

use kidsgpt_client::api::types::{
    AdminStats, Child, ChildWithStats, Conversation, ConversationWithMessages, KidSession,
    Message, SystemConfig, User, UserListItem,
};
use kidsgpt_client::session::{AuthSessionManager, TokenStore};
use kidsgpt_client::{ApiClient, ClientConfig};
use kidsgpt_core::{
    ChildId, ConversationId, Email, MessageId, MessageRole, Pin, Role, SubscriptionTier, UserId,
};

pub type SharedState = Arc<Mutex<MockState>>;

/// The mock backend's world.
pub struct MockState {
    pub users: Vec<User>,
    pub children: Vec<ChildWithStats>,
    pub conversations: Vec<ConversationWithMessages>,
    pub config: SystemConfig,

    /// Accepted bearer tokens. Irrelevant unless `require_token` is set.
    pub valid_tokens: Vec<String>,
    /// When set, protected endpoints reject requests whose bearer token is
    /// not in `valid_tokens` with a 401.
    pub require_token: bool,
    /// Artificial delay applied to login endpoints, for race tests.
    pub login_delay_ms: u64,

    /// Bearer token (if any) seen on each protected request, in order.
    pub auth_headers_seen: Vec<Option<String>>,

    next_user_id: i64,
    next_child_id: i64,
    next_conversation_id: i64,
    next_message_id: i64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            children: Vec::new(),
            conversations: Vec::new(),
            config: SystemConfig {
                ai_provider: "anthropic".to_string(),
                default_daily_limit: 50,
                max_children_free: 1,
                max_children_basic: 3,
                max_children_premium: 10,
                content_filter_level: "strict".to_string(),
            },
            valid_tokens: Vec::new(),
            require_token: false,
            login_delay_ms: 0,
            auth_headers_seen: Vec::new(),
            next_user_id: 1,
            next_child_id: 1,
            next_conversation_id: 1,
            next_message_id: 1,
        }
    }
}

impl MockState {
    /// Number of protected requests the mock has seen.
    #[must_use]
    pub fn protected_requests(&self) -> usize {
        self.auth_headers_seen.len()
    }
}

/// One running mock backend plus a client stack pointed at it.
pub struct TestContext {
    pub api: ApiClient,
    pub sessions: AuthSessionManager,
    pub state: SharedState,
    pub addr: SocketAddr,
    state_dir: tempfile::TempDir,
}

impl TestContext {
    /// Start a mock backend on a random port and wire a fresh client to it.
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(MockState::default()));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("mock backend crashed");
        });

        let state_dir = tempfile::tempdir().expect("Failed to create state dir");
        let config = ClientConfig::new(&format!("http://{addr}/api"), state_dir.path())
            .expect("Failed to build client config");
        let api = ApiClient::new(&config);
        let sessions = AuthSessionManager::new(api.clone(), TokenStore::new(state_dir.path()));

        Self {
            api,
            sessions,
            state,
            addr,
            state_dir,
        }
    }

    /// A second session manager sharing this context's store, as a relaunch
    /// of the app would see it.
    #[must_use]
    pub fn relaunch_sessions(&self) -> AuthSessionManager {
        let config = ClientConfig::new(&format!("http://{}/api", self.addr), self.state_dir.path())
            .expect("Failed to build client config");
        AuthSessionManager::new(
            ApiClient::new(&config),
            TokenStore::new(self.state_dir.path()),
        )
    }

    pub fn seed_parent(&self, email: &str) -> User {
        self.seed_user(email, Role::Parent)
    }

    pub fn seed_admin(&self, email: &str) -> User {
        self.seed_user(email, Role::Admin)
    }

    fn seed_user(&self, email: &str, role: Role) -> User {
        let mut state = self.state.lock();
        let id = state.next_user_id;
        state.next_user_id += 1;
        let user = User {
            id: UserId::new(id),
            email: Email::parse(email).expect("invalid seed email"),
            display_name: None,
            role,
            subscription_tier: SubscriptionTier::Free,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        user
    }

    pub fn seed_child(&self, parent: &User, name: &str, pin: &str) -> ChildWithStats {
        let mut state = self.state.lock();
        let id = state.next_child_id;
        state.next_child_id += 1;
        let child = ChildWithStats {
            child: Child {
                id: ChildId::new(id),
                parent_id: parent.id,
                name: name.to_string(),
                age: 8,
                login_pin: Pin::parse(pin).expect("invalid seed pin"),
                avatar_id: None,
                interests: None,
                learning_goals: None,
                daily_message_limit: 50,
                messages_today: 0,
                last_message_date: None,
                is_active: true,
                created_at: Utc::now(),
            },
            total_conversations: 0,
            total_messages: 0,
            can_send_message: true,
        };
        state.children.push(child.clone());
        child
    }

    /// Deactivate a user account, as the admin toggle would.
    pub fn deactivate_user(&self, id: UserId) {
        let mut state = self.state.lock();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.is_active = false;
        }
    }

    /// Deactivate a child profile.
    pub fn deactivate_child(&self, id: ChildId) {
        let mut state = self.state.lock();
        if let Some(child) = state.children.iter_mut().find(|c| c.child.id == id) {
            child.child.is_active = false;
        }
    }

    /// Require bearer auth on protected endpoints, accepting `tokens`.
    pub fn require_tokens(&self, tokens: &[&str]) {
        let mut state = self.state.lock();
        state.require_token = true;
        state.valid_tokens = tokens.iter().map(ToString::to_string).collect();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Routes
// ─────────────────────────────────────────────────────────────────────────────

type Reply = (StatusCode, axum::Json<Value>);

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/firebase-login", post(firebase_login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/kid-login", post(kid_login))
        .route("/api/children", get(list_children).post(create_child))
        .route(
            "/api/children/{id}",
            get(get_child).patch(update_child).delete(delete_child),
        )
        .route("/api/children/{id}/regenerate-pin", post(regenerate_pin))
        .route("/api/chat", post(send_message))
        .route("/api/chat/today/{id}", get(today_stats))
        .route("/api/chat/conversations/{id}", get(list_conversations))
        .route("/api/chat/conversation/{id}", get(get_conversation))
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/config", get(get_config).patch(update_config))
        .route(
            "/api/admin/flagged-conversations",
            get(flagged_conversations),
        )
        .route("/api/admin/users/{id}/subscription", patch(set_subscription))
        .route("/api/admin/users/{id}/toggle-active", patch(toggle_active))
        .route("/api/admin/create-admin", post(create_admin))
        .with_state(state)
}

fn detail(status: StatusCode, message: &str) -> Reply {
    (status, axum::Json(json!({ "detail": message })))
}

fn ok<T: serde::Serialize>(value: &T) -> Reply {
    (
        StatusCode::OK,
        axum::Json(serde_json::to_value(value).expect("response serialization failed")),
    )
}

/// Record the bearer token and enforce auth when `require_token` is set.
fn check_auth(state: &SharedState, headers: &HeaderMap) -> Result<(), Reply> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(ToString::to_string);

    let mut state = state.lock();
    state.auth_headers_seen.push(token.clone());
    if !state.require_token {
        return Ok(());
    }
    match token {
        Some(token) if state.valid_tokens.contains(&token) => Ok(()),
        _ => Err(detail(
            StatusCode::UNAUTHORIZED,
            "Could not validate credentials",
        )),
    }
}

async fn login_delay(state: &SharedState) {
    let delay = state.lock().login_delay_ms;
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
}

/// The admin user identified by `admin_id`, or a 403.
fn require_admin(state: &MockState, params: &HashMap<String, String>) -> Result<User, Reply> {
    params
        .get("admin_id")
        .and_then(|id| id.parse::<i64>().ok())
        .and_then(|id| state.users.iter().find(|u| u.id == UserId::new(id)))
        .filter(|u| u.role.is_admin())
        .cloned()
        .ok_or_else(|| detail(StatusCode::FORBIDDEN, "Admin access required"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn register(State(state): State<SharedState>, axum::Json(body): axum::Json<Value>) -> Reply {
    login_delay(&state).await;
    let mut state = state.lock();

    let Some(email) = body["email"].as_str().map(ToString::to_string) else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "email is required");
    };
    if state.users.iter().any(|u| u.email.as_str() == email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }

    let id = state.next_user_id;
    state.next_user_id += 1;
    let user = User {
        id: UserId::new(id),
        email: match Email::parse(&email) {
            Ok(email) => email,
            Err(_) => return detail(StatusCode::UNPROCESSABLE_ENTITY, "invalid email"),
        },
        display_name: body["display_name"].as_str().map(ToString::to_string),
        role: Role::Parent,
        subscription_tier: SubscriptionTier::Free,
        is_active: true,
        created_at: Utc::now(),
    };
    state.users.push(user.clone());
    ok(&user)
}

async fn login(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    login_delay(&state).await;
    let state = state.lock();

    let email = params.get("email").cloned().unwrap_or_default();
    let Some(user) = state.users.iter().find(|u| u.email.as_str() == email) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    if !user.is_active {
        return detail(StatusCode::FORBIDDEN, "Account is deactivated");
    }
    ok(user)
}

async fn firebase_login(
    State(state): State<SharedState>,
    axum::Json(body): axum::Json<Value>,
) -> Reply {
    login_delay(&state).await;
    let state = state.lock();

    let token = body["id_token"].as_str().unwrap_or_default();
    if !state.valid_tokens.iter().any(|t| t == token) {
        return detail(StatusCode::UNAUTHORIZED, "Invalid ID token");
    }
    // Token subject maps to the first user in this mock.
    let Some(user) = state.users.first() else {
        return detail(StatusCode::UNAUTHORIZED, "Invalid ID token");
    };
    if !user.is_active {
        return detail(StatusCode::FORBIDDEN, "Account is deactivated");
    }
    ok(user)
}

async fn me(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    let user = params
        .get("user_id")
        .and_then(|id| id.parse::<i64>().ok())
        .and_then(|id| state.users.iter().find(|u| u.id == UserId::new(id)));
    match user {
        Some(user) => ok(user),
        None => detail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn kid_login(State(state): State<SharedState>, axum::Json(body): axum::Json<Value>) -> Reply {
    login_delay(&state).await;
    let state = state.lock();

    let pin = body["pin"].as_str().unwrap_or_default();
    let Some(child) = state.children.iter().find(|c| c.child.login_pin.as_str() == pin) else {
        return detail(StatusCode::NOT_FOUND, "Invalid PIN");
    };
    if !child.child.is_active {
        return detail(StatusCode::FORBIDDEN, "Profile is deactivated");
    }

    let parent_name = state
        .users
        .iter()
        .find(|u| u.id == child.child.parent_id)
        .and_then(|u| u.display_name.clone());

    ok(&KidSession {
        child_id: child.child.id,
        child_name: child.child.name.clone(),
        age: child.child.age,
        avatar_id: child.child.avatar_id.clone(),
        daily_limit: child.child.daily_message_limit,
        messages_remaining: child
            .child
            .daily_message_limit
            .saturating_sub(child.child.messages_today),
        can_send_message: child.can_send_message,
        parent_name,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Children handlers
// ─────────────────────────────────────────────────────────────────────────────

fn parent_id(params: &HashMap<String, String>) -> UserId {
    UserId::new(
        params
            .get("parent_id")
            .and_then(|id| id.parse().ok())
            .unwrap_or(-1),
    )
}

async fn list_children(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    let parent = parent_id(&params);
    let children: Vec<&ChildWithStats> = state
        .children
        .iter()
        .filter(|c| c.child.parent_id == parent)
        .collect();
    ok(&children)
}

async fn create_child(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    axum::Json(body): axum::Json<Value>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let mut state = state.lock();
    let parent = parent_id(&params);

    let id = state.next_child_id;
    state.next_child_id += 1;
    let default_limit = state.config.default_daily_limit;
    let child = Child {
        id: ChildId::new(id),
        parent_id: parent,
        name: body["name"].as_str().unwrap_or("child").to_string(),
        age: u8::try_from(body["age"].as_u64().unwrap_or(8)).unwrap_or(8),
        login_pin: generated_pin(id),
        avatar_id: None,
        interests: body["interests"].as_array().map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect()
        }),
        learning_goals: None,
        daily_message_limit: body["daily_message_limit"]
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default_limit),
        messages_today: 0,
        last_message_date: None,
        is_active: true,
        created_at: Utc::now(),
    };
    state.children.push(ChildWithStats {
        child: child.clone(),
        total_conversations: 0,
        total_messages: 0,
        can_send_message: true,
    });
    ok(&child)
}

fn generated_pin(id: i64) -> Pin {
    Pin::parse(&format!("{:06}", 100_000 + id)).expect("generated pin is valid")
}

fn find_child<'a>(
    state: &'a MockState,
    id: i64,
    params: &HashMap<String, String>,
) -> Option<&'a ChildWithStats> {
    let parent = parent_id(params);
    state
        .children
        .iter()
        .find(|c| c.child.id == ChildId::new(id) && c.child.parent_id == parent)
}

async fn get_child(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    match find_child(&state, id, &params) {
        Some(child) => ok(child),
        None => detail(StatusCode::NOT_FOUND, "Child not found"),
    }
}

async fn update_child(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    axum::Json(body): axum::Json<Value>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let mut state = state.lock();
    let parent = parent_id(&params);
    let Some(child) = state
        .children
        .iter_mut()
        .find(|c| c.child.id == ChildId::new(id) && c.child.parent_id == parent)
    else {
        return detail(StatusCode::NOT_FOUND, "Child not found");
    };

    if let Some(name) = body["name"].as_str() {
        child.child.name = name.to_string();
    }
    if let Some(age) = body["age"].as_u64().and_then(|v| u8::try_from(v).ok()) {
        child.child.age = age;
    }
    if let Some(limit) = body["daily_message_limit"]
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
    {
        child.child.daily_message_limit = limit;
    }
    if let Some(active) = body["is_active"].as_bool() {
        child.child.is_active = active;
    }
    ok(&child.child.clone())
}

async fn delete_child(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let mut state = state.lock();
    let parent = parent_id(&params);
    let before = state.children.len();
    state
        .children
        .retain(|c| !(c.child.id == ChildId::new(id) && c.child.parent_id == parent));
    if state.children.len() == before {
        return detail(StatusCode::NOT_FOUND, "Child not found");
    }
    (StatusCode::OK, axum::Json(json!({ "ok": true })))
}

async fn regenerate_pin(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let mut state = state.lock();
    let parent = parent_id(&params);
    let next = state.next_child_id;
    state.next_child_id += 1;
    let Some(child) = state
        .children
        .iter_mut()
        .find(|c| c.child.id == ChildId::new(id) && c.child.parent_id == parent)
    else {
        return detail(StatusCode::NOT_FOUND, "Child not found");
    };
    child.child.login_pin = generated_pin(next + 500_000);
    ok(&child.child.clone())
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn send_message(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let mut state = state.lock();

    let child_id = ChildId::new(body["child_id"].as_i64().unwrap_or(-1));
    let text = body["message"].as_str().unwrap_or_default().to_string();

    let Some(child) = state.children.iter_mut().find(|c| c.child.id == child_id) else {
        return detail(StatusCode::NOT_FOUND, "Child not found");
    };
    if !child.child.is_active {
        return detail(StatusCode::FORBIDDEN, "Profile is deactivated");
    }
    if child.child.messages_today >= child.child.daily_message_limit {
        return detail(
            StatusCode::TOO_MANY_REQUESTS,
            "Daily message limit reached",
        );
    }
    child.child.messages_today += 1;
    child.total_messages += 1;
    let remaining = child
        .child
        .daily_message_limit
        .saturating_sub(child.child.messages_today);
    child.can_send_message = remaining > 0;

    let conversation_id = body["conversation_id"].as_i64();
    let conversation_id = match conversation_id {
        Some(id) => ConversationId::new(id),
        None => {
            let id = ConversationId::new(state.next_conversation_id);
            state.next_conversation_id += 1;
            state.conversations.push(ConversationWithMessages {
                conversation: Conversation {
                    id,
                    child_id,
                    title: Some(text.chars().take(24).collect()),
                    started_at: Utc::now(),
                    ended_at: None,
                    is_flagged: false,
                    message_count: 0,
                },
                messages: Vec::new(),
            });
            id
        }
    };

    let mut make_message = |role: MessageRole, content: String| {
        let id = MessageId::new(state.next_message_id);
        state.next_message_id += 1;
        Message {
            id,
            conversation_id,
            role,
            content,
            is_flagged: false,
            created_at: Utc::now(),
        }
    };
    let message = make_message(MessageRole::Child, text.clone());
    let response = make_message(MessageRole::Assistant, format!("You asked: {text}"));

    if let Some(conversation) = state
        .conversations
        .iter_mut()
        .find(|c| c.conversation.id == conversation_id)
    {
        conversation.messages.push(message.clone());
        conversation.messages.push(response.clone());
        conversation.conversation.message_count += 2;
    }

    (
        StatusCode::OK,
        axum::Json(json!({
            "conversation_id": conversation_id,
            "message": message,
            "response": response,
            "messages_remaining_today": remaining,
            "safety_note": null,
        })),
    )
}

async fn today_stats(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    let Some(child) = state
        .children
        .iter()
        .find(|c| c.child.id == ChildId::new(id))
    else {
        return detail(StatusCode::NOT_FOUND, "Child not found");
    };
    let remaining = child
        .child
        .daily_message_limit
        .saturating_sub(child.child.messages_today);
    (
        StatusCode::OK,
        axum::Json(json!({
            "child_id": child.child.id,
            "child_name": child.child.name,
            "messages_sent_today": child.child.messages_today,
            "daily_limit": child.child.daily_message_limit,
            "messages_remaining": remaining,
            "can_send_message": remaining > 0,
        })),
    )
}

async fn list_conversations(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    let mut conversations: Vec<&Conversation> = state
        .conversations
        .iter()
        .map(|c| &c.conversation)
        .filter(|c| c.child_id == ChildId::new(id))
        .collect();
    conversations.sort_by(|a, b| {
        b.started_at
            .cmp(&a.started_at)
            .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
    });
    ok(&conversations)
}

async fn get_conversation(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    match state
        .conversations
        .iter()
        .find(|c| c.conversation.id == ConversationId::new(id))
    {
        Some(conversation) => ok(conversation),
        None => detail(StatusCode::NOT_FOUND, "Conversation not found"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn admin_stats(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    if let Err(reply) = require_admin(&state, &params) {
        return reply;
    }

    ok(&AdminStats {
        total_users: state.users.len() as u64,
        total_children: state.children.len() as u64,
        total_conversations: state.conversations.len() as u64,
        total_messages: state
            .conversations
            .iter()
            .map(|c| u64::from(c.conversation.message_count))
            .sum(),
        messages_today: state
            .children
            .iter()
            .map(|c| u64::from(c.child.messages_today))
            .sum(),
        active_users_today: state.users.iter().filter(|u| u.is_active).count() as u64,
        flagged_conversations: state
            .conversations
            .iter()
            .filter(|c| c.conversation.is_flagged)
            .count() as u64,
    })
}

async fn admin_users(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    if let Err(reply) = require_admin(&state, &params) {
        return reply;
    }

    let users: Vec<UserListItem> = state
        .users
        .iter()
        .map(|user| UserListItem {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            subscription_tier: user.subscription_tier,
            is_active: user.is_active,
            created_at: user.created_at,
            children_count: state
                .children
                .iter()
                .filter(|c| c.child.parent_id == user.id)
                .count() as u64,
            total_messages: state
                .children
                .iter()
                .filter(|c| c.child.parent_id == user.id)
                .map(|c| c.total_messages)
                .sum(),
        })
        .collect();
    ok(&users)
}

async fn get_config(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    if let Err(reply) = require_admin(&state, &params) {
        return reply;
    }
    ok(&state.config)
}

async fn update_config(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    axum::Json(body): axum::Json<Value>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let mut state = state.lock();
    if let Err(reply) = require_admin(&state, &params) {
        return reply;
    }
    match serde_json::from_value::<SystemConfig>(body) {
        Ok(config) => {
            state.config = config;
            ok(&state.config)
        }
        Err(_) => detail(StatusCode::UNPROCESSABLE_ENTITY, "invalid configuration"),
    }
}

async fn flagged_conversations(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let state = state.lock();
    if let Err(reply) = require_admin(&state, &params) {
        return reply;
    }

    let flagged: Vec<Value> = state
        .conversations
        .iter()
        .filter(|c| c.conversation.is_flagged)
        .map(|c| {
            let child = state
                .children
                .iter()
                .find(|ch| ch.child.id == c.conversation.child_id);
            let parent = child.and_then(|ch| {
                state.users.iter().find(|u| u.id == ch.child.parent_id)
            });
            let mut value =
                serde_json::to_value(&c.conversation).expect("conversation serializes");
            value["child_name"] = json!(child.map_or("", |ch| ch.child.name.as_str()));
            value["parent_email"] =
                json!(parent.map_or("unknown@example.com", |p| p.email.as_str()));
            value
        })
        .collect();
    ok(&flagged)
}

async fn set_subscription(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let mut state = state.lock();
    if let Err(reply) = require_admin(&state, &params) {
        return reply;
    }

    let Some(tier) = params
        .get("tier")
        .and_then(|t| t.parse::<SubscriptionTier>().ok())
    else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "invalid tier");
    };
    let Some(user) = state
        .users
        .iter_mut()
        .find(|u| u.id == UserId::new(id))
    else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    user.subscription_tier = tier;
    (StatusCode::OK, axum::Json(json!({ "ok": true })))
}

async fn toggle_active(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = check_auth(&state, &headers) {
        return reply;
    }
    let mut state = state.lock();
    if let Err(reply) = require_admin(&state, &params) {
        return reply;
    }
    let Some(user) = state
        .users
        .iter_mut()
        .find(|u| u.id == UserId::new(id))
    else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    user.is_active = !user.is_active;
    (StatusCode::OK, axum::Json(json!({ "ok": true })))
}

async fn create_admin(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let mut state = state.lock();
    if state.users.iter().any(|u| u.role.is_admin()) {
        return detail(StatusCode::BAD_REQUEST, "Admin account already exists");
    }

    let Some(email) = params
        .get("email")
        .and_then(|e| Email::parse(e).ok())
    else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "invalid email");
    };
    let id = state.next_user_id;
    state.next_user_id += 1;
    let user = User {
        id: UserId::new(id),
        email,
        display_name: params.get("display_name").cloned(),
        role: Role::Admin,
        subscription_tier: SubscriptionTier::Free,
        is_active: true,
        created_at: Utc::now(),
    };
    state.users.push(user.clone());
    ok(&user)
}
