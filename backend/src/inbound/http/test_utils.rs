//! Test helpers for inbound HTTP components.
//!
//! [`TestContext`] wires the real services over the in-memory adapter and a
//! controllable clock, so handler tests exercise the full request path.

use std::collections::HashSet;
use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self as actix_test, TestRequest};
use actix_web::{App, Error as ActixError, web};
use serde_json::{Value, json};

use crate::Trace;
use crate::domain::ports::UserRepository;
use crate::domain::{
    Bio, Email, Nickname, Password, ProfileTheme, User, UserId, derive_anonymous_name,
};
use crate::inbound::http::configure;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::MemoryStore;
use crate::test_support::{MutableClock, fixed_now};

/// Password every helper-created account uses.
pub const TEST_PASSWORD: &str = "correct horse";

/// Build a session middleware configured for tests.
///
/// The cookie is named `session` and is not marked `Secure` so plain HTTP
/// test requests carry it.
pub fn test_session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// A signed-in account created through the API.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub cookie: Cookie<'static>,
}

/// Services over a fresh in-memory store.
pub struct TestContext {
    pub store: MemoryStore,
    pub clock: Arc<MutableClock>,
    pub state: HttpState,
    key: Key,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_admins(MemoryStore::new(), HashSet::new())
    }

    /// Seed an administrator directly in the store and return their email.
    pub async fn with_admin(nickname: &str) -> (Self, String) {
        let store = MemoryStore::new();
        let user = account(nickname);
        let email = user.email.as_str().to_owned();
        UserRepository::insert(&store, &user)
            .await
            .expect("seed admin user");
        let ctx = Self::with_admins(store, HashSet::from([user.id]));
        (ctx, email)
    }

    fn with_admins(store: MemoryStore, admins: HashSet<UserId>) -> Self {
        let clock = Arc::new(MutableClock::new(fixed_now()));
        let ports = HttpStatePorts {
            users: Arc::new(store.clone()),
            journals: Arc::new(store.clone()),
            engagement: Arc::new(store.clone()),
            comments: Arc::new(store.clone()),
            subscriptions: Arc::new(store.clone()),
            mails: Arc::new(store.clone()),
        };
        let state = HttpState::new(ports, clock.clone(), admins);
        Self {
            store,
            clock,
            state,
            key: Key::generate(),
        }
    }

    /// The `/api/v1` application as the server mounts it.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = ActixError,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(test_session_middleware(self.key.clone()))
                    .configure(configure),
            )
    }

    /// Sign up `nickname` with a derived email and return the session.
    ///
    /// The email is the lowercased nickname with spaces replaced by `_`.
    pub async fn signup<S, B>(&self, app: &S, nickname: &str) -> TestUser
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = ActixError>,
        B: MessageBody,
    {
        let res = actix_test::call_service(
            app,
            json_request(
                TestRequest::post(),
                "/api/v1/signup",
                json!({
                    "nickname": nickname,
                    "email": email_for(nickname),
                    "password": TEST_PASSWORD,
                }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED, "signup {nickname}");
        let cookie = session_cookie(&res).expect("signup sets a session cookie");
        let body = read_json(res).await;
        let id = body["id"].as_str().expect("profile id").to_owned();
        TestUser { id, cookie }
    }

    /// Log in with `email` and the shared test password.
    pub async fn login<S, B>(&self, app: &S, email: &str) -> TestUser
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = ActixError>,
        B: MessageBody,
    {
        let res = actix_test::call_service(
            app,
            json_request(
                TestRequest::post(),
                "/api/v1/login",
                json!({ "email": email, "password": TEST_PASSWORD }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK, "login {email}");
        let cookie = session_cookie(&res).expect("login sets a session cookie");
        let id = read_json(res).await["userId"]
            .as_str()
            .expect("user id")
            .to_owned();
        TestUser { id, cookie }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn email_for(nickname: &str) -> String {
    format!("{}@example.com", nickname.to_lowercase().replace(' ', "_"))
}

fn account(nickname: &str) -> User {
    let nickname = Nickname::new(nickname).expect("valid nickname");
    let password_hash = Password::new(TEST_PASSWORD)
        .expect("valid password")
        .hash()
        .expect("hash password");
    let anonymous_name = derive_anonymous_name(&nickname, &password_hash);
    let email = Email::new(email_for(nickname.as_str())).expect("valid email");
    let now = fixed_now();
    User {
        id: UserId::random(),
        nickname,
        email,
        password_hash,
        age: None,
        gender: None,
        anonymous_name,
        profile_theme: ProfileTheme::default(),
        coins: 0,
        bio: Bio::default(),
        last_notification_check: now,
        created_at: now,
    }
}

/// Attach `body` as JSON to `req` aimed at `uri`.
pub fn json_request(req: TestRequest, uri: &str, body: Value) -> Request {
    req.uri(uri).set_json(body).to_request()
}

/// Same as [`json_request`] but carrying `cookie`.
pub fn authed_json(req: TestRequest, uri: &str, cookie: &Cookie<'static>, body: Value) -> Request {
    req.uri(uri).cookie(cookie.clone()).set_json(body).to_request()
}

/// A body-less request carrying `cookie`.
pub fn authed(req: TestRequest, uri: &str, cookie: &Cookie<'static>) -> Request {
    req.uri(uri).cookie(cookie.clone()).to_request()
}

pub async fn read_json<B: MessageBody>(res: ServiceResponse<B>) -> Value {
    let bytes = actix_test::read_body(res).await;
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

/// The `session` cookie set by `res`, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}
