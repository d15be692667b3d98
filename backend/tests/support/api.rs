//! In-process client for the `/api/v1` surface over the in-memory store.
//!
//! Integration suites build one [`TestApi`] per test (or scenario), then
//! drive the real handlers with session cookies exactly as a browser would.

use std::collections::HashSet;
use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use actix_web::test::{self as actix_test, TestRequest};
use actix_web::{App, Error as ActixError, web};
use backend::Trace;
use backend::inbound::http::configure;
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::outbound::memory::MemoryStore;
use mockable::DefaultClock;
use serde_json::{Value, json};

pub const PASSWORD: &str = "correct horse battery";

/// A signed-in account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub cookie: Cookie<'static>,
}

/// Services plus the session key, shared across requests.
#[derive(Clone)]
pub struct TestApi {
    pub store: MemoryStore,
    state: HttpState,
    key: Key,
}

/// Status and JSON body of one call; `Value::Null` for empty bodies.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub cookie: Option<Cookie<'static>>,
}

impl TestApi {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let ports = HttpStatePorts {
            users: Arc::new(store.clone()),
            journals: Arc::new(store.clone()),
            engagement: Arc::new(store.clone()),
            comments: Arc::new(store.clone()),
            subscriptions: Arc::new(store.clone()),
            mails: Arc::new(store.clone()),
        };
        Self {
            store,
            state: HttpState::new(ports, Arc::new(DefaultClock), HashSet::new()),
            key: Key::generate(),
        }
    }

    fn app(
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
        let session = SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build();
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .wrap(Trace)
            .service(web::scope("/api/v1").wrap(session).configure(configure))
    }

    /// Send one request through a freshly initialised app.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&Cookie<'static>>,
        body: Option<Value>,
    ) -> Reply {
        let app = actix_test::init_service(self.app()).await;
        let mut req = TestRequest::default().method(method).uri(uri);
        if let Some(cookie) = cookie {
            req = req.cookie(cookie.clone());
        }
        if let Some(body) = body {
            req = req.set_json(body);
        }
        let res = actix_test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(Cookie::into_owned);
        let bytes = actix_test::read_body(res).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };
        Reply {
            status,
            body,
            cookie,
        }
    }

    pub async fn get(&self, uri: &str, account: Option<&Account>) -> Reply {
        self.call(Method::GET, uri, account.map(|a| &a.cookie), None)
            .await
    }

    pub async fn post(&self, uri: &str, account: &Account, body: Option<Value>) -> Reply {
        self.call(Method::POST, uri, Some(&account.cookie), body)
            .await
    }

    pub async fn delete(&self, uri: &str, account: &Account) -> Reply {
        self.call(Method::DELETE, uri, Some(&account.cookie), None)
            .await
    }

    /// Register `nickname` and keep its session.
    pub async fn signup(&self, nickname: &str) -> Account {
        let email = format!("{}@example.com", nickname.to_lowercase().replace(' ', "."));
        let reply = self
            .call(
                Method::POST,
                "/api/v1/signup",
                None,
                Some(json!({ "nickname": nickname, "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "signup {nickname}");
        Account {
            id: reply.body["id"].as_str().expect("user id").to_owned(),
            cookie: reply.cookie.expect("signup sets a session"),
        }
    }

    /// Publish a public entry and return its id.
    pub async fn publish(&self, author: &Account, title: &str, tags: &[&str]) -> String {
        let reply = self
            .post(
                "/api/v1/journals",
                author,
                Some(json!({
                    "title": title,
                    "content": format!("{title} body"),
                    "tags": tags,
                    "isPublic": true,
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "publish {title}");
        reply.body["id"].as_str().expect("journal id").to_owned()
    }

    /// Slug of the entry with `id`, looked up through the author's own list.
    pub async fn slug_of(&self, author: &Account, id: &str) -> String {
        let reply = self.get("/api/v1/journals/mine?limit=50", Some(author)).await;
        reply.body["journals"]
            .as_array()
            .and_then(|items| items.iter().find(|item| item["id"] == id))
            .and_then(|item| item["slug"].as_str())
            .expect("slug of own entry")
            .to_owned()
    }
}

impl Default for TestApi {
    fn default() -> Self {
        Self::new()
    }
}
