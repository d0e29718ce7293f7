/*!
Test Harness pour l'API HTTP mjfleet

Facilite l'écriture de tests de routes avec:
- Appels en mémoire sur un `Router` axum (pas de socket)
- Décodage JSON automatique des réponses
- Assertions sur des champs imbriqués (`machines.0.id`)
*/

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

/// Taille max d'une réponse lue par le harness
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Harness de test autour d'un routeur déjà construit
pub struct TestHarness {
    router: Router,
}

impl TestHarness {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// GET sans header ; corps non JSON => `Value::Null`
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.call("GET", path, &[], None).await
    }

    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> (StatusCode, Value) {
        self.call("GET", path, &[(name, value)], None).await
    }

    /// Appel générique : méthode, chemin, headers, corps JSON optionnel
    pub async fn call(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let req = builder.body(body).expect("valid test request");

        let resp = self.router.clone().oneshot(req).await.expect("router is infallible");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), MAX_BODY_BYTES)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Assert qu'un champ a une valeur spécifique
    pub fn assert_field_equals(&self, body: &Value, field_path: &str, expected: &Value) -> Result<()> {
        match get_nested_field(body, field_path) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => anyhow::bail!(
                "Field '{}' mismatch: expected {:?}, got {:?}",
                field_path,
                expected,
                actual
            ),
            None => anyhow::bail!("Field '{}' not found", field_path),
        }
    }
}

/// Chemin pointé : clés d'objet ou index de tableau (`rows.0.id`)
pub fn get_nested_field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        current = match current {
            Value::Object(obj) => obj.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
