//! Client-side stores.
//!
//! DESIGN
//! ======
//! Each store is a plain struct owned by the UI task and mutated through
//! `&mut self` actions; nothing is shared across threads, so there are no
//! locks. Async actions are awaited one at a time by the caller.

pub mod board;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers {
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    /// Unsigned JWT carrying `claims` as its payload.
    pub fn make_token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    pub fn admin_token() -> String {
        make_token(&json!({
            "sub": "admin@test.com",
            "id": 1,
            "name": "Admin User",
            "email": "admin@test.com",
            "role": "admin",
            "exp": 4_102_444_800_i64
        }))
    }

    pub fn worker_token() -> String {
        make_token(&json!({
            "sub": "worker@test.com",
            "id": 2,
            "name": "Worker Bee",
            "email": "worker@test.com",
            "role": "WORKER",
            "exp": 4_102_444_800_i64
        }))
    }
}
