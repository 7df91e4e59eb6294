//! PostgREST access to the `profiles` table.

use async_trait::async_trait;
use reqwest::Method;
use secrecy::SecretString;
use serde_json::value::RawValue;

use autodromo_core::{NewProfile, UserId};

use super::{SupabaseClient, error_message};
use crate::services::{ProfileStore, ProfileStoreError};

const PROFILES_PATH: &str = "rest/v1/profiles";

impl SupabaseClient {
    /// POST a row to `profiles` with the given `Prefer` header.
    async fn write_profile(
        &self,
        profile: &NewProfile,
        access_token: Option<&SecretString>,
        prefer: &'static str,
    ) -> Result<(), ProfileStoreError> {
        let url = self.profiles_url()?;
        let response = self
            .request(Method::POST, url, access_token)
            .header("Prefer", prefer)
            .json(profile)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProfileStoreError::Api {
                status: status.as_u16(),
                message: error_message(status, response).await,
            });
        }
        Ok(())
    }

    fn profiles_url(&self) -> Result<url::Url, url::ParseError> {
        self.endpoint(PROFILES_PATH)
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn insert(
        &self,
        profile: &NewProfile,
        access_token: Option<&SecretString>,
    ) -> Result<(), ProfileStoreError> {
        self.write_profile(profile, access_token, "return=minimal")
            .await
    }

    async fn upsert(
        &self,
        profile: &NewProfile,
        access_token: Option<&SecretString>,
    ) -> Result<(), ProfileStoreError> {
        self.write_profile(
            profile,
            access_token,
            "resolution=merge-duplicates,return=minimal",
        )
        .await
    }

    async fn find_by_id(
        &self,
        id: &UserId,
        access_token: Option<&SecretString>,
    ) -> Result<Box<RawValue>, ProfileStoreError> {
        let mut url = self.profiles_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"));

        let response = self
            .request(Method::GET, url, access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProfileStoreError::Api {
                status: status.as_u16(),
                message: error_message(status, response).await,
            });
        }

        // Only checked to be JSON; the body is relayed as-is
        let body = response.text().await?;
        Ok(RawValue::from_string(body)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use autodromo_core::Email;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::SupabaseConfig;

    const API_KEY: &str = "service-key-for-tests";

    fn client_for(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: Url::parse(&server.uri()).unwrap(),
            api_key: SecretString::from(API_KEY.to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn profile() -> NewProfile {
        NewProfile {
            id: UserId::new("u-1"),
            email: Email::parse("alain@prost.fr").unwrap(),
            username: "alain".to_string(),
            favorite_car: Some("McLaren MP4/4".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_posts_row_with_user_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(header("apikey", API_KEY))
            .and(header("authorization", "Bearer jwt-user"))
            .and(header("prefer", "return=minimal"))
            .and(body_json(json!({
                "id": "u-1",
                "email": "alain@prost.fr",
                "username": "alain",
                "favorite_car": "McLaren MP4/4",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let token = SecretString::from("jwt-user".to_string());
        client_for(&server)
            .insert(&profile(), Some(&token))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upsert_merges_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(header("prefer", "resolution=merge-duplicates,return=minimal"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).upsert(&profile(), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_without_token_falls_back_to_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(header("authorization", format!("Bearer {API_KEY}").as_str()))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).insert(&profile(), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_policy_violation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "42501",
                "details": null,
                "hint": null,
                "message": "new row violates row-level security policy for table \"profiles\"",
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).insert(&profile(), None).await.unwrap_err();

        match err {
            ProfileStoreError::Api { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("row-level security"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_filters_on_id_and_keeps_body() {
        let body = r#"[{"id":"u-1","email":"alain@prost.fr","username":"alain","favorite_car":null,"created_at":"2024-05-01T12:30:00.123456+00:00","team":"McLaren"}]"#;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("select", "*"))
            .and(query_param("id", "eq.u-1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let rows = client_for(&server)
            .find_by_id(&UserId::new("u-1"), None)
            .await
            .unwrap();

        assert_eq!(rows.get(), body);
    }

    #[tokio::test]
    async fn test_find_by_id_no_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let rows = client_for(&server)
            .find_by_id(&UserId::new("missing"), None)
            .await
            .unwrap();

        assert_eq!(rows.get(), "[]");
    }

    #[tokio::test]
    async fn test_find_by_id_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .find_by_id(&UserId::new("u-1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ProfileStoreError::Parse(_)));
    }
}
