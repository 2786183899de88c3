/// Authentication service tests
/// Tests JWT generation, password hashing, token validation
mod common;

use common::create_test_auth_service;
use ensemble_club::PasswordHasher;
use ensemble_core::UserId;
use ensemble_server::services::auth::AuthService;

/// Test password hashing produces valid bcrypt hashes
#[tokio::test]
async fn test_password_hashing() {
    let auth_service = create_test_auth_service();

    let password = "MySecurePassword123!";
    let hash = auth_service.hash_password(password).unwrap();

    // Verify hash format (bcrypt starts with $2b$ or $2a$)
    assert!(hash.starts_with("$2b$") || hash.starts_with("$2a$"));
    assert!(hash.len() > 50);

    // Verify the hash is different each time (salt is random)
    let hash2 = auth_service.hash_password(password).unwrap();
    assert_ne!(hash, hash2, "Hashes should differ due to random salt");
}

/// Test password verification with correct and incorrect passwords
#[tokio::test]
async fn test_password_verification() {
    let auth_service = create_test_auth_service();

    let hash = auth_service.hash_password("MySecurePassword123!").unwrap();

    assert!(auth_service
        .verify_password("MySecurePassword123!", &hash)
        .unwrap());
    assert!(!auth_service.verify_password("WrongPassword", &hash).unwrap());
}

/// Test the direct check errors on a malformed hash
#[tokio::test]
async fn test_password_verification_invalid_hash() {
    let auth_service = create_test_auth_service();

    let result = auth_service.verify_password("password", "not-a-valid-hash");
    assert!(result.is_err(), "Invalid hash should return error");
}

/// Test the club-facing hasher treats a malformed hash as a mismatch
#[tokio::test]
async fn test_hasher_malformed_hash_is_mismatch() {
    let auth_service = create_test_auth_service();

    // Old DJB2-style digest
    let verified = PasswordHasher::verify(&auth_service, "password", "h_4d2a91f0")
        .await
        .unwrap();
    assert!(!verified);

    let hash = PasswordHasher::hash(&auth_service, "pw").await.unwrap();
    assert!(PasswordHasher::verify(&auth_service, "pw", &hash)
        .await
        .unwrap());
}

/// Test JWT access and refresh tokens round-trip their subject
#[tokio::test]
async fn test_token_generation_and_validation() {
    let auth_service = create_test_auth_service();
    let user_id = UserId::new("user123");

    let token = auth_service.create_access_token(&user_id).unwrap();
    assert!(!token.is_empty(), "Token should not be empty");
    assert_eq!(auth_service.verify_access_token(&token).unwrap(), user_id);

    let token = auth_service.create_refresh_token(&user_id).unwrap();
    assert_eq!(auth_service.verify_refresh_token(&token).unwrap(), user_id);
}

/// Test that access and refresh tokens are not interchangeable
#[tokio::test]
async fn test_token_type_enforcement() {
    let auth_service = create_test_auth_service();
    let user_id = UserId::new("user123");

    let access_token = auth_service.create_access_token(&user_id).unwrap();
    assert!(
        auth_service.verify_refresh_token(&access_token).is_err(),
        "Access token should not validate as refresh token"
    );

    let refresh_token = auth_service.create_refresh_token(&user_id).unwrap();
    assert!(
        auth_service.verify_access_token(&refresh_token).is_err(),
        "Refresh token should not validate as access token"
    );
}

/// Test token validation with invalid signature
#[tokio::test]
async fn test_token_validation_invalid_signature() {
    let auth_service = create_test_auth_service();

    let other_auth = AuthService::new("different-secret".to_string(), 1, 1);
    let token = other_auth
        .create_access_token(&UserId::new("user123"))
        .unwrap();

    let result = auth_service.verify_access_token(&token);
    assert!(result.is_err(), "Token with wrong signature should fail validation");
}

/// Test token validation with malformed or empty tokens
#[tokio::test]
async fn test_token_validation_malformed() {
    let auth_service = create_test_auth_service();

    assert!(auth_service.verify_access_token("not.a.valid.jwt.token").is_err());
    assert!(auth_service.verify_access_token("").is_err());
}
