//! End-to-end pipeline behavior: stage ordering, short-circuits, ban
//! propagation, and per-route admission.

mod common;

use std::time::Duration;

use common::{build_world, client_ip};
use photo_gateway::admission::AdmissionError;
use photo_gateway::auth::AuthError;
use photo_gateway::directory::{Role, UserDirectory};
use photo_gateway::policy::{Action, AuthzError};
use photo_gateway::{GatewayError, GatewayRequest};

fn request(token: Option<uuid::Uuid>, route: &str, action: Action) -> GatewayRequest {
    GatewayRequest {
        access_token: token,
        client_ip: client_ip(),
        route: route.into(),
        action,
    }
}

#[tokio::test]
async fn login_validate_roundtrip_resolves_the_identity() {
    let world = build_world(Duration::ZERO);
    let user_id = world.register("alice", "correct horse", Role::User);
    let (session, _) = world.login("alice", "correct horse").await;

    let ctx = world
        .gateway
        .handle(&request(
            Some(session.id),
            "photos.upload",
            Action::UploadPhoto,
        ))
        .await
        .unwrap();
    assert_eq!(ctx.identity.unwrap().id, user_id);
}

#[tokio::test]
async fn missing_token_on_protected_route_is_rejected() {
    let world = build_world(Duration::ZERO);
    let err = world
        .gateway
        .handle(&request(None, "photos.upload", Action::UploadPhoto))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Auth(AuthError::InvalidCredentials));
}

#[tokio::test]
async fn anonymous_signup_is_admitted_by_ip() {
    let world = build_world(Duration::ZERO);

    for _ in 0..3 {
        world
            .gateway
            .handle(&request(None, "auth.signup", Action::Signup))
            .await
            .unwrap();
    }
    let err = world
        .gateway
        .handle(&request(None, "auth.signup", Action::Signup))
        .await
        .unwrap_err();
    let GatewayError::Admission(AdmissionError::RateLimited { retry_after }) = err else {
        panic!("expected rate limit, got {err:?}");
    };
    assert!(retry_after <= Duration::from_secs(60));

    // The window slides out and admission resumes.
    world.clock.advance(60_001);
    world
        .gateway
        .handle(&request(None, "auth.signup", Action::Signup))
        .await
        .unwrap();
}

#[tokio::test]
async fn forbidden_action_short_circuits_before_admission() {
    let world = build_world(Duration::ZERO);
    world.register("carol", "pw-carol", Role::User);
    let (session, _) = world.login("carol", "pw-carol").await;

    let err = world
        .gateway
        .handle(&request(
            Some(session.id),
            "admin.ban",
            Action::SetBan,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Authz(AuthzError::Forbidden));
}

#[tokio::test]
async fn ban_takes_effect_on_the_next_validated_request() {
    let world = build_world(Duration::ZERO);
    world.register("root", "pw-root", Role::Admin);
    let target_id = world.register("mallory", "pw-mallory", Role::User);

    let (admin_session, _) = world.login("root", "pw-root").await;
    let (target_session, _) = world.login("mallory", "pw-mallory").await;

    // Target is fine before the ban.
    world
        .gateway
        .handle(&request(
            Some(target_session.id),
            "photos.upload",
            Action::UploadPhoto,
        ))
        .await
        .unwrap();

    let admin = world
        .gateway
        .sessions()
        .validate(admin_session.id)
        .await
        .unwrap();
    world
        .gateway
        .policy()
        .set_ban(&admin, target_id, true, Some("abuse"))
        .await
        .unwrap();

    // The still-unexpired token now fails with Banned.
    let err = world
        .gateway
        .handle(&request(
            Some(target_session.id),
            "photos.upload",
            Action::UploadPhoto,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Auth(AuthError::Banned));

    // Unban restores access for a fresh login.
    world
        .gateway
        .policy()
        .set_ban(&admin, target_id, false, None)
        .await
        .unwrap();
    let (new_session, _) = world.login("mallory", "pw-mallory").await;
    world
        .gateway
        .handle(&request(
            Some(new_session.id),
            "photos.upload",
            Action::UploadPhoto,
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn refresh_reuse_poisons_the_whole_family_through_the_gateway() {
    let world = build_world(Duration::ZERO);
    world.register("dave", "pw-dave", Role::User);
    let (_, refresh) = world.login("dave", "pw-dave").await;

    let sessions = world.gateway.sessions();
    let (rotated_session, _) = sessions.refresh(refresh.id).await.unwrap();

    assert_eq!(
        sessions.refresh(refresh.id).await.unwrap_err(),
        AuthError::TokenReused
    );

    let err = world
        .gateway
        .handle(&request(
            Some(rotated_session.id),
            "photos.upload",
            Action::UploadPhoto,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Auth(AuthError::TokenRevoked));
}

#[tokio::test]
async fn expired_token_is_reported_as_expired() {
    let world = build_world(Duration::ZERO);
    world.register("erin", "pw-erin", Role::User);
    let (session, _) = world.login("erin", "pw-erin").await;

    world
        .clock
        .advance(world.config.auth.access_ttl_secs * 1_000);

    let err = world
        .gateway
        .handle(&request(
            Some(session.id),
            "photos.upload",
            Action::UploadPhoto,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Auth(AuthError::TokenExpired));
}

#[tokio::test]
async fn banned_caller_keeps_profile_access_through_the_pipeline() {
    let world = build_world(Duration::ZERO);
    world.register("root", "pw-root", Role::Admin);
    let target_id = world.register("frank", "pw-frank", Role::User);
    let (admin_session, _) = world.login("root", "pw-root").await;
    world.login("frank", "pw-frank").await;

    let admin = world
        .gateway
        .sessions()
        .validate(admin_session.id)
        .await
        .unwrap();
    world
        .gateway
        .policy()
        .set_ban(&admin, target_id, true, Some("spam"))
        .await
        .unwrap();

    // Banned identities cannot validate a token at all; the profile and
    // appeal surface operates on directory state, which authorize still
    // permits for a banned identity.
    let banned = world.directory.get(target_id).await.unwrap();
    assert!(world
        .gateway
        .policy()
        .authorize(&banned, Action::ViewProfile)
        .is_ok());
    assert!(world
        .gateway
        .policy()
        .authorize(&banned, Action::AppealBan)
        .is_ok());
    assert_eq!(
        world
            .gateway
            .policy()
            .authorize(&banned, Action::UploadPhoto)
            .unwrap_err(),
        AuthzError::Forbidden
    );
}
