mod common;

use storefront_api::{
    dto::auth::{CredentialsRequest, OAuthProfile},
    error::AppError,
    services::auth_service,
};

fn credentials(email: &str, password: &str) -> CredentialsRequest {
    CredentialsRequest {
        email: email.to_string(),
        password: password.to_string(),
        name: "Ana".to_string(),
    }
}

#[tokio::test]
async fn unknown_email_signs_up_and_then_signs_in() -> anyhow::Result<()> {
    let (state, _) = common::test_state().await?;

    let first =
        auth_service::authenticate_with_credentials(&state, credentials("ana@shop.test", "pw-1"))
            .await?;
    let second =
        auth_service::authenticate_with_credentials(&state, credentials("ana@shop.test", "pw-1"))
            .await?;

    assert_eq!(first.id, second.id);
    assert_eq!(first.role, "user");
    assert_eq!(second.name, "Ana");
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> anyhow::Result<()> {
    let (state, _) = common::test_state().await?;
    auth_service::authenticate_with_credentials(&state, credentials("ana@shop.test", "pw-1"))
        .await?;

    let result =
        auth_service::authenticate_with_credentials(&state, credentials("ana@shop.test", "pw-2"))
            .await;
    assert!(matches!(result, Err(AppError::InvalidCredentials)));
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_rejected_before_lookup() -> anyhow::Result<()> {
    let (state, _) = common::test_state().await?;

    let result = auth_service::authenticate_with_credentials(
        &state,
        CredentialsRequest {
            email: "ana@shop.test".into(),
            password: "pw".into(),
            name: "   ".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::MissingField)));
    assert_eq!(
        common::count(&state, storefront_api::entity::users::Entity).await?,
        0
    );
    Ok(())
}

#[tokio::test]
async fn social_account_cannot_use_password_login() -> anyhow::Result<()> {
    let (state, _) = common::test_state().await?;
    let profile = OAuthProfile {
        email: Some("bia@shop.test".into()),
        name: Some("Bia".into()),
        picture: None,
    };
    auth_service::sign_in_with_profile(&state, profile, None).await?;

    let result =
        auth_service::authenticate_with_credentials(&state, credentials("bia@shop.test", "pw"))
            .await;
    assert!(matches!(result, Err(AppError::SocialOnlyAccount)));
    Ok(())
}

#[tokio::test]
async fn oauth_sign_in_assigns_admin_role_and_provider_picture() -> anyhow::Result<()> {
    let (state, _) = common::test_state().await?;
    let normalized = OAuthProfile {
        email: Some(common::ADMIN_EMAIL.to_uppercase()),
        name: Some("Owner".into()),
        picture: Some("https://img.test/normalized.png".into()),
    };
    let provider = OAuthProfile {
        email: Some("ignored@shop.test".into()),
        name: Some("Ignored".into()),
        picture: Some("https://img.test/provider.png".into()),
    };

    let user = auth_service::sign_in_with_profile(&state, normalized, Some(provider)).await?;
    assert_eq!(user.role, "admin");
    assert_eq!(user.name, "Owner");
    assert_eq!(user.image, "https://img.test/provider.png");

    let again = auth_service::sign_in_with_profile(
        &state,
        OAuthProfile {
            email: Some(common::ADMIN_EMAIL.to_uppercase()),
            ..Default::default()
        },
        None,
    )
    .await?;
    assert_eq!(again.id, user.id);
    Ok(())
}

#[tokio::test]
async fn oauth_profile_without_email_is_rejected() -> anyhow::Result<()> {
    let (state, _) = common::test_state().await?;
    let result = auth_service::sign_in_with_profile(&state, OAuthProfile::default(), None).await;
    assert!(matches!(result, Err(AppError::MissingEmail)));
    Ok(())
}

#[tokio::test]
async fn session_token_round_trips_identity() -> anyhow::Result<()> {
    let (state, _) = common::test_state().await?;
    let user = common::sign_in(&state, "carla@shop.test").await?;

    let view = state.sessions.materialize(&user.claims);
    assert_eq!(view.user.id, user.user_id.to_string());
    assert_eq!(view.user.email, "carla@shop.test");
    assert_eq!(view.user.image, None);

    let refreshed = state.sessions.refresh(&user.claims)?;
    let claims = state.sessions.verify(&refreshed)?;
    assert_eq!(claims.sub, user.claims.sub);
    assert!(claims.exp >= user.claims.exp);

    assert!(matches!(
        state.sessions.verify("not-a-token"),
        Err(AppError::Unauthenticated)
    ));
    Ok(())
}

#[tokio::test]
async fn concurrent_first_sign_ins_resolve_to_one_account() -> anyhow::Result<()> {
    let (state, _) = common::test_state().await?;
    let profile = || OAuthProfile {
        email: Some("dora@shop.test".into()),
        name: Some("Dora".into()),
        picture: None,
    };

    let (first, second) = tokio::join!(
        auth_service::sign_in_with_profile(&state, profile(), None),
        auth_service::sign_in_with_profile(&state, profile(), None),
    );

    assert_eq!(first?.id, second?.id);
    assert_eq!(
        common::count(&state, storefront_api::entity::users::Entity).await?,
        1
    );
    Ok(())
}
