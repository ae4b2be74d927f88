// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Races on the shared stores: duplicate callbacks and duplicate refreshes.

mod common;

const NUM_CONCURRENT_REQUESTS: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callbacks_create_one_user() {
    let app = common::test_state();

    let mut handles = vec![];
    for _ in 0..NUM_CONCURRENT_REQUESTS {
        let state = app.state.clone();
        handles.push(tokio::spawn(async move {
            state.auth.handle_callback("abc").await
        }));
    }

    let mut user_ids = vec![];
    for handle in handles {
        let pair = handle
            .await
            .expect("Task join failed")
            .expect("Callback failed");
        let user = app
            .state
            .auth
            .validate_access_token(&pair.access_token)
            .await
            .expect("Access token rejected");
        user_ids.push(user.id);
    }

    assert_eq!(app.users.len().await, 1, "Duplicate users created by race");
    assert_eq!(app.tokens.len().await, NUM_CONCURRENT_REQUESTS);
    assert!(user_ids.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_single_winner() {
    let app = common::test_state();
    let login = app.state.auth.handle_callback("abc").await.unwrap();

    let mut handles = vec![];
    for _ in 0..NUM_CONCURRENT_REQUESTS {
        let state = app.state.clone();
        let secret = login.refresh_token.clone();
        handles.push(tokio::spawn(async move { state.auth.refresh(&secret).await }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("Task join failed") {
            Ok(_) => successes += 1,
            Err(e) => assert!(e.is_not_found(), "unexpected error: {}", e),
        }
    }

    assert_eq!(successes, 1, "A refresh token was redeemed more than once");
    assert_eq!(app.tokens.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_and_logout() {
    let app = common::test_state();
    let login = app.state.auth.handle_callback("abc").await.unwrap();

    let refresh = {
        let state = app.state.clone();
        let secret = login.refresh_token.clone();
        tokio::spawn(async move { state.auth.refresh(&secret).await })
    };
    let logout = {
        let state = app.state.clone();
        let secret = login.refresh_token.clone();
        tokio::spawn(async move { state.auth.logout(&secret).await })
    };

    let refreshed = refresh.await.expect("Task join failed");
    let logged_out = logout.await.expect("Task join failed");

    // Whichever ran second sees the record gone.
    assert!(refreshed.is_ok() ^ logged_out.is_ok());
    let expected_records = usize::from(refreshed.is_ok());
    assert_eq!(app.tokens.len().await, expected_records);
}
