//! Per-user serialization and cross-user isolation under concurrent load.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use backdrop_bot::models::action::OutboundAction;
use backdrop_bot::models::session::Rgb;

use super::test_helpers::{say, send_photo, test_env, test_env_with, transparent_photo, SlowCutout};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn users_progress_independently() {
    let env = test_env();
    let users: Vec<String> = (0..8).map(|i| format!("U{i}")).collect();

    let mut handles = Vec::new();
    for (index, user) in users.iter().enumerate() {
        let bot = Arc::clone(&env.bot);
        let user = user.clone();
        let color = if index % 2 == 0 { "Red" } else { "Blue" };
        handles.push(tokio::spawn(async move {
            for text in ["Choose background", "Color", color] {
                say(&bot, &user, text).await;
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task");
    }

    for (index, user) in users.iter().enumerate() {
        let expected = if index % 2 == 0 {
            Rgb(255, 0, 0)
        } else {
            Rgb(0, 0, 255)
        };
        assert_eq!(env.bot.session(user).color(), Some(expected), "{user}");
    }
    assert_eq!(env.bot.session_count(), users.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn events_for_one_user_run_one_at_a_time() {
    let cutout = Arc::new(SlowCutout::default());
    let env = test_env_with(cutout.clone(), 4);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let bot = Arc::clone(&env.bot);
        handles.push(tokio::spawn(async move {
            send_photo(&bot, "U1", transparent_photo()).await
        }));
    }
    for handle in handles {
        let actions = handle.await.expect("task");
        assert!(matches!(actions[..], [OutboundAction::DeliverImage { .. }]));
    }

    assert_eq!(cutout.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn composite_jobs_respect_global_limit() {
    let cutout = Arc::new(SlowCutout::default());
    let env = test_env_with(cutout.clone(), 2);

    let mut handles = Vec::new();
    for i in 0..6 {
        let bot = Arc::clone(&env.bot);
        handles.push(tokio::spawn(async move {
            send_photo(&bot, &format!("U{i}"), transparent_photo()).await
        }));
    }
    for handle in handles {
        let actions = handle.await.expect("task");
        assert!(matches!(actions[..], [OutboundAction::DeliverImage { .. }]));
    }

    assert!(cutout.peak.load(Ordering::SeqCst) <= 2);
}
