// tests/matchmaking_tests.rs

mod common;

use alt3r::models::{Gender, Interest};
use alt3r::payments::stars;
use alt3r::store::ProfileStore;
use alt3r::transport::EventKind;
use chrono::Utc;
use common::{event, register, send, send_lossy, test_state};

#[tokio::test]
async fn registration_commits_a_complete_profile() {
    let (state, store, transport) = test_state();

    let user = register(&state, 1, "Парень", "Девушки", "Москва").await;

    assert!(user.profile_complete);
    assert_eq!(user.age, Some(25));
    assert_eq!(user.gender, Some(Gender::Male));
    assert_eq!(user.interest, Some(Interest::Female));
    assert_eq!(user.city.as_deref(), Some("Москва"));
    assert_eq!(user.photos, vec!["photo_1".to_string()]);

    let texts = transport.texts_to(1);
    assert!(texts.iter().any(|t| t.contains("Анкета сохранена")));
    assert!(texts.iter().any(|t| t.contains("Главное меню")));

    // Nothing half-written along the way: the store only ever saw the
    // language and the final commit.
    let stored = store.get(1).await.unwrap().unwrap();
    assert!(stored.profile_complete);
}

#[tokio::test]
async fn rejected_age_reprompts_without_advancing() {
    let (state, store, transport) = test_state();

    send(&state, 1, EventKind::Command("/start".to_string())).await;
    send(&state, 1, EventKind::Callback("lang_ru".to_string())).await;
    send(&state, 1, EventKind::Text("17".to_string())).await;

    let texts = transport.texts_to(1);
    assert!(texts.iter().any(|t| t.contains("от 18 до 100")));

    let stored = store.get(1).await.unwrap().unwrap();
    assert!(stored.age.is_none());
    assert!(!stored.profile_complete);
}

#[tokio::test]
async fn mutual_likes_announce_a_match_to_both_parties() {
    let (state, _store, transport) = test_state();

    register(&state, 1, "Парень", "Девушки", "Москва").await;
    register(&state, 2, "Девушка", "Парни", "Москва").await;
    transport.clear();

    // 1 browses and likes 2.
    send(&state, 1, EventKind::Callback("menu_browse".to_string())).await;
    let card = transport.texts_to(1);
    assert!(card.iter().any(|t| t.contains("Имя2")));
    send(&state, 1, EventKind::Callback("like_2".to_string())).await;

    assert!(transport.texts_to(1).iter().any(|t| t.contains("Симпатия отправлена")));
    // The push notification reached 2 immediately.
    assert!(transport.texts_to(2).iter().any(|t| t.contains("понравились")));
    transport.clear();

    // 2 likes back: the match is announced to both with contact lines.
    send(&state, 2, EventKind::Callback("like_1".to_string())).await;

    let to_1 = transport.texts_to(1);
    let to_2 = transport.texts_to(2);
    assert!(to_1.iter().any(|t| t.contains("взаимно") && t.contains("@user2")));
    assert!(to_2.iter().any(|t| t.contains("взаимно") && t.contains("@user1")));
    transport.clear();

    // The consumed like is not re-announced on 2's next activity.
    send(&state, 2, EventKind::Command("/help".to_string())).await;
    assert!(!transport.texts_to(2).iter().any(|t| t.contains("понравились")));
}

#[tokio::test]
async fn undelivered_like_is_retried_on_next_activity() {
    let (state, store, transport) = test_state();

    register(&state, 1, "Парень", "Девушки", "Москва").await;
    register(&state, 2, "Девушка", "Парни", "Москва").await;
    transport.clear();

    // 2 is unreachable when the like lands.
    transport.fail_chat(2);
    send(&state, 1, EventKind::Callback("menu_browse".to_string())).await;
    send(&state, 1, EventKind::Callback("like_2".to_string())).await;
    assert!(transport.texts_to(2).is_empty());

    let stored = store.get(2).await.unwrap().unwrap();
    assert!(stored.unnotified_likes.contains(&1));

    // Still unreachable on 2's own activity: the drained liker is put back.
    send_lossy(&state, 2, EventKind::Command("/help".to_string())).await;
    let stored = store.get(2).await.unwrap().unwrap();
    assert!(stored.unnotified_likes.contains(&1));

    // Delivery succeeds once the chat is reachable again, exactly once.
    transport.unfail_chat(2);
    send(&state, 2, EventKind::Command("/help".to_string())).await;
    assert!(transport.texts_to(2).iter().any(|t| t.contains("понравились")));

    let stored = store.get(2).await.unwrap().unwrap();
    assert!(stored.unnotified_likes.is_empty());

    transport.clear();
    send(&state, 2, EventKind::Command("/help".to_string())).await;
    assert!(!transport.texts_to(2).iter().any(|t| t.contains("понравились")));
}

#[tokio::test]
async fn passed_candidates_stay_out_of_later_batches() {
    let (state, store, transport) = test_state();

    register(&state, 1, "Парень", "Девушки", "Москва").await;
    register(&state, 2, "Девушка", "Парни", "Москва").await;
    transport.clear();

    send(&state, 1, EventKind::Callback("menu_browse".to_string())).await;
    send(&state, 1, EventKind::Callback("pass_2".to_string())).await;

    let stored = store.get(1).await.unwrap().unwrap();
    assert!(stored.declined_likes.contains(&2));

    transport.clear();
    send(&state, 1, EventKind::Callback("menu_browse".to_string())).await;
    let texts = transport.texts_to(1);
    assert!(texts.iter().any(|t| t.contains("нет подходящих анкет")));
    assert!(!texts.iter().any(|t| t.contains("Имя2")));

    // A later change of heart still works: liking after a pass clears the
    // decline and can complete a match.
    send(&state, 2, EventKind::Callback("like_1".to_string())).await;
    transport.clear();
    send(&state, 1, EventKind::Callback("like_2".to_string())).await;
    assert!(transport.texts_to(1).iter().any(|t| t.contains("взаимно")));
    assert!(transport.texts_to(2).iter().any(|t| t.contains("взаимно")));
}

#[tokio::test]
async fn reports_land_in_the_feedback_queue_and_pass_the_card() {
    let (state, store, transport) = test_state();

    register(&state, 1, "Парень", "Девушки", "Москва").await;
    register(&state, 2, "Девушка", "Парни", "Москва").await;
    transport.clear();

    send(&state, 1, EventKind::Callback("menu_browse".to_string())).await;
    send(&state, 1, EventKind::Callback("report_2".to_string())).await;

    assert!(transport.texts_to(1).iter().any(|t| t.contains("жалоба принята")));

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_feedback, 1);

    let stored = store.get(1).await.unwrap().unwrap();
    assert!(stored.declined_likes.contains(&2));
}

#[tokio::test]
async fn stars_donation_completes_the_pending_record() {
    let (state, store, transport) = test_state();

    register(&state, 1, "Парень", "Девушки", "Москва").await;
    transport.clear();

    send(&state, 1, EventKind::Callback("payment_method_stars".to_string())).await;
    send(&state, 1, EventKind::Callback("stars_50".to_string())).await;

    let invoices = transport.invoices.lock().unwrap().clone();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].currency, "XTR");
    assert_eq!(invoices[0].amount, 50);
    let payload = invoices[0].payload.clone();

    let stored = store.get(1).await.unwrap().unwrap();
    assert_eq!(stored.payments.len(), 1);
    assert_eq!(stored.payments[0].payload, payload);

    send(
        &state,
        1,
        EventKind::PreCheckout {
            query_id: "q1".to_string(),
            currency: "XTR".to_string(),
            total_amount: 50,
            payload: payload.clone(),
        },
    )
    .await;
    assert_eq!(
        *transport.pre_checkout_answers.lock().unwrap(),
        vec![("q1".to_string(), true)]
    );

    send(
        &state,
        1,
        EventKind::SuccessfulPayment {
            currency: "XTR".to_string(),
            total_amount: 50,
            payload: payload.clone(),
            charge_id: "charge_1".to_string(),
        },
    )
    .await;

    let stored = store.get(1).await.unwrap().unwrap();
    assert!(stored.payments[0].completed_at.is_some());
    assert_eq!(stored.payments[0].external_id, "charge_1");
    assert!(transport.texts_to(1).iter().any(|t| t.contains("Спасибо за поддержку")));
}

#[tokio::test]
async fn pre_checkout_with_wrong_currency_is_refused() {
    let (state, _store, transport) = test_state();

    let payload = stars::invoice_payload(50, 1, Utc::now());
    send(
        &state,
        1,
        EventKind::PreCheckout {
            query_id: "q1".to_string(),
            currency: "USD".to_string(),
            total_amount: 50,
            payload,
        },
    )
    .await;

    assert_eq!(
        *transport.pre_checkout_answers.lock().unwrap(),
        vec![("q1".to_string(), false)]
    );
}

#[tokio::test]
async fn language_switch_mid_onboarding_repeats_the_prompt() {
    let (state, store, transport) = test_state();

    send(&state, 1, EventKind::Command("/start".to_string())).await;
    send(&state, 1, EventKind::Callback("lang_ru".to_string())).await;
    send(&state, 1, EventKind::Text("25".to_string())).await;
    transport.clear();

    send(&state, 1, EventKind::Command("/language".to_string())).await;
    send(&state, 1, EventKind::Callback("lang_en".to_string())).await;

    let texts = transport.texts_to(1);
    assert!(texts.iter().any(|t| t.contains("Your gender?")));
    assert!(!texts.iter().any(|t| t.contains("age")));

    let stored = store.get(1).await.unwrap().unwrap();
    assert_eq!(stored.language, alt3r::models::Lang::En);

    // The flow continues where it left off, in the new language.
    send(&state, 1, EventKind::Text("Guy".to_string())).await;
    assert!(transport
        .texts_to(1)
        .iter()
        .any(|t| t.contains("Who are you interested in?")));
}

#[tokio::test]
async fn exhausting_a_batch_refetches_until_the_pool_is_dry() {
    let (state, _store, transport) = test_state();

    register(&state, 1, "Парень", "Девушки", "Москва").await;
    register(&state, 2, "Девушка", "Парни", "Москва").await;
    register(&state, 3, "Девушка", "Парни", "Москва").await;
    transport.clear();

    // Liking through the whole queue re-enters the selector for a fresh
    // batch and lands on the menu once nobody is left.
    send(&state, 1, EventKind::Callback("menu_browse".to_string())).await;
    send(&state, 1, EventKind::Callback("like_2".to_string())).await;
    send(&state, 1, EventKind::Callback("like_3".to_string())).await;

    let texts = transport.texts_to(1);
    assert!(texts.iter().any(|t| t.contains("нет подходящих анкет")));
    assert!(texts.iter().any(|t| t.contains("Главное меню")));
}

#[tokio::test]
async fn stray_text_nudges_incomplete_profiles_into_onboarding() {
    let (state, _store, transport) = test_state();

    handlers_stray(&state, 5).await;
    let texts = transport.texts_to(5);
    assert!(texts.iter().any(|t| t.contains("Выберите язык")));
}

async fn handlers_stray(state: &alt3r::state::AppState, user_id: i64) {
    alt3r::handlers::handle_event(state, event(user_id, EventKind::Text("привет".to_string())))
        .await
        .unwrap();
}
