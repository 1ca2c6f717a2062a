use academy_core::model::{CourseDraft, Registration};
use academy_core::time::fixed_now;
use services::{AppServices, Clock, TokenConfig};

fn draft() -> CourseDraft {
    serde_json::from_str(
        r#"{
            "title": "Rust",
            "quiz": {"title": "Final"},
            "chapters": [
                {
                    "title": "Ownership",
                    "quiz": {"title": "Ownership check"},
                    "topics": [
                        {"title": "Moves", "quiz": {"title": "Moves quiz"}},
                        {"title": "Borrows", "game": {"title": "Borrow pairs",
                            "pairs": [{"item_a": "&T", "item_b": "shared"}]}}
                    ]
                },
                {"title": "Errors", "topics": [{"title": "Result"}, {"title": "Panics"}]}
            ]
        }"#,
    )
    .unwrap()
}

#[tokio::test]
async fn learner_progress_flows_into_dashboard() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_learning_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        TokenConfig::new("integration-secret"),
    )
    .await
    .expect("connect sqlite");

    let course_id = services
        .catalog()
        .import_course(&draft())
        .await
        .expect("import");
    let course = services.catalog().get_course(course_id).await.unwrap();

    let accounts = services.accounts();
    accounts
        .register(Registration {
            username: Some("learner".into()),
            password: Some("long-enough".into()),
            ..Registration::default()
        })
        .await
        .expect("register");
    let pair = accounts
        .obtain_tokens("learner", "long-enough")
        .await
        .expect("login");
    let user = accounts.authenticate(&pair.access).await.expect("auth");

    let progress = services.progress();
    let ownership = &course.chapters[0];
    let moves_quiz = ownership.topics[0].topic_quiz.as_ref().unwrap().id;
    let chapter_quiz = ownership.chapter_quiz.as_ref().unwrap().id;
    let final_quiz = course.course_quiz.as_ref().unwrap().id;
    let game = ownership.topics[1].matching_game.as_ref().unwrap().id;

    progress
        .submit_quiz_score(user.id, Some(moves_quiz), Some(20.0))
        .await
        .unwrap();
    let retry = progress
        .submit_quiz_score(user.id, Some(moves_quiz), Some(80.0))
        .await
        .unwrap();
    assert!(!retry.created);
    progress
        .submit_quiz_score(user.id, Some(chapter_quiz), Some(60.0))
        .await
        .unwrap();
    progress
        .submit_quiz_score(user.id, Some(final_quiz), Some(100.0))
        .await
        .unwrap();
    progress
        .submit_game_score(user.id, Some(game), Some(100.0))
        .await
        .unwrap();

    let rows = progress.course_progress(user.id, course_id).await.unwrap();
    let topics: Vec<_> = rows.iter().map(|r| r.topic).collect();
    assert_eq!(topics, vec![ownership.topics[0].id, ownership.topics[1].id]);

    let stats = services.stats().dashboard(user.id).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_topics, 4);
    assert_eq!(stats[0].completed_topics, 2);
    assert_eq!(stats[0].completion_percentage, 50.0);
    assert_eq!(stats[0].average_quiz_score, Some(80.0));
}
