use parlance_voice::{render_prompt, HistoryStore, Role, Turn};

#[tokio::test]
async fn unknown_session_starts_empty() {
    let store = HistoryStore::new();
    let transcript = store.get_or_create("fresh").await;
    assert!(transcript.is_empty());
    assert_eq!(store.len("fresh").await, 0);
}

#[tokio::test]
async fn append_preserves_insertion_order() {
    let store = HistoryStore::new();
    store.append("s1", Turn::user("one")).await;
    store.append("s1", Turn::assistant("two")).await;
    store.append("s1", Turn::user("three")).await;

    let transcript = store.get_or_create("s1").await;
    let contents: Vec<&str> = transcript.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let store = HistoryStore::new();
    store.append("a", Turn::user("for a")).await;
    store.append("b", Turn::user("for b")).await;

    assert_eq!(store.get_or_create("a").await[0].content, "for a");
    assert_eq!(store.get_or_create("b").await[0].content, "for b");
}

#[tokio::test]
async fn read_only_get_does_not_create_sessions() {
    let store = HistoryStore::new();

    assert!(store.get("probe").await.is_empty());
    assert_eq!(store.session_count().await, 0);

    // get_or_create is the path that registers a session.
    let transcript = store.get_or_create("s1").await;
    assert!(transcript.is_empty());
    assert_eq!(store.session_count().await, 1);

    // Repeated probes of unknown IDs never grow the map.
    for i in 0..10 {
        let _ = store.get(&format!("probe-{}", i)).await;
    }
    assert_eq!(store.session_count().await, 1);
}

#[tokio::test]
async fn get_and_get_or_create_agree_for_known_sessions() {
    let store = HistoryStore::new();
    store.append("s1", Turn::user("hello")).await;
    store.append("s1", Turn::assistant("hi there")).await;

    assert_eq!(store.get("s1").await, store.get_or_create("s1").await);
}

#[tokio::test]
async fn clones_share_the_same_map() {
    let store = HistoryStore::new();
    let other = store.clone();
    store.append("s1", Turn::user("hello")).await;
    assert_eq!(other.len("s1").await, 1);
}

#[tokio::test]
async fn concurrent_appends_lose_nothing() {
    let store = HistoryStore::new();
    let mut handles = Vec::new();

    for session in ["s1", "s2", "s3", "s4"] {
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(session, Turn::user(format!("msg {}", i))).await;
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for session in ["s1", "s2", "s3", "s4"] {
        let transcript = store.get_or_create(session).await;
        assert_eq!(transcript.len(), 50);
        // Every append is whole: no interleaved partial writes.
        for turn in &transcript {
            assert_eq!(turn.role, Role::User);
            assert!(turn.content.starts_with("msg "));
        }
    }
}

#[test]
fn prompt_renders_role_colon_content_lines() {
    let turns = vec![
        Turn::user("hello"),
        Turn::assistant("hi there"),
        Turn::user("how are you"),
    ];
    assert_eq!(
        render_prompt(&turns),
        "user: hello\nassistant: hi there\nuser: how are you"
    );
}

#[test]
fn prompt_of_empty_transcript_is_empty() {
    assert_eq!(render_prompt(&[]), "");
}

#[test]
fn role_display_matches_wire_names() {
    assert_eq!(Role::User.to_string(), "user");
    assert_eq!(Role::Assistant.to_string(), "assistant");
}

#[test]
fn turn_serializes_with_snake_case_role() {
    let turn = Turn::assistant("hi");
    let json = serde_json::to_value(&turn).unwrap();
    assert_eq!(json["role"], "assistant");
    assert_eq!(json["content"], "hi");
}
