/// Tests for prompt version repository
#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::super::*;
    use crate::manager::{DatabaseConfig, StorageManager};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use versa_core::prompt::{NewPromptVersion, PromptKey};

    async fn setup_test_db() -> Arc<PromptRepository> {
        let storage = StorageManager::new(&DatabaseConfig::in_memory())
            .await
            .expect("Failed to open test database");
        storage.prompts()
    }

    fn rag_key() -> PromptKey {
        PromptKey::parse("knowledge", "rag_prompt").unwrap()
    }

    fn request(key: &PromptKey, content: &str, activate: bool) -> NewPromptVersion {
        NewPromptVersion::builder()
            .key(key)
            .content(content)
            .created_by("tester")
            .activate(activate)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_versions() {
        let repo = setup_test_db().await;
        let key = rag_key();

        let v1 = repo
            .insert_version(&request(&key, "first rag template", false))
            .await
            .expect("Failed to insert v1");
        let v2 = repo
            .insert_version(&request(&key, "second rag template", false))
            .await
            .expect("Failed to insert v2");

        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_eq!(v1.usage_count, 0);
        assert!(!v1.is_active);
        assert_eq!(v2.created_by, "tester");
        assert_eq!(repo.latest_version(&key).await.unwrap(), Some(2));

        // Another key starts over at 1
        let other = PromptKey::parse("knowledge", "system_prompt").unwrap();
        let first = repo
            .insert_version(&request(&other, "system instructions", false))
            .await
            .unwrap();
        assert_eq!(first.version, 1);
    }

    #[tokio::test]
    async fn test_insert_with_activation_deactivates_siblings() {
        let repo = setup_test_db().await;
        let key = rag_key();

        repo.insert_version(&request(&key, "first rag template", true))
            .await
            .unwrap();
        let v2 = repo
            .insert_version(&request(&key, "second rag template", true))
            .await
            .unwrap();

        assert!(v2.is_active);
        let active = repo.find_active(&key).await.unwrap().unwrap();
        assert_eq!(active.version, 2);
        assert_eq!(repo.count_active_for(&key).await.unwrap(), 1);

        let v1 = repo.find_version(&key, 1).await.unwrap().unwrap();
        assert!(!v1.is_active);
    }

    #[tokio::test]
    async fn test_activate_existing_version() {
        let repo = setup_test_db().await;
        let key = rag_key();

        repo.insert_version(&request(&key, "first rag template", true))
            .await
            .unwrap();
        repo.insert_version(&request(&key, "second rag template", false))
            .await
            .unwrap();

        let activated = repo.activate(&key, 2).await.unwrap().unwrap();
        assert_eq!(activated.version, 2);
        assert!(activated.is_active);

        let history = repo.list_versions(&key, None).await.unwrap();
        let flags: Vec<(u32, bool)> = history.iter().map(|r| (r.version, r.is_active)).collect();
        assert_eq!(flags, vec![(2, true), (1, false)]);

        // Re-activating the active version keeps it active
        let again = repo.activate(&key, 2).await.unwrap().unwrap();
        assert!(again.is_active);
        assert_eq!(repo.count_active_for(&key).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_activate_missing_version_rolls_back() {
        let repo = setup_test_db().await;
        let key = rag_key();

        repo.insert_version(&request(&key, "first rag template", true))
            .await
            .unwrap();

        let missing = repo.activate(&key, 9).await.unwrap();
        assert!(missing.is_none());

        // The previously active version is still active
        let active = repo.find_active(&key).await.unwrap().unwrap();
        assert_eq!(active.version, 1);
    }

    #[tokio::test]
    async fn test_insert_initial_version_only_once() {
        let repo = setup_test_db().await;
        let key = PromptKey::parse("router", "routing_prompt").unwrap();

        let created = repo
            .insert_initial_version(&request(&key, "route the question", true))
            .await
            .unwrap();
        let created = created.expect("first seed should insert");
        assert_eq!(created.version, 1);
        assert!(created.is_active);

        let skipped = repo
            .insert_initial_version(&request(&key, "route the question again", true))
            .await
            .unwrap();
        assert!(skipped.is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_increment_usage_on_active_only() {
        let repo = setup_test_db().await;
        let key = rag_key();

        assert!(repo.increment_usage(&key).await.unwrap().is_none());

        repo.insert_version(&request(&key, "first rag template", true))
            .await
            .unwrap();
        for _ in 0..3 {
            repo.increment_usage(&key).await.unwrap();
        }
        let active = repo.find_active(&key).await.unwrap().unwrap();
        assert_eq!(active.usage_count, 3);
        assert_eq!(repo.total_usage().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_versions_with_limit() {
        let repo = setup_test_db().await;
        let key = rag_key();

        for i in 0..5 {
            repo.insert_version(&request(&key, &format!("rag template number {}", i), false))
                .await
                .unwrap();
        }

        let limited = repo.list_versions(&key, Some(2)).await.unwrap();
        let versions: Vec<u32> = limited.iter().map(|r| r.version).collect();
        assert_eq!(versions, vec![5, 4]);

        let unknown = PromptKey::parse("knowledge", "unknown_prompt").unwrap();
        assert!(repo.list_versions(&unknown, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_keys_and_active_prompts() {
        let repo = setup_test_db().await;
        let conversational = PromptKey::parse("conversational", "system_prompt").unwrap();
        let rag = rag_key();
        let knowledge_system = PromptKey::parse("knowledge", "system_prompt").unwrap();

        repo.insert_version(&request(&conversational, "be friendly and brief", true))
            .await
            .unwrap();
        repo.insert_version(&request(&rag, "first rag template", true))
            .await
            .unwrap();
        repo.insert_version(&request(&knowledge_system, "cite your sources", false))
            .await
            .unwrap();

        let agents: Vec<String> = repo
            .list_agent_types()
            .await
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(agents, vec!["conversational", "knowledge"]);

        let knowledge = AgentType::parse("knowledge").unwrap();
        let names: Vec<String> = repo
            .list_prompt_names(&knowledge)
            .await
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, vec!["rag_prompt", "system_prompt"]);

        assert_eq!(repo.list_active(None).await.unwrap().len(), 2);
        let knowledge_active = repo.list_active(Some(&knowledge)).await.unwrap();
        assert_eq!(knowledge_active.len(), 1);
        assert_eq!(knowledge_active[0].key(), rag);

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.count_prompts().await.unwrap(), 3);
        assert_eq!(repo.count_active().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_distinct_versions() {
        let repo = setup_test_db().await;
        let key = rag_key();

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            let req = request(&key, &format!("concurrent template {}", i), i % 2 == 0);
            handles.push(tokio::spawn(async move { repo.insert_version(&req).await }));
        }
        for handle in handles {
            handle.await.unwrap().expect("insert should succeed");
        }

        let mut versions: Vec<u32> = repo
            .list_versions(&key, None)
            .await
            .unwrap()
            .iter()
            .map(|r| r.version)
            .collect();
        versions.sort_unstable();
        assert_eq!(versions, (1..=8).collect::<Vec<u32>>());
        assert_eq!(repo.count_active_for(&key).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(&DatabaseConfig::file(dir.path().join("versa.db")))
            .await
            .expect("Failed to open file database");
        let repo = storage.prompts();
        let key = rag_key();

        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = repo.clone();
            let req = request(&key, &format!("pooled template {}", i), i % 3 == 0);
            handles.push(tokio::spawn(async move { repo.insert_version(&req).await }));
        }
        for handle in handles {
            handle.await.unwrap().expect("insert should succeed");
        }

        let mut versions: Vec<u32> = repo
            .list_versions(&key, None)
            .await
            .unwrap()
            .iter()
            .map(|r| r.version)
            .collect();
        versions.sort_unstable();
        assert_eq!(versions, (1..=16).collect::<Vec<u32>>());
        assert_eq!(repo.count_active_for(&key).await.unwrap(), 1);

        storage.close().await;
    }

    /// Writes version 1 of `key` again, which the schema rejects
    async fn duplicate_first_version(repo: &PromptRepository, key: &PromptKey) -> Error {
        sqlx::query(
            "INSERT INTO prompt_versions (agent_type, prompt_name, version, content, created_at) \
             VALUES (?1, ?2, 1, 'duplicate template', '2024-01-01T00:00:00Z')",
        )
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .execute(&repo.pool)
        .await
        .map(|_| ())
        .expect_err("version 1 already exists")
        .into()
    }

    #[tokio::test]
    async fn test_version_clash_is_retried() {
        let repo = setup_test_db().await;
        let key = rag_key();
        repo.insert_version(&request(&key, "first rag template", false))
            .await
            .unwrap();

        let req = request(&key, "second rag template", true);
        let attempts = AtomicUsize::new(0);
        let record = retry_on_version_clash(&key, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            let (repo, key, req) = (&repo, &key, &req);
            async move {
                if attempt == 0 {
                    Err(duplicate_first_version(repo, key).await)
                } else {
                    repo.try_insert_version(req).await
                }
            }
        })
        .await
        .expect("second attempt should succeed");

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(record.version, 2);
        assert!(record.is_active);
    }

    #[tokio::test]
    async fn test_version_clash_gives_up_after_max_attempts() {
        let repo = setup_test_db().await;
        let key = rag_key();
        repo.insert_version(&request(&key, "first rag template", false))
            .await
            .unwrap();

        let attempts = AtomicUsize::new(0);
        let result = retry_on_version_clash(&key, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            let (repo, key) = (&repo, &key);
            async move { Err(duplicate_first_version(repo, key).await) }
        })
        .await;

        assert!(result.unwrap_err().is_unique_violation());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_INSERT_ATTEMPTS);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_variables_are_stored_with_the_version() {
        let repo = setup_test_db().await;
        let key = PromptKey::parse("memory", "fact_extraction").unwrap();

        let req = request(&key, "Extract facts from: {text}", true)
            .with_variables(["text"])
            .unwrap();
        let created = repo.insert_initial_version(&req).await.unwrap().unwrap();
        assert_eq!(created.variables, vec!["text"]);

        let plain = repo
            .insert_version(&request(&key, "List the facts in: {text}", false))
            .await
            .unwrap();
        assert!(plain.variables.is_empty());

        let active = repo.find_active(&key).await.unwrap().unwrap();
        assert_eq!(active.variables, vec!["text"]);
    }

    fn raw_row(usage_count: i64, variables: &str) -> PromptRow {
        PromptRow {
            agent_type: "knowledge".to_string(),
            prompt_name: "rag_prompt".to_string(),
            version: 1,
            content: "first rag template".to_string(),
            description: None,
            variables: variables.to_string(),
            created_by: "admin".to_string(),
            created_at: Utc::now(),
            usage_count,
            is_active: false,
        }
    }

    #[test]
    fn test_row_conversion_rejects_corrupt_values() {
        let record = PromptRecord::try_from(raw_row(4, r#"["context"]"#)).unwrap();
        assert_eq!(record.usage_count, 4);
        assert_eq!(record.variables, vec!["context"]);

        assert!(matches!(
            PromptRecord::try_from(raw_row(-1, "[]")),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            PromptRecord::try_from(raw_row(0, "context")),
            Err(Error::Serialization(_))
        ));
    }
}
