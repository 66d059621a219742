use crate::types::{AgentRole, SubTask, Task, TaskKind};

/// Roles a composite task of `kind` is split into, in order.
///
/// Kinds without a plan return an empty slice and are handled as single-intent
/// work by the caller.
pub fn plan_for(kind: TaskKind) -> &'static [AgentRole] {
    match kind {
        TaskKind::IdeaProcessing => &[AgentRole::Sourcing, AgentRole::Scoring, AgentRole::Adaptation],
        TaskKind::ContentModeration => &[AgentRole::Moderation],
        TaskKind::MarketAnalysis => &[AgentRole::Sourcing, AgentRole::Scoring],
        TaskKind::UserQuery => &[],
    }
}

/// Expand a composite task into its ordered sub-tasks.
///
/// Pure and deterministic: ids are derived from the parent id and index, and
/// every child gets a copy of the parent input as-is, even when it is malformed.
pub fn decompose(task: &Task) -> Vec<SubTask> {
    plan_for(task.kind)
        .iter()
        .enumerate()
        .map(|(index, role)| SubTask {
            id: SubTask::child_id(&task.id, index),
            parent_id: task.id.clone(),
            planned_role: Some(*role),
            input: task.input.clone(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_idea_processing_yields_three_subtasks() {
        let task = Task::new(
            TaskKind::IdeaProcessing,
            serde_json::json!({"title": "Mental Health AI Companion"}),
        );
        let subtasks = decompose(&task);
        assert_eq!(subtasks.len(), 3);

        let roles: Vec<Option<AgentRole>> = subtasks.iter().map(|s| s.planned_role).collect();
        assert_eq!(
            roles,
            vec![
                Some(AgentRole::Sourcing),
                Some(AgentRole::Scoring),
                Some(AgentRole::Adaptation)
            ]
        );

        let ids: HashSet<&str> = subtasks.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        for sub in &subtasks {
            assert_eq!(sub.input, task.input);
            assert_eq!(sub.parent_id, task.id);
        }
    }

    #[test]
    fn test_decomposition_is_stable() {
        let task = Task::new(TaskKind::IdeaProcessing, serde_json::json!({}));
        let first: Vec<String> = decompose(&task).into_iter().map(|s| s.id).collect();
        let second: Vec<String> = decompose(&task).into_iter().map(|s| s.id).collect();
        assert_eq!(first, second);
        assert_eq!(first[0], format!("{}-subtask-0", task.id));
    }

    #[test]
    fn test_user_query_has_no_plan() {
        let task = Task::new(TaskKind::UserQuery, serde_json::json!({"query": "hi"}));
        assert!(decompose(&task).is_empty());
    }

    #[test]
    fn test_moderation_and_market_plans() {
        let post = Task::new(TaskKind::ContentModeration, serde_json::json!({"content": "x"}));
        let subtasks = decompose(&post);
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].planned_role, Some(AgentRole::Moderation));

        let market = Task::new(TaskKind::MarketAnalysis, serde_json::Value::Null);
        assert_eq!(decompose(&market).len(), 2);
    }

    #[test]
    fn test_malformed_input_is_copied_not_rejected() {
        let task = Task::new(TaskKind::IdeaProcessing, serde_json::Value::Null);
        let subtasks = decompose(&task);
        assert_eq!(subtasks.len(), 3);
        assert!(subtasks.iter().all(|s| s.input.is_null()));
    }
}
