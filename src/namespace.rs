// ============================================================================
// Isolation Namespace Scoping
// ============================================================================
//
// A namespace partitions data visibility per tenant. The UI filter resolves
// one per admitted request and activates it for exactly the nested handler
// call. A task-local cell keeps concurrent requests from observing each
// other's namespace and guarantees restoration on every exit path (normal
// return, error, panic unwind, cancellation).
//
// ============================================================================

use std::future::Future;

tokio::task_local! {
    static ACTIVE_NAMESPACE: String;
}

/// Run `fut` with `namespace` active for the duration of the call only.
pub async fn with_namespace<F>(namespace: String, fut: F) -> F::Output
where
    F: Future,
{
    ACTIVE_NAMESPACE.scope(namespace, fut).await
}

/// The namespace scoped to the current task, if one is active.
pub fn current() -> Option<String> {
    ACTIVE_NAMESPACE.try_with(|ns| ns.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_namespace_outside_scope() {
        assert_eq!(current(), None);
    }

    #[tokio::test]
    async fn namespace_is_visible_inside_scope_only() {
        let seen = with_namespace("course1".to_string(), async { current() }).await;
        assert_eq!(seen, Some("course1".to_string()));
        assert_eq!(current(), None);
    }

    #[tokio::test]
    async fn nested_scopes_restore_outer_value() {
        with_namespace("outer".to_string(), async {
            assert_eq!(current(), Some("outer".to_string()));
            with_namespace("inner".to_string(), async {
                assert_eq!(current(), Some("inner".to_string()));
            })
            .await;
            assert_eq!(current(), Some("outer".to_string()));
        })
        .await;
    }

    #[tokio::test]
    async fn concurrent_tasks_observe_their_own_namespace() {
        let a = tokio::spawn(with_namespace("ns-a".to_string(), async {
            tokio::task::yield_now().await;
            current()
        }));
        let b = tokio::spawn(with_namespace("ns-b".to_string(), async {
            tokio::task::yield_now().await;
            current()
        }));
        assert_eq!(a.await.unwrap(), Some("ns-a".to_string()));
        assert_eq!(b.await.unwrap(), Some("ns-b".to_string()));
    }

    #[tokio::test]
    async fn namespace_restored_after_panic() {
        let result = tokio::spawn(with_namespace("doomed".to_string(), async {
            panic!("handler failure");
        }))
        .await;
        assert!(result.is_err());
        assert_eq!(current(), None);
    }
}
