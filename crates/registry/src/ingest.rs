use soulbrowser_core_types::{FrameId, PageId, SessionId};
use soulbrowser_event_bus::{EventBus, InMemoryBus};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::api::Registry;
use crate::state::RegistryImpl;

/// Events the registry can be driven with from an external bus, used when
/// the CDP adapter or agent orchestrator wants to update registry state
/// without holding a direct reference to the registry.
#[derive(Clone, Debug)]
pub enum RegistryEvent {
    PageFocus { page: PageId },
    PageClose { page: PageId },
    PageOpen { session: SessionId },
    FrameFocus { page: PageId, frame: FrameId },
    FrameAttached {
        page: PageId,
        parent: Option<FrameId>,
        is_main: bool,
    },
    FrameDetached { frame: FrameId },
    PageErrored { page: PageId },
}

pub struct IngestHandle {
    task: JoinHandle<()>,
}

impl IngestHandle {
    pub fn spawn(bus: Arc<InMemoryBus<RegistryEvent>>, registry: Arc<RegistryImpl>) -> Self {
        let mut rx = bus.subscribe();
        let task = tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                if let Err(err) = handle_event(&registry, event).await {
                    warn!("registry ingest error: {err}");
                }
            }
        });
        Self { task }
    }

    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

async fn handle_event(
    registry: &Arc<RegistryImpl>,
    event: RegistryEvent,
) -> Result<(), soulbrowser_core_types::SoulError> {
    match event {
        RegistryEvent::PageFocus { page } => registry.page_focus(page).await,
        RegistryEvent::PageClose { page } => registry.page_close(page).await,
        RegistryEvent::PageOpen { session } => registry.page_open(session).await.map(|_| ()),
        RegistryEvent::FrameFocus { page, frame } => registry.frame_focus(page, frame).await,
        RegistryEvent::FrameAttached {
            page,
            parent,
            is_main,
        } => {
            registry.frame_attached(&page, parent, is_main)?;
            Ok(())
        }
        RegistryEvent::FrameDetached { frame } => {
            registry.frame_detached(&frame)?;
            Ok(())
        }
        RegistryEvent::PageErrored { page } => {
            registry.mark_page_error(&page);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_event_bus::EventBus;

    fn wait_ms() -> u64 {
        10
    }

    #[tokio::test]
    async fn page_focus_event_updates_registry() {
        let bus = InMemoryBus::new(16);
        let registry = Arc::new(RegistryImpl::new());
        let _handle = IngestHandle::spawn(bus.clone(), registry.clone());

        let session = registry.session_create("user").await.unwrap();
        let page = registry.page_open(session.clone()).await.unwrap();

        bus.publish(RegistryEvent::PageFocus { page: page.clone() })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(wait_ms())).await;

        let exec = registry.route_resolve(None).await.unwrap();
        assert_eq!(exec.page, page);
    }

    #[tokio::test]
    async fn frame_attach_and_detach_events_update_tree() {
        let bus = InMemoryBus::new(16);
        let registry = Arc::new(RegistryImpl::new());
        let _handle = IngestHandle::spawn(bus.clone(), registry.clone());

        let session = registry.session_create("user").await.unwrap();
        let page = registry.page_open(session.clone()).await.unwrap();

        let main_frame = {
            let page_ctx = registry.ensure_page(&page).unwrap();
            let guard = page_ctx.read();
            guard.main_frame.clone().unwrap()
        };

        bus.publish(RegistryEvent::FrameAttached {
            page: page.clone(),
            parent: Some(main_frame.clone()),
            is_main: false,
        })
        .await
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(wait_ms())).await;

        let child_count = {
            let main_ctx = registry.ensure_frame(&main_frame).unwrap();
            let len = main_ctx.read().children.len();
            len
        };
        assert_eq!(child_count, 1);

        let child_id = {
            let main_ctx = registry.ensure_frame(&main_frame).unwrap();
            let child = main_ctx.read().children[0].clone();
            child
        };

        bus.publish(RegistryEvent::FrameDetached { frame: child_id })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(wait_ms())).await;

        let main_ctx = registry.ensure_frame(&main_frame).unwrap();
        assert!(main_ctx.read().children.is_empty());
    }

    #[tokio::test]
    async fn frame_focus_event_routes() {
        let bus = InMemoryBus::new(16);
        let registry = Arc::new(RegistryImpl::new());
        let _handle = IngestHandle::spawn(bus.clone(), registry.clone());

        let session = registry.session_create("user").await.unwrap();
        let page = registry.page_open(session.clone()).await.unwrap();

        let frame = {
            let page_ctx = registry.ensure_page(&page).unwrap();
            let focused = page_ctx.read().focused_frame.clone().unwrap();
            focused
        };

        bus.publish(RegistryEvent::FrameFocus {
            page: page.clone(),
            frame: frame.clone(),
        })
        .await
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(wait_ms())).await;

        let exec = registry
            .route_resolve(Some(soulbrowser_core_types::RoutingHint {
                page: Some(page.clone()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(exec.frame, frame);
    }

    #[tokio::test]
    async fn page_errored_event_marks_health() {
        let bus = InMemoryBus::new(16);
        let registry = Arc::new(RegistryImpl::new());
        let _handle = IngestHandle::spawn(bus.clone(), registry.clone());

        let session = registry.session_create("user").await.unwrap();
        let page = registry.page_open(session.clone()).await.unwrap();

        bus.publish(RegistryEvent::PageErrored { page: page.clone() })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(wait_ms())).await;

        let page_ctx = registry.ensure_page(&page).unwrap();
        assert_eq!(page_ctx.read().health.consecutive_errors, 1);
    }

    #[tokio::test]
    async fn page_close_event_cleans_state() {
        let bus = InMemoryBus::new(16);
        let registry = Arc::new(RegistryImpl::new());
        let _handle = IngestHandle::spawn(bus.clone(), registry.clone());

        let session = registry.session_create("user").await.unwrap();
        let page_a = registry.page_open(session.clone()).await.unwrap();
        let page_b = registry.page_open(session.clone()).await.unwrap();

        registry.page_focus(page_b.clone()).await.unwrap();

        bus.publish(RegistryEvent::PageClose {
            page: page_b.clone(),
        })
        .await
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(wait_ms())).await;

        assert!(registry.pages.get(&page_b).is_none());
        let exec = registry.route_resolve(None).await.unwrap();
        assert_eq!(exec.page, page_a);
    }
}
