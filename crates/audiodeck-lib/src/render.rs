//! Panel renderer — lays out one panel per identifier and fills it in.
//!
//! ```text
//! render_page(catalog) → Page::for_catalog: heading-only panels, in order
//!     → per panel: audio node appended immediately (no fetch; loads on play)
//!     → per panel: text fetch spawned into a JoinSet → Text or Error node
//! ```
//!
//! Text fetches are independent and complete in any order. Failures become a
//! visible error node on that panel and never touch sibling panels.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, error};

use audiodeck_core::page::{Node, Page, failure_message, unavailable_message};
use audiodeck_core::types::{Catalog, ResourceKind, ResourcePath};

use crate::error::FetchError;
use crate::fetch::{ResourceFetcher, SharedFetcher};

/// Handle to one panel inside a shared page.
#[derive(Clone)]
pub struct PanelSlot {
    page: Arc<Mutex<Page>>,
    index: usize,
}

impl PanelSlot {
    pub fn append(&self, node: Node) {
        let mut page = self.page.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(panel) = page.panels.get_mut(self.index) {
            panel.push(node);
        }
    }
}

/// A page whose panels may still be filling in.
pub struct PageRender {
    page: Arc<Mutex<Page>>,
    tasks: JoinSet<()>,
}

impl PageRender {
    /// Current state of the page, settled or not.
    pub fn snapshot(&self) -> Page {
        self.page
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of panel fetches still outstanding.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every panel fetch to settle and return the final page.
    pub async fn wait(mut self) -> Page {
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                error!("render: panel task failed: {e}");
            }
        }
        self.snapshot()
    }
}

/// Build the page for `catalog` and launch its fetches.
///
/// Must be called inside a tokio runtime. An empty catalog produces the
/// placeholder page and starts no work.
pub fn render_page(catalog: &Catalog, fetcher: SharedFetcher) -> PageRender {
    let page = Arc::new(Mutex::new(Page::for_catalog(catalog)));
    let mut tasks = JoinSet::new();

    for (index, id) in catalog.identifiers().iter().enumerate() {
        let slot = PanelSlot {
            page: page.clone(),
            index,
        };

        slot.append(audio_node(&catalog.resource(id, ResourceKind::Audio)));

        let text = catalog.resource(id, ResourceKind::Text);
        let fetcher = fetcher.clone();
        tasks.spawn(async move {
            fetch_and_display(&slot, &text, ResourceKind::Text, fetcher.as_ref()).await;
        });
    }

    debug!("render: {} panels, {} fetches", catalog.len(), tasks.len());
    PageRender { page, tasks }
}

/// Retrieve one resource and append exactly one node for it to `slot`.
pub async fn fetch_and_display(
    slot: &PanelSlot,
    path: &ResourcePath,
    kind: ResourceKind,
    fetcher: &dyn ResourceFetcher,
) {
    let node = match kind {
        ResourceKind::Audio => audio_node(path),
        ResourceKind::Text => text_node(path, fetcher).await,
    };
    slot.append(node);
}

/// Playable control bound to `path`. Bytes load on first play.
pub fn audio_node(path: &ResourcePath) -> Node {
    Node::Audio { src: path.url() }
}

/// Fetch a text resource; the body verbatim, or an error node naming the file.
pub async fn text_node(path: &ResourcePath, fetcher: &dyn ResourceFetcher) -> Node {
    match fetcher.fetch(path).await {
        Ok(bytes) => Node::Text {
            body: String::from_utf8_lossy(&bytes).into_owned(),
        },
        Err(FetchError::Status { reason, .. }) => {
            error!("Error fetching {path}: {reason}");
            Node::Error {
                message: unavailable_message(path.file_name(), &reason),
            }
        }
        Err(e) => {
            error!("Error processing file {path}: {e}");
            Node::Error {
                message: failure_message(path.file_name(), &e.to_string()),
            }
        }
    }
}
