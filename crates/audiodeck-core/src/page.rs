//! Page model — the panel list the renderer fills in and the HTML layer prints.
//!
//! Panels are append-only: a failed fetch adds an error node permanently, and
//! nothing is ever removed short of building a new page.

use serde::Serialize;

use crate::types::{Catalog, Identifier};

/// Export button label when idle.
pub const EXPORT_LABEL: &str = "打包下载全部";

/// Export button label while the archive is being serialized.
pub const GENERATING_LABEL: &str = "生成 ZIP...";

/// Shown instead of the panel list when the catalog is empty.
pub const EMPTY_PLACEHOLDER: &str = "在 audio 文件夹中没有找到文件。";

/// Export button label during fetching.
pub fn packing_label(percent: u8) -> String {
    format!("正在打包... ({percent}%)")
}

/// Panel heading for an identifier ("File: <id>").
pub fn heading(id: &Identifier) -> String {
    format!("文件: {id}")
}

/// Error text for a non-success response.
pub fn unavailable_message(file_name: &str, reason: &str) -> String {
    format!("无法加载 {file_name} ({reason})")
}

/// Error text for a transport or processing failure.
pub fn failure_message(file_name: &str, message: &str) -> String {
    format!("加载 {file_name} 时出错: {message}")
}

/// One child of a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Heading { text: String },
    Text { body: String },
    Audio { src: String },
    Error { message: String },
}

/// Rendered unit for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub identifier: Identifier,
    pub nodes: Vec<Node>,
}

impl Panel {
    /// New panel holding only its heading.
    pub fn new(identifier: Identifier) -> Self {
        let nodes = vec![Node::Heading {
            text: heading(&identifier),
        }];
        Self { identifier, nodes }
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Text { body } => Some(body.as_str()),
            _ => None,
        })
    }

    pub fn audio_sources(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Audio { src } => Some(src.as_str()),
            _ => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Error { message } => Some(message.as_str()),
            _ => None,
        })
    }
}

/// The whole page: either panels in catalog order, or the empty-set placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub panels: Vec<Panel>,
    pub placeholder: Option<String>,
    pub export_visible: bool,
}

impl Page {
    /// Lay out one heading-only panel per identifier, in order.
    ///
    /// An empty catalog yields the placeholder and a hidden export control.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        if catalog.is_empty() {
            return Self {
                panels: Vec::new(),
                placeholder: Some(EMPTY_PLACEHOLDER.into()),
                export_visible: false,
            };
        }
        Self {
            panels: catalog.identifiers().iter().cloned().map(Panel::new).collect(),
            placeholder: None,
            export_visible: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_panel_per_identifier_in_order() {
        let page = Page::for_catalog(&Catalog::default());
        assert_eq!(page.panels.len(), 12);
        assert!(page.placeholder.is_none());
        assert!(page.export_visible);
        for (i, panel) in page.panels.iter().enumerate() {
            let expected = Identifier::ordinal(i + 1);
            assert_eq!(panel.identifier, expected);
            assert_eq!(
                panel.nodes,
                vec![Node::Heading {
                    text: format!("文件: {expected}")
                }]
            );
        }
    }

    #[test]
    fn empty_catalog_shows_placeholder_only() {
        let page = Page::for_catalog(&Catalog::new("audio", Vec::new()));
        assert!(page.panels.is_empty());
        assert_eq!(page.placeholder.as_deref(), Some(EMPTY_PLACEHOLDER));
        assert!(!page.export_visible);
    }

    #[test]
    fn panel_accessors_filter_by_kind() {
        let mut panel = Panel::new(Identifier::ordinal(1));
        panel.push(Node::Audio {
            src: "./audio/001.wav".into(),
        });
        panel.push(Node::Error {
            message: unavailable_message("001.txt", "Not Found"),
        });
        assert_eq!(panel.texts().count(), 0);
        assert_eq!(panel.audio_sources().collect::<Vec<_>>(), ["./audio/001.wav"]);
        assert_eq!(panel.errors().collect::<Vec<_>>(), ["无法加载 001.txt (Not Found)"]);
    }

    #[test]
    fn labels() {
        assert_eq!(packing_label(0), "正在打包... (0%)");
        assert_eq!(failure_message("002.txt", "boom"), "加载 002.txt 时出错: boom");
    }
}
