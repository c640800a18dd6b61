use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::uitree::{UiNode, UiRole, UiTree};
use log::debug;
use std::collections::VecDeque;
use tokio::time::Instant;

/// Hard cap on nodes visited during a descendant scan, so a pathological
/// live tree cannot stall a workflow.
const SCAN_NODE_BUDGET: usize = 4_096;

/// Ordered sequence of human-readable labels addressing a control,
/// e.g. `["File", "Import", "MIDI File…"]`. Labels are matched exactly
/// and case-sensitively; trailing ellipses are significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuPath(Vec<String>);

impl MenuPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MenuPath(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for MenuPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" > "))
    }
}

/// Resolves and activates `path` starting from the application root.
pub async fn activate(
    tree: &dyn UiTree,
    config: &EngineConfig,
    path: &MenuPath,
) -> Result<(), EngineError> {
    let root = tree.application_root()?;
    // Menu paths address the menu bar; other controls hang directly off
    // the root or a window passed to `activate_from`.
    let start = tree
        .children(root)?
        .into_iter()
        .find(|n| tree.role(*n) == UiRole::MenuBar)
        .unwrap_or(root);
    activate_from(tree, config, start, path).await
}

/// Depth-first match of `path` against the live tree under `root`.
///
/// At each non-final segment the matched node is pressed to expand it,
/// the tree is given a settle delay, and the freshly revealed children
/// are re-enumerated. If exactly the expansion revealed a nested menu
/// container, the search descends into it; otherwise the next segment
/// is looked up among the matched node's own children, since some menu
/// systems flatten one level of indirection. The first unmatched
/// segment fails immediately, naming the segment and the sibling
/// labels that were found.
pub async fn activate_from(
    tree: &dyn UiTree,
    config: &EngineConfig,
    root: UiNode,
    path: &MenuPath,
) -> Result<(), EngineError> {
    let segments = path.segments();
    let mut scope = tree.children(root)?;

    for (i, segment) in segments.iter().enumerate() {
        let matched = scope
            .iter()
            .copied()
            .find(|n| tree.label(*n).as_deref() == Some(segment.as_str()));
        let Some(node) = matched else {
            let siblings: Vec<String> = scope.iter().filter_map(|n| tree.label(*n)).collect();
            return Err(EngineError::ResolutionFailed {
                segment: segment.clone(),
                siblings,
            });
        };

        debug!("segment {i} {segment:?} matched node {node:?}");
        tree.press(node)?;
        if i + 1 == segments.len() {
            return Ok(());
        }

        tokio::time::sleep(config.menu_settle()).await;
        let revealed = tree.children(node)?;
        scope = match revealed
            .iter()
            .copied()
            .find(|n| tree.role(*n) == UiRole::Menu)
        {
            Some(menu) => tree.children(menu)?,
            None => revealed,
        };
    }

    Ok(())
}

/// Polls the visible windows until one titled `title` appears, up to
/// the configured dialog timeout. On expiry this fails like any other
/// resolution miss, listing the window titles that were visible.
pub async fn wait_for_window(
    tree: &dyn UiTree,
    config: &EngineConfig,
    title: &str,
) -> Result<UiNode, EngineError> {
    let deadline = Instant::now() + config.dialog_timeout();
    loop {
        let mut seen = Vec::new();
        for window in tree.windows()? {
            match tree.label(window) {
                Some(t) if t == title => return Ok(window),
                Some(t) => seen.push(t),
                None => {}
            }
        }
        if Instant::now() >= deadline {
            return Err(EngineError::ResolutionFailed {
                segment: title.to_string(),
                siblings: seen,
            });
        }
        tokio::time::sleep(config.dialog_poll()).await;
    }
}

/// Polls for an alert-style window, tolerating its absence: some target
/// versions never raise one. Returns `None` on timeout.
pub async fn wait_for_alert(
    tree: &dyn UiTree,
    config: &EngineConfig,
) -> Result<Option<UiNode>, EngineError> {
    let deadline = Instant::now() + config.alert_timeout();
    loop {
        if let Some(alert) = tree
            .windows()?
            .into_iter()
            .find(|w| tree.role(*w) == UiRole::Alert)
        {
            return Ok(Some(alert));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(config.dialog_poll()).await;
    }
}

/// Breadth-first scan under `root` for the first node satisfying the
/// predicate. Bounded by a node budget; the live tree can be large.
pub fn find_descendant(
    tree: &dyn UiTree,
    root: UiNode,
    pred: &dyn Fn(UiRole, Option<&str>) -> bool,
) -> Result<Option<UiNode>, EngineError> {
    let mut queue: VecDeque<UiNode> = VecDeque::from([root]);
    let mut visited = 0usize;

    while let Some(node) = queue.pop_front() {
        visited += 1;
        if visited > SCAN_NODE_BUDGET {
            return Ok(None);
        }
        let label = tree.label(node);
        if pred(tree.role(node), label.as_deref()) {
            return Ok(Some(node));
        }
        queue.extend(tree.children(node)?);
    }
    Ok(None)
}
